use std::fmt::{Display, Formatter};

use thiserror::Error;

use crate::raster::ExtendedDataType;

pub type Result<T> = std::result::Result<T, GdalError>;

#[derive(Clone, Debug, Error)]
pub enum GdalError {
    #[error("Bad argument: {0}")]
    BadArgument(String),
    #[error("Index {index} is out of range for dimension '{dimension}' of size {size}")]
    OutOfRange {
        dimension: String,
        index: i64,
        size: u64,
    },
    #[error("Out of range: {0}")]
    OutOfRangeMsg(String),
    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },
    #[error("{kind} '{name}' already exists")]
    AlreadyExists { kind: &'static str, name: String },
    #[error("Not supported: {0}")]
    NotSupported(String),
    #[error("Unsupported data type '{}' in method '{method_name}'", data_type.name())]
    UnsupportedMdDataType {
        data_type: ExtendedDataType,
        method_name: &'static str,
    },
    #[cfg(feature = "ndarray")]
    #[error(transparent)]
    NdarrayShapeError(#[from] ndarray::ShapeError),
}

/// The coarse category of a [`GdalError`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    OutOfRange,
    NotFound,
    AlreadyExists,
    NotSupported,
}

impl GdalError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GdalError::BadArgument(_) => ErrorKind::InvalidArgument,
            #[cfg(feature = "ndarray")]
            GdalError::NdarrayShapeError(_) => ErrorKind::InvalidArgument,
            GdalError::OutOfRange { .. } | GdalError::OutOfRangeMsg(_) => ErrorKind::OutOfRange,
            GdalError::NotFound { .. } => ErrorKind::NotFound,
            GdalError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            GdalError::NotSupported(_) | GdalError::UnsupportedMdDataType { .. } => {
                ErrorKind::NotSupported
            }
        }
    }

    /// The `CPLE_*` number this error is reported with.
    pub fn error_num(&self) -> i32 {
        match self.kind() {
            ErrorKind::InvalidArgument | ErrorKind::OutOfRange => CPLE_ILLEGAL_ARG,
            ErrorKind::NotFound => CPLE_OBJECT_NULL,
            ErrorKind::AlreadyExists => CPLE_APP_DEFINED,
            ErrorKind::NotSupported => CPLE_NOT_SUPPORTED,
        }
    }
}

pub const CPLE_NONE: i32 = 0;
pub const CPLE_APP_DEFINED: i32 = 1;
pub const CPLE_ILLEGAL_ARG: i32 = 5;
pub const CPLE_NOT_SUPPORTED: i32 = 6;
pub const CPLE_OBJECT_NULL: i32 = 10;

/// Severity of a message sent through the CPL error channel.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum CplErrType {
    None = 0,
    Debug = 1,
    Warning = 2,
    Failure = 3,
    Fatal = 4,
}

impl Display for CplErrType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CplErrType::None => "None",
            CplErrType::Debug => "Debug",
            CplErrType::Warning => "Warning",
            CplErrType::Failure => "ERROR",
            CplErrType::Fatal => "FATAL",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            GdalError::BadArgument("x".into()).kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            GdalError::OutOfRangeMsg("x".into()).kind(),
            ErrorKind::OutOfRange
        );
        let err = GdalError::NotFound {
            kind: "array",
            name: "foo".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "array 'foo' not found");
        assert_eq!(err.error_num(), CPLE_OBJECT_NULL);
    }

    #[test]
    fn test_out_of_range_display() {
        let err = GdalError::OutOfRange {
            dimension: "dim0".to_string(),
            index: 2,
            size: 2,
        };
        assert_eq!(
            err.to_string(),
            "Index 2 is out of range for dimension 'dim0' of size 2"
        );
    }
}
