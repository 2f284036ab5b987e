use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use crate::cpl;
use crate::errors::{GdalError, Result};
use crate::raster::mdarray::convert::convert_numeric;
use crate::raster::{GdalDataType, GdalType};

/// Class of an [`ExtendedDataType`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExtendedDataTypeClass {
    Numeric,
    Compound,
    String,
}

#[derive(Debug, PartialEq, Eq)]
enum DataTypeKind {
    Numeric(GdalDataType),
    Compound {
        name: String,
        size: usize,
        components: Vec<EdtComponent>,
    },
    String {
        max_length: usize,
    },
}

/// Element type of an [`MDArray`](super::MDArray): a primitive numeric type,
/// a compound record of named components, or a string.
///
/// Values are immutable and cheap to clone; clones share the same description.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtendedDataType {
    kind: Arc<DataTypeKind>,
}

/// A named, offset-tagged member of a compound [`ExtendedDataType`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdtComponent {
    name: String,
    offset: usize,
    datatype: ExtendedDataType,
}

impl EdtComponent {
    pub fn create(name: &str, offset: usize, datatype: ExtendedDataType) -> Self {
        Self {
            name: name.to_string(),
            offset,
            datatype,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn datatype(&self) -> &ExtendedDataType {
        &self.datatype
    }
}

impl ExtendedDataType {
    /// Create a numeric data type.
    pub fn create(datatype: GdalDataType) -> Result<Self> {
        if datatype == GdalDataType::Unknown {
            return Err(cpl::report(GdalError::BadArgument(
                "cannot create an extended data type of unknown numeric type".to_string(),
            )));
        }
        Ok(Self::from_kind(DataTypeKind::Numeric(datatype)))
    }

    /// Create a numeric data type from a `GDALDataType` code.
    pub fn create_from_code(code: u32) -> Result<Self> {
        let datatype = GdalDataType::try_from(code).map_err(cpl::report)?;
        Self::create(datatype)
    }

    /// Numeric data type matching the Rust type `T`.
    pub fn of<T: GdalType>() -> Self {
        Self::from_kind(DataTypeKind::Numeric(T::datatype()))
    }

    /// Create a compound data type of `total_size` bytes.
    ///
    /// Component names must be unique and each component must fit in
    /// `[0, total_size)`. Components may overlap.
    pub fn create_compound(
        name: &str,
        total_size: usize,
        components: Vec<EdtComponent>,
    ) -> Result<Self> {
        if total_size == 0 {
            return Err(cpl::report(GdalError::BadArgument(format!(
                "compound type '{name}' must have a positive size"
            ))));
        }
        if components.is_empty() {
            return Err(cpl::report(GdalError::BadArgument(format!(
                "compound type '{name}' must have at least one component"
            ))));
        }

        let mut seen = HashSet::new();
        for component in &components {
            if !seen.insert(component.name.as_str()) {
                return Err(cpl::report(GdalError::BadArgument(format!(
                    "duplicate component name '{}' in compound type '{name}'",
                    component.name
                ))));
            }
            if component.datatype.class() == ExtendedDataTypeClass::String {
                return Err(cpl::report(GdalError::NotSupported(format!(
                    "string component '{}' cannot be part of a fixed layout compound type",
                    component.name
                ))));
            }
            let end = component.offset.checked_add(component.datatype.size());
            if end.map_or(true, |end| end > total_size) {
                return Err(cpl::report(GdalError::BadArgument(format!(
                    "component '{}' at offset {} with size {} does not fit in compound type '{name}' of size {total_size}",
                    component.name,
                    component.offset,
                    component.datatype.size()
                ))));
            }
        }

        Ok(Self::from_kind(DataTypeKind::Compound {
            name: name.to_string(),
            size: total_size,
            components,
        }))
    }

    /// Create a string data type. `max_length == 0` means unbounded.
    pub fn create_string(max_length: usize) -> Self {
        Self::from_kind(DataTypeKind::String { max_length })
    }

    fn from_kind(kind: DataTypeKind) -> Self {
        Self {
            kind: Arc::new(kind),
        }
    }

    pub fn class(&self) -> ExtendedDataTypeClass {
        match *self.kind {
            DataTypeKind::Numeric(_) => ExtendedDataTypeClass::Numeric,
            DataTypeKind::Compound { .. } => ExtendedDataTypeClass::Compound,
            DataTypeKind::String { .. } => ExtendedDataTypeClass::String,
        }
    }

    /// The numeric type, or [`GdalDataType::Unknown`] for compound and string types.
    pub fn numeric_datatype(&self) -> GdalDataType {
        match *self.kind {
            DataTypeKind::Numeric(datatype) => datatype,
            _ => GdalDataType::Unknown,
        }
    }

    pub fn name(&self) -> String {
        match &*self.kind {
            DataTypeKind::Numeric(datatype) => datatype.name().to_string(),
            DataTypeKind::Compound { name, .. } => name.clone(),
            DataTypeKind::String { .. } => "String".to_string(),
        }
    }

    /// Size of one element in bytes. String types have no fixed layout and report their maximum length.
    pub fn size(&self) -> usize {
        match &*self.kind {
            DataTypeKind::Numeric(datatype) => datatype.bytes(),
            DataTypeKind::Compound { size, .. } => *size,
            DataTypeKind::String { max_length } => *max_length,
        }
    }

    /// Components of a compound type, in declaration order. Empty otherwise.
    pub fn components(&self) -> &[EdtComponent] {
        match &*self.kind {
            DataTypeKind::Compound { components, .. } => components,
            _ => &[],
        }
    }

    pub fn max_string_length(&self) -> Option<usize> {
        match *self.kind {
            DataTypeKind::String { max_length } => Some(max_length),
            _ => None,
        }
    }

    /// Whether this type uses a fixed-size byte layout that arrays can store.
    pub fn is_fixed_layout(&self) -> bool {
        self.class() != ExtendedDataTypeClass::String
    }

    /// Whether values of this type can be converted to `other`.
    pub fn can_convert_to(&self, other: &ExtendedDataType) -> bool {
        ElementConverter::new(self, other).is_ok()
    }

    /// Convert one element stored in `src` with type `src_type` into `dst` with type `dst_type`.
    ///
    /// Numeric values are narrowed with saturation, floats are rounded to the
    /// nearest integer, complex values lose their imaginary part when converted to
    /// a real type and real values get a zero imaginary part when converted to a
    /// complex type. Compound values are converted component by component, matching
    /// components by name.
    pub fn convert_value_buffer(
        src: &[u8],
        src_type: &ExtendedDataType,
        dst: &mut [u8],
        dst_type: &ExtendedDataType,
    ) -> Result<()> {
        let converter = ElementConverter::new(src_type, dst_type).map_err(cpl::report)?;
        if src.len() < src_type.size() || dst.len() < dst_type.size() {
            return Err(cpl::report(GdalError::BadArgument(format!(
                "buffers of {} and {} bytes are too small for one {} to {} conversion",
                src.len(),
                dst.len(),
                src_type,
                dst_type
            ))));
        }
        converter.convert(src, dst);
        Ok(())
    }
}

impl Display for ExtendedDataType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name())
    }
}

impl TryFrom<GdalDataType> for ExtendedDataType {
    type Error = GdalError;

    fn try_from(datatype: GdalDataType) -> Result<Self> {
        Self::create(datatype)
    }
}

/// A conversion plan between two fixed layout types, resolved once per transfer.
#[derive(Debug, Clone)]
pub(crate) enum ElementConverter {
    /// Identical layouts, copy `n` bytes.
    Copy(usize),
    Numeric(GdalDataType, GdalDataType),
    /// `(source offset, destination offset, converter)` for every destination component.
    Compound(Vec<(usize, usize, ElementConverter)>),
}

impl ElementConverter {
    pub(crate) fn new(src: &ExtendedDataType, dst: &ExtendedDataType) -> Result<Self> {
        if !src.is_fixed_layout() || !dst.is_fixed_layout() {
            let offending = if src.is_fixed_layout() { dst } else { src };
            return Err(GdalError::UnsupportedMdDataType {
                data_type: offending.clone(),
                method_name: "ConvertValueBuffer",
            });
        }
        if src == dst {
            return Ok(ElementConverter::Copy(src.size()));
        }
        match (&*src.kind, &*dst.kind) {
            (DataTypeKind::Numeric(s), DataTypeKind::Numeric(d)) => {
                Ok(ElementConverter::Numeric(*s, *d))
            }
            (DataTypeKind::Compound { .. }, DataTypeKind::Compound { .. }) => {
                let mut plan = Vec::with_capacity(dst.components().len());
                for dst_component in dst.components() {
                    let src_component = src
                        .components()
                        .iter()
                        .find(|c| c.name == dst_component.name)
                        .ok_or_else(|| {
                            GdalError::NotSupported(format!(
                                "cannot convert {src} to {dst}: no source component named '{}'",
                                dst_component.name
                            ))
                        })?;
                    plan.push((
                        src_component.offset,
                        dst_component.offset,
                        ElementConverter::new(&src_component.datatype, &dst_component.datatype)?,
                    ));
                }
                Ok(ElementConverter::Compound(plan))
            }
            _ => Err(GdalError::NotSupported(format!(
                "cannot convert between {} type {src} and {} type {dst}",
                class_name(src.class()),
                class_name(dst.class())
            ))),
        }
    }

    pub(crate) fn is_copy(&self) -> bool {
        matches!(self, ElementConverter::Copy(_))
    }

    /// Convert one element. Slices are at least as long as their element size.
    pub(crate) fn convert(&self, src: &[u8], dst: &mut [u8]) {
        match self {
            ElementConverter::Copy(n) => dst[..*n].copy_from_slice(&src[..*n]),
            ElementConverter::Numeric(s, d) => convert_numeric(src, *s, dst, *d),
            ElementConverter::Compound(plan) => {
                for (src_offset, dst_offset, converter) in plan {
                    converter.convert(&src[*src_offset..], &mut dst[*dst_offset..]);
                }
            }
        }
    }
}

fn class_name(class: ExtendedDataTypeClass) -> &'static str {
    match class {
        ExtendedDataTypeClass::Numeric => "numeric",
        ExtendedDataTypeClass::Compound => "compound",
        ExtendedDataTypeClass::String => "string",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::test_utils::SuppressGDALErrorLog;

    fn xy_type() -> ExtendedDataType {
        ExtendedDataType::create_compound(
            "mytype",
            8,
            vec![
                EdtComponent::create("x", 0, ExtendedDataType::create(GdalDataType::Int16).unwrap()),
                EdtComponent::create("y", 4, ExtendedDataType::create(GdalDataType::Int32).unwrap()),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_numeric() {
        let dt = ExtendedDataType::create(GdalDataType::UInt8).unwrap();
        assert_eq!(dt.class(), ExtendedDataTypeClass::Numeric);
        assert_eq!(dt.numeric_datatype(), GdalDataType::UInt8);
        assert_eq!(dt.size(), 1);
        assert_eq!(dt.name(), "Byte");
        assert_eq!(dt, ExtendedDataType::of::<u8>());

        let _nolog = SuppressGDALErrorLog::new();
        let err = ExtendedDataType::create(GdalDataType::Unknown).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(ExtendedDataType::create_from_code(42).is_err());
        let err = ExtendedDataType::try_from(GdalDataType::Unknown).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(
            ExtendedDataType::try_from(GdalDataType::Int16).unwrap(),
            ExtendedDataType::of::<i16>()
        );
    }

    #[test]
    fn test_string() {
        let dt = ExtendedDataType::create_string(16);
        assert_eq!(dt.class(), ExtendedDataTypeClass::String);
        assert_eq!(dt.max_string_length(), Some(16));
        assert!(!dt.is_fixed_layout());
        assert_eq!(ExtendedDataType::create_string(0).max_string_length(), Some(0));
        assert_eq!(ExtendedDataType::of::<f32>().max_string_length(), None);
    }

    #[test]
    fn test_compound() {
        let dt = xy_type();
        assert_eq!(dt.class(), ExtendedDataTypeClass::Compound);
        assert_eq!(dt.size(), 8);
        assert_eq!(dt.name(), "mytype");
        let names: Vec<_> = dt.components().iter().map(|c| c.name()).collect();
        assert_eq!(names, ["x", "y"]);
        assert_eq!(dt.components()[1].offset(), 4);
        assert_eq!(
            dt.components()[1].datatype().numeric_datatype(),
            GdalDataType::Int32
        );
        assert_eq!(dt.numeric_datatype(), GdalDataType::Unknown);
    }

    #[test]
    fn test_compound_validation() {
        let _nolog = SuppressGDALErrorLog::new();
        let int32: ExtendedDataType = ExtendedDataType::create(GdalDataType::Int32).unwrap();

        let err = ExtendedDataType::create_compound("t", 0, vec![]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err = ExtendedDataType::create_compound(
            "t",
            8,
            vec![
                EdtComponent::create("a", 0, int32.clone()),
                EdtComponent::create("a", 4, int32.clone()),
            ],
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err = ExtendedDataType::create_compound(
            "t",
            6,
            vec![EdtComponent::create("a", 4, int32.clone())],
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        // overlapping components are accepted
        assert!(ExtendedDataType::create_compound(
            "t",
            4,
            vec![
                EdtComponent::create("a", 0, int32.clone()),
                EdtComponent::create("b", 0, ExtendedDataType::create(GdalDataType::UInt8).unwrap()),
            ],
        )
        .is_ok());

        let err = ExtendedDataType::create_compound(
            "t",
            8,
            vec![EdtComponent::create(
                "s",
                0,
                ExtendedDataType::create_string(0),
            )],
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotSupported);
    }

    #[test]
    fn test_convert_numeric_value() {
        let src = 1000i32.to_ne_bytes();
        let mut dst = [0u8; 1];
        ExtendedDataType::convert_value_buffer(
            &src,
            &ExtendedDataType::create(GdalDataType::Int32).unwrap(),
            &mut dst,
            &ExtendedDataType::create(GdalDataType::UInt8).unwrap(),
        )
        .unwrap();
        assert_eq!(dst[0], 255);
    }

    #[test]
    fn test_convert_compound_by_name() {
        let src_type = xy_type();
        // reordered, widened destination layout
        let dst_type = ExtendedDataType::create_compound(
            "swapped",
            16,
            vec![
                EdtComponent::create("y", 0, ExtendedDataType::create(GdalDataType::Float64).unwrap()),
                EdtComponent::create("x", 8, ExtendedDataType::create(GdalDataType::Int64).unwrap()),
            ],
        )
        .unwrap();

        let mut src = [0u8; 8];
        src[0..2].copy_from_slice(&(-12i16).to_ne_bytes());
        src[4..8].copy_from_slice(&1_000_000i32.to_ne_bytes());
        let mut dst = [0u8; 16];
        ExtendedDataType::convert_value_buffer(&src, &src_type, &mut dst, &dst_type).unwrap();
        assert_eq!(f64::from_ne_bytes(dst[0..8].try_into().unwrap()), 1e6);
        assert_eq!(i64::from_ne_bytes(dst[8..16].try_into().unwrap()), -12);

        assert!(src_type.can_convert_to(&dst_type));
        // `dst_type` has no component the source lacks, but not the other way round
        let extra = ExtendedDataType::create_compound(
            "extra",
            4,
            vec![EdtComponent::create("z", 0, ExtendedDataType::create(GdalDataType::Int32).unwrap())],
        )
        .unwrap();
        assert!(!src_type.can_convert_to(&extra));
    }

    #[test]
    fn test_convert_rejections() {
        let _nolog = SuppressGDALErrorLog::new();
        let string = ExtendedDataType::create_string(0);
        let byte: ExtendedDataType = ExtendedDataType::create(GdalDataType::UInt8).unwrap();
        let mut dst = [0u8; 8];

        let err =
            ExtendedDataType::convert_value_buffer(b"abc", &string, &mut dst, &byte).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotSupported);

        let err = ExtendedDataType::convert_value_buffer(&[1], &byte, &mut dst, &xy_type())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotSupported);

        let err = ExtendedDataType::convert_value_buffer(
            &[1],
            &byte,
            &mut dst[..0],
            &ExtendedDataType::create(GdalDataType::Int16).unwrap(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }
}
