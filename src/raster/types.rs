use std::fmt::{Display, Formatter};

use num_complex::Complex;

use crate::errors::{GdalError, Result};

/// Primitive numeric element types.
///
/// The discriminants are GDAL's `GDALDataType` codes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum GdalDataType {
    /// Unknown or unspecified type
    Unknown = 0,
    /// Eight bit unsigned integer
    UInt8 = 1,
    /// Sixteen bit unsigned integer
    UInt16 = 2,
    /// Sixteen bit signed integer
    Int16 = 3,
    /// Thirty two bit unsigned integer
    UInt32 = 4,
    /// Thirty two bit signed integer
    Int32 = 5,
    /// Thirty two bit floating point
    Float32 = 6,
    /// Sixty four bit floating point
    Float64 = 7,
    /// Complex Int16
    CInt16 = 8,
    /// Complex Int32
    CInt32 = 9,
    /// Complex Float32
    CFloat32 = 10,
    /// Complex Float64
    CFloat64 = 11,
    /// 64 bit unsigned integer
    UInt64 = 12,
    /// 64 bit signed integer
    Int64 = 13,
    /// Eight bit signed integer
    Int8 = 14,
}

impl GdalDataType {
    /// Subset of the data types that can back an array.
    pub fn available_types() -> &'static [GdalDataType] {
        use GdalDataType::*;
        &[
            UInt8, Int8, UInt16, Int16, UInt32, Int32, UInt64, Int64, Float32, Float64, CInt16,
            CInt32, CFloat32, CFloat64,
        ]
    }

    /// The GDAL name of the type (`Byte`, `Int16`, `CFloat64`, ...).
    pub fn name(&self) -> &'static str {
        match self {
            GdalDataType::Unknown => "Unknown",
            GdalDataType::UInt8 => "Byte",
            GdalDataType::Int8 => "Int8",
            GdalDataType::UInt16 => "UInt16",
            GdalDataType::Int16 => "Int16",
            GdalDataType::UInt32 => "UInt32",
            GdalDataType::Int32 => "Int32",
            GdalDataType::UInt64 => "UInt64",
            GdalDataType::Int64 => "Int64",
            GdalDataType::Float32 => "Float32",
            GdalDataType::Float64 => "Float64",
            GdalDataType::CInt16 => "CInt16",
            GdalDataType::CInt32 => "CInt32",
            GdalDataType::CFloat32 => "CFloat32",
            GdalDataType::CFloat64 => "CFloat64",
        }
    }

    /// Get the type size in **bytes**.
    pub fn bytes(&self) -> usize {
        match self {
            GdalDataType::Unknown => 0,
            GdalDataType::UInt8 | GdalDataType::Int8 => 1,
            GdalDataType::UInt16 | GdalDataType::Int16 => 2,
            GdalDataType::UInt32
            | GdalDataType::Int32
            | GdalDataType::Float32
            | GdalDataType::CInt16 => 4,
            GdalDataType::UInt64
            | GdalDataType::Int64
            | GdalDataType::Float64
            | GdalDataType::CInt32
            | GdalDataType::CFloat32 => 8,
            GdalDataType::CFloat64 => 16,
        }
    }

    /// Get the type size in **bits**.
    pub fn bits(&self) -> usize {
        self.bytes() * 8
    }

    /// Returns `true` if data type is integral (non-floating point), complex integers included.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            GdalDataType::UInt8
                | GdalDataType::Int8
                | GdalDataType::UInt16
                | GdalDataType::Int16
                | GdalDataType::UInt32
                | GdalDataType::Int32
                | GdalDataType::UInt64
                | GdalDataType::Int64
                | GdalDataType::CInt16
                | GdalDataType::CInt32
        )
    }

    /// Returns `true` if data type is floating point (non-integral)
    pub fn is_floating(&self) -> bool {
        matches!(
            self,
            GdalDataType::Float32
                | GdalDataType::Float64
                | GdalDataType::CFloat32
                | GdalDataType::CFloat64
        )
    }

    /// Returns `true` if data type is complex.
    pub fn is_complex(&self) -> bool {
        matches!(
            self,
            GdalDataType::CInt16
                | GdalDataType::CInt32
                | GdalDataType::CFloat32
                | GdalDataType::CFloat64
        )
    }

    /// Returns `true` if data type supports negative values.
    pub fn is_signed(&self) -> bool {
        !matches!(
            self,
            GdalDataType::Unknown
                | GdalDataType::UInt8
                | GdalDataType::UInt16
                | GdalDataType::UInt32
                | GdalDataType::UInt64
        )
    }

    /// The component type of a complex type, or `self` for real types.
    pub fn base_type(&self) -> GdalDataType {
        match self {
            GdalDataType::CInt16 => GdalDataType::Int16,
            GdalDataType::CInt32 => GdalDataType::Int32,
            GdalDataType::CFloat32 => GdalDataType::Float32,
            GdalDataType::CFloat64 => GdalDataType::Float64,
            other => *other,
        }
    }

    /// Return the smallest data type able to hold every value of both `self` and `other`.
    pub fn union(&self, other: GdalDataType) -> GdalDataType {
        use GdalDataType::*;
        if *self == other {
            return *self;
        }
        if *self == Unknown {
            return other;
        }
        if other == Unknown {
            return *self;
        }

        let complex = self.is_complex() || other.is_complex();
        let a = self.base_type();
        let b = other.base_type();
        let floating = a.is_floating() || b.is_floating();
        let signed = a.is_signed() || b.is_signed();

        // bits needed to hold the magnitude of each side, as a signed value if required
        let needed = |t: GdalDataType| -> usize {
            if t.is_floating() {
                t.bits()
            } else if signed && !t.is_signed() {
                t.bits() * 2
            } else {
                t.bits()
            }
        };
        let bits = needed(a).max(needed(b));

        let real = if floating {
            // integers wider than 16 bits need a double to stay exact
            let int_bits = [a, b]
                .iter()
                .filter(|t| !t.is_floating())
                .map(|t| t.bits())
                .max()
                .unwrap_or(0);
            let float_bits = [a, b]
                .iter()
                .filter(|t| t.is_floating())
                .map(|t| t.bits())
                .max()
                .unwrap_or(0);
            if float_bits > 32 || int_bits > 16 {
                Float64
            } else {
                Float32
            }
        } else {
            match (signed, bits) {
                (false, 8) => UInt8,
                (false, 16) => UInt16,
                (false, 32) => UInt32,
                (false, _) => UInt64,
                (true, 8) => Int8,
                (true, 16) => Int16,
                (true, 32) => Int32,
                (true, 64) => Int64,
                // u64 mixed with a signed type has no exact integer representation
                (true, _) => Float64,
            }
        };

        if !complex {
            return real;
        }
        match real {
            UInt8 | Int8 | UInt16 | Int16 => CInt16,
            UInt32 | Int32 => CInt32,
            Float32 => CFloat32,
            _ => CFloat64,
        }
    }
}

impl Display for GdalDataType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u32> for GdalDataType {
    type Error = GdalError;

    fn try_from(value: u32) -> Result<Self> {
        GdalDataType::available_types()
            .iter()
            .find(|t| **t as u32 == value)
            .copied()
            .ok_or_else(|| GdalError::BadArgument(format!("unknown GDALDataType {value}")))
    }
}

impl TryFrom<&str> for GdalDataType {
    type Error = GdalError;

    fn try_from(value: &str) -> Result<Self> {
        GdalDataType::available_types()
            .iter()
            .find(|t| t.name().eq_ignore_ascii_case(value))
            .copied()
            .ok_or_else(|| GdalError::BadArgument(format!("unknown data type name '{value}'")))
    }
}

/// Type-level constraint for limiting which primitive numeric values can be passed
/// to functions needing target data type.
pub trait GdalType: bytemuck::Pod {
    fn datatype() -> GdalDataType;
}

macro_rules! impl_gdal_type {
    ($($t:ty => $dt:ident),* $(,)?) => {
        $(
            impl GdalType for $t {
                fn datatype() -> GdalDataType {
                    GdalDataType::$dt
                }
            }
        )*
    };
}

impl_gdal_type! {
    u8 => UInt8,
    i8 => Int8,
    u16 => UInt16,
    i16 => Int16,
    u32 => UInt32,
    i32 => Int32,
    u64 => UInt64,
    i64 => Int64,
    f32 => Float32,
    f64 => Float64,
    Complex<i16> => CInt16,
    Complex<i32> => CInt32,
    Complex<f32> => CFloat32,
    Complex<f64> => CFloat64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes() {
        for t in GdalDataType::available_types() {
            assert_eq!(t.bits(), t.bytes() * 8);
        }
        assert_eq!(<u8 as GdalType>::datatype().bytes(), 1);
        assert_eq!(<Complex<f64> as GdalType>::datatype().bytes(), 16);
        assert_eq!(<Complex<i16> as GdalType>::datatype().bytes(), 4);
        assert_eq!(
            std::mem::size_of::<Complex<f32>>(),
            GdalDataType::CFloat32.bytes()
        );
    }

    #[test]
    fn test_names() {
        assert_eq!(GdalDataType::UInt8.name(), "Byte");
        assert_eq!(GdalDataType::CFloat32.to_string(), "CFloat32");
        assert_eq!(GdalDataType::try_from("byte").unwrap(), GdalDataType::UInt8);
        assert!(GdalDataType::try_from("Float16").is_err());
        assert_eq!(GdalDataType::try_from(7).unwrap(), GdalDataType::Float64);
        assert!(GdalDataType::try_from(0).is_err());
    }

    #[test]
    fn test_predicates() {
        assert!(GdalDataType::CInt16.is_integer());
        assert!(GdalDataType::CInt16.is_complex());
        assert!(GdalDataType::Float32.is_floating());
        assert!(!GdalDataType::UInt64.is_signed());
        assert!(GdalDataType::Int8.is_signed());
        assert_eq!(GdalDataType::CFloat64.base_type(), GdalDataType::Float64);
    }

    #[test]
    fn test_union() {
        use GdalDataType::*;
        assert_eq!(UInt8.union(UInt8), UInt8);
        assert_eq!(UInt8.union(Int8), Int16);
        assert_eq!(UInt8.union(UInt16), UInt16);
        assert_eq!(Int16.union(UInt16), Int32);
        assert_eq!(UInt16.union(Float32), Float32);
        assert_eq!(Int32.union(Float32), Float64);
        assert_eq!(UInt64.union(Int8), Float64);
        assert_eq!(UInt8.union(CFloat32), CFloat32);
        assert_eq!(Int16.union(CInt16), CInt16);
        assert_eq!(Unknown.union(Int32), Int32);
    }
}
