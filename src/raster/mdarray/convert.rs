//! Element conversion between numeric encodings.
//!
//! All conversions go through a widened `(real, imaginary)` pair of
//! [`Scalar`]s, so one table covers every source/destination combination.

use bytemuck::Pod;

use crate::raster::GdalDataType;

#[derive(Copy, Clone, Debug, PartialEq)]
enum Scalar {
    I(i64),
    U(u64),
    F(f64),
}

impl Scalar {
    fn to_f64(self) -> f64 {
        match self {
            Scalar::I(v) => v as f64,
            Scalar::U(v) => v as f64,
            Scalar::F(v) => v,
        }
    }

    /// Saturate into `[min, max]`, rounding floats half away from zero. NaN becomes 0.
    fn to_signed(self, min: i64, max: i64) -> i64 {
        match self {
            Scalar::I(v) => v.clamp(min, max),
            Scalar::U(v) => {
                if v > max as u64 {
                    max
                } else {
                    v as i64
                }
            }
            Scalar::F(v) if v.is_nan() => 0,
            // `as` saturates at the i64 bounds
            Scalar::F(v) => (v.round() as i64).clamp(min, max),
        }
    }

    fn to_unsigned(self, max: u64) -> u64 {
        match self {
            Scalar::I(v) if v < 0 => 0,
            Scalar::I(v) => (v as u64).min(max),
            Scalar::U(v) => v.min(max),
            Scalar::F(v) if v.is_nan() => 0,
            Scalar::F(v) => (v.round() as u64).min(max),
        }
    }
}

fn get<T: Pod>(src: &[u8], offset: usize) -> T {
    bytemuck::pod_read_unaligned(&src[offset..offset + std::mem::size_of::<T>()])
}

fn put<T: Pod>(dst: &mut [u8], offset: usize, value: T) {
    dst[offset..offset + std::mem::size_of::<T>()].copy_from_slice(bytemuck::bytes_of(&value));
}

fn load(datatype: GdalDataType, src: &[u8]) -> (Scalar, Scalar) {
    use GdalDataType::*;
    let zero = Scalar::I(0);
    match datatype {
        Unknown => (zero, zero),
        UInt8 => (Scalar::U(get::<u8>(src, 0).into()), zero),
        Int8 => (Scalar::I(get::<i8>(src, 0).into()), zero),
        UInt16 => (Scalar::U(get::<u16>(src, 0).into()), zero),
        Int16 => (Scalar::I(get::<i16>(src, 0).into()), zero),
        UInt32 => (Scalar::U(get::<u32>(src, 0).into()), zero),
        Int32 => (Scalar::I(get::<i32>(src, 0).into()), zero),
        UInt64 => (Scalar::U(get::<u64>(src, 0)), zero),
        Int64 => (Scalar::I(get::<i64>(src, 0)), zero),
        Float32 => (Scalar::F(get::<f32>(src, 0).into()), zero),
        Float64 => (Scalar::F(get::<f64>(src, 0)), zero),
        CInt16 => (
            Scalar::I(get::<i16>(src, 0).into()),
            Scalar::I(get::<i16>(src, 2).into()),
        ),
        CInt32 => (
            Scalar::I(get::<i32>(src, 0).into()),
            Scalar::I(get::<i32>(src, 4).into()),
        ),
        CFloat32 => (
            Scalar::F(get::<f32>(src, 0).into()),
            Scalar::F(get::<f32>(src, 4).into()),
        ),
        CFloat64 => (Scalar::F(get::<f64>(src, 0)), Scalar::F(get::<f64>(src, 8))),
    }
}

fn store(datatype: GdalDataType, dst: &mut [u8], re: Scalar, im: Scalar) {
    use GdalDataType::*;
    match datatype {
        Unknown => {}
        UInt8 => put(dst, 0, re.to_unsigned(u8::MAX.into()) as u8),
        Int8 => put(dst, 0, re.to_signed(i8::MIN.into(), i8::MAX.into()) as i8),
        UInt16 => put(dst, 0, re.to_unsigned(u16::MAX.into()) as u16),
        Int16 => put(dst, 0, re.to_signed(i16::MIN.into(), i16::MAX.into()) as i16),
        UInt32 => put(dst, 0, re.to_unsigned(u32::MAX.into()) as u32),
        Int32 => put(dst, 0, re.to_signed(i32::MIN.into(), i32::MAX.into()) as i32),
        UInt64 => put(dst, 0, re.to_unsigned(u64::MAX)),
        Int64 => put(dst, 0, re.to_signed(i64::MIN, i64::MAX)),
        Float32 => put(dst, 0, re.to_f64() as f32),
        Float64 => put(dst, 0, re.to_f64()),
        CInt16 => {
            put(dst, 0, re.to_signed(i16::MIN.into(), i16::MAX.into()) as i16);
            put(dst, 2, im.to_signed(i16::MIN.into(), i16::MAX.into()) as i16);
        }
        CInt32 => {
            put(dst, 0, re.to_signed(i32::MIN.into(), i32::MAX.into()) as i32);
            put(dst, 4, im.to_signed(i32::MIN.into(), i32::MAX.into()) as i32);
        }
        CFloat32 => {
            put(dst, 0, re.to_f64() as f32);
            put(dst, 4, im.to_f64() as f32);
        }
        CFloat64 => {
            put(dst, 0, re.to_f64());
            put(dst, 8, im.to_f64());
        }
    }
}

/// Convert one numeric element. Both slices must hold at least one element of their type.
pub(crate) fn convert_numeric(
    src: &[u8],
    src_type: GdalDataType,
    dst: &mut [u8],
    dst_type: GdalDataType,
) {
    if src_type == dst_type {
        let n = src_type.bytes();
        dst[..n].copy_from_slice(&src[..n]);
        return;
    }
    let (re, im) = load(src_type, src);
    store(dst_type, dst, re, im);
}

/// Round and saturate a double into an `i64` with the same rules as element conversion.
pub(crate) fn f64_to_i64(value: f64) -> i64 {
    Scalar::F(value).to_signed(i64::MIN, i64::MAX)
}
