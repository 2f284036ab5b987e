//! N-dimensional strided copy between two byte regions.
//!
//! Both sides are described by a pointer to the element at multi-index
//! `[0, .., 0]` and per-axis strides in **bytes**, which may be negative or
//! zero. The index space given by `count` is walked in row-major order (last
//! axis fastest) and every element goes through an [`ElementConverter`].

use crate::errors::{GdalError, Result};
use crate::raster::mdarray::datatype::ElementConverter;

/// Row-major strides, in elements, of a compact buffer of shape `count`.
///
/// Strides too large for `isize` saturate, so that [`buffer_span`] rejects them.
pub fn row_major_strides(count: &[usize]) -> Vec<isize> {
    let rank = count.len();
    let mut strides = vec![1isize; rank];
    for i in (0..rank.saturating_sub(1)).rev() {
        let extent = isize::try_from(count[i + 1].max(1)).unwrap_or(isize::MAX);
        strides[i] = strides[i + 1].saturating_mul(extent);
    }
    strides
}

/// Placement of a strided buffer inside a flat byte slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BufferSpan {
    /// Byte offset of element `[0, .., 0]`.
    pub base: usize,
    /// Number of bytes between the lowest and the highest addressed byte, inclusive.
    pub len: usize,
}

/// Compute where element `[0, .., 0]` sits in a slice that starts at the lowest
/// addressed byte of the buffer described by `count` and element `strides`.
pub(crate) fn buffer_span(count: &[usize], strides: &[isize], elem_size: usize) -> Result<BufferSpan> {
    if count.iter().any(|&c| c == 0) {
        return Ok(BufferSpan { base: 0, len: 0 });
    }
    let overflow = || GdalError::BadArgument("buffer strides overflow".to_string());

    let mut min_offset: i128 = 0;
    let mut max_offset: i128 = 0;
    for (&c, &s) in count.iter().zip(strides) {
        let end = (c as i128 - 1)
            .checked_mul(s as i128)
            .ok_or_else(overflow)?;
        if end < 0 {
            min_offset = min_offset.checked_add(end).ok_or_else(overflow)?;
        } else {
            max_offset = max_offset.checked_add(end).ok_or_else(overflow)?;
        }
    }
    let elem = elem_size as i128;
    let base = min_offset
        .checked_neg()
        .and_then(|v| v.checked_mul(elem))
        .and_then(|v| usize::try_from(v).ok())
        .ok_or_else(overflow)?;
    let len = max_offset
        .checked_sub(min_offset)
        .and_then(|v| v.checked_mul(elem))
        .and_then(|v| v.checked_add(elem))
        .and_then(|v| usize::try_from(v).ok())
        .ok_or_else(overflow)?;
    // every addressed byte must also be reachable with pointer arithmetic
    if isize::try_from(len).is_err() {
        return Err(overflow());
    }
    Ok(BufferSpan { base, len })
}

/// Copy `count` elements from `src` to `dst`, converting each one with `convert`.
///
/// # Safety
/// For every multi-index `idx < count`, `src + Σ idx[i] * src_strides[i]` must
/// be readable for the source element size and `dst + Σ idx[i] * dst_strides[i]`
/// writable for the destination element size, and the two regions must not overlap.
#[allow(clippy::too_many_arguments)]
pub(crate) unsafe fn copy_strided(
    count: &[usize],
    src: *const u8,
    src_strides: &[isize],
    src_elem_size: usize,
    dst: *mut u8,
    dst_strides: &[isize],
    dst_elem_size: usize,
    convert: &ElementConverter,
) {
    debug_assert_eq!(count.len(), src_strides.len());
    debug_assert_eq!(count.len(), dst_strides.len());

    if count.iter().any(|&c| c == 0) {
        return;
    }

    let rank = count.len();
    if rank == 0 {
        convert_one(src, src_elem_size, dst, dst_elem_size, convert);
        return;
    }

    let inner = rank - 1;
    let inner_count = count[inner];
    let inner_src_stride = src_strides[inner];
    let inner_dst_stride = dst_strides[inner];
    // A run of identical, compact elements on both sides is a single memcpy.
    let contiguous_run = convert.is_copy()
        && inner_src_stride == src_elem_size as isize
        && inner_dst_stride == dst_elem_size as isize;

    let mut index = vec![0usize; inner];
    let mut src_row = src;
    let mut dst_row = dst;
    loop {
        if contiguous_run {
            std::ptr::copy_nonoverlapping(src_row, dst_row, inner_count * src_elem_size);
        } else {
            let mut s = src_row;
            let mut d = dst_row;
            for _ in 0..inner_count {
                convert_one(s, src_elem_size, d, dst_elem_size, convert);
                s = s.wrapping_offset(inner_src_stride);
                d = d.wrapping_offset(inner_dst_stride);
            }
        }

        // odometer over the outer axes
        let mut axis = inner;
        loop {
            if axis == 0 {
                return;
            }
            axis -= 1;
            index[axis] += 1;
            src_row = src_row.wrapping_offset(src_strides[axis]);
            dst_row = dst_row.wrapping_offset(dst_strides[axis]);
            if index[axis] < count[axis] {
                break;
            }
            let rewind = count[axis] as isize;
            src_row = src_row.wrapping_offset(-src_strides[axis] * rewind);
            dst_row = dst_row.wrapping_offset(-dst_strides[axis] * rewind);
            index[axis] = 0;
        }
    }
}

#[inline]
unsafe fn convert_one(
    src: *const u8,
    src_elem_size: usize,
    dst: *mut u8,
    dst_elem_size: usize,
    convert: &ElementConverter,
) {
    let s = std::slice::from_raw_parts(src, src_elem_size);
    let d = std::slice::from_raw_parts_mut(dst, dst_elem_size);
    convert.convert(s, d);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{ExtendedDataType, GdalDataType};

    fn copy_u8(count: &[usize], src: &[u8], src_strides: &[isize], dst_strides: &[isize]) -> Vec<u8> {
        let dst_span = buffer_span(count, dst_strides, 1).unwrap();
        let src_span = buffer_span(count, src_strides, 1).unwrap();
        assert!(src.len() >= src_span.len);
        let mut dst = vec![0u8; dst_span.len];
        unsafe {
            copy_strided(
                count,
                src.as_ptr().add(src_span.base),
                src_strides,
                1,
                dst.as_mut_ptr().add(dst_span.base),
                dst_strides,
                1,
                &ElementConverter::Copy(1),
            );
        }
        dst
    }

    #[test]
    fn test_row_major_strides() {
        assert_eq!(row_major_strides(&[2, 3]), vec![3, 1]);
        assert_eq!(row_major_strides(&[4, 2, 5]), vec![10, 5, 1]);
        assert_eq!(row_major_strides(&[7]), vec![1]);
        assert!(row_major_strides(&[]).is_empty());
    }

    #[test]
    fn test_buffer_span() {
        assert_eq!(
            buffer_span(&[2, 3], &[3, 1], 2).unwrap(),
            BufferSpan { base: 0, len: 12 }
        );
        assert_eq!(
            buffer_span(&[2, 3], &[-3, -1], 1).unwrap(),
            BufferSpan { base: 5, len: 6 }
        );
        assert_eq!(
            buffer_span(&[2, 0], &[3, 1], 1).unwrap(),
            BufferSpan { base: 0, len: 0 }
        );
        assert!(buffer_span(&[usize::MAX, 2], &[isize::MAX, 1], 8).is_err());
    }

    #[test]
    fn test_identity_and_transpose() {
        let src = [1u8, 2, 3, 4, 5, 6];
        assert_eq!(copy_u8(&[2, 3], &src, &[3, 1], &[3, 1]), src);
        assert_eq!(copy_u8(&[2, 3], &src, &[3, 1], &[1, 2]), [1, 4, 2, 5, 3, 6]);
    }

    #[test]
    fn test_reversed_source() {
        let src = [1u8, 2, 3, 4, 5, 6];
        assert_eq!(copy_u8(&[2, 3], &src, &[-3, -1], &[3, 1]), [6, 5, 4, 3, 2, 1]);
        assert_eq!(copy_u8(&[2, 3], &src, &[-3, -1], &[1, 2]), [6, 3, 5, 2, 4, 1]);
        // flip only the rows
        assert_eq!(copy_u8(&[2, 3], &src, &[-3, 1], &[3, 1]), [4, 5, 6, 1, 2, 3]);
    }

    #[test]
    fn test_higher_rank() {
        let src: Vec<u8> = (0..24).collect();
        // swap the first and last axis of a 2x3x4 array
        let got = copy_u8(&[4, 3, 2], &src, &[1, 4, 12], &[6, 2, 1]);
        let expected: Vec<u8> = (0..4)
            .flat_map(|k| (0..3).flat_map(move |j| (0..2).map(move |i| (i * 12 + j * 4 + k) as u8)))
            .collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn test_rank_zero_and_empty() {
        assert_eq!(copy_u8(&[], &[9], &[], &[]), [9]);
        assert!(copy_u8(&[0, 3], &[], &[3, 1], &[3, 1]).is_empty());
    }

    #[test]
    fn test_converting_copy() {
        let src: Vec<u8> = [1i16, -2, 300]
            .iter()
            .flat_map(|v| v.to_ne_bytes())
            .collect();
        let converter = ElementConverter::new(
            &ExtendedDataType::create(GdalDataType::Int16).unwrap(),
            &ExtendedDataType::create(GdalDataType::UInt8).unwrap(),
        )
        .unwrap();
        let mut dst = [0u8; 3];
        unsafe {
            copy_strided(
                &[3],
                src.as_ptr(),
                &[2],
                2,
                dst.as_mut_ptr().add(2),
                &[-1],
                1,
                &converter,
            );
        }
        assert_eq!(dst, [255, 0, 1]);
    }
}
