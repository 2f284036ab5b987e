use std::fmt::{Debug, Formatter};

use crate::cpl;
use crate::driver::Driver;
use crate::errors::*;
use crate::options::GdalOpenFlags;
use crate::raster::mdarray::overlay::{self, ArrayInterface};
use crate::raster::{GdalType, Group};

#[cfg(feature = "ndarray")]
use ndarray::{ArrayViewD, ArrayViewMutD};

/// A multidimensional dataset: a root [`Group`] and the driver that made it.
///
/// Datasets created by the `MEM` driver own their memory and are `'static`.
/// Overlay datasets borrow the memory they wrap for `'a`.
pub struct Dataset<'a> {
    description: String,
    driver: Driver,
    access: GdalOpenFlags,
    root_group: Group<'a>,
}

impl<'a> Dataset<'a> {
    pub(crate) fn new_multidim(
        driver: Driver,
        description: String,
        access: GdalOpenFlags,
        root_group: Group<'a>,
    ) -> Self {
        Dataset {
            description,
            driver,
            access,
            root_group,
        }
    }

    /// Wrap a block of memory described by `interface` as a dataset whose root
    /// group holds one array named `array` over dimensions `dim0..dimN-1`.
    ///
    /// # Safety
    /// `interface.data` and `interface.strides` must address valid, aligned memory
    /// for every index within `interface.shape` for as long as `'a`, and nothing
    /// else may write to it during `'a`. When `interface.readonly` is unset the
    /// memory must be writable as well.
    pub unsafe fn open_array_interface(interface: &ArrayInterface) -> Result<Dataset<'a>> {
        let (datatype, strides) = interface.layout()?;
        let writable = !interface.readonly;
        let root_group = overlay::build_root_group(
            &interface.shape,
            datatype,
            interface.data,
            strides,
            writable,
        )?;
        Ok(Self::overlay(interface.data, writable, root_group))
    }

    /// Wrap `data` read-only: element `idx` of the array is
    /// `data[offset + Σ idx[i] * strides[i]]`. Strides are in elements and may be negative.
    pub fn open_strided_slice<T: GdalType>(
        data: &'a [T],
        shape: &[usize],
        strides: &[isize],
        offset: usize,
    ) -> Result<Dataset<'a>> {
        overlay::check_strided_slice(data.len(), shape, strides, offset)?;
        let origin = data.as_ptr().wrapping_add(offset) as *mut u8;
        // SAFETY: every addressed element lies inside `data`, borrowed for 'a,
        // and the overlay never writes through a read-only storage.
        unsafe { Self::open_typed::<T>(origin, shape, strides, false) }
    }

    /// Wrap `data` read-write, see [`open_strided_slice`](Self::open_strided_slice).
    pub fn open_strided_slice_mut<T: GdalType>(
        data: &'a mut [T],
        shape: &[usize],
        strides: &[isize],
        offset: usize,
    ) -> Result<Dataset<'a>> {
        overlay::check_strided_slice(data.len(), shape, strides, offset)?;
        let origin = data.as_mut_ptr().wrapping_add(offset) as *mut u8;
        // SAFETY: every addressed element lies inside `data`, exclusively borrowed for 'a.
        unsafe { Self::open_typed::<T>(origin, shape, strides, true) }
    }

    #[cfg(feature = "ndarray")]
    /// Wrap an [`ndarray`] view read-only, keeping its strides.
    pub fn open_array_view<T: GdalType>(view: ArrayViewD<'a, T>) -> Result<Dataset<'a>> {
        let origin = view.as_ptr() as *mut u8;
        // SAFETY: the view guarantees its elements are readable for 'a.
        unsafe { Self::open_typed::<T>(origin, view.shape(), view.strides(), false) }
    }

    #[cfg(feature = "ndarray")]
    /// Wrap an [`ndarray`] mutable view read-write, keeping its strides.
    pub fn open_array_view_mut<T: GdalType>(mut view: ArrayViewMutD<'a, T>) -> Result<Dataset<'a>> {
        let origin = view.as_mut_ptr() as *mut u8;
        // SAFETY: the view guarantees its elements are exclusively borrowed for 'a.
        unsafe { Self::open_typed::<T>(origin, view.shape(), view.strides(), true) }
    }

    /// # Safety
    /// See [`overlay::build_root_group`], with element strides.
    unsafe fn open_typed<T: GdalType>(
        origin: *mut u8,
        shape: &[usize],
        strides: &[isize],
        writable: bool,
    ) -> Result<Dataset<'a>> {
        if shape.len() != strides.len() {
            return Err(cpl::report(GdalError::BadArgument(format!(
                "{} strides given for {} dimensions",
                strides.len(),
                shape.len()
            ))));
        }
        let byte_strides = overlay::to_byte_strides(shape, strides, std::mem::size_of::<T>())?;
        let root_group =
            overlay::build_root_group(shape, T::datatype(), origin, byte_strides, writable)?;
        Ok(Self::overlay(origin, writable, root_group))
    }

    fn overlay(origin: *mut u8, writable: bool, root_group: Group<'a>) -> Self {
        Self::new_multidim(
            Driver::array(),
            format!("ARRAY:::{origin:p}"),
            GdalOpenFlags::multidim(writable),
            root_group,
        )
    }

    /// Opens the root group of a multi-dim GDAL raster
    pub fn root_group(&self) -> Result<Group<'a>> {
        Ok(self.root_group.clone())
    }

    pub fn driver(&self) -> Driver {
        self.driver
    }

    /// Name given at creation, or the address of the wrapped memory.
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn access(&self) -> GdalOpenFlags {
        self.access
    }
}

impl Debug for Dataset<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dataset")
            .field("description", &self.description)
            .field("driver", &self.driver.short_name())
            .field("access", &self.access)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpl::CslStringList;
    use crate::errors::ErrorKind;
    use crate::raster::ArrayWindow;
    use crate::test_utils::SuppressGDALErrorLog;
    use num_complex::Complex;

    #[test]
    fn test_open_strided_slice() {
        let data = [1u16, 2, 3, 4, 5, 6];
        let dataset = Dataset::open_strided_slice(&data, &[2, 3], &[3, 1], 0).unwrap();
        assert_eq!(dataset.driver().short_name(), "ARRAY");
        assert!(!dataset.access().is_update());

        let root = dataset.root_group().unwrap();
        assert_eq!(root.array_names(CslStringList::new()), ["array"]);
        let dims: Vec<_> = root
            .dimensions(CslStringList::new())
            .unwrap()
            .iter()
            .map(|d| (d.name().to_string(), d.size()))
            .collect();
        assert_eq!(dims, [("dim0".to_string(), 2), ("dim1".to_string(), 3)]);

        let array = root.open_md_array("array", CslStringList::new()).unwrap();
        assert_eq!(array.full_name(), "/array");
        assert_eq!(array.read_as::<u16>(vec![0, 0], vec![2, 3]).unwrap(), data);
        assert_eq!(array.read_as::<f64>(vec![1, 1], vec![1, 2]).unwrap(), [5., 6.]);
    }

    #[test]
    fn test_open_strided_slice_reversed() {
        let data = [1i32, 2, 3, 4, 5, 6];
        let dataset = Dataset::open_strided_slice(&data, &[2, 3], &[-3, -1], 5).unwrap();
        let array = dataset
            .root_group()
            .unwrap()
            .open_md_array("array", CslStringList::new())
            .unwrap();
        assert_eq!(
            array.read_as::<i32>(vec![0, 0], vec![2, 3]).unwrap(),
            [6, 5, 4, 3, 2, 1]
        );
    }

    #[test]
    fn test_open_strided_slice_complex() {
        let data: Vec<Complex<f32>> = (1..=4).map(|i| Complex::new(i as f32, -1.)).collect();
        let dataset = Dataset::open_strided_slice(&data, &[2, 2], &[1, 2], 0).unwrap();
        let array = dataset
            .root_group()
            .unwrap()
            .open_md_array("array", CslStringList::new())
            .unwrap();
        assert_eq!(array.datatype().name(), "CFloat32");
        let real = array.read_as::<f64>(vec![0, 0], vec![2, 2]).unwrap();
        assert_eq!(real, [1., 3., 2., 4.]);
    }

    #[test]
    fn test_open_strided_slice_mut() {
        let mut data = [0u8; 6];
        {
            let dataset = Dataset::open_strided_slice_mut(&mut data, &[3, 2], &[1, 3], 0).unwrap();
            assert!(dataset.access().is_update());
            let array = dataset
                .root_group()
                .unwrap()
                .open_md_array("array", CslStringList::new())
                .unwrap();
            array
                .write_slice(&[1u8, 2, 3, 4, 5, 6], vec![0, 0], vec![3, 2])
                .unwrap();
        }
        assert_eq!(data, [1, 3, 5, 2, 4, 6]);
    }

    #[test]
    fn test_read_only_overlay() {
        let _nolog = SuppressGDALErrorLog::new();
        let data = [1u8, 2, 3];
        let dataset = Dataset::open_strided_slice(&data, &[3], &[1], 0).unwrap();
        let root = dataset.root_group().unwrap();
        let array = root.open_md_array("array", CslStringList::new()).unwrap();
        assert!(!array.is_writable());

        let err = array.write_slice(&[9u8], vec![0], vec![1]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotSupported);
        let err = root
            .create_group("sub", CslStringList::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotSupported);
        assert_eq!(data, [1, 2, 3]);
    }

    #[test]
    fn test_slice_bounds() {
        let _nolog = SuppressGDALErrorLog::new();
        let data = [0u8; 5];
        let err = Dataset::open_strided_slice(&data, &[2, 3], &[3, 1], 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        let err = Dataset::open_strided_slice(&data, &[], &[], 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        let err = Dataset::open_strided_slice(&data, &[2], &[1], usize::MAX).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        let err = Dataset::open_strided_slice(&data, &[2], &[isize::MAX], 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_stride_of_single_element_axis_is_ignored() {
        let data = [1u64, 2, 3];
        let dataset = Dataset::open_strided_slice(&data, &[1, 3], &[isize::MAX, 1], 0).unwrap();
        let array = dataset
            .root_group()
            .unwrap()
            .open_md_array("array", CslStringList::new())
            .unwrap();
        assert_eq!(array.read_as::<u64>(vec![0, 0], vec![1, 3]).unwrap(), data);
    }

    #[cfg(feature = "ndarray")]
    #[test]
    fn test_open_empty_array_view() {
        let a = ndarray::Array1::<u8>::zeros(0).into_dyn();
        let dataset = Dataset::open_array_view(a.view()).unwrap();
        let array = dataset
            .root_group()
            .unwrap()
            .open_md_array("array", CslStringList::new())
            .unwrap();
        assert_eq!(array.shape(), [0]);
    }

    #[test]
    fn test_open_array_interface() {
        let mut data = [1.5f64, 2.5, 3.5, 4.5];
        let native = if cfg!(target_endian = "little") {
            "<"
        } else {
            ">"
        };
        let interface = ArrayInterface {
            shape: vec![2, 2],
            typestr: format!("{native}f8"),
            strides: Some(vec![8, 16]),
            data: data.as_mut_ptr() as *mut u8,
            readonly: true,
        };
        let dataset = unsafe { Dataset::open_array_interface(&interface) }.unwrap();
        let array = dataset
            .root_group()
            .unwrap()
            .open_md_array("array", CslStringList::new())
            .unwrap();
        let bytes = array.read_as_bytes(&ArrayWindow::full(&array)).unwrap();
        let values: Vec<f64> = bytemuck::pod_collect_to_vec(&bytes);
        assert_eq!(values, [1.5, 3.5, 2.5, 4.5]);
    }

    #[test]
    fn test_array_interface_rejects_unicode() {
        let _nolog = SuppressGDALErrorLog::new();
        let mut data = [0u8; 24];
        let interface = ArrayInterface {
            shape: vec![2, 3],
            typestr: "<U1".to_string(),
            strides: None,
            data: data.as_mut_ptr(),
            readonly: false,
        };
        let err = unsafe { Dataset::open_array_interface(&interface) }.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotSupported);
        assert!(err
            .to_string()
            .contains("Unable to access arrays of typecode `U'"));
    }

    #[cfg(feature = "ndarray")]
    #[test]
    fn test_open_array_view() {
        let a = ndarray::arr2(&[[1i8, 2, 3], [4, 5, 6]]);
        let flipped = a.slice(ndarray::s![..;-1, ..;-1]).into_dyn();
        let dataset = Dataset::open_array_view(flipped.view()).unwrap();
        let array = dataset
            .root_group()
            .unwrap()
            .open_md_array("array", CslStringList::new())
            .unwrap();
        assert_eq!(array.read_as_array::<i8>(vec![0, 0], vec![2, 3]).unwrap(), flipped);
    }

    #[cfg(feature = "ndarray")]
    #[test]
    fn test_open_array_view_mut() {
        let mut a = ndarray::Array2::<f32>::zeros((2, 3));
        {
            let dataset = Dataset::open_array_view_mut(a.view_mut().reversed_axes().into_dyn())
                .unwrap();
            let array = dataset
                .root_group()
                .unwrap()
                .open_md_array("array", CslStringList::new())
                .unwrap();
            assert_eq!(array.shape(), [3, 2]);
            array
                .write_slice(&[1f32, 2., 3., 4., 5., 6.], vec![0, 0], vec![3, 2])
                .unwrap();
        }
        assert_eq!(a, ndarray::arr2(&[[1., 3., 5.], [2., 4., 6.]]));
    }
}
