use std::ffi::c_void;
use std::marker::PhantomData;

use crate::config;
use crate::cpl::CslStringList;
use crate::raster::{ExtendedDataType, GdalDataType};
use crate::{Dataset, DriverManager};

/// Scoped value for temporarily suppressing thread-local log messages.
///
/// Useful for tests that expect errors and want to keep the output log clean
/// of distracting yet expected error messages.
pub(crate) struct SuppressGDALErrorLog {
    // Make !Sync and !Send, and force use of `new`.
    _private: PhantomData<*mut c_void>,
}

impl SuppressGDALErrorLog {
    pub(crate) fn new() -> Self {
        config::push_error_handler(config::quiet_error_handler);
        SuppressGDALErrorLog {
            _private: PhantomData,
        }
    }
}

impl Drop for SuppressGDALErrorLog {
    fn drop(&mut self) {
        config::pop_error_handler();
    }
}

/// A `MEM` dataset whose root group holds dimensions `dim0` (2) and `dim1` (3)
/// and a byte array `myarray` over them, filled with `[[1, 2, 3], [4, 5, 6]]`.
pub fn mem_dataset_2x3() -> Dataset<'static> {
    let driver = DriverManager::get_driver_by_name("MEM").unwrap();
    let dataset = driver
        .create_multidim("myds", CslStringList::new(), CslStringList::new())
        .unwrap();
    let root = dataset.root_group().unwrap();
    let dim0 = root
        .create_dimension("dim0", "", "", 2, CslStringList::new())
        .unwrap();
    let dim1 = root
        .create_dimension("dim1", "", "", 3, CslStringList::new())
        .unwrap();
    let array = root
        .create_md_array(
            "myarray",
            &[dim0, dim1],
            &ExtendedDataType::create(GdalDataType::UInt8).unwrap(),
            CslStringList::new(),
        )
        .unwrap();
    array
        .write_slice(&[1u8, 2, 3, 4, 5, 6], vec![0, 0], vec![2, 3])
        .unwrap();
    dataset
}

/// Assert numerical difference between two expressions is less than
/// 64-bit machine epsilon or a specified epsilon.
///
/// # Examples:
/// ```rust, ignore
/// use std::f64::consts::{PI, E};
/// assert_near!(PI / E, 1.1557273497909217);
/// // with specified epsilon
/// assert_near!(PI / E, 1.15572734, epsilon = 1e-8);
/// // element-wise on slices
/// assert_near!(slice, [0.5, 1.5], [0.5, 1.5 + 1e-12], epsilon = 1e-9);
/// ```
#[macro_export]
macro_rules! assert_near {
    ($left:expr, $right:expr) => {
        assert_near!($left, $right, epsilon = f64::EPSILON)
    };
    ($left:expr, $right:expr, epsilon = $ep:expr) => {
        assert!(
            ($left - $right).abs() < $ep,
            "|{} - {}| = {} is greater than epsilon {:.4e}",
            $left,
            $right,
            ($left - $right).abs(),
            $ep
        )
    };
    ($left:expr, $right:expr, epsilon = $ep:expr, field = $field:expr) => {
        assert!(
            ($left - $right).abs() < $ep,
            "field {}: |{} - {}| = {} is greater than epsilon {:.4e}",
            $field,
            $left,
            $right,
            ($left - $right).abs(),
            $ep
        )
    };
    // Pseudo-specialization
    (slice, $left:expr, $right:expr, epsilon = $ep:expr) => {
        let (left, right) = (&$left, &$right);
        assert_eq!(left.len(), right.len(), "slice lengths differ");
        for (i, (l, r)) in left.iter().zip(right.iter()).enumerate() {
            assert_near!(*l, *r, epsilon = $ep, field = i);
        }
    };
}
