//! In-memory multidimensional arrays modelled on [GDAL](http://gdal.org/)'s
//! multidimensional raster API.
//!
//! A [`Dataset`] owns a root [`Group`](raster::Group) holding named
//! [`Dimension`](raster::Dimension)s, typed [`MDArray`](raster::MDArray)s, child
//! groups and attributes. Arrays are read and written through hyper-rectangular
//! windows with per-dimension steps and buffer strides, both of which may be
//! negative, converting elements to and from the caller's buffer type on the way.
//!
//! Datasets come from the `MEM` driver, which owns its memory, or wrap memory
//! owned by the caller without copying it ([`Dataset::open_strided_slice`],
//! [`Dataset::open_array_interface`], and with the `array` feature
//! `Dataset::open_array_view`).
//!
//! ## Use
//!
//! ```
//! use gdal_mdim::cpl::CslStringList;
//! use gdal_mdim::raster::{ArrayWindow, ExtendedDataType, GdalDataType};
//! use gdal_mdim::DriverManager;
//!
//! let driver = DriverManager::get_driver_by_name("MEM").unwrap();
//! let dataset = driver
//!     .create_multidim("myds", CslStringList::new(), CslStringList::new())
//!     .unwrap();
//! let root = dataset.root_group().unwrap();
//! let y = root.create_dimension("y", "", "", 2, CslStringList::new()).unwrap();
//! let x = root.create_dimension("x", "", "", 3, CslStringList::new()).unwrap();
//! let array = root
//!     .create_md_array(
//!         "myarray",
//!         &[y, x],
//!         &ExtendedDataType::create(GdalDataType::UInt8).unwrap(),
//!         CslStringList::new(),
//!     )
//!     .unwrap();
//! array.write_slice(&[1u8, 2, 3, 4, 5, 6], vec![0, 0], vec![2, 3]).unwrap();
//!
//! // column-major copy of the whole array
//! let window = ArrayWindow::full(&array).with_buffer_stride(vec![1, 2]);
//! let mut buffer = [0u8; 6];
//! array
//!     .read(&window, &ExtendedDataType::create(GdalDataType::UInt8).unwrap(), &mut buffer)
//!     .unwrap();
//! assert_eq!(buffer, [1, 4, 2, 5, 3, 6]);
//! ```

#![crate_type = "lib"]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod config;
pub mod cpl;
mod dataset;
mod driver;
pub mod errors;
mod options;
pub mod raster;

pub use dataset::Dataset;
pub use driver::{Driver, DriverManager};
pub use options::GdalOpenFlags;
pub use raster::mdarray::overlay::{
    parse_typestr, typestr, ArrayInterface, FieldDescription, TypeDescription, OVERLAY_ARRAY_NAME,
};

#[cfg(test)]
pub(crate) mod test_utils;
