//! Typed multidimensional raster data

mod buffer;
pub mod mdarray;
mod types;

pub use buffer::{ByteMdBuffer, MdBuffer};
pub use mdarray::{
    row_major_strides, ArrayWindow, Attribute, AttributeValue, Dimension, EdtComponent,
    ExtendedDataType, ExtendedDataTypeClass, Group, MDArray,
};
pub use types::{GdalDataType, GdalType};
