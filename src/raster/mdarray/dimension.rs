use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::rc::{Rc, Weak};

use crate::cpl;
use crate::errors::{GdalError, Result};
use crate::raster::mdarray::{MDArray, MDArrayInner};

/// A named, sized axis owned by a [`Group`](super::Group).
///
/// Cloning a `Dimension` yields another handle to the same axis.
#[derive(Clone)]
pub struct Dimension<'a> {
    pub(crate) inner: Rc<DimensionInner<'a>>,
}

pub(crate) struct DimensionInner<'a> {
    name: String,
    full_name: String,
    dimension_type: String,
    direction: String,
    size: u64,
    // weak: the array itself holds this dimension
    indexing_variable: RefCell<Weak<MDArrayInner<'a>>>,
}

impl<'a> Dimension<'a> {
    /// Size of a dimension whose extent is not known or not bounded.
    pub const UNBOUNDED: u64 = u64::MAX;

    pub(crate) fn new(
        name: &str,
        full_name: String,
        dimension_type: &str,
        direction: &str,
        size: u64,
    ) -> Self {
        Self {
            inner: Rc::new(DimensionInner {
                name: name.to_string(),
                full_name,
                dimension_type: dimension_type.to_string(),
                direction: direction.to_string(),
                size,
                indexing_variable: RefCell::new(Weak::new()),
            }),
        }
    }

    pub fn size(&self) -> u64 {
        self.inner.size
    }

    pub fn is_unbounded(&self) -> bool {
        self.inner.size == Self::UNBOUNDED
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn full_name(&self) -> &str {
        &self.inner.full_name
    }

    /// Type tag such as `HORIZONTAL_X` or `TEMPORAL`. Empty when unset.
    pub fn dimension_type(&self) -> &str {
        &self.inner.dimension_type
    }

    /// Direction tag such as `EAST` or `FUTURE`. Empty when unset.
    pub fn direction(&self) -> &str {
        &self.inner.direction
    }

    /// The array holding the coordinate values along this dimension, if any.
    pub fn indexing_variable(&self) -> Option<MDArray<'a>> {
        self.inner
            .indexing_variable
            .borrow()
            .upgrade()
            .map(|inner| MDArray { inner })
    }

    /// Link a one-dimensional array defined over this dimension as its indexing variable.
    pub fn set_indexing_variable(&self, array: &MDArray<'a>) -> Result<()> {
        let dimensions = array.dimensions();
        if dimensions.len() != 1 || !dimensions[0].same_as(self) {
            return Err(cpl::report(GdalError::BadArgument(format!(
                "array '{}' is not a one-dimensional array over dimension '{}'",
                array.name(),
                self.name()
            ))));
        }
        *self.inner.indexing_variable.borrow_mut() = Rc::downgrade(&array.inner);
        Ok(())
    }

    /// Whether both handles refer to the same dimension.
    pub fn same_as(&self, other: &Dimension<'_>) -> bool {
        std::ptr::eq(
            Rc::as_ptr(&self.inner) as *const u8,
            Rc::as_ptr(&other.inner) as *const u8,
        )
    }
}

impl Debug for Dimension<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dimension")
            .field("full_name", &self.inner.full_name)
            .field("size", &self.inner.size)
            .field("dimension_type", &self.inner.dimension_type)
            .field("direction", &self.inner.direction)
            .finish()
    }
}
