use std::cell::RefCell;
use std::marker::PhantomData;
use std::ptr::NonNull;

use crate::errors::{GdalError, Result};

/// Backing bytes of an array.
///
/// Element `[0, .., 0]` is at the returned pointer; the owning array keeps the
/// per-axis byte strides.
pub(crate) enum Storage<'a> {
    /// Zero-initialized row-major buffer owned by the array.
    Owned(RefCell<Vec<u8>>),
    /// Memory owned by someone else that outlives `'a`. Never freed or reallocated here.
    External {
        origin: NonNull<u8>,
        writable: bool,
        _marker: PhantomData<&'a mut [u8]>,
    },
}

impl<'a> Storage<'a> {
    pub(crate) fn owned(len: usize) -> Self {
        Storage::Owned(RefCell::new(vec![0u8; len]))
    }

    /// # Safety
    /// `origin` plus every offset the owning array can address must stay valid for `'a`,
    /// and for writes as well if `writable` is set.
    pub(crate) unsafe fn external(origin: *mut u8, writable: bool) -> Self {
        Storage::External {
            origin: NonNull::new(origin).unwrap_or(NonNull::dangling()),
            writable,
            _marker: PhantomData,
        }
    }

    pub(crate) fn is_writable(&self) -> bool {
        match self {
            Storage::Owned(_) => true,
            Storage::External { writable, .. } => *writable,
        }
    }

    pub(crate) fn with_read_ptr<R>(&self, f: impl FnOnce(*const u8) -> R) -> R {
        match self {
            Storage::Owned(data) => f(data.borrow().as_ptr()),
            Storage::External { origin, .. } => f(origin.as_ptr()),
        }
    }

    pub(crate) fn with_write_ptr<R>(&self, f: impl FnOnce(*mut u8) -> R) -> Result<R> {
        match self {
            Storage::Owned(data) => Ok(f(data.borrow_mut().as_mut_ptr())),
            Storage::External {
                origin,
                writable: true,
                ..
            } => Ok(f(origin.as_ptr())),
            Storage::External { .. } => Err(GdalError::NotSupported(
                "array is backed by read-only memory".to_string(),
            )),
        }
    }
}

impl std::fmt::Debug for Storage<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Storage::Owned(data) => write!(f, "Owned({} bytes)", data.borrow().len()),
            Storage::External {
                origin, writable, ..
            } => write!(f, "External({:p}, writable: {writable})", origin.as_ptr()),
        }
    }
}
