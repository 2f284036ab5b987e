//! Multidimensional arrays, their dimensions, element types and groups.

mod attribute;
mod convert;
mod copy;
mod datatype;
mod dimension;
mod group;
pub(crate) mod overlay;
mod storage;

use std::cell::{Cell, RefCell};
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

pub use attribute::{Attribute, AttributeValue};
pub use copy::row_major_strides;
pub use datatype::{EdtComponent, ExtendedDataType, ExtendedDataTypeClass};
pub use dimension::Dimension;
pub use group::Group;

use crate::cpl;
use crate::errors::{GdalError, Result};
use crate::raster::{GdalType, MdBuffer};
use attribute::AttributeTable;
use copy::{buffer_span, copy_strided};
use datatype::ElementConverter;
use storage::Storage;

#[cfg(feature = "ndarray")]
use ndarray::{ArrayD, ArrayViewD, ArrayViewMutD, IxDyn};

/// The hyper-rectangle of an array selected by a read or a write, and the
/// layout of the caller's buffer.
///
/// * `array_start_index`: index of the first selected element along every dimension.
/// * `count`: number of selected elements along every dimension.
/// * `array_step`: distance, in elements, between two selected elements along every
///   dimension. May be zero or negative. `None` means 1 everywhere.
/// * `buffer_stride`: distance, in elements, between two consecutive buffer elements
///   along every dimension. May be zero or negative. `None` means a compact
///   row-major buffer.
///
/// A zero-dimensional array takes empty vectors.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArrayWindow {
    pub array_start_index: Vec<u64>,
    pub count: Vec<usize>,
    pub array_step: Option<Vec<i64>>,
    pub buffer_stride: Option<Vec<isize>>,
}

impl ArrayWindow {
    pub fn new(array_start_index: Vec<u64>, count: Vec<usize>) -> Self {
        Self {
            array_start_index,
            count,
            array_step: None,
            buffer_stride: None,
        }
    }

    /// The whole of `array`, into a compact row-major buffer.
    pub fn full(array: &MDArray<'_>) -> Self {
        let shape = array.shape();
        Self::new(
            vec![0; shape.len()],
            shape.iter().map(|&s| s as usize).collect(),
        )
    }

    pub fn with_array_step(mut self, array_step: Vec<i64>) -> Self {
        self.array_step = Some(array_step);
        self
    }

    pub fn with_buffer_stride(mut self, buffer_stride: Vec<isize>) -> Self {
        self.buffer_stride = Some(buffer_stride);
        self
    }

    /// Number of selected elements, `None` if it does not fit in a `usize`.
    pub fn num_elements(&self) -> Option<usize> {
        self.count
            .iter()
            .try_fold(1usize, |acc, &c| acc.checked_mul(c))
    }

    /// Buffer strides in elements, defaulting to compact row-major.
    pub fn buffer_strides(&self) -> Vec<isize> {
        match &self.buffer_stride {
            Some(strides) => strides.clone(),
            None => row_major_strides(&self.count),
        }
    }
}

/// A validated window, expressed against the array's storage.
#[derive(Debug)]
struct Selection {
    count: Vec<usize>,
    /// Byte offset of the first selected element from element `[0, .., 0]`.
    offset: isize,
    /// Byte distance between two selected elements along every dimension.
    strides: Vec<isize>,
}

impl Selection {
    fn is_empty(&self) -> bool {
        self.count.iter().any(|&c| c == 0)
    }
}

/// Byte strides of a buffer. Axes that are never stepped along get 0.
fn byte_strides(count: &[usize], strides: &[isize], elem_size: usize) -> Vec<isize> {
    count
        .iter()
        .zip(strides)
        .map(|(&c, &s)| if c > 1 { s * elem_size as isize } else { 0 })
        .collect()
}

/// A typed N-dimensional array in a [`Group`].
///
/// Handles are reference counted: clones share the same array, and an array
/// stays alive while any handle to it exists. The lifetime `'a` is the lifetime
/// of the memory an overlay array was built over; arrays owning their data are
/// `'static`.
#[derive(Clone)]
pub struct MDArray<'a> {
    pub(crate) inner: Rc<MDArrayInner<'a>>,
}

pub(crate) struct MDArrayInner<'a> {
    name: String,
    full_name: String,
    dimensions: Vec<Dimension<'a>>,
    datatype: ExtendedDataType,
    storage: Storage<'a>,
    strides: Vec<isize>,
    unit: RefCell<String>,
    no_data: Cell<Option<f64>>,
    attributes: AttributeTable,
}

impl<'a> MDArray<'a> {
    /// Allocate a zero-filled row-major array.
    pub(crate) fn new_owned(
        name: &str,
        full_name: String,
        dimensions: Vec<Dimension<'a>>,
        datatype: ExtendedDataType,
    ) -> Result<Self> {
        if !datatype.is_fixed_layout() {
            return Err(cpl::report(GdalError::UnsupportedMdDataType {
                data_type: datatype,
                method_name: "CreateMDArray",
            }));
        }
        let too_large = || {
            cpl::report(GdalError::BadArgument(format!(
                "array '{name}' is too large to be held in memory"
            )))
        };

        let mut shape = Vec::with_capacity(dimensions.len());
        for dimension in &dimensions {
            if dimension.is_unbounded() {
                return Err(cpl::report(GdalError::BadArgument(format!(
                    "cannot create array '{name}' over unbounded dimension '{}'",
                    dimension.name()
                ))));
            }
            shape.push(usize::try_from(dimension.size()).map_err(|_| too_large())?);
        }
        let num_bytes = shape
            .iter()
            .try_fold(datatype.size(), |acc, &s| acc.checked_mul(s))
            .filter(|&n| isize::try_from(n).is_ok())
            .ok_or_else(too_large)?;

        let elem_size = datatype.size() as isize;
        let strides = row_major_strides(&shape)
            .into_iter()
            .map(|s| s * elem_size)
            .collect();

        cpl::debug(
            "MEM",
            &format!("allocating {num_bytes} bytes for array {full_name}"),
        );
        Ok(Self::from_parts(
            name,
            full_name,
            dimensions,
            datatype,
            Storage::owned(num_bytes),
            strides,
        ))
    }

    /// Wrap memory owned elsewhere.
    ///
    /// # Safety
    /// For every in-bounds multi-index `idx`, `origin + Σ idx[i] * strides[i]` must
    /// point to `datatype.size()` bytes valid for reads for `'a`, and for writes as
    /// well when `writable` is set. Nothing else may write to that memory during `'a`.
    pub(crate) unsafe fn new_external(
        name: &str,
        full_name: String,
        dimensions: Vec<Dimension<'a>>,
        datatype: ExtendedDataType,
        origin: *mut u8,
        strides: Vec<isize>,
        writable: bool,
    ) -> Self {
        debug_assert_eq!(dimensions.len(), strides.len());
        Self::from_parts(
            name,
            full_name,
            dimensions,
            datatype,
            Storage::external(origin, writable),
            strides,
        )
    }

    fn from_parts(
        name: &str,
        full_name: String,
        dimensions: Vec<Dimension<'a>>,
        datatype: ExtendedDataType,
        storage: Storage<'a>,
        strides: Vec<isize>,
    ) -> Self {
        MDArray {
            inner: Rc::new(MDArrayInner {
                name: name.to_string(),
                full_name,
                dimensions,
                datatype,
                storage,
                strides,
                unit: Default::default(),
                no_data: Default::default(),
                attributes: AttributeTable::default(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn full_name(&self) -> &str {
        &self.inner.full_name
    }

    pub fn num_dimensions(&self) -> usize {
        self.inner.dimensions.len()
    }

    /// Product of the dimension sizes; 1 for a zero-dimensional array.
    pub fn num_elements(&self) -> u64 {
        self.inner.dimensions.iter().map(Dimension::size).product()
    }

    pub fn dimensions(&self) -> Vec<Dimension<'a>> {
        self.inner.dimensions.clone()
    }

    pub fn shape(&self) -> Vec<u64> {
        self.inner.dimensions.iter().map(Dimension::size).collect()
    }

    pub fn datatype(&self) -> ExtendedDataType {
        self.inner.datatype.clone()
    }

    /// Whether [`write`](Self::write) can succeed on this array.
    pub fn is_writable(&self) -> bool {
        self.inner.storage.is_writable()
    }

    /// Whether both handles refer to the same array.
    pub fn same_as(&self, other: &MDArray<'_>) -> bool {
        std::ptr::eq(
            Rc::as_ptr(&self.inner) as *const u8,
            Rc::as_ptr(&other.inner) as *const u8,
        )
    }

    /// Check `window` against the shape of the array.
    fn select(&self, window: &ArrayWindow) -> Result<Selection> {
        let rank = self.num_dimensions();
        let lengths_match = window.array_start_index.len() == rank
            && window.count.len() == rank
            && window.array_step.as_ref().map_or(true, |s| s.len() == rank)
            && window.buffer_stride.as_ref().map_or(true, |s| s.len() == rank);
        if !lengths_match {
            return Err(cpl::report(GdalError::BadArgument(format!(
                "array '{}' has {rank} dimensions, window arguments must all have {rank} values",
                self.name()
            ))));
        }

        let mut offset = 0isize;
        let mut strides = Vec::with_capacity(rank);
        for (i, dimension) in self.inner.dimensions.iter().enumerate() {
            let size = dimension.size();
            let start = window.array_start_index[i];
            let count = window.count[i];
            let step = window.array_step.as_ref().map_or(1, |s| s[i]);
            let out_of_range = |index: i128| {
                cpl::report(GdalError::OutOfRange {
                    dimension: dimension.name().to_string(),
                    index: i64::try_from(index).unwrap_or(if index < 0 {
                        i64::MIN
                    } else {
                        i64::MAX
                    }),
                    size,
                })
            };

            if count == 0 {
                if start > size {
                    return Err(out_of_range(start as i128));
                }
            } else {
                if start >= size {
                    return Err(out_of_range(start as i128));
                }
                let last = start as i128 + (count as i128 - 1) * step as i128;
                if last < 0 || last >= size as i128 {
                    return Err(out_of_range(last));
                }
            }

            let array_stride = self.inner.strides[i];
            offset = offset.wrapping_add((start as isize).wrapping_mul(array_stride));
            strides.push(if count > 1 {
                step as isize * array_stride
            } else {
                0
            });
        }

        Ok(Selection {
            count: window.count.clone(),
            offset,
            strides,
        })
    }

    /// Check the buffer side of a transfer and return the byte offset of buffer
    /// element `[0, .., 0]` inside a slice of `buffer_len` bytes.
    fn buffer_base(
        &self,
        window: &ArrayWindow,
        buffer_datatype: &ExtendedDataType,
        buffer_len: usize,
    ) -> Result<(usize, Vec<isize>)> {
        let strides = window.buffer_strides();
        let elem_size = buffer_datatype.size();
        let span = buffer_span(&window.count, &strides, elem_size).map_err(cpl::report)?;
        if buffer_len < span.len {
            return Err(cpl::report(GdalError::BadArgument(format!(
                "buffer of {buffer_len} bytes is too small for the requested window of array '{}', {} bytes needed",
                self.name(),
                span.len
            ))));
        }
        Ok((span.base, byte_strides(&window.count, &strides, elem_size)))
    }

    /// Copy the selected elements to `dst`, element `[0, .., 0]` of the buffer.
    ///
    /// # Safety
    /// Every buffer element addressed through `dst_strides` must be writable.
    unsafe fn read_raw(
        &self,
        selection: &Selection,
        convert: &ElementConverter,
        dst: *mut u8,
        dst_strides: &[isize],
        dst_elem_size: usize,
    ) {
        if selection.is_empty() {
            return;
        }
        let src_elem_size = self.inner.datatype.size();
        self.inner.storage.with_read_ptr(|origin| {
            copy_strided(
                &selection.count,
                origin.wrapping_offset(selection.offset),
                &selection.strides,
                src_elem_size,
                dst,
                dst_strides,
                dst_elem_size,
                convert,
            )
        });
    }

    /// # Safety
    /// Every buffer element addressed through `src_strides` must be readable.
    unsafe fn write_raw(
        &self,
        selection: &Selection,
        convert: &ElementConverter,
        src: *const u8,
        src_strides: &[isize],
        src_elem_size: usize,
    ) -> Result<()> {
        let dst_elem_size = self.inner.datatype.size();
        let empty = selection.is_empty();
        self.inner
            .storage
            .with_write_ptr(|origin| {
                if !empty {
                    copy_strided(
                        &selection.count,
                        src,
                        src_strides,
                        src_elem_size,
                        origin.wrapping_offset(selection.offset),
                        &selection.strides,
                        dst_elem_size,
                        convert,
                    )
                }
            })
            .map_err(cpl::report)
    }

    /// Read a window of the array into `buffer`, converting every element to `buffer_datatype`.
    ///
    /// `buffer` starts at the lowest addressed byte of the window's buffer layout:
    /// with negative buffer strides, element `[0, .., 0]` is not at the start of the slice.
    /// All arguments are validated before any byte is copied, and a window with a zero
    /// count is validated and then does nothing.
    pub fn read(
        &self,
        window: &ArrayWindow,
        buffer_datatype: &ExtendedDataType,
        buffer: &mut [u8],
    ) -> Result<()> {
        let selection = self.select(window)?;
        let convert =
            ElementConverter::new(&self.inner.datatype, buffer_datatype).map_err(cpl::report)?;
        let (base, strides) = self.buffer_base(window, buffer_datatype, buffer.len())?;
        // SAFETY: `buffer_base` checked that every addressed element lies inside `buffer`.
        unsafe {
            let dst = buffer.as_mut_ptr().wrapping_add(base);
            self.read_raw(&selection, &convert, dst, &strides, buffer_datatype.size());
        }
        Ok(())
    }

    /// Write a window of the array from `buffer`, the mirror of [`read`](Self::read).
    pub fn write(
        &self,
        window: &ArrayWindow,
        buffer_datatype: &ExtendedDataType,
        buffer: &[u8],
    ) -> Result<()> {
        if !self.is_writable() {
            return Err(cpl::report(GdalError::NotSupported(format!(
                "array '{}' is read-only",
                self.name()
            ))));
        }
        let selection = self.select(window)?;
        let convert =
            ElementConverter::new(buffer_datatype, &self.inner.datatype).map_err(cpl::report)?;
        let (base, strides) = self.buffer_base(window, buffer_datatype, buffer.len())?;
        // SAFETY: `buffer_base` checked that every addressed element lies inside `buffer`.
        unsafe {
            let src = buffer.as_ptr().wrapping_add(base);
            self.write_raw(&selection, &convert, src, &strides, buffer_datatype.size())
        }
    }

    /// Read a window in the array's own element type into a new byte vector.
    pub fn read_as_bytes(&self, window: &ArrayWindow) -> Result<Vec<u8>> {
        self.select(window)?;
        let datatype = self.datatype();
        let len = buffer_span(&window.count, &window.buffer_strides(), datatype.size())
            .map_err(cpl::report)?
            .len;
        let mut buffer = vec![0u8; len];
        self.read(window, &datatype, &mut buffer)?;
        Ok(buffer)
    }

    /// Read a compact row-major window into `buffer`.
    ///
    /// # Params
    /// * buffer - Mutable buffer to read into, holding exactly the product of `count` elements.
    /// * array_start_index - Starting index to read in each dimension (in `[0, size - 1]`).
    ///   Empty for a zero-dimensional array.
    /// * count - Number of values to extract in each dimension.
    ///   Empty for a zero-dimensional array.
    pub fn read_into_slice<T: GdalType>(
        &self,
        buffer: &mut [T],
        array_start_index: Vec<u64>,
        count: Vec<usize>,
    ) -> Result<()> {
        let window = ArrayWindow::new(array_start_index, count);
        self.select(&window)?;
        check_slice_len(buffer.len(), &window)?;
        self.read(
            &window,
            &ExtendedDataType::of::<T>(),
            bytemuck::cast_slice_mut(buffer),
        )
    }

    /// Read a compact row-major window into a new `Vec<T>`.
    pub fn read_as<T: GdalType>(
        &self,
        array_start_index: Vec<u64>,
        count: Vec<usize>,
    ) -> Result<Vec<T>> {
        let window = ArrayWindow::new(array_start_index, count);
        self.select(&window)?;
        let pixels = window_len(&window)?;
        let mut data = vec![T::zeroed(); pixels];
        self.read(
            &window,
            &ExtendedDataType::of::<T>(),
            bytemuck::cast_slice_mut(&mut data),
        )?;
        Ok(data)
    }

    /// Read the whole array into an [`MdBuffer`].
    pub fn read_buffer<T: GdalType>(&self) -> Result<MdBuffer<T>> {
        let window = ArrayWindow::full(self);
        let data = self.read_as(window.array_start_index, window.count.clone())?;
        Ok(MdBuffer::new(window.count, data))
    }

    /// Write a compact row-major window from `buffer`.
    pub fn write_slice<T: GdalType>(
        &self,
        buffer: &[T],
        array_start_index: Vec<u64>,
        count: Vec<usize>,
    ) -> Result<()> {
        let window = ArrayWindow::new(array_start_index, count);
        self.select(&window)?;
        check_slice_len(buffer.len(), &window)?;
        self.write(
            &window,
            &ExtendedDataType::of::<T>(),
            bytemuck::cast_slice(buffer),
        )
    }

    #[cfg(feature = "ndarray")]
    /// Read a window into a new [`ArrayD`] of shape `count`.
    pub fn read_as_array<T: GdalType>(
        &self,
        array_start_index: Vec<u64>,
        count: Vec<usize>,
    ) -> Result<ArrayD<T>> {
        let data = self.read_as::<T>(array_start_index, count.clone())?;
        Ok(ArrayD::from_shape_vec(IxDyn(&count), data)?)
    }

    #[cfg(feature = "ndarray")]
    /// Read the window starting at `array_start_index` and shaped like `view`, in
    /// place, following the view's own strides.
    pub fn read_into_array<T: GdalType>(
        &self,
        array_start_index: Vec<u64>,
        mut view: ArrayViewMutD<'_, T>,
    ) -> Result<()> {
        let window = ArrayWindow::new(array_start_index, view.shape().to_vec())
            .with_buffer_stride(view.strides().to_vec());
        let selection = self.select(&window)?;
        let datatype = ExtendedDataType::of::<T>();
        let convert = ElementConverter::new(&self.inner.datatype, &datatype).map_err(cpl::report)?;
        let elem_size = std::mem::size_of::<T>();
        let strides = byte_strides(&window.count, view.strides(), elem_size);
        // SAFETY: the view's pointer and strides address exactly its own elements,
        // which the exclusive borrow lets us write.
        unsafe {
            self.read_raw(
                &selection,
                &convert,
                view.as_mut_ptr() as *mut u8,
                &strides,
                elem_size,
            );
        }
        Ok(())
    }

    #[cfg(feature = "ndarray")]
    /// Write `view` into the window starting at `array_start_index`, following the view's strides.
    pub fn write_array<T: GdalType>(
        &self,
        array_start_index: Vec<u64>,
        view: ArrayViewD<'_, T>,
    ) -> Result<()> {
        if !self.is_writable() {
            return Err(cpl::report(GdalError::NotSupported(format!(
                "array '{}' is read-only",
                self.name()
            ))));
        }
        let window = ArrayWindow::new(array_start_index, view.shape().to_vec());
        let selection = self.select(&window)?;
        let datatype = ExtendedDataType::of::<T>();
        let convert = ElementConverter::new(&datatype, &self.inner.datatype).map_err(cpl::report)?;
        let elem_size = std::mem::size_of::<T>();
        let strides = byte_strides(&window.count, view.strides(), elem_size);
        // SAFETY: the view's pointer and strides address exactly its own elements.
        unsafe {
            self.write_raw(
                &selection,
                &convert,
                view.as_ptr() as *const u8,
                &strides,
                elem_size,
            )
        }
    }

    pub fn unit(&self) -> String {
        self.inner.unit.borrow().clone()
    }

    pub fn set_unit(&self, unit: &str) {
        *self.inner.unit.borrow_mut() = unit.to_string();
    }

    /// The no-data value, if one was set. Only recorded; reads never substitute it.
    pub fn no_data_value_as_double(&self) -> Option<f64> {
        self.inner.no_data.get()
    }

    pub fn set_no_data_value_as_double(&self, value: Option<f64>) {
        self.inner.no_data.set(value);
    }

    pub fn attribute(&self, name: &str) -> Result<Attribute> {
        self.inner.attributes.get(name)
    }

    pub fn attributes(&self) -> Vec<Attribute> {
        self.inner.attributes.list()
    }

    pub fn create_attribute(&self, name: &str, value: AttributeValue) -> Result<Attribute> {
        self.inner.attributes.create(name, value)
    }
}

fn window_len(window: &ArrayWindow) -> Result<usize> {
    window.num_elements().ok_or_else(|| {
        cpl::report(GdalError::BadArgument(format!(
            "window of {:?} elements is too large",
            window.count
        )))
    })
}

fn check_slice_len(len: usize, window: &ArrayWindow) -> Result<()> {
    let expected = window_len(window)?;
    if len != expected {
        return Err(cpl::report(GdalError::BadArgument(format!(
            "buffer holds {len} elements but the window selects {expected}"
        ))));
    }
    Ok(())
}

impl Debug for MDArray<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MDArray")
            .field("full_name", &self.inner.full_name)
            .field("shape", &self.shape())
            .field("datatype", &self.inner.datatype.name())
            .field("storage", &self.inner.storage)
            .finish()
    }
}
