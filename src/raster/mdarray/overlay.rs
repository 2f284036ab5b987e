//! Arrays over memory owned by the caller.

use crate::cpl;
use crate::errors::{GdalError, Result};
use crate::raster::mdarray::copy::buffer_span;
use crate::raster::mdarray::{
    Dimension, EdtComponent, ExtendedDataType, ExtendedDataTypeClass, Group, MDArray,
};
use crate::raster::GdalDataType;

/// Name of the single array of an overlay dataset.
pub const OVERLAY_ARRAY_NAME: &str = "array";

/// A block of strided memory described the way the numpy array interface does it.
///
/// * `shape`: extent of every dimension, at least one.
/// * `typestr`: byte order, kind and item size, e.g. `"<i4"`, `"|u1"` or `"<c16"`.
/// * `strides`: byte distance between two consecutive elements along every
///   dimension, or `None` for a C-contiguous block.
/// * `data`: address of element `[0, .., 0]`.
/// * `readonly`: reject writes through the overlay.
#[derive(Clone, Debug)]
pub struct ArrayInterface {
    pub shape: Vec<usize>,
    pub typestr: String,
    pub strides: Option<Vec<isize>>,
    pub data: *mut u8,
    pub readonly: bool,
}

fn native_order() -> char {
    if cfg!(target_endian = "little") {
        '<'
    } else {
        '>'
    }
}

fn unsupported_typecode(kind: char) -> GdalError {
    GdalError::NotSupported(format!("Unable to access arrays of typecode `{kind}'"))
}

/// Map an array interface `typestr` to the element type it describes.
pub fn parse_typestr(typestr: &str) -> Result<GdalDataType> {
    let mut chars = typestr.chars().peekable();
    let order = match chars.peek() {
        Some(&c @ ('<' | '>' | '|' | '=')) => {
            chars.next();
            Some(c)
        }
        _ => None,
    };
    let Some(kind) = chars.next() else {
        return Err(cpl::report(GdalError::BadArgument(format!(
            "invalid typestr '{typestr}'"
        ))));
    };
    let size: usize = chars.collect::<String>().parse().map_err(|_| {
        cpl::report(GdalError::BadArgument(format!(
            "invalid typestr '{typestr}'"
        )))
    })?;

    let foreign_order = match order {
        Some('<' | '>') => order != Some(native_order()) && size > 1,
        _ => false,
    };
    if foreign_order {
        return Err(cpl::report(unsupported_typecode(kind)));
    }

    let datatype = match (kind, size) {
        ('b', 1) | ('u', 1) => GdalDataType::UInt8,
        ('i', 1) => GdalDataType::Int8,
        ('u', 2) => GdalDataType::UInt16,
        ('i', 2) => GdalDataType::Int16,
        ('u', 4) => GdalDataType::UInt32,
        ('i', 4) => GdalDataType::Int32,
        ('u', 8) => GdalDataType::UInt64,
        ('i', 8) => GdalDataType::Int64,
        ('f', 4) => GdalDataType::Float32,
        ('f', 8) => GdalDataType::Float64,
        ('c', 8) => GdalDataType::CFloat32,
        ('c', 16) => GdalDataType::CFloat64,
        ('b' | 'i' | 'u' | 'f' | 'c', _) => {
            return Err(cpl::report(GdalError::NotSupported(format!(
                "Unable to access arrays of typecode `{kind}' with an item size of {size} bytes"
            ))))
        }
        _ => return Err(cpl::report(unsupported_typecode(kind))),
    };
    Ok(datatype)
}

/// The array interface `typestr` of a primitive type, in native byte order.
///
/// Complex integer types have no `typestr` and fail with `NotSupported`.
pub fn typestr(datatype: GdalDataType) -> Result<String> {
    use GdalDataType::*;
    let kind = match datatype {
        UInt8 | UInt16 | UInt32 | UInt64 => 'u',
        Int8 | Int16 | Int32 | Int64 => 'i',
        Float32 | Float64 => 'f',
        CFloat32 | CFloat64 => 'c',
        CInt16 | CInt32 | Unknown => {
            return Err(cpl::report(GdalError::NotSupported(format!(
                "no array interface typestr for data type {datatype}"
            ))))
        }
    };
    let order = if datatype.bytes() == 1 {
        '|'
    } else {
        native_order()
    };
    Ok(format!("{order}{kind}{}", datatype.bytes()))
}

/// Layout of an [`ExtendedDataType`] in array interface terms: a primitive
/// `typestr`, or a record of named fields at byte offsets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeDescription {
    Primitive(String),
    Compound {
        itemsize: usize,
        fields: Vec<FieldDescription>,
    },
}

/// One field of a [`TypeDescription::Compound`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDescription {
    pub name: String,
    pub offset: usize,
    pub datatype: TypeDescription,
}

impl TypeDescription {
    /// Size of one element in bytes.
    pub fn itemsize(&self) -> Result<usize> {
        match self {
            TypeDescription::Primitive(typestr) => Ok(parse_typestr(typestr)?.bytes()),
            TypeDescription::Compound { itemsize, .. } => Ok(*itemsize),
        }
    }
}

impl ExtendedDataType {
    /// Describe this type so that another party can lay out a compatible buffer.
    /// String types have no fixed layout and fail with `NotSupported`.
    pub fn description(&self) -> Result<TypeDescription> {
        match self.class() {
            ExtendedDataTypeClass::Numeric => {
                Ok(TypeDescription::Primitive(typestr(self.numeric_datatype())?))
            }
            ExtendedDataTypeClass::Compound => {
                let fields = self
                    .components()
                    .iter()
                    .map(|component| {
                        Ok(FieldDescription {
                            name: component.name().to_string(),
                            offset: component.offset(),
                            datatype: component.datatype().description()?,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(TypeDescription::Compound {
                    itemsize: self.size(),
                    fields,
                })
            }
            ExtendedDataTypeClass::String => Err(cpl::report(GdalError::NotSupported(
                "string data types have no fixed layout description".to_string(),
            ))),
        }
    }

    /// Build the type a description stands for. A compound description becomes a
    /// compound type called `name`; nested records are named after their field.
    pub fn from_description(name: &str, description: &TypeDescription) -> Result<Self> {
        match description {
            TypeDescription::Primitive(typestr) => Self::create(parse_typestr(typestr)?),
            TypeDescription::Compound { itemsize, fields } => {
                let components = fields
                    .iter()
                    .map(|field| {
                        Ok(EdtComponent::create(
                            &field.name,
                            field.offset,
                            Self::from_description(&field.name, &field.datatype)?,
                        ))
                    })
                    .collect::<Result<Vec<_>>>()?;
                Self::create_compound(name, *itemsize, components)
            }
        }
    }
}

/// Check that every element addressed by `shape` and element `strides` from
/// element index `offset` lies inside a slice of `len` elements.
pub(crate) fn check_strided_slice(
    len: usize,
    shape: &[usize],
    strides: &[isize],
    offset: usize,
) -> Result<()> {
    if shape.len() != strides.len() {
        return Err(cpl::report(GdalError::BadArgument(format!(
            "{} strides given for {} dimensions",
            strides.len(),
            shape.len()
        ))));
    }
    let span = buffer_span(shape, strides, 1).map_err(cpl::report)?;
    let inside = if span.len == 0 {
        offset <= len
    } else {
        offset
            .checked_sub(span.base)
            .and_then(|first| first.checked_add(span.len))
            .is_some_and(|end| end <= len)
    };
    if !inside {
        return Err(cpl::report(GdalError::BadArgument(format!(
            "shape {shape:?} with strides {strides:?} from offset {offset} addresses elements outside a slice of {len}"
        ))));
    }
    Ok(())
}

/// Convert element strides to byte strides. Axes of extent one or less are never
/// stepped along and get 0.
pub(crate) fn to_byte_strides(
    shape: &[usize],
    strides: &[isize],
    elem_size: usize,
) -> Result<Vec<isize>> {
    let elem_size = elem_size as isize;
    shape
        .iter()
        .zip(strides)
        .map(|(&size, &stride)| {
            if size <= 1 {
                return Ok(0);
            }
            stride.checked_mul(elem_size).ok_or_else(|| {
                cpl::report(GdalError::BadArgument(format!(
                    "stride {stride} overflows for elements of {elem_size} bytes"
                )))
            })
        })
        .collect()
}

/// Build the root group of an overlay dataset: dimensions `dim0..dimN-1` and one
/// array named [`OVERLAY_ARRAY_NAME`].
///
/// # Safety
/// `origin` and `byte_strides` must address valid memory of `datatype` elements
/// for every index within `shape` during `'a`, writable as well when `writable` is set.
pub(crate) unsafe fn build_root_group<'a>(
    shape: &[usize],
    datatype: GdalDataType,
    origin: *mut u8,
    byte_strides: Vec<isize>,
    writable: bool,
) -> Result<Group<'a>> {
    if shape.is_empty() {
        return Err(cpl::report(GdalError::BadArgument(
            "zero-dimensional arrays cannot be wrapped".to_string(),
        )));
    }
    if shape.len() != byte_strides.len() {
        return Err(cpl::report(GdalError::BadArgument(format!(
            "{} strides given for {} dimensions",
            byte_strides.len(),
            shape.len()
        ))));
    }

    let root = Group::new_root(false);
    let mut dimensions = Vec::with_capacity(shape.len());
    for (i, &size) in shape.iter().enumerate() {
        let name = format!("dim{i}");
        let full_name = root.array_full_name(&name);
        dimensions.push(root.add_dimension(Dimension::new(&name, full_name, "", "", size as u64))?);
    }
    let array = MDArray::new_external(
        OVERLAY_ARRAY_NAME,
        root.array_full_name(OVERLAY_ARRAY_NAME),
        dimensions,
        ExtendedDataType::create(datatype)?,
        origin,
        byte_strides,
        writable,
    );
    root.add_md_array(array)?;
    cpl::debug(
        "ARRAY",
        &format!("wrapping {:?} array of shape {shape:?} at {origin:p}", datatype),
    );
    Ok(root)
}

impl ArrayInterface {
    /// Element type and byte strides of the described block.
    pub(crate) fn layout(&self) -> Result<(GdalDataType, Vec<isize>)> {
        let datatype = parse_typestr(&self.typestr)?;
        let strides = match &self.strides {
            Some(strides) => strides.clone(),
            None => to_byte_strides(
                &self.shape,
                &crate::raster::mdarray::row_major_strides(&self.shape),
                datatype.bytes(),
            )?,
        };
        Ok((datatype, strides))
    }
}
