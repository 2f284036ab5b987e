use crate::raster::GdalType;

#[cfg(feature = "ndarray")]
use ndarray::{ArrayD, IxDyn};

/// An N-D array backed by its `shape` and a row-major `Vec<T>`.
#[derive(Debug, Clone, PartialEq)]
pub struct MdBuffer<T> {
    pub shape: Vec<usize>,
    pub data: Vec<T>,
}

impl<T: GdalType> MdBuffer<T> {
    /// Construct a new buffer from `shape` and `Vec<T>`.
    ///
    /// # Panic
    /// Will panic if the product of `shape` is not `data.len()`.
    pub fn new(shape: Vec<usize>, data: Vec<T>) -> Self {
        assert_eq!(
            shape.iter().product::<usize>(),
            data.len(),
            "shape {:?} does not match length {}",
            shape,
            data.len()
        );
        MdBuffer { shape, data }
    }

    pub fn num_dimensions(&self) -> usize {
        self.shape.len()
    }

    /// Element at `index`, or `None` when any coordinate is out of bounds.
    pub fn get(&self, index: &[usize]) -> Option<&T> {
        if index.len() != self.shape.len() || index.iter().zip(&self.shape).any(|(i, s)| i >= s) {
            return None;
        }
        let offset = index
            .iter()
            .zip(&self.shape)
            .fold(0, |acc, (&i, &s)| acc * s + i);
        self.data.get(offset)
    }

    #[cfg(feature = "ndarray")]
    /// Convert `self` into an [`ndarray::ArrayD`].
    pub fn to_array(self) -> crate::errors::Result<ArrayD<T>> {
        Ok(ArrayD::from_shape_vec(IxDyn(&self.shape), self.data)?)
    }
}

pub type ByteMdBuffer = MdBuffer<u8>;

#[cfg(feature = "ndarray")]
impl<T: GdalType> TryFrom<MdBuffer<T>> for ArrayD<T> {
    type Error = crate::errors::GdalError;

    fn try_from(value: MdBuffer<T>) -> Result<Self, Self::Error> {
        value.to_array()
    }
}

#[cfg(feature = "ndarray")]
impl<T: GdalType> From<ArrayD<T>> for MdBuffer<T> {
    fn from(value: ArrayD<T>) -> Self {
        let shape = value.shape().to_vec();
        let data = value.as_standard_layout().iter().copied().collect::<Vec<T>>();
        MdBuffer::new(shape, data)
    }
}
