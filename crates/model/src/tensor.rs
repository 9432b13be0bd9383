//! Dense f32 tensors with explicit shapes.

/// A flat f32 buffer with a logical shape.
///
/// Image tensors use the planar (channel, height, width) layout, not the
/// interleaved layout of raster images; see [`crate::marshal`] for the
/// conversion.
#[derive(Clone, Debug, PartialEq)]
pub struct Tensor {
    data: Vec<f32>,
    shape: Vec<usize>,
}

impl Tensor {
    /// Builds a tensor from a flat buffer.
    ///
    /// # Panics
    ///
    /// Panics when the buffer length does not match the shape product;
    /// constructing a tensor with a lying shape is a caller bug.
    #[must_use]
    pub fn from_vec(shape: Vec<usize>, data: Vec<f32>) -> Self {
        assert_eq!(shape.iter().product::<usize>(), data.len());
        Self { data, shape }
    }

    /// A zero-filled tensor of the given shape.
    #[must_use]
    pub fn zeros(shape: Vec<usize>) -> Self {
        let len = shape.iter().product();
        Self {
            data: vec![0.0; len],
            shape,
        }
    }

    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    #[must_use]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Consumes the tensor, returning its flat buffer.
    #[must_use]
    pub fn into_data(self) -> Vec<f32> {
        self.data
    }
}
