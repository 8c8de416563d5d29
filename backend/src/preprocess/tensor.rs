use ndarray::{ArrayD, ArrayViewD};

/// Model input: leading batch axis of 1, values in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTensor {
    data: ArrayD<f32>,
}

impl NormalizedTensor {
    pub(crate) fn new(data: ArrayD<f32>) -> Self {
        debug_assert_eq!(data.shape().first(), Some(&1));
        Self {
            data: data.as_standard_layout().into_owned(),
        }
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn view(&self) -> ArrayViewD<'_, f32> {
        self.data.view()
    }

    /// Row-major contiguous values.
    pub fn as_slice(&self) -> &[f32] {
        self.data
            .as_slice()
            .unwrap_or_default()
    }
}
