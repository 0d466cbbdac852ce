//! Decoded data values.

use serde::{Deserialize, Serialize};

/// One decoded value at a row index within a chunk.
///
/// A multi-column chunk composes row `i` of each column into one `Composite`
/// cell preserving column declaration order; a single-column chunk yields the
/// column's cell directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataCell {
    Scalar(f64),
    Tensor(TensorData),
    Text(String),
    Composite(Vec<DataCell>),
}

/// A dense row-major tensor with explicit shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensorData {
    pub shape: Vec<u32>,
    pub values: Vec<f64>,
}

impl TensorData {
    #[must_use]
    pub fn num_elements(&self) -> usize {
        self.shape.iter().map(|&dim| dim as usize).product()
    }
}
