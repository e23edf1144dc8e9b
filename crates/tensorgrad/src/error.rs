//! Error types for tensorgrad.

use thiserror::Error;

/// Errors that can occur in tensor operations and the backward pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TensorError {
    /// Element count does not match what the shape requires.
    #[error("shape error: expected {expected} elements, got {actual}")]
    Shape { expected: usize, actual: usize },

    /// Shape whose element count does not fit in `usize`.
    #[error("shape error: element count of {shape:?} overflows")]
    InvalidShape { shape: Vec<usize> },

    /// Operand shapes are incompatible for a binary operation.
    #[error("shape mismatch in {op}: {lhs:?} vs {rhs:?}")]
    ShapeMismatch {
        op: &'static str,
        lhs: Vec<usize>,
        rhs: Vec<usize>,
    },

    /// Dimension index outside `[0, ndim)`.
    #[error("dimension {dim} out of range for tensor with {ndim} dimensions")]
    DimOutOfRange { dim: usize, ndim: usize },

    /// Index out of bounds.
    #[error("index out of bounds: index {index} is out of range for dimension {dim_size}")]
    IndexOutOfBounds { index: usize, dim_size: usize },

    /// Wrong number of indices provided.
    #[error("wrong number of indices: expected {expected}, got {actual}")]
    WrongNumberOfIndices { expected: usize, actual: usize },

    /// Variable id that does not belong to the graph.
    #[error("variable {index} is not part of this graph")]
    UnknownVariable { index: usize },

    /// Operation read from a tensor that has no buffer.
    #[error("{op} requires an allocated tensor")]
    Uninitialized { op: &'static str },

    /// Wrong number of inputs or upstream gradients for an operation record.
    #[error("{op} expects {expected} tensors, got {actual}")]
    Arity {
        op: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Non-scalar root without a caller-provided gradient.
    #[error("backward from a root of shape {shape:?} needs an explicit gradient")]
    MissingGradient { shape: Vec<usize> },

    /// Backward called on a variable that does not track gradients.
    #[error("backward called on a variable that does not require grad")]
    NoGradient,
}

impl TensorError {
    /// Coarse error category, useful for logging and bindings.
    pub fn category(&self) -> &'static str {
        match self {
            TensorError::Shape { .. } | TensorError::InvalidShape { .. } => "ShapeError",
            TensorError::ShapeMismatch { .. } => "ShapeMismatchError",
            TensorError::DimOutOfRange { .. }
            | TensorError::IndexOutOfBounds { .. }
            | TensorError::WrongNumberOfIndices { .. }
            | TensorError::UnknownVariable { .. } => "RangeError",
            TensorError::Uninitialized { .. } => "UninitializedError",
            TensorError::Arity { .. } => "ArityError",
            TensorError::MissingGradient { .. } => "MissingGradientError",
            TensorError::NoGradient => "NoGradientError",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_shape_mismatch() {
        let err = TensorError::ShapeMismatch {
            op: "matmul",
            lhs: vec![2, 3],
            rhs: vec![2, 3],
        };
        assert_eq!(err.to_string(), "shape mismatch in matmul: [2, 3] vs [2, 3]");
        assert_eq!(err.category(), "ShapeMismatchError");
    }

    #[test]
    fn test_categories() {
        assert_eq!(TensorError::NoGradient.category(), "NoGradientError");
        assert_eq!(
            TensorError::DimOutOfRange { dim: 2, ndim: 2 }.category(),
            "RangeError"
        );
        assert_eq!(
            TensorError::Shape {
                expected: 6,
                actual: 4
            }
            .category(),
            "ShapeError"
        );
    }
}
