use ir_tensor::{DType, Shape, TensorError};
use thiserror::Error;

/// Operand shapes that cannot be multiplied.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    #[error("matmul input {input} is a scalar; both operands need rank >= 1")]
    ScalarOperand { input: usize },
    #[error("matmul contraction mismatch: {left} has K={k_left}, {right} has K={k_right}")]
    ContractionMismatch {
        left: Shape,
        right: Shape,
        k_left: usize,
        k_right: usize,
    },
    #[error("cannot broadcast matmul batch dimensions of {left} and {right}")]
    BatchBroadcast { left: Shape, right: Shape },
}

#[derive(Error, Debug)]
pub enum MatMulError {
    #[error(transparent)]
    Shape(#[from] ShapeError),
    #[error("cannot allocate matmul output {shape} of {dtype}")]
    Allocation { shape: Shape, dtype: DType },
    #[error("missing matmul input {0}")]
    MissingInput(usize),
    #[error("matmul kernel for {expected} cannot run on {got}")]
    DTypeMismatch { expected: DType, got: DType },
    #[error("attribute '{name}': expected {expected}, got {got}")]
    AttributeType {
        name: String,
        expected: String,
        got: String,
    },
    #[error("tensor error: {0}")]
    Tensor(#[from] TensorError),
}

impl MatMulError {
    /// Returns true for errors raised while planning operand shapes.
    pub fn is_shape_error(&self) -> bool {
        matches!(self, MatMulError::Shape(_))
    }

    /// Returns true if the output buffer could not be supplied.
    pub fn is_allocation_error(&self) -> bool {
        matches!(self, MatMulError::Allocation { .. })
    }
}

pub type Result<T> = std::result::Result<T, MatMulError>;
