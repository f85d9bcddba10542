//! `ir-tensor` - Typed tensors and matrix-multiply primitives for inference-runtime.
//!
//! This crate provides:
//! - A `Tensor` type backed by typed CPU storage
//! - The closed `DType` set and its compute-class equivalence table
//! - Shape utilities and broadcasting
//! - The `Gemm` and `SgemmBatch` primitive traits, with weight packing
//! - A reference `CpuBackend` implementation

pub mod backend;
pub mod cpu;
pub mod dtype;
pub mod element;
pub mod error;
pub mod shape;
pub mod storage;
pub mod tensor;

// Re-export primary types at the crate root for convenience.
pub use backend::{Gemm, PackedMatrix, SgemmB, SgemmBatch, SgemmData};
pub use cpu::CpuBackend;
pub use dtype::{ComputeClass, DType};
pub use element::{ComputeElement, Element};
pub use error::{Result, TensorError};
pub use shape::Shape;
pub use storage::CpuStorage;
pub use tensor::Tensor;
