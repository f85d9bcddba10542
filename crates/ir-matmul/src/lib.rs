//! `ir-matmul` - Broadcasting, batched MatMul operator for inference-runtime.
//!
//! This crate provides:
//! - `BroadcastPlan`, which checks operand shapes and lays out the batch
//! - `MatMul<T>`, the generic kernel issuing one primitive call per batch element
//! - `MatMulF32`, the f32 kernel with transpose, scaling, and right-operand
//!   packing shared through a `PrepackCache`
//! - `OpKernel`/`OpContext`, the interface the execution engine drives

pub mod attributes;
pub mod context;
pub mod error;
pub mod kernel;
pub mod matmul;
pub mod matmul_f32;
pub mod plan;
pub mod prepack;

pub use attributes::{AttributeValue, MatMulAttributes, NodeAttributes};
pub use context::{CpuAllocator, OpContext, OutputAllocator};
pub use error::{MatMulError, Result, ShapeError};
pub use kernel::OpKernel;
pub use matmul::MatMul;
pub use matmul_f32::MatMulF32;
pub use plan::BroadcastPlan;
pub use prepack::{CachedPack, PackState, PrepackCache, PrepackedWeight};

use ir_tensor::{ComputeClass, Tensor};

/// Multiply `a @ b` on the reference CPU backend with the kernel for `a`'s
/// dtype, default attributes and no worker pool.
pub fn matmul(a: &Tensor, b: &Tensor) -> Result<Tensor> {
    let ctx = OpContext::new(&[a, b], &CpuAllocator);
    match a.dtype().compute_class() {
        ComputeClass::Int32 => MatMul::<i32>::cpu().compute(&ctx),
        ComputeClass::Int64 => MatMul::<i64>::cpu().compute(&ctx),
        ComputeClass::Float32 => MatMulF32::cpu(MatMulAttributes::default()).compute(&ctx),
        ComputeClass::Float64 => MatMul::<f64>::cpu().compute(&ctx),
    }
}
