use std::sync::Arc;

use ir_tensor::{ComputeElement, CpuBackend, DType, Gemm, Tensor};

use crate::context::OpContext;
use crate::error::{MatMulError, Result};
use crate::kernel::OpKernel;
use crate::plan::BroadcastPlan;

/// Broadcasting MatMul for any compute class, without transpose or scaling.
///
/// `T` is the class representative: `MatMul<i32>` also runs `u32` inputs and
/// `MatMul<i64>` also runs `u64` inputs. The output keeps the input dtype.
/// Batch elements are issued one primitive call at a time, in order.
#[derive(Debug)]
pub struct MatMul<T: ComputeElement> {
    backend: Arc<dyn Gemm<T>>,
}

impl<T: ComputeElement> MatMul<T> {
    pub fn new(backend: Arc<dyn Gemm<T>>) -> Self {
        MatMul { backend }
    }

    /// A kernel on the reference CPU backend.
    pub fn cpu() -> Self {
        Self::new(Arc::new(CpuBackend::new()))
    }

    /// Returns true if this kernel can run inputs of `dtype`.
    pub fn supports(dtype: DType) -> bool {
        T::DTYPE.shares_compute_path(dtype)
    }
}

impl<T: ComputeElement> Default for MatMul<T> {
    fn default() -> Self {
        Self::cpu()
    }
}

impl<T: ComputeElement> OpKernel for MatMul<T> {
    fn compute(&self, ctx: &OpContext<'_>) -> Result<Tensor> {
        let a = ctx.input(0)?;
        let b = ctx.input(1)?;
        for input in [a, b] {
            if !Self::supports(input.dtype()) {
                return Err(MatMulError::DTypeMismatch {
                    expected: T::DTYPE,
                    got: input.dtype(),
                });
            }
        }
        if a.dtype() != b.dtype() {
            return Err(MatMulError::DTypeMismatch {
                expected: a.dtype(),
                got: b.dtype(),
            });
        }

        let plan = BroadcastPlan::new(a.shape(), b.shape(), false, false)?;
        let mut y = ctx.output(a.dtype(), plan.output_shape())?;
        if y.numel() == 0 {
            return Ok(y);
        }

        let (m, n, k) = (plan.m(), plan.n(), plan.k());
        log::trace!(
            "matmul<{}> m={} n={} k={} batch={}",
            a.dtype(),
            m,
            n,
            k,
            plan.batch_count()
        );

        let a_data = a.compute_view::<T>()?;
        let b_data = b.compute_view::<T>()?;
        let y_data = y.compute_view_mut::<T>()?;
        let offsets = plan
            .left_offsets()
            .iter()
            .zip(plan.right_offsets())
            .zip(plan.output_offsets());
        for ((&a_off, &b_off), &y_off) in offsets {
            self.backend.gemm(
                m,
                n,
                k,
                &a_data[a_off..],
                &b_data[b_off..],
                &mut y_data[y_off..y_off + m * n],
                ctx.thread_pool(),
            )?;
        }

        Ok(y)
    }
}
