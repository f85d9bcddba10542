use rayon::ThreadPool;

use ir_tensor::{DType, Shape, Tensor, TensorError};

use crate::error::{MatMulError, Result};

/// Supplies output buffers to kernels.
pub trait OutputAllocator: Send + Sync {
    /// Return a writable tensor with `shape.numel()` elements of `dtype`.
    fn allocate(&self, dtype: DType, shape: &Shape) -> ir_tensor::Result<Tensor>;
}

/// Allocates zero-filled CPU tensors.
#[derive(Debug, Clone, Default)]
pub struct CpuAllocator;

impl OutputAllocator for CpuAllocator {
    fn allocate(&self, dtype: DType, shape: &Shape) -> ir_tensor::Result<Tensor> {
        Tensor::zeros(dtype, shape.clone())
    }
}

/// Inputs, output allocator and worker pool for one kernel invocation.
pub struct OpContext<'a> {
    inputs: Vec<Option<&'a Tensor>>,
    allocator: &'a dyn OutputAllocator,
    thread_pool: Option<&'a ThreadPool>,
}

impl<'a> OpContext<'a> {
    /// Create a context where every input is present.
    pub fn new(inputs: &[&'a Tensor], allocator: &'a dyn OutputAllocator) -> Self {
        Self::with_optional_inputs(inputs.iter().map(|t| Some(*t)).collect(), allocator)
    }

    /// Create a context where some inputs may be absent, e.g. a right operand
    /// that a kernel already holds in packed form.
    pub fn with_optional_inputs(
        inputs: Vec<Option<&'a Tensor>>,
        allocator: &'a dyn OutputAllocator,
    ) -> Self {
        OpContext {
            inputs,
            allocator,
            thread_pool: None,
        }
    }

    /// Builder-style: hand the kernel a worker pool.
    pub fn with_thread_pool(mut self, pool: &'a ThreadPool) -> Self {
        self.thread_pool = Some(pool);
        self
    }

    /// Input `idx`, or `MatMulError::MissingInput`.
    pub fn input(&self, idx: usize) -> Result<&'a Tensor> {
        self.inputs
            .get(idx)
            .copied()
            .flatten()
            .ok_or(MatMulError::MissingInput(idx))
    }

    pub fn thread_pool(&self) -> Option<&'a ThreadPool> {
        self.thread_pool
    }

    /// Request the output buffer.
    ///
    /// # Errors
    /// `MatMulError::Allocation` if the allocator cannot supply it or returns
    /// a buffer of the wrong size or dtype.
    pub fn output(&self, dtype: DType, shape: &Shape) -> Result<Tensor> {
        let allocation_error = || MatMulError::Allocation {
            shape: shape.clone(),
            dtype,
        };
        let tensor = self.allocator.allocate(dtype, shape).map_err(|e| match e {
            TensorError::Allocation { .. } => allocation_error(),
            other => MatMulError::Tensor(other),
        })?;
        if tensor.shape() != shape || tensor.dtype() != dtype {
            log::debug!(
                "allocator returned {} {} for requested {} {}",
                tensor.dtype(),
                tensor.shape(),
                dtype,
                shape
            );
            return Err(allocation_error());
        }
        Ok(tensor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingAllocator;

    impl OutputAllocator for FailingAllocator {
        fn allocate(&self, dtype: DType, shape: &Shape) -> ir_tensor::Result<Tensor> {
            Err(TensorError::Allocation {
                numel: shape.numel(),
                dtype,
            })
        }
    }

    #[test]
    fn test_input_lookup() {
        let a = Tensor::new(vec![1.0f32], [1]);
        let ctx = OpContext::new(&[&a], &CpuAllocator);
        assert!(ctx.input(0).is_ok());
        assert!(matches!(ctx.input(1), Err(MatMulError::MissingInput(1))));
    }

    #[test]
    fn test_absent_input() {
        let a = Tensor::new(vec![1.0f32], [1]);
        let ctx = OpContext::with_optional_inputs(vec![Some(&a), None], &CpuAllocator);
        assert!(matches!(ctx.input(1), Err(MatMulError::MissingInput(1))));
    }

    #[test]
    fn test_output_zeroed() {
        let ctx = OpContext::new(&[], &CpuAllocator);
        let out = ctx.output(DType::U32, &Shape::from([2, 2])).unwrap();
        assert_eq!(out.data::<u32>().unwrap(), &[0; 4]);
    }

    #[test]
    fn test_output_allocation_error() {
        let ctx = OpContext::new(&[], &FailingAllocator);
        let err = ctx.output(DType::F32, &Shape::from([2])).unwrap_err();
        assert!(err.is_allocation_error());
    }
}
