use crate::dtype::DType;
use crate::element::{ComputeElement, Element};
use crate::error::{Result, TensorError};
use crate::shape::Shape;
use crate::storage::CpuStorage;

/// A dense, row-major tensor backed by CPU storage.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    storage: CpuStorage,
    shape: Shape,
}

impl Tensor {
    /// Create a new tensor from typed data and a shape.
    ///
    /// # Panics
    /// Panics if `data.len() != shape.numel()`.
    pub fn new<T: Element>(data: Vec<T>, shape: impl Into<Shape>) -> Self {
        let shape = shape.into();
        assert_eq!(
            data.len(),
            shape.numel(),
            "data length {} does not match shape {} (numel={})",
            data.len(),
            shape,
            shape.numel()
        );
        Tensor {
            storage: T::into_storage(data),
            shape,
        }
    }

    /// Create a zero-filled tensor with the given dtype and shape.
    ///
    /// # Errors
    /// Returns `TensorError::Allocation` if the buffer cannot be reserved.
    pub fn zeros(dtype: DType, shape: Shape) -> Result<Self> {
        let storage = CpuStorage::zeros(dtype, shape.numel())?;
        Ok(Tensor { storage, shape })
    }

    /// Returns a reference to the tensor's shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns the tensor's data type.
    pub fn dtype(&self) -> DType {
        self.storage.dtype()
    }

    /// Total number of elements.
    pub fn numel(&self) -> usize {
        self.shape.numel()
    }

    /// Returns the elements as `&[T]`; `T` must match the dtype exactly.
    pub fn data<T: Element>(&self) -> Result<&[T]> {
        T::slice(&self.storage).ok_or(TensorError::DTypeMismatch {
            expected: T::DTYPE,
            got: self.dtype(),
        })
    }

    /// Returns the elements viewed as the compute representative `T`.
    ///
    /// Succeeds for any dtype that shares `T`'s compute class, e.g. a `U32`
    /// tensor viewed as `i32`.
    pub fn compute_view<T: ComputeElement>(&self) -> Result<&[T]> {
        T::class_view(&self.storage).ok_or(TensorError::DTypeMismatch {
            expected: T::DTYPE,
            got: self.dtype(),
        })
    }

    /// Mutable counterpart of [`Tensor::compute_view`].
    pub fn compute_view_mut<T: ComputeElement>(&mut self) -> Result<&mut [T]> {
        let got = self.dtype();
        T::class_view_mut(&mut self.storage).ok_or(TensorError::DTypeMismatch {
            expected: T::DTYPE,
            got,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tensor() {
        let t = Tensor::new(vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0], [2, 3]);
        assert_eq!(t.shape().ndim(), 2);
        assert_eq!(t.shape().dim(0), 2);
        assert_eq!(t.shape().dim(1), 3);
        assert_eq!(t.dtype(), DType::F32);
        assert_eq!(t.data::<f32>().unwrap(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_zeros() {
        let z = Tensor::zeros(DType::I64, Shape::from([2, 3])).unwrap();
        assert_eq!(z.data::<i64>().unwrap(), &[0; 6]);
        assert_eq!(z.numel(), 6);
    }

    #[test]
    fn test_typed_access_mismatch() {
        let t = Tensor::new(vec![1u32, 2], [2]);
        assert!(t.data::<i32>().is_err());
        assert_eq!(t.data::<u32>().unwrap(), &[1, 2]);
    }

    #[test]
    fn test_compute_view_shares_class() {
        let mut t = Tensor::new(vec![1u32, 2], [2]);
        assert_eq!(t.compute_view::<i32>().unwrap(), &[1, 2]);
        assert!(t.compute_view::<i64>().is_err());
        t.compute_view_mut::<i32>().unwrap()[0] = -1;
        assert_eq!(t.data::<u32>().unwrap(), &[u32::MAX, 2]);
    }

    #[test]
    #[should_panic]
    fn test_new_shape_mismatch_panics() {
        let _t = Tensor::new(vec![1.0f32, 2.0], [3]);
    }
}
