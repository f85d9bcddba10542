use crate::dtype::DType;
use crate::error::{Result, TensorError};

/// CPU-side tensor storage: one contiguous vector per supported dtype.
#[derive(Debug, Clone, PartialEq)]
pub enum CpuStorage {
    I32(Vec<i32>),
    U32(Vec<u32>),
    I64(Vec<i64>),
    U64(Vec<u64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

/// Reserve exactly `n` default elements, reporting exhaustion as an error
/// instead of aborting.
fn try_filled<T: Copy + Default>(n: usize, dtype: DType) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(n)
        .map_err(|_| TensorError::Allocation { numel: n, dtype })?;
    v.resize(n, T::default());
    Ok(v)
}

impl CpuStorage {
    /// Number of elements in this storage.
    pub fn len(&self) -> usize {
        match self {
            CpuStorage::I32(v) => v.len(),
            CpuStorage::U32(v) => v.len(),
            CpuStorage::I64(v) => v.len(),
            CpuStorage::U64(v) => v.len(),
            CpuStorage::F32(v) => v.len(),
            CpuStorage::F64(v) => v.len(),
        }
    }

    /// Returns true if the storage contains no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the dtype of this storage.
    pub fn dtype(&self) -> DType {
        match self {
            CpuStorage::I32(_) => DType::I32,
            CpuStorage::U32(_) => DType::U32,
            CpuStorage::I64(_) => DType::I64,
            CpuStorage::U64(_) => DType::U64,
            CpuStorage::F32(_) => DType::F32,
            CpuStorage::F64(_) => DType::F64,
        }
    }

    /// Create zero-filled storage for the given dtype and element count.
    ///
    /// # Errors
    /// Returns `TensorError::Allocation` if the buffer cannot be reserved.
    pub fn zeros(dtype: DType, n: usize) -> Result<Self> {
        Ok(match dtype {
            DType::I32 => CpuStorage::I32(try_filled(n, dtype)?),
            DType::U32 => CpuStorage::U32(try_filled(n, dtype)?),
            DType::I64 => CpuStorage::I64(try_filled(n, dtype)?),
            DType::U64 => CpuStorage::U64(try_filled(n, dtype)?),
            DType::F32 => CpuStorage::F32(try_filled(n, dtype)?),
            DType::F64 => CpuStorage::F64(try_filled(n, dtype)?),
        })
    }
}
