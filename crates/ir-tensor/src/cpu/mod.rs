pub mod matmul;
pub mod pack;

use rayon::prelude::*;
use rayon::ThreadPool;

use crate::backend::{Gemm, PackedMatrix, SgemmBatch, SgemmData};
use crate::element::ComputeElement;
use crate::error::Result;

/// Pure-Rust CPU implementation of the matrix-multiply primitives.
///
/// Straightforward loops optimized for correctness rather than peak
/// performance. When handed a thread pool it splits work across the pool:
/// output rows for [`Gemm`], batch elements for [`SgemmBatch`].
#[derive(Debug, Clone)]
pub struct CpuBackend;

impl CpuBackend {
    pub fn new() -> Self {
        CpuBackend
    }
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ComputeElement> Gemm<T> for CpuBackend {
    fn name(&self) -> &str {
        "cpu"
    }

    fn gemm(
        &self,
        m: usize,
        n: usize,
        k: usize,
        a: &[T],
        b: &[T],
        c: &mut [T],
        pool: Option<&ThreadPool>,
    ) -> Result<()> {
        matmul::check_gemm_lengths(m, n, k, a.len(), b.len(), c.len())?;
        if m == 0 || n == 0 {
            return Ok(());
        }

        match pool {
            Some(pool) => pool.install(|| {
                c.par_chunks_mut(n)
                    .enumerate()
                    .for_each(|(i, row)| matmul::gemm_row(i, row, n, k, a, b))
            }),
            None => c
                .chunks_mut(n)
                .enumerate()
                .for_each(|(i, row)| matmul::gemm_row(i, row, n, k, a, b)),
        }
        Ok(())
    }
}

impl SgemmBatch for CpuBackend {
    fn name(&self) -> &str {
        "cpu"
    }

    fn packed_b_size(&self, n: usize, k: usize) -> usize {
        pack::packed_len(n, k)
    }

    fn pack_b(
        &self,
        trans_b: bool,
        n: usize,
        k: usize,
        b: &[f32],
        ldb: usize,
    ) -> Result<PackedMatrix> {
        pack::pack_b(trans_b, n, k, b, ldb)
    }

    fn gemm_batch(
        &self,
        trans_a: bool,
        trans_b: bool,
        m: usize,
        n: usize,
        k: usize,
        data: &mut [SgemmData<'_>],
        pool: Option<&ThreadPool>,
    ) -> Result<()> {
        // Validate everything up front so no element is written on failure.
        for d in data.iter() {
            matmul::check_sgemm(trans_a, trans_b, m, n, k, d)?;
        }

        match pool {
            Some(pool) => pool.install(|| {
                data.par_iter_mut()
                    .for_each(|d| matmul::sgemm(trans_a, trans_b, m, n, k, d))
            }),
            None => data
                .iter_mut()
                .for_each(|d| matmul::sgemm(trans_a, trans_b, m, n, k, d)),
        }
        Ok(())
    }
}
