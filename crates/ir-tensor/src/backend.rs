use std::fmt::Debug;

use rayon::ThreadPool;

use crate::element::ComputeElement;
use crate::error::Result;

/// Row-major matrix multiply for one element type: `c = a @ b`.
///
/// This is the primitive the generic MatMul path calls once per batch element.
/// Parallelism, if any, happens inside the call on the supplied pool.
pub trait Gemm<T: ComputeElement>: Send + Sync + Debug {
    /// Returns the name of this backend (e.g., "cpu").
    fn name(&self) -> &str;

    /// - `a`: starts at the first element of an [m, k] row-major matrix
    /// - `b`: starts at the first element of a [k, n] row-major matrix
    /// - `c`: exactly the [m, n] output region, overwritten
    ///
    /// `a` and `b` may extend past the matrix they start; only the leading
    /// `m*k` and `k*n` elements are read.
    #[allow(clippy::too_many_arguments)]
    fn gemm(
        &self,
        m: usize,
        n: usize,
        k: usize,
        a: &[T],
        b: &[T],
        c: &mut [T],
        pool: Option<&ThreadPool>,
    ) -> Result<()>;
}

/// Right-hand operand of a single f32 product.
#[derive(Debug, Clone, Copy)]
pub enum SgemmB<'a> {
    /// Unpacked storage with leading dimension `ldb`.
    Raw { data: &'a [f32], ldb: usize },
    /// Storage previously transformed by [`SgemmBatch::pack_b`].
    Packed(&'a PackedMatrix),
}

/// One element of a batched f32 product: `c = alpha * op(a) @ op(b)`.
#[derive(Debug)]
pub struct SgemmData<'a> {
    pub a: &'a [f32],
    pub lda: usize,
    pub b: SgemmB<'a>,
    pub c: &'a mut [f32],
    pub ldc: usize,
    pub alpha: f32,
}

/// A right operand rearranged into column panels for repeated multiplication.
///
/// The layout is private to the backend that produced it. It is only valid
/// for the `k` x `n` product (and transpose setting) it was packed for.
#[derive(Debug, Clone, PartialEq)]
pub struct PackedMatrix {
    pub(crate) data: Vec<f32>,
    pub(crate) k: usize,
    pub(crate) n: usize,
    pub(crate) panel_width: usize,
}

impl PackedMatrix {
    /// Contraction dimension the matrix was packed for.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Output column count the matrix was packed for.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Number of f32 values held, including panel padding.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Batched single-precision GEMM with transpose flags, strides, a scale
/// factor and an optional pre-packed right operand.
pub trait SgemmBatch: Send + Sync + Debug {
    fn name(&self) -> &str;

    /// Number of f32 values `pack_b` would produce for an `n` x `k` operand,
    /// or 0 if packing is not available for that size.
    fn packed_b_size(&self, n: usize, k: usize) -> usize;

    /// Pack the `k` x `n` operand `op(b)` where `b` has leading dimension `ldb`.
    fn pack_b(&self, trans_b: bool, n: usize, k: usize, b: &[f32], ldb: usize)
        -> Result<PackedMatrix>;

    /// Compute every element of `data` before returning. `beta` is always 0:
    /// existing contents of each `c` are overwritten.
    #[allow(clippy::too_many_arguments)]
    fn gemm_batch(
        &self,
        trans_a: bool,
        trans_b: bool,
        m: usize,
        n: usize,
        k: usize,
        data: &mut [SgemmData<'_>],
        pool: Option<&ThreadPool>,
    ) -> Result<()>;
}
