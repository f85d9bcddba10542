use crate::backend::{PackedMatrix, SgemmB, SgemmData};
use crate::cpu::pack::required_len;
use crate::element::ComputeElement;
use crate::error::{Result, TensorError};

/// Compute one output row of a row-major `c = a @ b`.
///
/// `row` is the `n`-wide output row `i`, `a` the full left matrix and `b` the
/// full right matrix.
pub(crate) fn gemm_row<T: ComputeElement>(
    i: usize,
    row: &mut [T],
    n: usize,
    k: usize,
    a: &[T],
    b: &[T],
) {
    row.fill(T::default());
    let a_row = &a[i * k..i * k + k];
    for (p, &av) in a_row.iter().enumerate() {
        let b_row = &b[p * n..p * n + n];
        for (out, &bv) in row.iter_mut().zip(b_row) {
            *out = T::mul_add(*out, av, bv);
        }
    }
}

pub(crate) fn check_gemm_lengths(
    m: usize,
    n: usize,
    k: usize,
    a: usize,
    b: usize,
    c: usize,
) -> Result<()> {
    if a < m * k {
        return Err(TensorError::Other(format!(
            "matmul: a.len()={} but expected at least m*k={}",
            a,
            m * k
        )));
    }
    if b < k * n {
        return Err(TensorError::Other(format!(
            "matmul: b.len()={} but expected at least k*n={}",
            b,
            k * n
        )));
    }
    if c != m * n {
        return Err(TensorError::Other(format!(
            "matmul: c.len()={} but expected m*n={}",
            c,
            m * n
        )));
    }
    Ok(())
}

/// Validate one batch element of an f32 product before any work starts.
pub(crate) fn check_sgemm(
    trans_a: bool,
    trans_b: bool,
    m: usize,
    n: usize,
    k: usize,
    d: &SgemmData<'_>,
) -> Result<()> {
    let (a_rows, a_cols) = if trans_a { (k, m) } else { (m, k) };
    if d.lda < a_cols || d.a.len() < required_len(a_rows, a_cols, d.lda) {
        return Err(TensorError::Other(format!(
            "sgemm: a.len()={} lda={} too small for [{}x{}]",
            d.a.len(),
            d.lda,
            a_rows,
            a_cols
        )));
    }
    match d.b {
        SgemmB::Raw { data, ldb } => {
            let (b_rows, b_cols) = if trans_b { (n, k) } else { (k, n) };
            if ldb < b_cols || data.len() < required_len(b_rows, b_cols, ldb) {
                return Err(TensorError::Other(format!(
                    "sgemm: b.len()={} ldb={} too small for [{}x{}]",
                    data.len(),
                    ldb,
                    b_rows,
                    b_cols
                )));
            }
        }
        SgemmB::Packed(packed) => {
            if packed.k != k || packed.n != n {
                return Err(TensorError::MatmulMismatch {
                    m,
                    k,
                    k2: packed.k,
                    n: packed.n,
                });
            }
        }
    }
    if d.ldc < n || d.c.len() < required_len(m, n, d.ldc) {
        return Err(TensorError::Other(format!(
            "sgemm: c.len()={} ldc={} too small for [{}x{}]",
            d.c.len(),
            d.ldc,
            m,
            n
        )));
    }
    Ok(())
}

/// `c = alpha * op(a) @ op(b)` for one validated batch element.
pub(crate) fn sgemm(
    trans_a: bool,
    trans_b: bool,
    m: usize,
    n: usize,
    k: usize,
    d: &mut SgemmData<'_>,
) {
    let (a, lda, b, ldc, alpha) = (d.a, d.lda, d.b, d.ldc, d.alpha);
    let c = &mut *d.c;
    let a_at = |i: usize, p: usize| {
        if trans_a {
            a[p * lda + i]
        } else {
            a[i * lda + p]
        }
    };

    for i in 0..m {
        let row = &mut c[i * ldc..i * ldc + n];
        row.fill(0.0);
        match b {
            SgemmB::Raw { data, ldb } => {
                for p in 0..k {
                    let av = a_at(i, p);
                    if trans_b {
                        for (j, out) in row.iter_mut().enumerate() {
                            *out += av * data[j * ldb + p];
                        }
                    } else {
                        for (out, &bv) in row.iter_mut().zip(&data[p * ldb..p * ldb + n]) {
                            *out += av * bv;
                        }
                    }
                }
            }
            SgemmB::Packed(packed) => packed_row(i, row, k, packed, a_at),
        }
        if alpha != 1.0 {
            for out in row.iter_mut() {
                *out *= alpha;
            }
        }
    }
}

/// Accumulate row `i` of `op(a) @ packed` panel by panel.
fn packed_row(
    i: usize,
    row: &mut [f32],
    k: usize,
    packed: &PackedMatrix,
    a_at: impl Fn(usize, usize) -> f32,
) {
    let w = packed.panel_width;
    for (panel, out) in row.chunks_mut(w).enumerate() {
        let base = panel * k * w;
        for p in 0..k {
            let av = a_at(i, p);
            let b_row = &packed.data[base + p * w..base + p * w + w];
            for (o, &bv) in out.iter_mut().zip(b_row) {
                *o += av * bv;
            }
        }
    }
}
