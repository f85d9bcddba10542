#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use ir_matmul::{CpuAllocator, OutputAllocator};
use ir_tensor::{DType, Shape, Tensor, TensorError};

/// Wraps `CpuAllocator`, counting requests and optionally failing them.
#[derive(Default)]
pub struct CountingAllocator {
    pub requests: AtomicUsize,
    pub fail: bool,
}

impl CountingAllocator {
    pub fn failing() -> Self {
        CountingAllocator {
            requests: AtomicUsize::new(0),
            fail: true,
        }
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl OutputAllocator for CountingAllocator {
    fn allocate(&self, dtype: DType, shape: &Shape) -> ir_tensor::Result<Tensor> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(TensorError::Allocation {
                numel: shape.numel(),
                dtype,
            });
        }
        CpuAllocator.allocate(dtype, shape)
    }
}

pub fn assert_approx_eq(actual: &[f32], expected: &[f64], tol: f64) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "Length mismatch: actual={} expected={}",
        actual.len(),
        expected.len()
    );
    for (i, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
        assert!(
            (f64::from(*a) - *e).abs() <= tol,
            "Mismatch at index {}: actual={} expected={} with tol={}",
            i,
            a,
            e,
            tol
        );
    }
}

/// Direct triple-loop matmul with numpy broadcasting, independent of
/// `BroadcastPlan`. Returns (output shape, row-major output).
pub fn reference_matmul(
    a: &[f64],
    a_shape: &[usize],
    b: &[f64],
    b_shape: &[usize],
    trans_a: bool,
    trans_b: bool,
) -> (Vec<usize>, Vec<f64>) {
    let trans_a = trans_a && a_shape.len() > 1;
    let trans_b = trans_b && b_shape.len() > 1;

    // Stored trailing matrix of each operand, and its batch dims.
    let (a_rows, a_cols, a_batch) = match a_shape {
        [k] => (1, *k, Vec::new()),
        [batch @ .., r, c] => (*r, *c, batch.to_vec()),
        [] => panic!("scalar operand"),
    };
    let (b_rows, b_cols, b_batch) = match b_shape {
        [k] => (*k, 1, Vec::new()),
        [batch @ .., r, c] => (*r, *c, batch.to_vec()),
        [] => panic!("scalar operand"),
    };
    let (m, k) = if trans_a { (a_cols, a_rows) } else { (a_rows, a_cols) };
    let (k2, n) = if trans_b { (b_cols, b_rows) } else { (b_rows, b_cols) };
    assert_eq!(k, k2);

    let rank = a_batch.len().max(b_batch.len());
    let pad = |dims: &[usize]| {
        let mut p = vec![1; rank - dims.len()];
        p.extend_from_slice(dims);
        p
    };
    let (pa, pb) = (pad(&a_batch), pad(&b_batch));
    let out_batch: Vec<usize> = pa
        .iter()
        .zip(&pb)
        .map(|(&x, &y)| if x == 1 { y } else { x })
        .collect();

    let flat = |coords: &[usize], dims: &[usize]| {
        coords
            .iter()
            .zip(dims)
            .fold(0, |acc, (&c, &d)| acc * d + if d == 1 { 0 } else { c })
    };

    let count: usize = out_batch.iter().product();
    let mut out = Vec::with_capacity(count * m * n);
    let mut coords = vec![0usize; rank];
    for _ in 0..count {
        let a_base = flat(&coords, &pa) * a_rows * a_cols;
        let b_base = flat(&coords, &pb) * b_rows * b_cols;
        for i in 0..m {
            for j in 0..n {
                let mut acc = 0.0;
                for p in 0..k {
                    let av = if trans_a {
                        a[a_base + p * a_cols + i]
                    } else {
                        a[a_base + i * a_cols + p]
                    };
                    let bv = if trans_b {
                        b[b_base + j * b_cols + p]
                    } else {
                        b[b_base + p * b_cols + j]
                    };
                    acc += av * bv;
                }
                out.push(acc);
            }
        }
        for axis in (0..rank).rev() {
            coords[axis] += 1;
            if coords[axis] < out_batch[axis] {
                break;
            }
            coords[axis] = 0;
        }
    }

    let mut shape = out_batch;
    if a_shape.len() > 1 {
        shape.push(m);
    }
    if b_shape.len() > 1 {
        shape.push(n);
    }
    (shape, out)
}

/// Deterministic small-integer-valued f32 data, exact under summation.
pub fn ramp(len: usize) -> Vec<f32> {
    (0..len).map(|i| ((i * 7 + 3) % 11) as f32 - 5.0).collect()
}

pub fn to_f64(data: &[f32]) -> Vec<f64> {
    data.iter().map(|&v| f64::from(v)).collect()
}
