use ir_tensor::Shape;

use crate::error::ShapeError;

/// Everything a matmul kernel needs to know about its operand shapes.
///
/// Both operands are read as stacks of matrices in their trailing one or two
/// dimensions. A rank-1 left operand is a single row and a rank-1 right
/// operand a single column; those singleton dims do not appear in the output.
/// Leading dimensions are batch dimensions and broadcast against each other.
///
/// The three offset vectors have one entry per output matrix, enumerated in
/// row-major order over the broadcast batch shape. Offsets are in elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastPlan {
    m: usize,
    n: usize,
    k: usize,
    trans_a: bool,
    trans_b: bool,
    output_shape: Shape,
    left_offsets: Vec<usize>,
    right_offsets: Vec<usize>,
    output_offsets: Vec<usize>,
}

/// Rows and columns of an operand's trailing matrix after applying transpose.
fn matrix_dims(shape: &Shape, trans: bool, is_left: bool) -> (usize, usize) {
    let dims = shape.dims();
    match dims {
        [len] if is_left => (1, *len),
        [len] => (*len, 1),
        [.., rows, cols] if trans => (*cols, *rows),
        [.., rows, cols] => (*rows, *cols),
        [] => (0, 0),
    }
}

/// Per-axis batch strides of `batch` right-aligned to `rank` output axes.
///
/// Axes where the operand has size 1 (including padded axes) get stride 0 so
/// every output index along them maps to the same operand matrix.
fn broadcast_strides(batch: &[usize], rank: usize) -> Vec<usize> {
    let mut padded = vec![1usize; rank - batch.len()];
    padded.extend_from_slice(batch);
    let contiguous = Shape::new(padded.clone()).strides();
    padded
        .iter()
        .zip(contiguous)
        .map(|(&dim, stride)| if dim == 1 { 0 } else { stride })
        .collect()
}

impl BroadcastPlan {
    /// Plan `op(a) @ op(b)`.
    ///
    /// Transpose flags are ignored for a rank-1 operand.
    ///
    /// # Errors
    /// - `ShapeError::ScalarOperand` if either operand has rank 0
    /// - `ShapeError::ContractionMismatch` if the K dimensions disagree
    /// - `ShapeError::BatchBroadcast` if batch dimensions cannot broadcast
    pub fn new(
        a: &Shape,
        b: &Shape,
        trans_a: bool,
        trans_b: bool,
    ) -> Result<BroadcastPlan, ShapeError> {
        if a.ndim() == 0 {
            return Err(ShapeError::ScalarOperand { input: 0 });
        }
        if b.ndim() == 0 {
            return Err(ShapeError::ScalarOperand { input: 1 });
        }
        let trans_a = trans_a && a.ndim() != 1;
        let trans_b = trans_b && b.ndim() != 1;

        let (m, k_left) = matrix_dims(a, trans_a, true);
        let (k_right, n) = matrix_dims(b, trans_b, false);
        if k_left != k_right {
            return Err(ShapeError::ContractionMismatch {
                left: a.clone(),
                right: b.clone(),
                k_left,
                k_right,
            });
        }
        let k = k_left;

        let a_batch = a.leading(2);
        let b_batch = b.leading(2);
        let batch = Shape::broadcast_shape(&Shape::from(a_batch), &Shape::from(b_batch))
            .map_err(|_| ShapeError::BatchBroadcast {
                left: a.clone(),
                right: b.clone(),
            })?;

        let mut out_dims = batch.dims().to_vec();
        if a.ndim() != 1 {
            out_dims.push(m);
        }
        if b.ndim() != 1 {
            out_dims.push(n);
        }

        let rank = batch.ndim();
        let left_strides = broadcast_strides(a_batch, rank);
        let right_strides = broadcast_strides(b_batch, rank);
        let count = batch.numel();

        let mut left_offsets = Vec::with_capacity(count);
        let mut right_offsets = Vec::with_capacity(count);
        let mut output_offsets = Vec::with_capacity(count);
        let mut coords = vec![0usize; rank];
        for index in 0..count {
            let left: usize = coords.iter().zip(&left_strides).map(|(c, s)| c * s).sum();
            let right: usize = coords.iter().zip(&right_strides).map(|(c, s)| c * s).sum();
            left_offsets.push(left * m * k);
            right_offsets.push(right * k * n);
            output_offsets.push(index * m * n);

            // Advance the row-major batch coordinate.
            for axis in (0..rank).rev() {
                coords[axis] += 1;
                if coords[axis] < batch.dim(axis) {
                    break;
                }
                coords[axis] = 0;
            }
        }

        Ok(BroadcastPlan {
            m,
            n,
            k,
            trans_a,
            trans_b,
            output_shape: Shape::new(out_dims),
            left_offsets,
            right_offsets,
            output_offsets,
        })
    }

    /// Rows of each output matrix.
    pub fn m(&self) -> usize {
        self.m
    }

    /// Columns of each output matrix.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Contraction dimension.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Left transpose actually applied (false for a rank-1 left operand).
    pub fn trans_a(&self) -> bool {
        self.trans_a
    }

    /// Right transpose actually applied (false for a rank-1 right operand).
    pub fn trans_b(&self) -> bool {
        self.trans_b
    }

    pub fn output_shape(&self) -> &Shape {
        &self.output_shape
    }

    /// Number of output matrices (1 when there are no batch dimensions).
    pub fn batch_count(&self) -> usize {
        self.output_offsets.len()
    }

    pub fn left_offsets(&self) -> &[usize] {
        &self.left_offsets
    }

    pub fn right_offsets(&self) -> &[usize] {
        &self.right_offsets
    }

    pub fn output_offsets(&self) -> &[usize] {
        &self.output_offsets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(a: &[usize], b: &[usize]) -> Result<BroadcastPlan, ShapeError> {
        BroadcastPlan::new(&Shape::from(a), &Shape::from(b), false, false)
    }

    #[test]
    fn test_plain_2d() {
        let p = plan(&[2, 3], &[3, 4]).unwrap();
        assert_eq!((p.m(), p.n(), p.k()), (2, 4, 3));
        assert_eq!(p.output_shape().dims(), &[2, 4]);
        assert_eq!(p.left_offsets(), &[0]);
        assert_eq!(p.right_offsets(), &[0]);
        assert_eq!(p.output_offsets(), &[0]);
    }

    #[test]
    fn test_batched_left_shared_right() {
        let p = plan(&[5, 2, 3], &[3, 4]).unwrap();
        assert_eq!(p.output_shape().dims(), &[5, 2, 4]);
        assert_eq!(p.left_offsets(), &[0, 6, 12, 18, 24]);
        assert_eq!(p.right_offsets(), &[0; 5]);
        assert_eq!(p.output_offsets(), &[0, 8, 16, 24, 32]);
    }

    #[test]
    fn test_broadcast_both_sides() {
        // a batch [2, 1], b batch [3] -> output batch [2, 3]
        let p = plan(&[2, 1, 2, 2], &[3, 2, 2]).unwrap();
        assert_eq!(p.output_shape().dims(), &[2, 3, 2, 2]);
        assert_eq!(p.batch_count(), 6);
        assert_eq!(p.left_offsets(), &[0, 0, 0, 4, 4, 4]);
        assert_eq!(p.right_offsets(), &[0, 4, 8, 0, 4, 8]);
        assert_eq!(p.output_offsets(), &[0, 4, 8, 12, 16, 20]);
    }

    #[test]
    fn test_vector_left() {
        let p = plan(&[4], &[4, 5]).unwrap();
        assert_eq!((p.m(), p.n(), p.k()), (1, 5, 4));
        assert_eq!(p.output_shape().dims(), &[5]);
    }

    #[test]
    fn test_vector_right_batched_left() {
        let p = plan(&[2, 3, 4], &[4]).unwrap();
        assert_eq!((p.m(), p.n(), p.k()), (3, 1, 4));
        assert_eq!(p.output_shape().dims(), &[2, 3]);
        assert_eq!(p.right_offsets(), &[0, 0]);
    }

    #[test]
    fn test_vector_vector_is_rank_zero() {
        let p = plan(&[3], &[3]).unwrap();
        assert_eq!(p.output_shape().ndim(), 0);
        assert_eq!(p.output_shape().numel(), 1);
        assert_eq!(p.batch_count(), 1);
    }

    #[test]
    fn test_vector_ignores_transpose() {
        let p = BroadcastPlan::new(&Shape::from([4]), &Shape::from([4]), true, true).unwrap();
        assert!(!p.trans_a());
        assert!(!p.trans_b());
        assert_eq!(p.k(), 4);
    }

    #[test]
    fn test_transpose_flags() {
        // a stored [3, 2] -> op(a) [2, 3]; b stored [4, 3] -> op(b) [3, 4]
        let p = BroadcastPlan::new(&Shape::from([3, 2]), &Shape::from([4, 3]), true, true).unwrap();
        assert_eq!((p.m(), p.n(), p.k()), (2, 4, 3));
        assert_eq!(p.output_shape().dims(), &[2, 4]);
    }

    #[test]
    fn test_contraction_mismatch() {
        let err = plan(&[2, 3], &[2, 3]).unwrap_err();
        assert!(matches!(
            err,
            ShapeError::ContractionMismatch { k_left: 3, k_right: 2, .. }
        ));
    }

    #[test]
    fn test_batch_mismatch() {
        let err = plan(&[2, 2, 3], &[3, 3, 4]).unwrap_err();
        assert!(matches!(err, ShapeError::BatchBroadcast { .. }));
    }

    #[test]
    fn test_scalar_operand() {
        assert_eq!(
            plan(&[], &[3]).unwrap_err(),
            ShapeError::ScalarOperand { input: 0 }
        );
        assert_eq!(
            plan(&[3], &[]).unwrap_err(),
            ShapeError::ScalarOperand { input: 1 }
        );
    }

    #[test]
    fn test_empty_rows() {
        let p = plan(&[0, 3], &[3, 4]).unwrap();
        assert_eq!(p.output_shape().dims(), &[0, 4]);
        assert_eq!(p.output_shape().numel(), 0);
    }

    #[test]
    fn test_empty_batch_has_no_offsets() {
        let p = plan(&[0, 2, 3], &[3, 4]).unwrap();
        assert_eq!(p.output_shape().dims(), &[0, 2, 4]);
        assert_eq!(p.batch_count(), 0);
    }

    #[test]
    fn test_offsets_equal_length_and_cover_output() {
        let p = plan(&[3, 1, 2, 5], &[1, 4, 5, 2]).unwrap();
        assert_eq!(p.left_offsets().len(), p.right_offsets().len());
        assert_eq!(p.left_offsets().len(), p.output_offsets().len());
        assert_eq!(
            p.m() * p.n() * p.batch_count(),
            p.output_shape().numel()
        );
    }
}
