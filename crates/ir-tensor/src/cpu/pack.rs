use crate::backend::PackedMatrix;
use crate::error::{Result, TensorError};

/// Width of each column panel in a packed right operand.
pub(crate) const PANEL_WIDTH: usize = 16;

/// Return the smallest multiple of `factor` that is >= `val`.
fn round_up(val: usize, factor: usize) -> usize {
    let rem = val % factor;
    if rem == 0 {
        val
    } else {
        (val + factor) - rem
    }
}

/// Minimum slice length holding a `rows` x `cols` matrix with row stride `ld`.
pub(crate) fn required_len(rows: usize, cols: usize, ld: usize) -> usize {
    if rows == 0 || cols == 0 {
        0
    } else {
        (rows - 1) * ld + cols
    }
}

pub(crate) fn packed_len(n: usize, k: usize) -> usize {
    if n == 0 || k == 0 {
        0
    } else {
        round_up(n, PANEL_WIDTH) * k
    }
}

/// Pack `op(b)`, a `k` x `n` matrix, into column panels.
///
/// The packed buffer is a sequence of `ceil(n / PANEL_WIDTH)` panels. Each
/// panel holds `k` rows of `PANEL_WIDTH` values in row-major order. The final
/// panel is zero-padded when `n` is not a multiple of `PANEL_WIDTH`.
pub(crate) fn pack_b(
    trans_b: bool,
    n: usize,
    k: usize,
    b: &[f32],
    ldb: usize,
) -> Result<PackedMatrix> {
    let len = packed_len(n, k);
    if len == 0 {
        return Err(TensorError::Other(format!(
            "pack_b: cannot pack an empty [{}x{}] operand",
            k, n
        )));
    }
    let (rows, cols) = if trans_b { (n, k) } else { (k, n) };
    let needed = required_len(rows, cols, ldb);
    if b.len() < needed || ldb < cols {
        return Err(TensorError::Other(format!(
            "pack_b: b.len()={} ldb={} too small for [{}x{}]",
            b.len(),
            ldb,
            rows,
            cols
        )));
    }

    let mut data = vec![0.0f32; len];
    let n_panels = round_up(n, PANEL_WIDTH) / PANEL_WIDTH;
    for panel in 0..n_panels {
        let panel_offset = panel * k * PANEL_WIDTH;
        let panel_start_col = panel * PANEL_WIDTH;
        let used = PANEL_WIDTH.min(n - panel_start_col);

        for p in 0..k {
            let out_row = &mut data[panel_offset + p * PANEL_WIDTH..][..used];
            if trans_b {
                for (col, out) in out_row.iter_mut().enumerate() {
                    *out = b[(panel_start_col + col) * ldb + p];
                }
            } else {
                let b_row = &b[p * ldb + panel_start_col..][..used];
                out_row.copy_from_slice(b_row);
            }
        }
    }

    Ok(PackedMatrix {
        data,
        k,
        n,
        panel_width: PANEL_WIDTH,
    })
}
