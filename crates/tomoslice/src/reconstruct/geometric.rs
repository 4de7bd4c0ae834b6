//! Built-in geometric backprojector.
//!
//! A coarse backprojection that bins each acquisition angle into a multiple
//! of 90°: the 1-D projection row is tiled into a square image, rotated by
//! `k = trunc(θ · 2/π)` quarter turns counterclockwise, and accumulated.
//! The final image is the accumulated sum divided by the angle count.
//!
//! The quarter-turn binning (truncation, not rounding) is a deliberate
//! approximation kept bit-compatible with the pipeline's historical
//! behavior. It is fully deterministic: identical inputs produce identical
//! output.

use ndarray::{Array2, ArrayView1, ArrayView3, Axis};

/// Quarter-turn bin for an acquisition angle in radians.
///
/// `θ ∈ [0, π]` maps to `trunc(θ · 2/π) ∈ {0, 1, 2}`; the modulo guards
/// against out-of-range angles.
fn quarter_turns(theta: f32) -> usize {
    let k = (theta * 2.0 / std::f32::consts::PI) as i64;
    k.rem_euclid(4) as usize
}

/// Accumulate one tiled projection row rotated by `k` quarter turns.
///
/// With `t` the (n × n) tile `t[i][j] = p[j]` and `rot` a counterclockwise
/// quarter-turn rotation, the rotated tile reduces to a 1-D lookup:
/// `k = 0 → p[j]`, `k = 1 → p[n-1-i]`, `k = 2 → p[n-1-j]`, `k = 3 → p[i]`.
fn accumulate_quarter_turn(acc: &mut Array2<f32>, projection: &ArrayView1<f32>, k: usize) {
    let n = projection.len();
    match k {
        0 => {
            for i in 0..n {
                for j in 0..n {
                    acc[[i, j]] += projection[j];
                }
            }
        }
        1 => {
            for i in 0..n {
                let v = projection[n - 1 - i];
                for j in 0..n {
                    acc[[i, j]] += v;
                }
            }
        }
        2 => {
            for i in 0..n {
                for j in 0..n {
                    acc[[i, j]] += projection[n - 1 - j];
                }
            }
        }
        _ => {
            for i in 0..n {
                let v = projection[i];
                for j in 0..n {
                    acc[[i, j]] += v;
                }
            }
        }
    }
}

/// Backproject a single detector row of shape `(angle, 1, column)` into a
/// `(column × column)` slice.
///
/// Shape validation happens in the dispatch layer; this function assumes a
/// well-formed row slice.
pub fn backproject(row_data: &ArrayView3<f32>, angles: &[f32]) -> Array2<f32> {
    let n_angles = row_data.len_of(Axis(0));
    let size = row_data.len_of(Axis(2));
    let mut acc = Array2::<f32>::zeros((size, size));
    for (i, &theta) in angles.iter().enumerate() {
        let frame = row_data.index_axis(Axis(0), i);
        accumulate_quarter_turn(&mut acc, &frame.row(0), quarter_turns(theta));
    }
    let scale = 1.0 / n_angles as f32;
    acc.mapv_into(|v| v * scale)
}
