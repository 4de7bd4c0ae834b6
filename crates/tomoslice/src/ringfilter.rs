//! Ring-artifact suppression via an angle-axis median rank filter.
//!
//! Ring artifacts come from uncorrected per-element detector bias: the same
//! column is biased identically at every angle, which backprojects into a
//! circular band. A median across a small window of neighboring angles
//! suppresses the bias while leaving the row/column axes untouched.

use ndarray::{Array3, ArrayView3};

/// Median of a scratch buffer; even-length windows average the two middle
/// values (numpy median convention, which boundary windows can hit).
fn median_in_place(values: &mut [f32]) -> f32 {
    values.sort_by(f32::total_cmp);
    let n = values.len();
    if n % 2 == 1 {
        values[n / 2]
    } else {
        0.5 * (values[n / 2 - 1] + values[n / 2])
    }
}

/// Replace each projection with the elementwise median over a symmetric
/// window of angles.
///
/// The window for angle index `i` is `[i - floor(level), i + floor(level)]`
/// clipped to `[0, angle_count - 1]`: no wraparound, no padding; boundary
/// windows are simply narrower. The usual strength range is 0.1 to 5.0, and
/// `level < 1` truncates to radius 0, making the filter an exact no-op (the
/// intended disable-via-small-strength behavior, never upgraded to radius
/// 1). Output shape equals input shape.
pub fn remove_rings(data: &ArrayView3<f32>, level: f32) -> Array3<f32> {
    let (n_angles, rows, cols) = data.dim();
    // f32 → usize truncates toward zero and saturates negatives to 0.
    let radius = level as usize;
    let mut out = data.to_owned();
    if radius == 0 {
        return out;
    }

    let mut window = Vec::with_capacity(2 * radius + 1);
    for i in 0..n_angles {
        let lo = i.saturating_sub(radius);
        let hi = (i + radius + 1).min(n_angles);
        if hi - lo == 1 {
            continue;
        }
        for r in 0..rows {
            for c in 0..cols {
                window.clear();
                for a in lo..hi {
                    window.push(data[[a, r, c]]);
                }
                out[[i, r, c]] = median_in_place(&mut window);
            }
        }
    }
    out
}
