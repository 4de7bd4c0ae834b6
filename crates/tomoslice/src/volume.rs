//! Projection-stack conventions and acquisition-angle synthesis.
//!
//! Axis convention for a projection stack: `(angle, row, column)` where
//! `angle` counts acquired projections, `row` is the detector's vertical
//! extent (one reconstructed slice per row) and `column` its horizontal
//! extent (side length of each reconstructed slice).

use ndarray::Array3;

/// A 3-D stack of projections with axes `(angle, row, column)`.
///
/// All numerical processing runs in `f32`; integer acquisitions are expected
/// to be converted by the reading collaborator before entering the pipeline.
pub type ProjectionStack = Array3<f32>;

/// A reconstructed volume with axes `(row, column, column)`.
///
/// The two trailing axes are equal in length and equal to the input column
/// extent (one square slice per detector row).
pub type ReconstructedVolume = Array3<f32>;

/// Synthesize acquisition angles as a uniform partition of `[0, π]`.
///
/// Both endpoints are included, so `n == 1` yields `[0.0]` and the last
/// angle of any longer sequence is `π`. Angles are never read from file
/// metadata; the pipeline always synthesizes them from the angle-axis
/// extent.
pub fn uniform_angles(n: usize) -> Vec<f32> {
    match n {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => {
            // Pin the endpoint: (n-1) * (pi/(n-1)) rounds away from pi in
            // f32 for many lengths, and the backprojector's quarter-turn
            // truncation would then bin the last angle as k=1 instead of
            // k=2.
            let step = std::f32::consts::PI / (n - 1) as f32;
            (0..n)
                .map(|i| {
                    if i == n - 1 {
                        std::f32::consts::PI
                    } else {
                        i as f32 * step
                    }
                })
                .collect()
        }
    }
}
