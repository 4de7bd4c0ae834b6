//! Rotation-axis (center-of-rotation) estimation.

use ndarray::{ArrayView3, Axis};

/// Center estimation strategy selector.
///
/// `Midpoint` is the only shipped policy and the default. It is deliberately
/// coarse (no symmetry correlation); downstream consumers depend on the
/// exact `columns / 2` value, so a stronger estimator must be added as a new
/// explicitly selected variant rather than a change to `Midpoint`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CenterMethod {
    /// Exact midpoint of the detector column extent.
    #[default]
    Midpoint,
}

/// Estimate the center of rotation in pixel-column units.
///
/// Returns exactly `column_count / 2.0` for any input.
pub fn estimate_center(data: &ArrayView3<f32>) -> f64 {
    estimate_center_with(CenterMethod::Midpoint, data)
}

/// Estimate the center of rotation with an explicit strategy.
pub fn estimate_center_with(method: CenterMethod, data: &ArrayView3<f32>) -> f64 {
    match method {
        CenterMethod::Midpoint => data.len_of(Axis(2)) as f64 / 2.0,
    }
}
