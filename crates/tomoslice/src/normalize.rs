//! Projection intensity normalization.
//!
//! Two correction modes:
//! - global min-max rescale to `[0, 1]` when no reference fields exist;
//! - flat/dark reference-field correction, broadcast across the angle axis.
//!
//! Both are pure functions over their inputs and compute in `f32`.

use ndarray::{Array3, ArrayView2, ArrayView3, Axis};

// ── Error type ─────────────────────────────────────────────────────────────

/// Errors that can occur during normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizeError {
    /// The stack has no dynamic range (`max == min`); min-max rescale would
    /// divide by zero.
    ZeroDynamicRange { min: f32, max: f32 },
    /// A reference field's shape does not match the per-angle frame shape.
    FieldShapeMismatch {
        field: &'static str,
        expected: [usize; 2],
        got: [usize; 2],
    },
}

impl std::fmt::Display for NormalizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroDynamicRange { min, max } => write!(
                f,
                "zero dynamic range: min == max ({} == {}), cannot min-max rescale",
                min, max
            ),
            Self::FieldShapeMismatch {
                field,
                expected,
                got,
            } => write!(
                f,
                "{} field shape {:?} does not match frame shape {:?}",
                field, got, expected
            ),
        }
    }
}

impl std::error::Error for NormalizeError {}

// ── Normalization ──────────────────────────────────────────────────────────

/// Global min-max normalization over the whole stack.
///
/// Output is `(x - min) / (max - min)`, elementwise, so the result spans
/// `[0, 1]`. Constant input is rejected with
/// [`NormalizeError::ZeroDynamicRange`] instead of silently producing
/// NaN/Inf.
pub fn normalize(projections: &ArrayView3<f32>) -> Result<Array3<f32>, NormalizeError> {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for &v in projections.iter() {
        min = min.min(v);
        max = max.max(v);
    }
    if !(max > min) {
        return Err(NormalizeError::ZeroDynamicRange { min, max });
    }
    let range = max - min;
    Ok(projections.mapv(|v| (v - min) / range))
}

/// Flat/dark reference-field correction.
///
/// Output is `clip((x - dark) / (flat - dark), 0, +inf)`, with both fields
/// broadcast against every angle. Over-corrected negative values clamp to
/// zero; there is no upper clamp.
///
/// Pixels where `flat == dark` divide by zero and yield non-finite output
/// (`inf`, or NaN when `x == dark` too). This mirrors the reference-field
/// arithmetic exactly and is intentionally not masked; supplying a flat
/// field that touches the dark field is a data-quality problem the caller
/// must see.
pub fn normalize_with_fields(
    projections: &ArrayView3<f32>,
    flat_field: &ArrayView2<f32>,
    dark_field: &ArrayView2<f32>,
) -> Result<Array3<f32>, NormalizeError> {
    let (_, rows, cols) = projections.dim();
    let frame = [rows, cols];
    for (name, got) in [
        ("flat", [flat_field.nrows(), flat_field.ncols()]),
        ("dark", [dark_field.nrows(), dark_field.ncols()]),
    ] {
        if got != frame {
            return Err(NormalizeError::FieldShapeMismatch {
                field: name,
                expected: frame,
                got,
            });
        }
    }

    let mut out = projections.to_owned();
    for mut plane in out.axis_iter_mut(Axis(0)) {
        for r in 0..rows {
            for c in 0..cols {
                let dark = dark_field[[r, c]];
                let denom = flat_field[[r, c]] - dark;
                let v = (plane[[r, c]] - dark) / denom;
                // Clamp negatives only; NaN/Inf from denom == 0 pass through.
                plane[[r, c]] = if v < 0.0 { 0.0 } else { v };
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ramp_stack;
    use ndarray::{Array2, Array3};

    #[test]
    fn min_max_spans_unit_interval() {
        let stack = ramp_stack(8, 4, 16);
        let out = normalize(&stack.view()).unwrap();
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        for &v in out.iter() {
            min = min.min(v);
            max = max.max(v);
        }
        assert!(min.abs() < 1e-6);
        assert!((max - 1.0).abs() < 1e-6);
    }

    #[test]
    fn constant_stack_is_rejected() {
        let stack = Array3::from_elem((8, 4, 16), 3.5f32);
        let err = normalize(&stack.view()).unwrap_err();
        assert_eq!(
            err,
            NormalizeError::ZeroDynamicRange { min: 3.5, max: 3.5 }
        );
    }

    #[test]
    fn field_correction_is_never_negative() {
        let stack = Array3::from_elem((3, 2, 4), 0.5f32);
        let flat = Array2::from_elem((2, 4), 2.0f32);
        let dark = Array2::from_elem((2, 4), 1.0f32);
        // x - dark = -0.5 everywhere: over-corrected noise clamps to zero.
        let out = normalize_with_fields(&stack.view(), &flat.view(), &dark.view()).unwrap();
        assert!(out.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn field_correction_scales_by_dynamic_range() {
        let stack = Array3::from_elem((2, 2, 2), 150.0f32);
        let flat = Array2::from_elem((2, 2), 200.0f32);
        let dark = Array2::from_elem((2, 2), 100.0f32);
        let out = normalize_with_fields(&stack.view(), &flat.view(), &dark.view()).unwrap();
        assert!(out.iter().all(|&v| (v - 0.5).abs() < 1e-6));
    }

    #[test]
    fn flat_equal_dark_divides_by_zero() {
        let stack = Array3::from_elem((1, 1, 2), 5.0f32);
        let flat = Array2::from_elem((1, 2), 1.0f32);
        let dark = Array2::from_elem((1, 2), 1.0f32);
        let out = normalize_with_fields(&stack.view(), &flat.view(), &dark.view()).unwrap();
        // (5 - 1) / 0 = +inf; the division by zero is surfaced, not masked.
        assert!(out.iter().all(|v| v.is_infinite()));
    }

    #[test]
    fn mismatched_field_shape_is_fatal() {
        let stack = Array3::from_elem((2, 4, 8), 1.0f32);
        let flat = Array2::from_elem((4, 7), 2.0f32);
        let dark = Array2::from_elem((4, 8), 0.0f32);
        let err =
            normalize_with_fields(&stack.view(), &flat.view(), &dark.view()).unwrap_err();
        assert_eq!(
            err,
            NormalizeError::FieldShapeMismatch {
                field: "flat",
                expected: [4, 8],
                got: [4, 7],
            }
        );
    }

    #[test]
    fn mismatched_dark_field_shape_is_fatal() {
        let stack = Array3::from_elem((2, 4, 8), 1.0f32);
        let flat = Array2::from_elem((4, 8), 2.0f32);
        let dark = Array2::from_elem((3, 8), 0.0f32);
        let err =
            normalize_with_fields(&stack.view(), &flat.view(), &dark.view()).unwrap_err();
        assert_eq!(
            err,
            NormalizeError::FieldShapeMismatch {
                field: "dark",
                expected: [4, 8],
                got: [3, 8],
            }
        );
    }
}
