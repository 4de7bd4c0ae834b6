//! Pipeline orchestration: stage sequencing over a full projection volume.
//!
//! The stage machine is linear, with no branching back:
//!
//! `Validate → [Normalize] → [RingFilter] → EstimateCenter →
//! ReconstructEachRow → Assemble`
//!
//! The bracketed stages are individually skippable; a skipped stage is an
//! explicit identity (its output equals its input). Row reconstructions are
//! independent and run on the rayon pool; any single row failure aborts the
//! whole invocation with no partial volume.

use std::sync::atomic::{AtomicBool, Ordering};

use ndarray::{s, Array2, ArrayView3, Axis};
use rayon::prelude::*;

use crate::center::estimate_center;
use crate::normalize::{normalize, normalize_with_fields, NormalizeError};
use crate::reconstruct::{reconstruct, Algorithm, BackendRegistry, ReconstructError};
use crate::ringfilter::remove_rings;
use crate::volume::{uniform_angles, ReconstructedVolume};

// ── Error type ─────────────────────────────────────────────────────────────

/// Errors that abort a pipeline invocation.
#[derive(Debug)]
pub enum PipelineError {
    /// The input volume has an empty axis.
    EmptyVolume { shape: [usize; 3] },
    /// The configured algorithm name is outside the supported set.
    Algorithm(ReconstructError),
    /// Normalization stage failure.
    Normalize(NormalizeError),
    /// Reconstruction of one row failed; the whole invocation aborts.
    Reconstruct { row: usize, source: ReconstructError },
    /// Cooperative cancellation was requested.
    Cancelled,
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyVolume { shape } => write!(
                f,
                "projection volume has an empty axis: shape {:?} (need angle, row, column >= 1)",
                shape
            ),
            Self::Algorithm(err) => write!(f, "algorithm selection: {}", err),
            Self::Normalize(err) => write!(f, "normalization stage: {}", err),
            Self::Reconstruct { row, source } => {
                write!(f, "reconstruction of row {} failed: {}", row, source)
            }
            Self::Cancelled => write!(f, "pipeline invocation was cancelled"),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Algorithm(err) | Self::Reconstruct { source: err, .. } => Some(err),
            Self::Normalize(err) => Some(err),
            Self::EmptyVolume { .. } | Self::Cancelled => None,
        }
    }
}

impl From<NormalizeError> for PipelineError {
    fn from(err: NormalizeError) -> Self {
        Self::Normalize(err)
    }
}

// ── Configuration and result ───────────────────────────────────────────────

/// Processing parameters for one pipeline invocation.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ProcessConfig {
    /// Run the normalization stage.
    pub normalize: bool,
    /// Run the ring-artifact suppression stage.
    pub remove_rings: bool,
    /// Ring filter strength (window radius is `floor(ring_level)`).
    pub ring_level: f32,
    /// Reconstruction algorithm selector.
    pub algorithm: Algorithm,
    /// Flat reference field, broadcast across the angle axis.
    ///
    /// Field correction replaces min-max normalization only when *both*
    /// reference fields are present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flat_field: Option<Array2<f32>>,
    /// Dark reference field, broadcast across the angle axis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dark_field: Option<Array2<f32>>,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            normalize: true,
            remove_rings: true,
            ring_level: 1.0,
            algorithm: Algorithm::DefaultGeometric,
            flat_field: None,
            dark_field: None,
        }
    }
}

/// Output of one pipeline invocation; ownership moves to the caller.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Reconstructed volume with axes `(row, column, column)`.
    pub volume: ReconstructedVolume,
    /// Estimated center of rotation in pixel-column units.
    pub center: f64,
}

// ── Orchestration ──────────────────────────────────────────────────────────

/// Run the full correction-and-reconstruction pipeline over a volume.
///
/// Equivalent to [`process_with_cancel`] without a cancellation flag.
pub fn process(
    volume: &ArrayView3<f32>,
    config: &ProcessConfig,
    registry: &BackendRegistry,
) -> Result<PipelineResult, PipelineError> {
    process_with_cancel(volume, config, registry, None)
}

/// Run the pipeline with an optional cooperative cancellation flag.
///
/// The flag is checked once per detector row before that row's
/// reconstruction starts; a set flag aborts the invocation with
/// [`PipelineError::Cancelled`]. Rows already in flight run to completion
/// but their output is discarded with the rest of the volume.
pub fn process_with_cancel(
    volume: &ArrayView3<f32>,
    config: &ProcessConfig,
    registry: &BackendRegistry,
    cancel: Option<&AtomicBool>,
) -> Result<PipelineResult, PipelineError> {
    let (n_angles, n_rows, n_cols) = volume.dim();
    if n_angles == 0 || n_rows == 0 || n_cols == 0 {
        return Err(PipelineError::EmptyVolume {
            shape: [n_angles, n_rows, n_cols],
        });
    }

    // Screen the algorithm name before any stage runs: a caller error must
    // fail with zero rows reconstructed.
    if let Algorithm::Backend(name) = &config.algorithm {
        if !registry.supports(name) {
            return Err(PipelineError::Algorithm(
                ReconstructError::UnsupportedAlgorithm {
                    name: name.clone(),
                    supported: crate::reconstruct::supported_names(registry),
                },
            ));
        }
    }

    tracing::info!(
        "processing volume ({} angles, {} rows, {} columns) with algorithm {:?}",
        n_angles,
        n_rows,
        n_cols,
        config.algorithm.name()
    );

    let mut data = volume.to_owned();

    if config.normalize {
        data = match (&config.flat_field, &config.dark_field) {
            (Some(flat), Some(dark)) => {
                tracing::debug!("normalizing with flat/dark reference fields");
                normalize_with_fields(&data.view(), &flat.view(), &dark.view())?
            }
            _ => {
                tracing::debug!("normalizing with global min-max rescale");
                normalize(&data.view())?
            }
        };
    }

    if config.remove_rings {
        tracing::debug!("removing ring artifacts at level {}", config.ring_level);
        data = remove_rings(&data.view(), config.ring_level);
    }

    let angles = uniform_angles(data.len_of(Axis(0)));
    let center = estimate_center(&data.view());

    let mut out = ReconstructedVolume::zeros((n_rows, n_cols, n_cols));
    out.axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .try_for_each(|(row, mut slot)| {
            if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                return Err(PipelineError::Cancelled);
            }
            let row_data = data.slice(s![.., row..row + 1, ..]);
            let image = reconstruct(&row_data, &angles, center, &config.algorithm, registry)
                .map_err(|source| PipelineError::Reconstruct { row, source })?;
            slot.assign(&image);
            Ok(())
        })?;

    tracing::info!(
        "reconstructed {} slices of {}x{}, center = {:.2}",
        n_rows,
        n_cols,
        n_cols,
        center
    );

    Ok(PipelineResult {
        volume: out,
        center,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ramp_stack;
    use ndarray::Array3;
    use std::sync::atomic::AtomicBool;

    #[test]
    fn end_to_end_ramp_volume() {
        let stack = ramp_stack(8, 4, 16);
        let registry = BackendRegistry::with_known_backends();
        let result = process(&stack.view(), &ProcessConfig::default(), &registry).unwrap();
        assert_eq!(result.volume.dim(), (4, 16, 16));
        assert_eq!(result.center, 8.0);
    }

    #[test]
    fn constant_volume_fails_normalization() {
        let stack = Array3::from_elem((8, 4, 16), 2.0f32);
        let registry = BackendRegistry::with_known_backends();
        let err = process(&stack.view(), &ProcessConfig::default(), &registry).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Normalize(NormalizeError::ZeroDynamicRange { .. })
        ));
    }

    #[test]
    fn skipped_stages_are_identity() {
        // With both optional stages off, the default algorithm sees the raw
        // stack: row 0's slice must equal a direct backprojection of it.
        let stack = ramp_stack(8, 2, 12);
        let registry = BackendRegistry::new();
        let config = ProcessConfig {
            normalize: false,
            remove_rings: false,
            ..ProcessConfig::default()
        };
        let result = process(&stack.view(), &config, &registry).unwrap();
        let row = stack.slice(s![.., 0..1, ..]);
        let expected =
            crate::reconstruct::backproject(&row, &uniform_angles(8));
        assert_eq!(result.volume.index_axis(Axis(0), 0), expected);
    }

    #[test]
    fn empty_axis_is_fatal() {
        let stack = Array3::<f32>::zeros((0, 4, 16));
        let registry = BackendRegistry::new();
        let err = process(&stack.view(), &ProcessConfig::default(), &registry).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::EmptyVolume { shape: [0, 4, 16] }
        ));
    }

    #[test]
    fn unsupported_algorithm_fails_before_any_row() {
        let stack = ramp_stack(8, 4, 16);
        let registry = BackendRegistry::with_known_backends();
        let config = ProcessConfig {
            algorithm: Algorithm::Backend("not-a-real-algorithm".to_string()),
            ..ProcessConfig::default()
        };
        let err = process(&stack.view(), &config, &registry).unwrap_err();
        assert!(matches!(err, PipelineError::Algorithm(_)));
    }

    #[test]
    fn unavailable_backend_still_produces_a_volume() {
        let stack = ramp_stack(8, 4, 16);
        let registry = BackendRegistry::with_known_backends();
        let fallback = process(
            &stack.view(),
            &ProcessConfig {
                algorithm: Algorithm::Backend("gridrec".to_string()),
                ..ProcessConfig::default()
            },
            &registry,
        )
        .unwrap();
        let default = process(&stack.view(), &ProcessConfig::default(), &registry).unwrap();
        assert_eq!(fallback.volume, default.volume);
        assert_eq!(fallback.center, default.center);
    }

    #[test]
    fn preset_cancel_flag_aborts() {
        let stack = ramp_stack(8, 4, 16);
        let registry = BackendRegistry::new();
        let flag = AtomicBool::new(true);
        let err = process_with_cancel(
            &stack.view(),
            &ProcessConfig::default(),
            &registry,
            Some(&flag),
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::Cancelled));
    }

    #[test]
    fn field_correction_is_used_when_both_fields_present() {
        let stack = Array3::from_elem((4, 2, 8), 150.0f32);
        let registry = BackendRegistry::new();
        let config = ProcessConfig {
            remove_rings: false,
            flat_field: Some(Array2::from_elem((2, 8), 200.0)),
            dark_field: Some(Array2::from_elem((2, 8), 100.0)),
            ..ProcessConfig::default()
        };
        // Constant stack would fail min-max normalization; with reference
        // fields it normalizes to a constant 0.5 and reconstructs cleanly.
        let result = process(&stack.view(), &config, &registry).unwrap();
        assert_eq!(result.volume.dim(), (2, 8, 8));
        assert!(result.volume.iter().all(|&v| (v - 0.5).abs() < 1e-6));
    }
}
