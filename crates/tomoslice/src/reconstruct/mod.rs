//! Per-slice reconstruction with multi-backend algorithm dispatch.
//!
//! This module is the dispatch layer that wires a reconstruction request to
//! an implementation:
//! - the built-in geometric backprojector (always available, no external
//!   dependency), or
//! - an optional external backend resolved through [`BackendRegistry`] at
//!   call time.
//!
//! Backend unavailability and backend execution failures are explicit status
//! values consumed here, never panics or control-flow exceptions: both fall
//! back to the geometric backprojector after surfacing a diagnostic. An
//! algorithm *name* outside the supported set is a caller error and fails
//! fast with no fallback.

mod backend;
mod geometric;

pub use backend::{BackendError, BackendRegistry, BackendResolution, ReconstructionBackend};
pub use geometric::backproject;

use ndarray::{Array2, ArrayView3, Axis};

// ── Error type ─────────────────────────────────────────────────────────────

/// Errors raised by reconstruction dispatch before any computation runs.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconstructError {
    /// `row_data` is not a single-detector-row slice of shape
    /// `(angle, 1, column)`.
    ShapeMismatch { shape: [usize; 3] },
    /// The angle-axis extent of `row_data` differs from the angle sequence
    /// length.
    AngleCountMismatch { data_angles: usize, angles: usize },
    /// The requested algorithm name is not in the supported set.
    UnsupportedAlgorithm {
        name: String,
        supported: Vec<String>,
    },
}

impl std::fmt::Display for ReconstructError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ShapeMismatch { shape } => write!(
                f,
                "row data must have shape (angle, 1, column), got {:?}",
                shape
            ),
            Self::AngleCountMismatch { data_angles, angles } => write!(
                f,
                "row data has {} angles but the angle sequence has {}",
                data_angles, angles
            ),
            Self::UnsupportedAlgorithm { name, supported } => write!(
                f,
                "unsupported algorithm {:?}; supported: {}",
                name,
                supported.join(", ")
            ),
        }
    }
}

impl std::error::Error for ReconstructError {}

// ── Algorithm selection ────────────────────────────────────────────────────

/// Name of the built-in geometric backprojector.
pub const DEFAULT_ALGORITHM: &str = "default";

/// Reconstruction algorithm selector.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// Built-in quarter-turn-binned backprojector.
    DefaultGeometric,
    /// Named external backend, resolved through the registry at call time.
    Backend(String),
}

impl Default for Algorithm {
    fn default() -> Self {
        Self::DefaultGeometric
    }
}

impl Algorithm {
    /// Parse a user-facing algorithm name against a registry's supported set.
    ///
    /// `"default"` always parses. Any other name must be known to the
    /// registry (available or not); unknown names fail fast here so that no
    /// reconstruction work starts for a caller error.
    pub fn parse(name: &str, registry: &BackendRegistry) -> Result<Self, ReconstructError> {
        if name == DEFAULT_ALGORITHM {
            return Ok(Self::DefaultGeometric);
        }
        if registry.supports(name) {
            return Ok(Self::Backend(name.to_string()));
        }
        Err(ReconstructError::UnsupportedAlgorithm {
            name: name.to_string(),
            supported: supported_names(registry),
        })
    }

    /// User-facing name of this algorithm.
    pub fn name(&self) -> &str {
        match self {
            Self::DefaultGeometric => DEFAULT_ALGORITHM,
            Self::Backend(name) => name,
        }
    }
}

/// All supported algorithm names: `"default"` plus the registry's set.
pub fn supported_names(registry: &BackendRegistry) -> Vec<String> {
    let mut names = vec![DEFAULT_ALGORITHM.to_string()];
    names.extend(registry.known_names());
    names
}

// ── Dispatch ───────────────────────────────────────────────────────────────

/// Reconstruct one square slice from a single detector row across all
/// angles.
///
/// `row_data` must have shape `(angle_count, 1, column_count)` with
/// `angle_count == angles.len()`; violations are fatal and raised before
/// any computation. `center` is forwarded to backend algorithms (the
/// built-in backprojector does not consume it).
///
/// Backend dispatch: an unavailable backend or a backend execution error
/// falls back to the built-in backprojector with a warning diagnostic; an
/// unknown backend name is a fatal caller error.
pub fn reconstruct(
    row_data: &ArrayView3<f32>,
    angles: &[f32],
    center: f64,
    algorithm: &Algorithm,
    registry: &BackendRegistry,
) -> Result<Array2<f32>, ReconstructError> {
    let shape = [
        row_data.len_of(Axis(0)),
        row_data.len_of(Axis(1)),
        row_data.len_of(Axis(2)),
    ];
    if shape[1] != 1 {
        return Err(ReconstructError::ShapeMismatch { shape });
    }
    if shape[0] != angles.len() {
        return Err(ReconstructError::AngleCountMismatch {
            data_angles: shape[0],
            angles: angles.len(),
        });
    }

    let name = match algorithm {
        Algorithm::DefaultGeometric => return Ok(backproject(row_data, angles)),
        Algorithm::Backend(name) => name,
    };

    match registry.resolve(name) {
        BackendResolution::Unknown => Err(ReconstructError::UnsupportedAlgorithm {
            name: name.clone(),
            supported: supported_names(registry),
        }),
        BackendResolution::Unavailable => {
            tracing::warn!(
                "backend {:?} is not available; falling back to the geometric backprojector",
                name
            );
            Ok(backproject(row_data, angles))
        }
        BackendResolution::Ready(provider) => {
            match provider.reconstruct(row_data, angles, center) {
                Ok(image) => Ok(image),
                Err(err) => {
                    tracing::warn!(
                        "backend {:?} failed ({}); falling back to the geometric backprojector",
                        name,
                        err
                    );
                    Ok(backproject(row_data, angles))
                }
            }
        }
    }
}
