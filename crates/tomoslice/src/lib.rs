//! tomoslice — sinogram correction and slice reconstruction pipeline.
//!
//! Ingests 3-D projection stacks (axes: angle × detector row × detector
//! column) and produces reconstructed volumetric slices. The pipeline stages
//! are:
//!
//! 1. **Normalize** – global min-max rescale, or flat/dark reference-field
//!    correction when both fields are supplied.
//! 2. **RingFilter** – ring-artifact suppression via a windowed median rank
//!    filter along the angle axis.
//! 3. **Center** – rotation-axis estimation (column midpoint policy).
//! 4. **Reconstruct** – per-row slice reconstruction with multi-backend
//!    algorithm dispatch and graceful fallback to the built-in geometric
//!    backprojector.
//! 5. **Pipeline** – stage sequencing over a full volume, one independent
//!    reconstruction per detector row, assembled into the output volume.
//!
//! # Public API
//! The stable surface is intentionally small:
//! - [`process`] / [`process_with_cancel`] and [`ProcessConfig`] as primary
//!   entry points
//! - [`BackendRegistry`] and [`ReconstructionBackend`] for plugging external
//!   reconstruction algorithms
//! - per-stage functions ([`normalize()`], [`remove_rings`],
//!   [`estimate_center`], [`reconstruct()`]) for callers that drive stages
//!   individually
//!
//! File I/O (HDF5/TIFF), display and configuration persistence are external
//! collaborators; this crate only consumes raw arrays and returns raw arrays.

pub mod center;
pub mod normalize;
pub mod pipeline;
pub mod reconstruct;
pub mod ringfilter;
pub mod volume;

#[cfg(test)]
mod test_utils;

pub use center::{estimate_center, CenterMethod};
pub use normalize::{normalize, normalize_with_fields, NormalizeError};
pub use pipeline::{
    process, process_with_cancel, PipelineError, PipelineResult, ProcessConfig,
};
pub use reconstruct::{
    reconstruct, Algorithm, BackendError, BackendRegistry, BackendResolution,
    ReconstructError, ReconstructionBackend,
};
pub use ringfilter::remove_rings;
pub use volume::{uniform_angles, ProjectionStack, ReconstructedVolume};
