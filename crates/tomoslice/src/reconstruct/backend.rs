//! Pluggable external reconstruction backends.
//!
//! The registry is a strategy table: it fixes the *supported set* of backend
//! algorithm names and maps each name to an optional provider. A name can be
//! known yet have no provider registered (the backing library is not
//! linked); resolution reports that as an explicit status so the dispatch
//! layer can fall back instead of failing the pipeline.

use std::collections::BTreeMap;
use std::sync::Arc;

use ndarray::{Array2, ArrayView3};

// ── Error type ─────────────────────────────────────────────────────────────

/// Execution failure inside a backend provider.
///
/// Consumed by the dispatch layer, which logs it and falls back to the
/// geometric backprojector; it never escapes a pipeline invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendError {
    /// Backend name that failed.
    pub backend: String,
    /// Human-readable failure reason.
    pub reason: String,
}

impl BackendError {
    pub fn new(backend: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "backend {:?}: {}", self.backend, self.reason)
    }
}

impl std::error::Error for BackendError {}

// ── Provider trait ─────────────────────────────────────────────────────────

/// An external reconstruction algorithm provider.
///
/// Resource discipline: a provider must acquire any backend-specific
/// resources (geometry descriptors, device buffers) inside `reconstruct`
/// and release them before returning, on both success and failure paths.
/// The pipeline reconstructs rows concurrently, so providers backing a
/// single-threaded native library must serialize access internally (for
/// example behind a `Mutex`); each call otherwise owns its resources alone.
pub trait ReconstructionBackend: Send + Sync {
    /// Registry name this provider serves (e.g. `"gridrec"`).
    fn name(&self) -> &str;

    /// Reconstruct one `(column × column)` slice from a
    /// `(angle, 1, column)` row slice.
    fn reconstruct(
        &self,
        row_data: &ArrayView3<f32>,
        angles: &[f32],
        center: f64,
    ) -> Result<Array2<f32>, BackendError>;
}

// ── Registry ───────────────────────────────────────────────────────────────

/// Outcome of resolving a backend name against the registry.
pub enum BackendResolution<'a> {
    /// The name is not in the supported set: caller error, no fallback.
    Unknown,
    /// The name is known but no provider is registered: fall back.
    Unavailable,
    /// A provider is registered and ready to be invoked.
    Ready(&'a dyn ReconstructionBackend),
}

/// Strategy table mapping backend names to optional providers.
#[derive(Default, Clone)]
pub struct BackendRegistry {
    providers: BTreeMap<String, Option<Arc<dyn ReconstructionBackend>>>,
}

impl BackendRegistry {
    /// Empty registry: only the built-in `"default"` algorithm is usable.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the known external algorithm names
    /// (`"gridrec"`, `"mlem"`), all without providers.
    ///
    /// Requests for these names parse successfully and fall back to the
    /// geometric backprojector until a provider is registered.
    pub fn with_known_backends() -> Self {
        let mut registry = Self::new();
        registry.declare("gridrec");
        registry.declare("mlem");
        registry
    }

    /// Add a name to the supported set without binding a provider.
    pub fn declare(&mut self, name: &str) {
        self.providers.entry(name.to_string()).or_insert(None);
    }

    /// Bind a provider, adding its name to the supported set if needed.
    ///
    /// Replaces any previously registered provider for the same name.
    pub fn register(&mut self, provider: Arc<dyn ReconstructionBackend>) {
        self.providers
            .insert(provider.name().to_string(), Some(provider));
    }

    /// Whether `name` is in the supported set (provider or not).
    pub fn supports(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    /// All names in the supported set, in sorted order.
    pub fn known_names(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }

    /// Whether a provider is currently bound for `name`.
    pub fn is_available(&self, name: &str) -> bool {
        matches!(self.providers.get(name), Some(Some(_)))
    }

    /// Resolve a name to an explicit dispatch status.
    pub fn resolve(&self, name: &str) -> BackendResolution<'_> {
        match self.providers.get(name) {
            None => BackendResolution::Unknown,
            Some(None) => BackendResolution::Unavailable,
            Some(Some(provider)) => BackendResolution::Ready(provider.as_ref()),
        }
    }
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (name, provider) in &self.providers {
            map.entry(name, &provider.is_some());
        }
        map.finish()
    }
}
