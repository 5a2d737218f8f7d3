//! Format tag to backend mapping.

use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;

use fileworks_core::TaskError;

use crate::backend::{ArchiveBackend, StreamBackend, TarBackend, ZipBackend};
use crate::format::ArchiveFormat;

/// Registered archive backends keyed by the formats they handle.
///
/// Formats without a registered backend are still recognised by
/// [`ArchiveFormat::from_path`] but fail with
/// [`TaskError::BackendUnavailable`] when used.
#[derive(Clone, Default)]
pub struct BackendRegistry {
    backends: IndexMap<ArchiveFormat, Arc<dyn ArchiveBackend>>,
}

impl BackendRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every backend compiled into this build.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ZipBackend));
        registry.register(Arc::new(TarBackend));
        registry.register(Arc::new(StreamBackend));
        registry
    }

    /// Register `backend` for every format it declares, replacing earlier
    /// registrations.
    pub fn register(&mut self, backend: Arc<dyn ArchiveBackend>) {
        for format in backend.formats() {
            tracing::debug!(%format, backend = backend.name(), "registering archive backend");
            self.backends.insert(*format, Arc::clone(&backend));
        }
    }

    /// Remove the backend for `format`, if any.
    pub fn unregister(&mut self, format: ArchiveFormat) -> bool {
        self.backends.shift_remove(&format).is_some()
    }

    /// The backend for `format`.
    pub fn get(&self, format: ArchiveFormat) -> Result<Arc<dyn ArchiveBackend>, TaskError> {
        self.backends
            .get(&format)
            .cloned()
            .ok_or_else(|| TaskError::BackendUnavailable {
                format: format.to_string(),
            })
    }

    /// Check if `format` has a backend.
    pub fn supports(&self, format: ArchiveFormat) -> bool {
        self.backends.contains_key(&format)
    }

    /// Formats with a backend, in registration order.
    pub fn formats(&self) -> impl Iterator<Item = ArchiveFormat> + '_ {
        self.backends.keys().copied()
    }

    /// Check if `path` names an archive this build can open.
    pub fn is_supported_archive(&self, path: &Path) -> bool {
        ArchiveFormat::from_path(path).is_some_and(|format| self.supports(format))
    }
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.backends.iter().map(|(k, v)| (k, v.name())))
            .finish()
    }
}

/// Check `path` against the default backends.
pub fn is_supported_archive(path: &Path) -> bool {
    BackendRegistry::with_defaults().is_supported_archive(path)
}
