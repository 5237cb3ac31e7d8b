//! Error types for the component registry
//!
//! The first three variants are startup-time and fatal: the operator must
//! not come up with a partially valid catalog. The rest are render-time and
//! recoverable; the reconciliation caller treats them as transient and
//! retries with backoff.

use thiserror::Error;

use chartreg_core::CoreError;
use chartreg_engine::EngineError;

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RegistryError {
    /// A component with this name is already registered
    #[error("component '{name}' already registered")]
    DuplicateComponent { name: String },

    /// The registration itself is malformed
    #[error("invalid component config for '{name}': {message}")]
    InvalidConfig { name: String, message: String },

    /// The chart bundle could not be resolved or parsed
    #[error("chart load failed for component '{name}': {source}")]
    ChartLoadFailed {
        name: String,
        #[source]
        source: CoreError,
    },

    /// Lookup of an unregistered component
    #[error("component '{name}' not registered")]
    ComponentNotFound { name: String },

    /// The component's values generator rejected the supplied config
    #[error("values generation failed for component '{name}': {message}")]
    ValuesGeneration { name: String, message: String },

    /// The template engine failed to run
    #[error("template rendering failed for component '{name}': {source}")]
    Rendering {
        name: String,
        #[source]
        source: EngineError,
    },

    /// Templates ran but produced output that is not well-formed YAML
    #[error("invalid manifest for component '{name}': {source}")]
    InvalidManifest {
        name: String,
        #[source]
        source: EngineError,
    },
}

impl RegistryError {
    /// Whether this error must abort operator startup
    ///
    /// Startup-time failures have no recovery path; a broken catalog must
    /// never become visible to traffic.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RegistryError::DuplicateComponent { .. }
                | RegistryError::InvalidConfig { .. }
                | RegistryError::ChartLoadFailed { .. }
        )
    }
}
