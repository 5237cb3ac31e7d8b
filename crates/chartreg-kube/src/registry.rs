//! The component catalog
//!
//! Components self-register during operator startup, strictly before
//! concurrent traffic begins; any registration failure is fatal. Afterwards
//! the catalog is read-only and safe for arbitrarily many concurrent
//! lookups and renders.

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chartreg_core::Chart;
use chartreg_engine::{EngineError, ManifestSet, RenderPipeline};

use crate::component::{Component, ComponentConfig};
use crate::error::{RegistryError, Result};

/// Default directory chart bundles are shipped under
pub const DEFAULT_CHARTS_DIR: &str = "charts";

/// Registry of chart-managed components, keyed by component name
pub struct ComponentRegistry {
    charts_dir: PathBuf,
    components: RwLock<HashMap<String, Arc<Component>>>,
    pipeline: RenderPipeline,
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_CHARTS_DIR)
    }
}

impl ComponentRegistry {
    /// Create a registry resolving chart references under `charts_dir`
    pub fn new(charts_dir: impl Into<PathBuf>) -> Self {
        Self {
            charts_dir: charts_dir.into(),
            components: RwLock::new(HashMap::new()),
            pipeline: RenderPipeline::default(),
        }
    }

    /// Register a component at operator startup
    ///
    /// Loads the chart bundle, extracts the platform override tree and
    /// inserts the record into the catalog. Every failure here is fatal:
    /// registration happens once, at startup, and a broken catalog must
    /// never become visible to traffic.
    pub fn register(&self, name: &str, config: ComponentConfig) -> Result<()> {
        if name.is_empty() {
            return Err(RegistryError::InvalidConfig {
                name: name.to_string(),
                message: "component name cannot be empty".to_string(),
            });
        }
        if config.chart_name.is_empty() {
            return Err(RegistryError::InvalidConfig {
                name: name.to_string(),
                message: "chart name cannot be empty".to_string(),
            });
        }
        if self.read().contains_key(name) {
            return Err(RegistryError::DuplicateComponent {
                name: name.to_string(),
            });
        }

        let chart =
            Chart::load(&self.charts_dir, &config.chart_name).map_err(|source| {
                RegistryError::ChartLoadFailed {
                    name: name.to_string(),
                    source,
                }
            })?;

        let platform_values =
            chart
                .platform_values()
                .map_err(|source| RegistryError::ChartLoadFailed {
                    name: name.to_string(),
                    source,
                })?;

        let component = Component::new(
            config.chart_name,
            chart,
            platform_values,
            config.values_generator,
            config.watches,
        );

        let mut components = self.write();
        if components.contains_key(name) {
            return Err(RegistryError::DuplicateComponent {
                name: name.to_string(),
            });
        }
        components.insert(name.to_string(), Arc::new(component));

        tracing::info!(component = name, "registered chart-managed component");
        Ok(())
    }

    /// Resolve a registered component by name
    pub fn get(&self, name: &str) -> Option<Arc<Component>> {
        self.read().get(name).cloned()
    }

    /// All registered component names, sorted
    pub fn list_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Render a component's chart into concrete manifests
    ///
    /// Resolves the component, runs its values generator against the
    /// serialized `config`, folds the three configuration tiers and drives
    /// the render pipeline. Deterministic: identical `(name, config)` pairs
    /// produce byte-identical manifest sets.
    pub fn render<S: Serialize>(&self, name: &str, config: &S) -> Result<ManifestSet> {
        let component = self
            .get(name)
            .ok_or_else(|| RegistryError::ComponentNotFound {
                name: name.to_string(),
            })?;

        let config_json =
            serde_json::to_value(config).map_err(|e| RegistryError::ValuesGeneration {
                name: name.to_string(),
                message: format!("failed to serialize component config: {e}"),
            })?;

        let component_values =
            component
                .generate_values(&config_json)
                .map_err(|e| RegistryError::ValuesGeneration {
                    name: name.to_string(),
                    message: e.to_string(),
                })?;

        let final_values = component.merged_values(&component_values);

        self.pipeline
            .render(&component.chart, &final_values)
            .map_err(|source| match source {
                EngineError::InvalidManifest { .. } => RegistryError::InvalidManifest {
                    name: name.to_string(),
                    source,
                },
                EngineError::Template { .. } => RegistryError::Rendering {
                    name: name.to_string(),
                    source,
                },
            })
    }

    /// Names of components holding a pending watch matching this CRD
    ///
    /// Used by the host framework's CRD creation handler to route the event
    /// to every owning component. Watch sets may overlap across components;
    /// no deduplication is attempted.
    pub fn components_for_crd(&self, crd: &CustomResourceDefinition) -> Vec<String> {
        let mut names: Vec<String> = self
            .read()
            .iter()
            .filter(|(_, component)| component.watches.matches_pending(crd))
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<Component>>> {
        self.components.read().expect("catalog lock poisoned")
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<Component>>> {
        self.components.write().expect("catalog lock poisoned")
    }
}
