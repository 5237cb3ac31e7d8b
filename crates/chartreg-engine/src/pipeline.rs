//! Render pipeline
//!
//! Drives the template engine and narrows its raw output down to the subset
//! that represents deployable manifests: post-install notes, test fixtures
//! and lifecycle hooks are dropped, and every surviving entry must parse as
//! well-formed (multi-document) YAML.

use indexmap::IndexMap;
use serde::Deserialize;

use chartreg_core::{Chart, Values};

use crate::engine::Engine;
use crate::error::{EngineError, Result};

/// Rendered manifests keyed by template entry name
pub type ManifestSet = IndexMap<String, String>;

/// Renders a chart and filters the output to deployable manifests
pub struct RenderPipeline {
    engine: Engine,
}

impl Default for RenderPipeline {
    fn default() -> Self {
        Self::new(Engine::strict())
    }
}

impl RenderPipeline {
    pub fn new(engine: Engine) -> Self {
        Self { engine }
    }

    /// Render a chart with a fully merged configuration tree
    ///
    /// A template failure surfaces as `EngineError::Template`; output that
    /// rendered but is not valid YAML surfaces as
    /// `EngineError::InvalidManifest`.
    pub fn render(&self, chart: &Chart, values: &Values) -> Result<ManifestSet> {
        let raw = self.engine.render_chart(chart, values)?;

        let mut manifests = ManifestSet::new();

        for (name, content) in raw {
            if should_exclude(&name) {
                tracing::debug!(template = %name, "excluding non-manifest template");
                continue;
            }

            let trimmed = content.trim();
            if trimmed.is_empty() || trimmed == "---" {
                continue;
            }

            validate_yaml(&name, &content)?;
            manifests.insert(name, content);
        }

        Ok(manifests)
    }
}

/// Check if a rendered file is not a deployable manifest
///
/// Excluded are post-install notes, test fixtures and lifecycle hooks.
fn should_exclude(name: &str) -> bool {
    name.contains("NOTES.txt") || name.contains("/tests/") || name.contains("/hooks/")
}

/// Validate that content parses as multi-document YAML
fn validate_yaml(name: &str, content: &str) -> Result<()> {
    for document in serde_yaml::Deserializer::from_str(content) {
        serde_yaml::Value::deserialize(document).map_err(|e| EngineError::InvalidManifest {
            template: name.to_string(),
            message: e.to_string(),
        })?;
    }
    Ok(())
}
