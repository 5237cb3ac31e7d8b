//! Chart bundle model and loading
//!
//! A chart bundle is an immutable package of default values, templated
//! manifest files and optional auxiliary data files. Bundles are resolved at
//! build time and shipped alongside the operator; loading happens exactly
//! once per component, at startup.

use semver::Version;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{CoreError, Result};
use crate::values::Values;

/// The chart definition file inside a bundle
pub const CHART_FILE: &str = "Chart.yaml";

/// The default values file inside a bundle
pub const VALUES_FILE: &str = "values.yaml";

/// Directory holding the templated manifests
pub const TEMPLATES_DIR: &str = "templates";

/// Auxiliary file carrying platform-specific value overrides
pub const PLATFORM_VALUES_FILE: &str = "values.platform.yaml";

/// Chart metadata parsed from `Chart.yaml`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMetadata {
    /// Chart name (required)
    pub name: String,

    /// Chart version (required, SemVer)
    #[serde(with = "version_serde")]
    pub version: Version,

    /// Description
    #[serde(default)]
    pub description: Option<String>,

    /// Application version
    #[serde(default)]
    pub app_version: Option<String>,
}

/// A single template entry, named relative to the bundle root
#[derive(Debug, Clone)]
pub struct TemplateFile {
    /// Path-like name, e.g. `templates/deployment.yaml`
    pub name: String,

    /// Raw template text
    pub data: String,
}

/// A non-template data file shipped inside the bundle
#[derive(Debug, Clone)]
pub struct AuxiliaryFile {
    /// Path-like name relative to the bundle root
    pub name: String,

    /// Raw bytes
    pub data: Vec<u8>,
}

/// A loaded, immutable chart bundle
#[derive(Debug, Clone)]
pub struct Chart {
    /// Identifying metadata
    pub metadata: ChartMetadata,

    /// Default configuration tree from `values.yaml`
    pub values: Values,

    /// Template entries, ordered by name
    pub templates: Vec<TemplateFile>,

    /// Auxiliary files (everything that is not metadata, values or templates)
    pub files: Vec<AuxiliaryFile>,
}

impl Chart {
    /// Resolve a chart reference under `charts_dir`
    ///
    /// Tries `<charts_dir>/<name>.tgz` first, then the unpacked directory
    /// `<charts_dir>/<name>`. Both attempted paths are embedded in the error
    /// when neither resolves.
    pub fn load(charts_dir: &Path, name: &str) -> Result<Chart> {
        let archive_path = charts_dir.join(format!("{name}.tgz"));
        if archive_path.is_file() {
            tracing::debug!(chart = name, path = %archive_path.display(), "loading packed chart");
            return crate::archive::load_archive(&archive_path);
        }

        let dir_path = charts_dir.join(name);
        if dir_path.is_dir() {
            tracing::debug!(chart = name, path = %dir_path.display(), "loading unpacked chart");
            return Self::from_dir(&dir_path);
        }

        Err(CoreError::ChartNotFound {
            reference: format!("{} or {}", archive_path.display(), dir_path.display()),
        })
    }

    /// Load a chart from an unpacked directory
    pub fn from_dir<P: AsRef<Path>>(path: P) -> Result<Chart> {
        let root = path.as_ref();
        let mut entries = Vec::new();

        for entry in walkdir::WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.path().is_file() {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(root)
                .unwrap_or(entry.path())
                .to_string_lossy()
                .replace('\\', "/");
            let data = std::fs::read(entry.path())?;
            entries.push((rel, data));
        }

        Self::from_entries(entries, &root.display().to_string())
    }

    /// Assemble a chart from raw `(name, bytes)` entries
    ///
    /// Shared by the directory and archive loaders. `reference` is only used
    /// for error messages.
    pub fn from_entries(entries: Vec<(String, Vec<u8>)>, reference: &str) -> Result<Chart> {
        let mut metadata = None;
        let mut values = Values::new();
        let mut templates = Vec::new();
        let mut files = Vec::new();

        for (name, data) in entries {
            if name == CHART_FILE {
                let text = text_entry(&name, data)?;
                metadata = Some(serde_yaml::from_str::<ChartMetadata>(&text)?);
            } else if name == VALUES_FILE {
                let text = text_entry(&name, data)?;
                values = Values::from_yaml(&text)?;
            } else if name.starts_with("templates/") {
                let text = text_entry(&name, data)?;
                templates.push(TemplateFile { name, data: text });
            } else {
                files.push(AuxiliaryFile { name, data });
            }
        }

        let metadata = metadata.ok_or_else(|| CoreError::InvalidChart {
            message: format!("{CHART_FILE} not found in {reference}"),
        })?;

        if metadata.name.is_empty() {
            return Err(CoreError::InvalidChart {
                message: format!("chart name is empty in {reference}"),
            });
        }

        // Sort for a deterministic render order.
        templates.sort_by(|a, b| a.name.cmp(&b.name));
        files.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(Chart {
            metadata,
            values,
            templates,
            files,
        })
    }

    /// Extract the platform override tree from the bundle's auxiliary files
    ///
    /// An absent `values.platform.yaml` is a valid state and yields an empty
    /// tree. A present file that does not parse is an error.
    pub fn platform_values(&self) -> Result<Values> {
        let Some(file) = self.files.iter().find(|f| f.name == PLATFORM_VALUES_FILE) else {
            return Ok(Values::new());
        };

        let text = String::from_utf8(file.data.clone()).map_err(|e| CoreError::InvalidChart {
            message: format!("invalid UTF-8 in {PLATFORM_VALUES_FILE}: {e}"),
        })?;

        Values::from_yaml(&text)
    }
}

fn text_entry(name: &str, data: Vec<u8>) -> Result<String> {
    String::from_utf8(data).map_err(|e| CoreError::InvalidChart {
        message: format!("invalid UTF-8 in {name}: {e}"),
    })
}

/// Custom serde for semver::Version
mod version_serde {
    use semver::Version;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(version: &Version, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&version.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Version, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Version::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_chart_fixture(root: &Path) {
        fs::create_dir_all(root.join("templates")).unwrap();
        fs::write(
            root.join("Chart.yaml"),
            "name: demo\nversion: 1.2.3\ndescription: A demo chart\n",
        )
        .unwrap();
        fs::write(root.join("values.yaml"), "replicas: 1\nimage: demo:latest\n").unwrap();
        fs::write(
            root.join("templates/deployment.yaml"),
            "kind: Deployment\nreplicas: {{ values.replicas }}\n",
        )
        .unwrap();
        fs::write(root.join("values.platform.yaml"), "replicas: 2\n").unwrap();
    }

    #[test]
    fn test_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        write_chart_fixture(dir.path());

        let chart = Chart::from_dir(dir.path()).unwrap();

        assert_eq!(chart.metadata.name, "demo");
        assert_eq!(chart.metadata.version.to_string(), "1.2.3");
        assert_eq!(chart.values.get("replicas").unwrap(), 1);
        assert_eq!(chart.templates.len(), 1);
        assert_eq!(chart.templates[0].name, "templates/deployment.yaml");
        assert_eq!(chart.files.len(), 1);
        assert_eq!(chart.files[0].name, "values.platform.yaml");
    }

    #[test]
    fn test_missing_chart_yaml() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("values.yaml"), "a: 1\n").unwrap();

        let err = Chart::from_dir(dir.path()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidChart { .. }));
    }

    #[test]
    fn test_load_prefers_archive_then_dir() {
        let charts = tempfile::tempdir().unwrap();
        let chart_dir = charts.path().join("demo");
        write_chart_fixture(&chart_dir);

        // No archive present: falls back to the directory.
        let chart = Chart::load(charts.path(), "demo").unwrap();
        assert_eq!(chart.metadata.name, "demo");
    }

    #[test]
    fn test_load_unknown_reference_names_both_paths() {
        let charts = tempfile::tempdir().unwrap();

        let err = Chart::load(charts.path(), "ghost").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("ghost.tgz"), "{message}");
        assert!(message.contains("ghost"), "{message}");
    }

    #[test]
    fn test_platform_values_present() {
        let dir = tempfile::tempdir().unwrap();
        write_chart_fixture(dir.path());

        let chart = Chart::from_dir(dir.path()).unwrap();
        let platform = chart.platform_values().unwrap();

        assert_eq!(platform.get("replicas").unwrap(), 2);
    }

    #[test]
    fn test_platform_values_absent_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        write_chart_fixture(dir.path());
        fs::remove_file(dir.path().join("values.platform.yaml")).unwrap();

        let chart = Chart::from_dir(dir.path()).unwrap();
        let platform = chart.platform_values().unwrap();

        assert!(platform.is_empty());
    }

    #[test]
    fn test_platform_values_invalid_yaml_fails() {
        let dir = tempfile::tempdir().unwrap();
        write_chart_fixture(dir.path());
        fs::write(dir.path().join("values.platform.yaml"), "a: [unclosed\n").unwrap();

        let chart = Chart::from_dir(dir.path()).unwrap();
        assert!(chart.platform_values().is_err());
    }

    #[test]
    fn test_templates_sorted() {
        let dir = tempfile::tempdir().unwrap();
        write_chart_fixture(dir.path());
        fs::write(dir.path().join("templates/configmap.yaml"), "kind: ConfigMap\n").unwrap();

        let chart = Chart::from_dir(dir.path()).unwrap();
        let names: Vec<&str> = chart.templates.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["templates/configmap.yaml", "templates/deployment.yaml"]
        );
    }
}
