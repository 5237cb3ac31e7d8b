//! chartreg-core - Chart bundle model and value resolution
//!
//! This crate provides the foundational types for the chartreg component
//! registry:
//! - `Chart`: an immutable loaded chart bundle (metadata, defaults,
//!   templates, auxiliary files)
//! - `Values`: configuration trees with three-tier deep merge
//! - Archive loading for packed `.tgz` bundles

pub mod archive;
pub mod chart;
pub mod error;
pub mod values;

pub use chart::{
    AuxiliaryFile, CHART_FILE, Chart, ChartMetadata, PLATFORM_VALUES_FILE, TEMPLATES_DIR,
    TemplateFile, VALUES_FILE,
};
pub use error::{CoreError, Result};
pub use values::Values;
