//! chartreg-engine - Jinja2 templating for chart bundles
//!
//! This crate provides a MiniJinja-based template engine with:
//! - Kubernetes-specific filters (toyaml, b64encode, nindent, ...)
//! - A render pipeline that filters out non-manifest output and validates
//!   that every surviving entry is well-formed YAML

pub mod engine;
pub mod error;
pub mod filters;
pub mod pipeline;

pub use engine::Engine;
pub use error::{EngineError, Result};
pub use pipeline::{ManifestSet, RenderPipeline};
