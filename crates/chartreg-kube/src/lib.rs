//! chartreg-kube - Component registry and watch lifecycle
//!
//! This crate provides:
//! - **Component Registry**: the startup-built catalog of chart-managed
//!   components with load-once semantics and thread-safe read access
//! - **Render orchestration**: values generation, three-tier merge and
//!   template rendering per reconciliation request
//! - **Watch Lifecycle**: per-component pending/active tracking of watched
//!   resource types, promoted when the matching CRD appears
//!
//! Registration runs sequentially during operator startup and any failure
//! is fatal; `get`, `list_names`, `render` and the watch-lifecycle calls
//! are safe under concurrent reconciliation workers.

pub mod component;
pub mod error;
pub mod registry;
pub mod watches;

pub use component::{Component, ComponentConfig, GeneratorError, ValuesGenerator};
pub use error::{RegistryError, Result};
pub use registry::{ComponentRegistry, DEFAULT_CHARTS_DIR};
pub use watches::{WatchSet, WatchState, WatchedKind, served_version};
