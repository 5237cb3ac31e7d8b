//! Chart-managed component records
//!
//! A component is a plain data record: the loaded chart, the extracted
//! platform overrides, a values generator and its watch set. Behavior
//! differences between components live entirely in the generator value,
//! not in type-specific variants. Records are created once during
//! registration and never mutated afterwards, except for the isolated
//! watch-lifecycle state.

use serde_json::Value as JsonValue;
use std::fmt;

use chartreg_core::{Chart, Values};

use crate::watches::{WatchSet, WatchedKind};

/// Error type produced by a values generator
pub type GeneratorError = Box<dyn std::error::Error + Send + Sync>;

/// Generates the component-specific configuration tree from the typed
/// component config, serialized to JSON by the registry
pub type ValuesGenerator =
    Box<dyn Fn(&JsonValue) -> std::result::Result<Values, GeneratorError> + Send + Sync>;

/// Configuration for registering a chart-managed component
pub struct ComponentConfig {
    /// Name of the chart bundle to load (resolved under the registry's
    /// charts directory)
    pub chart_name: String,

    /// Generates chart values from the component config
    pub values_generator: ValuesGenerator,

    /// Resource types to watch for this component
    pub watches: Vec<WatchedKind>,
}

/// A registered chart-managed component
pub struct Component {
    /// Name of the chart bundle
    pub chart_name: String,

    /// The loaded chart bundle
    pub chart: Chart,

    /// Platform-specific value overrides extracted from the bundle
    platform_values: Values,

    /// Generates values from the component config
    values_generator: ValuesGenerator,

    /// Watch lifecycle state, the only field mutated after registration
    pub watches: WatchSet,
}

impl Component {
    pub(crate) fn new(
        chart_name: String,
        chart: Chart,
        platform_values: Values,
        values_generator: ValuesGenerator,
        watches: Vec<WatchedKind>,
    ) -> Self {
        Self {
            chart_name,
            chart,
            platform_values,
            values_generator,
            watches: WatchSet::new(watches),
        }
    }

    /// The platform override tree (empty if the bundle ships none)
    pub fn platform_values(&self) -> &Values {
        &self.platform_values
    }

    /// Run the values generator against a serialized component config
    pub fn generate_values(&self, config: &JsonValue) -> Result<Values, GeneratorError> {
        (self.values_generator)(config)
    }

    /// Fold component values onto the platform and chart-default tiers
    pub fn merged_values(&self, component_values: &Values) -> Values {
        Values::merge_layers(&self.chart.values, &self.platform_values, component_values)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("chart_name", &self.chart_name)
            .field("chart", &self.chart.metadata.name)
            .field("watches", &self.watches)
            .finish_non_exhaustive()
    }
}
