//! Template engine based on MiniJinja
//!
//! The engine is an opaque box from the registry's point of view: it takes a
//! loaded chart bundle plus a fully merged configuration tree and returns
//! raw rendered text per template entry. Filtering and validation happen in
//! the pipeline on top.

use indexmap::IndexMap;
use minijinja::Environment;
use serde::Serialize;

use chartreg_core::{Chart, Values};

use crate::error::{EngineError, Result};
use crate::filters;

/// Chart identity exposed to templates as `chart.*`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChartInfo {
    name: String,
    version: String,
    app_version: Option<String>,
}

impl From<&Chart> for ChartInfo {
    fn from(chart: &Chart) -> Self {
        Self {
            name: chart.metadata.name.clone(),
            version: chart.metadata.version.to_string(),
            app_version: chart.metadata.app_version.clone(),
        }
    }
}

/// The template engine
pub struct Engine {
    strict_mode: bool,
}

impl Default for Engine {
    fn default() -> Self {
        Self::strict()
    }
}

impl Engine {
    /// Engine that fails on undefined variables
    pub fn strict() -> Self {
        Self { strict_mode: true }
    }

    /// Engine that renders undefined variables as empty
    pub fn lenient() -> Self {
        Self { strict_mode: false }
    }

    /// Create a configured MiniJinja environment
    fn create_environment(&self) -> Environment<'static> {
        let mut env = Environment::new();

        if self.strict_mode {
            env.set_undefined_behavior(minijinja::UndefinedBehavior::Strict);
        } else {
            env.set_undefined_behavior(minijinja::UndefinedBehavior::Lenient);
        }

        env.add_filter("toyaml", filters::toyaml);
        env.add_filter("tojson", filters::tojson);
        env.add_filter("b64encode", filters::b64encode);
        env.add_filter("b64decode", filters::b64decode);
        env.add_filter("quote", filters::quote);
        env.add_filter("nindent", filters::nindent);
        env.add_filter("indent", filters::indent);
        env.add_filter("required", filters::required);

        env
    }

    /// Render every template entry of a chart with the given values
    ///
    /// Helper templates (file name starting with `_`) are loaded into the
    /// environment so they can be imported, but are never rendered on their
    /// own. Output order follows the chart's sorted template list, making the
    /// result deterministic for identical inputs.
    pub fn render_chart(&self, chart: &Chart, values: &Values) -> Result<IndexMap<String, String>> {
        let mut env = self.create_environment();

        for template in &chart.templates {
            env.add_template_owned(template.name.clone(), template.data.clone())
                .map_err(|e| EngineError::template(&template.name, &e))?;
        }

        let ctx = minijinja::context! {
            values => values.inner(),
            chart => ChartInfo::from(chart),
        };

        let mut rendered = IndexMap::new();

        for template in &chart.templates {
            if is_helper(&template.name) {
                continue;
            }

            let tmpl = env
                .get_template(&template.name)
                .map_err(|e| EngineError::template(&template.name, &e))?;

            let output = tmpl
                .render(&ctx)
                .map_err(|e| EngineError::template(&template.name, &e))?;

            rendered.insert(template.name.clone(), output);
        }

        Ok(rendered)
    }
}

/// Helper templates start with an underscore, e.g. `templates/_helpers.tpl`
fn is_helper(name: &str) -> bool {
    name.rsplit('/')
        .next()
        .is_some_and(|stem| stem.starts_with('_'))
}
