//! Engine error types
//!
//! Two failure classes are kept apart on purpose: `Template` means the
//! engine could not run the templates, `InvalidManifest` means the templates
//! ran but produced output that is not well-formed YAML.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("template '{template}' failed to render: {message}")]
    Template { template: String, message: String },

    #[error("template '{template}' produced invalid manifest: {message}")]
    InvalidManifest { template: String, message: String },
}

impl EngineError {
    pub(crate) fn template(template: impl Into<String>, err: &minijinja::Error) -> Self {
        // minijinja chains the interesting detail behind the outer error.
        let mut message = err.to_string();
        let mut source = std::error::Error::source(err);
        while let Some(cause) = source {
            message.push_str(&format!(": {cause}"));
            source = cause.source();
        }
        EngineError::Template {
            template: template.into(),
            message,
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
