//! Configuration validation.
//!
//! Catches values that would only fail later, halfway through a run.

use crate::error::{ConfigError, Result};
use tracing::debug;

use super::spec::ToolConfig;

/// URL schemes `gem --source` understands.
const SUPPORTED_SCHEMES: &[&str] = &["http://", "https://", "file://"];

/// Validator for tool configuration.
#[derive(Debug, Default)]
pub struct ConfigValidator;

impl ConfigValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a configuration.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the first offending field.
    pub fn validate(&self, config: &ToolConfig) -> Result<()> {
        debug!("Validating configuration");

        if config.program.trim().is_empty() {
            return Err(ConfigError::validation("program must not be empty", "program").into());
        }

        if let Some(source) = &config.source {
            let source = source.trim();
            if source.is_empty() {
                return Err(ConfigError::validation("source must not be empty", "source").into());
            }
            if !SUPPORTED_SCHEMES.iter().any(|scheme| source.starts_with(scheme)) {
                return Err(ConfigError::validation(
                    format!(
                        "source '{source}' must start with one of: {}",
                        SUPPORTED_SCHEMES.join(", ")
                    ),
                    "source",
                )
                .into());
            }
        }

        Ok(())
    }
}
