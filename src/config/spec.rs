//! Configuration types for gemtool.
//!
//! This module defines the struct that maps to `gemtool.yaml`. Every field is
//! optional in the file; missing fields take the defaults below.

use serde::{Deserialize, Serialize};

use crate::manager::InstallOptions;

/// The root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ToolConfig {
    /// Package manager executable.
    #[serde(default = "default_program")]
    pub program: String,
    /// Install documentation alongside gems.
    #[serde(default)]
    pub document: bool,
    /// Alternate remote source for gems.
    #[serde(default)]
    pub source: Option<String>,
    /// Seconds to wait for the in-flight action after an interrupt.
    #[serde(default = "default_grace_period_secs")]
    pub grace_period_secs: u64,
}

fn default_program() -> String {
    String::from("gem")
}

const fn default_grace_period_secs() -> u64 {
    2
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            document: false,
            source: None,
            grace_period_secs: default_grace_period_secs(),
        }
    }
}

impl ToolConfig {
    /// Returns the options passed to every install and uninstall.
    #[must_use]
    pub fn install_options(&self) -> InstallOptions {
        InstallOptions {
            document: self.document,
            source: self.source.clone(),
        }
    }

    /// Returns the grace period as a duration.
    #[must_use]
    pub const fn grace_period(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.grace_period_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ToolConfig::default();
        assert_eq!(config.program, "gem");
        assert!(!config.document);
        assert_eq!(config.grace_period().as_secs(), 2);
        assert_eq!(config.install_options(), InstallOptions::default());
    }
}
