//! Package manager trait definition.
//!
//! This module defines the narrow interface the engine needs from the
//! external package manager.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;

/// Options passed through verbatim to install and uninstall.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstallOptions {
    /// Install documentation.
    pub document: bool,
    /// Alternate remote source URL.
    pub source: Option<String>,
}

/// Trait for package manager backends.
#[async_trait]
pub trait PackageManager: Send + Sync {
    /// Returns the installed listing, one `name (v1, v2)` line per gem,
    /// versions newest first.
    async fn list_installed(&self) -> Result<String>;

    /// Checks whether exactly this version is installed.
    async fn is_installed(&self, name: &str, version: &str) -> Result<bool>;

    /// Returns the outdated listing, one `name (current < latest)` line per gem.
    async fn list_outdated(&self) -> Result<String>;

    /// Installs one version.
    async fn install(&self, name: &str, version: &str, options: &InstallOptions) -> Result<()>;

    /// Uninstalls one version.
    async fn uninstall(&self, name: &str, version: &str, options: &InstallOptions) -> Result<()>;

    /// Gets the backend name, for logs.
    fn backend_name(&self) -> &'static str;
}

impl InstallOptions {
    /// Returns the extra `gem install` arguments these options imply.
    #[must_use]
    pub fn install_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if !self.document {
            args.push(String::from("--no-document"));
        }
        if let Some(source) = &self.source {
            args.push(String::from("--source"));
            args.push(source.clone());
        }
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_args_default() {
        assert_eq!(InstallOptions::default().install_args(), vec!["--no-document"]);
    }

    #[test]
    fn test_install_args_with_source_and_docs() {
        let options = InstallOptions {
            document: true,
            source: Some(String::from("https://gems.example.com")),
        };
        assert_eq!(options.install_args(), vec!["--source", "https://gems.example.com"]);
    }
}
