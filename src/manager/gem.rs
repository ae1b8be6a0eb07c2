//! `gem` command-line backend.
//!
//! Every query and mutation spawns the configured program and waits for it.
//! Calls are never issued concurrently.

use async_trait::async_trait;
use std::process::Output;
use tokio::process::Command;
use tracing::debug;

use crate::error::{PackageManagerError, Result};

use super::client::{InstallOptions, PackageManager};

/// Package manager backed by the `gem` executable.
#[derive(Debug, Clone)]
pub struct GemCommand {
    /// Program to run, `gem` unless configured otherwise.
    program: String,
}

impl GemCommand {
    /// Creates a backend that runs `program`.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Returns the configured program.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments for `gem list NAME -i -v VERSION`.
    #[must_use]
    pub fn is_installed_args(name: &str, version: &str) -> Vec<String> {
        vec![
            String::from("list"),
            name.to_string(),
            String::from("-i"),
            String::from("-v"),
            version.to_string(),
        ]
    }

    /// Arguments for `gem install NAME -v VERSION [options]`.
    #[must_use]
    pub fn install_args(name: &str, version: &str, options: &InstallOptions) -> Vec<String> {
        let mut args = vec![
            String::from("install"),
            name.to_string(),
            String::from("-v"),
            version.to_string(),
        ];
        args.extend(options.install_args());
        args
    }

    /// Arguments for `gem uninstall -a -I -x NAME -v VERSION`.
    ///
    /// `-I` skips the dependency check and `-x` removes executables without
    /// prompting, so the command never blocks on stdin.
    #[must_use]
    pub fn uninstall_args(name: &str, version: &str) -> Vec<String> {
        vec![
            String::from("uninstall"),
            String::from("-a"),
            String::from("-I"),
            String::from("-x"),
            name.to_string(),
            String::from("-v"),
            version.to_string(),
        ]
    }

    /// Runs the program and returns its raw output, whatever the exit status.
    async fn run(&self, args: &[String]) -> Result<Output> {
        debug!("Running: {}", self.command_line(args));

        let output = Command::new(&self.program)
            .args(args)
            .stdin(std::process::Stdio::null())
            .output()
            .await
            .map_err(|e| PackageManagerError::SpawnFailed {
                program: self.program.clone(),
                message: e.to_string(),
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            debug!("{} stderr: {}", self.program, stderr.trim());
        }

        Ok(output)
    }

    /// Runs the program and fails on a non-zero exit status.
    async fn run_checked(&self, args: &[String]) -> Result<String> {
        let output = self.run(args).await?;

        if !output.status.success() {
            return Err(PackageManagerError::CommandFailed {
                command: self.command_line(args),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn command_line(&self, args: &[String]) -> String {
        format!("{} {}", self.program(), args.join(" "))
    }
}

impl Default for GemCommand {
    fn default() -> Self {
        Self::new("gem")
    }
}

#[async_trait]
impl PackageManager for GemCommand {
    async fn list_installed(&self) -> Result<String> {
        self.run_checked(&[String::from("list")]).await
    }

    async fn is_installed(&self, name: &str, version: &str) -> Result<bool> {
        let args = Self::is_installed_args(name, version);
        // `gem list -i` exits 1 when the gem is missing, so the answer is
        // read from stdout rather than the status.
        let output = self.run(&args).await?;
        let stdout = String::from_utf8_lossy(&output.stdout);

        match stdout.trim() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(PackageManagerError::UnexpectedOutput {
                command: self.command_line(&args),
                output: other.to_string(),
            }
            .into()),
        }
    }

    async fn list_outdated(&self) -> Result<String> {
        self.run_checked(&[String::from("outdated")]).await
    }

    async fn install(&self, name: &str, version: &str, options: &InstallOptions) -> Result<()> {
        self.run_checked(&Self::install_args(name, version, options))
            .await
            .map(|_| ())
    }

    async fn uninstall(&self, name: &str, version: &str, _options: &InstallOptions) -> Result<()> {
        self.run_checked(&Self::uninstall_args(name, version))
            .await
            .map(|_| ())
    }

    fn backend_name(&self) -> &'static str {
        "gem"
    }
}
