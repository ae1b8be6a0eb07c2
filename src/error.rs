//! Error types for gemtool.
//!
//! This module provides the error hierarchy for every stage of a run:
//! configuration, inventory parsing, planning, and the external package
//! manager.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for gemtool.
#[derive(Debug, Error)]
pub enum GemtoolError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Inventory parsing and loading errors.
    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),

    /// Planning errors.
    #[error("Planning error: {0}")]
    Plan(#[from] PlanError),

    /// Package manager errors.
    #[error("Package manager error: {0}")]
    PackageManager(#[from] PackageManagerError),

    /// The run was cancelled by an interrupt signal.
    #[error("Interrupted: {completed} actions completed, {remaining} not started")]
    Interrupted {
        /// Number of actions that ran before the interrupt.
        completed: usize,
        /// Number of actions that were never started.
        remaining: usize,
    },

    /// The run was cancelled and how far it got is unknown.
    #[error("Interrupted: {reason}, action counts unknown")]
    InterruptedUncounted {
        /// Why the counts are unavailable.
        reason: String,
    },

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found.
    #[error("Configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The configuration file could not be parsed.
    #[error("Failed to parse configuration: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// Validation failed.
    #[error("Configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
        /// Field that failed validation.
        field: Option<String>,
    },
}

/// Inventory parsing and loading errors.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// A non-empty line does not match the expected grammar.
    #[error("Malformed line {line}: '{content}' ({reason})")]
    MalformedLine {
        /// 1-based line number.
        line: usize,
        /// The offending line, trimmed.
        content: String,
        /// What was wrong with it.
        reason: String,
    },

    /// The desired-state file does not exist or cannot be opened.
    #[error("Cannot open gem list {path}: {message}")]
    MissingFile {
        /// Path that was requested.
        path: PathBuf,
        /// Underlying IO message.
        message: String,
    },
}

/// Planning errors.
#[derive(Debug, Error)]
pub enum PlanError {
    /// Pruning requires versions listed newest first.
    #[error("Cannot prune an inventory whose versions are not listed newest first ({order})")]
    UnorderedInventory {
        /// The ordering the inventory actually carries.
        order: String,
    },
}

/// Errors raised while talking to the external package manager.
#[derive(Debug, Error)]
pub enum PackageManagerError {
    /// The program could not be started at all.
    #[error("Failed to run '{program}': {message}")]
    SpawnFailed {
        /// Program that was invoked.
        program: String,
        /// Description of the failure.
        message: String,
    },

    /// The program ran and reported failure.
    #[error("'{command}' exited with {status}: {stderr}")]
    CommandFailed {
        /// Full command line, for display.
        command: String,
        /// Exit status description.
        status: String,
        /// Trimmed standard error.
        stderr: String,
    },

    /// The program succeeded but printed something we do not understand.
    #[error("Unexpected output from '{command}': {output}")]
    UnexpectedOutput {
        /// Full command line, for display.
        command: String,
        /// The output that could not be interpreted.
        output: String,
    },
}

/// Result type alias for gemtool operations.
pub type Result<T> = std::result::Result<T, GemtoolError>;

impl GemtoolError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true if this error came from cancelling the run.
    #[must_use]
    pub const fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted { .. } | Self::InterruptedUncounted { .. })
    }

    /// Returns the process exit code that best describes this error.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Interrupted { .. } | Self::InterruptedUncounted { .. } => 130,
            Self::Config(_) | Self::Inventory(_) => 2,
            _ => 1,
        }
    }
}

impl ConfigError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }
}

impl InventoryError {
    /// Creates a malformed-line error.
    #[must_use]
    pub fn malformed(line: usize, content: &str, reason: impl Into<String>) -> Self {
        Self::MalformedLine {
            line,
            content: content.trim().to_string(),
            reason: reason.into(),
        }
    }
}
