//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// gemtool - keep installed gems in line with a gem list.
#[derive(Parser, Debug)]
#[command(name = "gemtool")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, global = true, env = "GEMTOOL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Install documentation.
    #[arg(short, long, global = true, overrides_with = "no_doc")]
    pub doc: bool,

    /// Do not install documentation (the default).
    #[arg(long, global = true)]
    pub no_doc: bool,

    /// Use URL as the remote source for gems.
    #[arg(short, long, global = true, value_name = "URL")]
    pub source: Option<String>,

    /// Package manager executable to run.
    #[arg(long, global = true, value_name = "PATH")]
    pub program: Option<String>,

    /// Show what would happen without changing anything.
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install the gems from the given gem list.
    Install {
        /// Gem list, one `name (v1, v2)` line per gem.
        file: PathBuf,
    },

    /// Uninstall the gems from the given gem list.
    Uninstall {
        /// Gem list, one `name (v1, v2)` line per gem.
        file: PathBuf,
    },

    /// Update all the outdated gems.
    Update,

    /// Remove all the older versions of gems while keeping the latest intact.
    Prune,

    /// Make your gem list equal to the given gem list.
    Clean {
        /// Gem list, one `name (v1, v2)` line per gem.
        file: PathBuf,
    },

    /// Show what `clean` would do without doing it.
    Plan {
        /// Gem list, one `name (v1, v2)` line per gem.
        file: PathBuf,
    },
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

impl Cli {
    /// Returns the documentation flag if one was given on the command line.
    #[must_use]
    pub const fn doc_override(&self) -> Option<bool> {
        if self.doc {
            Some(true)
        } else if self.no_doc {
            Some(false)
        } else {
            None
        }
    }
}
