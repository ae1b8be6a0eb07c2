//! CLI module for gemtool.
//!
//! This module provides the command-line interface: argument parsing,
//! output formatting and the terminal progress reporter.

mod commands;
mod output;

pub use commands::{Cli, Commands, OutputFormat};
pub use output::{OutputFormatter, TerminalReporter};
