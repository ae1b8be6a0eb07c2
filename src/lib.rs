// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # gemtool
//!
//! Keeps the gems installed on a machine in line with a plain-text gem list.
//!
//! ## Overview
//!
//! gemtool reads a list of gems and versions and makes the installed set
//! match it. It can:
//!
//! - Install or uninstall every version named in a list
//! - Converge the installed set onto a list (`clean`)
//! - Update every outdated gem to its latest version
//! - Prune old versions while keeping the newest one of each gem
//!
//! ## Architecture
//!
//! Every command follows the same desired-state loop:
//!
//! 1. **Desired State**: Read from a gem list file
//! 2. **Observed State**: Queried from the `gem` executable
//! 3. **Planner**: Diffs the two and orders the actions
//! 4. **Executor**: Runs the actions one by one and reports each outcome
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading and validation
//! - [`inventory`]: Gem list types and parsing
//! - [`manager`]: Package manager backends (`gem`, in-memory)
//! - [`planner`]: Diff computation, pruning and plan execution
//! - [`reconciler`]: Command orchestration
//! - [`shutdown`]: Cooperative interrupt handling
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```text
//! rails (7.1.3, 6.1.7)
//! rake (13.1.0)
//! nokogiri (1.16.0)
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod config;
pub mod error;
pub mod inventory;
pub mod manager;
pub mod planner;
pub mod reconciler;
pub mod shutdown;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter, TerminalReporter};
pub use config::{ConfigParser, ConfigValidator, ToolConfig};
pub use error::{GemtoolError, Result};
pub use inventory::{Inventory, InventoryParser, PackageRecord, VersionedUnit};
pub use manager::{GemCommand, InMemoryPackageManager, InstallOptions, PackageManager};
pub use planner::{ActionPlan, DiffEngine, ExecutionReport, PlanExecutor, VersionPruner};
pub use reconciler::Reconciler;
pub use shutdown::ShutdownSignal;
