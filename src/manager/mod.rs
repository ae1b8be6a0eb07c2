//! Package manager backends.
//!
//! This module provides the interface to the external package manager and
//! its implementations:
//! - `gem` command-line backend
//! - In-memory backend for dry runs and tests

mod client;
mod gem;
mod memory;

pub use client::{InstallOptions, PackageManager};
pub use gem::GemCommand;
pub use memory::InMemoryPackageManager;
