//! Inventory module for gemtool.
//!
//! This module turns raw listing text into structured package records:
//! - Parsing the desired-state gem list (strict)
//! - Parsing live `gem list` and `gem outdated` output (lenient)
//! - The inventory model shared by the planner

mod parser;
mod types;

pub use parser::{InventoryParser, ParseMode};
pub use types::{Inventory, OutdatedRecord, PackageRecord, VersionOrder, VersionedUnit};
