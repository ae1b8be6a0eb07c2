//! Diff engine for comparing desired vs installed gems.
//!
//! Inventories are compared as sets of `(name, version)` units. There is no
//! fuzzy version matching: a desired version that is not installed exactly
//! is always installed, and an installed version that is not desired is
//! always uninstalled.

use std::collections::HashSet;
use tracing::debug;

use crate::inventory::{Inventory, VersionedUnit};

use super::plan::ActionPlan;

/// Engine for computing diffs between desired and installed inventories.
#[derive(Debug, Default)]
pub struct DiffEngine;

impl DiffEngine {
    /// Creates a new diff engine.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Computes the install and uninstall sets.
    ///
    /// `to_install` follows the iteration order of `desired` and
    /// `to_uninstall` the iteration order of `actual`. A unit present in both
    /// inventories appears in neither list.
    #[must_use]
    pub fn diff(&self, desired: &Inventory, actual: &Inventory) -> ActionPlan {
        let desired_units = desired.units();
        let actual_units = actual.units();

        let desired_set: HashSet<&VersionedUnit> = desired_units.iter().collect();
        let actual_set: HashSet<&VersionedUnit> = actual_units.iter().collect();

        let to_install: Vec<VersionedUnit> = desired_units
            .iter()
            .filter(|u| !actual_set.contains(u))
            .cloned()
            .collect();

        let to_uninstall: Vec<VersionedUnit> = actual_units
            .iter()
            .filter(|u| !desired_set.contains(u))
            .cloned()
            .collect();

        debug!(
            "Diff: {} to install, {} to uninstall, {} unchanged",
            to_install.len(),
            to_uninstall.len(),
            desired_units.len() - to_install.len()
        );

        ActionPlan::from_diff(to_install, to_uninstall)
    }

    /// Returns true if `actual` lists exactly this version.
    #[must_use]
    pub fn is_installed(&self, actual: &Inventory, name: &str, version: &str) -> bool {
        actual.contains(name, version)
    }
}
