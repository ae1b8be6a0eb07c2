//! Keep-latest version pruning.
//!
//! Every record keeps its first listed version and marks the rest for
//! removal. Version strings are never compared: "first" means "latest" only
//! because `gem list` prints versions newest first. That assumption is part
//! of the [`VersionOrder`] contract, and inventories that do not carry it are
//! rejected instead of silently pruning the wrong versions.
//!
//! Pruning is also per record, not per gem name. A listing that repeats a
//! name (`foo (2.0)` then `foo (1.0)`) keeps one version for each record.
//! `gem list` prints every name once, so this only matters for hand-built
//! inventories.

use serde::Serialize;
use tracing::debug;

use crate::error::{PlanError, Result};
use crate::inventory::{Inventory, VersionOrder, VersionedUnit};

/// Selects redundant versions under the keep-latest policy.
#[derive(Debug, Default)]
pub struct VersionPruner;

/// Pruning decision for one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PruneCandidate {
    /// Gem name.
    pub name: String,
    /// The version that stays installed.
    pub kept: String,
    /// Versions that will be removed, in listing order.
    pub stale: Vec<String>,
}

impl VersionPruner {
    /// Creates a new pruner.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Returns one decision per record, including records with nothing to prune.
    ///
    /// # Errors
    ///
    /// Returns `UnorderedInventory` unless the inventory is newest first.
    pub fn candidates(&self, actual: &Inventory) -> Result<Vec<PruneCandidate>> {
        if actual.order() != VersionOrder::NewestFirst {
            return Err(PlanError::UnorderedInventory {
                order: actual.order().to_string(),
            }
            .into());
        }

        let candidates: Vec<PruneCandidate> = actual
            .records()
            .iter()
            .filter_map(|record| {
                let (kept, stale) = record.versions.split_first()?;
                Some(PruneCandidate {
                    name: record.name.clone(),
                    kept: kept.clone(),
                    stale: stale.to_vec(),
                })
            })
            .collect();

        debug!(
            "{} of {} gems have old versions",
            candidates.iter().filter(|c| c.has_stale()).count(),
            candidates.len()
        );

        Ok(candidates)
    }

    /// Returns the units to remove.
    ///
    /// # Errors
    ///
    /// Returns `UnorderedInventory` unless the inventory is newest first.
    pub fn prune(&self, actual: &Inventory) -> Result<Vec<VersionedUnit>> {
        Ok(self
            .candidates(actual)?
            .iter()
            .flat_map(PruneCandidate::stale_units)
            .collect())
    }
}

impl PruneCandidate {
    /// Returns true if the record has more than one version.
    #[must_use]
    pub const fn has_stale(&self) -> bool {
        !self.stale.is_empty()
    }

    /// The stale versions as units.
    #[must_use]
    pub fn stale_units(&self) -> Vec<VersionedUnit> {
        self.stale
            .iter()
            .map(|v| VersionedUnit::new(&self.name, v))
            .collect()
    }
}
