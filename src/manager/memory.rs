//! In-memory package manager.
//!
//! Holds an inventory snapshot instead of a live gem database. Mutations
//! update the snapshot, so a whole run can be replayed without touching the
//! system. Used for `--dry-run` and as a fake in tests.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;
use tracing::{info, warn};

use crate::error::{GemtoolError, PackageManagerError, Result};
use crate::inventory::{Inventory, InventoryParser, OutdatedRecord, ParseMode, VersionedUnit};
use crate::planner::DiffEngine;

use super::client::{InstallOptions, PackageManager};

/// Package manager that works against an in-memory inventory.
#[derive(Debug)]
pub struct InMemoryPackageManager {
    /// Current snapshot.
    installed: Mutex<Inventory>,
    /// Outdated report returned by `list_outdated`.
    outdated: Vec<OutdatedRecord>,
    /// Units whose install or uninstall should fail.
    failing: HashSet<VersionedUnit>,
    /// Diff engine used for membership checks.
    diff_engine: DiffEngine,
}

impl InMemoryPackageManager {
    /// Creates a manager seeded with an installed inventory.
    #[must_use]
    pub fn new(installed: Inventory) -> Self {
        Self {
            installed: Mutex::new(installed),
            outdated: Vec::new(),
            failing: HashSet::new(),
            diff_engine: DiffEngine::new(),
        }
    }

    /// Creates a manager that starts from what `live` currently reports.
    ///
    /// Only read-only queries are issued against `live`. An outdated listing
    /// that cannot be fetched is treated as empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the installed gems cannot be listed.
    pub async fn seeded_from<M: PackageManager + ?Sized>(live: &M) -> Result<Self> {
        let parser = InventoryParser::new();
        let installed = parser.parse_installed(&live.list_installed().await?)?;

        let outdated = match live.list_outdated().await {
            Ok(listing) => parser.parse_outdated(&listing, ParseMode::Lenient)?,
            Err(e) => {
                warn!("Could not list outdated gems, assuming none: {e}");
                Vec::new()
            }
        };

        info!(
            "Dry run seeded with {} installed versions from {}",
            installed.version_count(),
            live.backend_name()
        );
        Ok(Self::new(installed).with_outdated(outdated))
    }

    /// Sets the outdated report.
    #[must_use]
    pub fn with_outdated(mut self, outdated: Vec<OutdatedRecord>) -> Self {
        self.outdated = outdated;
        self
    }

    /// Makes every mutation of `unit` fail.
    #[must_use]
    pub fn with_failure(mut self, unit: VersionedUnit) -> Self {
        self.failing.insert(unit);
        self
    }

    /// Returns a copy of the current snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot lock is poisoned.
    pub fn snapshot(&self) -> Result<Inventory> {
        self.lock().map(|inventory| inventory.clone())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inventory>> {
        self.installed
            .lock()
            .map_err(|_| GemtoolError::internal("in-memory inventory lock poisoned"))
    }

    fn check_failure(&self, verb: &str, unit: &VersionedUnit) -> Result<()> {
        if self.failing.contains(unit) {
            return Err(PackageManagerError::CommandFailed {
                command: format!("{verb} {unit}"),
                status: String::from("simulated failure"),
                stderr: String::new(),
            }
            .into());
        }
        Ok(())
    }
}

#[async_trait]
impl PackageManager for InMemoryPackageManager {
    async fn list_installed(&self) -> Result<String> {
        Ok(self.lock()?.to_string())
    }

    async fn is_installed(&self, name: &str, version: &str) -> Result<bool> {
        let inventory = self.lock()?;
        Ok(self.diff_engine.is_installed(&inventory, name, version))
    }

    async fn list_outdated(&self) -> Result<String> {
        let installed = self.lock()?;
        Ok(self
            .outdated
            .iter()
            .filter(|r| !installed.contains(&r.name, &r.latest))
            .map(|r| format!("{r}\n"))
            .collect())
    }

    async fn install(&self, name: &str, version: &str, _options: &InstallOptions) -> Result<()> {
        let unit = VersionedUnit::new(name, version);
        self.check_failure("install", &unit)?;

        let mut inventory = self.lock()?;
        *inventory = inventory.with_installed(&unit);
        info!("[dry-run] installed {unit}");
        Ok(())
    }

    async fn uninstall(&self, name: &str, version: &str, _options: &InstallOptions) -> Result<()> {
        let unit = VersionedUnit::new(name, version);
        self.check_failure("uninstall", &unit)?;

        let mut inventory = self.lock()?;
        *inventory = inventory.without(std::slice::from_ref(&unit));
        info!("[dry-run] uninstalled {unit}");
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "in-memory"
    }
}
