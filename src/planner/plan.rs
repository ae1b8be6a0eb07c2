//! Action plan types and construction.
//!
//! This module defines the structure of an action plan and flattens it into
//! the ordered, deduplicated sequence of actions handed to the executor.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;

use crate::inventory::{OutdatedRecord, VersionedUnit};

/// The computed actions for one run.
#[derive(Debug, Clone, Serialize)]
pub struct ActionPlan {
    /// When the plan was created.
    pub created_at: DateTime<Utc>,
    /// Units present in the desired list but not installed.
    pub to_install: Vec<VersionedUnit>,
    /// Units installed but absent from the desired list.
    pub to_uninstall: Vec<VersionedUnit>,
    /// Old versions removed because a newer one of the same gem is kept.
    pub to_prune: Vec<VersionedUnit>,
    /// Gems to move from their current version to the latest one.
    pub to_update: Vec<OutdatedRecord>,
}

/// A single planned action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedAction {
    /// Action type.
    pub action_type: ActionType,
    /// Unit the action targets.
    pub unit: VersionedUnit,
    /// Version being replaced (updates only).
    pub previous: Option<String>,
}

/// Types of actions in a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    /// Install a version.
    Install,
    /// Install the latest version of an outdated gem.
    Update,
    /// Uninstall a version that is not desired.
    Uninstall,
    /// Uninstall an old version under keep-latest.
    Prune,
}

impl ActionPlan {
    /// Creates an empty plan (no changes needed).
    #[must_use]
    pub fn empty() -> Self {
        Self {
            created_at: Utc::now(),
            to_install: vec![],
            to_uninstall: vec![],
            to_prune: vec![],
            to_update: vec![],
        }
    }

    /// Creates a plan from install and uninstall sets.
    #[must_use]
    pub fn from_diff(to_install: Vec<VersionedUnit>, to_uninstall: Vec<VersionedUnit>) -> Self {
        Self {
            to_install,
            to_uninstall,
            ..Self::empty()
        }
    }

    /// Creates a plan that removes the given stale versions.
    #[must_use]
    pub fn from_prune(to_prune: Vec<VersionedUnit>) -> Self {
        Self {
            to_prune,
            ..Self::empty()
        }
    }

    /// Creates a plan that upgrades each outdated gem to its latest version.
    #[must_use]
    pub fn from_outdated(to_update: Vec<OutdatedRecord>) -> Self {
        Self {
            to_update,
            ..Self::empty()
        }
    }

    /// Returns the actions in execution order with duplicates removed.
    ///
    /// Order: installs, updates, uninstalls, prunes.
    #[must_use]
    pub fn actions(&self) -> Vec<PlannedAction> {
        let installs = self
            .to_install
            .iter()
            .map(|u| PlannedAction::new(ActionType::Install, u.clone()));
        let updates = self.to_update.iter().map(|r| PlannedAction {
            action_type: ActionType::Update,
            unit: r.target(),
            previous: Some(r.current.clone()),
        });
        let uninstalls = self
            .to_uninstall
            .iter()
            .map(|u| PlannedAction::new(ActionType::Uninstall, u.clone()));
        let prunes = self
            .to_prune
            .iter()
            .map(|u| PlannedAction::new(ActionType::Prune, u.clone()));

        let mut seen = HashSet::new();
        installs
            .chain(updates)
            .chain(uninstalls)
            .chain(prunes)
            .filter(|a| seen.insert((a.action_type, a.unit.clone())))
            .collect()
    }

    /// Returns true if the plan is empty (no changes).
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.to_install.is_empty()
            && self.to_uninstall.is_empty()
            && self.to_prune.is_empty()
            && self.to_update.is_empty()
    }

    /// Returns the number of distinct actions.
    #[must_use]
    pub fn action_count(&self) -> usize {
        self.actions().len()
    }
}

impl PlannedAction {
    /// Creates an action without a previous version.
    #[must_use]
    pub const fn new(action_type: ActionType, unit: VersionedUnit) -> Self {
        Self {
            action_type,
            unit,
            previous: None,
        }
    }

    /// Returns true if the action removes a version.
    #[must_use]
    pub const fn is_removal(&self) -> bool {
        matches!(self.action_type, ActionType::Uninstall | ActionType::Prune)
    }

    /// Returns a human-readable description of the action.
    #[must_use]
    pub fn description(&self) -> String {
        match self.action_type {
            ActionType::Install => format!("Installing {}", self.unit),
            ActionType::Uninstall => format!("Uninstalling {}", self.unit),
            ActionType::Prune => format!("Pruning {}", self.unit),
            ActionType::Update => format!(
                "Updating {} from {} to {}",
                self.unit.name,
                self.previous.as_deref().unwrap_or("?"),
                self.unit.version
            ),
        }
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Install => "install",
            Self::Update => "update",
            Self::Uninstall => "uninstall",
            Self::Prune => "prune",
        };
        write!(f, "{s}")
    }
}

impl std::fmt::Display for PlannedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.action_type, self.unit)
    }
}

impl std::fmt::Display for ActionPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let actions = self.actions();
        if actions.is_empty() {
            return write!(f, "No changes to be made");
        }

        writeln!(f, "Action Plan ({} actions):", actions.len())?;
        for (i, action) in actions.iter().enumerate() {
            writeln!(f, "  {}. {action}", i + 1)?;
        }
        Ok(())
    }
}
