//! Planning module for gem reconciliation.
//!
//! This module handles the comparison between desired and installed gems,
//! the keep-latest pruning policy, and sequential plan execution.

mod diff;
mod executor;
mod plan;
mod prune;

pub use diff::DiffEngine;
pub use executor::{
    ActionOutcome, ExecutionObserver, ExecutionReport, NoopObserver, PlanExecutor, UnitCheck,
};
pub use plan::{ActionPlan, ActionType, PlannedAction};
pub use prune::{PruneCandidate, VersionPruner};
