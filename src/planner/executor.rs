//! Plan executor for applying action plans.
//!
//! Actions run strictly one at a time. Each outcome is recorded and reported,
//! and a failed action never stops the ones after it. There is no rollback:
//! a partly applied plan converges on the next run because plans are always
//! recomputed from live state.

use serde::Serialize;
use tracing::{error, info, warn};

use crate::inventory::VersionedUnit;
use crate::manager::{InstallOptions, PackageManager};
use crate::shutdown::ShutdownSignal;

use super::plan::{ActionType, PlannedAction};
use super::prune::PruneCandidate;

/// Receives progress events as a run proceeds.
///
/// All methods default to doing nothing.
pub trait ExecutionObserver {
    /// A preparation stage started (e.g. listing installed gems).
    fn on_stage(&mut self, _stage: &str) {}

    /// The current stage finished.
    fn on_stage_finish(&mut self, _success: bool) {}

    /// A single unit was checked against the installed gems.
    fn on_check(&mut self, _check: &UnitCheck) {}

    /// A gem was examined for old versions.
    fn on_prune_check(&mut self, _candidate: &PruneCandidate) {}

    /// An action is about to run.
    fn on_action_start(&mut self, _action: &PlannedAction) {}

    /// An action finished.
    fn on_action_finish(&mut self, _outcome: &ActionOutcome) {}

    /// A free-form status message.
    fn on_message(&mut self, _message: &str) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default)]
pub struct NoopObserver;

impl ExecutionObserver for NoopObserver {}

/// Result of checking whether one unit is installed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitCheck {
    /// Unit that was checked.
    pub unit: VersionedUnit,
    /// Whether it is installed, `None` if the query failed.
    pub installed: Option<bool>,
    /// Whether the command wants it installed.
    pub wanted: bool,
}

/// Executor for action plans.
#[derive(Debug)]
pub struct PlanExecutor<'a, M: PackageManager + ?Sized> {
    /// Package manager backend.
    manager: &'a M,
    /// Options passed to every install and uninstall.
    options: &'a InstallOptions,
    /// Cancellation flag checked between actions.
    shutdown: Option<&'a ShutdownSignal>,
}

/// Result of executing a single action.
#[derive(Debug, Clone, Serialize)]
pub struct ActionOutcome {
    /// Action that was executed.
    pub action: PlannedAction,
    /// Whether the action succeeded.
    pub success: bool,
    /// Error message (if failed).
    pub error: Option<String>,
}

/// Result of executing a sequence of actions.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecutionReport {
    /// Individual action outcomes, in execution order.
    pub outcomes: Vec<ActionOutcome>,
    /// Number of successful actions.
    pub successful: usize,
    /// Number of failed actions.
    pub failed: usize,
    /// Number of units whose installed state could not be determined.
    pub failed_checks: usize,
    /// Whether the run stopped early because of an interrupt.
    pub interrupted: bool,
    /// Actions that were never started because of the interrupt.
    pub remaining: usize,
}

impl UnitCheck {
    /// Returns true if the unit is already in the wanted state.
    #[must_use]
    pub fn is_satisfied(&self) -> bool {
        self.installed == Some(self.wanted)
    }
}

impl<'a, M: PackageManager + ?Sized> PlanExecutor<'a, M> {
    /// Creates a new plan executor.
    #[must_use]
    pub const fn new(manager: &'a M, options: &'a InstallOptions) -> Self {
        Self {
            manager,
            options,
            shutdown: None,
        }
    }

    /// Sets the cancellation flag to check between actions.
    #[must_use]
    pub const fn with_shutdown(mut self, shutdown: &'a ShutdownSignal) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Returns true if a stop has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.shutdown.is_some_and(ShutdownSignal::is_triggered)
    }

    /// Executes actions in order.
    ///
    /// Stops before the next action once the shutdown signal is triggered;
    /// the action in flight at that moment is allowed to finish.
    pub async fn execute(
        &self,
        actions: &[PlannedAction],
        observer: &mut dyn ExecutionObserver,
    ) -> ExecutionReport {
        let mut report = ExecutionReport::default();

        if actions.is_empty() {
            return report;
        }

        info!(
            "Executing {} actions via {}",
            actions.len(),
            self.manager.backend_name()
        );

        for (idx, action) in actions.iter().enumerate() {
            if self.is_cancelled() {
                report.interrupt(actions.len() - idx);
                warn!("Interrupted with {} actions not started", report.remaining);
                break;
            }

            let outcome = self.execute_action(action, observer).await;
            report.record(outcome);
        }

        report
    }

    /// Executes a single action and reports its outcome.
    pub async fn execute_action(
        &self,
        action: &PlannedAction,
        observer: &mut dyn ExecutionObserver,
    ) -> ActionOutcome {
        observer.on_action_start(action);
        info!("{}", action.description());

        let unit = &action.unit;
        let result = match action.action_type {
            ActionType::Install | ActionType::Update => {
                self.manager
                    .install(&unit.name, &unit.version, self.options)
                    .await
            }
            ActionType::Uninstall | ActionType::Prune => {
                self.manager
                    .uninstall(&unit.name, &unit.version, self.options)
                    .await
            }
        };

        let outcome = match result {
            Ok(()) => ActionOutcome {
                action: action.clone(),
                success: true,
                error: None,
            },
            Err(e) => {
                error!("Failed to {} {}: {}", action.action_type, unit, e);
                ActionOutcome {
                    action: action.clone(),
                    success: false,
                    error: Some(e.to_string()),
                }
            }
        };

        observer.on_action_finish(&outcome);
        outcome
    }
}

impl ExecutionReport {
    /// Adds one outcome to the report.
    pub fn record(&mut self, outcome: ActionOutcome) {
        if outcome.success {
            self.successful += 1;
        } else {
            self.failed += 1;
        }
        self.outcomes.push(outcome);
    }

    /// Records a unit whose installed state could not be determined.
    pub const fn record_failed_check(&mut self) {
        self.failed_checks += 1;
    }

    /// Marks the report as interrupted with `remaining` actions not started.
    pub const fn interrupt(&mut self, remaining: usize) {
        self.interrupted = true;
        self.remaining += remaining;
    }

    /// Folds another report into this one.
    pub fn merge(&mut self, other: Self) {
        self.successful += other.successful;
        self.failed += other.failed;
        self.failed_checks += other.failed_checks;
        self.interrupted |= other.interrupted;
        self.remaining += other.remaining;
        self.outcomes.extend(other.outcomes);
    }

    /// Total number of actions that ran.
    #[must_use]
    pub const fn total_executed(&self) -> usize {
        self.successful + self.failed
    }

    /// Returns true if every action and check succeeded and nothing was skipped.
    #[must_use]
    pub const fn all_successful(&self) -> bool {
        self.failed == 0 && self.failed_checks == 0 && !self.interrupted
    }
}

impl std::fmt::Display for ExecutionReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Executed {} actions: {} successful, {} failed",
            self.total_executed(),
            self.successful,
            self.failed
        )?;
        if self.failed_checks > 0 {
            write!(f, ", {} checks failed", self.failed_checks)?;
        }
        if self.interrupted {
            write!(f, ", {} not started (interrupted)", self.remaining)?;
        }
        Ok(())
    }
}
