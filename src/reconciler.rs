//! Reconciler for gem commands.
//!
//! This module drives each command end to end: it loads the desired gem
//! list, observes the installed gems through the package manager, computes
//! the plan and hands it to the executor, reporting progress to an
//! [`ExecutionObserver`].

use std::path::Path;
use tracing::{info, warn};

use crate::error::Result;
use crate::inventory::{Inventory, InventoryParser, ParseMode, VersionedUnit};
use crate::manager::{InstallOptions, PackageManager};
use crate::planner::{
    ActionPlan, ActionType, DiffEngine, ExecutionObserver, ExecutionReport, PlanExecutor,
    PlannedAction, UnitCheck, VersionPruner,
};
use crate::shutdown::ShutdownSignal;

/// Message reported when a clean run finds nothing to do.
pub const NO_CHANGES: &str = "No changes to be made";

/// Reconciler for the installed gem set.
#[derive(Debug)]
pub struct Reconciler<'a, M: PackageManager + ?Sized> {
    /// Package manager backend.
    manager: &'a M,
    /// Options passed to every install and uninstall.
    options: &'a InstallOptions,
    /// Cancellation flag checked between actions.
    shutdown: Option<&'a ShutdownSignal>,
    /// Listing parser.
    parser: InventoryParser,
    /// Diff engine.
    diff_engine: DiffEngine,
    /// Keep-latest pruner.
    pruner: VersionPruner,
}

impl<'a, M: PackageManager + ?Sized> Reconciler<'a, M> {
    /// Creates a new reconciler.
    #[must_use]
    pub const fn new(manager: &'a M, options: &'a InstallOptions) -> Self {
        Self {
            manager,
            options,
            shutdown: None,
            parser: InventoryParser::new(),
            diff_engine: DiffEngine::new(),
            pruner: VersionPruner::new(),
        }
    }

    /// Sets the cancellation flag to check between actions.
    #[must_use]
    pub const fn with_shutdown(mut self, shutdown: &'a ShutdownSignal) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    fn executor(&self) -> PlanExecutor<'a, M> {
        let executor = PlanExecutor::new(self.manager, self.options);
        match self.shutdown {
            Some(shutdown) => executor.with_shutdown(shutdown),
            None => executor,
        }
    }

    /// Installs every version in the gem list that is not installed yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the gem list is missing or malformed. Nothing is
    /// installed in that case.
    pub async fn install(
        &self,
        file: &Path,
        observer: &mut dyn ExecutionObserver,
    ) -> Result<ExecutionReport> {
        let desired = self.parser.load_desired(file)?;
        info!("Installing {} gem versions from list", desired.version_count());
        Ok(self.converge_units(&desired.units(), true, observer).await)
    }

    /// Uninstalls every version in the gem list that is installed.
    ///
    /// # Errors
    ///
    /// Returns an error if the gem list is missing or malformed. Nothing is
    /// uninstalled in that case.
    pub async fn uninstall(
        &self,
        file: &Path,
        observer: &mut dyn ExecutionObserver,
    ) -> Result<ExecutionReport> {
        let desired = self.parser.load_desired(file)?;
        info!("Uninstalling {} gem versions from list", desired.version_count());
        Ok(self.converge_units(&desired.units(), false, observer).await)
    }

    /// Checks each unit individually and acts on those not in the wanted state.
    async fn converge_units(
        &self,
        units: &[VersionedUnit],
        wanted: bool,
        observer: &mut dyn ExecutionObserver,
    ) -> ExecutionReport {
        let executor = self.executor();
        let mut report = ExecutionReport::default();
        let action_type = if wanted {
            ActionType::Install
        } else {
            ActionType::Uninstall
        };

        for (idx, unit) in units.iter().enumerate() {
            if executor.is_cancelled() {
                report.interrupt(units.len() - idx);
                warn!("Interrupted with {} gem versions not checked", units.len() - idx);
                break;
            }

            let installed = match self.manager.is_installed(&unit.name, &unit.version).await {
                Ok(installed) => Some(installed),
                Err(e) => {
                    warn!("Could not check {unit}: {e}");
                    None
                }
            };

            let check = UnitCheck {
                unit: unit.clone(),
                installed,
                wanted,
            };
            observer.on_check(&check);

            match installed {
                None => report.record_failed_check(),
                Some(state) if state == wanted => {}
                Some(_) => {
                    let action = PlannedAction::new(action_type, unit.clone());
                    report.record(executor.execute_action(&action, observer).await);
                }
            }
        }

        report
    }

    /// Computes the plan that makes the installed gems equal the gem list.
    ///
    /// # Errors
    ///
    /// Returns an error if the gem list is missing or malformed, or the
    /// installed gems cannot be listed.
    pub async fn plan(
        &self,
        file: &Path,
        observer: &mut dyn ExecutionObserver,
    ) -> Result<ActionPlan> {
        observer.on_stage("Building target list");
        let desired = match self.parser.load_desired(file) {
            Ok(desired) => {
                observer.on_stage_finish(true);
                desired
            }
            Err(e) => {
                observer.on_stage_finish(false);
                return Err(e);
            }
        };

        let actual = self.installed_inventory(observer).await?;
        Ok(self.diff_engine.diff(&desired, &actual))
    }

    /// Makes the installed gems equal the gem list.
    ///
    /// Installs run before uninstalls. A failed action is reported and the
    /// rest of the plan still runs.
    ///
    /// # Errors
    ///
    /// Returns an error if planning fails. No action runs in that case.
    pub async fn clean(
        &self,
        file: &Path,
        observer: &mut dyn ExecutionObserver,
    ) -> Result<ExecutionReport> {
        let plan = self.plan(file, observer).await?;

        if plan.is_empty() {
            observer.on_message(NO_CHANGES);
            return Ok(ExecutionReport::default());
        }

        let (installs, removals): (Vec<_>, Vec<_>) =
            plan.actions().into_iter().partition(|a| !a.is_removal());

        let executor = self.executor();
        let mut report = ExecutionReport::default();

        if !installs.is_empty() {
            observer.on_message("Installing required gems");
            report.merge(executor.execute(&installs, observer).await);
        }

        if !removals.is_empty() {
            if report.interrupted {
                report.interrupt(removals.len());
            } else {
                observer.on_message("Uninstalling unrequired gems");
                report.merge(executor.execute(&removals, observer).await);
            }
        }

        Ok(report)
    }

    /// Installs the latest version of every outdated gem.
    ///
    /// # Errors
    ///
    /// Returns an error if the outdated gems cannot be listed.
    pub async fn update(&self, observer: &mut dyn ExecutionObserver) -> Result<ExecutionReport> {
        observer.on_stage("Getting outdated gem list");
        let listing = self.manager.list_outdated().await;
        observer.on_stage_finish(listing.is_ok());

        let outdated = self.parser.parse_outdated(&listing?, ParseMode::Lenient)?;
        let plan = ActionPlan::from_outdated(outdated);

        if plan.is_empty() {
            observer.on_message("All gems are up to date");
            return Ok(ExecutionReport::default());
        }

        Ok(self.executor().execute(&plan.actions(), observer).await)
    }

    /// Removes every version except the latest of each installed gem.
    ///
    /// # Errors
    ///
    /// Returns an error if the installed gems cannot be listed.
    pub async fn prune(&self, observer: &mut dyn ExecutionObserver) -> Result<ExecutionReport> {
        let actual = self.installed_inventory(observer).await?;
        let candidates = self.pruner.candidates(&actual)?;

        let executor = self.executor();
        let mut report = ExecutionReport::default();

        for (idx, candidate) in candidates.iter().enumerate() {
            if executor.is_cancelled() {
                report.interrupt(candidates[idx..].iter().map(|c| c.stale.len()).sum());
                break;
            }

            observer.on_prune_check(candidate);
            let plan = ActionPlan::from_prune(candidate.stale_units());
            report.merge(executor.execute(&plan.actions(), observer).await);
        }

        Ok(report)
    }

    /// Lists and parses the installed gems, reporting the stage.
    async fn installed_inventory(&self, observer: &mut dyn ExecutionObserver) -> Result<Inventory> {
        observer.on_stage("Getting gem list");
        let listing = self.manager.list_installed().await;
        observer.on_stage_finish(listing.is_ok());
        self.parser.parse_installed(&listing?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{GemtoolError, InventoryError};
    use crate::inventory::{OutdatedRecord, PackageRecord, VersionOrder};
    use crate::manager::InMemoryPackageManager;
    use crate::planner::{ActionOutcome, NoopObserver, PruneCandidate};
    use std::io::Write;

    #[derive(Default)]
    struct Transcript {
        lines: Vec<String>,
    }

    impl ExecutionObserver for Transcript {
        fn on_stage(&mut self, stage: &str) {
            self.lines.push(format!("stage {stage}"));
        }

        fn on_stage_finish(&mut self, success: bool) {
            self.lines.push(format!("stage done {success}"));
        }

        fn on_check(&mut self, check: &UnitCheck) {
            self.lines.push(format!("check {} {:?}", check.unit, check.installed));
        }

        fn on_prune_check(&mut self, candidate: &PruneCandidate) {
            self.lines.push(format!("prune-check {} {}", candidate.name, candidate.stale.len()));
        }

        fn on_action_finish(&mut self, outcome: &ActionOutcome) {
            self.lines.push(format!("{} {}", outcome.action, outcome.success));
        }

        fn on_message(&mut self, message: &str) {
            self.lines.push(message.to_string());
        }
    }

    fn manager(records: Vec<PackageRecord>) -> InMemoryPackageManager {
        InMemoryPackageManager::new(Inventory::new(records, VersionOrder::NewestFirst))
    }

    fn gem_list(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_clean_no_drift() {
        let manager = manager(vec![PackageRecord::new("foo", ["1.0"])]);
        let options = InstallOptions::default();
        let list = gem_list("foo (1.0)\n");
        let mut transcript = Transcript::default();

        let report = Reconciler::new(&manager, &options)
            .clean(list.path(), &mut transcript)
            .await
            .unwrap();

        assert_eq!(report.total_executed(), 0);
        assert_eq!(transcript.lines.last().map(String::as_str), Some(NO_CHANGES));
    }

    #[tokio::test]
    async fn test_clean_net_install() {
        let manager = manager(vec![PackageRecord::new("foo", ["1.0"])]);
        let options = InstallOptions::default();
        let list = gem_list("foo (1.0)\nbar (2.0)\n");

        let reconciler = Reconciler::new(&manager, &options);
        let plan = reconciler.plan(list.path(), &mut NoopObserver).await.unwrap();
        assert_eq!(plan.to_install, vec![VersionedUnit::new("bar", "2.0")]);
        assert!(plan.to_uninstall.is_empty());

        let report = reconciler.clean(list.path(), &mut NoopObserver).await.unwrap();
        assert_eq!(report.successful, 1);
        assert!(manager.snapshot().unwrap().contains("bar", "2.0"));
    }

    #[tokio::test]
    async fn test_clean_net_replace_installs_before_uninstalling() {
        let manager = manager(vec![PackageRecord::new("foo", ["1.0"])]);
        let options = InstallOptions::default();
        let list = gem_list("foo (2.0)\n");
        let mut transcript = Transcript::default();

        let reconciler = Reconciler::new(&manager, &options);
        let report = reconciler.clean(list.path(), &mut transcript).await.unwrap();

        assert_eq!(report.successful, 2);
        let install_at = transcript.lines.iter().position(|l| l == "install foo-2.0 true");
        let uninstall_at = transcript.lines.iter().position(|l| l == "uninstall foo-1.0 true");
        assert!(install_at.unwrap() < uninstall_at.unwrap());
        assert!(transcript.lines.contains(&String::from("Installing required gems")));
        assert!(transcript.lines.contains(&String::from("Uninstalling unrequired gems")));

        let again = reconciler.plan(list.path(), &mut NoopObserver).await.unwrap();
        assert!(again.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_gem_list_aborts_before_any_action() {
        let manager = manager(vec![PackageRecord::new("foo", ["1.0"])]);
        let options = InstallOptions::default();
        let list = gem_list("bar (2.0)\ngarbage-text\n");
        let reconciler = Reconciler::new(&manager, &options);
        let mut transcript = Transcript::default();

        let err = reconciler.clean(list.path(), &mut transcript).await.unwrap_err();
        assert!(matches!(
            err,
            GemtoolError::Inventory(InventoryError::MalformedLine { line: 2, .. })
        ));
        assert_eq!(transcript.lines, vec!["stage Building target list", "stage done false"]);

        assert!(reconciler.install(list.path(), &mut NoopObserver).await.is_err());
        assert!(reconciler.uninstall(list.path(), &mut NoopObserver).await.is_err());

        let snapshot = manager.snapshot().unwrap();
        assert!(snapshot.contains("foo", "1.0"));
        assert!(!snapshot.contains("bar", "2.0"));
    }

    #[tokio::test]
    async fn test_clean_keeps_installed_set_on_undelimited_versions() {
        let manager = manager(vec![PackageRecord::new("foo", ["2.0", "1.0"])]);
        let options = InstallOptions::default();
        let list = gem_list("foo (2.0 1.0)\n");

        let err = Reconciler::new(&manager, &options)
            .clean(list.path(), &mut NoopObserver)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            GemtoolError::Inventory(InventoryError::MalformedLine { line: 1, .. })
        ));
        assert_eq!(manager.snapshot().unwrap().version_count(), 2);
    }

    #[tokio::test]
    async fn test_install_checks_each_unit() {
        let manager = manager(vec![PackageRecord::new("foo", ["1.0"])]);
        let options = InstallOptions::default();
        let list = gem_list("foo (1.0, 1.1)\n");
        let mut transcript = Transcript::default();

        let report = Reconciler::new(&manager, &options)
            .install(list.path(), &mut transcript)
            .await
            .unwrap();

        assert_eq!(report.successful, 1);
        assert_eq!(
            transcript.lines,
            vec![
                "check foo-1.0 Some(true)",
                "check foo-1.1 Some(false)",
                "install foo-1.1 true",
            ]
        );
    }

    #[tokio::test]
    async fn test_uninstall_only_installed_units() {
        let manager = manager(vec![PackageRecord::new("foo", ["2.0", "1.0"])]);
        let options = InstallOptions::default();
        let list = gem_list("foo (1.0)\nbar (3.0)\n");

        let report = Reconciler::new(&manager, &options)
            .uninstall(list.path(), &mut NoopObserver)
            .await
            .unwrap();

        assert_eq!(report.total_executed(), 1);
        let snapshot = manager.snapshot().unwrap();
        assert!(!snapshot.contains("foo", "1.0"));
        assert!(snapshot.contains("foo", "2.0"));
    }

    #[tokio::test]
    async fn test_failed_action_is_isolated() {
        let manager = manager(vec![]).with_failure(VersionedUnit::new("foo", "1.0"));
        let options = InstallOptions::default();
        let list = gem_list("foo (1.0)\nbar (2.0)\n");

        let report = Reconciler::new(&manager, &options)
            .clean(list.path(), &mut NoopObserver)
            .await
            .unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(report.successful, 1);
        assert!(manager.snapshot().unwrap().contains("bar", "2.0"));
    }

    #[tokio::test]
    async fn test_prune() {
        let manager = manager(vec![
            PackageRecord::new("foo", ["2.0", "1.5", "1.0"]),
            PackageRecord::new("bar", ["1.0"]),
        ]);
        let options = InstallOptions::default();
        let mut transcript = Transcript::default();

        let report = Reconciler::new(&manager, &options)
            .prune(&mut transcript)
            .await
            .unwrap();

        assert_eq!(report.successful, 2);
        assert!(transcript.lines.contains(&String::from("prune-check foo 2")));
        assert!(transcript.lines.contains(&String::from("prune-check bar 0")));
        assert!(transcript.lines.contains(&String::from("prune foo-1.5 true")));

        let snapshot = manager.snapshot().unwrap();
        assert_eq!(snapshot.records()[0].versions, vec!["2.0"]);
        assert_eq!(snapshot.records()[1].versions, vec!["1.0"]);
    }

    #[tokio::test]
    async fn test_prune_interrupted_before_start() {
        let manager = manager(vec![PackageRecord::new("foo", ["2.0", "1.5", "1.0"])]);
        let options = InstallOptions::default();
        let shutdown = ShutdownSignal::new();
        shutdown.trigger();

        let report = Reconciler::new(&manager, &options)
            .with_shutdown(&shutdown)
            .prune(&mut NoopObserver)
            .await
            .unwrap();

        assert!(report.interrupted);
        assert_eq!(report.remaining, 2);
        assert_eq!(manager.snapshot().unwrap().version_count(), 3);
    }

    #[tokio::test]
    async fn test_update_installs_latest() {
        let manager = manager(vec![PackageRecord::new("rack", ["2.2.3"])]).with_outdated(vec![
            OutdatedRecord {
                name: String::from("rack"),
                current: String::from("2.2.3"),
                latest: String::from("3.0.8"),
            },
        ]);
        let options = InstallOptions::default();
        let mut transcript = Transcript::default();

        let reconciler = Reconciler::new(&manager, &options);
        let report = reconciler.update(&mut transcript).await.unwrap();

        assert_eq!(report.successful, 1);
        assert!(transcript.lines.contains(&String::from("update rack-3.0.8 true")));
        assert_eq!(manager.snapshot().unwrap().records()[0].versions, vec!["3.0.8", "2.2.3"]);

        let mut second = Transcript::default();
        reconciler.update(&mut second).await.unwrap();
        assert_eq!(second.lines.last().map(String::as_str), Some("All gems are up to date"));
    }
}
