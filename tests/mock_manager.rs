//! Reconciler and executor behavior against a mocked package manager.

use async_trait::async_trait;
use mockall::{Sequence, mock};
use std::io::Write;

use gemtool::error::{GemtoolError, PackageManagerError, Result};
use gemtool::manager::{InstallOptions, PackageManager};
use gemtool::planner::{ActionType, NoopObserver, PlanExecutor, PlannedAction};
use gemtool::inventory::VersionedUnit;
use gemtool::{Reconciler, ShutdownSignal};

mock! {
    pub Gem {}

    #[async_trait]
    impl PackageManager for Gem {
        async fn list_installed(&self) -> Result<String>;
        async fn is_installed(&self, name: &str, version: &str) -> Result<bool>;
        async fn list_outdated(&self) -> Result<String>;
        async fn install(&self, name: &str, version: &str, options: &InstallOptions) -> Result<()>;
        async fn uninstall(&self, name: &str, version: &str, options: &InstallOptions) -> Result<()>;
        fn backend_name(&self) -> &'static str;
    }
}

fn mock_gem() -> MockGem {
    let mut gem = MockGem::new();
    gem.expect_backend_name().returning(|| "mock");
    gem
}

fn gem_list(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn command_failed() -> GemtoolError {
    PackageManagerError::CommandFailed {
        command: String::from("gem install"),
        status: String::from("exit status: 1"),
        stderr: String::from("ERROR: Could not find a valid gem"),
    }
    .into()
}

#[tokio::test]
async fn clean_installs_before_uninstalling() {
    let mut gem = mock_gem();
    let mut seq = Sequence::new();

    gem.expect_list_installed()
        .times(1)
        .returning(|| Ok(String::from("foo (1.0)\n")));
    gem.expect_install()
        .withf(|name, version, _| name == "bar" && version == "2.0")
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _, _| Ok(()));
    gem.expect_uninstall()
        .withf(|name, version, _| name == "foo" && version == "1.0")
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _, _| Ok(()));

    let file = gem_list("bar (2.0)\n");
    let options = InstallOptions::default();
    let report = Reconciler::new(&gem, &options)
        .clean(file.path(), &mut NoopObserver)
        .await
        .unwrap();

    assert_eq!(report.successful, 2);
    assert!(report.all_successful());
}

#[tokio::test]
async fn malformed_gem_list_runs_nothing() {
    let mut gem = mock_gem();
    gem.expect_list_installed().never();
    gem.expect_install().never();
    gem.expect_uninstall().never();

    let file = gem_list("foo (1.0)\nbar 2.0\n");
    let options = InstallOptions::default();
    let result = Reconciler::new(&gem, &options)
        .clean(file.path(), &mut NoopObserver)
        .await;

    assert!(matches!(result, Err(GemtoolError::Inventory(_))));
}

#[tokio::test]
async fn install_skips_present_versions_and_survives_failures() {
    let mut gem = mock_gem();

    gem.expect_is_installed()
        .returning(|name, _| Ok(name == "present"));
    gem.expect_install()
        .withf(|name, _, _| name == "broken")
        .times(1)
        .returning(|_, _, _| Err(command_failed()));
    gem.expect_install()
        .withf(|name, _, _| name == "fresh")
        .times(1)
        .returning(|_, _, _| Ok(()));

    let file = gem_list("present (1.0)\nbroken (0.1)\nfresh (3.2)\n");
    let options = InstallOptions::default();
    let report = Reconciler::new(&gem, &options)
        .install(file.path(), &mut NoopObserver)
        .await
        .unwrap();

    assert_eq!(report.successful, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.outcomes[0].action.unit, VersionedUnit::new("broken", "0.1"));
}

#[tokio::test]
async fn options_are_passed_through() {
    let mut gem = mock_gem();
    gem.expect_list_outdated()
        .returning(|| Ok(String::from("rack (2.2.3 < 3.0.8)\n")));
    gem.expect_install()
        .withf(|name, version, options| {
            name == "rack"
                && version == "3.0.8"
                && options.document
                && options.source.as_deref() == Some("https://gems.example.com")
        })
        .times(1)
        .returning(|_, _, _| Ok(()));

    let options = InstallOptions {
        document: true,
        source: Some(String::from("https://gems.example.com")),
    };
    let report = Reconciler::new(&gem, &options)
        .update(&mut NoopObserver)
        .await
        .unwrap();

    assert_eq!(report.successful, 1);
    assert_eq!(report.outcomes[0].action.previous.as_deref(), Some("2.2.3"));
}

#[tokio::test]
async fn listing_failure_aborts_prune() {
    let mut gem = mock_gem();
    gem.expect_list_installed()
        .returning(|| Err(command_failed()));
    gem.expect_uninstall().never();

    let options = InstallOptions::default();
    let result = Reconciler::new(&gem, &options)
        .prune(&mut NoopObserver)
        .await;

    assert!(matches!(result, Err(GemtoolError::PackageManager(_))));
}

#[tokio::test]
async fn triggered_shutdown_starts_no_actions() {
    let mut gem = mock_gem();
    gem.expect_install().never();

    let shutdown = ShutdownSignal::new();
    shutdown.trigger();

    let options = InstallOptions::default();
    let actions = vec![
        PlannedAction::new(ActionType::Install, VersionedUnit::new("foo", "1.0")),
        PlannedAction::new(ActionType::Install, VersionedUnit::new("bar", "2.0")),
    ];
    let report = PlanExecutor::new(&gem, &options)
        .with_shutdown(&shutdown)
        .execute(&actions, &mut NoopObserver)
        .await;

    assert!(report.interrupted);
    assert_eq!(report.remaining, 2);
    assert_eq!(report.total_executed(), 0);
}
