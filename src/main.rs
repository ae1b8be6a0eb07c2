//! gemtool CLI entrypoint.
//!
//! This is the main entrypoint for the gemtool command-line tool.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use colored::Colorize;
use gemtool::cli::{Cli, Commands, OutputFormat, OutputFormatter, TerminalReporter};
use gemtool::config::{ConfigParser, ConfigValidator, ToolConfig, find_config_file};
use gemtool::error::{GemtoolError, Result};
use gemtool::manager::{GemCommand, InMemoryPackageManager, InstallOptions, PackageManager};
use gemtool::planner::{ExecutionObserver, ExecutionReport, NoopObserver};
use gemtool::reconciler::Reconciler;
use gemtool::shutdown::{ShutdownSignal, settle_interrupted};

use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(code) => code,
        Err(e) => {
            if e.is_interrupted() {
                eprintln!("{e}");
            } else {
                eprintln!("{} {e}", "Error:".red());
            }
            ExitCode::from(e.exit_code())
        }
    }
}

/// Initializes the logging system.
///
/// `RUST_LOG` wins over the verbosity flag when set.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<ExitCode> {
    let config = load_config(&cli)?;
    let options = config.install_options();
    let formatter = OutputFormatter::new(cli.output);
    let shutdown = ShutdownSignal::new();

    let gem = GemCommand::new(config.program.clone());
    let dry_run = if cli.dry_run {
        warn!("Dry run: no gems will be installed or removed");
        Some(InMemoryPackageManager::seeded_from(&gem).await?)
    } else {
        None
    };
    let manager: &dyn PackageManager = match &dry_run {
        Some(memory) => memory,
        None => &gem,
    };
    debug!("Using {} backend", manager.backend_name());

    let command = execute(&cli.command, manager, &options, &formatter, &shutdown);
    tokio::pin!(command);

    let report = tokio::select! {
        result = &mut command => result?,
        () = shutdown.wait_for_interrupt() => {
            eprintln!("{}", "Shutdown signal sent. Quitting ...".red());
            let interrupted = settle_interrupted(command, config.grace_period()).await;
            if let Some(report) = &interrupted.report {
                eprintln!("{}", formatter.format_report(report));
            }
            return Err(interrupted.error);
        }
    };

    conclude(report.as_ref(), &formatter)
}

/// Runs the selected command.
///
/// Returns `None` for commands that only report and never execute actions.
async fn execute(
    command: &Commands,
    manager: &dyn PackageManager,
    options: &InstallOptions,
    formatter: &OutputFormatter,
    shutdown: &ShutdownSignal,
) -> Result<Option<ExecutionReport>> {
    let reconciler = Reconciler::new(manager, options).with_shutdown(shutdown);

    let mut terminal = TerminalReporter::stderr();
    let mut quiet = NoopObserver;
    let observer: &mut dyn ExecutionObserver = match formatter.format() {
        OutputFormat::Text => &mut terminal,
        OutputFormat::Json => &mut quiet,
    };

    let report = match command {
        Commands::Install { file } => {
            info!("Installing gems from {}", file.display());
            reconciler.install(file, observer).await?
        }
        Commands::Uninstall { file } => {
            info!("Uninstalling gems from {}", file.display());
            reconciler.uninstall(file, observer).await?
        }
        Commands::Update => reconciler.update(observer).await?,
        Commands::Prune => reconciler.prune(observer).await?,
        Commands::Clean { file } => {
            info!("Cleaning gems against {}", file.display());
            reconciler.clean(file, observer).await?
        }
        Commands::Plan { file } => {
            let plan = reconciler.plan(file, observer).await?;
            eprintln!("{}", formatter.format_plan(&plan));
            return Ok(None);
        }
    };

    Ok(Some(report))
}

/// Prints the summary and picks the exit code of a finished run.
fn conclude(report: Option<&ExecutionReport>, formatter: &OutputFormatter) -> Result<ExitCode> {
    let Some(report) = report else {
        return Ok(ExitCode::SUCCESS);
    };

    if report.total_executed() > 0 || report.failed_checks > 0 {
        eprintln!("\n{}", formatter.format_report(report));
    } else if formatter.format() == OutputFormat::Json {
        eprintln!("{}", formatter.format_report(report));
    }

    if report.interrupted {
        return Err(GemtoolError::Interrupted {
            completed: report.total_executed(),
            remaining: report.remaining,
        });
    }

    Ok(if report.all_successful() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Loads configuration from file, `.env` and environment, then applies
/// command-line overrides and validates the result.
fn load_config(cli: &Cli) -> Result<ToolConfig> {
    let config_file = resolve_config_path(cli.config.as_deref());

    let base = config_file
        .as_deref()
        .and_then(Path::parent)
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    let parser = ConfigParser::new().with_base_path(base);
    parser.load_dotenv()?;

    let mut config = parser.load_with_env(config_file.as_deref())?;

    if let Some(program) = &cli.program {
        config.program.clone_from(program);
    }
    if let Some(source) = &cli.source {
        config.source = Some(source.clone());
    }
    if let Some(document) = cli.doc_override() {
        config.document = document;
    }

    ConfigValidator::new().validate(&config)?;
    debug!("Effective configuration: {config:?}");
    Ok(config)
}

/// Resolves the configuration file path.
///
/// An explicit path must exist; otherwise the file is optional.
fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    let cwd = std::env::current_dir().ok()?;
    find_config_file(cwd)
}
