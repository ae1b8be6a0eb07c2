//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying
//! information to the user in various formats, and the terminal
//! reporter that prints progress while a command runs.

use colored::Colorize;
use std::fmt::Write as _;
use std::io::Write;
use tabled::{Table, Tabled};

use crate::planner::{
    ActionOutcome, ActionPlan, ActionType, ExecutionObserver, ExecutionReport, PlannedAction,
    PruneCandidate, UnitCheck,
};

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug, Clone, Copy)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Plan action row for table display.
#[derive(Tabled)]
struct PlanActionRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Gem")]
    gem: String,
    #[tabled(rename = "Version")]
    version: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Returns the configured format.
    #[must_use]
    pub const fn format(&self) -> OutputFormat {
        self.format
    }

    /// Returns the `[DONE]` or `[FAIL]` tag.
    #[must_use]
    pub fn status_tag(success: bool) -> String {
        if success {
            "[DONE]".green().to_string()
        } else {
            "[FAIL]".red().to_string()
        }
    }

    /// Returns the label shown after `Checking name-version ...`.
    #[must_use]
    pub fn check_label(check: &UnitCheck) -> String {
        let label = match check.installed {
            Some(true) => "[Installed]",
            Some(false) => "[Not Installed]",
            None => return "[Unknown]".red().to_string(),
        };

        if check.is_satisfied() {
            label.green().to_string()
        } else {
            label.yellow().to_string()
        }
    }

    /// Returns the old-version count shown after `Checking name ...`.
    #[must_use]
    pub fn prune_label(candidate: &PruneCandidate) -> String {
        match candidate.stale.len() {
            0 => "No old versions".green().to_string(),
            1 => "1 old version".yellow().to_string(),
            n => format!("{n} old versions").yellow().to_string(),
        }
    }

    /// Formats an action plan for display.
    #[must_use]
    pub fn format_plan(&self, plan: &ActionPlan) -> String {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(&PlanJson::from(plan)).unwrap_or_default()
            }
            OutputFormat::Text => Self::format_plan_text(plan),
        }
    }

    /// Formats a plan as text.
    fn format_plan_text(plan: &ActionPlan) -> String {
        let actions = plan.actions();
        if actions.is_empty() {
            return format!("{}\n", "No changes to be made".green());
        }

        let mut output = String::from("\nAction Plan\n");

        let rows: Vec<PlanActionRow> = actions
            .iter()
            .enumerate()
            .map(|(i, a)| PlanActionRow {
                index: i + 1,
                action: Self::format_action_type(a.action_type),
                gem: a.unit.name.clone(),
                version: Self::format_version(a),
            })
            .collect();

        output.push_str(&Table::new(rows).to_string());
        output.push('\n');

        let count = |t: ActionType| actions.iter().filter(|a| a.action_type == t).count();
        let _ = write!(
            output,
            "\nPlan: {} to install, {} to update, {} to uninstall, {} to prune\n",
            count(ActionType::Install).to_string().green(),
            count(ActionType::Update).to_string().yellow(),
            count(ActionType::Uninstall).to_string().red(),
            count(ActionType::Prune).to_string().red()
        );

        output
    }

    /// Formats an execution report.
    #[must_use]
    pub fn format_report(&self, report: &ExecutionReport) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(report).unwrap_or_default(),
            OutputFormat::Text => {
                let summary = report.to_string();
                if report.all_successful() {
                    summary.green().to_string()
                } else {
                    let mut output = summary.red().to_string();
                    for outcome in report.outcomes.iter().filter(|o| !o.success) {
                        let _ = write!(
                            output,
                            "\n   - {}: {}",
                            outcome.action,
                            outcome.error.as_deref().unwrap_or("unknown error")
                        );
                    }
                    output
                }
            }
        }
    }

    /// Formats an action type with color.
    fn format_action_type(action_type: ActionType) -> String {
        match action_type {
            ActionType::Install => "+install".green().to_string(),
            ActionType::Update => "~update".yellow().to_string(),
            ActionType::Uninstall => "-uninstall".red().to_string(),
            ActionType::Prune => "-prune".red().to_string(),
        }
    }

    /// Formats the version column, showing the old version for updates.
    fn format_version(action: &PlannedAction) -> String {
        match &action.previous {
            Some(previous) => format!("{previous} -> {}", action.unit.version),
            None => action.unit.version.clone(),
        }
    }
}

/// Prints progress events to a terminal stream.
///
/// Lines are built in two halves: the `Checking ...` or `Installing ...`
/// prefix goes out as soon as the event starts, and the status tag closes
/// the line when it finishes.
#[derive(Debug)]
pub struct TerminalReporter<W: Write = std::io::Stderr> {
    /// Destination stream.
    out: W,
    /// Whether a line prefix is waiting for its status tag.
    open_line: bool,
}

impl TerminalReporter {
    /// Creates a reporter writing to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(std::io::stderr())
    }
}

impl<W: Write> TerminalReporter<W> {
    /// Creates a reporter writing to `out`.
    pub const fn new(out: W) -> Self {
        Self {
            out,
            open_line: false,
        }
    }

    /// Consumes the reporter and returns the stream.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn begin(&mut self, prefix: &str) {
        self.close_dangling();
        let _ = write!(self.out, "{prefix} ... ");
        let _ = self.out.flush();
        self.open_line = true;
    }

    fn finish(&mut self, tag: &str) {
        let _ = writeln!(self.out, "{tag}");
        let _ = self.out.flush();
        self.open_line = false;
    }

    fn close_dangling(&mut self) {
        if self.open_line {
            let _ = writeln!(self.out);
            self.open_line = false;
        }
    }
}

impl<W: Write> ExecutionObserver for TerminalReporter<W> {
    fn on_stage(&mut self, stage: &str) {
        self.begin(stage);
    }

    fn on_stage_finish(&mut self, success: bool) {
        self.finish(&OutputFormatter::status_tag(success));
    }

    fn on_check(&mut self, check: &UnitCheck) {
        self.begin(&format!("Checking {}", check.unit));
        self.finish(&OutputFormatter::check_label(check));
    }

    fn on_prune_check(&mut self, candidate: &PruneCandidate) {
        self.begin(&format!("Checking {}", candidate.name));
        self.finish(&OutputFormatter::prune_label(candidate));
    }

    fn on_action_start(&mut self, action: &PlannedAction) {
        self.begin(&action.description());
    }

    fn on_action_finish(&mut self, outcome: &ActionOutcome) {
        self.finish(&OutputFormatter::status_tag(outcome.success));
    }

    fn on_message(&mut self, message: &str) {
        self.close_dangling();
        let _ = writeln!(self.out, "{message}");
        let _ = self.out.flush();
    }
}

// JSON serialization helpers

#[derive(serde::Serialize)]
struct PlanJson {
    created_at: String,
    action_count: usize,
    actions: Vec<PlannedAction>,
}

impl From<&ActionPlan> for PlanJson {
    fn from(plan: &ActionPlan) -> Self {
        let actions = plan.actions();
        Self {
            created_at: plan.created_at.to_rfc3339(),
            action_count: actions.len(),
            actions,
        }
    }
}
