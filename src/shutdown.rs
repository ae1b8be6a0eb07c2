//! Cooperative cancellation.
//!
//! An interrupt does not kill the process mid-action. It flips a shared flag
//! that the executor checks before starting each action, and the caller then
//! gives the in-flight action a grace period with [`settle_interrupted`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::warn;

use crate::error::GemtoolError;
use crate::planner::ExecutionReport;

/// Shared cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    triggered: Arc<AtomicBool>,
}

impl ShutdownSignal {
    /// Creates an untriggered signal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a stop before the next action.
    pub fn trigger(&self) {
        self.triggered.store(true, Ordering::SeqCst);
    }

    /// Returns true once a stop has been requested.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Waits for Ctrl-C, then triggers the signal.
    ///
    /// If the handler cannot be installed this never resolves, so the run
    /// simply cannot be interrupted gracefully.
    pub async fn wait_for_interrupt(&self) {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
        self.trigger();
    }
}

/// What an interrupted command left behind.
#[derive(Debug)]
pub struct InterruptedRun {
    /// Report of the command, if it finished within the grace period.
    pub report: Option<ExecutionReport>,
    /// Interrupt error to exit with.
    pub error: GemtoolError,
}

/// Waits up to `grace` for an interrupted command to wind down.
///
/// The resulting error is always an interrupt, whether the command finished
/// in time, failed, or was still running when the grace period ran out.
pub async fn settle_interrupted<F>(command: F, grace: Duration) -> InterruptedRun
where
    F: Future<Output = crate::error::Result<Option<ExecutionReport>>>,
{
    match tokio::time::timeout(grace, command).await {
        Ok(Ok(Some(report))) => {
            let error = GemtoolError::Interrupted {
                completed: report.total_executed(),
                remaining: report.remaining,
            };
            InterruptedRun {
                report: Some(report),
                error,
            }
        }
        Ok(Ok(None)) => InterruptedRun {
            report: None,
            error: GemtoolError::Interrupted {
                completed: 0,
                remaining: 0,
            },
        },
        Ok(Err(e)) => {
            warn!("Command failed after the interrupt: {e}");
            InterruptedRun {
                report: None,
                error: GemtoolError::InterruptedUncounted {
                    reason: format!("command failed after the interrupt ({e})"),
                },
            }
        }
        Err(_) => {
            warn!("In-flight action did not finish within {}ms", grace.as_millis());
            InterruptedRun {
                report: None,
                error: GemtoolError::InterruptedUncounted {
                    reason: format!("in-flight action still running after {}ms", grace.as_millis()),
                },
            }
        }
    }
}
