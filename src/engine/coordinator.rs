// src/engine/coordinator.rs

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::engine::{BuildOutcome, BuildStatus};
use crate::exec::{Builder, Supervisor};
use crate::logging::Console;
use crate::notification::{NotificationBridge, Urgency};

/// Pause after every build attempt, so editors that write a file several
/// times per save don't immediately trigger another build.
pub const SETTLE_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy)]
pub struct CoordinatorOptions {
    /// Start the fresh binary right after a successful build.
    pub immediate: bool,
    pub settle: Duration,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self {
            immediate: false,
            settle: SETTLE_DELAY,
        }
    }
}

/// Sequences stop → build → record → (re)start → notify.
///
/// Only ever runs one build at a time: the watcher awaits
/// [`on_change`](Self::on_change) before it polls again.
pub struct BuildCoordinator {
    builder: Arc<dyn Builder>,
    supervisor: Arc<dyn Supervisor>,
    notifications: NotificationBridge,
    status: BuildStatus,
    console: Console,
    options: CoordinatorOptions,
}

impl std::fmt::Debug for BuildCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildCoordinator")
            .field("binary", &self.builder.binary())
            .field("options", &self.options)
            .field("notifications", &self.notifications)
            .finish_non_exhaustive()
    }
}

impl BuildCoordinator {
    pub fn new(
        builder: Arc<dyn Builder>,
        supervisor: Arc<dyn Supervisor>,
        status: BuildStatus,
        options: CoordinatorOptions,
    ) -> Self {
        Self {
            builder,
            supervisor,
            notifications: NotificationBridge::disabled(),
            status,
            console: Console::quiet(),
            options,
        }
    }

    pub fn with_notifications(mut self, notifications: NotificationBridge) -> Self {
        self.notifications = notifications;
        self
    }

    pub fn with_console(mut self, console: Console) -> Self {
        self.console = console;
        self
    }

    pub fn status(&self) -> &BuildStatus {
        &self.status
    }

    /// React to a change reported by the watcher.
    pub async fn on_change(&self, path: &Path) -> BuildOutcome {
        info!(path = ?path, "change detected; rebuilding");

        if let Err(err) = self.supervisor.stop().await {
            warn!(error = %err, "failed to stop running instance; building anyway");
        }

        self.build().await
    }

    /// Build once, record the outcome, and restart if configured.
    pub async fn build(&self) -> BuildOutcome {
        self.console.line("Building...");
        self.notifications
            .push(
                "Build Started!",
                &format!("Building {}...", self.builder.binary()),
                Urgency::Normal,
            )
            .await;

        let outcome = match self.builder.build().await {
            Err(err) => {
                let mut errors = self.builder.errors();
                if errors.trim().is_empty() {
                    errors = err.to_string();
                }
                warn!(error = %err, "build failed");

                self.status.set(BuildOutcome::Failure(errors.clone()));
                self.console.failure("Build failed");
                self.console.raw(&errors);

                self.notifications
                    .push("Build FAILED!", failure_summary(&errors), Urgency::Critical)
                    .await;

                BuildOutcome::Failure(errors)
            }
            Ok(()) => {
                self.status.set(BuildOutcome::Success);
                self.console.success("Build finished");

                if self.options.immediate {
                    debug!("immediate mode; starting fresh instance");
                    if let Err(err) = self.supervisor.start().await {
                        warn!(error = %err, "failed to start instance after build");
                    }
                }

                self.notifications
                    .push("Build Succeeded", "Build Finished!", Urgency::Normal)
                    .await;

                BuildOutcome::Success
            }
        };

        tokio::time::sleep(self.options.settle).await;
        outcome
    }
}

/// Body for the failure notification: the second line of the diagnostic
/// output (the first is usually a "Compiling ..." banner), or empty.
pub fn failure_summary(errors: &str) -> &str {
    errors.split('\n').nth(1).unwrap_or("").trim_end_matches('\r')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_summary_takes_second_line() {
        assert_eq!(failure_summary("syntax error on line 4\n..."), "...");
        assert_eq!(failure_summary("a\r\nb\r\nc"), "b");
    }

    #[test]
    fn failure_summary_tolerates_short_text() {
        assert_eq!(failure_summary(""), "");
        assert_eq!(failure_summary("only one line"), "");
        assert_eq!(failure_summary("trailing newline\n"), "");
    }
}
