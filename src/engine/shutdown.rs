// src/engine/shutdown.rs

//! Termination-signal listener.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::exec::Supervisor;
use crate::exec::supervisor::REQUEST_TIMEOUT;

/// Exit status used after a signal-initiated shutdown.
pub const SIGNAL_EXIT_CODE: i32 = 1;

type ExitFn = Box<dyn Fn(i32) + Send + Sync>;

/// Tears down the child and exits the process on the first SIGINT/SIGTERM.
///
/// Single-shot: however many times [`shutdown`](Self::shutdown) is reached,
/// the stop request and the exit happen once.
pub struct ShutdownGuard {
    supervisor: Arc<dyn Supervisor>,
    exit: ExitFn,
    armed: AtomicBool,
    fired: AtomicBool,
}

impl std::fmt::Debug for ShutdownGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShutdownGuard")
            .field("armed", &self.armed.load(Ordering::SeqCst))
            .field("fired", &self.fired.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

fn exit_process(code: i32) {
    std::process::exit(code)
}

impl ShutdownGuard {
    pub fn new(supervisor: Arc<dyn Supervisor>) -> Self {
        Self::with_exit(supervisor, exit_process)
    }

    /// Use a custom exit function instead of `std::process::exit`.
    pub fn with_exit(
        supervisor: Arc<dyn Supervisor>,
        exit: impl Fn(i32) + Send + Sync + 'static,
    ) -> Self {
        Self {
            supervisor,
            exit: Box::new(exit),
            armed: AtomicBool::new(false),
            fired: AtomicBool::new(false),
        }
    }

    /// Spawn the listener task. Returns `None` if this guard is already armed.
    pub fn arm(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        if self.armed.swap(true, Ordering::SeqCst) {
            warn!("shutdown guard already armed; ignoring");
            return None;
        }

        let guard = Arc::clone(self);
        Some(tokio::spawn(async move {
            let signal = wait_for_termination().await;
            guard.shutdown(signal).await;
        }))
    }

    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    /// Stop the child (bounded wait) and exit. Returns `false` without doing
    /// anything if a shutdown already started.
    pub async fn shutdown(&self, reason: &str) -> bool {
        if self.fired.swap(true, Ordering::SeqCst) {
            return false;
        }

        info!(signal = reason, "Got signal; shutting down");

        match timeout(REQUEST_TIMEOUT, self.supervisor.stop()).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => error!(error = %err, "Error killing child process"),
            Err(_) => error!("timed out stopping child process"),
        }

        (self.exit)(SIGNAL_EXIT_CODE);
        true
    }
}

#[cfg(unix)]
async fn wait_for_termination() -> &'static str {
    use tokio::signal::unix::{SignalKind, signal};

    let mut term = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "cannot listen for SIGTERM; handling Ctrl+C only");
            return ctrl_c().await;
        }
    };

    tokio::select! {
        reason = ctrl_c() => reason,
        _ = term.recv() => "terminated",
    }
}

#[cfg(not(unix))]
async fn wait_for_termination() -> &'static str {
    ctrl_c().await
}

async fn ctrl_c() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    "interrupt"
}
