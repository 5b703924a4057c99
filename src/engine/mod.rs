// src/engine/mod.rs

//! Orchestration engine for kiln.
//!
//! - [`coordinator`] turns a detected change into stop → build → (re)start.
//! - [`shutdown`] listens for termination signals and tears the child down
//!   exactly once.
//!
//! The most recent [`BuildOutcome`] is published through [`BuildStatus`],
//! written by the coordinator and read concurrently by the proxy.

use std::sync::{Arc, RwLock};

pub mod coordinator;
pub mod shutdown;

pub use coordinator::{BuildCoordinator, CoordinatorOptions, failure_summary};
pub use shutdown::ShutdownGuard;

/// Result of one build attempt.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BuildOutcome {
    #[default]
    Success,
    /// Raw diagnostic text of the failed build.
    Failure(String),
}

impl BuildOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, BuildOutcome::Success)
    }
}

/// Shared holder for the latest [`BuildOutcome`].
#[derive(Debug, Clone, Default)]
pub struct BuildStatus {
    inner: Arc<RwLock<BuildOutcome>>,
}

impl BuildStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, outcome: BuildOutcome) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *guard = outcome;
    }

    pub fn current(&self) -> BuildOutcome {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_starts_successful_and_is_overwritten() {
        let status = BuildStatus::new();
        let reader = status.clone();
        assert!(reader.current().is_success());

        status.set(BuildOutcome::Failure("boom".into()));
        assert_eq!(reader.current(), BuildOutcome::Failure("boom".into()));

        status.set(BuildOutcome::Success);
        assert!(reader.current().is_success());
    }
}
