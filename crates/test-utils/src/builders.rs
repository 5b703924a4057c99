#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use kiln::engine::{BuildCoordinator, BuildStatus, CoordinatorOptions};
use kiln::notification::NotificationBridge;

use crate::fakes::{CallLog, FakeBuilder, FakeSupervisor, RecordingNotifier};

/// A coordinator wired to fakes, plus handles to inspect them.
pub struct Harness {
    pub coordinator: BuildCoordinator,
    pub log: CallLog,
    pub supervisor: Arc<FakeSupervisor>,
    pub notifier: RecordingNotifier,
    pub status: BuildStatus,
}

/// Builder for [`Harness`] to simplify test setup.
pub struct HarnessBuilder {
    log: CallLog,
    builder: FakeBuilder,
    supervisor: FakeSupervisor,
    notifier: RecordingNotifier,
    immediate: bool,
    notifications: bool,
}

impl HarnessBuilder {
    pub fn new() -> Self {
        let log = CallLog::new();
        Self {
            builder: FakeBuilder::new(log.clone()),
            supervisor: FakeSupervisor::new(log.clone()),
            notifier: RecordingNotifier::new(),
            log,
            immediate: false,
            notifications: true,
        }
    }

    pub fn immediate(mut self, val: bool) -> Self {
        self.immediate = val;
        self
    }

    pub fn build_fails_with(mut self, errors: &str) -> Self {
        self.builder = self.builder.then_fail(errors);
        self
    }

    pub fn build_succeeds(mut self) -> Self {
        self.builder = self.builder.then_succeed();
        self
    }

    pub fn failing_stop(mut self) -> Self {
        self.supervisor = self.supervisor.failing_stop();
        self
    }

    pub fn failing_notifier(mut self) -> Self {
        self.notifier = RecordingNotifier::failing();
        self
    }

    pub fn without_notifications(mut self) -> Self {
        self.notifications = false;
        self
    }

    pub fn build(self) -> Harness {
        let status = BuildStatus::new();
        let supervisor = Arc::new(self.supervisor);
        let notifications = if self.notifications {
            NotificationBridge::new(Arc::new(self.notifier.clone()))
        } else {
            NotificationBridge::disabled()
        };

        let coordinator = BuildCoordinator::new(
            Arc::new(self.builder),
            supervisor.clone(),
            status.clone(),
            CoordinatorOptions {
                immediate: self.immediate,
                settle: Duration::ZERO,
            },
        )
        .with_notifications(notifications);

        Harness {
            coordinator,
            log: self.log,
            supervisor,
            notifier: self.notifier,
            status,
        }
    }
}

impl Default for HarnessBuilder {
    fn default() -> Self {
        Self::new()
    }
}
