use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use kiln::errors::{KilnError, Result};
use kiln::exec::{Builder, Supervisor};
use kiln::notification::{Notification, Notifier};
use kiln::types::BoxFuture;

/// Something a fake collaborator was asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Build,
    Start,
    Stop,
}

/// Shared, ordered record of calls across several fakes.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, call: Call) -> usize {
        self.0.lock().unwrap().iter().filter(|c| **c == call).count()
    }
}

/// A builder that:
/// - records every `build` in the call log
/// - replays scripted outcomes (`Err(text)` becomes the diagnostic output),
///   succeeding once the script runs out.
pub struct FakeBuilder {
    log: CallLog,
    binary: String,
    script: Mutex<VecDeque<std::result::Result<(), String>>>,
    errors: Mutex<String>,
}

impl FakeBuilder {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            binary: "fake-bin".to_string(),
            script: Mutex::new(VecDeque::new()),
            errors: Mutex::new(String::new()),
        }
    }

    pub fn then_fail(self, errors: &str) -> Self {
        self.script.lock().unwrap().push_back(Err(errors.to_string()));
        self
    }

    pub fn then_succeed(self) -> Self {
        self.script.lock().unwrap().push_back(Ok(()));
        self
    }
}

impl Builder for FakeBuilder {
    fn binary(&self) -> &str {
        &self.binary
    }

    fn errors(&self) -> String {
        self.errors.lock().unwrap().clone()
    }

    fn build(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.log.record(Call::Build);
            let next = self.script.lock().unwrap().pop_front().unwrap_or(Ok(()));
            match next {
                Ok(()) => {
                    self.errors.lock().unwrap().clear();
                    Ok(())
                }
                Err(text) => {
                    *self.errors.lock().unwrap() = text;
                    Err(KilnError::BuildFailed("exit status 101".to_string()))
                }
            }
        })
    }
}

/// A supervisor that records start/stop requests without spawning anything.
pub struct FakeSupervisor {
    log: CallLog,
    stop_fails: bool,
    stop_delay: Duration,
    starts: AtomicUsize,
    stops: AtomicUsize,
}

impl FakeSupervisor {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            stop_fails: false,
            stop_delay: Duration::ZERO,
            starts: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
        }
    }

    /// Every `stop` returns an error (after being recorded).
    pub fn failing_stop(mut self) -> Self {
        self.stop_fails = true;
        self
    }

    /// Every `stop` takes this long before answering.
    pub fn slow_stop(mut self, delay: Duration) -> Self {
        self.stop_delay = delay;
        self
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl Supervisor for FakeSupervisor {
    fn start(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.log.record(Call::Start);
            self.starts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    fn stop(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.log.record(Call::Stop);
            self.stops.fetch_add(1, Ordering::SeqCst);
            if !self.stop_delay.is_zero() {
                tokio::time::sleep(self.stop_delay).await;
            }
            if self.stop_fails {
                Err(KilnError::Supervisor("process refused to die".to_string()))
            } else {
                Ok(())
            }
        })
    }
}

/// A notifier that keeps every notification it is handed.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    pushed: Arc<Mutex<Vec<Notification>>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record, then report a delivery failure.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn pushed(&self) -> Vec<Notification> {
        self.pushed.lock().unwrap().clone()
    }

    pub fn titles(&self) -> Vec<String> {
        self.pushed().into_iter().map(|n| n.title).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn push(&self, notification: Notification) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.pushed.lock().unwrap().push(notification);
            if self.fail {
                Err(KilnError::Notification("no notification daemon".to_string()))
            } else {
                Ok(())
            }
        })
    }
}
