// tests/shutdown_single_shot.rs

mod common;
use crate::common::{init_tracing, with_timeout};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use kiln::engine::ShutdownGuard;
use kiln::engine::shutdown::SIGNAL_EXIT_CODE;
use kiln_test_utils::fakes::{CallLog, FakeSupervisor};

fn guard_with(supervisor: Arc<FakeSupervisor>) -> (Arc<ShutdownGuard>, Arc<Mutex<Vec<i32>>>) {
    let exits = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&exits);
    let guard = ShutdownGuard::with_exit(supervisor, move |code| {
        recorded.lock().unwrap().push(code);
    });
    (Arc::new(guard), exits)
}

#[tokio::test]
async fn concurrent_signals_stop_and_exit_once() {
    init_tracing();
    let supervisor =
        Arc::new(FakeSupervisor::new(CallLog::new()).slow_stop(Duration::from_millis(50)));
    let (guard, exits) = guard_with(Arc::clone(&supervisor));

    let (first, second) = with_timeout(async {
        tokio::join!(guard.shutdown("interrupt"), guard.shutdown("terminated"))
    })
    .await;

    assert!(first ^ second, "exactly one shutdown should run");
    assert!(guard.has_fired());
    assert_eq!(supervisor.stops(), 1);
    assert_eq!(*exits.lock().unwrap(), vec![SIGNAL_EXIT_CODE]);
}

#[tokio::test]
async fn many_tasks_racing_still_exit_once() {
    init_tracing();
    let supervisor = Arc::new(FakeSupervisor::new(CallLog::new()));
    let (guard, exits) = guard_with(Arc::clone(&supervisor));
    let winners = Arc::new(AtomicUsize::new(0));

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let guard = Arc::clone(&guard);
        let winners = Arc::clone(&winners);
        tasks.push(tokio::spawn(async move {
            if guard.shutdown("interrupt").await {
                winners.fetch_add(1, Ordering::SeqCst);
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(winners.load(Ordering::SeqCst), 1);
    assert_eq!(supervisor.stops(), 1);
    assert_eq!(exits.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn failed_stop_still_exits() {
    init_tracing();
    let supervisor = Arc::new(FakeSupervisor::new(CallLog::new()).failing_stop());
    let (guard, exits) = guard_with(Arc::clone(&supervisor));

    assert!(guard.shutdown("terminated").await);
    assert_eq!(*exits.lock().unwrap(), vec![SIGNAL_EXIT_CODE]);
}

#[tokio::test]
async fn arming_twice_is_refused() {
    init_tracing();
    let supervisor = Arc::new(FakeSupervisor::new(CallLog::new()));
    let (guard, exits) = guard_with(supervisor);

    let listener = guard.arm();
    assert!(listener.is_some());
    assert!(guard.arm().is_none());
    assert!(!guard.has_fired());
    assert!(exits.lock().unwrap().is_empty());

    if let Some(handle) = listener {
        handle.abort();
    }
}
