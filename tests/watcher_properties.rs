// tests/watcher_properties.rs

mod common;
use crate::common::{at, init_tracing, HarnessBuilder, REFERENCE_SECS};

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use proptest::prelude::*;

use kiln::fs::mock::MockFileSystem;
use kiln::watch::{ExcludeSet, WatchOptions, Watcher};

fn watcher(fs: &MockFileSystem, excludes: &[&str], watch_all: bool) -> Watcher {
    Watcher::new(
        "/proj",
        ExcludeSet::new(excludes.iter().copied()),
        WatchOptions {
            watch_all,
            ..WatchOptions::default()
        },
        Arc::new(fs.clone()),
    )
    .with_reference_time(at(REFERENCE_SECS))
}

/// mtime guaranteed to be after any reference a watcher can reach in a test.
fn far_future(offset: u64) -> SystemTime {
    SystemTime::now() + Duration::from_secs(3_600 + offset)
}

proptest! {
    #[test]
    fn files_under_excluded_dir_never_trigger(
        names in proptest::collection::vec("[a-z]{1,8}\\.(rs|txt|toml)", 1..10),
        nested in "[a-z]{1,6}",
    ) {
        let fs = MockFileSystem::new();
        fs.touch("/proj/src/lib.rs", at(REFERENCE_SECS));
        for (i, name) in names.iter().enumerate() {
            fs.touch(format!("/proj/vendor/{name}"), at(REFERENCE_SECS + 1 + i as u64));
            fs.touch(format!("/proj/vendor/{nested}/{name}"), at(REFERENCE_SECS + 1 + i as u64));
        }

        prop_assert_eq!(watcher(&fs, &["vendor"], true).scan(), None);
        prop_assert_eq!(watcher(&fs, &["vendor"], false).scan(), None);
    }

    #[test]
    fn hidden_files_never_trigger_even_with_all_extensions(
        names in proptest::collection::vec("\\.[a-z]{1,8}(\\.rs)?", 1..10),
    ) {
        let fs = MockFileSystem::new();
        for (i, name) in names.iter().enumerate() {
            fs.touch(format!("/proj/{name}"), at(REFERENCE_SECS + 1 + i as u64));
            fs.touch(format!("/proj/src/{name}"), at(REFERENCE_SECS + 1 + i as u64));
        }

        prop_assert_eq!(watcher(&fs, &[], true).scan(), None);
    }
}

#[test]
fn only_source_extension_triggers_without_all() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.touch("/proj/notes.txt", at(2_000));
    fs.touch("/proj/Cargo.toml", at(2_000));

    assert_eq!(watcher(&fs, &[], false).scan(), None);
    assert_eq!(
        watcher(&fs, &[], true).scan(),
        Some(PathBuf::from("/proj/Cargo.toml"))
    );

    fs.touch("/proj/src/main.rs", at(2_000));
    assert_eq!(
        watcher(&fs, &[], false).scan(),
        Some(PathBuf::from("/proj/src/main.rs"))
    );
}

#[tokio::test]
async fn at_most_one_event_per_poll() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.touch("/proj/a.rs", at(2_000));
    fs.touch("/proj/b.rs", at(2_000));
    fs.touch("/proj/src/c.rs", at(2_000));

    let mut w = watcher(&fs, &[], false);
    let mut seen = Vec::new();
    let mut on_change = |path: PathBuf| {
        seen.push(path);
        async {}
    };

    assert!(w.poll(&mut on_change).await.is_some());
    drop(on_change);
    assert_eq!(seen, vec![PathBuf::from("/proj/a.rs")]);
}

/// Two files saved inside the same poll window produce a single rebuild.
/// This is the intended debounce, not a lost event.
#[tokio::test]
async fn changes_in_one_window_collapse_into_one_rebuild() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.touch("/proj/src/handlers.rs", at(2_000));
    fs.touch("/proj/src/routes.rs", at(2_001));

    let harness = HarnessBuilder::new().build();
    let coordinator = &harness.coordinator;
    let mut on_change = move |path: PathBuf| async move {
        coordinator.on_change(&path).await;
    };

    let mut w = watcher(&fs, &[], false);
    assert!(w.poll(&mut on_change).await.is_some());
    assert!(w.poll(&mut on_change).await.is_none());

    assert_eq!(harness.log.count(kiln_test_utils::fakes::Call::Build), 1);
}

#[tokio::test]
async fn reset_prevents_retrigger_of_older_modifications() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.touch("/proj/main.rs", at(2_000));

    let mut w = watcher(&fs, &[], false);
    let mut count = 0;
    let mut on_change = |_path: PathBuf| {
        count += 1;
        async {}
    };

    assert!(w.poll(&mut on_change).await.is_some());
    assert!(w.reference_time() > at(2_000));
    assert!(w.poll(&mut on_change).await.is_none());
    assert!(w.poll(&mut on_change).await.is_none());

    // A genuinely newer write is picked up again.
    fs.touch("/proj/main.rs", far_future(0));
    assert!(w.poll(&mut on_change).await.is_some());

    drop(on_change);
    assert_eq!(count, 2);
}

#[tokio::test]
async fn excluded_vendor_never_reaches_coordinator() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("/proj/src/main.rs", "fn main() {}");

    let harness = HarnessBuilder::new().build();
    let coordinator = &harness.coordinator;
    let mut on_change = move |path: PathBuf| async move {
        coordinator.on_change(&path).await;
    };

    let mut w = watcher(&fs, &["vendor"], false);
    for cycle in 0..25u64 {
        fs.touch(format!("/proj/vendor/crate_{cycle}/lib.rs"), far_future(cycle));
        fs.touch("/proj/vendor/lib.rs", far_future(cycle));
        assert!(w.poll(&mut on_change).await.is_none());
    }

    assert!(harness.log.calls().is_empty());
}

#[test]
fn exclude_is_exact_not_prefix() {
    let fs = MockFileSystem::new();
    fs.touch("/proj/vendor_ext/lib.rs", at(2_000));
    fs.touch("/proj/lib/vendor/mod.rs", at(2_000));

    let w = watcher(&fs, &["vendor"], false);
    assert_eq!(w.scan(), Some(PathBuf::from("/proj/lib/vendor/mod.rs")));
}
