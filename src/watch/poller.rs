// src/watch/poller.rs

use std::future::Future;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tracing::{debug, info, trace, warn};

use crate::fs::FileSystem;
use crate::watch::exclude::ExcludeSet;
use crate::watch::path_utils::relative_str;

/// Delay between two traversals of the watch root.
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Source extension without the leading dot (e.g. `rs`).
    pub extension: String,
    /// Any regular file qualifies, regardless of extension.
    pub watch_all: bool,
    pub poll_interval: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            extension: "rs".to_string(),
            watch_all: false,
            poll_interval: POLL_INTERVAL,
        }
    }
}

/// Polling watcher over a directory tree.
///
/// Owns the reference time: a file counts as changed only when its mtime is
/// strictly after it. The reference only ever moves forward.
#[derive(Debug)]
pub struct Watcher {
    root: PathBuf,
    excludes: ExcludeSet,
    options: WatchOptions,
    fs: Arc<dyn FileSystem>,
    reference: SystemTime,
}

impl Watcher {
    pub fn new(
        root: impl Into<PathBuf>,
        excludes: ExcludeSet,
        options: WatchOptions,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            root: root.into(),
            excludes,
            options,
            fs,
            reference: SystemTime::now(),
        }
    }

    /// Override the initial reference time.
    pub fn with_reference_time(mut self, reference: SystemTime) -> Self {
        self.reference = reference;
        self
    }

    pub fn reference_time(&self) -> SystemTime {
        self.reference
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// One depth-first traversal. Returns the first qualifying file modified
    /// after the reference time, without updating it.
    pub fn scan(&self) -> Option<PathBuf> {
        match self.visit_dir(&self.root, Path::new("")) {
            ControlFlow::Break(path) => Some(path),
            ControlFlow::Continue(()) => None,
        }
    }

    /// Advance the reference time to now.
    pub fn mark_reported(&mut self) {
        let now = SystemTime::now();
        if now > self.reference {
            self.reference = now;
        }
    }

    /// One poll cycle without the trailing delay.
    ///
    /// On a change, `on_change` runs to completion before the reference time
    /// is reset, so at most one change is reported per cycle.
    pub async fn poll<F, Fut>(&mut self, on_change: &mut F) -> Option<PathBuf>
    where
        F: FnMut(PathBuf) -> Fut,
        Fut: Future<Output = ()>,
    {
        let path = self.scan()?;

        let rel = relative_str(&self.root, &path).unwrap_or_else(|| path.display().to_string());
        debug!(path = %rel, "change detected");

        on_change(path.clone()).await;
        self.mark_reported();
        Some(path)
    }

    /// Poll forever.
    pub async fn run<F, Fut>(mut self, mut on_change: F)
    where
        F: FnMut(PathBuf) -> Fut,
        Fut: Future<Output = ()>,
    {
        info!(
            root = ?self.root,
            extension = %self.options.extension,
            all = self.options.watch_all,
            "watching for changes"
        );

        loop {
            self.poll(&mut on_change).await;
            tokio::time::sleep(self.options.poll_interval).await;
        }
    }

    fn visit_dir(&self, dir: &Path, rel: &Path) -> ControlFlow<PathBuf> {
        let mut entries = match self.fs.read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(dir = ?dir, error = %err, "cannot read directory; skipping");
                return ControlFlow::Continue(());
            }
        };
        entries.sort();

        for path in entries {
            let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
                continue;
            };
            let rel_path = rel.join(&name);
            let is_dir = self.fs.is_dir(&path);

            if is_dir && name == ".git" {
                continue;
            }
            if self.excludes.matches(&rel_path) || self.excludes.matches(&path) {
                trace!(path = ?rel_path, "excluded");
                continue;
            }
            if is_dir {
                // Hidden directories other than .git are still descended.
                self.visit_dir(&path, &rel_path)?;
                continue;
            }
            if name.starts_with('.') || !self.qualifies(&path) {
                continue;
            }

            match self.fs.modified(&path) {
                Ok(modified) if modified > self.reference => {
                    return ControlFlow::Break(path);
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(path = ?path, error = %err, "cannot read modification time; skipping");
                }
            }
        }

        ControlFlow::Continue(())
    }

    fn qualifies(&self, path: &Path) -> bool {
        if !self.fs.is_file(path) {
            return false;
        }
        self.options.watch_all
            || path.extension().and_then(|e| e.to_str()) == Some(self.options.extension.as_str())
    }
}
