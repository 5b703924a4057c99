// src/watch/mod.rs

//! Change detection by mtime polling.
//!
//! The watcher walks the watch root every poll interval and reports the
//! first source file modified since the previous report. It does not know
//! anything about builds; it only hands a path to a callback.

pub mod exclude;
pub mod path_utils;
pub mod poller;

pub use exclude::ExcludeSet;
pub use poller::{POLL_INTERVAL, WatchOptions, Watcher};
