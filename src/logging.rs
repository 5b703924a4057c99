// src/logging.rs

//! Logging setup for `kiln`.
//!
//! There are two output streams:
//!
//! - Diagnostics go through `tracing` + `tracing-subscriber` to STDERR.
//!   Level priority: `--log-level` flag, then the `KILN_LOG` environment
//!   variable, then `info`.
//! - The short status lines a developer watches while editing
//!   (`[kiln] Building...`, `[kiln] Build finished`) are printed to STDOUT by
//!   [`Console`], with the configurable prefix.

use anyhow::Result;
use colored::Colorize;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let level = match cli_level {
        Some(lvl) => level_from_log_level(lvl),
        None => std::env::var("KILN_LOG")
            .ok()
            .and_then(|s| parse_level_str(&s))
            .unwrap_or(tracing::Level::INFO),
    };

    fmt()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}

/// Prefixed status lines on stdout.
#[derive(Debug, Clone)]
pub struct Console {
    prefix: String,
    quiet: bool,
}

impl Console {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: format!("[{prefix}] "),
            quiet: false,
        }
    }

    /// A console that formats lines but never prints them.
    pub fn quiet() -> Self {
        Self {
            prefix: String::new(),
            quiet: true,
        }
    }

    pub fn line(&self, msg: impl AsRef<str>) {
        if !self.quiet {
            println!("{}", self.format(msg.as_ref()));
        }
    }

    pub fn success(&self, msg: impl AsRef<str>) {
        if !self.quiet {
            println!("{}{}", self.prefix, msg.as_ref().green().bold());
        }
    }

    pub fn failure(&self, msg: impl AsRef<str>) {
        if !self.quiet {
            println!("{}{}", self.prefix, msg.as_ref().red().bold());
        }
    }

    /// Raw text without prefix (compiler diagnostics).
    pub fn raw(&self, text: impl AsRef<str>) {
        if !self.quiet {
            println!("{}", text.as_ref());
        }
    }

    pub fn format(&self, msg: &str) -> String {
        format!("{}{}", self.prefix, msg)
    }
}
