// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Every option can also be supplied through a `KILN_*` environment variable.
//! Switches (`--immediate`, `--all`, `--notifications`) take an optional
//! `=false`, so they can also turn off a setting enabled in `Kiln.toml`.
//! Options left unset fall back to the config file (if any) and then to the
//! defaults in [`crate::config::RawSettings`].

use std::path::PathBuf;

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};

use crate::types::OutputSink;

/// Command-line arguments for `kiln`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "kiln",
    version,
    about = "A live reload utility for Rust web applications.",
    long_about = None
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Listening address for the proxy server.
    #[arg(short = 'l', long, env = "KILN_LADDR", value_name = "ADDR")]
    pub laddr: Option<String>,

    /// Port for the proxy server.
    #[arg(short = 'p', long, env = "KILN_PORT", value_name = "PORT")]
    pub port: Option<u16>,

    /// Port the supervised server listens on (exported to it as `PORT`).
    #[arg(short = 'a', long, env = "KILN_APP_PORT", value_name = "PORT")]
    pub app_port: Option<u16>,

    /// Name of the cargo binary target to build and run.
    #[arg(short = 'b', long, env = "KILN_BIN", value_name = "NAME")]
    pub bin: Option<String>,

    /// Path to watch files from.
    #[arg(short = 't', long, env = "KILN_PATH", value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Path to build files from (defaults to same value as --path).
    #[arg(short = 'd', long, env = "KILN_BUILD", value_name = "PATH")]
    pub build: Option<PathBuf>,

    /// Relative directories to exclude from watching.
    #[arg(
        short = 'x',
        long = "exclude-dir",
        env = "KILN_EXCLUDE_DIR",
        value_name = "DIR",
        value_delimiter = ','
    )]
    pub exclude_dir: Vec<String>,

    /// Run the server immediately after it's built.
    #[arg(
        short = 'i', long,
        env = "KILN_IMMEDIATE",
        value_name = "BOOL",
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub immediate: Option<bool>,

    /// Reload whenever any file changes, not only source files.
    #[arg(
        long,
        env = "KILN_ALL",
        value_name = "BOOL",
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub all: Option<bool>,

    /// Additional `cargo build` arguments (shell syntax).
    #[arg(long, env = "KILN_BUILD_ARGS", value_name = "ARGS", allow_hyphen_values = true)]
    pub build_args: Option<String>,

    /// TLS certificate.
    #[arg(long, env = "KILN_CERT_FILE", value_name = "PATH")]
    pub cert_file: Option<PathBuf>,

    /// TLS certificate key.
    #[arg(long, env = "KILN_KEY_FILE", value_name = "PATH")]
    pub key_file: Option<PathBuf>,

    /// Log prefix.
    #[arg(long, env = "KILN_LOG_PREFIX", value_name = "PREFIX")]
    pub log_prefix: Option<String>,

    /// Enables desktop notifications.
    #[arg(
        long,
        env = "KILN_NOTIFICATIONS",
        value_name = "BOOL",
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub notifications: Option<bool>,

    /// Source file extension that triggers a rebuild (without --all).
    #[arg(long = "ext", env = "KILN_EXT", value_name = "EXT")]
    pub extension: Option<String>,

    /// Where the server's stdout/stderr go (inherit, discard).
    #[arg(long, env = "KILN_OUTPUT", value_name = "SINK")]
    pub output: Option<OutputSink>,

    /// Path to a TOML config file (default: `Kiln.toml` if present).
    #[arg(long, env = "KILN_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `KILN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run the kiln proxy in the current working directory.
    #[command(alias = "r")]
    Run {
        /// Arguments passed through to the supervised server.
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Display environment variables set by the .env file.
    #[command(alias = "e")]
    Env,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_subcommand_collects_child_args() {
        let args = CliArgs::try_parse_from(["kiln", "-i", "run", "--verbose", "serve"]).unwrap();
        assert_eq!(args.immediate, Some(true));
        match args.command {
            Some(Command::Run { args }) => assert_eq!(args, vec!["--verbose", "serve"]),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn exclude_dirs_are_repeatable() {
        let args =
            CliArgs::try_parse_from(["kiln", "-x", "vendor", "--exclude-dir", "web/dist"]).unwrap();
        assert_eq!(args.exclude_dir, vec!["vendor", "web/dist"]);
        assert!(args.command.is_none());
    }

    #[test]
    fn switches_accept_explicit_values() {
        let args = CliArgs::try_parse_from(["kiln", "--immediate=false", "--all", "--notifications=no"])
            .unwrap();
        assert_eq!(args.immediate, Some(false));
        assert_eq!(args.all, Some(true));
        assert_eq!(args.notifications, Some(false));
    }
}
