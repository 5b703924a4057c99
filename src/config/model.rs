// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::cli::CliArgs;
use crate::types::OutputSink;
use crate::watch::ExcludeSet;

/// Settings as read from a TOML file, before validation.
///
/// ```toml
/// port = 3000
/// app_port = 3001
/// bin = "server"
/// path = "."
/// exclude_dir = ["vendor", "web/node_modules"]
/// immediate = true
/// build_args = "--features dev"
/// ```
///
/// Every key is optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawSettings {
    pub laddr: Option<String>,
    pub port: u16,
    pub app_port: u16,
    pub bin: String,
    pub path: PathBuf,
    pub build: Option<PathBuf>,
    pub exclude_dir: Vec<String>,
    pub immediate: bool,
    pub all: bool,
    pub build_args: String,
    pub cert_file: Option<PathBuf>,
    pub key_file: Option<PathBuf>,
    pub log_prefix: String,
    pub notifications: bool,
    pub extension: String,
    pub output: OutputSink,
}

impl Default for RawSettings {
    fn default() -> Self {
        Self {
            laddr: None,
            port: 3000,
            app_port: 3001,
            bin: "kiln-bin".to_string(),
            path: PathBuf::from("."),
            build: None,
            exclude_dir: Vec::new(),
            immediate: false,
            all: false,
            build_args: String::new(),
            cert_file: None,
            key_file: None,
            log_prefix: "kiln".to_string(),
            notifications: false,
            extension: "rs".to_string(),
            output: OutputSink::Inherit,
        }
    }
}

impl RawSettings {
    /// Layer CLI / environment values on top of file values.
    ///
    /// Exclude dirs are appended; everything else given on the CLI wins.
    pub fn apply_cli(&mut self, args: &CliArgs) {
        if let Some(laddr) = &args.laddr {
            self.laddr = Some(laddr.clone());
        }
        if let Some(port) = args.port {
            self.port = port;
        }
        if let Some(app_port) = args.app_port {
            self.app_port = app_port;
        }
        if let Some(bin) = &args.bin {
            self.bin = bin.clone();
        }
        if let Some(path) = &args.path {
            self.path = path.clone();
        }
        if let Some(build) = &args.build {
            self.build = Some(build.clone());
        }
        self.exclude_dir.extend(args.exclude_dir.iter().cloned());
        if let Some(immediate) = args.immediate {
            self.immediate = immediate;
        }
        if let Some(all) = args.all {
            self.all = all;
        }
        if let Some(build_args) = &args.build_args {
            self.build_args = build_args.clone();
        }
        if let Some(cert) = &args.cert_file {
            self.cert_file = Some(cert.clone());
        }
        if let Some(key) = &args.key_file {
            self.key_file = Some(key.clone());
        }
        if let Some(prefix) = &args.log_prefix {
            self.log_prefix = prefix.clone();
        }
        if let Some(notifications) = args.notifications {
            self.notifications = notifications;
        }
        if let Some(ext) = &args.extension {
            self.extension = ext.clone();
        }
        if let Some(output) = args.output {
            self.output = output;
        }
    }
}

/// Validated settings.
///
/// Constructed through `Settings::try_from(RawSettings)` (see
/// [`crate::config::validate`]).
#[derive(Debug, Clone)]
pub struct Settings {
    pub laddr: Option<String>,
    pub port: u16,
    pub app_port: u16,
    pub bin: String,
    pub watch_root: PathBuf,
    /// Defaults to `watch_root`.
    pub build_root: PathBuf,
    pub excludes: ExcludeSet,
    pub immediate: bool,
    pub watch_all: bool,
    /// Already tokenized with shell rules.
    pub build_args: Vec<String>,
    pub cert_file: Option<PathBuf>,
    pub key_file: Option<PathBuf>,
    pub log_prefix: String,
    pub notifications: bool,
    /// Without leading dot.
    pub extension: String,
    pub output: OutputSink,
}
