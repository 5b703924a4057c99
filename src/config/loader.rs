// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::CliArgs;
use crate::config::model::{RawSettings, Settings};
use crate::errors::{KilnError, Result};

/// Load a configuration file from a given path and return the raw settings.
///
/// This only performs TOML deserialization; validation happens in
/// `Settings::try_from`.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawSettings> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| {
        KilnError::ConfigError(format!("reading config file {}: {e}", path.display()))
    })?;

    let settings: RawSettings = toml::from_str(&contents)?;

    Ok(settings)
}

/// Resolve the final settings for a run.
///
/// - An explicit `--config` path must exist.
/// - Without one, `Kiln.toml` in the working directory is used when present.
/// - CLI/env values are layered on top, then everything is validated.
pub fn load_settings(args: &CliArgs) -> Result<Settings> {
    let mut raw = match &args.config {
        Some(path) => load_from_path(path)?,
        None => {
            let path = default_config_path();
            if path.is_file() {
                load_from_path(&path)?
            } else {
                RawSettings::default()
            }
        }
    };

    raw.apply_cli(args);
    Settings::try_from(raw)
}

/// Config file looked up when `--config` is not given.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Kiln.toml")
}
