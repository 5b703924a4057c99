// src/env.rs

//! `.env` bootstrapping.
//!
//! Variables are collected and handed to the supervised child; kiln's own
//! process environment is left untouched.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::errors::{KilnError, Result};

pub fn default_env_path() -> PathBuf {
    PathBuf::from(".env")
}

/// Read every `KEY=value` pair from `path`, in file order.
pub fn bootstrap(path: &Path) -> Result<Vec<(String, String)>> {
    let iter = dotenvy::from_path_iter(path)?;
    let mut vars = Vec::new();
    for item in iter {
        vars.push(item?);
    }
    debug!(path = ?path, count = vars.len(), "loaded env file");
    Ok(vars)
}

/// Like [`bootstrap`], but a missing file yields no variables and other
/// failures are logged instead of returned.
pub fn bootstrap_optional(path: &Path) -> Vec<(String, String)> {
    match bootstrap(path) {
        Ok(vars) => vars,
        Err(KilnError::EnvFile(dotenvy::Error::Io(e))) if e.kind() == ErrorKind::NotFound => {
            Vec::new()
        }
        Err(e) => {
            warn!(path = ?path, error = %e, "ignoring unreadable env file");
            Vec::new()
        }
    }
}
