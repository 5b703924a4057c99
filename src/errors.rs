// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum KilnError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("could not tokenize build arguments: {0}")]
    BuildArgs(String),

    #[error("build failed: {0}")]
    BuildFailed(String),

    #[error("process supervisor error: {0}")]
    Supervisor(String),

    #[error("notification error: {0}")]
    Notification(String),

    #[error("proxy error: {0}")]
    Proxy(String),

    #[error("env file error: {0}")]
    EnvFile(#[from] dotenvy::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, KilnError>;
