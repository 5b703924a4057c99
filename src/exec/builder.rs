// src/exec/builder.rs

//! `cargo build` invocation.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Mutex;

use anyhow::Context;
use tokio::process::Command;
use tracing::{debug, info};

use crate::errors::{KilnError, Result};
use crate::exec::backend::Builder;
use crate::types::BoxFuture;

/// Builds one binary target of a cargo package.
#[derive(Debug)]
pub struct CargoBuilder {
    dir: PathBuf,
    bin: String,
    wd: PathBuf,
    args: Vec<String>,
    errors: Mutex<String>,
}

impl CargoBuilder {
    /// - `dir`: package directory `cargo build` runs in.
    /// - `bin`: binary target name.
    /// - `wd`: working directory relative paths are resolved against.
    /// - `args`: extra `cargo build` arguments, already tokenized.
    pub fn new(dir: impl Into<PathBuf>, bin: &str, wd: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            dir: dir.into(),
            bin: bin.to_string(),
            wd: wd.into(),
            args,
            errors: Mutex::new(String::new()),
        }
    }

    /// Absolute path of the executable the build produces.
    pub fn binary_path(&self) -> PathBuf {
        let dir = if self.dir.is_absolute() {
            self.dir.clone()
        } else {
            self.wd.join(&self.dir)
        };
        dir.join("target")
            .join(profile_dir(&self.args))
            .join(format!("{}{}", self.bin, std::env::consts::EXE_SUFFIX))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn set_errors(&self, text: String) {
        let mut guard = self.errors.lock().unwrap_or_else(|e| e.into_inner());
        *guard = text;
    }

    async fn run_cargo(&self) -> Result<()> {
        let mut cmd = Command::new("cargo");
        cmd.arg("build")
            .arg("--bin")
            .arg(&self.bin)
            .args(&self.args)
            .current_dir(&self.dir)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        info!(bin = %self.bin, dir = ?self.dir, args = ?self.args, "running cargo build");

        let output = cmd
            .output()
            .await
            .with_context(|| format!("spawning cargo build in {:?}", self.dir))?;

        if output.status.success() {
            debug!(bin = %self.bin, "cargo build succeeded");
            self.set_errors(String::new());
            return Ok(());
        }

        let mut text = String::from_utf8_lossy(&output.stderr).into_owned();
        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            text.push_str(&stdout);
        }
        self.set_errors(text);

        Err(KilnError::BuildFailed(match output.status.code() {
            Some(code) => format!("cargo exited with status {code}"),
            None => "cargo terminated by signal".to_string(),
        }))
    }
}

impl Builder for CargoBuilder {
    fn binary(&self) -> &str {
        &self.bin
    }

    fn errors(&self) -> String {
        self.errors.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn build(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let res = self.run_cargo().await;
            if let Err(KilnError::Other(ref err)) = res {
                // Spawn failures have no compiler output; surface the error itself.
                self.set_errors(format!("{err:#}"));
            }
            res
        })
    }
}

/// Directory under `target/` cargo writes to for the given build args.
fn profile_dir(args: &[String]) -> String {
    let mut profile = "debug".to_string();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--release" || arg == "-r" {
            profile = "release".to_string();
        } else if arg == "--profile" {
            if let Some(p) = iter.next() {
                profile = p.clone();
            }
        } else if let Some(p) = arg.strip_prefix("--profile=") {
            profile = p.to_string();
        }
    }
    if profile == "dev" || profile == "test" {
        "debug".to_string()
    } else if profile == "bench" {
        "release".to_string()
    } else {
        profile
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(s: &[&str]) -> Vec<String> {
        s.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn profile_dir_follows_cargo_conventions() {
        assert_eq!(profile_dir(&[]), "debug");
        assert_eq!(profile_dir(&args(&["--release"])), "release");
        assert_eq!(profile_dir(&args(&["--profile", "dev"])), "debug");
        assert_eq!(profile_dir(&args(&["--profile=staging"])), "staging");
    }

    #[test]
    fn binary_path_is_resolved_against_working_dir() {
        let builder = CargoBuilder::new("app", "server", "/work", args(&["--release"]));
        let expected = PathBuf::from("/work/app/target/release")
            .join(format!("server{}", std::env::consts::EXE_SUFFIX));
        assert_eq!(builder.binary_path(), expected);
        assert_eq!(builder.binary(), "server");
        assert!(builder.errors().is_empty());
    }
}
