// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod env;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod notification;
pub mod proxy;
pub mod types;
pub mod watch;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use anyhow::Context;
use tracing::{debug, info};

use crate::cli::{CliArgs, Command};
use crate::config::{Settings, load_settings};
use crate::engine::{BuildCoordinator, BuildStatus, CoordinatorOptions, ShutdownGuard};
use crate::errors::Result;
use crate::exec::{CargoBuilder, ChildSpec, Supervisor, spawn_supervisor};
use crate::fs::RealFileSystem;
use crate::logging::Console;
use crate::notification::{DesktopNotifier, NotificationBridge};
use crate::proxy::{Proxy, ProxyConfig};
use crate::watch::{WatchOptions, Watcher};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - settings (defaults, `Kiln.toml`, flags/env)
/// - builder, process supervisor and proxy
/// - the shutdown guard
/// - an initial build, then the polling watcher
pub async fn run(args: CliArgs) -> Result<()> {
    // Edits saved while the first build runs must still count as changes.
    let started = SystemTime::now();

    let child_args = match &args.command {
        Some(Command::Env) => return print_env(),
        Some(Command::Run { args }) => args.clone(),
        None => Vec::new(),
    };

    let settings = load_settings(&args)?;
    let console = Console::new(&settings.log_prefix);

    let wd = std::env::current_dir().context("determining the working directory")?;

    let mut envs = env::bootstrap_optional(&wd.join(env::default_env_path()));
    envs.push(("PORT".to_string(), settings.app_port.to_string()));

    let builder = Arc::new(CargoBuilder::new(
        &settings.build_root,
        &settings.bin,
        &wd,
        settings.build_args.clone(),
    ));
    let supervisor: Arc<dyn Supervisor> = Arc::new(spawn_supervisor(ChildSpec {
        program: builder.binary_path(),
        args: child_args,
        envs,
        output: settings.output,
    }));
    let status = BuildStatus::new();

    let guard = Arc::new(ShutdownGuard::new(Arc::clone(&supervisor)));
    let _signal_task = guard.arm();

    let proxy_config = proxy_config(&settings);
    let local = Proxy::new(status.clone(), Arc::clone(&supervisor))
        .run(&proxy_config)
        .await?;
    match &settings.laddr {
        Some(laddr) => console.line(format!("Listening at {laddr}:{}", local.port())),
        None => console.line(format!("Listening on port {}", local.port())),
    }

    let notifications = if settings.notifications {
        NotificationBridge::new(Arc::new(DesktopNotifier::new("Kiln Build")))
    } else {
        NotificationBridge::disabled()
    };

    let coordinator = Arc::new(
        BuildCoordinator::new(
            builder,
            Arc::clone(&supervisor),
            status,
            CoordinatorOptions {
                immediate: settings.immediate,
                ..CoordinatorOptions::default()
            },
        )
        .with_notifications(notifications)
        .with_console(console),
    );
    debug!(?coordinator, "coordinator ready");

    // Build right now.
    coordinator.build().await;

    // Then scan for changes.
    watcher_for(&settings, started)
        .run(move |path: PathBuf| {
            let coordinator = Arc::clone(&coordinator);
            async move {
                coordinator.on_change(&path).await;
            }
        })
        .await;

    info!("watcher stopped");
    Ok(())
}

/// Watcher over the configured root, comparing against `reference`.
fn watcher_for(settings: &Settings, reference: SystemTime) -> Watcher {
    Watcher::new(
        settings.watch_root.clone(),
        settings.excludes.clone(),
        WatchOptions {
            extension: settings.extension.clone(),
            watch_all: settings.watch_all,
            ..WatchOptions::default()
        },
        Arc::new(RealFileSystem),
    )
    .with_reference_time(reference)
}

fn proxy_config(settings: &Settings) -> ProxyConfig {
    ProxyConfig {
        laddr: settings.laddr.clone(),
        port: settings.port,
        proxy_to: format!("127.0.0.1:{}", settings.app_port),
        cert_file: settings.cert_file.clone(),
        key_file: settings.key_file.clone(),
    }
}

/// `kiln env`: print the variables the `.env` file defines.
fn print_env() -> Result<()> {
    let vars = env::bootstrap(&env::default_env_path())?;
    for (k, v) in vars {
        println!("{k}: {v}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RawSettings;
    use std::time::Duration;

    #[test]
    fn watcher_compares_against_startup_time() {
        let settings = Settings::try_from(RawSettings::default()).unwrap();
        let started = SystemTime::now() - Duration::from_secs(120);

        let watcher = watcher_for(&settings, started);
        assert_eq!(watcher.reference_time(), started);
        assert_eq!(watcher.root(), settings.watch_root.as_path());
    }
}
