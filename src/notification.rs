// src/notification.rs

//! Desktop notifications for build events.
//!
//! Delivery is always best-effort: [`NotificationBridge`] logs a failed push
//! and carries on.

use std::sync::Arc;

use anyhow::Context;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::errors::{KilnError, Result};
use crate::types::BoxFuture;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Normal,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub urgency: Urgency,
}

impl Notification {
    pub fn new(title: impl Into<String>, body: impl Into<String>, urgency: Urgency) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            urgency,
        }
    }
}

/// Delivers a notification somewhere a developer will see it.
pub trait Notifier: Send + Sync {
    fn push(&self, notification: Notification) -> BoxFuture<'_, Result<()>>;
}

/// Shells out to the platform's notification tool
/// (`notify-send` on Linux/BSD, `osascript` on macOS).
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    app_name: String,
}

impl DesktopNotifier {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }

    fn command(&self, n: &Notification) -> Result<Command> {
        if cfg!(target_os = "macos") {
            let script = format!(
                "display notification {} with title {} subtitle {}",
                applescript_quote(&n.body),
                applescript_quote(&self.app_name),
                applescript_quote(&n.title),
            );
            let mut cmd = Command::new("osascript");
            cmd.arg("-e").arg(script);
            Ok(cmd)
        } else if cfg!(unix) {
            let urgency = match n.urgency {
                Urgency::Normal => "normal",
                Urgency::Critical => "critical",
            };
            let mut cmd = Command::new("notify-send");
            cmd.arg("-a")
                .arg(&self.app_name)
                .arg("-u")
                .arg(urgency)
                .arg(&n.title)
                .arg(&n.body);
            Ok(cmd)
        } else {
            Err(KilnError::Notification(
                "desktop notifications are not supported on this platform".to_string(),
            ))
        }
    }
}

impl Notifier for DesktopNotifier {
    fn push(&self, notification: Notification) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let mut cmd = self.command(&notification)?;
            let status = cmd
                .stdin(std::process::Stdio::null())
                .stdout(std::process::Stdio::null())
                .stderr(std::process::Stdio::null())
                .status()
                .await
                .context("spawning notification helper")?;

            if status.success() {
                Ok(())
            } else {
                Err(KilnError::Notification(format!(
                    "notification helper exited with {status}"
                )))
            }
        })
    }
}

fn applescript_quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Fire-and-log wrapper around an optional [`Notifier`].
#[derive(Clone, Default)]
pub struct NotificationBridge {
    notifier: Option<Arc<dyn Notifier>>,
}

impl std::fmt::Debug for NotificationBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationBridge")
            .field("enabled", &self.notifier.is_some())
            .finish()
    }
}

impl NotificationBridge {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            notifier: Some(notifier),
        }
    }

    pub fn disabled() -> Self {
        Self { notifier: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.notifier.is_some()
    }

    pub async fn push(&self, title: &str, body: &str, urgency: Urgency) {
        let Some(notifier) = &self.notifier else {
            return;
        };
        debug!(title, body, ?urgency, "pushing notification");
        if let Err(err) = notifier.push(Notification::new(title, body, urgency)).await {
            warn!(error = %err, "Notification send failed");
        }
    }
}
