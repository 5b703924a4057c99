// src/exec/supervisor.rs

//! Actor that owns the supervised child process.
//!
//! All start/stop requests go through an mpsc channel and are handled one at
//! a time by a single Tokio task, so a stop from the shutdown guard can never
//! interleave with a stop/start from the build coordinator or the proxy.

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use anyhow::Context;
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::errors::{KilnError, Result};
use crate::exec::backend::Supervisor;
use crate::types::{BoxFuture, OutputSink};

/// How long a freshly spawned child gets before `start` returns.
pub const SPAWN_SETTLE: Duration = Duration::from_millis(250);

/// Grace period between the soft stop signal and a hard kill.
pub const STOP_GRACE: Duration = Duration::from_secs(3);

/// Upper bound a caller waits for any single request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// What to run and how.
#[derive(Debug, Clone)]
pub struct ChildSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub envs: Vec<(String, String)>,
    pub output: OutputSink,
}

enum SupervisorRequest {
    Start(oneshot::Sender<Result<()>>),
    Stop(oneshot::Sender<Result<()>>),
}

/// Cloneable handle to the supervisor actor.
#[derive(Debug, Clone)]
pub struct SupervisorHandle {
    tx: mpsc::Sender<SupervisorRequest>,
}

impl std::fmt::Debug for SupervisorRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SupervisorRequest::Start(_) => f.write_str("Start"),
            SupervisorRequest::Stop(_) => f.write_str("Stop"),
        }
    }
}

struct Running {
    child: Child,
    spawned_at: SystemTime,
}

/// Spawn the background supervisor loop.
pub fn spawn_supervisor(spec: ChildSpec) -> SupervisorHandle {
    let (tx, mut rx) = mpsc::channel::<SupervisorRequest>(16);

    tokio::spawn(async move {
        info!(program = ?spec.program, "process supervisor started");

        // Zero or one running instance.
        let mut running: Option<Running> = None;

        while let Some(request) = rx.recv().await {
            debug!(?request, "supervisor received request");
            match request {
                SupervisorRequest::Start(reply) => {
                    let res = start_child(&spec, &mut running).await;
                    let _ = reply.send(res);
                }
                SupervisorRequest::Stop(reply) => {
                    let res = stop_child(&mut running).await;
                    let _ = reply.send(res);
                }
            }
        }

        // Channel closed: every handle is gone. Don't leave an orphan behind.
        if let Err(e) = stop_child(&mut running).await {
            warn!(error = %e, "failed to stop child while shutting down supervisor");
        }
        info!("process supervisor finished (channel closed)");
    });

    SupervisorHandle { tx }
}

impl SupervisorHandle {
    async fn request(
        &self,
        make: impl FnOnce(oneshot::Sender<Result<()>>) -> SupervisorRequest,
    ) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(make(reply_tx))
            .await
            .map_err(|_| KilnError::Supervisor("supervisor is not running".to_string()))?;

        match timeout(REQUEST_TIMEOUT, reply_rx).await {
            Ok(Ok(res)) => res,
            Ok(Err(_)) => Err(KilnError::Supervisor(
                "supervisor dropped the request".to_string(),
            )),
            Err(_) => Err(KilnError::Supervisor(format!(
                "no reply from supervisor within {REQUEST_TIMEOUT:?}"
            ))),
        }
    }
}

impl Supervisor for SupervisorHandle {
    fn start(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(self.request(SupervisorRequest::Start))
    }

    fn stop(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(self.request(SupervisorRequest::Stop))
    }
}

async fn start_child(spec: &ChildSpec, running: &mut Option<Running>) -> Result<()> {
    if let Some(current) = running.as_mut() {
        match current.child.try_wait() {
            Ok(Some(status)) => {
                info!(%status, "previous instance has exited");
                *running = None;
            }
            Ok(None) if binary_is_newer(spec, current.spawned_at) => {
                info!("binary changed since last start; restarting");
                stop_child(running).await?;
            }
            Ok(None) => return Ok(()),
            Err(e) => {
                warn!(error = %e, "cannot query child status; restarting");
                stop_child(running).await?;
            }
        }
    }

    info!(program = ?spec.program, args = ?spec.args, "starting child process");

    let child = Command::new(&spec.program)
        .args(&spec.args)
        .envs(spec.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(std::process::Stdio::null())
        .stdout(spec.output.stdio())
        .stderr(spec.output.stdio())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("spawning {:?}", spec.program))?;

    *running = Some(Running {
        child,
        spawned_at: SystemTime::now(),
    });

    tokio::time::sleep(SPAWN_SETTLE).await;
    Ok(())
}

fn binary_is_newer(spec: &ChildSpec, spawned_at: SystemTime) -> bool {
    std::fs::metadata(&spec.program)
        .and_then(|m| m.modified())
        .map(|modified| modified > spawned_at)
        .unwrap_or(false)
}

async fn stop_child(running: &mut Option<Running>) -> Result<()> {
    let Some(mut current) = running.take() else {
        return Ok(());
    };

    if let Ok(Some(status)) = current.child.try_wait() {
        debug!(%status, "child already exited");
        return Ok(());
    }

    let pid = current.child.id();
    info!(?pid, "stopping child process");

    soft_stop(&mut current.child)?;

    match timeout(STOP_GRACE, current.child.wait()).await {
        Ok(Ok(status)) => {
            debug!(%status, "child exited after stop request");
            Ok(())
        }
        Ok(Err(e)) => Err(KilnError::Supervisor(format!("waiting for child: {e}"))),
        Err(_) => {
            warn!(?pid, "child ignored stop request; killing");
            current
                .child
                .kill()
                .await
                .map_err(|e| KilnError::Supervisor(format!("killing child: {e}")))
        }
    }
}

/// Ask the child to exit: SIGINT on unix, immediate kill elsewhere.
#[cfg(unix)]
fn soft_stop(child: &mut Child) -> Result<()> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let Some(pid) = child.id() else {
        return Ok(());
    };
    let pid = i32::try_from(pid)
        .map_err(|_| KilnError::Supervisor(format!("pid {pid} out of range")))?;
    kill(Pid::from_raw(pid), Signal::SIGINT)
        .map_err(|e| KilnError::Supervisor(format!("sending SIGINT to {pid}: {e}")))
}

#[cfg(not(unix))]
fn soft_stop(child: &mut Child) -> Result<()> {
    child
        .start_kill()
        .map_err(|e| KilnError::Supervisor(format!("killing child: {e}")))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::path::Path;

    fn sleeper() -> ChildSpec {
        ChildSpec {
            program: PathBuf::from("sleep"),
            args: vec!["30".to_string()],
            envs: Vec::new(),
            output: OutputSink::Discard,
        }
    }

    #[tokio::test]
    async fn stop_without_child_is_a_no_op() {
        let handle = spawn_supervisor(sleeper());
        handle.stop().await.unwrap();
    }

    #[tokio::test]
    async fn start_is_idempotent_and_stop_terminates() {
        let handle = spawn_supervisor(sleeper());
        handle.start().await.unwrap();
        handle.start().await.unwrap();
        handle.stop().await.unwrap();
        handle.stop().await.unwrap();
    }

    /// A script that appends its pid to `$MARKER` for every launch.
    fn launch_counter(dir: &Path, body: &str) -> ChildSpec {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join("server.sh");
        std::fs::write(&script, format!("#!/bin/sh\necho $$ >> \"$MARKER\"\n{body}\n")).unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        ChildSpec {
            program: script,
            args: Vec::new(),
            envs: vec![(
                "MARKER".to_string(),
                dir.join("launches").to_string_lossy().into_owned(),
            )],
            output: OutputSink::Discard,
        }
    }

    async fn launches(dir: &Path, expected: usize) -> usize {
        let marker = dir.join("launches");
        let count = || {
            std::fs::read_to_string(&marker)
                .map(|s| s.lines().count())
                .unwrap_or(0)
        };
        for _ in 0..40 {
            if count() >= expected {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        count()
    }

    #[tokio::test]
    async fn newer_binary_restarts_running_child() {
        let dir = tempfile::TempDir::new().unwrap();
        let spec = launch_counter(dir.path(), "exec sleep 30");
        let program = spec.program.clone();
        let handle = spawn_supervisor(spec);

        handle.start().await.unwrap();
        assert_eq!(launches(dir.path(), 1).await, 1);

        // Same binary: still running, nothing to do.
        handle.start().await.unwrap();
        assert_eq!(launches(dir.path(), 1).await, 1);

        let rebuilt = SystemTime::now() + Duration::from_secs(60);
        std::fs::File::open(&program)
            .unwrap()
            .set_modified(rebuilt)
            .unwrap();

        handle.start().await.unwrap();
        assert_eq!(launches(dir.path(), 2).await, 2);
        handle.stop().await.unwrap();
    }

    #[tokio::test]
    async fn exited_child_is_replaced_on_next_start() {
        let dir = tempfile::TempDir::new().unwrap();
        let handle = spawn_supervisor(launch_counter(dir.path(), "exit 0"));

        handle.start().await.unwrap();
        assert_eq!(launches(dir.path(), 1).await, 1);
        tokio::time::sleep(Duration::from_millis(100)).await;

        handle.start().await.unwrap();
        assert_eq!(launches(dir.path(), 2).await, 2);
        handle.stop().await.unwrap();
    }

    #[tokio::test]
    async fn missing_program_is_reported() {
        let handle = spawn_supervisor(ChildSpec {
            program: PathBuf::from("/definitely/not/here"),
            ..sleeper()
        });
        assert!(handle.start().await.is_err());
        handle.stop().await.unwrap();
    }
}
