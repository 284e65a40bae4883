//! Backend process spawner and exit monitor.
//!
//! Spawns a debugger backend with all three stdio streams piped and
//! `kill_on_drop(true)`, so a channel that is dropped takes its process
//! with it.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{AppError, Result};

// ── Configuration ────────────────────────────────────────────────────────────

/// What to launch and where.
#[derive(Debug, Clone)]
pub struct SpawnConfig {
    /// Full command line; split with POSIX shell quoting rules.
    pub command_line: String,
    /// Working directory the process starts in.
    pub working_dir: PathBuf,
    /// Extra environment variables on top of the inherited environment.
    pub env: HashMap<String, String>,
}

// ── Process handle ───────────────────────────────────────────────────────────

/// A freshly spawned backend with its stdio handles taken.
#[derive(Debug)]
pub struct SpawnedProcess {
    /// OS process id.
    pub pid: u32,
    /// Child handle; keep it alive, dropping it kills the process.
    pub child: Child,
    /// Backend input.
    pub stdin: ChildStdin,
    /// Backend standard output.
    pub stdout: ChildStdout,
    /// Backend error output.
    pub stderr: ChildStderr,
}

// ── Spawner ──────────────────────────────────────────────────────────────────

/// Spawn the backend described by `config`.
///
/// Must be called from within a tokio runtime.
///
/// # Errors
///
/// - `AppError::Spawn("empty command line")` / `("unbalanced quoting …")`.
/// - `AppError::Spawn("failed to spawn …")` if the OS refuses.
/// - `AppError::Spawn("failed to capture …")` if a stdio pipe is missing.
pub fn spawn_backend(config: &SpawnConfig) -> Result<SpawnedProcess> {
    let argv = shlex::split(&config.command_line).ok_or_else(|| {
        AppError::Spawn(format!(
            "unbalanced quoting in command line: {}",
            config.command_line
        ))
    })?;
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| AppError::Spawn("empty command line".into()))?;

    let mut cmd = Command::new(program);
    cmd.args(args)
        .envs(&config.env)
        .current_dir(&config.working_dir)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .map_err(|err| AppError::Spawn(format!("failed to spawn {program}: {err}")))?;

    let pid = child
        .id()
        .ok_or_else(|| AppError::Spawn(format!("{program} exited before its pid was read")))?;
    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| AppError::Spawn("failed to capture backend stdin".into()))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| AppError::Spawn("failed to capture backend stdout".into()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| AppError::Spawn("failed to capture backend stderr".into()))?;

    info!(
        pid,
        program = program.as_str(),
        working_dir = %config.working_dir.display(),
        "backend process spawned"
    );

    Ok(SpawnedProcess {
        pid,
        child,
        stdin,
        stdout,
        stderr,
    })
}

// ── Exit monitor ─────────────────────────────────────────────────────────────

/// Spawn a task that publishes the backend's exit code on `exit_tx`.
///
/// After the process exits, the task waits up to `drain_grace` for the
/// `readers` to reach EOF, so every byte the backend wrote is already queued
/// on the poll side when the exit becomes observable.
///
/// When `cancel` fires first, the task exits without publishing and drops
/// `child`, which kills the process.
#[must_use]
pub fn monitor_exit(
    channel_id: String,
    mut child: Child,
    readers: Vec<JoinHandle<()>>,
    drain_grace: Duration,
    exit_tx: oneshot::Sender<Option<i32>>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            result = child.wait() => {
                let exit_code = match result {
                    Ok(status) => {
                        info!(channel_id, %status, "backend process exited");
                        status.code()
                    }
                    Err(err) => {
                        warn!(channel_id, %err, "error waiting for backend process");
                        None
                    }
                };

                if tokio::time::timeout(drain_grace, join_all(readers)).await.is_err() {
                    warn!(
                        channel_id,
                        ?drain_grace,
                        "output pipes still open after exit, publishing exit anyway"
                    );
                }

                if exit_tx.send(exit_code).is_err() {
                    debug!(channel_id, "exit receiver dropped before exit was published");
                }
            }
            () = cancel.cancelled() => {
                debug!(channel_id, "exit monitor: cancellation received, killing backend");
            }
        }
    })
}
