// src/exec/launcher.rs

//! Launching one external command and streaming its output.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::command::ArgumentVector;
use crate::errors::{Result, RigError};

use super::registry::{ProcessRegistry, Registration, Terminate};
use super::stream::{
    ConsoleSink, StreamEnd, format_line, forward_lines, into_async, line_prefix, merged_output,
    read_lines,
};

/// How often a process whose output has ended is checked for exit.
pub const REAP_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// What a finished launch reports back to its unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOutcome {
    pub pid: Option<u32>,
    pub command: String,
    /// `None` when the process was ended by a signal.
    pub exit_code: Option<i32>,
}

impl LaunchOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Trait abstracting how argument vectors are executed.
///
/// Production code uses [`ProcessLauncher`]; tests provide implementations
/// that record what would have been launched.
pub trait Launcher: Send + Sync {
    fn launch<'a>(
        &'a self,
        argv: ArgumentVector,
        rig: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<LaunchOutcome>> + Send + 'a>>;
}

/// A spawned process as seen by the registry.
///
/// The child sits behind a mutex that is only ever held for a non-blocking
/// `start_kill` or `try_wait`.
pub struct ProcessHandle {
    pid: Option<u32>,
    rig: String,
    child: Mutex<Child>,
    terminated: AtomicBool,
}

impl ProcessHandle {
    fn new(rig: &str, child: Child) -> Self {
        Self {
            pid: child.id(),
            rig: rig.to_string(),
            child: Mutex::new(child),
            terminated: AtomicBool::new(false),
        }
    }

    fn child(&self) -> MutexGuard<'_, Child> {
        self.child.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn try_wait(&self) -> io::Result<Option<ExitStatus>> {
        self.child().try_wait()
    }

    /// Wait for the process to exit without holding the lock across awaits.
    async fn reap(&self) -> io::Result<ExitStatus> {
        loop {
            if let Some(status) = self.try_wait()? {
                return Ok(status);
            }
            tokio::time::sleep(REAP_POLL_INTERVAL).await;
        }
    }
}

impl Terminate for ProcessHandle {
    fn pid(&self) -> Option<u32> {
        self.pid
    }

    fn rig(&self) -> &str {
        &self.rig
    }

    fn terminate(&self) -> io::Result<()> {
        if self.terminated.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.child().start_kill()
    }
}

/// Real launcher: spawns the command with `tokio::process`, registers it, and
/// multiplexes its combined stdout and stderr onto the console.
#[derive(Clone)]
pub struct ProcessLauncher {
    registry: Arc<ProcessRegistry>,
    console: Arc<dyn ConsoleSink>,
}

impl ProcessLauncher {
    pub fn new(registry: Arc<ProcessRegistry>, console: Arc<dyn ConsoleSink>) -> Self {
        Self { registry, console }
    }

    async fn launch_inner(&self, argv: ArgumentVector, rig: &str) -> Result<LaunchOutcome> {
        // Nothing new starts once the kill sweep has begun.
        if self.registry.is_shutting_down() {
            return Err(RigError::Terminated);
        }

        let command = argv.to_string();

        let spawn_error = |source| RigError::Spawn {
            rig: rig.to_string(),
            command: command.clone(),
            source,
        };

        let mut cmd = Command::new(argv.program());
        cmd.args(argv.args()).stdin(Stdio::null()).kill_on_drop(true);
        let output = merged_output(&mut cmd).map_err(spawn_error)?;

        let spawned = cmd.spawn();
        // Closes the parent's write ends of the output pipe.
        drop(cmd);
        let child = spawned.map_err(spawn_error)?;

        let handle = Arc::new(ProcessHandle::new(rig, child));
        let pid = handle.pid;

        if self.registry.register(&handle) == Registration::Rejected {
            return Err(RigError::Terminated);
        }

        let prefix = line_prefix(pid, rig);
        self.console.emit(&format_line(&prefix, command.as_bytes()));
        info!(rig, pid = ?pid, %command, "started process");

        let output = match into_async(output) {
            Ok(output) => output,
            Err(e) => {
                let _ = handle.terminate();
                return Err(RigError::Other(anyhow::Error::new(e).context(format!(
                    "reading output of `{command}` on rig '{rig}'"
                ))));
            }
        };
        let lines = read_lines(output);
        let end = forward_lines(
            lines,
            &prefix,
            self.console.as_ref(),
            self.registry.shutdown_signal(),
        )
        .await;

        let status = handle.reap().await.map_err(|e| {
            RigError::Other(anyhow::Error::new(e).context(format!(
                "waiting for `{command}` on rig '{rig}'"
            )))
        })?;

        if end == StreamEnd::Cancelled {
            debug!(rig, pid = ?pid, "output stream cancelled by shutdown");
            return Err(RigError::Terminated);
        }

        let outcome = LaunchOutcome {
            pid,
            command,
            exit_code: status.code(),
        };

        if outcome.success() {
            info!(rig, pid = ?pid, "process exited");
        } else {
            warn!(
                rig,
                pid = ?pid,
                exit_code = ?outcome.exit_code,
                command = %outcome.command,
                "process exited unsuccessfully"
            );
        }

        Ok(outcome)
    }
}

impl Launcher for ProcessLauncher {
    fn launch<'a>(
        &'a self,
        argv: ArgumentVector,
        rig: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<LaunchOutcome>> + Send + 'a>> {
        Box::pin(self.launch_inner(argv, rig))
    }
}
