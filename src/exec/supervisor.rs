// src/exec/supervisor.rs

//! Signal-driven termination.
//!
//! SIGINT and SIGTERM (Ctrl-C only on non-unix platforms) trigger an
//! immediate [`ProcessRegistry::kill_all`]. There is no grace period: every
//! running command is killed, the units see their streams end, and the run
//! returns normally with [`crate::errors::RigError::Terminated`].

use std::io;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::registry::ProcessRegistry;

/// Install the signal listeners. Call once, from inside the runtime, before
/// anything is launched.
///
/// Listener registration happens before this returns, so a signal arriving
/// right after `install` is never missed.
pub fn install(registry: Arc<ProcessRegistry>) -> io::Result<JoinHandle<()>> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        Ok(tokio::spawn(async move {
            loop {
                let name = tokio::select! {
                    received = sigint.recv() => match received {
                        Some(()) => "SIGINT",
                        None => break,
                    },
                    received = sigterm.recv() => match received {
                        Some(()) => "SIGTERM",
                        None => break,
                    },
                };
                sweep(&registry, name);
            }
        }))
    }

    #[cfg(not(unix))]
    {
        Ok(tokio::spawn(async move {
            loop {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!(error = %e, "failed to listen for Ctrl+C");
                    return;
                }
                sweep(&registry, "Ctrl+C");
            }
        }))
    }
}

fn sweep(registry: &ProcessRegistry, signal: &str) {
    warn!(signal, "received termination signal; killing all subprocesses");
    let killed = registry.kill_all();
    info!(signal, killed, "kill sweep finished");
}
