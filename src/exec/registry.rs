// src/exec/registry.rs

//! Process-wide registry of running external commands.
//!
//! Every launched process is registered here before its output is read, and
//! the termination path sweeps the registry to kill whatever is still
//! running. The registry only holds `Weak` references: a handle whose owning
//! unit already finished simply fails to upgrade during the sweep.
//!
//! Append and sweep share one mutex, so a registration racing a sweep either
//! lands before it (and is drained by it) or sees `sweeping` and terminates
//! its own handle on the spot.

use std::fmt;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Something the sweep can terminate.
pub trait Terminate: Send + Sync {
    /// OS process id, if known.
    fn pid(&self) -> Option<u32>;

    /// Rig the process belongs to, for logging.
    fn rig(&self) -> &str;

    /// Request immediate termination. Must not block.
    fn terminate(&self) -> io::Result<()>;
}

/// Result of [`ProcessRegistry::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Accepted,
    /// A sweep already ran; the handle was terminated instead of stored.
    Rejected,
}

#[derive(Default)]
struct RegistryState {
    handles: Vec<Weak<dyn Terminate>>,
    sweeping: bool,
}

pub struct ProcessRegistry {
    state: Mutex<RegistryState>,
    shutdown: watch::Sender<bool>,
}

impl fmt::Debug for ProcessRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("ProcessRegistry")
            .field("handles", &state.handles.len())
            .field("sweeping", &state.sweeping)
            .finish()
    }
}

impl Default for ProcessRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessRegistry {
    pub fn new() -> Self {
        let (shutdown, _rx) = watch::channel(false);
        Self {
            state: Mutex::new(RegistryState::default()),
            shutdown,
        }
    }

    // A panic while holding the lock cannot leave the Vec half-written, so a
    // poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append `handle`. Called once per process, before its first read.
    pub fn register<T: Terminate + 'static>(&self, handle: &Arc<T>) -> Registration {
        let handle: Arc<dyn Terminate> = handle.clone();
        let mut state = self.lock();

        if state.sweeping {
            drop(state);
            debug!(
                rig = %handle.rig(),
                pid = ?handle.pid(),
                "registered after shutdown began; terminating immediately"
            );
            terminate_one(handle.as_ref());
            return Registration::Rejected;
        }

        state.handles.push(Arc::downgrade(&handle));
        Registration::Accepted
    }

    /// Kill every registered process that is still alive.
    ///
    /// Synchronous and best-effort: a failure to kill one process is logged
    /// and the sweep continues. Each handle is drained exactly once, so
    /// repeated calls never terminate a process twice. Returns the number of
    /// live handles that were sent a termination request.
    pub fn kill_all(&self) -> usize {
        let handles = {
            let mut state = self.lock();
            state.sweeping = true;
            std::mem::take(&mut state.handles)
        };
        self.shutdown.send_replace(true);

        let mut killed = 0;
        for weak in handles {
            let Some(handle) = weak.upgrade() else {
                continue;
            };
            info!(rig = %handle.rig(), pid = ?handle.pid(), "killing subprocess");
            terminate_one(handle.as_ref());
            killed += 1;
        }
        killed
    }

    /// True once [`kill_all`](Self::kill_all) has started.
    pub fn is_shutting_down(&self) -> bool {
        self.lock().sweeping
    }

    /// Number of registered handles whose process is still owned by a unit.
    pub fn live_handles(&self) -> usize {
        self.lock()
            .handles
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    /// A future-friendly view of the shutdown flag for read loops.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.shutdown.subscribe(),
        }
    }
}

fn terminate_one(handle: &dyn Terminate) {
    if let Err(e) = handle.terminate() {
        warn!(
            rig = %handle.rig(),
            pid = ?handle.pid(),
            error = %e,
            "failed to kill subprocess"
        );
    }
}

/// Resolves once the registry starts its kill sweep.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    pub async fn cancelled(&mut self) {
        if self.rx.wait_for(|down| *down).await.is_err() {
            // Registry dropped without a sweep: never fire.
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        kills: AtomicUsize,
    }

    impl Counting {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                kills: AtomicUsize::new(0),
            })
        }
    }

    impl Terminate for Counting {
        fn pid(&self) -> Option<u32> {
            None
        }

        fn rig(&self) -> &str {
            "test"
        }

        fn terminate(&self) -> io::Result<()> {
            self.kills.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Failing;

    impl Terminate for Failing {
        fn pid(&self) -> Option<u32> {
            Some(1)
        }

        fn rig(&self) -> &str {
            "broken"
        }

        fn terminate(&self) -> io::Result<()> {
            Err(io::Error::other("no such process"))
        }
    }

    #[test]
    fn kill_all_terminates_each_handle_once() {
        let registry = ProcessRegistry::new();
        let a = Counting::new();
        let b = Counting::new();
        assert_eq!(registry.register(&a), Registration::Accepted);
        assert_eq!(registry.register(&b), Registration::Accepted);

        assert_eq!(registry.kill_all(), 2);
        assert_eq!(registry.kill_all(), 0);

        assert_eq!(a.kills.load(Ordering::SeqCst), 1);
        assert_eq!(b.kills.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropped_handles_are_skipped() {
        let registry = ProcessRegistry::new();
        let kept = Counting::new();
        registry.register(&kept);
        registry.register(&Counting::new());

        assert_eq!(registry.live_handles(), 1);
        assert_eq!(registry.kill_all(), 1);
    }

    #[test]
    fn failing_kill_does_not_stop_the_sweep() {
        let registry = ProcessRegistry::new();
        let broken = Arc::new(Failing);
        let after = Counting::new();
        registry.register(&broken);
        registry.register(&after);

        assert_eq!(registry.kill_all(), 2);
        assert_eq!(after.kills.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn registering_after_sweep_terminates_immediately() {
        let registry = ProcessRegistry::new();
        registry.kill_all();

        let late = Counting::new();
        assert_eq!(registry.register(&late), Registration::Rejected);
        assert_eq!(late.kills.load(Ordering::SeqCst), 1);
        assert!(registry.is_shutting_down());
    }

    #[tokio::test]
    async fn shutdown_signal_fires_on_sweep() {
        let registry = Arc::new(ProcessRegistry::new());
        let mut signal = registry.shutdown_signal();

        let waiter = tokio::spawn(async move { signal.cancelled().await });
        registry.kill_all();

        tokio::time::timeout(std::time::Duration::from_secs(1), waiter)
            .await
            .expect("shutdown signal did not fire")
            .unwrap();
    }
}
