// tests/registry_race.rs

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use rigdeploy::exec::{ProcessRegistry, Registration, Terminate};

struct CountingHandle {
    id: u32,
    kills: AtomicUsize,
}

impl Terminate for CountingHandle {
    fn pid(&self) -> Option<u32> {
        Some(self.id)
    }

    fn rig(&self) -> &str {
        "race"
    }

    fn terminate(&self) -> io::Result<()> {
        self.kills.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Registrations racing a sweep are either drained by it or terminated on
/// registration; none is missed and none is killed twice.
#[test]
fn concurrent_register_and_kill_all_loses_nothing() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 200;

    for _round in 0..20 {
        let registry = Arc::new(ProcessRegistry::new());
        let barrier = Arc::new(Barrier::new(THREADS + 1));

        let workers: Vec<_> = (0..THREADS)
            .map(|t| {
                let registry = Arc::clone(&registry);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    let mut handles = Vec::with_capacity(PER_THREAD);
                    for i in 0..PER_THREAD {
                        let handle = Arc::new(CountingHandle {
                            id: (t * PER_THREAD + i) as u32,
                            kills: AtomicUsize::new(0),
                        });
                        registry.register(&handle);
                        handles.push(handle);
                    }
                    handles
                })
            })
            .collect();

        barrier.wait();
        let first_sweep = registry.kill_all();

        let handles: Vec<Arc<CountingHandle>> = workers
            .into_iter()
            .flat_map(|w| w.join().unwrap())
            .collect();

        // Anything registered after the first sweep was already terminated;
        // a second sweep must find nothing left.
        assert_eq!(registry.kill_all(), 0);
        assert!(first_sweep <= THREADS * PER_THREAD);

        for handle in handles.iter() {
            assert_eq!(
                handle.kills.load(Ordering::SeqCst),
                1,
                "handle {} was terminated the wrong number of times",
                handle.id
            );
        }
    }
}

#[test]
fn registration_outcome_reflects_sweep_state() {
    let registry = ProcessRegistry::new();
    let before = Arc::new(CountingHandle { id: 1, kills: AtomicUsize::new(0) });
    assert_eq!(registry.register(&before), Registration::Accepted);
    assert_eq!(registry.live_handles(), 1);

    assert_eq!(registry.kill_all(), 1);

    let after = Arc::new(CountingHandle { id: 2, kills: AtomicUsize::new(0) });
    assert_eq!(registry.register(&after), Registration::Rejected);
    assert_eq!(before.kills.load(Ordering::SeqCst), 1);
    assert_eq!(after.kills.load(Ordering::SeqCst), 1);
    assert_eq!(registry.live_handles(), 0);
}
