use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rigdeploy::command::ArgumentVector;
use rigdeploy::errors::{Result, RigError};
use rigdeploy::exec::{LaunchOutcome, Launcher};

/// A fake launcher that:
/// - records every `(rig, argv)` it was asked to launch
/// - reports exit code 0 immediately, or after `delay`
/// - fails with a spawn error for rigs listed in `failing_rigs`.
#[derive(Debug, Clone, Default)]
pub struct RecordingLauncher {
    launched: Arc<Mutex<Vec<(String, ArgumentVector)>>>,
    failing_rigs: Arc<Mutex<HashSet<String>>>,
    delay: Option<Duration>,
}

impl RecordingLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fail_spawn_for(self, rig: &str) -> Self {
        self.failing_rigs.lock().unwrap().insert(rig.to_string());
        self
    }

    pub fn launched(&self) -> Vec<(String, ArgumentVector)> {
        self.launched.lock().unwrap().clone()
    }

    pub fn launched_for(&self, rig: &str) -> Vec<ArgumentVector> {
        self.launched()
            .into_iter()
            .filter(|(r, _)| r == rig)
            .map(|(_, argv)| argv)
            .collect()
    }

    pub fn launch_count(&self) -> usize {
        self.launched.lock().unwrap().len()
    }
}

impl Launcher for RecordingLauncher {
    fn launch<'a>(
        &'a self,
        argv: ArgumentVector,
        rig: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<LaunchOutcome>> + Send + 'a>> {
        Box::pin(async move {
            if self.failing_rigs.lock().unwrap().contains(rig) {
                return Err(RigError::Spawn {
                    rig: rig.to_string(),
                    command: argv.to_string(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "fake spawn failure"),
                });
            }

            self.launched
                .lock()
                .unwrap()
                .push((rig.to_string(), argv.clone()));

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            Ok(LaunchOutcome {
                pid: None,
                command: argv.to_string(),
                exit_code: Some(0),
            })
        })
    }
}
