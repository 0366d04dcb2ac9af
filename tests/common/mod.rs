#![allow(dead_code)]

pub use rigdeploy_test_utils::{builders, console, fake_launcher, init_tracing, wait_until, with_timeout};

use std::sync::Arc;

use rigdeploy::command::CommandBuilder;
use rigdeploy::config::Settings;
use rigdeploy::engine::FanOut;
use rigdeploy::fs::mock::MockFileSystem;
use rigdeploy_test_utils::fake_launcher::RecordingLauncher;

/// A fan-out over a mock filesystem and a recording launcher.
pub fn fake_fanout(settings: Settings, fs: &MockFileSystem, launcher: &RecordingLauncher) -> FanOut {
    let builder = CommandBuilder::new(settings, Arc::new(fs.clone()));
    FanOut::new(Arc::new(builder), Arc::new(launcher.clone()))
}
