// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running the commands built for
//! each rig, using `tokio::process::Command`, and making sure none of them
//! outlives the orchestrator.
//!
//! - [`launcher`] provides the `Launcher` trait and the production
//!   `ProcessLauncher`, which spawns a command, registers it, and streams its
//!   output. Tests replace it with a fake that records argument vectors.
//! - [`stream`] merges stdout and stderr into one prefixed console stream.
//! - [`registry`] is the process-wide list of running commands.
//! - [`supervisor`] hooks SIGINT/SIGTERM up to the registry's kill sweep.

pub mod launcher;
pub mod registry;
pub mod stream;
pub mod supervisor;

pub use launcher::{LaunchOutcome, Launcher, ProcessLauncher};
pub use registry::{ProcessRegistry, Registration, ShutdownSignal, Terminate};
pub use stream::{ConsoleSink, StdoutConsole};
