// src/command/mod.rs

//! Command construction.
//!
//! Turns an [`Operation`] and a [`Rig`] into the argument vectors to launch,
//! in order. `deploy` yields a build followed by a run; `stop` and `logs`
//! yield a single command. Every command addresses the same fixed
//! [`CONTAINER_NAME`], whatever the backend, so a later `stop` or `logs`
//! always finds what `deploy` started.
//!
//! - [`backend`] holds the per-backend build logic.
//! - [`template`] renders settings files for backends that need one.

pub mod backend;
pub mod template;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::config::model::{Rig, Settings};
use crate::errors::{Result, RigError};
use crate::fs::FileSystem;
use crate::types::Operation;

use self::backend::{base_args, resolve_backend};

/// Tag given to the built image.
pub const IMAGE_TAG: &str = "miner";

/// Name the image is started under; `stop` and `logs` address it.
pub const CONTAINER_NAME: &str = "miner";

/// How many historical lines `logs` prints before following.
pub const LOG_TAIL_LINES: u32 = 10;

/// One external command invocation: program followed by its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentVector(Vec<String>);

impl ArgumentVector {
    /// Build from a full argv (program first).
    pub fn from_parts<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(parts.into_iter().map(Into::into).collect())
    }

    pub fn program(&self) -> &str {
        self.0.first().map(String::as_str).unwrap_or_default()
    }

    pub fn args(&self) -> &[String] {
        self.0.get(1..).unwrap_or_default()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for ArgumentVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" "))
    }
}

/// A rendered settings file waiting to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsArtifact {
    pub path: PathBuf,
    pub contents: String,
}

/// Everything one rig's unit will do, without side effects applied yet.
#[derive(Debug, Clone)]
pub struct CommandPlan {
    pub commands: Vec<ArgumentVector>,
    pub artifact: Option<SettingsArtifact>,
}

/// Builds command plans for a fleet that shares one set of [`Settings`].
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    settings: Settings,
    fs: Arc<dyn FileSystem>,
}

impl CommandBuilder {
    pub fn new(settings: Settings, fs: Arc<dyn FileSystem>) -> Self {
        Self { settings, fs }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Work out the commands for `operation` on `rig` without writing
    /// anything. Used directly by `--dry-run`.
    pub fn plan(&self, operation: Operation, rig: &Rig) -> Result<CommandPlan> {
        let backend = resolve_backend(rig)?;

        let plan = match operation {
            Operation::Deploy => {
                let build = backend.build_step(rig, &self.settings, self.fs.as_ref())?;
                CommandPlan {
                    commands: vec![build.command, self.run_command(rig)],
                    artifact: build.artifact,
                }
            }
            Operation::Stop => CommandPlan {
                commands: vec![self.stop_command(rig)],
                artifact: None,
            },
            Operation::Logs => CommandPlan {
                commands: vec![self.logs_command(rig)],
                artifact: None,
            },
        };

        debug!(
            rig = %rig.context,
            %backend,
            %operation,
            commands = plan.commands.len(),
            artifact = plan.artifact.is_some(),
            "planned commands"
        );

        Ok(plan)
    }

    /// Plan, write the rendered settings file if the backend needs one, and
    /// return the commands to launch.
    pub fn build(&self, operation: Operation, rig: &Rig) -> Result<Vec<ArgumentVector>> {
        let plan = self.plan(operation, rig)?;

        if let Some(artifact) = plan.artifact {
            self.fs
                .write(&artifact.path, artifact.contents.as_bytes())
                .map_err(|source| RigError::ArtifactWrite {
                    rig: rig.context.clone(),
                    path: artifact.path.clone(),
                    source,
                })?;
            debug!(rig = %rig.context, path = ?artifact.path, "wrote rendered settings");
        }

        Ok(plan.commands)
    }

    fn run_command(&self, rig: &Rig) -> ArgumentVector {
        let mut args = base_args(&self.settings, rig);
        args.extend([
            "run".to_string(),
            "--rm".to_string(),
            "-d".to_string(),
            format!("--name={CONTAINER_NAME}"),
            IMAGE_TAG.to_string(),
        ]);
        ArgumentVector::from_parts(args)
    }

    fn stop_command(&self, rig: &Rig) -> ArgumentVector {
        let mut args = base_args(&self.settings, rig);
        args.extend(["stop".to_string(), CONTAINER_NAME.to_string()]);
        ArgumentVector::from_parts(args)
    }

    fn logs_command(&self, rig: &Rig) -> ArgumentVector {
        let mut args = base_args(&self.settings, rig);
        args.extend([
            "logs".to_string(),
            "-n".to_string(),
            LOG_TAIL_LINES.to_string(),
            "--follow".to_string(),
            CONTAINER_NAME.to_string(),
        ]);
        ArgumentVector::from_parts(args)
    }
}
