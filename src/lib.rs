// src/lib.rs

pub mod cli;
pub mod command;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod types;

use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::command::CommandBuilder;
use crate::config::FleetFile;
use crate::config::loader::{load_and_validate, resolve_config_path};
use crate::engine::FanOut;
use crate::errors::{Result, RigError};
use crate::exec::{ProcessLauncher, ProcessRegistry, StdoutConsole, supervisor};
use crate::fs::{FileSystem, RealFileSystem};
use crate::types::Operation;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - fleet loading (fatal on any error, before anything is launched)
/// - the process registry and the SIGINT/SIGTERM supervisor
/// - the command builder and the process launcher
/// - the fan-out over every rig
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = resolve_config_path(args.config.as_deref());
    let fleet = load_and_validate(&config_path)?;
    info!(path = ?config_path, rigs = fleet.rigs.len(), "loaded fleet");

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let builder = CommandBuilder::new(fleet.settings.clone(), fs);

    if args.dry_run {
        print_dry_run(args.command, &fleet, &builder);
        return Ok(());
    }

    // One registry for the lifetime of the process, shared by the launcher
    // and the signal handlers.
    let registry = Arc::new(ProcessRegistry::new());
    let _supervisor = supervisor::install(Arc::clone(&registry))
        .context("installing SIGINT/SIGTERM handlers")?;

    let launcher = ProcessLauncher::new(Arc::clone(&registry), Arc::new(StdoutConsole));
    let fanout = FanOut::new(Arc::new(builder), Arc::new(launcher));

    let report = fanout.run(args.command, &fleet.rigs).await;

    if registry.is_shutting_down() || report.was_terminated() {
        return Err(RigError::Terminated);
    }

    report.into_result()
}

/// Dry-run output: every rig's commands and rendered settings path.
fn print_dry_run(operation: Operation, fleet: &FleetFile, builder: &CommandBuilder) {
    println!("rigdeploy dry-run: {operation}");
    println!("  settings.program = {}", builder.settings().program);
    println!(
        "  settings.build_context = {}",
        builder.settings().build_context.display()
    );
    println!();

    println!("rigs ({}):", fleet.rigs.len());
    for rig in fleet.rigs.iter() {
        println!("  - {} (backend: {}, label: {})", rig.context, rig.backend, rig.label);
        match builder.plan(operation, rig) {
            Ok(plan) => {
                if let Some(ref artifact) = plan.artifact {
                    println!("      renders: {}", artifact.path.display());
                }
                for argv in plan.commands.iter() {
                    println!("      $ {argv}");
                }
            }
            Err(e) => println!("      error: {e}"),
        }
    }

    debug!("dry-run complete (no execution)");
}
