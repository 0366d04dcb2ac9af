// src/engine/fanout.rs

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{Instrument, debug, error, info};

use crate::command::CommandBuilder;
use crate::config::model::Rig;
use crate::errors::{Result, RigError};
use crate::exec::{LaunchOutcome, Launcher};
use crate::logging::unit_span;
use crate::types::Operation;

use super::{FleetReport, UnitOutcome};

/// Runs one operation across a fleet, one concurrent unit per rig.
pub struct FanOut {
    builder: Arc<CommandBuilder>,
    launcher: Arc<dyn Launcher>,
}

impl fmt::Debug for FanOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FanOut")
            .field("builder", &self.builder)
            .finish_non_exhaustive()
    }
}

impl FanOut {
    pub fn new(builder: Arc<CommandBuilder>, launcher: Arc<dyn Launcher>) -> Self {
        Self { builder, launcher }
    }

    /// Start a unit for every rig and wait until all of them are done.
    ///
    /// Failures stay inside their unit: the other units keep running and
    /// the report lists every rig's outcome.
    pub async fn run(&self, operation: Operation, rigs: &[Rig]) -> FleetReport {
        info!(%operation, rigs = rigs.len(), "starting fan-out");

        let mut units = JoinSet::new();
        let mut names = HashMap::new();

        for rig in rigs.iter().cloned() {
            let builder = Arc::clone(&self.builder);
            let launcher = Arc::clone(&self.launcher);
            let name = rig.context.clone();
            let span = unit_span(operation, &rig);

            let handle = units.spawn(
                async move { run_unit(operation, rig, &builder, launcher.as_ref()).await }
                    .instrument(span),
            );
            names.insert(handle.id(), name);
        }

        let mut report = FleetReport::default();

        while let Some(joined) = units.join_next_with_id().await {
            match joined {
                Ok((_, outcome)) => report.push(outcome),
                Err(join_err) => {
                    let rig = names.remove(&join_err.id()).unwrap_or_default();
                    error!(rig = %rig, error = %join_err, "unit panicked");
                    report.push(UnitOutcome {
                        rig: rig.clone(),
                        result: Err(RigError::UnitPanicked { rig }),
                    });
                }
            }
        }

        info!(
            %operation,
            total = report.total(),
            failed = report.failed(),
            "fan-out finished"
        );

        report
    }
}

/// One rig's pipeline: build the commands, then launch them in order.
///
/// A non-zero exit code does not stop the pipeline (the build of a `deploy`
/// is followed by its run regardless); only build, spawn, and termination
/// errors do.
async fn run_unit(
    operation: Operation,
    rig: Rig,
    builder: &CommandBuilder,
    launcher: &dyn Launcher,
) -> UnitOutcome {
    let result: Result<Vec<LaunchOutcome>> = async {
        let commands = builder.build(operation, &rig)?;
        debug!(commands = commands.len(), "unit built its commands");

        let mut launched = Vec::with_capacity(commands.len());
        for argv in commands {
            launched.push(launcher.launch(argv, &rig.context).await?);
        }
        Ok(launched)
    }
    .await;

    match &result {
        Ok(launched) => {
            debug!(launched = launched.len(), "unit finished");
        }
        Err(RigError::Terminated) => {
            info!("unit stopped by shutdown");
        }
        Err(e) => {
            error!(error = %e, "unit failed");
        }
    }

    UnitOutcome {
        rig: rig.context,
        result,
    }
}
