// src/engine/mod.rs

//! Fan-out engine for rigdeploy.
//!
//! One unit of work per rig: build the rig's commands, then launch them one
//! after another. Units run concurrently and independently; a failing rig
//! never cancels its siblings, because one rig failing says nothing about
//! the others. [`FleetReport`] collects every unit's outcome in completion
//! order.

pub mod fanout;

pub use fanout::FanOut;

use crate::errors::{Result, RigError};
use crate::exec::LaunchOutcome;

/// Canonical rig name type used throughout the engine (the rig's context).
pub type RigName = String;

/// Terminal state of one rig's unit.
#[derive(Debug)]
pub struct UnitOutcome {
    pub rig: RigName,
    pub result: Result<Vec<LaunchOutcome>>,
}

impl UnitOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Every unit's outcome, in the order the units finished.
#[derive(Debug, Default)]
pub struct FleetReport {
    pub outcomes: Vec<UnitOutcome>,
}

impl FleetReport {
    pub fn push(&mut self, outcome: UnitOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_success()).count()
    }

    /// Number of commands that were launched and ran to exit, across rigs.
    pub fn launched(&self) -> usize {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .map(Vec::len)
            .sum()
    }

    pub fn outcome_for(&self, rig: &str) -> Option<&UnitOutcome> {
        self.outcomes.iter().find(|o| o.rig == rig)
    }

    /// `Ok` if every unit succeeded, otherwise the first error to be
    /// reported.
    pub fn into_result(self) -> Result<()> {
        match self.outcomes.into_iter().find_map(|o| o.result.err()) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// True if any unit ended because of the kill sweep.
    pub fn was_terminated(&self) -> bool {
        self.outcomes
            .iter()
            .any(|o| matches!(o.result, Err(RigError::Terminated)))
    }
}
