use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;

/// The operation fanned out across every rig in the fleet.
///
/// - `Deploy`: build the image on the rig, then start it as the `miner`
///   container.
/// - `Stop`: stop the `miner` container.
/// - `Logs`: print the last few log lines of the `miner` container and keep
///   following it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Operation {
    /// Deploy miners.
    Deploy,
    /// Stop miners.
    Stop,
    /// Show miner logs.
    Logs,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operation::Deploy => "deploy",
            Operation::Stop => "stop",
            Operation::Logs => "logs",
        };
        f.write_str(s)
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "deploy" => Ok(Operation::Deploy),
            "stop" => Ok(Operation::Stop),
            "logs" => Ok(Operation::Logs),
            other => Err(format!(
                "invalid command: {other} (expected \"deploy\", \"stop\" or \"logs\")"
            )),
        }
    }
}

/// Backend a rig runs. Each backend knows how to build its own image; see
/// `BackendKind::build_step` in `command/backend.rs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// Everything is passed inline as `--build-arg`s.
    #[default]
    Rqminer,
    /// Settings are rendered into a per-rig file from a template, and the
    /// build only receives a reference to that file.
    Xmrig,
}

impl BackendKind {
    pub const ALL: [BackendKind; 2] = [BackendKind::Rqminer, BackendKind::Xmrig];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Rqminer => "rqminer",
            BackendKind::Xmrig => "xmrig",
        }
    }

    /// Comma-separated list of every accepted selector, for error messages.
    pub fn expected_list() -> String {
        Self::ALL
            .iter()
            .map(|b| b.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rqminer" => Ok(BackendKind::Rqminer),
            "xmrig" => Ok(BackendKind::Xmrig),
            other => Err(format!(
                "invalid backend: {other} (expected one of: {})",
                Self::expected_list()
            )),
        }
    }
}
