// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

use crate::types::Operation;

/// Command-line arguments for `rigdeploy`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "rigdeploy",
    version,
    about = "Deploy, stop, or tail the miners on every rig of a fleet.",
    long_about = None,
    after_help = "CONFIGFILE defaults to \"config.json\"."
)]
pub struct CliArgs {
    /// What to do on every rig.
    #[arg(value_enum, value_name = "COMMAND")]
    pub command: Operation,

    /// Fleet file (JSON, or TOML when it ends in `.toml`).
    ///
    /// Default: `config.json` in the current working directory.
    #[arg(value_name = "CONFIGFILE")]
    pub config: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `RIGDEPLOY_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Load the fleet and print every command, but launch nothing and
    /// write no rendered settings.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_command_and_optional_config() {
        let args = CliArgs::try_parse_from(["rigdeploy", "logs"]).unwrap();
        assert_eq!(args.command, Operation::Logs);
        assert_eq!(args.config, None);

        let args = CliArgs::try_parse_from(["rigdeploy", "deploy", "fleet.toml", "--dry-run"]).unwrap();
        assert_eq!(args.command, Operation::Deploy);
        assert_eq!(args.config.as_deref(), Some("fleet.toml"));
        assert!(args.dry_run);
    }

    #[test]
    fn unknown_command_is_a_usage_error() {
        assert!(CliArgs::try_parse_from(["rigdeploy", "restart"]).is_err());
    }

    #[test]
    fn missing_or_extra_arguments_are_usage_errors() {
        assert!(CliArgs::try_parse_from(["rigdeploy"]).is_err());
        assert!(CliArgs::try_parse_from(["rigdeploy", "stop", "a.json", "b.json"]).is_err());
    }
}
