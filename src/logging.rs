// src/logging.rs

//! Diagnostics for `rigdeploy`: a `tracing-subscriber` on stderr plus the
//! span every rig's unit runs inside.
//!
//! The filter comes from, in order:
//! 1. the `--log-level` flag;
//! 2. `RIGDEPLOY_LOG`, either a bare level (`debug`, `warning`) or full
//!    `EnvFilter` directives (`rigdeploy::exec=trace,info`);
//! 3. `info`.
//!
//! stdout is reserved for the prefixed output of the rigs' commands.

use anyhow::Result;
use tracing::{Level, Span, info_span};
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;
use crate::config::model::Rig;
use crate::types::Operation;

/// Environment variable consulted when `--log-level` is absent.
pub const LOG_ENV_VAR: &str = "RIGDEPLOY_LOG";

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env_value = std::env::var(LOG_ENV_VAR).ok();
    let filter = build_filter(cli_level, env_value.as_deref());

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))?;

    Ok(())
}

/// Span wrapping one rig's unit; every event inside carries the rig's
/// context and backend.
pub fn unit_span(operation: Operation, rig: &Rig) -> Span {
    info_span!(
        "unit",
        %operation,
        rig = %rig.context,
        backend = %rig.backend,
    )
}

fn build_filter(cli_level: Option<LogLevel>, env_value: Option<&str>) -> EnvFilter {
    if let Some(lvl) = cli_level {
        return level_filter(level_from_log_level(lvl));
    }

    match env_value.map(str::trim).filter(|s| !s.is_empty()) {
        Some(value) => match parse_level_str(value) {
            Some(level) => level_filter(level),
            None => EnvFilter::try_new(value).unwrap_or_else(|_| level_filter(Level::INFO)),
        },
        None => level_filter(Level::INFO),
    }
}

fn level_filter(level: Level) -> EnvFilter {
    EnvFilter::new(level.as_str().to_lowercase())
}

fn level_from_log_level(lvl: LogLevel) -> Level {
    match lvl {
        LogLevel::Error => Level::ERROR,
        LogLevel::Warn => Level::WARN,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Trace => Level::TRACE,
    }
}

fn parse_level_str(s: &str) -> Option<Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn level_strings_are_lenient() {
        assert_eq!(parse_level_str(" Warning "), Some(Level::WARN));
        assert_eq!(parse_level_str("TRACE"), Some(Level::TRACE));
        assert_eq!(parse_level_str("loud"), None);
    }

    #[test]
    fn flag_beats_environment() {
        let filter = build_filter(Some(LogLevel::Error), Some("trace"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::ERROR));
    }

    #[test]
    fn environment_accepts_levels_and_directives() {
        let filter = build_filter(None, Some("warning"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));

        let filter = build_filter(None, Some("rigdeploy::exec=trace,warn"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::TRACE));
    }

    #[test]
    fn unusable_environment_falls_back_to_info() {
        assert_eq!(build_filter(None, None).max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(
            build_filter(None, Some("rigdeploy=loud")).max_level_hint(),
            Some(LevelFilter::INFO)
        );
    }
}
