// src/errors.rs

//! Crate-wide error type and `Result` alias.
//!
//! Fleet-level failures (`ConfigLoad`, `Io`, `Toml`, `Json`) abort the run
//! before anything is launched. The per-rig variants (`UnsupportedVariant`,
//! `ArtifactWrite`, `Spawn`) only ever end the fan-out unit of the rig they
//! name.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RigError {
    #[error("Configuration error: {0}")]
    ConfigLoad(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("rig '{rig}': unsupported backend '{backend}' (expected one of: {expected})")]
    UnsupportedVariant {
        rig: String,
        backend: String,
        expected: String,
    },

    #[error("rig '{rig}': cannot write rendered settings to {path:?}: {source}")]
    ArtifactWrite {
        rig: String,
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("rig '{rig}': failed to start `{command}`: {source}")]
    Spawn {
        rig: String,
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("rig '{rig}': unit panicked")]
    UnitPanicked { rig: String },

    #[error("interrupted by signal; all running commands were killed")]
    Terminated,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RigError {
    /// True for errors that come from reading or validating the fleet
    /// document rather than from a single rig's unit.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            RigError::ConfigLoad(_) | RigError::Io(_) | RigError::Toml(_) | RigError::Json(_)
        )
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, RigError>;
