// src/config/validate.rs

use std::collections::HashSet;

use crate::config::model::{FleetFile, RawFleetFile};
use crate::errors::{Result, RigError};

impl TryFrom<RawFleetFile> for FleetFile {
    type Error = RigError;

    fn try_from(raw: RawFleetFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_fleet(&raw)?;
        Ok(FleetFile::new_unchecked(raw.rigs, raw.settings))
    }
}

/// Run every fleet-level check. The backend selector is deliberately not
/// checked here; an unknown backend fails only its own rig at build time.
pub fn validate_raw_fleet(fleet: &RawFleetFile) -> Result<()> {
    ensure_has_rigs(fleet)?;
    validate_rig_fields(fleet)?;
    validate_unique_contexts(fleet)?;
    validate_settings(fleet)?;
    Ok(())
}

fn ensure_has_rigs(fleet: &RawFleetFile) -> Result<()> {
    if fleet.rigs.is_empty() {
        return Err(RigError::ConfigLoad(
            "fleet must contain at least one entry under `rigs`".to_string(),
        ));
    }
    Ok(())
}

fn validate_rig_fields(fleet: &RawFleetFile) -> Result<()> {
    for (idx, rig) in fleet.rigs.iter().enumerate() {
        if rig.context.trim().is_empty() {
            return Err(RigError::ConfigLoad(format!(
                "rigs[{idx}] has an empty `context`"
            )));
        }
        if rig.context.chars().any(char::is_whitespace) {
            return Err(RigError::ConfigLoad(format!(
                "rigs[{idx}] context '{}' must not contain whitespace",
                rig.context
            )));
        }
        if rig.thread_count.trim().is_empty() {
            return Err(RigError::ConfigLoad(format!(
                "rig '{}' has an empty `thread_count`",
                rig.context
            )));
        }
    }
    Ok(())
}

// Containers and rendered settings are keyed by context, so two rigs sharing
// one would fight over the same container.
fn validate_unique_contexts(fleet: &RawFleetFile) -> Result<()> {
    let mut seen = HashSet::new();
    for rig in fleet.rigs.iter() {
        if !seen.insert(rig.context.as_str()) {
            return Err(RigError::ConfigLoad(format!(
                "context '{}' is listed more than once in `rigs`",
                rig.context
            )));
        }
    }
    Ok(())
}

fn validate_settings(fleet: &RawFleetFile) -> Result<()> {
    if fleet.settings.program.trim().is_empty() {
        return Err(RigError::ConfigLoad(
            "[settings].program must not be empty".to_string(),
        ));
    }
    Ok(())
}
