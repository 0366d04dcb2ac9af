// src/config/loader.rs

use std::path::{Path, PathBuf};

use crate::config::model::{FleetFile, RawFleetFile};
use crate::errors::{Result, RigError};
use crate::fs::{FileSystem, RealFileSystem};

/// Default fleet document, looked up in the current working directory.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Document format, picked from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FleetFormat {
    Json,
    Toml,
}

impl FleetFormat {
    /// `.toml` selects TOML; anything else (including no extension) is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => FleetFormat::Toml,
            _ => FleetFormat::Json,
        }
    }
}

/// Parse a fleet document from a string without validating it.
pub fn parse_str(contents: &str, format: FleetFormat) -> Result<RawFleetFile> {
    let raw = match format {
        FleetFormat::Json => serde_json::from_str(contents)?,
        FleetFormat::Toml => toml::from_str(contents)?,
    };
    Ok(raw)
}

/// Load a fleet document from a given path and return the raw `RawFleetFile`.
///
/// This only performs deserialization; semantic checks (at least one rig,
/// unique contexts, ...) happen in [`load_and_validate`].
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawFleetFile> {
    load_from_fs(&RealFileSystem, path.as_ref())
}

/// Same as [`load_from_path`], reading through a [`FileSystem`].
pub fn load_from_fs(fs: &dyn FileSystem, path: &Path) -> Result<RawFleetFile> {
    let contents = fs
        .read_to_string(path)
        .map_err(|e| RigError::ConfigLoad(format!("cannot read fleet file {:?}: {e:#}", path)))?;
    parse_str(&contents, FleetFormat::from_path(path))
}

/// Load a fleet document from path and validate it.
///
/// Any failure here is fatal for the whole run: no rig is touched when the
/// document is malformed.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<FleetFile> {
    let raw = load_from_path(&path)?;
    FleetFile::try_from(raw)
}

/// Resolve the fleet document path from an optional CLI argument.
pub fn resolve_config_path(arg: Option<&str>) -> PathBuf {
    arg.map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn format_follows_extension() {
        assert_eq!(FleetFormat::from_path(Path::new("fleet.toml")), FleetFormat::Toml);
        assert_eq!(FleetFormat::from_path(Path::new("fleet.TOML")), FleetFormat::Toml);
        assert_eq!(FleetFormat::from_path(Path::new("config.json")), FleetFormat::Json);
        assert_eq!(FleetFormat::from_path(Path::new("fleet")), FleetFormat::Json);
    }

    #[test]
    fn json_accepts_original_key_names_and_numeric_thread_count() {
        let raw = parse_str(
            r#"{"rigs": [{"context": "a", "thread_count": 8, "label": "l",
                          "rqminer_url": "https://u", "public_id": "p"}]}"#,
            FleetFormat::Json,
        )
        .unwrap();

        let rig = &raw.rigs[0];
        assert_eq!(rig.thread_count, "8");
        assert_eq!(rig.url, "https://u");
        assert_eq!(rig.backend, "rqminer");
        assert_eq!(raw.settings.program, "docker");
    }

    #[test]
    fn toml_reads_settings_section() {
        let raw = parse_str(
            r#"
[settings]
program = "podman"
render_dir = "out"

[[rigs]]
context = "b"
thread_count = "2"
label = "x"
backend = "xmrig"
url = "stratum+tcp://pool:3333"
secret = "wallet"
"#,
            FleetFormat::Toml,
        )
        .unwrap();

        assert_eq!(raw.settings.program, "podman");
        assert_eq!(raw.settings.render_dir, PathBuf::from("out"));
        assert_eq!(raw.rigs[0].public_id, "wallet");
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let fs = MockFileSystem::new();
        let err = load_from_fs(&fs, Path::new("nope.json")).unwrap_err();
        assert!(err.is_config_error(), "got {err:?}");
    }

    #[test]
    fn default_path_when_no_argument() {
        assert_eq!(resolve_config_path(None), PathBuf::from("config.json"));
        assert_eq!(resolve_config_path(Some("f.toml")), PathBuf::from("f.toml"));
    }
}
