// src/config/model.rs

use std::path::PathBuf;

use serde::{Deserialize, Deserializer};

use crate::types::BackendKind;

/// Fleet document as read from disk, before validation.
///
/// JSON form (the default `config.json`):
///
/// ```json
/// {
///   "rigs": [
///     {
///       "context": "rig-a",
///       "thread_count": "8",
///       "label": "basement",
///       "rqminer_url": "https://pool.example/api",
///       "public_id": "abc123"
///     }
///   ]
/// }
/// ```
///
/// TOML form:
///
/// ```toml
/// [settings]
/// program = "docker"
///
/// [[rigs]]
/// context = "rig-b"
/// thread_count = 4
/// label = "attic"
/// backend = "xmrig"
/// url = "stratum+tcp://pool.example:3333"
/// public_id = "wallet"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawFleetFile {
    /// Every rig under the top-level `rigs` key, in document order.
    pub rigs: Vec<Rig>,

    /// Optional `settings` section shared by the whole fleet.
    #[serde(default)]
    pub settings: Settings,
}

/// A validated fleet. Only constructible through `TryFrom<RawFleetFile>`
/// (see `validate.rs`) or [`FleetFile::new_unchecked`].
#[derive(Debug, Clone)]
pub struct FleetFile {
    pub rigs: Vec<Rig>,
    pub settings: Settings,
}

impl FleetFile {
    /// Build a fleet without running validation. Used by the validator once
    /// it is satisfied, and by tests that want to feed odd fleets directly
    /// into the fan-out.
    pub fn new_unchecked(rigs: Vec<Rig>, settings: Settings) -> Self {
        Self { rigs, settings }
    }
}

/// One remote execution target.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Rig {
    /// Container-runtime context name the commands run against
    /// (`docker --context=<context>`).
    pub context: String,

    /// Number of worker threads the miner should use. Numbers are accepted
    /// and kept as their decimal string.
    #[serde(deserialize_with = "string_or_number")]
    pub thread_count: String,

    /// Free-text label reported by the miner.
    pub label: String,

    /// Backend selector. Kept as the raw string: an unknown backend only
    /// fails this rig's unit, not the whole fleet.
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Backend endpoint.
    #[serde(alias = "rqminer_url")]
    pub url: String,

    /// Credential handed to the backend.
    #[serde(alias = "secret")]
    pub public_id: String,
}

fn default_backend() -> String {
    BackendKind::default().as_str().to_string()
}

/// `settings` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    /// Container-runtime executable.
    #[serde(default = "default_program")]
    pub program: String,

    /// Directory passed to `build` as the build context.
    #[serde(default = "default_build_context")]
    pub build_context: PathBuf,

    /// Template for backends that render a settings file, relative to
    /// `build_context`.
    #[serde(default = "default_template")]
    pub template: PathBuf,

    /// Where rendered settings files go, relative to `build_context`.
    #[serde(default = "default_render_dir")]
    pub render_dir: PathBuf,
}

fn default_program() -> String {
    "docker".to_string()
}

fn default_build_context() -> PathBuf {
    PathBuf::from(".")
}

fn default_template() -> PathBuf {
    PathBuf::from("xmrig.template.json")
}

fn default_render_dir() -> PathBuf {
    PathBuf::from("rendered")
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            program: default_program(),
            build_context: default_build_context(),
            template: default_template(),
            render_dir: default_render_dir(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Int(i64),
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => s,
        StringOrNumber::Int(n) => n.to_string(),
    })
}
