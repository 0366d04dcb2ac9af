// src/config/mod.rs

//! Fleet document loading and validation.
//!
//! Responsibilities:
//! - Define the serde-backed data model (`model.rs`).
//! - Load a JSON or TOML fleet document from disk (`loader.rs`).
//! - Validate fleet-level invariants (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{DEFAULT_CONFIG_FILE, load_and_validate, load_from_path};
pub use model::{FleetFile, RawFleetFile, Rig, Settings};
pub use validate::validate_raw_fleet;
