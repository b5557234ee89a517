//! Configuration loading, validation, and env substitution.
//!
//! Config files: `plume.toml`, `plume.yaml`, or `plume.json`
//! Searched in `./` then `~/.config/plume/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{config_dir, discover_and_load, load_config, parse_config},
    schema::{ChatConfig, HooksConfig, PlumeConfig, ShellHookConfigEntry},
    validate::{Diagnostic, Severity, ValidationResult},
};
