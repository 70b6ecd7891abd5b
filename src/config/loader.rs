// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{RawTaskFile, TaskFile};
use crate::errors::ConfigError;

/// Load a task file from a given path and return the raw `RawTaskFile`.
///
/// This only performs TOML deserialization; it does **not** check values
/// (signals, durations, empty commands). Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawTaskFile, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let raw: RawTaskFile = toml::from_str(&contents)?;

    Ok(raw)
}

/// Load a task file from path and validate it into typed task definitions.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<TaskFile, ConfigError> {
    let raw = load_from_path(&path)?;
    TaskFile::try_from(raw)
}

/// Environment variable overriding the default task file location.
pub const CONFIG_ENV: &str = "RUNTASK_CONFIG";

/// Task file used when neither `--config` nor a command is given:
/// `$RUNTASK_CONFIG` if set, else `Runtask.toml` in the working directory.
pub fn default_config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV)
        .filter(|path| !path.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("Runtask.toml"))
}
