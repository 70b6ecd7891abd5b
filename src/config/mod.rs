// src/config/mod.rs

//! Task file loading for the `runtask` binary.
//!
//! The library itself is configured through the typed builders in
//! [`crate::task`]; this module maps a TOML file of `[task.<name>]` sections
//! onto those types.

pub mod duration;
pub mod loader;
pub mod model;
pub mod validate;

pub use duration::parse_duration;
pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{RawTaskConfig, RawTaskFile, TaskDefinition, TaskFile};
