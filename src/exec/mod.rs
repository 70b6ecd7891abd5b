// src/exec/mod.rs

//! Process execution layer.
//!
//! This module spawns and supervises the OS processes behind shell tasks,
//! using `tokio::process::Command`.
//!
//! - [`signal`] defines [`TermSignal`], the configurable termination signal.
//! - [`process_group`] is the platform seam for signalling a whole process
//!   tree and for describing exit statuses.
//! - [`pump`] copies child pipes into output sinks.
//! - [`task_runner`] supervises one process: exit, context cancellation,
//!   wait delay and output drain.

pub mod signal;

pub(crate) mod process_group;
pub(crate) mod pump;
pub(crate) mod task_runner;

pub use signal::TermSignal;
