// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::task::ShellTaskConfig;

/// Task file as read from TOML, before validation.
///
/// ```toml
/// [task.build]
/// cmd = "/bin/sh"
/// args = ["-c", "make all"]
/// working_dir = "project"
/// env = { PATH = "/usr/bin:/bin" }
/// term_signal = "TERM"
/// wait_delay = "1s"
/// timeout = "10m"
/// print_start_and_end = true
/// ```
///
/// Only `cmd` is required.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawTaskFile {
    /// All tasks from `[task.<name>]`.
    #[serde(default)]
    pub task: BTreeMap<String, RawTaskConfig>,
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTaskConfig {
    /// Program to execute.
    pub cmd: String,

    #[serde(default)]
    pub args: Vec<String>,

    /// Replaces the whole environment of the child when present.
    #[serde(default)]
    pub env: Option<BTreeMap<String, String>>,

    #[serde(default)]
    pub working_dir: Option<PathBuf>,

    /// e.g. `"TERM"`, `"SIGKILL"`, `"9"`. Defaults to SIGTERM.
    #[serde(default)]
    pub term_signal: Option<String>,

    /// e.g. `"500ms"`. Defaults to one second; `"0s"` waits indefinitely
    /// for output to drain.
    #[serde(default)]
    pub wait_delay: Option<String>,

    /// Cancel the task after this long.
    #[serde(default)]
    pub timeout: Option<String>,

    #[serde(default)]
    pub print_start_and_end: bool,
}

/// Validated task file.
#[derive(Debug, Clone)]
pub struct TaskFile {
    tasks: BTreeMap<String, TaskDefinition>,
}

/// One validated task, ready to be turned into a `ShellTask`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDefinition {
    pub name: String,
    pub shell: ShellTaskConfig,
    pub timeout: Option<Duration>,
    pub print_start_and_end: bool,
}

impl TaskFile {
    /// Construct without validation; use `TryFrom<RawTaskFile>` instead.
    pub(crate) fn new_unchecked(tasks: BTreeMap<String, TaskDefinition>) -> Self {
        Self { tasks }
    }

    pub fn get(&self, name: &str) -> Option<&TaskDefinition> {
        self.tasks.get(name)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Tasks in name order.
    pub fn tasks(&self) -> impl Iterator<Item = &TaskDefinition> {
        self.tasks.values()
    }

    pub fn into_tasks(self) -> Vec<TaskDefinition> {
        self.tasks.into_values().collect()
    }
}
