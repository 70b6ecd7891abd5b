#![allow(dead_code)]

use std::collections::BTreeMap;

use runtask::config::{RawTaskConfig, RawTaskFile, TaskFile};

/// Builder for `TaskFile` to simplify test setup.
#[derive(Default)]
pub struct TaskFileBuilder {
    file: RawTaskFile,
}

impl TaskFileBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_task(mut self, name: &str, task: RawTaskConfig) -> Self {
        self.file.task.insert(name.to_string(), task);
        self
    }

    pub fn raw(self) -> RawTaskFile {
        self.file
    }

    pub fn build(self) -> TaskFile {
        TaskFile::try_from(self.file).expect("Failed to build valid task file from builder")
    }
}

/// Builder for `RawTaskConfig`.
pub struct RawTaskBuilder {
    task: RawTaskConfig,
}

impl RawTaskBuilder {
    pub fn new(cmd: &str) -> Self {
        Self {
            task: RawTaskConfig {
                cmd: cmd.to_string(),
                args: vec![],
                env: None,
                working_dir: None,
                term_signal: None,
                wait_delay: None,
                timeout: None,
                print_start_and_end: false,
            },
        }
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.task.args.push(arg.to_string());
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.task
            .env
            .get_or_insert_with(BTreeMap::new)
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn working_dir(mut self, dir: &str) -> Self {
        self.task.working_dir = Some(dir.into());
        self
    }

    pub fn term_signal(mut self, signal: &str) -> Self {
        self.task.term_signal = Some(signal.to_string());
        self
    }

    pub fn wait_delay(mut self, delay: &str) -> Self {
        self.task.wait_delay = Some(delay.to_string());
        self
    }

    pub fn timeout(mut self, timeout: &str) -> Self {
        self.task.timeout = Some(timeout.to_string());
        self
    }

    pub fn print_start_and_end(mut self, val: bool) -> Self {
        self.task.print_start_and_end = val;
        self
    }

    pub fn build(self) -> RawTaskConfig {
        self.task
    }
}
