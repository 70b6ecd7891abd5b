// src/config/validate.rs

use std::collections::BTreeMap;

use crate::config::duration::parse_duration;
use crate::config::model::{RawTaskConfig, RawTaskFile, TaskDefinition, TaskFile};
use crate::errors::ConfigError;
use crate::exec::TermSignal;
use crate::task::ShellTaskConfig;

type Result<T> = std::result::Result<T, ConfigError>;

impl TryFrom<RawTaskFile> for TaskFile {
    type Error = ConfigError;

    fn try_from(raw: RawTaskFile) -> Result<Self> {
        ensure_has_tasks(&raw)?;

        let mut tasks = BTreeMap::new();
        for (name, task) in raw.task {
            let definition = validate_task(&name, task)?;
            tasks.insert(name, definition);
        }
        Ok(TaskFile::new_unchecked(tasks))
    }
}

fn ensure_has_tasks(raw: &RawTaskFile) -> Result<()> {
    if raw.task.is_empty() {
        return Err(ConfigError::Invalid(
            "task file must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_task(name: &str, raw: RawTaskConfig) -> Result<TaskDefinition> {
    if raw.cmd.trim().is_empty() {
        return Err(invalid(name, "`cmd` must not be empty"));
    }

    let mut shell = ShellTaskConfig::new(raw.cmd, raw.args);
    shell.env = raw.env.map(|env| env.into_iter().collect());
    shell.working_dir = raw.working_dir;

    if let Some(signal) = raw.term_signal {
        shell.term_signal = signal
            .parse::<TermSignal>()
            .map_err(|e| invalid(name, &format!("term_signal: {e}")))?;
    }
    if let Some(delay) = raw.wait_delay {
        shell.wait_delay =
            parse_duration(&delay).map_err(|e| invalid(name, &format!("wait_delay: {e}")))?;
    }

    let timeout = raw
        .timeout
        .map(|t| parse_duration(&t))
        .transpose()
        .map_err(|e| invalid(name, &format!("timeout: {e}")))?;
    if timeout.is_some_and(|t| t.is_zero()) {
        return Err(invalid(name, "timeout: must be greater than zero"));
    }

    Ok(TaskDefinition {
        name: name.to_string(),
        shell,
        timeout,
        print_start_and_end: raw.print_start_and_end,
    })
}

fn invalid(task: &str, msg: &str) -> ConfigError {
    ConfigError::Invalid(format!("task '{task}': {msg}"))
}
