// tests/cli_resolve.rs

use std::io::Write;
use std::time::Duration;

use clap::Parser;
use runtask::cli::CliArgs;
use runtask::exec::TermSignal;
use runtask::resolve_tasks;
use tempfile::NamedTempFile;

fn parse(args: &[&str]) -> CliArgs {
    CliArgs::try_parse_from(std::iter::once("runtask").chain(args.iter().copied())).unwrap()
}

fn task_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[task.lint]
cmd = "cargo"
args = ["clippy"]
timeout = "1m"

[task.test]
cmd = "cargo"
args = ["test"]
term_signal = "INT"
"#
    )
    .unwrap();
    file
}

#[test]
fn command_after_double_dash_becomes_a_single_task() {
    let args = parse(&["--timeout", "5s", "--", "sleep", "10"]);

    let tasks = resolve_tasks(&args).unwrap();

    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].name, "sleep");
    assert_eq!(tasks[0].shell.command, "sleep");
    assert_eq!(tasks[0].shell.args, vec!["10"]);
    assert_eq!(tasks[0].timeout, Some(Duration::from_secs(5)));
}

#[test]
fn all_tasks_from_file_when_no_task_selected() {
    let file = task_file();
    let path = file.path().to_string_lossy().into_owned();
    let args = parse(&["--config", &path]);

    let tasks = resolve_tasks(&args).unwrap();

    let names: Vec<_> = tasks.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["lint", "test"]);
    assert_eq!(tasks[0].timeout, Some(Duration::from_secs(60)));
    assert_eq!(tasks[1].shell.term_signal, TermSignal::Interrupt);
}

#[test]
fn cli_flags_override_file_values() {
    let file = task_file();
    let path = file.path().to_string_lossy().into_owned();
    let args = parse(&[
        "--config",
        &path,
        "--task",
        "test",
        "--term-signal",
        "KILL",
        "--wait-delay",
        "50ms",
        "--print-start-end",
    ]);

    let tasks = resolve_tasks(&args).unwrap();

    assert_eq!(tasks.len(), 1);
    let test = &tasks[0];
    assert_eq!(test.name, "test");
    assert_eq!(test.shell.term_signal, TermSignal::Kill);
    assert_eq!(test.shell.wait_delay, Duration::from_millis(50));
    assert!(test.print_start_and_end);
}

#[test]
fn unknown_task_is_an_error() {
    let file = task_file();
    let path = file.path().to_string_lossy().into_owned();
    let args = parse(&["--config", &path, "--task", "deploy"]);

    let err = resolve_tasks(&args).unwrap_err();
    assert!(err.to_string().contains("task 'deploy' not found"), "{err}");
}

#[test]
fn invalid_override_is_an_error() {
    let args = parse(&["--term-signal", "BOGUS", "--", "true"]);

    let err = resolve_tasks(&args).unwrap_err();
    assert!(format!("{err:#}").contains("invalid signal"), "{err:#}");
}
