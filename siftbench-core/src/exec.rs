//! Synchronous Command Execution
//!
//! Runs one command to completion in-process, capturing its standard
//! output. Used by [`ResultWriter::execute`] when no pool is supplied.
//!
//! [`ResultWriter::execute`]: crate::ResultWriter::execute

use crate::context::{REPORT_ENV_MARKER, ReportContext};
use crate::pool::{ExecOptions, Job};
use std::io::{BufRead, BufReader, Write};
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::debug;

/// Errors raised while running a command synchronously
#[derive(Debug, Error)]
pub enum ExecError {
    /// Nothing to run
    #[error("empty command")]
    EmptyCommand,

    /// The process could not be started
    #[error("failed to spawn {program:?}: {source}")]
    Spawn {
        /// Program that failed to start
        program: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// Reading the child's output or waiting for it failed
    #[error("I/O error while running command: {0}")]
    Io(#[from] std::io::Error),
}

/// Run `command` to completion, capturing stdout.
///
/// The child runs with `SIFT_REPORT=1` plus the given environment entries.
/// With `options.teeout` set, captured lines are echoed to the invoking
/// terminal as they arrive and the returned job carries the tee flag.
/// The command's exit status does not affect reporting: once a job
/// completes, its metadata is written unconditionally.
pub fn run_command(
    _ctx: &ReportContext,
    command: &[String],
    env: &[(String, String)],
    options: &ExecOptions,
) -> Result<Job, ExecError> {
    let (program, args) = command.split_first().ok_or(ExecError::EmptyCommand)?;

    let mut cmd = Command::new(program);
    cmd.args(args)
        .env(REPORT_ENV_MARKER, "1")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit());
    for (key, value) in env.iter().chain(options.env.iter()) {
        cmd.env(key, value);
    }
    if let Some(cwd) = &options.cwd {
        cmd.current_dir(cwd);
    }

    let mut child = cmd.spawn().map_err(|source| ExecError::Spawn {
        program: program.clone(),
        source,
    })?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| std::io::Error::other("child stdout was not captured"))?;

    let mut captured = String::new();
    let reader = BufReader::new(stdout);
    for line in reader.lines() {
        let line = line?;
        if options.teeout {
            let mut out = std::io::stdout().lock();
            writeln!(out, "{}", line)?;
        }
        captured.push_str(&line);
        captured.push('\n');
    }

    let status = child.wait()?;
    debug!(%status, command = %program, "command finished");

    Ok(Job {
        outfile: None,
        stdout: Some(captured),
        teeout: options.teeout,
        annotation: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_ctx() -> ReportContext {
        ReportContext::new("/tmp/siftbench-test")
    }

    #[test]
    fn captures_stdout() {
        let command = vec![
            "sh".to_string(),
            "-c".to_string(),
            "printf 'one\\ntwo\\n'".to_string(),
        ];
        let job = run_command(&test_ctx(), &command, &[], &ExecOptions::default()).unwrap();

        assert_eq!(job.stdout.as_deref(), Some("one\ntwo\n"));
        assert!(!job.teeout);
        assert!(job.outfile.is_none());
    }

    #[test]
    fn marker_is_present_in_child_environment() {
        let command = vec![
            "sh".to_string(),
            "-c".to_string(),
            "printf '%s' \"$SIFT_REPORT\"".to_string(),
        ];
        let job = run_command(&test_ctx(), &command, &[], &ExecOptions::default()).unwrap();
        assert_eq!(job.stdout.as_deref(), Some("1"));
    }

    #[test]
    fn extra_env_is_forwarded() {
        let command = vec![
            "sh".to_string(),
            "-c".to_string(),
            "printf '%s' \"$SIFT_EXTRA\"".to_string(),
        ];
        let env = vec![("SIFT_EXTRA".to_string(), "forwarded".to_string())];
        let job = run_command(&test_ctx(), &command, &env, &ExecOptions::default()).unwrap();
        assert_eq!(job.stdout.as_deref(), Some("forwarded"));
    }

    #[test]
    fn empty_command_is_rejected() {
        let err = run_command(&test_ctx(), &[], &[], &ExecOptions::default()).unwrap_err();
        assert!(matches!(err, ExecError::EmptyCommand));
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let command = vec!["siftbench-no-such-program".to_string()];
        let err = run_command(&test_ctx(), &command, &[], &ExecOptions::default()).unwrap_err();
        assert!(matches!(err, ExecError::Spawn { .. }));
    }

    #[test]
    fn nonzero_exit_still_yields_a_job() {
        let command = vec![
            "sh".to_string(),
            "-c".to_string(),
            "printf 'partial\\n'; exit 3".to_string(),
        ];
        let job = run_command(&test_ctx(), &command, &[], &ExecOptions::default()).unwrap();
        assert_eq!(job.stdout.as_deref(), Some("partial\n"));
    }
}
