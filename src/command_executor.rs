//! command_executor.rs - The single privileged execution primitive.
//!
//! `ScopedExecutor::run` is the ONLY sanctioned way to run a privileged
//! operation. It resolves a `ScopedCommand` into one child process through a
//! `ProcessRunner`, logs the attempt before it starts and the outcome after it
//! exits, and reports the exit status verbatim. It never retries and never
//! decides whether a failure is fatal; the caller does that via
//! `CommandOutput::ensure_success`.
//!
//! # Runners
//!
//! - `SystemRunner`: real child processes. Output that is not captured goes
//!   to the install log, so every tool's own chatter lands next to the
//!   records describing it.
//! - `DryRunRunner`: logs mutating commands without running them and
//!   delegates read-only ones (e.g. `lsblk`) so previews stay realistic.
//! - `RecordingRunner`: an in-memory double with scripted exit codes, used
//!   by the integration tests.

use std::collections::VecDeque;
use std::io::{self, Write};
use std::process::{Command, Stdio};

use crate::error::{Result, TonarchyError};
use crate::install_log::InstallLog;
use crate::scoped_command::{Invocation, ScopedCommand};
use crate::types::LogLevel;

/// Raw result of one child process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessExit {
    /// Exit code (None if terminated by signal).
    pub code: Option<i32>,
    /// Captured stdout, when the invocation asked for it.
    pub stdout: Option<String>,
}

impl ProcessExit {
    pub fn success() -> Self {
        Self { code: Some(0), stdout: None }
    }

    pub fn failure(code: i32) -> Self {
        Self { code: Some(code), stdout: None }
    }

    pub fn with_stdout(mut self, stdout: impl Into<String>) -> Self {
        self.stdout = Some(stdout.into());
        self
    }
}

/// Launches a resolved invocation and waits for it.
pub trait ProcessRunner {
    fn execute(&mut self, invocation: &Invocation, log: &InstallLog) -> io::Result<ProcessExit>;
}

/// Runs real child processes.
#[derive(Debug, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn execute(&mut self, invocation: &Invocation, log: &InstallLog) -> io::Result<ProcessExit> {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args).stderr(log.child_sink()?);

        if invocation.capture_stdout {
            cmd.stdout(Stdio::piped());
        } else {
            cmd.stdout(log.child_sink()?);
        }
        if invocation.stdin.is_some() {
            cmd.stdin(Stdio::piped());
        } else {
            cmd.stdin(Stdio::null());
        }

        let mut child = cmd.spawn()?;

        let mut written = Ok(());
        if let Some(ref secret) = invocation.stdin {
            if let Some(mut stdin) = child.stdin.take() {
                written = stdin
                    .write_all(secret.expose().as_bytes())
                    .and_then(|()| stdin.write_all(b"\n"));
                // Dropping stdin closes the pipe so the child sees EOF.
            }
        }

        // Reap the child even when the payload could not be delivered.
        let output = child.wait_with_output()?;
        written?;
        let stdout = invocation
            .capture_stdout
            .then(|| String::from_utf8_lossy(&output.stdout).to_string());

        Ok(ProcessExit { code: output.status.code(), stdout })
    }
}

/// Logs mutating invocations instead of running them.
#[derive(Debug, Default)]
pub struct DryRunRunner {
    inner: SystemRunner,
}

impl ProcessRunner for DryRunRunner {
    fn execute(&mut self, invocation: &Invocation, log: &InstallLog) -> io::Result<ProcessExit> {
        if invocation.read_only {
            return self.inner.execute(invocation, log);
        }
        log.info(format!("[dry-run] skipped: {}", invocation.command_line()));
        let exit = ProcessExit::success();
        Ok(if invocation.capture_stdout { exit.with_stdout("") } else { exit })
    }
}

/// In-memory runner for tests: records every invocation and answers from a
/// script of exit codes keyed by the command line prefix.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    history: Vec<String>,
    rules: Vec<(String, VecDeque<ProcessExit>)>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every invocation whose command line starts with `prefix` answers with
    /// the queued exits in order; the last one repeats.
    pub fn respond(mut self, prefix: impl Into<String>, exit: ProcessExit) -> Self {
        let prefix = prefix.into();
        match self.rules.iter_mut().find(|(p, _)| *p == prefix) {
            Some((_, queue)) => queue.push_back(exit),
            None => self.rules.push((prefix, VecDeque::from([exit]))),
        }
        self
    }

    /// Shorthand: every command starting with `prefix` exits with `code`.
    pub fn fail_on(self, prefix: impl Into<String>, code: i32) -> Self {
        self.respond(prefix, ProcessExit::failure(code))
    }

    /// Command lines seen so far, in order.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Index of the first recorded command line containing `needle`.
    pub fn position(&self, needle: &str) -> Option<usize> {
        self.history.iter().position(|line| line.contains(needle))
    }
}

impl ProcessRunner for RecordingRunner {
    fn execute(&mut self, invocation: &Invocation, _log: &InstallLog) -> io::Result<ProcessExit> {
        let line = invocation.command_line();
        self.history.push(line.clone());

        let matched = self
            .rules
            .iter_mut()
            .filter(|(prefix, _)| line.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len());

        let mut exit = match matched {
            Some((_, queue)) if queue.len() > 1 => queue.pop_front().unwrap_or_default(),
            Some((_, queue)) => queue.front().cloned().unwrap_or_default(),
            None => ProcessExit::success(),
        };
        if exit.code.is_none() && exit.stdout.is_none() {
            exit.code = Some(0);
        }
        if invocation.capture_stdout && exit.stdout.is_none() {
            exit.stdout = Some(String::new());
        }
        Ok(exit)
    }
}

/// Outcome of a scoped command, as reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// The command as logged (secrets redacted).
    pub command: String,
    /// Exit code (None if terminated by signal).
    pub exit_code: Option<i32>,
    /// Whether the command exited with status 0.
    pub success: bool,
    /// Captured stdout, if requested.
    pub stdout: Option<String>,
}

impl CommandOutput {
    /// Turn a non-zero exit into an error carrying `context`.
    pub fn ensure_success(&self, context: &str) -> Result<()> {
        if self.success {
            Ok(())
        } else {
            Err(TonarchyError::command(format!(
                "{} (exit code {}): {}",
                context,
                self.exit_code.unwrap_or(-1),
                self.command
            )))
        }
    }

    /// First line of captured stdout, trimmed.
    pub fn first_line(&self) -> Option<&str> {
        self.stdout.as_deref().and_then(|s| s.lines().next()).map(str::trim)
    }
}

/// Runs scoped commands and records every attempt in the install log.
pub struct ScopedExecutor<'a, R: ProcessRunner> {
    runner: R,
    log: &'a InstallLog,
}

impl<'a, R: ProcessRunner> ScopedExecutor<'a, R> {
    pub fn new(runner: R, log: &'a InstallLog) -> Self {
        Self { runner, log }
    }

    pub fn log(&self) -> &'a InstallLog {
        self.log
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Execute `command` exactly once.
    ///
    /// # Errors
    ///
    /// Only a failure to launch the process is an `Err`; a non-zero exit is
    /// a successful call returning `success == false`.
    pub fn run(&mut self, command: &ScopedCommand) -> Result<CommandOutput> {
        self.execute(command, LogLevel::Error)
    }

    /// Like `run`, for steps whose failure does not matter (e.g. ejecting
    /// media that may not exist). A non-zero exit is recorded at WARN.
    pub fn run_best_effort(&mut self, command: &ScopedCommand) -> Result<CommandOutput> {
        self.execute(command, LogLevel::Warn)
    }

    fn execute(&mut self, command: &ScopedCommand, failure_level: LogLevel) -> Result<CommandOutput> {
        let invocation = command.invocation();
        self.log.info(format!("Executing: {}", command));
        self.log.debug(format!("Full command: {}", invocation.command_line()));

        let exit = self.runner.execute(&invocation, self.log).map_err(|e| {
            self.log.error(format!("Failed to launch {}: {}", invocation.program, e));
            TonarchyError::Io(e)
        })?;

        let success = exit.code == Some(0);
        if success {
            self.log.debug(format!("Command succeeded: {}", command));
        } else {
            match exit.code {
                Some(code) => self
                    .log
                    .record(failure_level, format!("Command failed (exit {}): {}", code, command)),
                None => self.log.record(failure_level, format!("Command killed by signal: {}", command)),
            }
        }

        Ok(CommandOutput {
            command: command.to_string(),
            exit_code: exit.code,
            success,
            stdout: exit.stdout,
        })
    }

    /// Execute and convert a non-zero exit into an error.
    pub fn run_checked(&mut self, command: &ScopedCommand, context: &str) -> Result<CommandOutput> {
        let output = self.run(command)?;
        output.ensure_success(context)?;
        Ok(output)
    }

    /// Hand the runner back (used by tests to inspect a `RecordingRunner`).
    pub fn into_runner(self) -> R {
        self.runner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Secret;

    fn open_log(dir: &tempfile::TempDir) -> InstallLog {
        InstallLog::open(dir.path().join("install.log")).unwrap()
    }

    #[test]
    fn test_success_is_logged_before_and_after() {
        let dir = tempfile::tempdir().unwrap();
        let log = open_log(&dir);
        let mut exec = ScopedExecutor::new(RecordingRunner::new(), &log);

        let out = exec.run(&ScopedCommand::new("locale-gen").in_root("/mnt")).unwrap();
        assert!(out.success);
        assert_eq!(exec.runner().history(), ["arch-chroot /mnt locale-gen"]);

        let content = std::fs::read_to_string(log.path()).unwrap();
        assert!(content.contains("[INFO] Executing: [/mnt] locale-gen"));
        assert!(content.contains("[DEBUG] Full command: arch-chroot /mnt locale-gen"));
    }

    #[test]
    fn test_failure_is_reported_verbatim_without_retry() {
        let dir = tempfile::tempdir().unwrap();
        let log = open_log(&dir);
        let runner = RecordingRunner::new().fail_on("pacstrap", 42);
        let mut exec = ScopedExecutor::new(runner, &log);

        let out = exec.run(&ScopedCommand::new("pacstrap").args(["-K", "/mnt", "base"])).unwrap();
        assert!(!out.success);
        assert_eq!(out.exit_code, Some(42));
        assert_eq!(exec.runner().history().len(), 1);

        let err = out.ensure_success("Failed to install packages").unwrap_err();
        assert!(err.to_string().contains("exit code 42"));

        let content = std::fs::read_to_string(log.path()).unwrap();
        assert!(content.contains("[ERROR] Command failed (exit 42): pacstrap -K /mnt base"));
    }

    #[test]
    fn test_best_effort_failure_is_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        let log = open_log(&dir);
        let runner = RecordingRunner::new().fail_on("eject", 1);
        let mut exec = ScopedExecutor::new(runner, &log);

        let out = exec.run_best_effort(&ScopedCommand::new("eject").args(["-m", "/dev/sr0"])).unwrap();
        assert!(!out.success);

        let content = std::fs::read_to_string(log.path()).unwrap();
        assert!(content.contains("[WARN] Command failed (exit 1): eject -m /dev/sr0"));
        assert!(!content.contains("[ERROR]"));
    }

    #[test]
    fn test_broken_stdin_pipe_still_reaps_child() {
        let dir = tempfile::tempdir().unwrap();
        let log = open_log(&dir);
        // `true` never reads stdin; a payload larger than the pipe buffer
        // cannot be delivered.
        let payload = "x".repeat(4 * 1024 * 1024);
        let invocation = ScopedCommand::new("true").with_secret_stdin(Secret::new(payload)).invocation();

        let err = SystemRunner.execute(&invocation, &log).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_secret_never_reaches_the_log() {
        let dir = tempfile::tempdir().unwrap();
        let log = open_log(&dir);
        let mut exec = ScopedExecutor::new(RecordingRunner::new(), &log);

        exec.run(
            &ScopedCommand::new("chpasswd")
                .in_root("/mnt")
                .with_secret_stdin(Secret::new("tony:hunter2")),
        )
        .unwrap();

        let content = std::fs::read_to_string(log.path()).unwrap();
        assert!(!content.contains("hunter2"));
    }

    #[test]
    fn test_recording_runner_queues_and_captures() {
        let dir = tempfile::tempdir().unwrap();
        let log = open_log(&dir);
        let runner = RecordingRunner::new()
            .respond("lsblk", ProcessExit::success().with_stdout("sda 500G Disk\n"))
            .fail_on("git", 128)
            .respond("git", ProcessExit::success());
        let mut exec = ScopedExecutor::new(runner, &log);

        let listing = exec.run(&ScopedCommand::new("lsblk").capture_stdout()).unwrap();
        assert_eq!(listing.first_line(), Some("sda 500G Disk"));

        assert!(!exec.run(&ScopedCommand::new("git")).unwrap().success);
        assert!(exec.run(&ScopedCommand::new("git")).unwrap().success);
        assert!(exec.run(&ScopedCommand::new("git")).unwrap().success);
    }

    #[test]
    fn test_dry_run_skips_mutating_commands() {
        let dir = tempfile::tempdir().unwrap();
        let log = open_log(&dir);
        let mut exec = ScopedExecutor::new(DryRunRunner::default(), &log);

        let out = exec.run(&ScopedCommand::new("wipefs").args(["-af", "/dev/sda"])).unwrap();
        assert!(out.success);

        let content = std::fs::read_to_string(log.path()).unwrap();
        assert!(content.contains("[dry-run] skipped: wipefs -af /dev/sda"));
    }

    #[test]
    fn test_system_runner_reports_exit_status() {
        let dir = tempfile::tempdir().unwrap();
        let log = open_log(&dir);
        let mut exec = ScopedExecutor::new(SystemRunner, &log);

        let ok = exec.run(&ScopedCommand::new("sh").args(["-c", "echo hi"]).capture_stdout()).unwrap();
        assert!(ok.success);
        assert_eq!(ok.first_line(), Some("hi"));

        let failed = exec.run(&ScopedCommand::new("sh").args(["-c", "exit 3"])).unwrap();
        assert_eq!(failed.exit_code, Some(3));

        let piped = exec
            .run(
                &ScopedCommand::new("sh")
                    .args(["-c", "read line; test \"$line\" = 'tony:pw'"])
                    .with_secret_stdin(Secret::new("tony:pw")),
            )
            .unwrap();
        assert!(piped.success);

        assert!(exec.run(&ScopedCommand::new("/nonexistent/tool")).is_err());
    }
}
