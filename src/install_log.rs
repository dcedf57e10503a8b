//! Durable, append-only installation log.
//!
//! The log is opened once by `main`, handed by reference to every component
//! that records progress, and closed once on the way out. Records are never
//! rewritten: the file is opened in append mode and every record is flushed
//! immediately so a crash mid-stage still leaves the trail on disk.
//!
//! # Record Format
//!
//! ```text
//! === Tonarchy Installation Log - Mon Oct 19 14:02:11 2026 ===
//! [14:02:11] [INFO] Tonarchy installer started
//! [14:05:40] [ERROR] Command failed (exit 1): pacstrap -K /mnt base ...
//! ```
//!
//! Every record is mirrored to `tracing`, so `--trace-file` captures the same
//! stream alongside the installer's own diagnostics.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::Stdio;

use crate::types::LogLevel;

/// Handle to the open install log.
#[derive(Debug)]
pub struct InstallLog {
    file: File,
    path: PathBuf,
}

impl InstallLog {
    /// Open (or create) the log at `path` and write the session banner.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;

        let now = chrono::Local::now();
        writeln!(
            file,
            "\n=== Tonarchy Installation Log - {} ===",
            now.format("%a %b %e %H:%M:%S %Y")
        )?;
        file.flush()?;

        tracing::debug!("Install log opened at {}", path.display());
        Ok(Self { file, path })
    }

    /// Path of the underlying file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record. Write failures are swallowed: losing a log line
    /// must never abort an installation that is otherwise progressing.
    pub fn record(&self, level: LogLevel, message: impl fmt::Display) {
        let message = message.to_string();
        match level {
            LogLevel::Debug => tracing::debug!("{}", message),
            LogLevel::Info => tracing::info!("{}", message),
            LogLevel::Warn => tracing::warn!("{}", message),
            LogLevel::Error => tracing::error!("{}", message),
        }

        let stamp = chrono::Local::now().format("%H:%M:%S");
        let mut sink = &self.file;
        let _ = writeln!(sink, "[{}] [{}] {}", stamp, level, message);
        let _ = sink.flush();
    }

    pub fn debug(&self, message: impl fmt::Display) {
        self.record(LogLevel::Debug, message);
    }

    pub fn info(&self, message: impl fmt::Display) {
        self.record(LogLevel::Info, message);
    }

    pub fn warn(&self, message: impl fmt::Display) {
        self.record(LogLevel::Warn, message);
    }

    pub fn error(&self, message: impl fmt::Display) {
        self.record(LogLevel::Error, message);
    }

    /// A writable handle for child process output, appended after the records.
    pub fn child_sink(&self) -> io::Result<Stdio> {
        Ok(Stdio::from(self.file.try_clone()?))
    }

    /// Flush and sync the log, consuming the handle.
    pub fn close(self) -> io::Result<()> {
        tracing::debug!("Closing install log {}", self.path.display());
        let mut file = self.file;
        file.flush()?;
        file.sync_all()
    }
}
