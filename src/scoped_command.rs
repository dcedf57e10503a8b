//! Typed privileged commands.
//!
//! A `ScopedCommand` is the only way the installer describes a privileged
//! operation: a program, its argument vector, and the scope it runs in. The
//! scope is resolved into exactly one child-process invocation by
//! `ScopedCommand::invocation`; nothing is ever spliced into a shell string.
//!
//! # Scope Resolution
//!
//! | Root   | User   | Invocation |
//! |--------|--------|------------|
//! | -      | -      | `program args...` |
//! | -      | `bob`  | `sudo -u bob program args...` |
//! | `/mnt` | -      | `arch-chroot /mnt program args...` |
//! | `/mnt` | `bob`  | `arch-chroot /mnt sudo -u bob program args...` |
//!
//! # Secrets
//!
//! Payloads such as `user:password` for `chpasswd` travel on stdin via
//! `with_secret_stdin`. They are excluded from `Display`/`Debug`, which is
//! what the executor logs.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::Secret;

/// Tool used to enter the target root.
pub const CHROOT_TOOL: &str = "arch-chroot";

/// A privileged operation, not yet resolved to a process.
#[derive(Clone)]
pub struct ScopedCommand {
    program: String,
    args: Vec<String>,
    root: Option<PathBuf>,
    user: Option<String>,
    stdin: Option<Secret>,
    capture_stdout: bool,
    read_only: bool,
}

impl ScopedCommand {
    /// Start building a command for `program`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            root: None,
            user: None,
            stdin: None,
            capture_stdout: false,
            read_only: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run inside the target root.
    pub fn in_root(mut self, root: impl AsRef<Path>) -> Self {
        self.root = Some(root.as_ref().to_path_buf());
        self
    }

    /// Run with the privileges of `user`.
    pub fn as_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Feed `payload` to the child's stdin. Never logged.
    pub fn with_secret_stdin(mut self, payload: Secret) -> Self {
        self.stdin = Some(payload);
        self
    }

    /// Capture stdout instead of appending it to the install log.
    pub fn capture_stdout(mut self) -> Self {
        self.capture_stdout = true;
        self
    }

    /// Mark the command as side-effect free (still executed in dry-run mode).
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Resolve the scope into a single invocation.
    pub fn invocation(&self) -> Invocation {
        let mut argv: Vec<String> = Vec::with_capacity(self.args.len() + 6);

        if let Some(ref root) = self.root {
            argv.push(CHROOT_TOOL.to_string());
            argv.push(root.display().to_string());
        }
        if let Some(ref user) = self.user {
            argv.extend(["sudo".to_string(), "-u".to_string(), user.clone()]);
        }
        argv.push(self.program.clone());
        argv.extend(self.args.iter().cloned());

        let program = argv.remove(0);
        Invocation {
            program,
            args: argv,
            stdin: self.stdin.clone(),
            capture_stdout: self.capture_stdout,
            read_only: self.read_only,
        }
    }
}

impl fmt::Display for ScopedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref root) = self.root {
            write!(f, "[{}] ", root.display())?;
        }
        if let Some(ref user) = self.user {
            write!(f, "({}) ", user)?;
        }
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        if self.stdin.is_some() {
            write!(f, " <<< [redacted]")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ScopedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScopedCommand({})", self)
    }
}

/// A fully resolved child-process invocation.
#[derive(Clone)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub stdin: Option<Secret>,
    pub capture_stdout: bool,
    pub read_only: bool,
}

impl Invocation {
    /// `program args...` on one line, secrets excluded.
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("stdin", &self.stdin.as_ref().map(|_| "[redacted]"))
            .field("capture_stdout", &self.capture_stdout)
            .field("read_only", &self.read_only)
            .finish()
    }
}
