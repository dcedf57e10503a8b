//! Type-safe arguments for user-space operations.
//!
//! Operations that must NOT run as root:
//! - Cloning the suckless sources (the checkout belongs to the user)
//! - Writing the user's dconf database (it lives in the user's home)
//!
//! These use privilege dropping (`sudo -u <user>`) inside the target root.
//! Building runs as root because `make install` writes to `/usr/local`.

use std::path::PathBuf;

use super::CommandArgs;
use crate::scoped_command::ScopedCommand;

/// `git clone <url> <dest>` as the user.
#[derive(Debug, Clone)]
pub struct GitCloneArgs {
    pub root: PathBuf,
    pub user: String,
    pub url: String,
    /// Destination inside the target (e.g., `/home/tony/dwm`)
    pub dest: String,
}

impl CommandArgs for GitCloneArgs {
    fn to_command(&self) -> ScopedCommand {
        ScopedCommand::new("git")
            .args(["clone", self.url.as_str(), self.dest.as_str()])
            .in_root(&self.root)
            .as_user(self.user.as_str())
    }

    fn failure_context(&self) -> &'static str {
        "Failed to clone repositories"
    }
}

/// `make -C <dir> clean install` as root inside the target.
#[derive(Debug, Clone)]
pub struct MakeInstallArgs {
    pub root: PathBuf,
    pub dir: String,
}

impl CommandArgs for MakeInstallArgs {
    fn to_command(&self) -> ScopedCommand {
        ScopedCommand::new("make")
            .args(["-C", self.dir.as_str(), "clean", "install"])
            .in_root(&self.root)
    }

    fn failure_context(&self) -> &'static str {
        "Failed to build suckless tools"
    }
}

/// `dbus-run-session dconf write <key> <value>` as the user.
///
/// The value is a GVariant literal and is passed as a single argument, so
/// quotes and spaces in it reach dconf unchanged.
#[derive(Debug, Clone)]
pub struct DconfWriteArgs {
    pub root: PathBuf,
    pub user: String,
    pub key: String,
    pub value: String,
}

impl CommandArgs for DconfWriteArgs {
    fn to_command(&self) -> ScopedCommand {
        ScopedCommand::new("dbus-run-session")
            .args(["dconf", "write", self.key.as_str(), self.value.as_str()])
            .in_root(&self.root)
            .as_user(self.user.as_str())
    }

    fn failure_context(&self) -> &'static str {
        "Failed to configure keybinds"
    }
}
