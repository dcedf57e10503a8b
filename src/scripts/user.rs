//! Type-safe arguments for user account commands.
//!
//! # Security: Password Handling
//!
//! Passwords are never placed in an argument vector, where they would be
//! visible in `/proc/<pid>/cmdline`. `SetPasswordArgs` sends `user:password`
//! to `chpasswd` on stdin as a `Secret`, which the executor never logs.

use std::path::PathBuf;

use super::CommandArgs;
use crate::config::Secret;
use crate::scoped_command::ScopedCommand;

/// `useradd -m -G wheel -s /bin/bash <user>` inside the target.
#[derive(Debug, Clone)]
pub struct UserAddArgs {
    pub root: PathBuf,
    pub username: String,
}

impl CommandArgs for UserAddArgs {
    fn to_command(&self) -> ScopedCommand {
        ScopedCommand::new("useradd")
            .args(["-m", "-G", "wheel", "-s", "/bin/bash", self.username.as_str()])
            .in_root(&self.root)
    }

    fn failure_context(&self) -> &'static str {
        "Failed to create user"
    }
}

/// `chpasswd` inside the target, payload on stdin.
#[derive(Clone)]
pub struct SetPasswordArgs {
    pub root: PathBuf,
    pub username: String,
    pub password: Secret,
}

impl std::fmt::Debug for SetPasswordArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SetPasswordArgs")
            .field("root", &self.root)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl CommandArgs for SetPasswordArgs {
    fn to_command(&self) -> ScopedCommand {
        let payload = Secret::new(format!("{}:{}", self.username, self.password.expose()));
        ScopedCommand::new("chpasswd").in_root(&self.root).with_secret_stdin(payload)
    }

    fn failure_context(&self) -> &'static str {
        if self.username == "root" {
            "Failed to set root password"
        } else {
            "Failed to set password"
        }
    }
}

/// `chown <user>:<user> <path>` inside the target.
#[derive(Debug, Clone)]
pub struct ChownArgs {
    pub root: PathBuf,
    pub owner: String,
    /// Path as seen from inside the target
    pub path: String,
}

impl CommandArgs for ChownArgs {
    fn to_command(&self) -> ScopedCommand {
        ScopedCommand::new("chown")
            .args([format!("{0}:{0}", self.owner), self.path.clone()])
            .in_root(&self.root)
    }

    fn failure_context(&self) -> &'static str {
        "Failed to set file owner"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_useradd() {
        let args = UserAddArgs { root: "/mnt".into(), username: "tony".into() };
        assert_eq!(
            args.to_command().invocation().command_line(),
            "arch-chroot /mnt useradd -m -G wheel -s /bin/bash tony"
        );
    }

    #[test]
    fn test_password_only_on_stdin() {
        let args = SetPasswordArgs {
            root: "/mnt".into(),
            username: "tony".into(),
            password: Secret::new("hunter2"),
        };
        let inv = args.to_command().invocation();
        assert_eq!(inv.command_line(), "arch-chroot /mnt chpasswd");
        assert_eq!(inv.stdin.map(|s| s.expose().to_string()), Some("tony:hunter2".to_string()));
        assert!(!format!("{:?}", args).contains("hunter2"));
        assert!(!args.to_command().to_string().contains("hunter2"));
    }

    #[test]
    fn test_root_password_context() {
        let args = SetPasswordArgs { root: "/mnt".into(), username: "root".into(), password: Secret::new("x") };
        assert_eq!(args.failure_context(), "Failed to set root password");
    }

    #[test]
    fn test_chown() {
        let args = ChownArgs { root: "/mnt".into(), owner: "tony".into(), path: "/home/tony/.xinitrc".into() };
        assert_eq!(
            args.to_command().invocation().command_line(),
            "arch-chroot /mnt chown tony:tony /home/tony/.xinitrc"
        );
    }
}
