//! Type-safe command argument modules.
//!
//! Each struct here describes one privileged operation and implements
//! `CommandArgs`, which maps its fields to exactly one `ScopedCommand`. The
//! pipeline never assembles argument vectors by hand.
//!
//! - `config`: fstab, clock, locale, services
//! - `user`: account creation, passwords, ownership
//! - `user_ops`: operations that must run as the unprivileged user
//! - `system`: bootloader and host power control

pub mod config;
pub mod system;
pub mod user;
pub mod user_ops;

use crate::scoped_command::ScopedCommand;

/// Trait for typed command arguments.
///
/// # Contract
///
/// - `to_command()`: the command, including its scope (target root, user).
/// - `failure_context()`: what the operator and the log see when it fails.
pub trait CommandArgs {
    fn to_command(&self) -> ScopedCommand;

    fn failure_context(&self) -> &'static str;
}
