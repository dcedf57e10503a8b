//! Target disk discovery and preflight checks.
//!
//! Block devices are listed with `lsblk` through the scoped executor (the
//! command is read-only, so it also runs during a dry run) and parsed into
//! `TargetDisk` values for the disk menu.
//!
//! # Partition Naming
//!
//! | Disk      | Partition 1  |
//! |-----------|--------------|
//! | `sda`     | `sda1`       |
//! | `vdb`     | `vdb1`       |
//! | `nvme0n1` | `nvme0n1p1`  |
//! | `mmcblk0` | `mmcblk0p1`  |

use std::fmt;

use crate::command_executor::{ProcessRunner, ScopedExecutor};
use crate::error::{Result, TonarchyError};
use crate::scoped_command::ScopedCommand;

/// Upper bound on the number of disks offered in the menu.
pub const MAX_DISKS: usize = 32;

/// A whole block device the operator may install onto.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDisk {
    /// Kernel name without `/dev/` (e.g. `sda`, `nvme0n1`)
    pub name: String,
    /// Menu line: `<name> (<size>) <model>`
    pub description: String,
}

impl TargetDisk {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self { name: name.into(), description: description.into() }
    }

    /// `/dev/<name>`
    pub fn device_path(&self) -> String {
        format!("/dev/{}", self.name)
    }

    /// `/dev/<partition>` for partition number `number`.
    pub fn partition_path(&self, number: u32) -> String {
        format!("/dev/{}", partition_device(&self.name, number))
    }
}

impl fmt::Display for TargetDisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

/// Kernel name of partition `number` on `disk`.
///
/// Disks whose name ends in a digit take a `p` separator.
pub fn partition_device(disk: &str, number: u32) -> String {
    if disk.chars().last().is_some_and(|c| c.is_ascii_digit()) {
        format!("{}p{}", disk, number)
    } else {
        format!("{}{}", disk, number)
    }
}

/// The listing command: whole disks only, no header, loop and optical
/// devices excluded.
pub fn list_disks_command() -> ScopedCommand {
    ScopedCommand::new("lsblk")
        .args(["-d", "-n", "-o", "NAME,SIZE,MODEL", "-e", "7,11"])
        .capture_stdout()
        .read_only()
}

/// Parse `lsblk -d -n -o NAME,SIZE,MODEL` output.
///
/// The model column may be empty or contain spaces; blank lines are skipped.
pub fn parse_lsblk(output: &str) -> Vec<TargetDisk> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let name = fields.next()?;
            let size = fields.next().unwrap_or("?");
            let model = fields.collect::<Vec<_>>().join(" ");
            let description = if model.is_empty() {
                format!("{} ({})", name, size)
            } else {
                format!("{} ({}) {}", name, size, model)
            };
            Some(TargetDisk::new(name, description))
        })
        .take(MAX_DISKS)
        .collect()
}

/// List candidate disks.
///
/// # Errors
///
/// Fails if `lsblk` cannot be run, exits non-zero, or reports no disks.
pub fn detect_disks<R: ProcessRunner>(exec: &mut ScopedExecutor<'_, R>) -> Result<Vec<TargetDisk>> {
    let output = exec.run(&list_disks_command())?;
    output.ensure_success("Failed to list disks")?;

    let disks = parse_lsblk(output.stdout.as_deref().unwrap_or_default());
    if disks.is_empty() {
        return Err(TonarchyError::validation("No disks found"));
    }
    exec.log().info(format!("Detected {} disk(s)", disks.len()));
    Ok(disks)
}

/// True when running with an effective UID of 0.
pub fn is_root() -> bool {
    nix::unistd::geteuid().is_root()
}
