//! Type-safe value types shared across the installer
//!
//! Stringly-typed tool arguments (filesystem names, GPT type codes, log level
//! tags) are modeled as enums so every spelling lives in exactly one place.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Filesystem type for partitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Filesystem {
    /// FAT32 filesystem for the EFI System Partition
    #[strum(serialize = "fat32")]
    Fat32,
    /// Linux swap signature (not a mountable filesystem)
    #[strum(serialize = "swap")]
    Swap,
    #[strum(serialize = "ext4")]
    Ext4,
}

impl Filesystem {
    /// The formatter binary and its fixed flags, without the target device.
    pub fn mkfs_command(self) -> (&'static str, &'static [&'static str]) {
        match self {
            Self::Fat32 => ("mkfs.fat", &["-F32"]),
            Self::Swap => ("mkswap", &[]),
            Self::Ext4 => ("mkfs.ext4", &["-F"]),
        }
    }
}

/// GPT partition type codes as understood by `sgdisk --typecode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
pub enum PartitionType {
    #[strum(serialize = "ef00")]
    EfiSystem,
    #[strum(serialize = "8200")]
    LinuxSwap,
    #[strum(serialize = "8300")]
    LinuxFilesystem,
}

/// Severity of an install log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display, EnumIter)]
#[strum(serialize_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}
