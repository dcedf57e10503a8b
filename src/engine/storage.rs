//! Storage Stack Engine
//!
//! Translates the target disk and target root into an ordered sequence of
//! atomic `StorageOp` operations, then each operation into exactly one
//! `ScopedCommand`.
//!
//! # Layout
//!
//! ```text
//! /dev/sdX1 - EFI System Partition (1G, FAT32, ef00)  -> <root>/boot
//! /dev/sdX2 - Swap (4G, 8200)                         -> swapon
//! /dev/sdX3 - Root (remaining space, ext4, 8300)      -> <root>
//! ```
//!
//! # Design
//!
//! - **Pure logic**: No I/O, no side effects, only generates the plan
//! - **Typed output**: Each `StorageOp` implements `CommandArgs`
//! - **Testable**: All operations are unit-tested with disk → plan assertions

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Result, TonarchyError};
use crate::hardware::TargetDisk;
use crate::scoped_command::ScopedCommand;
use crate::scripts::CommandArgs;
use crate::types::{Filesystem, PartitionType};

// ============================================================================
// Partition Layout
// ============================================================================

/// One GPT partition in the fixed layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionSpec {
    pub number: u32,
    /// `sgdisk` size suffix (`+1G`), `None` for the remainder of the disk
    pub size: Option<&'static str>,
    pub typecode: PartitionType,
    /// GPT partition name
    pub name: &'static str,
    pub filesystem: Filesystem,
}

impl PartitionSpec {
    /// `--new=N:0:SIZE --typecode=N:CODE --change-name=N:NAME`
    pub fn sgdisk_args(&self) -> [String; 3] {
        [
            format!("--new={}:0:{}", self.number, self.size.unwrap_or("0")),
            format!("--typecode={}:{}", self.number, self.typecode),
            format!("--change-name={}:{}", self.number, self.name),
        ]
    }
}

pub const EFI_PARTITION: PartitionSpec = PartitionSpec {
    number: 1,
    size: Some("+1G"),
    typecode: PartitionType::EfiSystem,
    name: "EFI",
    filesystem: Filesystem::Fat32,
};

pub const SWAP_PARTITION: PartitionSpec = PartitionSpec {
    number: 2,
    size: Some("+4G"),
    typecode: PartitionType::LinuxSwap,
    name: "swap",
    filesystem: Filesystem::Swap,
};

pub const ROOT_PARTITION: PartitionSpec = PartitionSpec {
    number: 3,
    size: None,
    typecode: PartitionType::LinuxFilesystem,
    name: "root",
    filesystem: Filesystem::Ext4,
};

/// EFI, swap, root, in partition-number order.
pub const LAYOUT: [PartitionSpec; 3] = [EFI_PARTITION, SWAP_PARTITION, ROOT_PARTITION];

// ============================================================================
// Storage Operation Types
// ============================================================================

/// A single atomic storage operation in the plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageOp {
    /// Remove every filesystem signature (wipefs -af)
    WipeSignatures { disk: String },

    /// Destroy GPT and MBR structures (sgdisk --zap-all)
    ZapPartitionTable { disk: String },

    /// Write a fresh GPT with the fixed layout
    Partition { disk: String, layout: Vec<PartitionSpec> },

    /// Create a filesystem or swap signature on a partition
    Format { device: String, filesystem: Filesystem },

    /// Mount a device at a mountpoint
    Mount { device: String, mountpoint: PathBuf },

    /// Create a mountpoint directory
    CreateDir { path: PathBuf },

    /// Activate a swap partition
    SwapOn { device: String },
}

impl CommandArgs for StorageOp {
    fn to_command(&self) -> ScopedCommand {
        match self {
            Self::WipeSignatures { disk } => ScopedCommand::new("wipefs").args(["-af", disk.as_str()]),
            Self::ZapPartitionTable { disk } => {
                ScopedCommand::new("sgdisk").args(["--zap-all", disk.as_str()])
            }
            Self::Partition { disk, layout } => {
                let mut cmd = ScopedCommand::new("sgdisk").arg("--clear");
                for spec in layout {
                    cmd = cmd.args(spec.sgdisk_args());
                }
                cmd.arg(disk.as_str())
            }
            Self::Format { device, filesystem } => {
                let (program, flags) = filesystem.mkfs_command();
                ScopedCommand::new(program).args(flags.iter().copied()).arg(device.as_str())
            }
            Self::Mount { device, mountpoint } => ScopedCommand::new("mount")
                .arg(device.as_str())
                .arg(mountpoint.display().to_string()),
            Self::CreateDir { path } => {
                ScopedCommand::new("mkdir").arg("-p").arg(path.display().to_string())
            }
            Self::SwapOn { device } => ScopedCommand::new("swapon").arg(device.as_str()),
        }
    }

    fn failure_context(&self) -> &'static str {
        match self {
            Self::WipeSignatures { .. } => "Failed to wipe disk",
            Self::ZapPartitionTable { .. } => "Failed to zap disk",
            Self::Partition { .. } => "Failed to create partitions",
            Self::Format { filesystem: Filesystem::Fat32, .. } => "Failed to format EFI partition",
            Self::Format { filesystem: Filesystem::Swap, .. } => "Failed to create swap",
            Self::Format { filesystem: Filesystem::Ext4, .. } => "Failed to format root partition",
            Self::Mount { .. } => "Failed to mount partition",
            Self::CreateDir { .. } => "Failed to create boot directory",
            Self::SwapOn { .. } => "Failed to enable swap",
        }
    }
}

impl fmt::Display for StorageOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WipeSignatures { disk } => write!(f, "WipeSignatures({})", disk),
            Self::ZapPartitionTable { disk } => write!(f, "ZapPartitionTable({})", disk),
            Self::Partition { disk, layout } => {
                write!(f, "Partition({}, {} partitions)", disk, layout.len())
            }
            Self::Format { device, filesystem } => write!(f, "Format({}, fs={})", device, filesystem),
            Self::Mount { device, mountpoint } => {
                write!(f, "Mount({} -> {})", device, mountpoint.display())
            }
            Self::CreateDir { path } => write!(f, "CreateDir({})", path.display()),
            Self::SwapOn { device } => write!(f, "SwapOn({})", device),
        }
    }
}

/// A complete storage plan: an ordered list of operations.
#[derive(Debug, Clone)]
pub struct StoragePlan {
    /// Ordered sequence of storage operations
    pub ops: Vec<StorageOp>,
    /// Target disk device path
    pub disk: String,
    /// Where the root partition is mounted
    pub target_root: PathBuf,
    /// Device path of the root partition (for the boot entry)
    pub root_device: String,
}

impl StoragePlan {
    /// Returns a summary of the plan for logging/display.
    pub fn summary(&self) -> String {
        let mut lines = vec![
            format!("Storage Plan for {}", self.disk),
            format!("  Target root: {}", self.target_root.display()),
        ];
        for spec in &LAYOUT {
            lines.push(format!(
                "  Partition {}: {} {} ({})",
                spec.number,
                spec.name,
                spec.size.map(|s| s.trim_start_matches('+')).unwrap_or("remainder"),
                spec.filesystem
            ));
        }
        lines.push(format!("  Operations ({}):", self.ops.len()));
        for (i, op) in self.ops.iter().enumerate() {
            lines.push(format!("    {}. {}", i + 1, op));
        }
        lines.join("\n")
    }
}

// ============================================================================
// Plan Calculation
// ============================================================================

/// Calculate the storage plan for wiping `disk` and mounting it at `target_root`.
///
/// # Errors
///
/// Returns a validation error if the disk name is empty or contains a path
/// separator, or the target root is not absolute.
pub fn calculate_storage_plan(disk: &TargetDisk, target_root: &Path) -> Result<StoragePlan> {
    if disk.name.is_empty() || disk.name.contains('/') {
        return Err(TonarchyError::validation(format!(
            "Invalid disk name '{}' (expected a kernel name such as sda)",
            disk.name
        )));
    }
    if !target_root.is_absolute() {
        return Err(TonarchyError::validation(format!(
            "Target root '{}' must be an absolute path",
            target_root.display()
        )));
    }

    let device = disk.device_path();
    let part = |spec: &PartitionSpec| disk.partition_path(spec.number);
    let boot = target_root.join("boot");

    let ops = vec![
        StorageOp::WipeSignatures { disk: device.clone() },
        StorageOp::ZapPartitionTable { disk: device.clone() },
        StorageOp::Partition { disk: device.clone(), layout: LAYOUT.to_vec() },
        StorageOp::Format { device: part(&EFI_PARTITION), filesystem: Filesystem::Fat32 },
        StorageOp::Format { device: part(&SWAP_PARTITION), filesystem: Filesystem::Swap },
        StorageOp::Format { device: part(&ROOT_PARTITION), filesystem: Filesystem::Ext4 },
        StorageOp::Mount { device: part(&ROOT_PARTITION), mountpoint: target_root.to_path_buf() },
        StorageOp::CreateDir { path: boot.clone() },
        StorageOp::Mount { device: part(&EFI_PARTITION), mountpoint: boot },
        StorageOp::SwapOn { device: part(&SWAP_PARTITION) },
    ];

    Ok(StoragePlan {
        ops,
        disk: device,
        target_root: target_root.to_path_buf(),
        root_device: part(&ROOT_PARTITION),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command_lines(plan: &StoragePlan) -> Vec<String> {
        plan.ops.iter().map(|op| op.to_command().invocation().command_line()).collect()
    }

    #[test]
    fn test_sda_plan_commands() {
        let plan = calculate_storage_plan(&TargetDisk::new("sda", "sda (500G)"), Path::new("/mnt")).unwrap();
        assert_eq!(
            command_lines(&plan),
            vec![
                "wipefs -af /dev/sda",
                "sgdisk --zap-all /dev/sda",
                "sgdisk --clear --new=1:0:+1G --typecode=1:ef00 --change-name=1:EFI \
                 --new=2:0:+4G --typecode=2:8200 --change-name=2:swap \
                 --new=3:0:0 --typecode=3:8300 --change-name=3:root /dev/sda",
                "mkfs.fat -F32 /dev/sda1",
                "mkswap /dev/sda2",
                "mkfs.ext4 -F /dev/sda3",
                "mount /dev/sda3 /mnt",
                "mkdir -p /mnt/boot",
                "mount /dev/sda1 /mnt/boot",
                "swapon /dev/sda2",
            ]
        );
        assert_eq!(plan.root_device, "/dev/sda3");
    }

    #[test]
    fn test_nvme_partitions_use_separator() {
        let plan =
            calculate_storage_plan(&TargetDisk::new("nvme0n1", "nvme0n1 (1T)"), Path::new("/mnt")).unwrap();
        assert_eq!(plan.root_device, "/dev/nvme0n1p3");
        assert!(plan.ops.contains(&StorageOp::SwapOn { device: "/dev/nvme0n1p2".to_string() }));
    }

    #[test]
    fn test_root_mounted_before_boot_dir() {
        let plan = calculate_storage_plan(&TargetDisk::new("vda", "vda"), Path::new("/target")).unwrap();
        let root_mount = plan
            .ops
            .iter()
            .position(|op| matches!(op, StorageOp::Mount { mountpoint, .. } if mountpoint == Path::new("/target")))
            .unwrap();
        let mkdir = plan.ops.iter().position(|op| matches!(op, StorageOp::CreateDir { .. })).unwrap();
        let boot_mount = plan
            .ops
            .iter()
            .position(|op| matches!(op, StorageOp::Mount { mountpoint, .. } if mountpoint == Path::new("/target/boot")))
            .unwrap();
        assert!(root_mount < mkdir && mkdir < boot_mount);
    }

    #[test]
    fn test_operation_ordering_wipe_first() {
        let plan = calculate_storage_plan(&TargetDisk::new("sda", "sda"), Path::new("/mnt")).unwrap();
        assert!(matches!(plan.ops[0], StorageOp::WipeSignatures { .. }));
        assert!(matches!(plan.ops.last(), Some(StorageOp::SwapOn { .. })));
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        assert!(calculate_storage_plan(&TargetDisk::new("", ""), Path::new("/mnt")).is_err());
        assert!(calculate_storage_plan(&TargetDisk::new("/dev/sda", ""), Path::new("/mnt")).is_err());
        assert!(calculate_storage_plan(&TargetDisk::new("sda", ""), Path::new("mnt")).is_err());
    }

    #[test]
    fn test_failure_contexts() {
        let fat = StorageOp::Format { device: "/dev/sda1".into(), filesystem: Filesystem::Fat32 };
        assert_eq!(fat.failure_context(), "Failed to format EFI partition");
        let swap = StorageOp::SwapOn { device: "/dev/sda2".into() };
        assert_eq!(swap.failure_context(), "Failed to enable swap");
    }

    #[test]
    fn test_plan_summary_not_empty() {
        let plan = calculate_storage_plan(&TargetDisk::new("sda", "sda"), Path::new("/mnt")).unwrap();
        let summary = plan.summary();
        assert!(summary.contains("Storage Plan for /dev/sda"));
        assert!(summary.contains("Partition 1: EFI 1G (fat32)"));
        assert!(summary.contains("Partition 3: root remainder (ext4)"));
        assert!(summary.contains("Operations (10)"));
    }
}
