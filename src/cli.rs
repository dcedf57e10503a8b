use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config_file::InstallerSettings;
use crate::profiles::InstallProfile;

/// Tonarchy - installs Arch Linux onto a whole disk
#[derive(Parser, Debug)]
#[command(name = "tonarchy")]
#[command(about = "A terminal wizard that installs Arch Linux onto a whole disk")]
#[command(version)]
pub struct Cli {
    /// Settings file (JSON). Flags below override its values.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Dry-run mode: log every mutating command and file write instead of
    /// performing it.
    ///
    /// Read-only commands such as `lsblk` still run so the disk menu shows
    /// real disks. The root check is skipped.
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Install log location
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Mount point of the new root filesystem
    #[arg(long, value_name = "PATH")]
    pub target_root: Option<PathBuf>,

    /// Do not eject the medium or reboot after a successful install
    #[arg(long)]
    pub no_reboot: bool,

    /// Write diagnostic traces to this file (filter with RUST_LOG)
    #[arg(long, value_name = "PATH")]
    pub trace_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a settings file
    CheckConfig {
        /// Path to the settings file to validate
        file: PathBuf,
    },
    /// Print the partition plan and package list without executing anything
    PrintPlan {
        /// Disk name as shown by lsblk (e.g. sda, nvme0n1)
        #[arg(long)]
        disk: String,

        /// Installation profile
        #[arg(long, default_value = "beginner")]
        profile: InstallProfile,
    },
}

impl Cli {
    /// Apply command-line overrides on top of loaded settings.
    pub fn apply_overrides(&self, settings: &mut InstallerSettings) {
        if self.dry_run {
            settings.dry_run = true;
        }
        if let Some(path) = &self.log_file {
            settings.log_path = path.clone();
        }
        if let Some(root) = &self.target_root {
            settings.target_root = root.clone();
        }
        if self.no_reboot {
            settings.reboot = false;
        }
    }
}
