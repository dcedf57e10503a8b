//! Type-safe arguments for base system bootstrap, the bootloader, and host
//! power commands.

use std::path::PathBuf;

use super::CommandArgs;
use crate::scoped_command::ScopedCommand;

/// Seconds the boot menu waits before booting the default entry.
pub const BOOT_TIMEOUT_SECS: u32 = 3;

/// `/boot/loader/loader.conf`
pub fn loader_conf() -> String {
    format!(
        "default arch.conf\ntimeout {}\nconsole-mode max\neditor no\n",
        BOOT_TIMEOUT_SECS
    )
}

/// `/boot/loader/entries/arch.conf` booting `root_device`.
pub fn boot_entry(root_device: &str) -> String {
    format!(
        "title   Tonarchy\nlinux   /vmlinuz-linux\ninitrd  /initramfs-linux.img\noptions root={} rw\n",
        root_device
    )
}

/// `pacstrap -K <root> <packages...>` on the host.
#[derive(Debug, Clone)]
pub struct PacstrapArgs {
    pub root: PathBuf,
    pub packages: Vec<String>,
}

impl CommandArgs for PacstrapArgs {
    fn to_command(&self) -> ScopedCommand {
        ScopedCommand::new("pacstrap")
            .args(["-K".to_string(), self.root.display().to_string()])
            .args(self.packages.iter().cloned())
    }

    fn failure_context(&self) -> &'static str {
        "Failed to install packages"
    }
}

/// `bootctl install` inside the target. The loader files are written
/// separately by the pipeline.
#[derive(Debug, Clone)]
pub struct BootctlInstallArgs {
    pub root: PathBuf,
}

impl CommandArgs for BootctlInstallArgs {
    fn to_command(&self) -> ScopedCommand {
        ScopedCommand::new("bootctl").arg("install").in_root(&self.root)
    }

    fn failure_context(&self) -> &'static str {
        "Failed to install bootloader"
    }
}

/// `eject -m /dev/sr0` on the host. Failure is ignored.
#[derive(Debug, Clone)]
pub struct EjectArgs {
    pub device: String,
}

impl Default for EjectArgs {
    fn default() -> Self {
        Self { device: "/dev/sr0".to_string() }
    }
}

impl CommandArgs for EjectArgs {
    fn to_command(&self) -> ScopedCommand {
        ScopedCommand::new("eject").args(["-m", self.device.as_str()])
    }

    fn failure_context(&self) -> &'static str {
        "Failed to eject installation media"
    }
}

#[derive(Debug, Clone, Default)]
pub struct RebootArgs;

impl CommandArgs for RebootArgs {
    fn to_command(&self) -> ScopedCommand {
        ScopedCommand::new("reboot")
    }

    fn failure_context(&self) -> &'static str {
        "Failed to reboot"
    }
}
