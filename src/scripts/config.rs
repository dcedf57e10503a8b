//! Type-safe arguments for system configuration commands.
//!
//! - `GenFstabArgs`: `genfstab -U <root>`, output captured and appended to fstab
//! - `TimezoneArgs`: `/etc/localtime` symlink
//! - `HwclockArgs`: hardware clock sync (non-fatal)
//! - `LocaleGenArgs`: `locale-gen`
//! - `EnableServiceArgs`: `systemctl enable <unit>`
//!
//! Everything except `genfstab` runs inside the target root.

use std::path::PathBuf;

use super::CommandArgs;
use crate::scoped_command::ScopedCommand;

/// Locale generated and selected for every install.
pub const LOCALE: &str = "en_US.UTF-8";

/// `/etc/locale.gen`
pub const LOCALE_GEN: &str = "en_US.UTF-8 UTF-8\n";

/// `/etc/locale.conf`
pub const LOCALE_CONF: &str = "LANG=en_US.UTF-8\n";

/// `/etc/sudoers.d/wheel`
pub const SUDOERS_WHEEL: &str = "%wheel ALL=(ALL:ALL) ALL\n";

/// `/etc/vconsole.conf`
pub fn vconsole_conf(keymap: &str) -> String {
    format!("KEYMAP={}\n", keymap)
}

/// `/etc/hosts` with loopback entries for `hostname`.
pub fn hosts_file(hostname: &str) -> String {
    format!(
        "127.0.0.1   localhost\n::1         localhost\n127.0.1.1   {0}.localdomain {0}\n",
        hostname
    )
}

/// `genfstab -U <root>`. Runs on the host; stdout is captured so the caller
/// can append it to `<root>/etc/fstab`.
///
/// # Example
///
/// ```
/// use std::path::PathBuf;
/// use tonarchy::scripts::CommandArgs;
/// use tonarchy::scripts::config::GenFstabArgs;
///
/// let args = GenFstabArgs { root: PathBuf::from("/mnt") };
/// assert_eq!(args.to_command().invocation().command_line(), "genfstab -U /mnt");
/// ```
#[derive(Debug, Clone)]
pub struct GenFstabArgs {
    /// Root mount path (e.g., `/mnt`) - where the target system is mounted.
    pub root: PathBuf,
}

impl CommandArgs for GenFstabArgs {
    fn to_command(&self) -> ScopedCommand {
        ScopedCommand::new("genfstab")
            .args(["-U".to_string(), self.root.display().to_string()])
            .capture_stdout()
    }

    fn failure_context(&self) -> &'static str {
        "Failed to generate fstab"
    }
}

/// Points `/etc/localtime` at the chosen zone.
#[derive(Debug, Clone)]
pub struct TimezoneArgs {
    pub root: PathBuf,
    /// IANA zone name (e.g., `Europe/Berlin`)
    pub timezone: String,
}

impl CommandArgs for TimezoneArgs {
    fn to_command(&self) -> ScopedCommand {
        ScopedCommand::new("ln")
            .args([
                "-sf".to_string(),
                format!("/usr/share/zoneinfo/{}", self.timezone),
                "/etc/localtime".to_string(),
            ])
            .in_root(&self.root)
    }

    fn failure_context(&self) -> &'static str {
        "Failed to configure timezone"
    }
}

/// `hwclock --systohc`. The pipeline treats failure as a warning.
#[derive(Debug, Clone)]
pub struct HwclockArgs {
    pub root: PathBuf,
}

impl CommandArgs for HwclockArgs {
    fn to_command(&self) -> ScopedCommand {
        ScopedCommand::new("hwclock").arg("--systohc").in_root(&self.root)
    }

    fn failure_context(&self) -> &'static str {
        "Failed to set hardware clock"
    }
}

#[derive(Debug, Clone)]
pub struct LocaleGenArgs {
    pub root: PathBuf,
}

impl CommandArgs for LocaleGenArgs {
    fn to_command(&self) -> ScopedCommand {
        ScopedCommand::new("locale-gen").in_root(&self.root)
    }

    fn failure_context(&self) -> &'static str {
        "Failed to generate locales"
    }
}

/// `systemctl enable <unit>` inside the target.
#[derive(Debug, Clone)]
pub struct EnableServiceArgs {
    pub root: PathBuf,
    pub unit: String,
    /// The display manager gets its own failure message.
    pub display_manager: bool,
}

impl EnableServiceArgs {
    pub fn service(root: impl Into<PathBuf>, unit: impl Into<String>) -> Self {
        Self { root: root.into(), unit: unit.into(), display_manager: false }
    }

    pub fn display_manager(root: impl Into<PathBuf>, unit: impl Into<String>) -> Self {
        Self { root: root.into(), unit: unit.into(), display_manager: true }
    }
}

impl CommandArgs for EnableServiceArgs {
    fn to_command(&self) -> ScopedCommand {
        ScopedCommand::new("systemctl")
            .args(["enable", self.unit.as_str()])
            .in_root(&self.root)
    }

    fn failure_context(&self) -> &'static str {
        if self.display_manager {
            "Failed to enable display manager"
        } else if self.unit == "NetworkManager" {
            "Failed to enable NetworkManager"
        } else {
            "Failed to enable service"
        }
    }
}
