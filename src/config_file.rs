//! Runtime settings file.
//!
//! Settings cover where and how the installer runs, never what it installs:
//! the operator still answers every wizard question. Every field has a
//! default, so an empty JSON object is a valid settings file.
//!
//! ```json
//! {
//!   "target_root": "/mnt",
//!   "log_path": "/tmp/tonarchy-install.log",
//!   "message_delay_ms": 2000,
//!   "wallpaper_source": "/usr/share/wallpapers/wall1.jpg",
//!   "dry_run": false,
//!   "reboot": true
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::installer::InstallOptions;

pub const DEFAULT_TARGET_ROOT: &str = "/mnt";
pub const DEFAULT_LOG_PATH: &str = "/tmp/tonarchy-install.log";
pub const DEFAULT_MESSAGE_DELAY_MS: u64 = 2000;

fn default_target_root() -> PathBuf {
    PathBuf::from(DEFAULT_TARGET_ROOT)
}

fn default_log_path() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_PATH)
}

fn default_message_delay_ms() -> u64 {
    DEFAULT_MESSAGE_DELAY_MS
}

fn default_wallpaper_source() -> PathBuf {
    PathBuf::from(crate::profiles::wallpaper_path())
}

fn default_reboot() -> bool {
    true
}

/// Installer runtime settings, loaded from `--config` and overridden by flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallerSettings {
    /// Mount point of the new root filesystem.
    #[serde(default = "default_target_root")]
    pub target_root: PathBuf,

    #[serde(default = "default_log_path")]
    pub log_path: PathBuf,

    /// How long transient messages stay on screen.
    #[serde(default = "default_message_delay_ms")]
    pub message_delay_ms: u64,

    /// Wallpaper on the live system, copied into the new user's home.
    #[serde(default = "default_wallpaper_source")]
    pub wallpaper_source: PathBuf,

    #[serde(default)]
    pub dry_run: bool,

    /// Eject the install medium and reboot after a successful install.
    #[serde(default = "default_reboot")]
    pub reboot: bool,
}

impl Default for InstallerSettings {
    fn default() -> Self {
        Self {
            target_root: default_target_root(),
            log_path: default_log_path(),
            message_delay_ms: default_message_delay_ms(),
            wallpaper_source: default_wallpaper_source(),
            dry_run: false,
            reboot: default_reboot(),
        }
    }
}

impl InstallerSettings {
    /// Load settings from a JSON file. Missing fields take their defaults.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read settings from {:?}", path.as_ref()))?;

        let settings: Self =
            serde_json::from_str(&content).context("Failed to parse settings JSON")?;

        Ok(settings)
    }

    /// Save settings as pretty-printed JSON.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize settings to JSON")?;

        fs::write(&path, json)
            .with_context(|| format!("Failed to write settings to {:?}", path.as_ref()))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !self.target_root.is_absolute() {
            anyhow::bail!(
                "Target root must be an absolute path, got {:?}",
                self.target_root
            );
        }
        if self.target_root == Path::new("/") {
            anyhow::bail!("Target root must not be the live system root");
        }
        if self.log_path.as_os_str().is_empty() {
            anyhow::bail!("Log path must not be empty");
        }
        Ok(())
    }

    pub fn message_delay(&self) -> Duration {
        Duration::from_millis(self.message_delay_ms)
    }

    /// Options handed to the installation pipeline.
    pub fn to_install_options(&self) -> InstallOptions {
        InstallOptions {
            target_root: self.target_root.clone(),
            wallpaper_source: self.wallpaper_source.clone(),
            message_delay: self.message_delay(),
            dry_run: self.dry_run,
        }
    }
}
