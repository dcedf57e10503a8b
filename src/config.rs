//! Frozen installation configuration.
//!
//! The wizard produces a `WizardConfig`, the menus add the profile and the
//! target disk, and the resulting `InstallConfig` is handed read-only to the
//! pipeline for the rest of the run. Nothing mutates it after construction.

use std::fmt;
use std::sync::Arc;

use zeroize::Zeroizing;

use crate::hardware::TargetDisk;
use crate::profiles::InstallProfile;

/// A password-like value: wiped on drop, never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(Arc<Zeroizing<String>>);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Arc::new(Zeroizing::new(value.into())))
    }

    /// The plaintext. Callers must not log or render it.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for Secret {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret([redacted])")
    }
}

/// Values collected by the wizard, all validated together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardConfig {
    pub username: String,
    /// Used for both the primary user and root.
    pub password: Secret,
    pub hostname: String,
    pub keyboard: String,
    pub timezone: String,
}

/// Everything the pipeline needs, frozen before the first privileged command.
#[derive(Debug, Clone)]
pub struct InstallConfig {
    pub wizard: WizardConfig,
    pub profile: InstallProfile,
    pub disk: TargetDisk,
}

impl InstallConfig {
    pub fn new(wizard: WizardConfig, profile: InstallProfile, disk: TargetDisk) -> Self {
        Self { wizard, profile, disk }
    }

    /// One-line description for the install log. Contains no secrets.
    pub fn summary(&self) -> String {
        format!(
            "User: {}, Hostname: {}, Timezone: {}, Keyboard: {}, Profile: {}, Disk: /dev/{}",
            self.wizard.username,
            self.wizard.hostname,
            self.wizard.timezone,
            self.wizard.keyboard,
            self.profile,
            self.disk.name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> InstallConfig {
        InstallConfig::new(
            WizardConfig {
                username: "tony".to_string(),
                password: Secret::new("hunter2"),
                hostname: "tonarchy".to_string(),
                keyboard: "us".to_string(),
                timezone: "Europe/Berlin".to_string(),
            },
            InstallProfile::Suckless,
            TargetDisk::new("sda", "sda (500G) Samsung SSD 870"),
        )
    }

    #[test]
    fn test_secret_debug_is_redacted() {
        let secret = Secret::new("hunter2");
        assert_eq!(format!("{:?}", secret), "Secret([redacted])");
        assert_eq!(secret.expose(), "hunter2");
        assert!(!secret.is_empty());
        assert!(Secret::default().is_empty());
    }

    #[test]
    fn test_config_debug_and_summary_hide_password() {
        let config = sample();
        assert!(!format!("{:?}", config).contains("hunter2"));
        let summary = config.summary();
        assert!(!summary.contains("hunter2"));
        assert!(summary.contains("User: tony"));
        assert!(summary.contains("Disk: /dev/sda"));
    }
}
