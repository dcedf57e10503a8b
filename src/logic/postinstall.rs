//! Post-install orchestration
//!
//! Handles the desktop setup that runs AFTER the system is bootable:
//! - Beginner: wallpaper and Cinnamon keybindings via dconf
//! - Suckless: dwm/st/dmenu from source, dotfiles, tty1 autologin
//!
//! # Failure Policy
//!
//! All operations in this module are **non-fatal**. A missing wallpaper or
//! a failed `make` never bricks the installation. Failures are logged as
//! warnings and returned to the caller, which shows them and still reports
//! the installation as complete.
//!
//! # Privilege Dropping
//!
//! Clones and dconf writes run as the target user; builds run as root.

use std::fmt;
use std::path::PathBuf;

use crate::command_executor::{ProcessRunner, ScopedExecutor};
use crate::error::Result;
use crate::profiles::{self, InstallProfile, SUCKLESS_DOTFILES, SUCKLESS_REPOS, WALLPAPER_DIR};
use crate::scripts::user::ChownArgs;
use crate::scripts::user_ops::{DconfWriteArgs, GitCloneArgs, MakeInstallArgs};
use crate::scripts::CommandArgs;
use crate::target_files::TargetFiles;

/// Drop-in directory for the tty1 getty override.
pub const AUTOLOGIN_DIR: &str = "/etc/systemd/system/getty@tty1.service.d";
pub const AUTOLOGIN_FILE: &str = "autologin.conf";

// ============================================================================
// Post-install Result
// ============================================================================

/// Outcome of post-install operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostInstallResult {
    /// All post-install operations succeeded.
    Success,
    /// Some operations failed; each entry is a warning for the operator.
    PartialSuccess(Vec<String>),
    /// The profile has no post-install step.
    Skipped,
}

impl PostInstallResult {
    pub fn warnings(&self) -> &[String] {
        match self {
            Self::PartialSuccess(warnings) => warnings,
            Self::Success | Self::Skipped => &[],
        }
    }
}

impl fmt::Display for PostInstallResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "All post-install operations succeeded"),
            Self::PartialSuccess(warnings) => {
                write!(f, "Post-install completed with {} warning(s)", warnings.len())
            }
            Self::Skipped => write!(f, "No post-install operations to run"),
        }
    }
}

// ============================================================================
// Post-install Configuration
// ============================================================================

/// Configuration for post-install operations.
#[derive(Debug, Clone)]
pub struct PostInstallConfig {
    pub profile: InstallProfile,
    /// Target user owning the desktop configuration.
    pub target_user: String,
    /// Chroot root path (e.g., `/mnt`).
    pub chroot_path: PathBuf,
    /// Wallpaper on the live system, copied into the target.
    pub wallpaper_source: PathBuf,
}

// ============================================================================
// Shared
// ============================================================================

/// Copy the wallpaper into the target.
///
/// **NON-FATAL**: a desktop without a wallpaper is still a desktop.
fn install_wallpaper(config: &PostInstallConfig, files: &TargetFiles<'_>) -> Result<()> {
    files.create_dir(WALLPAPER_DIR, 0o755)?;
    files.copy_from_host(&config.wallpaper_source, &profiles::wallpaper_path())
}

fn run_step<R: ProcessRunner>(exec: &mut ScopedExecutor<'_, R>, args: &impl CommandArgs) -> Result<()> {
    exec.run_checked(&args.to_command(), args.failure_context()).map(|_| ())
}

// ============================================================================
// Beginner (Cinnamon)
// ============================================================================

/// Write every Cinnamon setting with `dconf` as the user.
///
/// Stops at the first failed write; earlier keys stay applied.
pub fn configure_cinnamon<R: ProcessRunner>(
    config: &PostInstallConfig,
    exec: &mut ScopedExecutor<'_, R>,
) -> Result<()> {
    exec.log().info(format!("Configuring Cinnamon for user {}", config.target_user));
    for (key, value) in profiles::cinnamon_settings() {
        let args = DconfWriteArgs {
            root: config.chroot_path.clone(),
            user: config.target_user.clone(),
            key,
            value,
        };
        run_step(exec, &args)?;
    }
    Ok(())
}

// ============================================================================
// Suckless
// ============================================================================

/// Clone and build dwm, st and dmenu, in that order.
pub fn install_suckless_tools<R: ProcessRunner>(
    config: &PostInstallConfig,
    exec: &mut ScopedExecutor<'_, R>,
) -> Result<()> {
    exec.log().info(format!(
        "Starting suckless tools installation for user: {}",
        config.target_user
    ));
    for repo in SUCKLESS_REPOS {
        let dest = repo.checkout_dir(&config.target_user);
        run_step(
            exec,
            &GitCloneArgs {
                root: config.chroot_path.clone(),
                user: config.target_user.clone(),
                url: repo.url.to_string(),
                dest: dest.clone(),
            },
        )?;
        run_step(exec, &MakeInstallArgs { root: config.chroot_path.clone(), dir: dest })?;
        exec.log().info(format!("Built {}", repo.name));
    }
    Ok(())
}

/// `.xinitrc` and `.bash_profile`, owned by the user.
pub fn write_dotfiles<R: ProcessRunner>(
    config: &PostInstallConfig,
    exec: &mut ScopedExecutor<'_, R>,
    files: &TargetFiles<'_>,
) -> Result<()> {
    for dotfile in SUCKLESS_DOTFILES {
        let inner = format!("/home/{}/{}", config.target_user, dotfile.name);
        exec.log().info(format!("Creating dotfile {} for user {}", dotfile.name, config.target_user));
        files.write_with_mode(&inner, dotfile.contents, dotfile.mode)?;
        run_step(
            exec,
            &ChownArgs {
                root: config.chroot_path.clone(),
                owner: config.target_user.clone(),
                path: inner,
            },
        )?;
    }
    Ok(())
}

/// getty drop-in that logs the user in on tty1.
pub fn setup_autologin(config: &PostInstallConfig, files: &TargetFiles<'_>) -> Result<()> {
    files.create_dir(AUTOLOGIN_DIR, 0o755)?;
    files.write(
        &format!("{}/{}", AUTOLOGIN_DIR, AUTOLOGIN_FILE),
        &profiles::autologin_override(&config.target_user),
    )
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Run the post-install operations for the profile with fail-safe behavior.
///
/// # Returns
///
/// - `PostInstallResult::Success`: everything succeeded
/// - `PostInstallResult::PartialSuccess(warnings)`: something failed
/// - `PostInstallResult::Skipped`: the profile has nothing to configure
pub fn run_postinstall<R: ProcessRunner>(
    config: &PostInstallConfig,
    exec: &mut ScopedExecutor<'_, R>,
    files: &TargetFiles<'_>,
) -> PostInstallResult {
    let log = exec.log();
    let mut warnings: Vec<String> = Vec::new();
    let mut warn = |msg: String| {
        log.warn(&msg);
        warnings.push(msg);
    };

    match config.profile {
        InstallProfile::Beginner => {
            if let Err(e) = install_wallpaper(config, files) {
                warn(format!("Failed to install wallpaper: {}", e));
            }
            if let Err(e) = configure_cinnamon(config, exec) {
                warn(format!("Failed to configure keybinds (can be done manually): {}", e));
            }
        }
        InstallProfile::Suckless => {
            // Later steps depend on the earlier ones, so the first failure ends the step.
            let result = install_suckless_tools(config, exec).and_then(|()| {
                if let Err(e) = install_wallpaper(config, files) {
                    warn(format!("Failed to install wallpaper: {}", e));
                }
                write_dotfiles(config, exec, files)?;
                setup_autologin(config, files)
            });
            if let Err(e) = result {
                warn(format!("Failed to install suckless tools: {}", e));
            }
        }
        InstallProfile::Expert => return PostInstallResult::Skipped,
    }

    if warnings.is_empty() {
        log.info(format!("{} post-install completed successfully", config.profile));
        PostInstallResult::Success
    } else {
        PostInstallResult::PartialSuccess(warnings)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command_executor::RecordingRunner;
    use crate::install_log::InstallLog;
    use std::fs;

    struct Fixture {
        dir: tempfile::TempDir,
        log: InstallLog,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let log = InstallLog::open(dir.path().join("install.log")).unwrap();
            fs::create_dir_all(dir.path().join("root/home/tony")).unwrap();
            fs::write(dir.path().join("wall1.jpg"), b"jpeg").unwrap();
            Self { dir, log }
        }

        fn config(&self, profile: InstallProfile) -> PostInstallConfig {
            PostInstallConfig {
                profile,
                target_user: "tony".to_string(),
                chroot_path: self.dir.path().join("root"),
                wallpaper_source: self.dir.path().join("wall1.jpg"),
            }
        }

        fn files(&self) -> TargetFiles<'_> {
            TargetFiles::new(self.dir.path().join("root"), &self.log)
        }
    }

    #[test]
    fn test_beginner_writes_every_setting_as_user() {
        let fx = Fixture::new();
        let mut exec = ScopedExecutor::new(RecordingRunner::new(), &fx.log);
        let result = run_postinstall(&fx.config(InstallProfile::Beginner), &mut exec, &fx.files());
        assert_eq!(result, PostInstallResult::Success);

        let history = exec.runner().history();
        assert_eq!(history.len(), profiles::cinnamon_settings().len());
        assert!(history.iter().all(|l| l.contains("sudo -u tony dbus-run-session dconf write")));
        assert!(fx.dir.path().join("root/usr/share/wallpapers/wall1.jpg").exists());
    }

    #[test]
    fn test_suckless_clones_builds_and_configures() {
        let fx = Fixture::new();
        let mut exec = ScopedExecutor::new(RecordingRunner::new(), &fx.log);
        let result = run_postinstall(&fx.config(InstallProfile::Suckless), &mut exec, &fx.files());
        assert_eq!(result, PostInstallResult::Success);

        let runner = exec.runner();
        let dwm_clone = runner.position("git clone https://github.com/tonybanters/dwm").unwrap();
        let dwm_make = runner.position("make -C /home/tony/dwm clean install").unwrap();
        let st_clone = runner.position("git clone https://github.com/tonybanters/st").unwrap();
        assert!(dwm_clone < dwm_make && dwm_make < st_clone);
        assert!(runner.position("chown tony:tony /home/tony/.xinitrc").is_some());

        let root = fx.dir.path().join("root");
        let autologin = fs::read_to_string(root.join("etc/systemd/system/getty@tty1.service.d/autologin.conf")).unwrap();
        assert!(autologin.contains("--autologin tony"));
        assert!(fs::read_to_string(root.join("home/tony/.xinitrc")).unwrap().ends_with("exec dwm\n"));
    }

    #[test]
    fn test_suckless_build_failure_is_a_warning() {
        let fx = Fixture::new();
        let runner = RecordingRunner::new().fail_on(
            format!("arch-chroot {} make", fx.dir.path().join("root").display()),
            2,
        );
        let mut exec = ScopedExecutor::new(runner, &fx.log);
        let result = run_postinstall(&fx.config(InstallProfile::Suckless), &mut exec, &fx.files());

        assert_eq!(result.warnings().len(), 1);
        assert!(result.warnings()[0].starts_with("Failed to install suckless tools"));
        assert!(exec.runner().position("tonybanters/st").is_none());
        assert!(!fx.dir.path().join("root/home/tony/.xinitrc").exists());

        let content = fs::read_to_string(fx.log.path()).unwrap();
        assert!(content.contains("[WARN] Failed to install suckless tools"));
    }

    #[test]
    fn test_missing_wallpaper_does_not_stop_keybinds() {
        let fx = Fixture::new();
        let mut config = fx.config(InstallProfile::Beginner);
        config.wallpaper_source = fx.dir.path().join("missing.jpg");
        let mut exec = ScopedExecutor::new(RecordingRunner::new(), &fx.log);
        let result = run_postinstall(&config, &mut exec, &fx.files());

        assert_eq!(result.warnings().len(), 1);
        assert!(result.warnings()[0].starts_with("Failed to install wallpaper"));
        assert_eq!(exec.runner().history().len(), profiles::cinnamon_settings().len());
    }

    #[test]
    fn test_expert_is_skipped() {
        let fx = Fixture::new();
        let mut exec = ScopedExecutor::new(RecordingRunner::new(), &fx.log);
        let result = run_postinstall(&fx.config(InstallProfile::Expert), &mut exec, &fx.files());
        assert_eq!(result, PostInstallResult::Skipped);
        assert!(exec.runner().history().is_empty());
    }

    #[test]
    fn test_postinstall_result_display() {
        assert_eq!(PostInstallResult::Success.to_string(), "All post-install operations succeeded");
        let partial = PostInstallResult::PartialSuccess(vec!["warn1".to_string()]);
        assert_eq!(partial.to_string(), "Post-install completed with 1 warning(s)");
    }
}
