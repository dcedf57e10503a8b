//! Installer module
//!
//! Runs the installation pipeline: one destructive confirmation, then the
//! privileged stages strictly in order. Every command goes through the
//! `ScopedExecutor`; every file goes through `TargetFiles`. Stage order is
//! enforced by `PipelineProgress`.
//!
//! # Failure Policy
//!
//! The first failing command in a fatal stage ends the run. Nothing is
//! retried and nothing is rolled back; the disk is left as is and the log
//! says how far the run got. `hwclock` and everything in post-configuration
//! only produce warnings.

use std::path::PathBuf;
use std::time::Duration;

use crate::command_executor::{ProcessRunner, ScopedExecutor};
use crate::config::{InstallConfig, Secret};
use crate::engine::storage::calculate_storage_plan;
use crate::error::{Result, TonarchyError};
use crate::install_log::InstallLog;
use crate::install_state::{PipelineProgress, StageId};
use crate::logic::postinstall::{run_postinstall, PostInstallConfig, PostInstallResult};
use crate::profiles::InstallProfile;
use crate::scripts::config::{
    hosts_file, vconsole_conf, EnableServiceArgs, GenFstabArgs, HwclockArgs, LocaleGenArgs,
    TimezoneArgs, LOCALE_CONF, LOCALE_GEN, SUDOERS_WHEEL,
};
use crate::scripts::system::{boot_entry, loader_conf, BootctlInstallArgs, PacstrapArgs};
use crate::scripts::user::{SetPasswordArgs, UserAddArgs};
use crate::scripts::CommandArgs;
use crate::target_files::TargetFiles;
use crate::terminal::Terminal;
use crate::ui::{confirm_destructive, show_message, show_status};

/// Runtime options for one pipeline run.
#[derive(Debug, Clone)]
pub struct InstallOptions {
    /// Where the root partition is mounted (normally `/mnt`).
    pub target_root: PathBuf,
    /// Wallpaper on the live system.
    pub wallpaper_source: PathBuf,
    /// How long stage messages stay on screen.
    pub message_delay: Duration,
    /// Log file writes instead of performing them.
    pub dry_run: bool,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            target_root: PathBuf::from("/mnt"),
            wallpaper_source: PathBuf::from(crate::profiles::wallpaper_path()),
            message_delay: Duration::from_secs(2),
            dry_run: false,
        }
    }
}

/// How a pipeline run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// Every stage ran. `warnings` lists non-fatal problems.
    Completed { warnings: Vec<String> },
    /// The operator did not type `yes`; nothing was touched.
    Declined,
    /// A fatal stage failed; later stages never ran.
    Failed { stage: StageId, error: String },
}

impl PipelineOutcome {
    /// Process exit status for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Completed { .. } => 0,
            Self::Declined | Self::Failed { .. } => 1,
        }
    }
}

/// A failed step: what to show the operator, and the underlying error.
struct StageFailure {
    message: &'static str,
    cause: TonarchyError,
}

type StageResult = std::result::Result<(), StageFailure>;

trait StageContext<T> {
    fn context(self, message: &'static str) -> std::result::Result<T, StageFailure>;
}

impl<T> StageContext<T> for Result<T> {
    fn context(self, message: &'static str) -> std::result::Result<T, StageFailure> {
        self.map_err(|cause| StageFailure { message, cause })
    }
}

/// Installer instance
pub struct Installer<'a, T: Terminal + ?Sized, R: ProcessRunner> {
    config: &'a InstallConfig,
    options: &'a InstallOptions,
    term: &'a mut T,
    exec: ScopedExecutor<'a, R>,
    files: TargetFiles<'a>,
    progress: PipelineProgress,
}

impl<'a, T: Terminal + ?Sized, R: ProcessRunner> Installer<'a, T, R> {
    pub fn new(
        config: &'a InstallConfig,
        options: &'a InstallOptions,
        term: &'a mut T,
        runner: R,
        log: &'a InstallLog,
    ) -> Self {
        Self {
            config,
            options,
            term,
            exec: ScopedExecutor::new(runner, log),
            files: TargetFiles::new(options.target_root.clone(), log).dry_run(options.dry_run),
            progress: PipelineProgress::new(),
        }
    }

    pub fn progress(&self) -> &PipelineProgress {
        &self.progress
    }

    pub fn runner(&self) -> &R {
        self.exec.runner()
    }

    fn log(&self) -> &'a InstallLog {
        self.exec.log()
    }

    /// Run the whole pipeline.
    ///
    /// # Errors
    ///
    /// Only terminal I/O failures and stage-order violations are errors;
    /// command failures end in `PipelineOutcome::Failed`.
    pub fn run(&mut self) -> Result<PipelineOutcome> {
        if !self.config.profile.is_installable() {
            return Err(TonarchyError::validation(format!(
                "Profile {} cannot be installed",
                self.config.profile
            )));
        }

        self.progress.advance()?;
        self.log().info(format!("Starting installation: {}", self.config.summary()));

        let device = self.config.disk.device_path();
        if !confirm_destructive(&mut *self.term, &device)? {
            self.log().info("Installation cancelled by user at disk confirmation");
            self.progress.decline()?;
            show_message(&mut *self.term, "Installation cancelled", self.options.message_delay)?;
            return Ok(PipelineOutcome::Declined);
        }
        self.log().info(format!("Destructive operations on {} confirmed", device));
        self.progress.confirm_destructive_operations();

        let mut warnings = Vec::new();
        while let Some(stage) = self.progress.current_stage().next() {
            if stage == StageId::Completed {
                break;
            }
            self.progress.transition_to(stage)?;
            self.log().info(format!("Stage: {}", stage));

            match self.run_stage(stage, &mut warnings) {
                Ok(()) => {}
                Err(failure) => {
                    self.log().error(format!("{} failed: {}", stage, failure.cause));
                    self.progress.fail()?;
                    let shown = format!("{} - check {}", failure.message, self.log().path().display());
                    show_message(&mut *self.term, &shown, self.options.message_delay)?;
                    return Ok(PipelineOutcome::Failed { stage, error: failure.cause.to_string() });
                }
            }
        }

        self.progress.advance()?;
        self.log().info(format!("Installation completed with {} warning(s)", warnings.len()));
        Ok(PipelineOutcome::Completed { warnings })
    }

    fn run_stage(&mut self, stage: StageId, warnings: &mut Vec<String>) -> StageResult {
        match stage {
            StageId::PrepareDisk => self.prepare_disk(),
            StageId::BootstrapPackages => self.bootstrap_packages(),
            StageId::ConfigureSystem => self.configure_system(warnings),
            StageId::InstallBootloader => self.install_bootloader(),
            StageId::PostConfigure => {
                self.post_configure(warnings)?;
                Ok(())
            }
            StageId::NotStarted
            | StageId::ConfirmDestructive
            | StageId::Completed
            | StageId::Declined
            | StageId::Failed => Ok(()),
        }
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn status(&mut self, lines: &[&str]) -> StageResult {
        show_status(&mut *self.term, lines)
            .map_err(TonarchyError::from)
            .context("Terminal error")
    }

    fn message(&mut self, text: &str) -> StageResult {
        show_message(&mut *self.term, text, self.options.message_delay)
            .map_err(TonarchyError::from)
            .context("Terminal error")
    }

    fn step(&mut self, args: &impl CommandArgs) -> StageResult {
        let context = args.failure_context();
        self.exec.run_checked(&args.to_command(), context).context(context).map(|_| ())
    }

    fn root(&self) -> PathBuf {
        self.options.target_root.clone()
    }

    // ------------------------------------------------------------------
    // Stages
    // ------------------------------------------------------------------

    fn prepare_disk(&mut self) -> StageResult {
        self.status(&["Partitioning disk..."])?;
        let plan = calculate_storage_plan(&self.config.disk, &self.options.target_root)
            .context("Invalid target disk")?;
        self.log().debug(plan.summary());

        for op in &plan.ops {
            self.step(op)?;
        }

        self.log().info("Disk partitioning completed successfully");
        self.message("Disk prepared successfully!")
    }

    fn bootstrap_packages(&mut self) -> StageResult {
        self.status(&["Installing system packages...", "This will take several minutes."])?;
        let packages = self.config.profile.packages();
        self.log().info(format!("Packages: {}", packages.join(" ")));

        self.step(&PacstrapArgs {
            root: self.root(),
            packages: packages.iter().map(|p| p.to_string()).collect(),
        })?;

        self.log().info("Package installation completed successfully");
        self.message("Packages installed successfully!")
    }

    fn configure_system(&mut self, warnings: &mut Vec<String>) -> StageResult {
        let logging = format!("(Logging to {})", self.log().path().display());
        self.status(&["Configuring system...", logging.as_str()])?;

        let config = self.config;
        let wizard = &config.wizard;
        let root = self.root();

        let fstab_args = GenFstabArgs { root: root.clone() };
        let fstab = self
            .exec
            .run_checked(&fstab_args.to_command(), fstab_args.failure_context())
            .context(fstab_args.failure_context())?;
        self.files
            .append("/etc/fstab", fstab.stdout.as_deref().unwrap_or_default())
            .context("Failed to generate fstab")?;

        self.step(&TimezoneArgs { root: root.clone(), timezone: wizard.timezone.clone() })?;

        let hwclock = HwclockArgs { root: root.clone() };
        if let Err(failure) = self.step(&hwclock) {
            self.log().warn(format!("{}: {}", failure.message, failure.cause));
            warnings.push(failure.message.to_string());
        }

        self.files.write("/etc/locale.gen", LOCALE_GEN).context("Failed to write locale.gen")?;
        self.step(&LocaleGenArgs { root: root.clone() })?;
        self.files.write("/etc/locale.conf", LOCALE_CONF).context("Failed to write locale.conf")?;
        self.files
            .write("/etc/vconsole.conf", &vconsole_conf(&wizard.keyboard))
            .context("Failed to write vconsole.conf")?;
        self.files
            .write("/etc/hostname", &format!("{}\n", wizard.hostname))
            .context("Failed to write hostname")?;
        self.files
            .write("/etc/hosts", &hosts_file(&wizard.hostname))
            .context("Failed to write hosts file")?;

        self.step(&UserAddArgs { root: root.clone(), username: wizard.username.clone() })?;
        for user in [wizard.username.as_str(), "root"] {
            self.step(&SetPasswordArgs {
                root: root.clone(),
                username: user.to_string(),
                password: Secret::clone(&wizard.password),
            })?;
        }

        self.files.create_dir("/etc/sudoers.d", 0o750).context("Failed to configure sudo")?;
        self.files
            .write_with_mode("/etc/sudoers.d/wheel", SUDOERS_WHEEL, 0o440)
            .context("Failed to configure sudo")?;

        for service in config.profile.services() {
            self.step(&EnableServiceArgs::service(root.clone(), *service))?;
        }
        if let Some(dm) = config.profile.display_manager() {
            self.step(&EnableServiceArgs::display_manager(root.clone(), dm))?;
        }

        self.log().info("System configuration completed successfully");
        self.message("System configured successfully!")
    }

    fn install_bootloader(&mut self) -> StageResult {
        self.status(&["Installing bootloader..."])?;
        self.step(&BootctlInstallArgs { root: self.root() })?;

        let root_device = self.config.disk.partition_path(crate::engine::storage::ROOT_PARTITION.number);
        self.files
            .create_dir("/boot/loader/entries", 0o755)
            .context("Failed to install bootloader")?;
        self.files
            .write("/boot/loader/loader.conf", &loader_conf())
            .context("Failed to install bootloader")?;
        self.files
            .write("/boot/loader/entries/arch.conf", &boot_entry(&root_device))
            .context("Failed to install bootloader")?;

        self.log().info("Bootloader installation completed successfully");
        self.message("Bootloader installed successfully!")
    }

    fn post_configure(&mut self, warnings: &mut Vec<String>) -> StageResult {
        let done = match self.config.profile {
            InstallProfile::Beginner => {
                self.status(&["Configuring Cinnamon..."])?;
                "Cinnamon keybinds configured!"
            }
            InstallProfile::Suckless => {
                self.status(&[
                    "Installing suckless tools (dwm, st, dmenu)...",
                    "Cloning and building from source...",
                ])?;
                "Suckless tools installed successfully!"
            }
            InstallProfile::Expert => return Ok(()),
        };

        let config = PostInstallConfig {
            profile: self.config.profile,
            target_user: self.config.wizard.username.clone(),
            chroot_path: self.root(),
            wallpaper_source: self.options.wallpaper_source.clone(),
        };
        match run_postinstall(&config, &mut self.exec, &self.files) {
            PostInstallResult::PartialSuccess(found) => {
                for warning in &found {
                    self.message(&format!("Warning: {}", warning))?;
                }
                warnings.extend(found);
            }
            PostInstallResult::Success => self.message(done)?,
            PostInstallResult::Skipped => {}
        }
        Ok(())
    }
}
