//! Tonarchy - Main entry point
//!
//! Wizard, profile menu, disk menu, then the installation pipeline.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Mutex;

use strum::IntoEnumIterator;
use tracing_subscriber::EnvFilter;

use tonarchy::cli::{Cli, Commands};
use tonarchy::command_executor::{DryRunRunner, ProcessRunner, ScopedExecutor, SystemRunner};
use tonarchy::config::InstallConfig;
use tonarchy::config_file::InstallerSettings;
use tonarchy::engine::storage::calculate_storage_plan;
use tonarchy::hardware::{self, TargetDisk};
use tonarchy::install_log::InstallLog;
use tonarchy::installer::{Installer, PipelineOutcome};
use tonarchy::picker::FzfPicker;
use tonarchy::process_guard::ProcessGuard;
use tonarchy::profiles::InstallProfile;
use tonarchy::scripts::system::{EjectArgs, RebootArgs};
use tonarchy::scripts::CommandArgs;
use tonarchy::terminal::TtyTerminal;
use tonarchy::ui;
use tonarchy::wizard::{Wizard, WizardOutcome};

/// Install a file-backed tracing subscriber. Without `--trace-file` nothing
/// is installed: output on stderr would corrupt the screen.
fn init_tracing(trace_file: Option<&Path>) -> Result<()> {
    let Some(path) = trace_file else {
        return Ok(());
    };

    let file = File::create(path)
        .with_context(|| format!("Failed to create trace file {:?}", path))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();

    Ok(())
}

fn load_settings(cli: &Cli) -> Result<InstallerSettings> {
    let mut settings = match &cli.config {
        Some(path) => InstallerSettings::load_from_file(path)?,
        None => InstallerSettings::default(),
    };
    cli.apply_overrides(&mut settings);
    settings.validate().context("Invalid settings")?;
    Ok(settings)
}

fn check_config(file: &Path) -> Result<ExitCode> {
    tracing::info!("Validating settings file: {:?}", file);
    let outcome = InstallerSettings::load_from_file(file).and_then(|s| s.validate().map(|_| s));
    match outcome {
        Ok(settings) => {
            println!("Settings file is valid: {:?}", file);
            println!("{}", serde_json::to_string_pretty(&settings)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("Settings file is invalid: {:#}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn print_plan(disk: &str, profile: InstallProfile, settings: &InstallerSettings) -> Result<ExitCode> {
    if !profile.is_installable() {
        anyhow::bail!("Profile {} cannot be installed yet", profile);
    }

    let disk = TargetDisk::new(disk, disk);
    let plan = calculate_storage_plan(&disk, &settings.target_root)?;

    println!("{}", plan.summary());
    println!();
    println!("Packages ({}):", profile);
    println!("  {}", profile.packages().join(" "));
    println!("Services:");
    for service in profile.services().iter().copied().chain(profile.display_manager()) {
        println!("  {}", service);
    }
    Ok(ExitCode::SUCCESS)
}

/// Everything from the wizard to the final reboot, with one runner type.
fn run_interactive<R: ProcessRunner + Default>(
    settings: &InstallerSettings,
    log: &InstallLog,
) -> Result<ExitCode> {
    let mut term = TtyTerminal::open().context("Failed to open terminal")?;
    let _guard = ProcessGuard::install().context("Failed to install signal handlers")?;

    let mut picker = FzfPicker;
    let wizard = match Wizard::new(&mut term, &mut picker, log)
        .with_message_delay(settings.message_delay())
        .run()?
    {
        WizardOutcome::Done(config) => config,
        WizardOutcome::Aborted => {
            log.info("Installation aborted by user");
            return Ok(ExitCode::FAILURE);
        }
    };

    let profiles: Vec<InstallProfile> = InstallProfile::iter().collect();
    let labels: Vec<&str> = profiles.iter().map(|p| p.menu_label()).collect();
    let Some(choice) = ui::select(&mut term, &labels)? else {
        log.info("Profile selection cancelled");
        return Ok(ExitCode::FAILURE);
    };
    let profile = profiles[choice];
    log.info(format!("Selected profile: {}", profile));

    if !profile.is_installable() {
        ui::show_coming_soon(&mut term)?;
        return Ok(ExitCode::SUCCESS);
    }

    let disks = {
        let mut exec = ScopedExecutor::new(R::default(), log);
        match hardware::detect_disks(&mut exec) {
            Ok(disks) => disks,
            Err(e) => {
                log.error(format!("Disk detection failed: {}", e));
                ui::show_message(&mut term, &format!("{}", e), settings.message_delay())?;
                return Ok(ExitCode::FAILURE);
            }
        }
    };
    let lines: Vec<&str> = disks.iter().map(|d| d.description.as_str()).collect();
    let Some(choice) = ui::select(&mut term, &lines)? else {
        log.info("Disk selection cancelled");
        return Ok(ExitCode::FAILURE);
    };
    let disk = disks[choice].clone();
    log.info(format!("Selected disk: /dev/{}", disk.name));

    let config = InstallConfig::new(wizard, profile, disk);
    let options = settings.to_install_options();

    let outcome = {
        let mut installer = Installer::new(&config, &options, &mut term, R::default(), log);
        installer.run()?
    };

    if let PipelineOutcome::Completed { warnings } = &outcome {
        if !warnings.is_empty() {
            log.info(format!("Completed with {} warning(s)", warnings.len()));
        }
        ui::show_completion(&mut term, settings.reboot)?;

        if settings.reboot {
            let mut exec = ScopedExecutor::new(R::default(), log);
            if let Err(e) = exec.run_best_effort(&EjectArgs::default().to_command()) {
                log.warn(format!("{}: {}", EjectArgs::default().failure_context(), e));
            }
            log.info("Rebooting");
            exec.run_checked(&RebootArgs.to_command(), RebootArgs.failure_context())?;
        }
    }

    Ok(ExitCode::from(outcome.exit_code() as u8))
}

fn run(cli: Cli) -> Result<ExitCode> {
    init_tracing(cli.trace_file.as_deref())?;
    tracing::info!("Tonarchy starting up");

    let settings = load_settings(&cli)?;

    match &cli.command {
        Some(Commands::CheckConfig { file }) => return check_config(file),
        Some(Commands::PrintPlan { disk, profile }) => return print_plan(disk, *profile, &settings),
        None => {}
    }

    if !settings.dry_run && !hardware::is_root() {
        eprintln!("Error: tonarchy must be run as root (or with --dry-run)");
        return Ok(ExitCode::FAILURE);
    }

    let log = InstallLog::open(&settings.log_path)
        .with_context(|| format!("Failed to open install log {:?}", settings.log_path))?;
    log.info("Tonarchy installer started");
    if settings.dry_run {
        log.info("Dry-run mode: no changes will be made");
    }

    let result = if settings.dry_run {
        run_interactive::<DryRunRunner>(&settings, &log)
    } else {
        run_interactive::<SystemRunner>(&settings, &log)
    };

    if let Err(e) = &result {
        log.error(format!("{:#}", e));
    }
    log.close().context("Failed to close install log")?;
    result
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
