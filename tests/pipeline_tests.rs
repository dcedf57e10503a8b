//! Tests for the Installation Pipeline
//!
//! These tests run the whole pipeline against a temporary target root with
//! a recording process runner and verify:
//! - Stage order and the exact disk commands
//! - Fail-fast behavior of fatal stages
//! - Best-effort post-configuration
//! - Nothing runs without the literal `yes`
//! - Passwords stay out of the log and the command history

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use tempfile::TempDir;
use tonarchy::command_executor::RecordingRunner;
use tonarchy::config::{InstallConfig, Secret, WizardConfig};
use tonarchy::hardware::TargetDisk;
use tonarchy::install_log::InstallLog;
use tonarchy::install_state::StageId;
use tonarchy::installer::{InstallOptions, Installer, PipelineOutcome};
use tonarchy::profiles::InstallProfile;
use tonarchy::terminal::ScriptedTerminal;

const PASSWORD: &str = "correct-horse-battery";

struct Fixture {
    dir: TempDir,
    options: InstallOptions,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("root");
        fs::create_dir_all(root.join("etc")).unwrap();
        fs::create_dir_all(root.join("home/tony")).unwrap();
        fs::write(dir.path().join("wall1.jpg"), b"jpeg").unwrap();

        let options = InstallOptions {
            target_root: root,
            wallpaper_source: dir.path().join("wall1.jpg"),
            message_delay: Duration::ZERO,
            dry_run: false,
        };
        Self { dir, options }
    }

    fn root(&self) -> String {
        self.options.target_root.display().to_string()
    }

    fn log_path(&self) -> PathBuf {
        self.dir.path().join("install.log")
    }

    fn log_text(&self) -> String {
        fs::read_to_string(self.log_path()).unwrap()
    }
}

struct Run {
    outcome: PipelineOutcome,
    history: Vec<String>,
    term: ScriptedTerminal,
    final_stage: StageId,
}

fn config(profile: InstallProfile) -> InstallConfig {
    InstallConfig::new(
        WizardConfig {
            username: "tony".into(),
            password: Secret::new(PASSWORD),
            hostname: "box".into(),
            keyboard: "us".into(),
            timezone: "Europe/Berlin".into(),
        },
        profile,
        TargetDisk::new("sda", "sda (500G) Samsung SSD"),
    )
}

fn run_pipeline(fx: &Fixture, profile: InstallProfile, input: &[u8], runner: RecordingRunner) -> Run {
    let log = InstallLog::open(fx.log_path()).unwrap();
    let cfg = config(profile);
    let mut term = ScriptedTerminal::new(input);

    let (outcome, history, final_stage) = {
        let mut installer = Installer::new(&cfg, &fx.options, &mut term, runner, &log);
        let outcome = installer.run().unwrap();
        let final_stage = installer.progress().current_stage();
        (outcome, installer.runner().history().to_vec(), final_stage)
    };
    log.close().unwrap();

    Run { outcome, history, term, final_stage }
}

fn position(history: &[String], needle: &str) -> usize {
    history
        .iter()
        .position(|line| line.contains(needle))
        .unwrap_or_else(|| panic!("no command containing {:?} in {:#?}", needle, history))
}

// =============================================================================
// Happy Path Tests
// =============================================================================

#[test]
fn test_disk_commands_for_sda() {
    let fx = Fixture::new();
    let run = run_pipeline(&fx, InstallProfile::Beginner, b"yes\n", RecordingRunner::new());
    let root = fx.root();

    let expected = vec![
        "wipefs -af /dev/sda".to_string(),
        "sgdisk --zap-all /dev/sda".to_string(),
        "sgdisk --clear --new=1:0:+1G --typecode=1:ef00 --change-name=1:EFI \
         --new=2:0:+4G --typecode=2:8200 --change-name=2:swap \
         --new=3:0:0 --typecode=3:8300 --change-name=3:root /dev/sda"
            .to_string(),
        "mkfs.fat -F32 /dev/sda1".to_string(),
        "mkswap /dev/sda2".to_string(),
        "mkfs.ext4 -F /dev/sda3".to_string(),
        format!("mount /dev/sda3 {}", root),
        format!("mkdir -p {}/boot", root),
        format!("mount /dev/sda1 {}/boot", root),
        "swapon /dev/sda2".to_string(),
    ];
    assert_eq!(run.history[..expected.len()], expected[..]);
}

#[test]
fn test_stages_run_in_order() {
    let fx = Fixture::new();
    let run = run_pipeline(&fx, InstallProfile::Beginner, b"yes\n", RecordingRunner::new());

    assert_eq!(run.outcome, PipelineOutcome::Completed { warnings: vec![] });
    assert_eq!(run.final_stage, StageId::Completed);

    let wipe = position(&run.history, "wipefs");
    let pacstrap = position(&run.history, "pacstrap -K");
    let fstab = position(&run.history, "genfstab -U");
    let bootctl = position(&run.history, "bootctl install");
    let dconf = position(&run.history, "dconf write");
    assert!(wipe < pacstrap);
    assert!(pacstrap < fstab);
    assert!(fstab < bootctl);
    assert!(bootctl < dconf);
}

#[test]
fn test_system_files_written() {
    let fx = Fixture::new();
    run_pipeline(&fx, InstallProfile::Beginner, b"yes\n", RecordingRunner::new());
    let root = &fx.options.target_root;

    assert_eq!(fs::read_to_string(root.join("etc/hostname")).unwrap(), "box\n");
    assert_eq!(fs::read_to_string(root.join("etc/locale.conf")).unwrap(), "LANG=en_US.UTF-8\n");
    assert_eq!(fs::read_to_string(root.join("etc/vconsole.conf")).unwrap(), "KEYMAP=us\n");
    assert!(fs::read_to_string(root.join("etc/hosts")).unwrap().contains("127.0.1.1   box.localdomain box"));
    assert_eq!(
        fs::read_to_string(root.join("etc/sudoers.d/wheel")).unwrap(),
        "%wheel ALL=(ALL:ALL) ALL\n"
    );

    let entry = fs::read_to_string(root.join("boot/loader/entries/arch.conf")).unwrap();
    assert!(entry.contains("options root=/dev/sda3 rw"));
    let loader = fs::read_to_string(root.join("boot/loader/loader.conf")).unwrap();
    assert!(loader.contains("timeout 3"));
}

#[test]
fn test_beginner_enables_display_manager() {
    let fx = Fixture::new();
    let run = run_pipeline(&fx, InstallProfile::Beginner, b"yes\n", RecordingRunner::new());

    let nm = position(&run.history, "systemctl enable NetworkManager");
    let dm = position(&run.history, "systemctl enable lightdm");
    assert!(nm < dm);
}

#[test]
fn test_suckless_builds_from_source() {
    let fx = Fixture::new();
    let run = run_pipeline(&fx, InstallProfile::Suckless, b"yes\n", RecordingRunner::new());

    assert!(matches!(run.outcome, PipelineOutcome::Completed { .. }));
    assert!(run.history.iter().all(|l| !l.contains("lightdm")));
    for tool in ["dwm", "st", "dmenu"] {
        let clone = position(&run.history, &format!("/home/tony/{}", tool));
        let make = position(&run.history, &format!("make -C /home/tony/{} clean install", tool));
        assert!(clone < make);
    }
    let autologin = fx
        .options
        .target_root
        .join("etc/systemd/system/getty@tty1.service.d/autologin.conf");
    assert!(fs::read_to_string(autologin).unwrap().contains("tony"));
}

// =============================================================================
// Failure Tests
// =============================================================================

#[test]
fn test_pacstrap_failure_stops_pipeline() {
    let fx = Fixture::new();
    let runner = RecordingRunner::new().fail_on("pacstrap", 1);
    let run = run_pipeline(&fx, InstallProfile::Beginner, b"yes\n", runner);

    match &run.outcome {
        PipelineOutcome::Failed { stage, .. } => assert_eq!(*stage, StageId::BootstrapPackages),
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(run.outcome.exit_code(), 1);
    assert_eq!(run.final_stage, StageId::Failed);
    assert!(run.history.last().unwrap().starts_with("pacstrap"));
    assert!(!run.history.iter().any(|l| l.contains("genfstab")));
    assert!(run.term.ever_showed("Failed to install packages - check"));
    assert!(fx.log_text().contains("[ERROR]"));
}

#[test]
fn test_format_failure_stops_before_mount() {
    let fx = Fixture::new();
    let runner = RecordingRunner::new().fail_on("mkfs.ext4", 1);
    let run = run_pipeline(&fx, InstallProfile::Suckless, b"yes\n", runner);

    assert!(matches!(run.outcome, PipelineOutcome::Failed { stage: StageId::PrepareDisk, .. }));
    assert!(!run.history.iter().any(|l| l.starts_with("mount")));
    assert!(!run.history.iter().any(|l| l.contains("pacstrap")));
}

#[test]
fn test_post_configure_failure_still_completes() {
    let fx = Fixture::new();
    let runner = RecordingRunner::new().fail_on(format!("arch-chroot {} sudo -u tony", fx.root()), 1);
    let run = run_pipeline(&fx, InstallProfile::Beginner, b"yes\n", runner);

    let PipelineOutcome::Completed { warnings } = &run.outcome else {
        panic!("expected completion, got {:?}", run.outcome);
    };
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].starts_with("Failed to configure keybinds"));
    assert_eq!(run.outcome.exit_code(), 0);
    assert!(fx.log_text().contains("[WARN]"));
    assert!(run.term.ever_showed("Warning: Failed to configure keybinds"));
}

// =============================================================================
// Confirmation Tests
// =============================================================================

#[test]
fn test_anything_but_yes_issues_no_commands() {
    for input in [&b"no\n"[..], b"YES\n", b"y\n", b"yes please\n", b""] {
        let fx = Fixture::new();
        let run = run_pipeline(&fx, InstallProfile::Beginner, input, RecordingRunner::new());

        assert_eq!(run.outcome, PipelineOutcome::Declined);
        assert!(run.history.is_empty(), "input {:?} issued commands", input);
        assert!(run.term.ever_showed("Installation cancelled"));
        assert_eq!(run.final_stage, StageId::Declined);
    }
}

#[test]
fn test_confirmation_names_the_device() {
    let fx = Fixture::new();
    let run = run_pipeline(&fx, InstallProfile::Beginner, b"no\n", RecordingRunner::new());
    let shown: String = run
        .term
        .transcript()
        .iter()
        .filter(|d| d.row == tonarchy::ui::CONTENT_ROW)
        .map(|d| d.text.as_str())
        .collect();
    assert!(shown.contains("WARNING: All data on /dev/sda will be destroyed!"));
}

// =============================================================================
// Secret Handling Tests
// =============================================================================

#[test]
fn test_password_never_logged() {
    let fx = Fixture::new();
    let run = run_pipeline(&fx, InstallProfile::Beginner, b"yes\n", RecordingRunner::new());

    assert!(run.history.iter().any(|l| l.ends_with("chpasswd")));
    assert!(run.history.iter().all(|l| !l.contains(PASSWORD)));
    let log = fx.log_text();
    assert!(log.contains("chpasswd <<< [redacted]"));
    assert!(!log.contains(PASSWORD));
}

// =============================================================================
// Dry-Run Tests
// =============================================================================

#[test]
fn test_dry_run_writes_no_files() {
    let mut fx = Fixture::new();
    fx.options.dry_run = true;
    let run = run_pipeline(&fx, InstallProfile::Beginner, b"yes\n", RecordingRunner::new());

    assert!(matches!(run.outcome, PipelineOutcome::Completed { .. }));
    assert!(!fx.options.target_root.join("etc/hostname").exists());
    assert!(!fx.options.target_root.join("boot/loader/loader.conf").exists());
    assert!(fx.log_text().contains("[dry-run]"));
}
