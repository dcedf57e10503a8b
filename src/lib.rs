//! Tonarchy Library
//!
//! Core of the Tonarchy installer: the terminal wizard that collects the
//! operator's answers, and the staged pipeline that turns them into an
//! installed Arch Linux system.

pub mod cli;
pub mod command_executor;
pub mod config;
pub mod config_file;
pub mod engine;
pub mod error;
pub mod hardware;
pub mod input;
pub mod install_log;
pub mod install_state;
pub mod installer;
pub mod logic;
pub mod picker;
pub mod process_guard;
pub mod profiles;
pub mod scoped_command;
pub mod scripts;
pub mod target_files;
pub mod terminal;
pub mod theme;
pub mod types;
pub mod ui;
pub mod wizard;

// Re-export main types for convenience
pub use command_executor::{
    CommandOutput, DryRunRunner, ProcessExit, ProcessRunner, RecordingRunner, ScopedExecutor,
    SystemRunner,
};
pub use config::{InstallConfig, Secret, WizardConfig};
pub use config_file::InstallerSettings;
pub use error::{Result, TonarchyError};
pub use hardware::{detect_disks, partition_device, TargetDisk};
pub use install_log::InstallLog;
pub use install_state::{PipelineProgress, StageId, StageTransitionError};
pub use installer::{InstallOptions, Installer, PipelineOutcome};
pub use picker::{FuzzyPicker, FzfPicker, ScriptedPicker};
pub use process_guard::ProcessGuard;
pub use profiles::InstallProfile;
pub use scoped_command::{Invocation, ScopedCommand};
pub use scripts::CommandArgs;
pub use terminal::{InputMode, InputModeGuard, ScriptedTerminal, Terminal, TtyTerminal};
pub use wizard::{Wizard, WizardOutcome};

// Storage engine
pub use engine::storage::{calculate_storage_plan, StorageOp, StoragePlan};

// Post-install
pub use logic::postinstall::{run_postinstall, PostInstallConfig, PostInstallResult};
