//! Install State Machine
//!
//! This module is the single source of truth for how far an installation has
//! progressed. It enforces valid stage transitions and makes it impossible
//! to skip or repeat a stage programmatically.
//!
//! # Design Principles
//!
//! - **Single Source of Truth**: `PipelineProgress` owns the current stage
//! - **Validated Transitions**: Only forward transitions to the next stage are allowed
//! - **Fail Fast**: Invalid transitions return errors immediately
//! - **Explicit Consent**: `PrepareDisk` cannot be entered without a recorded `yes`
//!
//! # Stage Flow
//!
//! ```text
//! NotStarted
//!     ↓
//! ConfirmDestructive ──(anything but "yes")──→ Declined
//!     ↓
//! PrepareDisk
//!     ↓
//! BootstrapPackages
//!     ↓
//! ConfigureSystem
//!     ↓
//! InstallBootloader
//!     ↓
//! PostConfigure
//!     ↓
//! Completed
//!
//! (Any stage from PrepareDisk to InstallBootloader can transition to Failed)
//! ```

use std::fmt;

use chrono::{DateTime, Local};
use thiserror::Error;

/// Pipeline stages in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum StageId {
    /// Nothing has run yet
    NotStarted = 0,

    /// Stage 1: the operator types `yes` to authorize wiping the disk
    ConfirmDestructive = 1,

    /// Stage 2: wipe, partition, format, mount
    /// This is a DESTRUCTIVE stage - requires explicit confirmation
    PrepareDisk = 2,

    /// Stage 3: pacstrap the profile's package set
    BootstrapPackages = 3,

    /// Stage 4: fstab, clock, locale, users, services
    ConfigureSystem = 4,

    /// Stage 5: systemd-boot and its entries
    InstallBootloader = 5,

    /// Stage 6: desktop post-configuration (best effort)
    PostConfigure = 6,

    /// Terminal: every stage ran
    Completed = 7,

    /// Terminal: the operator did not confirm
    Declined = 8,

    /// Terminal: a fatal stage failed
    Failed = 255,
}

impl StageId {
    #[inline]
    pub const fn order(self) -> u8 {
        self as u8
    }

    #[inline]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Declined | Self::Failed)
    }

    #[inline]
    pub const fn is_destructive(self) -> bool {
        matches!(self, Self::PrepareDisk)
    }

    /// Whether a failure in this stage aborts the installation.
    #[inline]
    pub const fn is_fatal(self) -> bool {
        !matches!(self, Self::PostConfigure)
    }

    pub const fn next(self) -> Option<Self> {
        match self {
            Self::NotStarted => Some(Self::ConfirmDestructive),
            Self::ConfirmDestructive => Some(Self::PrepareDisk),
            Self::PrepareDisk => Some(Self::BootstrapPackages),
            Self::BootstrapPackages => Some(Self::ConfigureSystem),
            Self::ConfigureSystem => Some(Self::InstallBootloader),
            Self::InstallBootloader => Some(Self::PostConfigure),
            Self::PostConfigure => Some(Self::Completed),
            Self::Completed | Self::Declined | Self::Failed => None,
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::NotStarted => "Not started",
            Self::ConfirmDestructive => "Confirming target disk",
            Self::PrepareDisk => "Preparing disk",
            Self::BootstrapPackages => "Installing packages",
            Self::ConfigureSystem => "Configuring system",
            Self::InstallBootloader => "Installing bootloader",
            Self::PostConfigure => "Configuring desktop",
            Self::Completed => "Installation complete",
            Self::Declined => "Installation cancelled",
            Self::Failed => "Installation failed",
        }
    }

    /// The six working stages, in order.
    pub const fn pipeline() -> &'static [Self] {
        &[
            Self::ConfirmDestructive,
            Self::PrepareDisk,
            Self::BootstrapPackages,
            Self::ConfigureSystem,
            Self::InstallBootloader,
            Self::PostConfigure,
        ]
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur during state transitions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StageTransitionError {
    #[error("Cannot skip from {from} to {to} (must transition through intermediate stages)")]
    SkippedStage { from: StageId, to: StageId },

    #[error("Cannot go backwards from {from} to {to} (installation is forward-only)")]
    BackwardTransition { from: StageId, to: StageId },

    #[error("Cannot transition from terminal state {from}")]
    FromTerminalState { from: StageId },

    #[error("Stage {stage} requires explicit confirmation (destructive operation)")]
    MissingConfirmation { stage: StageId },

    #[error("Already at stage {stage}")]
    AlreadyAtStage { stage: StageId },

    #[error("Cannot decline outside of {expected} (currently {current})")]
    NotConfirming { expected: StageId, current: StageId },
}

/// Progress through the pipeline.
///
/// # Example
///
/// ```
/// use tonarchy::install_state::{PipelineProgress, StageId};
///
/// let mut progress = PipelineProgress::new();
/// progress.advance().unwrap();
/// assert_eq!(progress.current_stage(), StageId::ConfirmDestructive);
///
/// // Cannot enter a destructive stage without confirmation
/// assert!(progress.advance().is_err());
/// progress.confirm_destructive_operations();
/// assert_eq!(progress.advance().unwrap(), StageId::PrepareDisk);
/// ```
#[derive(Debug, Clone)]
pub struct PipelineProgress {
    current: StageId,
    failed_at: Option<StageId>,
    stage_history: Vec<(StageId, DateTime<Local>)>,
    destructive_confirmed: bool,
}

impl Default for PipelineProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineProgress {
    pub fn new() -> Self {
        Self {
            current: StageId::NotStarted,
            failed_at: None,
            stage_history: Vec::with_capacity(StageId::pipeline().len() + 1),
            destructive_confirmed: false,
        }
    }

    #[inline]
    pub fn current_stage(&self) -> StageId {
        self.current
    }

    #[inline]
    pub fn failed_at(&self) -> Option<StageId> {
        self.failed_at
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.current == StageId::Completed
    }

    /// Stages entered so far, with the time they were entered.
    pub fn stage_history(&self) -> &[(StageId, DateTime<Local>)] {
        &self.stage_history
    }

    /// Record the operator's `yes`. One-way.
    pub fn confirm_destructive_operations(&mut self) {
        self.destructive_confirmed = true;
    }

    #[inline]
    pub fn is_destructive_confirmed(&self) -> bool {
        self.destructive_confirmed
    }

    /// Advance to the next stage in sequence.
    ///
    /// # Errors
    ///
    /// - `FromTerminalState` if already at a terminal state
    /// - `MissingConfirmation` if entering a destructive stage without confirmation
    pub fn advance(&mut self) -> Result<StageId, StageTransitionError> {
        let next = self
            .current
            .next()
            .ok_or(StageTransitionError::FromTerminalState { from: self.current })?;
        self.transition_to(next)
    }

    /// Transition to `target`, which must be the immediate next stage.
    ///
    /// # Errors
    ///
    /// - `FromTerminalState` if current is a terminal state
    /// - `AlreadyAtStage` if target is the current stage
    /// - `BackwardTransition` if target is before current
    /// - `SkippedStage` if target is not the immediate next stage
    /// - `MissingConfirmation` if entering a destructive stage without confirmation
    pub fn transition_to(&mut self, target: StageId) -> Result<StageId, StageTransitionError> {
        if self.current.is_terminal() {
            return Err(StageTransitionError::FromTerminalState { from: self.current });
        }
        if target == self.current {
            return Err(StageTransitionError::AlreadyAtStage { stage: target });
        }
        if matches!(target, StageId::Failed | StageId::Declined) {
            return Err(StageTransitionError::SkippedStage { from: self.current, to: target });
        }
        if target.order() < self.current.order() {
            return Err(StageTransitionError::BackwardTransition { from: self.current, to: target });
        }
        if self.current.next() != Some(target) {
            return Err(StageTransitionError::SkippedStage { from: self.current, to: target });
        }
        if target.is_destructive() && !self.destructive_confirmed {
            return Err(StageTransitionError::MissingConfirmation { stage: target });
        }

        self.record(target);
        self.current = target;
        Ok(target)
    }

    /// End the run because the operator did not confirm.
    ///
    /// # Errors
    ///
    /// `NotConfirming` unless the current stage is `ConfirmDestructive`.
    pub fn decline(&mut self) -> Result<(), StageTransitionError> {
        if self.current != StageId::ConfirmDestructive {
            return Err(StageTransitionError::NotConfirming {
                expected: StageId::ConfirmDestructive,
                current: self.current,
            });
        }
        self.record(StageId::Declined);
        self.current = StageId::Declined;
        Ok(())
    }

    /// Mark the run as failed at the current stage.
    ///
    /// # Errors
    ///
    /// `FromTerminalState` if already at a terminal state.
    pub fn fail(&mut self) -> Result<(), StageTransitionError> {
        if self.current.is_terminal() {
            return Err(StageTransitionError::FromTerminalState { from: self.current });
        }
        self.failed_at = Some(self.current);
        self.record(StageId::Failed);
        self.current = StageId::Failed;
        Ok(())
    }

    fn record(&mut self, stage: StageId) {
        self.stage_history.push((stage, Local::now()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn confirmed() -> PipelineProgress {
        let mut progress = PipelineProgress::new();
        progress.advance().unwrap();
        progress.confirm_destructive_operations();
        progress
    }

    #[test]
    fn test_full_forward_run() {
        let mut progress = confirmed();
        let mut seen = vec![progress.current_stage()];
        while !progress.is_complete() {
            seen.push(progress.advance().unwrap());
        }
        let mut expected = StageId::pipeline().to_vec();
        expected.push(StageId::Completed);
        assert_eq!(seen, expected);
        assert_eq!(progress.stage_history().len(), 7);
    }

    #[test]
    fn test_cannot_skip() {
        let mut progress = confirmed();
        let err = progress.transition_to(StageId::ConfigureSystem).unwrap_err();
        assert_eq!(
            err,
            StageTransitionError::SkippedStage {
                from: StageId::ConfirmDestructive,
                to: StageId::ConfigureSystem
            }
        );
    }

    #[test]
    fn test_cannot_go_backwards_or_repeat() {
        let mut progress = confirmed();
        progress.advance().unwrap();
        progress.advance().unwrap();
        assert!(matches!(
            progress.transition_to(StageId::PrepareDisk),
            Err(StageTransitionError::BackwardTransition { .. })
        ));
        assert!(matches!(
            progress.transition_to(StageId::BootstrapPackages),
            Err(StageTransitionError::AlreadyAtStage { .. })
        ));
    }

    #[test]
    fn test_destructive_needs_confirmation() {
        let mut progress = PipelineProgress::new();
        progress.advance().unwrap();
        assert_eq!(
            progress.advance().unwrap_err(),
            StageTransitionError::MissingConfirmation { stage: StageId::PrepareDisk }
        );
    }

    #[test]
    fn test_decline_only_while_confirming() {
        let mut progress = PipelineProgress::new();
        assert!(progress.decline().is_err());
        progress.advance().unwrap();
        progress.decline().unwrap();
        assert_eq!(progress.current_stage(), StageId::Declined);
        assert!(progress.advance().is_err());
    }

    #[test]
    fn test_fail_is_terminal() {
        let mut progress = confirmed();
        progress.advance().unwrap();
        progress.advance().unwrap();
        progress.fail().unwrap();
        assert_eq!(progress.failed_at(), Some(StageId::BootstrapPackages));
        assert!(matches!(progress.advance(), Err(StageTransitionError::FromTerminalState { .. })));
        assert!(progress.fail().is_err());
    }

    #[test]
    fn test_only_post_configure_is_non_fatal() {
        let non_fatal: Vec<StageId> =
            StageId::pipeline().iter().copied().filter(|s| !s.is_fatal()).collect();
        assert_eq!(non_fatal, vec![StageId::PostConfigure]);
    }
}
