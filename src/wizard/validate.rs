//! Field validators.
//!
//! Each validator sees the value after its field's fallback has been applied
//! and the rest of the form, so cross-field rules (password confirmation)
//! live here too.

use super::fields::{FieldId, WizardState};

/// Why a value was not accepted, and where collection resumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub message: &'static str,
    /// Field to jump back to; `None` re-prompts the same field.
    pub restart: Option<FieldId>,
}

impl Rejection {
    pub fn stay(message: &'static str) -> Self {
        Self { message, restart: None }
    }

    pub fn restart_at(message: &'static str, field: FieldId) -> Self {
        Self { message, restart: Some(field) }
    }
}

pub type Validation = Result<(), Rejection>;

/// ASCII letters, digits, `-` and `_`, at least one character.
pub fn is_valid_name(value: &str) -> bool {
    !value.is_empty()
        && value.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

pub fn username(value: &str, _state: &WizardState) -> Validation {
    if value.is_empty() {
        Err(Rejection::stay("Username cannot be empty"))
    } else if !is_valid_name(value) {
        Err(Rejection::stay("Username must be alphanumeric"))
    } else {
        Ok(())
    }
}

pub fn password(value: &str, _state: &WizardState) -> Validation {
    if value.is_empty() {
        Err(Rejection::stay("Password cannot be empty"))
    } else {
        Ok(())
    }
}

pub fn confirm_password(value: &str, state: &WizardState) -> Validation {
    let original = state.value(FieldId::Password);
    if original.is_empty() || value != original {
        Err(Rejection::restart_at("Passwords do not match", FieldId::Password))
    } else {
        Ok(())
    }
}

pub fn hostname(value: &str, _state: &WizardState) -> Validation {
    if is_valid_name(value) {
        Ok(())
    } else {
        Err(Rejection::stay("Hostname must be alphanumeric"))
    }
}

pub fn keyboard(value: &str, _state: &WizardState) -> Validation {
    if value.is_empty() {
        Err(Rejection::stay("Keyboard layout is required"))
    } else {
        Ok(())
    }
}

pub fn timezone(value: &str, _state: &WizardState) -> Validation {
    if value.is_empty() {
        Err(Rejection::stay("Timezone is required"))
    } else {
        Ok(())
    }
}
