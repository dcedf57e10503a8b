//! The form: field identities, their descriptors, and the values collected so far.

use strum::{Display, EnumIter, IntoEnumIterator};

use super::validate::{self, Validation};
use crate::config::{Secret, WizardConfig};
use crate::picker::{Enumeration, PickRequest};

/// The six form fields, in collection order. The discriminant is the number
/// the operator types on the review screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter)]
pub enum FieldId {
    Username = 0,
    Password = 1,
    ConfirmPassword = 2,
    Hostname = 3,
    Keyboard = 4,
    Timezone = 5,
}

impl FieldId {
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        FieldId::iter().nth(index)
    }

    /// The field collected after this one; `Timezone` is last.
    pub fn next(self) -> Self {
        FieldId::from_index(self.index() + 1).unwrap_or(FieldId::Timezone)
    }

    /// Fields re-collected when this one is picked on the review screen.
    ///
    /// Either password field re-prompts both, password first.
    pub fn edit_span(self) -> (FieldId, FieldId) {
        match self {
            FieldId::Password | FieldId::ConfirmPassword => {
                (FieldId::Password, FieldId::ConfirmPassword)
            }
            other => (other, other),
        }
    }

    pub fn spec(self) -> &'static FieldSpec {
        &FIELDS[self.index()]
    }
}

/// How a field's value is entered.
#[derive(Debug, Clone, Copy)]
pub enum InputKind {
    /// Line input with echo
    Text,
    /// Line input without echo; rendered as `********`
    Masked,
    /// Fuzzy picker over an external list
    Picker(PickerSpec),
}

#[derive(Debug, Clone, Copy)]
pub struct PickerSpec {
    pub source: fn() -> Enumeration,
    pub prompt: &'static str,
    pub header: &'static str,
    pub query: Option<&'static str>,
}

impl PickerSpec {
    pub fn request(&self) -> PickRequest {
        PickRequest {
            enumeration: (self.source)(),
            prompt: self.prompt.to_string(),
            header: self.header.to_string(),
            query: self.query.map(str::to_string),
        }
    }
}

/// Data-driven field descriptor.
#[derive(Debug)]
pub struct FieldSpec {
    pub id: FieldId,
    pub label: &'static str,
    pub kind: InputKind,
    /// Shown in place of an empty value on other fields' screens.
    pub placeholder: &'static str,
    /// Substituted for empty input before validation.
    pub fallback: Option<&'static str>,
    pub validate: fn(&str, &WizardState) -> Validation,
}

impl FieldSpec {
    pub fn is_masked(&self) -> bool {
        matches!(self.kind, InputKind::Masked)
    }

    /// Apply the fallback to raw input.
    pub fn resolve(&self, raw: String) -> String {
        match self.fallback {
            Some(fallback) if raw.is_empty() => fallback.to_string(),
            _ => raw,
        }
    }
}

pub const NOT_SET: &str = "[not set]";
pub const MASK: &str = "********";
pub const DEFAULT_HOSTNAME: &str = "tonarchy";
pub const DEFAULT_KEYMAP: &str = "us";

pub static FIELDS: [FieldSpec; 6] = [
    FieldSpec {
        id: FieldId::Username,
        label: "Username: ",
        kind: InputKind::Text,
        placeholder: NOT_SET,
        fallback: None,
        validate: validate::username,
    },
    FieldSpec {
        id: FieldId::Password,
        label: "Password: ",
        kind: InputKind::Masked,
        placeholder: NOT_SET,
        fallback: None,
        validate: validate::password,
    },
    FieldSpec {
        id: FieldId::ConfirmPassword,
        label: "Confirm Password: ",
        kind: InputKind::Masked,
        placeholder: NOT_SET,
        fallback: None,
        validate: validate::confirm_password,
    },
    FieldSpec {
        id: FieldId::Hostname,
        label: "Hostname: ",
        kind: InputKind::Text,
        placeholder: DEFAULT_HOSTNAME,
        fallback: Some(DEFAULT_HOSTNAME),
        validate: validate::hostname,
    },
    FieldSpec {
        id: FieldId::Keyboard,
        label: "Keyboard: ",
        kind: InputKind::Picker(PickerSpec {
            source: Enumeration::keymaps,
            prompt: "Keyboard: ",
            header: "Start typing to filter, Enter to select",
            query: Some(DEFAULT_KEYMAP),
        }),
        placeholder: DEFAULT_KEYMAP,
        fallback: Some(DEFAULT_KEYMAP),
        validate: validate::keyboard,
    },
    FieldSpec {
        id: FieldId::Timezone,
        label: "Timezone: ",
        kind: InputKind::Picker(PickerSpec {
            source: Enumeration::timezones,
            prompt: "Timezone: ",
            header: "Type your city/timezone, Enter to select",
            query: None,
        }),
        placeholder: NOT_SET,
        fallback: None,
        validate: validate::timezone,
    },
];

/// Values entered so far. Passwords are held as `Secret`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WizardState {
    username: String,
    password: Secret,
    confirmed_password: Secret,
    hostname: String,
    keyboard: String,
    timezone: String,
}

impl WizardState {
    pub fn value(&self, id: FieldId) -> &str {
        match id {
            FieldId::Username => &self.username,
            FieldId::Password => self.password.expose(),
            FieldId::ConfirmPassword => self.confirmed_password.expose(),
            FieldId::Hostname => &self.hostname,
            FieldId::Keyboard => &self.keyboard,
            FieldId::Timezone => &self.timezone,
        }
    }

    pub fn set(&mut self, id: FieldId, value: String) {
        match id {
            FieldId::Username => self.username = value,
            FieldId::Password => self.password = Secret::new(value),
            FieldId::ConfirmPassword => self.confirmed_password = Secret::new(value),
            FieldId::Hostname => self.hostname = value,
            FieldId::Keyboard => self.keyboard = value,
            FieldId::Timezone => self.timezone = value,
        }
    }

    pub fn clear(&mut self, id: FieldId) {
        self.set(id, String::new());
    }

    /// What the form shows for `id`; never the password itself.
    pub fn display_value(&self, id: FieldId) -> Option<&str> {
        let value = self.value(id);
        if value.is_empty() {
            None
        } else if id.spec().is_masked() {
            Some(MASK)
        } else {
            Some(value)
        }
    }

    /// First field whose stored value does not pass its validator.
    pub fn first_invalid(&self) -> Option<FieldId> {
        FieldId::iter().find(|&id| (id.spec().validate)(self.value(id), self).is_err())
    }

    /// Freeze into the immutable configuration. Callers check `first_invalid`.
    pub fn freeze(&self) -> WizardConfig {
        WizardConfig {
            username: self.username.clone(),
            password: self.password.clone(),
            hostname: self.hostname.clone(),
            keyboard: self.keyboard.clone(),
            timezone: self.timezone.clone(),
        }
    }
}
