//! Interactive setup wizard
//!
//! Collects the six form fields in order, then shows a review screen from
//! which any field can be re-entered without losing the others.
//!
//! # State Transitions
//!
//! ```text
//! Collecting(Username) -> ... -> Collecting(Timezone) -> Review
//! Review --Enter--> Done(WizardConfig)
//! Review --q/Esc--> Aborted
//! Review --0..5---> Collecting(field..=span end) -> Review
//! ```
//!
//! A rejected value keeps the wizard on the same field, except a password
//! mismatch, which clears both password values and goes back to the
//! password. End of input, an Escape typed into a line, or a picker that
//! cannot run all end in `Aborted`.

pub mod fields;
pub mod validate;

use std::time::Duration;

use strum::IntoEnumIterator;

use crate::config::WizardConfig;
use crate::error::Result;
use crate::input::{read_key, Key};
use crate::install_log::InstallLog;
use crate::picker::FuzzyPicker;
use crate::terminal::{prompt_line, InputMode, InputModeGuard, LineInput, Terminal};
use crate::theme::Style;
use crate::ui::{draw_frame, show_message, CONTENT_ROW};

pub use fields::{FieldId, FieldSpec, InputKind, WizardState, FIELDS};
pub use validate::Rejection;

/// Footer on the review screen.
pub const REVIEW_HINT: &str = "Press Enter to continue, or field number to edit (0-5)";

/// How the wizard ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardOutcome {
    Done(WizardConfig),
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Collect `field`, then continue up to and including `last`.
    Collecting { field: FieldId, last: FieldId },
    Review,
}

enum Step {
    Accepted,
    Rejected(Rejection),
    Abort,
}

enum ReviewChoice {
    Accept,
    Cancel,
    Edit(FieldId),
    Redraw,
}

/// The wizard engine. Borrow the terminal and picker for one run.
pub struct Wizard<'a, T: Terminal + ?Sized, P: FuzzyPicker + ?Sized> {
    term: &'a mut T,
    picker: &'a mut P,
    log: &'a InstallLog,
    message_delay: Duration,
    state: WizardState,
}

impl<'a, T: Terminal + ?Sized, P: FuzzyPicker + ?Sized> Wizard<'a, T, P> {
    pub fn new(term: &'a mut T, picker: &'a mut P, log: &'a InstallLog) -> Self {
        Self {
            term,
            picker,
            log,
            message_delay: Duration::from_secs(2),
            state: WizardState::default(),
        }
    }

    /// How long validation messages stay on screen.
    pub fn with_message_delay(mut self, delay: Duration) -> Self {
        self.message_delay = delay;
        self
    }

    /// Run to completion.
    ///
    /// # Errors
    ///
    /// Only terminal I/O failures are errors; every operator action ends in
    /// a `WizardOutcome`.
    pub fn run(mut self) -> Result<WizardOutcome> {
        let mut phase = Phase::Collecting { field: FieldId::Username, last: FieldId::Timezone };

        loop {
            phase = match phase {
                Phase::Collecting { field, last } => match self.collect(field)? {
                    Step::Accepted if field == last => Phase::Review,
                    Step::Accepted => Phase::Collecting { field: field.next(), last },
                    Step::Rejected(rejection) => {
                        self.log.debug(format!("{} rejected: {}", field, rejection.message));
                        show_message(&mut *self.term, rejection.message, self.message_delay)?;
                        match rejection.restart {
                            Some(restart) => {
                                for id in FieldId::iter().filter(|id| (restart..=field).contains(id)) {
                                    self.state.clear(id);
                                }
                                Phase::Collecting { field: restart, last }
                            }
                            None => Phase::Collecting { field, last },
                        }
                    }
                    Step::Abort => return Ok(WizardOutcome::Aborted),
                },
                Phase::Review => match self.review()? {
                    ReviewChoice::Accept => match self.state.first_invalid() {
                        Some(field) => Phase::Collecting { field, last: field.edit_span().1 },
                        None => {
                            self.log.info("Setup form completed");
                            return Ok(WizardOutcome::Done(self.state.freeze()));
                        }
                    },
                    ReviewChoice::Cancel => {
                        self.log.info("Installation cancelled by user at review screen");
                        return Ok(WizardOutcome::Aborted);
                    }
                    ReviewChoice::Edit(field) => {
                        let (first, last) = field.edit_span();
                        Phase::Collecting { field: first, last }
                    }
                    ReviewChoice::Redraw => Phase::Review,
                },
            };
        }
    }

    /// Prompt for one field and apply the result to the state.
    fn collect(&mut self, id: FieldId) -> Result<Step> {
        let spec = id.spec();

        let raw = match spec.kind {
            InputKind::Text | InputKind::Masked => {
                let row = self.draw_form(Some(id))?;
                let (_, cols) = self.term.size();
                let col = crate::ui::header::left_column(cols) + 2 + spec.label.len() as u16;
                self.term.place_cursor(row, col)?;

                match prompt_line(&mut *self.term, !spec.is_masked())? {
                    LineInput::Line(line) => line,
                    LineInput::Cancelled => {
                        self.log.info(format!("Installation cancelled by user at {}", id));
                        return Ok(Step::Abort);
                    }
                    LineInput::Closed => {
                        self.log.info(format!("Input closed at {}", id));
                        return Ok(Step::Abort);
                    }
                }
            }
            InputKind::Picker(picker) => {
                self.term.clear()?;
                self.term.flush()?;
                match self.picker.pick(&picker.request()) {
                    // Nothing picked keeps an already accepted value.
                    Ok(choice) => choice
                        .filter(|line| !line.is_empty())
                        .unwrap_or_else(|| self.state.value(id).to_string()),
                    Err(e) => {
                        self.log.error(format!("{} selector failed: {}", id, e));
                        return Ok(Step::Abort);
                    }
                }
            }
        };

        let value = spec.resolve(raw);
        match (spec.validate)(&value, &self.state) {
            Ok(()) => {
                self.state.set(id, value);
                if id == FieldId::Password {
                    self.state.clear(FieldId::ConfirmPassword);
                }
                Ok(Step::Accepted)
            }
            Err(rejection) => Ok(Step::Rejected(rejection)),
        }
    }

    fn review(&mut self) -> Result<ReviewChoice> {
        self.draw_form(None)?;
        let (_, cols) = self.term.size();
        let left = crate::ui::header::left_column(cols);
        self.term.draw_at(CONTENT_ROW + 10, left, REVIEW_HINT, Style::Hint)?;

        let mut term = InputModeGuard::enter(&mut *self.term, InputMode::Raw)?;
        term.flush()?;
        let choice = match read_key(&mut *term)? {
            None => {
                self.log.info("Input closed at review screen");
                ReviewChoice::Cancel
            }
            Some(Key::Enter) => ReviewChoice::Accept,
            Some(Key::Cancel) => ReviewChoice::Cancel,
            Some(Key::Digit(n)) => match FieldId::from_index(usize::from(n)) {
                Some(field) => ReviewChoice::Edit(field),
                None => ReviewChoice::Redraw,
            },
            Some(_) => ReviewChoice::Redraw,
        };
        Ok(choice)
    }

    /// Draw the form with `current` marked. Returns the row of `current`.
    fn draw_form(&mut self, current: Option<FieldId>) -> Result<u16> {
        let term = &mut *self.term;
        let left = draw_frame(term)?;
        term.draw_at(CONTENT_ROW, left, "Setup your system:", Style::Text)?;

        let mut current_row = CONTENT_ROW + 2;
        for (offset, spec) in (0u16..).zip(FIELDS.iter()) {
            let row = CONTENT_ROW + 2 + offset;
            let is_current = current == Some(spec.id);
            if is_current {
                term.draw_at(row, left, ">", Style::Selected)?;
                current_row = row;
            }
            term.draw_at(row, left + 2, spec.label, Style::Text)?;

            let value_col = left + 2 + spec.label.len() as u16;
            match self.state.display_value(spec.id) {
                Some(shown) => term.draw_at(row, value_col, shown, Style::Value)?,
                None if !is_current => term.draw_at(row, value_col, spec.placeholder, Style::Muted)?,
                None => {}
            }
        }
        term.flush()?;
        Ok(current_row)
    }
}
