//! Terminal abstraction
//!
//! Everything the installer does with the screen and keyboard goes through the
//! `Terminal` trait: draw text at a position, query the size, read single
//! bytes, and switch the input discipline. `TtyTerminal` drives the real
//! console; `ScriptedTerminal` replays canned input for tests.
//!
//! # Input Modes
//!
//! | Mode              | Echo | Buffered | Used for |
//! |-------------------|------|----------|----------|
//! | `Cooked`          | yes  | line     | whatever the shell left us |
//! | `Raw`             | no   | byte     | menus, review screen, "press a key" |
//! | `Line{echo:true}` | yes  | line     | username, hostname, `yes` confirmation |
//! | `Line{echo:false}`| no   | line     | passwords |
//!
//! Mode changes go through `InputModeGuard`, which puts the previous mode back
//! when it goes out of scope.

mod scripted;
mod tty;

pub use scripted::{DrawnText, ScriptedTerminal};
pub use tty::{restore_original_mode, TtyTerminal};

use std::io;
use std::ops::{Deref, DerefMut};
use std::time::Duration;

use crate::theme::Style;

/// Byte sent by the Escape key.
pub const ESC: u8 = 0x1b;

/// Input discipline of the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Cooked,
    Raw,
    Line { echo: bool },
}

/// Minimal drawing and input surface.
pub trait Terminal {
    /// `(rows, cols)`
    fn size(&self) -> (u16, u16);

    fn clear(&mut self) -> io::Result<()>;

    /// Draw `text` starting at zero-based `row`/`col`.
    fn draw_at(&mut self, row: u16, col: u16, text: &str, style: Style) -> io::Result<()>;

    fn place_cursor(&mut self, row: u16, col: u16) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()>;

    /// Next input byte, `None` at end of input.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;

    /// Whether another byte arrives within `wait`.
    fn byte_pending(&mut self, wait: Duration) -> io::Result<bool>;

    fn input_mode(&self) -> InputMode;

    fn set_input_mode(&mut self, mode: InputMode) -> io::Result<()>;

    /// Hold the current screen for `duration`.
    fn pause(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

impl<T: Terminal + ?Sized> Terminal for &mut T {
    fn size(&self) -> (u16, u16) {
        (**self).size()
    }

    fn clear(&mut self) -> io::Result<()> {
        (**self).clear()
    }

    fn draw_at(&mut self, row: u16, col: u16, text: &str, style: Style) -> io::Result<()> {
        (**self).draw_at(row, col, text, style)
    }

    fn place_cursor(&mut self, row: u16, col: u16) -> io::Result<()> {
        (**self).place_cursor(row, col)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        (**self).read_byte()
    }

    fn byte_pending(&mut self, wait: Duration) -> io::Result<bool> {
        (**self).byte_pending(wait)
    }

    fn input_mode(&self) -> InputMode {
        (**self).input_mode()
    }

    fn set_input_mode(&mut self, mode: InputMode) -> io::Result<()> {
        (**self).set_input_mode(mode)
    }

    fn pause(&mut self, duration: Duration) {
        (**self).pause(duration)
    }
}

/// Scoped input mode: switches on creation, restores the previous mode on drop.
pub struct InputModeGuard<'a, T: Terminal + ?Sized> {
    term: &'a mut T,
    previous: InputMode,
}

impl<'a, T: Terminal + ?Sized> InputModeGuard<'a, T> {
    pub fn enter(term: &'a mut T, mode: InputMode) -> io::Result<Self> {
        let previous = term.input_mode();
        term.set_input_mode(mode)?;
        Ok(Self { term, previous })
    }
}

impl<T: Terminal + ?Sized> Deref for InputModeGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.term
    }
}

impl<T: Terminal + ?Sized> DerefMut for InputModeGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.term
    }
}

impl<T: Terminal + ?Sized> Drop for InputModeGuard<'_, T> {
    fn drop(&mut self) {
        if let Err(e) = self.term.set_input_mode(self.previous) {
            tracing::warn!("Failed to restore terminal mode {:?}: {}", self.previous, e);
        }
    }
}

/// Result of reading one line of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineInput {
    Line(String),
    /// The line contained an Escape byte.
    Cancelled,
    /// Input ended before anything was typed.
    Closed,
}

/// Read bytes up to the next newline in the current mode.
pub fn read_line<T: Terminal + ?Sized>(term: &mut T) -> io::Result<LineInput> {
    let mut bytes = Vec::new();
    let mut escaped = false;

    loop {
        match term.read_byte()? {
            None if bytes.is_empty() && !escaped => return Ok(LineInput::Closed),
            None | Some(b'\n') => break,
            Some(ESC) => escaped = true,
            Some(b) => bytes.push(b),
        }
    }

    if escaped {
        return Ok(LineInput::Cancelled);
    }
    if bytes.last() == Some(&b'\r') {
        bytes.pop();
    }
    Ok(LineInput::Line(String::from_utf8_lossy(&bytes).into_owned()))
}

/// Read one line with the given echo setting, restoring the mode afterwards.
pub fn prompt_line<T: Terminal + ?Sized>(term: &mut T, echo: bool) -> io::Result<LineInput> {
    let mut guard = InputModeGuard::enter(term, InputMode::Line { echo })?;
    guard.flush()?;
    read_line(&mut *guard)
}

/// Block until one raw key press; `false` if input is exhausted.
pub fn wait_for_key<T: Terminal + ?Sized>(term: &mut T) -> io::Result<bool> {
    let mut guard = InputModeGuard::enter(term, InputMode::Raw)?;
    guard.flush()?;
    Ok(guard.read_byte()?.is_some())
}
