//! In-memory terminal that replays canned input and records what was drawn.

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use super::{InputMode, Terminal};
use crate::theme::Style;

/// One `draw_at` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawnText {
    pub row: u16,
    pub col: u16,
    pub text: String,
    pub style: Style,
}

/// Test double for `Terminal`.
///
/// Input bytes are consumed in order; once they run out `read_byte` reports
/// end of input. A byte counts as pending for `byte_pending` only if it is
/// already queued, so a trailing `ESC` is a lone Escape.
#[derive(Debug, Clone)]
pub struct ScriptedTerminal {
    input: VecDeque<u8>,
    size: (u16, u16),
    mode: InputMode,
    modes: Vec<InputMode>,
    screen: Vec<DrawnText>,
    transcript: Vec<DrawnText>,
    clears: usize,
    pauses: Vec<Duration>,
}

impl ScriptedTerminal {
    pub fn new(input: &[u8]) -> Self {
        Self {
            input: input.iter().copied().collect(),
            size: (40, 120),
            mode: InputMode::Cooked,
            modes: Vec::new(),
            screen: Vec::new(),
            transcript: Vec::new(),
            clears: 0,
            pauses: Vec::new(),
        }
    }

    pub fn with_size(mut self, rows: u16, cols: u16) -> Self {
        self.size = (rows, cols);
        self
    }

    /// Queue more input.
    pub fn push_input(&mut self, bytes: &[u8]) {
        self.input.extend(bytes.iter().copied());
    }

    pub fn remaining_input(&self) -> usize {
        self.input.len()
    }

    /// Text drawn since the last `clear`.
    pub fn screen(&self) -> &[DrawnText] {
        &self.screen
    }

    /// Every text drawn since creation.
    pub fn transcript(&self) -> &[DrawnText] {
        &self.transcript
    }

    /// Whether the current screen shows `needle` anywhere.
    pub fn screen_contains(&self, needle: &str) -> bool {
        self.screen.iter().any(|d| d.text.contains(needle))
    }

    /// Whether anything ever drawn contained `needle`.
    pub fn ever_showed(&self, needle: &str) -> bool {
        self.transcript.iter().any(|d| d.text.contains(needle))
    }

    pub fn clear_count(&self) -> usize {
        self.clears
    }

    /// Every mode passed to `set_input_mode`, in order.
    pub fn mode_history(&self) -> &[InputMode] {
        &self.modes
    }

    pub fn pauses(&self) -> &[Duration] {
        &self.pauses
    }
}

impl Terminal for ScriptedTerminal {
    fn size(&self) -> (u16, u16) {
        self.size
    }

    fn clear(&mut self) -> io::Result<()> {
        self.clears += 1;
        self.screen.clear();
        Ok(())
    }

    fn draw_at(&mut self, row: u16, col: u16, text: &str, style: Style) -> io::Result<()> {
        let drawn = DrawnText { row, col, text: text.to_string(), style };
        self.screen.push(drawn.clone());
        self.transcript.push(drawn);
        Ok(())
    }

    fn place_cursor(&mut self, _row: u16, _col: u16) -> io::Result<()> {
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        Ok(self.input.pop_front())
    }

    fn byte_pending(&mut self, _wait: Duration) -> io::Result<bool> {
        Ok(!self.input.is_empty())
    }

    fn input_mode(&self) -> InputMode {
        self.mode
    }

    fn set_input_mode(&mut self, mode: InputMode) -> io::Result<()> {
        self.mode = mode;
        self.modes.push(mode);
        Ok(())
    }

    fn pause(&mut self, duration: Duration) {
        self.pauses.push(duration);
    }
}
