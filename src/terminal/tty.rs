//! Real console backend: termios for the input discipline, crossterm for drawing.
//!
//! Input is read straight from `/dev/tty` through an unbuffered `File` so that
//! `poll` reflects exactly what has not been consumed yet (the lone-Escape
//! check depends on it). Output goes to stdout through crossterm commands.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Stdout, Write};
use std::os::fd::AsFd;
use std::sync::Mutex;
use std::time::Duration;

use crossterm::style::{Attribute, Print, ResetColor, SetAttribute, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType};
use crossterm::{cursor, execute, queue};
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use nix::sys::termios::{self, LocalFlags, SetArg, SpecialCharacterIndices, Termios};

use super::{InputMode, Terminal};
use crate::theme::Style;

const TTY_PATH: &str = "/dev/tty";

/// Attributes found at startup, restored on exit, panic, or fatal signal.
static ORIGINAL_ATTRS: Mutex<Option<Termios>> = Mutex::new(None);

pub struct TtyTerminal {
    tty: File,
    out: Stdout,
    original: Termios,
    mode: InputMode,
}

impl TtyTerminal {
    /// Open the controlling terminal and remember its current attributes.
    pub fn open() -> io::Result<Self> {
        let tty = OpenOptions::new().read(true).write(true).open(TTY_PATH)?;
        let original = termios::tcgetattr(tty.as_fd())?;

        let mut slot = ORIGINAL_ATTRS.lock().unwrap_or_else(|e| e.into_inner());
        if slot.is_none() {
            *slot = Some(original.clone());
        }
        drop(slot);

        tracing::debug!("Opened {}", TTY_PATH);
        Ok(Self { tty, out: io::stdout(), original, mode: InputMode::Cooked })
    }

    fn attributes_for(&self, mode: InputMode) -> Termios {
        let mut attrs = self.original.clone();
        match mode {
            InputMode::Cooked => {}
            InputMode::Raw => {
                attrs.local_flags.remove(LocalFlags::ECHO | LocalFlags::ICANON);
                attrs.control_chars[SpecialCharacterIndices::VMIN as usize] = 1;
                attrs.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;
            }
            InputMode::Line { echo } => {
                attrs.local_flags.insert(LocalFlags::ICANON);
                attrs.local_flags.set(LocalFlags::ECHO, echo);
                // Ctrl+C inside a prompt must not kill the installer mid-entry.
                attrs.local_flags.remove(LocalFlags::ISIG);
            }
        }
        attrs
    }
}

impl Terminal for TtyTerminal {
    fn size(&self) -> (u16, u16) {
        match crossterm::terminal::size() {
            Ok((cols, rows)) => (rows, cols),
            Err(_) => (24, 80),
        }
    }

    fn clear(&mut self) -> io::Result<()> {
        queue!(self.out, Clear(ClearType::All), cursor::MoveTo(0, 0))?;
        self.out.flush()
    }

    fn draw_at(&mut self, row: u16, col: u16, text: &str, style: Style) -> io::Result<()> {
        queue!(self.out, cursor::MoveTo(col, row), SetForegroundColor(style.color()))?;
        if style.is_bold() {
            queue!(self.out, SetAttribute(Attribute::Bold))?;
        }
        queue!(self.out, Print(text), SetAttribute(Attribute::Reset), ResetColor)
    }

    fn place_cursor(&mut self, row: u16, col: u16) -> io::Result<()> {
        queue!(self.out, cursor::MoveTo(col, row))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut buf = [0u8; 1];
        loop {
            match self.tty.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    fn byte_pending(&mut self, wait: Duration) -> io::Result<bool> {
        let millis = u16::try_from(wait.as_millis()).unwrap_or(u16::MAX);
        let mut fds = [PollFd::new(self.tty.as_fd(), PollFlags::POLLIN)];
        let ready = poll(&mut fds, PollTimeout::from(millis))?;
        Ok(ready > 0)
    }

    fn input_mode(&self) -> InputMode {
        self.mode
    }

    fn set_input_mode(&mut self, mode: InputMode) -> io::Result<()> {
        if mode == self.mode {
            return Ok(());
        }
        let attrs = self.attributes_for(mode);
        termios::tcsetattr(self.tty.as_fd(), SetArg::TCSAFLUSH, &attrs)?;
        self.mode = mode;
        Ok(())
    }
}

impl Drop for TtyTerminal {
    fn drop(&mut self) {
        if self.mode != InputMode::Cooked {
            let _ = termios::tcsetattr(self.tty.as_fd(), SetArg::TCSAFLUSH, &self.original);
        }
        let _ = execute!(self.out, ResetColor, cursor::Show);
    }
}

/// Put the console back the way it was found. Safe to call from the panic
/// hook and the signal thread; a no-op if no `TtyTerminal` was ever opened.
pub fn restore_original_mode() -> io::Result<()> {
    let slot = ORIGINAL_ATTRS.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(ref attrs) = *slot {
        let tty = File::open(TTY_PATH)?;
        termios::tcsetattr(tty.as_fd(), SetArg::TCSANOW, attrs)?;
    }
    let mut out = io::stdout();
    execute!(out, ResetColor, cursor::Show)?;
    writeln!(out)
}
