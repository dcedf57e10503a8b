//! Key decoding for raw-mode screens
//!
//! Raw mode delivers bytes, not keys. Arrow keys arrive as the three-byte
//! sequences `ESC [ A` / `ESC [ B`, while the Escape key alone is a single
//! `ESC`. The two are told apart by waiting briefly for a follow-up byte.

use std::io;
use std::time::Duration;

use crate::terminal::{Terminal, ESC};

/// How long to wait after `ESC` before treating it as a lone Escape.
pub const ESCAPE_WINDOW: Duration = Duration::from_millis(25);

/// A decoded key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Enter,
    /// `q` or a lone Escape
    Cancel,
    Digit(u8),
    Other(u8),
}

impl Key {
    /// Decode a single byte that is not part of an escape sequence.
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            b'j' => Key::Down,
            b'k' => Key::Up,
            b'\r' | b'\n' => Key::Enter,
            b'q' | ESC => Key::Cancel,
            b'0'..=b'9' => Key::Digit(byte - b'0'),
            other => Key::Other(other),
        }
    }
}

/// Read and decode the next key. `None` means input is exhausted.
pub fn read_key<T: Terminal + ?Sized>(term: &mut T) -> io::Result<Option<Key>> {
    let Some(byte) = term.read_byte()? else {
        return Ok(None);
    };
    if byte != ESC {
        return Ok(Some(Key::from_byte(byte)));
    }

    if !term.byte_pending(ESCAPE_WINDOW)? {
        return Ok(Some(Key::Cancel));
    }
    match term.read_byte()? {
        Some(b'[') => {}
        Some(other) => return Ok(Some(Key::Other(other))),
        None => return Ok(Some(Key::Cancel)),
    }
    match term.read_byte()? {
        Some(b'A') => Ok(Some(Key::Up)),
        Some(b'B') => Ok(Some(Key::Down)),
        Some(other) => Ok(Some(Key::Other(other))),
        None => Ok(Some(Key::Cancel)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::ScriptedTerminal;

    fn decode_all(bytes: &[u8]) -> Vec<Key> {
        let mut term = ScriptedTerminal::new(bytes);
        let mut keys = Vec::new();
        while let Some(key) = read_key(&mut term).unwrap() {
            keys.push(key);
        }
        keys
    }

    #[test]
    fn test_single_byte_keys() {
        assert_eq!(
            decode_all(b"jkq\r\n3x"),
            vec![Key::Down, Key::Up, Key::Cancel, Key::Enter, Key::Enter, Key::Digit(3), Key::Other(b'x')]
        );
    }

    #[test]
    fn test_arrow_sequences() {
        assert_eq!(decode_all(b"\x1b[B\x1b[A"), vec![Key::Down, Key::Up]);
    }

    #[test]
    fn test_lone_escape_is_cancel() {
        assert_eq!(decode_all(b"\x1b"), vec![Key::Cancel]);
    }

    #[test]
    fn test_unknown_sequence() {
        assert_eq!(decode_all(b"\x1b[C"), vec![Key::Other(b'C')]);
    }
}
