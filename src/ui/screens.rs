//! Full-screen messages and prompts shown outside the wizard form.

use std::io;
use std::time::Duration;

use super::header::{draw_frame, CONTENT_ROW};
use crate::terminal::{prompt_line, wait_for_key, LineInput, Terminal};
use crate::theme::Style;

/// The only answer that authorizes wiping the disk.
pub const CONFIRM_WORD: &str = "yes";

/// Show `message` under the logo and hold it for `delay`.
pub fn show_message<T: Terminal + ?Sized>(term: &mut T, message: &str, delay: Duration) -> io::Result<()> {
    let left = draw_frame(term)?;
    term.draw_at(CONTENT_ROW, left, message, Style::Text)?;
    term.flush()?;
    term.pause(delay);
    Ok(())
}

/// Show a stage status. Does not wait.
pub fn show_status<T: Terminal + ?Sized>(term: &mut T, lines: &[&str]) -> io::Result<()> {
    let left = draw_frame(term)?;
    for (offset, line) in (0u16..).zip(lines) {
        term.draw_at(CONTENT_ROW + offset, left, line, Style::Text)?;
    }
    term.flush()
}

/// Ask for the literal confirmation word before the disk is wiped.
///
/// Anything but an exact `yes` (including end of input or Escape) declines.
pub fn confirm_destructive<T: Terminal + ?Sized>(term: &mut T, device: &str) -> io::Result<bool> {
    let left = draw_frame(term)?;

    let lead = "WARNING: All data on ";
    let mut col = left;
    term.draw_at(CONTENT_ROW, col, lead, Style::Text)?;
    col += lead.chars().count() as u16;
    term.draw_at(CONTENT_ROW, col, device, Style::Danger)?;
    col += device.chars().count() as u16;
    term.draw_at(CONTENT_ROW, col, " will be destroyed!", Style::Text)?;

    let question = "Type 'yes' to confirm: ";
    term.draw_at(CONTENT_ROW + 2, left, question, Style::Text)?;
    term.place_cursor(CONTENT_ROW + 2, left + question.len() as u16)?;

    Ok(matches!(prompt_line(term, true)?, LineInput::Line(answer) if answer == CONFIRM_WORD))
}

/// Final screen after a completed run. Waits for one key.
pub fn show_completion<T: Terminal + ?Sized>(term: &mut T, will_reboot: bool) -> io::Result<()> {
    let left = draw_frame(term)?;
    term.draw_at(CONTENT_ROW, left, "Installation complete!", Style::Success)?;
    let hint = if will_reboot { "Press Enter to reboot..." } else { "Press any key to exit..." };
    term.draw_at(CONTENT_ROW + 2, left, hint, Style::Text)?;
    wait_for_key(term)?;
    Ok(())
}

/// Placeholder for the Expert profile. Waits for one key.
pub fn show_coming_soon<T: Terminal + ?Sized>(term: &mut T) -> io::Result<()> {
    let left = draw_frame(term)?;
    term.draw_at(CONTENT_ROW, left, "Expert mode coming soon!", Style::Hint)?;
    term.draw_at(
        CONTENT_ROW + 2,
        left,
        "This mode will allow full customization of your installation.",
        Style::Text,
    )?;
    term.draw_at(CONTENT_ROW + 4, left, "Press any key to exit...", Style::Text)?;
    wait_for_key(term)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::{InputMode, ScriptedTerminal};

    #[test]
    fn test_show_message_pauses() {
        let mut term = ScriptedTerminal::new(b"");
        show_message(&mut term, "Passwords do not match", Duration::from_secs(2)).unwrap();
        assert!(term.screen_contains("Passwords do not match"));
        assert_eq!(term.pauses(), [Duration::from_secs(2)]);
    }

    #[test]
    fn test_confirm_requires_exact_yes() {
        for (input, expected) in [
            (&b"yes\n"[..], true),
            (&b"YES\n"[..], false),
            (&b"yes \n"[..], false),
            (&b"y\n"[..], false),
            (&b"\n"[..], false),
            (&b""[..], false),
            (&b"yes\x1b\n"[..], false),
        ] {
            let mut term = ScriptedTerminal::new(input);
            assert_eq!(confirm_destructive(&mut term, "/dev/sda").unwrap(), expected, "{:?}", input);
        }
    }

    #[test]
    fn test_confirm_screen_and_mode() {
        let mut term = ScriptedTerminal::new(b"yes\n");
        confirm_destructive(&mut term, "/dev/nvme0n1").unwrap();
        assert!(term.screen_contains("WARNING: All data on "));
        assert!(term.screen().iter().any(|d| d.text == "/dev/nvme0n1" && d.style == Style::Danger));
        assert_eq!(term.mode_history(), [InputMode::Line { echo: true }, InputMode::Cooked]);
    }

    #[test]
    fn test_completion_waits_for_key() {
        let mut term = ScriptedTerminal::new(b"\r");
        show_completion(&mut term, true).unwrap();
        assert!(term.screen_contains("Installation complete!"));
        assert!(term.screen_contains("Press Enter to reboot..."));
        assert_eq!(term.remaining_input(), 0);
    }

    #[test]
    fn test_coming_soon() {
        let mut term = ScriptedTerminal::new(b"x");
        show_coming_soon(&mut term).unwrap();
        assert!(term.screen_contains("Expert mode coming soon!"));
    }
}
