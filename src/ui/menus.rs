//! Single-choice menu
//!
//! Used for the profile choice and the target disk choice. The whole screen
//! is redrawn on every navigation key; nothing is diffed.

use super::header::{draw_frame, CONTENT_ROW};
use crate::error::{Result, TonarchyError};
use crate::input::{read_key, Key};
use crate::terminal::{InputMode, InputModeGuard, Terminal};
use crate::theme::Style;

/// Footer shown under every menu.
pub const MENU_HINT: &str = "j/k Navigate  Enter Select";

/// Draw `items` with `selected` highlighted.
pub fn draw_menu<T, S>(term: &mut T, items: &[S], selected: usize) -> std::io::Result<()>
where
    T: Terminal + ?Sized,
    S: AsRef<str>,
{
    let left = draw_frame(term)?;

    let mut row = CONTENT_ROW;
    for (index, item) in items.iter().enumerate() {
        if index == selected {
            term.draw_at(row, left + 2, &format!("> {}", item.as_ref()), Style::Selected)?;
        } else {
            term.draw_at(row, left + 2, &format!("  {}", item.as_ref()), Style::Text)?;
        }
        row += 1;
    }

    term.draw_at(row + 2, left, MENU_HINT, Style::Hint)?;
    term.flush()
}

/// Let the operator pick one of `items`.
///
/// Returns `Ok(Some(index))` on Enter and `Ok(None)` on `q`, Escape, or end
/// of input.
///
/// # Errors
///
/// An empty `items` list is rejected without drawing anything.
pub fn select<T, S>(term: &mut T, items: &[S]) -> Result<Option<usize>>
where
    T: Terminal + ?Sized,
    S: AsRef<str>,
{
    if items.is_empty() {
        return Err(TonarchyError::terminal("menu has no items to select from"));
    }

    let mut term = InputModeGuard::enter(term, InputMode::Raw)?;
    let mut selected = 0usize;
    draw_menu(&mut *term, items, selected)?;

    loop {
        match read_key(&mut *term)? {
            None | Some(Key::Cancel) => return Ok(None),
            Some(Key::Enter) => return Ok(Some(selected)),
            Some(Key::Down) => {
                if selected + 1 < items.len() {
                    selected += 1;
                }
                draw_menu(&mut *term, items, selected)?;
            }
            Some(Key::Up) => {
                selected = selected.saturating_sub(1);
                draw_menu(&mut *term, items, selected)?;
            }
            Some(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::ScriptedTerminal;

    const ITEMS: [&str; 3] = ["first", "second", "third"];

    #[test]
    fn test_enter_selects_first_by_default() {
        let mut term = ScriptedTerminal::new(b"\r");
        assert_eq!(select(&mut term, &ITEMS).unwrap(), Some(0));
        assert!(term.screen_contains("> first"));
        assert!(term.screen_contains(MENU_HINT));
    }

    #[test]
    fn test_navigation_clamps_at_ends() {
        let mut term = ScriptedTerminal::new(b"kjjjj\n");
        assert_eq!(select(&mut term, &ITEMS).unwrap(), Some(2));
        assert!(term.screen_contains("> third"));
        assert!(term.screen_contains("  first"));
    }

    #[test]
    fn test_arrow_keys() {
        let mut term = ScriptedTerminal::new(b"\x1b[B\x1b[B\x1b[A\r");
        assert_eq!(select(&mut term, &ITEMS).unwrap(), Some(1));
    }

    #[test]
    fn test_redraws_every_step() {
        let mut term = ScriptedTerminal::new(b"jk\r");
        select(&mut term, &ITEMS).unwrap();
        assert_eq!(term.clear_count(), 3);
    }

    #[test]
    fn test_cancel_and_exhaustion() {
        let mut term = ScriptedTerminal::new(b"jq");
        assert_eq!(select(&mut term, &ITEMS).unwrap(), None);

        let mut term = ScriptedTerminal::new(b"j\x1b");
        assert_eq!(select(&mut term, &ITEMS).unwrap(), None);

        let mut term = ScriptedTerminal::new(b"jj");
        assert_eq!(select(&mut term, &ITEMS).unwrap(), None);
    }

    #[test]
    fn test_raw_mode_is_restored() {
        let mut term = ScriptedTerminal::new(b"\r");
        select(&mut term, &ITEMS).unwrap();
        assert_eq!(term.mode_history(), [InputMode::Raw, InputMode::Cooked]);
    }

    #[test]
    fn test_empty_menu_is_an_error() {
        let mut term = ScriptedTerminal::new(b"\r");
        let empty: [&str; 0] = [];
        assert!(matches!(select(&mut term, &empty), Err(TonarchyError::Terminal(_))));
        assert_eq!(term.clear_count(), 0);
        assert_eq!(term.remaining_input(), 1);
    }
}
