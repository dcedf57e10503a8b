//! Logo and common screen frame
//!
//! Every screen starts the same way: clear, draw the logo centered on a
//! 70-column block, then place content below it in the logo's left column.

use std::io;

use crate::terminal::Terminal;
use crate::theme::Style;

/// Width of the logo block; content is aligned to its left edge.
pub const LOGO_WIDTH: u16 = 70;

/// Zero-based row of the first logo line.
pub const LOGO_ROW: u16 = 1;

/// Zero-based row where screen content starts, below the logo.
pub const CONTENT_ROW: u16 = 9;

const LOGO: [&str; 6] = [
    "████████╗ ██████╗ ███╗   ██╗ █████╗ ██████╗  ██████╗██╗  ██╗██╗   ██╗",
    "╚══██╔══╝██╔═══██╗████╗  ██║██╔══██╗██╔══██╗██╔════╝██║  ██║╚██╗ ██╔╝",
    "   ██║   ██║   ██║██╔██╗ ██║███████║██████╔╝██║     ███████║ ╚████╔╝ ",
    "   ██║   ██║   ██║██║╚██╗██║██╔══██║██╔══██╗██║     ██╔══██║  ╚██╔╝  ",
    "   ██║   ╚██████╔╝██║ ╚████║██║  ██║██║  ██║╚██████╗██║  ██║   ██║   ",
    "   ╚═╝    ╚═════╝ ╚═╝  ╚═══╝╚═╝  ╚═╝╚═╝  ╚═╝ ╚═════╝╚═╝  ╚═╝   ╚═╝   ",
];

/// Left column of the logo block for a terminal `cols` wide.
pub fn left_column(cols: u16) -> u16 {
    cols.saturating_sub(LOGO_WIDTH) / 2
}

/// Clear the screen and draw the logo. Returns the content column.
pub fn draw_frame<T: Terminal + ?Sized>(term: &mut T) -> io::Result<u16> {
    let (_, cols) = term.size();
    let left = left_column(cols);

    term.clear()?;
    for (offset, line) in (0u16..).zip(LOGO.iter()) {
        term.draw_at(LOGO_ROW + offset, left, line, Style::Logo)?;
    }
    Ok(left)
}
