//! Centralized colors and text styles for the installer screens
//!
//! Screens never pick raw colors; they pass a semantic `Style` to
//! `Terminal::draw_at` and the terminal backend maps it through this module.
//!
//! # Usage
//! ```rust
//! use tonarchy::theme::Style;
//!
//! let (color, bold) = (Style::Selected.color(), Style::Selected.is_bold());
//! assert!(bold);
//! # let _ = color;
//! ```

use crossterm::style::Color;

use crate::types::LogLevel;

// =============================================================================
// COLOR PALETTE
// =============================================================================

/// Core color palette. All colors are defined here rather than in screens.
pub struct Colors;

impl Colors {
    /// Default foreground text
    pub const FG_PRIMARY: Color = Color::White;

    /// Placeholder values (`[not set]`, defaults)
    pub const FG_MUTED: Color = Color::DarkGrey;

    /// Logo and completion banner
    pub const BRAND: Color = Color::Green;

    /// Selected menu entry and the active field marker
    pub const SELECTED: Color = Color::Blue;

    /// Entered field values
    pub const VALUE: Color = Color::Green;

    /// Navigation hints and the "coming soon" notice
    pub const HINT: Color = Color::Yellow;

    /// Destructive targets (the disk about to be wiped)
    pub const DANGER: Color = Color::Red;
}

// =============================================================================
// SEMANTIC STYLES
// =============================================================================

/// What a piece of text is, not how it looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Style {
    #[default]
    Text,
    Logo,
    Selected,
    Value,
    Muted,
    Hint,
    Danger,
    Success,
}

impl Style {
    pub fn color(self) -> Color {
        match self {
            Style::Text => Colors::FG_PRIMARY,
            Style::Logo | Style::Success => Colors::BRAND,
            Style::Selected => Colors::SELECTED,
            Style::Value => Colors::VALUE,
            Style::Muted => Colors::FG_MUTED,
            Style::Hint => Colors::HINT,
            Style::Danger => Colors::DANGER,
        }
    }

    pub fn is_bold(self) -> bool {
        matches!(self, Style::Logo | Style::Selected | Style::Success)
    }
}

/// Semantic helpers shared by several screens.
pub struct Theme;

impl Theme {
    /// Style used when a log record is surfaced on screen.
    pub fn log_style(level: LogLevel) -> Style {
        match level {
            LogLevel::Debug => Style::Muted,
            LogLevel::Info => Style::Text,
            LogLevel::Warn => Style::Hint,
            LogLevel::Error => Style::Danger,
        }
    }
}
