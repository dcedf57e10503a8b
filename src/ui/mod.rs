//! User interface rendering module
//!
//! This module is organized into submodules:
//! - `header` - Logo and the common screen frame
//! - `menus` - Single-choice menu (profile, disk)
//! - `screens` - Messages, stage status, confirmation and final screens
//!
//! The wizard form lives with the wizard itself; it uses the same frame.

pub mod header;
pub mod menus;
pub mod screens;

pub use header::{draw_frame, CONTENT_ROW};
pub use menus::select;
pub use screens::{
    confirm_destructive, show_coming_soon, show_completion, show_message, show_status,
};
