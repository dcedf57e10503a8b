//! Logic modules: translate profile choices into concrete actions.
//!
//! # Modules
//!
//! - `postinstall`: desktop setup after the system is bootable (non-fatal)

pub mod postinstall;
