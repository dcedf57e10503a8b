//! Terminal restoration on abnormal exit.
//!
//! The wizard puts the TTY into raw mode. If the process is interrupted
//! (Ctrl+C, SIGTERM, a closed terminal) or panics, the original terminal
//! attributes must be restored before exiting, otherwise the user is left
//! with a shell that does not echo.
//!
//! Commands already running are not cancelled: an interrupted `pacstrap`
//! keeps going in its own process until the kernel tears it down with us.
//!
//! # Usage
//!
//! ```no_run
//! let _guard = tonarchy::process_guard::ProcessGuard::install()?;
//! // ... run the wizard and pipeline ...
//! # Ok::<(), std::io::Error>(())
//! ```

use std::io;
use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM};
use signal_hook::iterator::{Handle, Signals};

use crate::terminal;

/// Set once handlers are installed; a second `install` is a no-op guard.
static INSTALLED: AtomicBool = AtomicBool::new(false);

/// Signals that trigger terminal restoration and exit.
pub const HANDLED_SIGNALS: [i32; 3] = [SIGINT, SIGTERM, SIGHUP];

/// Conventional shell exit status for a process killed by `sig`.
pub fn exit_code_for_signal(sig: i32) -> i32 {
    128 + sig
}

/// Human-readable signal name for the log.
pub fn signal_name(sig: i32) -> &'static str {
    match sig {
        SIGINT => "SIGINT",
        SIGTERM => "SIGTERM",
        SIGHUP => "SIGHUP",
        _ => "UNKNOWN",
    }
}

/// RAII handle for the installed handlers.
///
/// Dropping the guard restores the terminal and stops the signal thread.
/// The panic hook stays installed for the rest of the process.
pub struct ProcessGuard {
    handle: Option<Handle>,
}

impl ProcessGuard {
    /// Install the panic hook and the signal thread.
    ///
    /// Only the first call installs anything; later calls return an inert
    /// guard.
    pub fn install() -> io::Result<Self> {
        if INSTALLED.swap(true, Ordering::SeqCst) {
            tracing::debug!("Process guard already installed");
            return Ok(Self { handle: None });
        }

        install_panic_hook();

        let mut signals = Signals::new(HANDLED_SIGNALS)?;
        let handle = signals.handle();

        std::thread::Builder::new()
            .name("signal-guard".to_string())
            .spawn(move || {
                if let Some(sig) = signals.forever().next() {
                    tracing::info!("Received {}, restoring terminal", signal_name(sig));
                    restore_terminal();
                    std::process::exit(exit_code_for_signal(sig));
                }
            })?;

        tracing::debug!("Process guard installed");
        Ok(Self { handle: Some(handle) })
    }

    /// Whether this guard owns the signal thread.
    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for ProcessGuard {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            tracing::debug!("ProcessGuard dropped, restoring terminal");
            handle.close();
            restore_terminal();
        }
    }
}

fn install_panic_hook() {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        restore_terminal();
        previous(info);
    }));
}

fn restore_terminal() {
    if let Err(e) = terminal::restore_original_mode() {
        tracing::warn!("Failed to restore terminal: {}", e);
    }
}
