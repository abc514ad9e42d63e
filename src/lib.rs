pub mod cli;
pub mod cmd;
pub mod config;
pub mod error;
pub mod host;
pub mod layout;
pub mod logging;
pub mod lsblk;
pub mod pipeline;
pub mod prompt;
pub mod steps;
pub mod ui;
pub mod validation;

use std::sync::atomic::{AtomicBool, Ordering};

// ── Global interrupt flag ─────────────────────────────────────────────────────

/// Set by the Ctrl-C handler. The running child gets the same SIGINT from the
/// terminal and exits; this flag lets the caller tell that failure apart from
/// a genuine command error.
pub static INTERRUPTED: AtomicBool = AtomicBool::new(false);

#[inline]
pub fn was_interrupted() -> bool {
    INTERRUPTED.load(Ordering::Relaxed)
}

/// Installs the Ctrl-C handler that records interrupts in [`INTERRUPTED`].
pub fn install_interrupt_handler() -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(|| INTERRUPTED.store(true, Ordering::Relaxed))
}
