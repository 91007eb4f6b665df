//! Cancellation handling for staging runs.
//!
//! A first Ctrl-C requests shutdown and lets the in-flight operation finish —
//! an interrupted cache store must never leave a partial record visible, and
//! the temp-then-atomic-place discipline only holds if we don't kill the
//! process mid-rename. A second Ctrl-C exits immediately.

use std::sync::atomic::{AtomicBool, Ordering};

static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

pub fn install_signal_handler() {
    let _ = ctrlc::set_handler(move || {
        if SHUTDOWN_REQUESTED.load(Ordering::SeqCst) {
            std::process::exit(1);
        }
        SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
        eprintln!("\nshutdown requested, finishing current operation...");
    });
}

pub fn shutdown_requested() -> bool {
    SHUTDOWN_REQUESTED.load(Ordering::SeqCst)
}
