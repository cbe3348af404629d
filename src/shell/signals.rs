//! SIGINT/SIGTSTP discipline.
//!
//! The interpreter runs a two-state machine over its SIGINT disposition.
//! Idle (reading a line, running builtins): a minimal handler records the
//! interrupt in a flag and the read loop redraws the prompt. Foreground-wait
//! (a non-backgrounded pipeline is running): the interpreter ignores SIGINT
//! so the interrupt reaches only the children, which restore the default
//! disposition before exec. SIGTSTP is ignored by the interpreter for its
//! whole lifetime and reset to default in every child.

use std::sync::atomic::{AtomicBool, Ordering};

use failure::ResultExt;
use nix::libc;
use nix::sys::signal::{self, SigHandler, Signal};

use crate::errors::{ErrorKind, Result};

static SIGINT_RECEIVED: AtomicBool = AtomicBool::new(false);

extern "C" fn handle_sigint(_signum: libc::c_int) {
    // Async-signal-safe: only set the flag, the read loop does the rest.
    SIGINT_RECEIVED.store(true, Ordering::SeqCst);
}

/// Installs the idle dispositions for the interpreter process.
pub fn initialize() -> Result<()> {
    unsafe {
        signal::signal(Signal::SIGINT, SigHandler::Handler(handle_sigint))
            .context(ErrorKind::Nix)?;
        signal::signal(Signal::SIGTSTP, SigHandler::SigIgn).context(ErrorKind::Nix)?;
    }

    Ok(())
}

/// Consumes a pending interrupt, returning whether one had arrived.
pub fn take_pending_interrupt() -> bool {
    SIGINT_RECEIVED.swap(false, Ordering::SeqCst)
}

/// RAII guard for the foreground-wait state.
///
/// While the guard lives, SIGINT is ignored in the interpreter; the
/// foreground children own the interrupt. Dropping it returns to idle.
pub struct ForegroundGuard;

impl ForegroundGuard {
    pub fn new() -> ForegroundGuard {
        let temp_result = unsafe { signal::signal(Signal::SIGINT, SigHandler::SigIgn) };
        log_if_err!(temp_result, "failed to enter foreground-wait state");
        ForegroundGuard
    }
}

impl Drop for ForegroundGuard {
    fn drop(&mut self) {
        let temp_result =
            unsafe { signal::signal(Signal::SIGINT, SigHandler::Handler(handle_sigint)) };
        log_if_err!(temp_result, "failed to restore idle SIGINT handler");
        SIGINT_RECEIVED.store(false, Ordering::SeqCst);
    }
}

/// Restores default signal dispositions in a forked child, before exec.
///
/// The child must not inherit the interpreter's handler for SIGINT nor its
/// "ignore" for SIGTSTP.
pub fn reset_child_dispositions() {
    unsafe {
        let _ = signal::signal(Signal::SIGINT, SigHandler::SigDfl);
        let _ = signal::signal(Signal::SIGTSTP, SigHandler::SigDfl);
    }
}
