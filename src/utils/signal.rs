//! Cancellation while archinstall and the post-install stage run.
//!
//! Handlers are installed only once prompting is over. Before that the default
//! disposition applies and Ctrl-C simply ends the wizard.
//!
//! The first SIGINT/SIGTERM marks the run as cancelled. archinstall gets the
//! same signal through the process group and is left to wind down; the next
//! [`check`] then fails with [`InstallerError::Interrupted`]. Any later signal
//! force-exits with the default disposition.

use crate::utils::error::{InstallerError, Result};
use std::sync::atomic::{AtomicUsize, Ordering};

/// What the handler does with a delivered signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAction {
    /// Let the running step finish, then stop
    Cancel,
    /// Re-raise with the default disposition
    ForceExit,
}

/// Number of cancellation signals seen so far
pub struct CancelState {
    signals: AtomicUsize,
}

impl CancelState {
    pub const fn new() -> Self {
        Self {
            signals: AtomicUsize::new(0),
        }
    }

    /// Count one signal. Async-signal-safe.
    pub fn record(&self) -> SignalAction {
        if self.signals.fetch_add(1, Ordering::SeqCst) == 0 {
            SignalAction::Cancel
        } else {
            SignalAction::ForceExit
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.signals.load(Ordering::SeqCst) > 0
    }

    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(InstallerError::Interrupted)
        } else {
            Ok(())
        }
    }
}

impl Default for CancelState {
    fn default() -> Self {
        Self::new()
    }
}

static STATE: CancelState = CancelState::new();

fn write_stderr(msg: &[u8]) {
    unsafe {
        libc::write(2, msg.as_ptr() as *const libc::c_void, msg.len());
    }
}

extern "C" fn on_signal(sig: libc::c_int) {
    match STATE.record() {
        SignalAction::Cancel => {
            write_stderr(b"\nCancelling, waiting for the running step to stop...\n");
        }
        SignalAction::ForceExit => {
            write_stderr(b"\nForced exit - the target disk may be left partially installed\n");
            unsafe {
                libc::signal(sig, libc::SIG_DFL);
                libc::raise(sig);
            }
        }
    }
}

/// Route SIGINT and SIGTERM to the cancellation state.
///
/// Calling it again just re-installs the same handler.
pub fn install_handlers() -> Result<()> {
    for sig in [libc::SIGINT, libc::SIGTERM] {
        let rc = unsafe {
            let mut action: libc::sigaction = std::mem::zeroed();
            action.sa_sigaction = on_signal as extern "C" fn(libc::c_int) as libc::sighandler_t;
            action.sa_flags = libc::SA_RESTART;
            libc::sigemptyset(&mut action.sa_mask);
            libc::sigaction(sig, &action, std::ptr::null_mut())
        };
        if rc != 0 {
            return Err(std::io::Error::last_os_error().into());
        }
    }
    Ok(())
}

/// Fail with [`InstallerError::Interrupted`] once the run has been cancelled
pub fn check() -> Result<()> {
    STATE.check()
}
