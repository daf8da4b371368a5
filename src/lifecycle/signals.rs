//! Termination signal handling
//!
//! SIGINT and SIGTERM are caught with a `sigaction` handler that only
//! records the signal number. The handler is installed without
//! `SA_RESTART`, so a blocked accept/recv/send returns EINTR and the main
//! thread notices the request and unwinds to the cleanup path.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;

use crate::error::{PacketLogError, Result};

/// Last termination signal delivered to the process, 0 if none
static CAUGHT_SIGNAL: AtomicI32 = AtomicI32::new(0);

extern "C" fn record_signal(signo: libc::c_int) {
    CAUGHT_SIGNAL.store(signo, Ordering::SeqCst);
}

/// Cloneable shutdown flag shared by the accept loop and sessions
///
/// A handle created with [`ShutdownSignal::new`] is only triggered by
/// [`request`](Self::request). One created with
/// [`ShutdownSignal::install`] also observes SIGINT / SIGTERM.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    requested: Arc<AtomicBool>,
    observes_os: bool,
}

impl ShutdownSignal {
    /// A flag that is only set programmatically
    pub fn new() -> Self {
        Self::default()
    }

    /// Install handlers for SIGINT and SIGTERM and observe them
    pub fn install() -> Result<Self> {
        for signo in [libc::SIGINT, libc::SIGTERM] {
            install_handler(signo)?;
        }
        tracing::debug!("Installed SIGINT/SIGTERM handlers");

        Ok(Self {
            requested: Arc::new(AtomicBool::new(false)),
            observes_os: true,
        })
    }

    /// Ask the server to stop at its next wake-up
    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    /// Whether shutdown has been requested or signalled
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst) || self.signal().is_some()
    }

    /// The termination signal that was caught, if any
    pub fn signal(&self) -> Option<i32> {
        if !self.observes_os {
            return None;
        }
        match CAUGHT_SIGNAL.load(Ordering::SeqCst) {
            0 => None,
            signo => Some(signo),
        }
    }

    /// `Err(Shutdown)` once shutdown is requested, for use after a blocked
    /// call woke up without making progress
    pub fn check(&self) -> Result<()> {
        if self.is_requested() {
            Err(PacketLogError::Shutdown)
        } else {
            Ok(())
        }
    }
}

/// Human readable name for the signals we catch
pub fn signal_name(signo: i32) -> &'static str {
    match signo {
        libc::SIGINT => "SIGINT",
        libc::SIGTERM => "SIGTERM",
        _ => "signal",
    }
}

fn install_handler(signo: libc::c_int) -> Result<()> {
    // SAFETY: the handler only performs an atomic store, which is
    // async-signal-safe; the sigaction struct is fully initialized.
    let rc = unsafe {
        let mut action: libc::sigaction = std::mem::zeroed();
        action.sa_sigaction = record_signal as extern "C" fn(libc::c_int) as libc::sighandler_t;
        action.sa_flags = 0;
        libc::sigemptyset(&mut action.sa_mask);
        libc::sigaction(signo, &action, std::ptr::null_mut())
    };

    if rc != 0 {
        return Err(PacketLogError::Signal(format!(
            "sigaction({}) : {}",
            signal_name(signo),
            io::Error::last_os_error()
        )));
    }
    Ok(())
}
