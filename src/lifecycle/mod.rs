//! Lifecycle Module
//!
//! Signal handling, daemonization and the shutdown sequence.
//!
//! ## Shutdown Sequence
//! The `Server` (listener plus any in-flight connection) is dropped first,
//! which closes both sockets. [`Lifecycle::finish`] then runs the rest,
//! identical for graceful and fatal exits apart from the message and the
//! exit status:
//! 1. Log `Caught signal, exiting` or `<op> : <os error>`
//! 2. Unlink the log file
//! 3. Close the logging facility

mod daemon;
mod signals;

pub use daemon::daemonize;
pub use signals::{signal_name, ShutdownSignal};

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::error::{PacketLogError, Result};
use crate::logging::LogHandle;
use crate::store::LogStore;

/// How the process ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// Stopped by a termination signal (status 0)
    Graceful,

    /// Stopped by an unrecoverable error (status 1)
    Failure,
}

impl From<Exit> for ExitCode {
    fn from(exit: Exit) -> Self {
        match exit {
            Exit::Graceful => ExitCode::SUCCESS,
            Exit::Failure => ExitCode::FAILURE,
        }
    }
}

/// Owns the process-wide resources that must be released on exit
pub struct Lifecycle {
    /// Log file to unlink
    data_file: PathBuf,

    /// Logging facility to release
    log: LogHandle,
}

impl Lifecycle {
    pub fn new(data_file: impl Into<PathBuf>, log: LogHandle) -> Self {
        Self {
            data_file: data_file.into(),
            log,
        }
    }

    /// The logging handle, e.g. to reattach after daemonizing
    pub fn log(&self) -> &LogHandle {
        &self.log
    }

    pub fn data_file(&self) -> &Path {
        &self.data_file
    }

    /// Point cleanup at a different path (after it was made absolute)
    pub fn set_data_file(&mut self, path: impl Into<PathBuf>) {
        self.data_file = path.into();
    }

    /// Run the shutdown sequence for the result of the server run
    ///
    /// `Ok(())` and `Err(Shutdown)` both mean a termination signal was
    /// handled; anything else is fatal.
    pub fn finish(self, result: Result<()>, shutdown: &ShutdownSignal) -> Exit {
        let exit = match result {
            Ok(()) | Err(PacketLogError::Shutdown) => {
                match shutdown.signal() {
                    Some(signo) => {
                        tracing::info!("Caught signal, exiting ({})", signal_name(signo))
                    }
                    None => tracing::info!("Caught signal, exiting"),
                }
                Exit::Graceful
            }
            Err(e) => {
                tracing::error!("{}", e);
                Exit::Failure
            }
        };

        if let Err(e) = LogStore::remove(&self.data_file) {
            tracing::error!("{}", e);
        }

        self.log.close();
        exit
    }
}
