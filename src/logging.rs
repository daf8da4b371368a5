//! Logging setup
//!
//! All code logs through `tracing`. The binary installs a `fmt` subscriber
//! whose writer is a [`LogHandle`]: each formatted event is forwarded to the
//! local syslog daemon (RFC 3164, facility `LOG_USER`) at the severity
//! matching its tracing level, or to stderr.

use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;
use syslog::{Facility, Formatter3164};
use tracing::{Level, Metadata};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

use crate::config::LogTarget;
use crate::error::{PacketLogError, Result};

type SyslogLogger = syslog::Logger<syslog::LoggerBackend, Formatter3164>;

enum Sink {
    Syslog(SyslogLogger),
    Stderr,
    Closed,
}

struct Shared {
    ident: String,
    sink: Mutex<Sink>,
}

/// Handle on the process log destination
///
/// Cloning is cheap; all clones share one connection.
#[derive(Clone)]
pub struct LogHandle {
    shared: Arc<Shared>,
}

/// Install the global subscriber and return the handle it writes through
///
/// `RUST_LOG` controls filtering (default `info`). If syslog was requested
/// but is unreachable, logging falls back to stderr.
pub fn init(target: LogTarget, ident: &str) -> Result<LogHandle> {
    let (handle, fallback) = match target {
        LogTarget::Syslog => match LogHandle::syslog(ident) {
            Ok(handle) => (handle, None),
            Err(e) => (LogHandle::stderr(ident), Some(e)),
        },
        LogTarget::Stderr => (LogHandle::stderr(ident), None),
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(handle.clone())
        .with_ansi(false)
        .with_target(false)
        .with_level(!handle.is_syslog())
        .without_time()
        .try_init()
        .map_err(|e| PacketLogError::Logging(e.to_string()))?;

    if let Some(e) = fallback {
        tracing::warn!("syslog unavailable, logging to stderr: {}", e);
    }

    Ok(handle)
}

impl LogHandle {
    /// Connect to the local syslog daemon
    pub fn syslog(ident: &str) -> Result<Self> {
        let logger = connect(ident)?;
        Ok(Self::with_sink(ident, Sink::Syslog(logger)))
    }

    /// Write to standard error
    pub fn stderr(ident: &str) -> Self {
        Self::with_sink(ident, Sink::Stderr)
    }

    /// A handle that drops everything
    pub fn disabled(ident: &str) -> Self {
        Self::with_sink(ident, Sink::Closed)
    }

    fn with_sink(ident: &str, sink: Sink) -> Self {
        Self {
            shared: Arc::new(Shared {
                ident: ident.to_string(),
                sink: Mutex::new(sink),
            }),
        }
    }

    /// Whether events currently go to syslog
    pub fn is_syslog(&self) -> bool {
        matches!(*self.shared.sink.lock(), Sink::Syslog(_))
    }

    /// Whether the handle has been closed
    pub fn is_closed(&self) -> bool {
        matches!(*self.shared.sink.lock(), Sink::Closed)
    }

    /// Reconnect after fork so records carry the daemon's pid
    pub fn reattach(&self) {
        let mut sink = self.shared.sink.lock();
        if let Sink::Syslog(_) = *sink {
            *sink = match connect(&self.shared.ident) {
                Ok(logger) => Sink::Syslog(logger),
                // stderr is /dev/null by now
                Err(_) => Sink::Closed,
            };
        }
    }

    /// Release the logging facility; later events are dropped
    pub fn close(&self) {
        *self.shared.sink.lock() = Sink::Closed;
    }
}

fn connect(ident: &str) -> Result<SyslogLogger> {
    let formatter = Formatter3164 {
        facility: Facility::LOG_USER,
        hostname: None,
        process: ident.to_string(),
        pid: std::process::id(),
    };
    syslog::unix(formatter).map_err(|e| PacketLogError::Logging(e.to_string()))
}

impl<'a> MakeWriter<'a> for LogHandle {
    type Writer = EventWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        EventWriter {
            shared: &self.shared,
            level: Level::INFO,
        }
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        EventWriter {
            shared: &self.shared,
            level: *meta.level(),
        }
    }
}

/// Syslog severities used by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Severity {
    Err,
    Warning,
    Info,
    Debug,
}

/// TRACE has no syslog counterpart and shares DEBUG
fn severity_for(level: Level) -> Severity {
    if level == Level::ERROR {
        Severity::Err
    } else if level == Level::WARN {
        Severity::Warning
    } else if level == Level::INFO {
        Severity::Info
    } else {
        Severity::Debug
    }
}

/// Writer for one formatted event
pub struct EventWriter<'a> {
    shared: &'a Shared,
    level: Level,
}

impl Write for EventWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut sink = self.shared.sink.lock();
        match &mut *sink {
            Sink::Syslog(logger) => {
                let text = String::from_utf8_lossy(buf);
                let message = text.trim_end_matches('\n');
                // a lost log line must never take the server down
                let _ = match severity_for(self.level) {
                    Severity::Err => logger.err(message),
                    Severity::Warning => logger.warning(message),
                    Severity::Info => logger.info(message),
                    Severity::Debug => logger.debug(message),
                };
            }
            Sink::Stderr => io::stderr().write_all(buf)?,
            Sink::Closed => {}
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
