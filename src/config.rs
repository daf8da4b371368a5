//! Configuration for packetlog
//!
//! Centralized configuration with sensible defaults.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use crate::error::{PacketLogError, Result};

/// Main configuration for a packetlog server
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// The shared append-only log file. Deleted on shutdown.
    pub data_file: PathBuf,

    /// Whether each append is followed by an fsync
    pub sync_strategy: SyncStrategy,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: SocketAddr,

    /// Pending connection queue depth passed to listen(2)
    pub backlog: u32,

    /// Size of a single recv / file read (bytes)
    pub chunk_size: usize,

    /// How often blocked accept/recv/send wake up to check for shutdown
    /// (milliseconds). This is not a session timeout.
    pub shutdown_poll_ms: u64,

    /// What a per-session I/O error does to the server
    pub error_policy: ErrorPolicy,

    // -------------------------------------------------------------------------
    // Process Configuration
    // -------------------------------------------------------------------------
    /// Detach from the terminal after listen succeeds
    pub daemon: bool,

    /// Where operational messages go
    pub log_target: LogTarget,
}

/// Fsync strategy for the log store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// Leave flushing to the OS
    Never,

    /// fsync after every appended packet
    EveryAppend,
}

/// Scope of a per-session I/O failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Abort the session, keep serving
    Isolate,

    /// Tear down the whole process (legacy behavior)
    Fatal,
}

/// Log destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    /// Local syslog daemon, falls back to stderr if unreachable
    Syslog,

    /// Standard error
    Stderr,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("/var/tmp/aesdsocketdata"),
            sync_strategy: SyncStrategy::EveryAppend,
            listen_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 9000)),
            backlog: 10,
            chunk_size: 512,
            shutdown_poll_ms: 500,
            error_policy: ErrorPolicy::Isolate,
            daemon: false,
            log_target: LogTarget::Syslog,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject values the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(PacketLogError::Config("chunk size must be non-zero".to_string()));
        }
        if self.backlog == 0 {
            return Err(PacketLogError::Config("backlog must be non-zero".to_string()));
        }
        if self.shutdown_poll_ms == 0 {
            return Err(PacketLogError::Config(
                "shutdown poll interval must be non-zero".to_string(),
            ));
        }
        if self.data_file.as_os_str().is_empty() {
            return Err(PacketLogError::Config("data file path is empty".to_string()));
        }
        Ok(())
    }

    /// Make `data_file` absolute so it survives the daemon's chdir("/")
    pub fn resolve_paths(mut self) -> Result<Self> {
        if self.data_file.is_relative() {
            let cwd = std::env::current_dir().map_err(PacketLogError::os("getcwd"))?;
            self.data_file = cwd.join(&self.data_file);
        }
        Ok(self)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the log file path
    pub fn data_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_file = path.into();
        self
    }

    /// Set the fsync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: SocketAddr) -> Self {
        self.config.listen_addr = addr;
        self
    }

    /// Set the listen backlog
    pub fn backlog(mut self, backlog: u32) -> Self {
        self.config.backlog = backlog;
        self
    }

    /// Set the recv / read chunk size (in bytes)
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the shutdown poll interval (in milliseconds)
    pub fn shutdown_poll_ms(mut self, ms: u64) -> Self {
        self.config.shutdown_poll_ms = ms;
        self
    }

    /// Set the per-session error policy
    pub fn error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.config.error_policy = policy;
        self
    }

    /// Run detached
    pub fn daemon(mut self, daemon: bool) -> Self {
        self.config.daemon = daemon;
        self
    }

    /// Set the log destination
    pub fn log_target(mut self, target: LogTarget) -> Self {
        self.config.log_target = target;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
