//! packetlog Server Binary
//!
//! Starts the packet logging TCP server.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use packetlog::config::{ErrorPolicy, LogTarget, SyncStrategy};
use packetlog::lifecycle::daemonize;
use packetlog::{logging, Config, Lifecycle, Result, Server, ShutdownSignal};

/// packetlog Server
#[derive(Parser, Debug)]
#[command(name = "packetlog-server")]
#[command(about = "Append newline-terminated packets to a log and echo the log back")]
#[command(version)]
struct Args {
    /// Run as a background daemon once the port is bound
    #[arg(short, long)]
    daemon: bool,

    /// TCP port to listen on
    #[arg(short, long, default_value = "9000")]
    port: u16,

    /// IPv4 address to bind
    #[arg(long, default_value = "0.0.0.0")]
    bind: Ipv4Addr,

    /// Log file shared by all connections (deleted on exit)
    #[arg(short = 'f', long, default_value = "/var/tmp/aesdsocketdata")]
    data_file: PathBuf,

    /// Listen backlog
    #[arg(long, default_value = "10")]
    backlog: u32,

    /// recv / read chunk size in bytes
    #[arg(long, default_value = "512")]
    chunk_size: usize,

    /// Exit on any per-connection I/O error instead of dropping the connection
    #[arg(long)]
    fatal_io_errors: bool,

    /// Skip fsync after each appended packet
    #[arg(long)]
    no_sync: bool,

    /// Where to send log messages
    #[arg(long, value_enum, default_value = "syslog")]
    log_target: LogTargetArg,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogTargetArg {
    Syslog,
    Stderr,
}

impl Args {
    fn into_config(self) -> Config {
        Config::builder()
            .listen_addr(SocketAddr::from((self.bind, self.port)))
            .data_file(self.data_file)
            .backlog(self.backlog)
            .chunk_size(self.chunk_size)
            .daemon(self.daemon)
            .error_policy(if self.fatal_io_errors {
                ErrorPolicy::Fatal
            } else {
                ErrorPolicy::Isolate
            })
            .sync_strategy(if self.no_sync {
                SyncStrategy::Never
            } else {
                SyncStrategy::EveryAppend
            })
            .log_target(match self.log_target {
                LogTargetArg::Syslog => LogTarget::Syslog,
                LogTargetArg::Stderr => LogTarget::Stderr,
            })
            .build()
    }
}

fn main() -> ExitCode {
    let config = Args::parse().into_config();

    let log = match logging::init(config.log_target, "packetlog") {
        Ok(log) => log,
        Err(e) => {
            eprintln!("packetlog-server: {}", e);
            return ExitCode::FAILURE;
        }
    };

    tracing::info!("packetlog server v{}", packetlog::VERSION);

    let mut lifecycle = Lifecycle::new(&config.data_file, log);

    let shutdown = match ShutdownSignal::install() {
        Ok(shutdown) => shutdown,
        Err(e) => return lifecycle.finish(Err(e), &ShutdownSignal::new()).into(),
    };

    let result = serve(config, &mut lifecycle, &shutdown);
    lifecycle.finish(result, &shutdown).into()
}

/// Bind, optionally detach, and run the accept loop
///
/// The server is dropped on return, closing the listener before cleanup.
fn serve(config: Config, lifecycle: &mut Lifecycle, shutdown: &ShutdownSignal) -> Result<()> {
    config.validate()?;
    let config = config.resolve_paths()?;
    lifecycle.set_data_file(&config.data_file);

    tracing::info!("Data file: {}", config.data_file.display());

    let daemon = config.daemon;
    let mut server = Server::bind(config, shutdown.clone())?;

    if daemon {
        daemonize()?;
        lifecycle.log().reattach();
        tracing::info!("Running as daemon, pid {}", std::process::id());
    }

    server.run()
}
