//! packetlog CLI Client
//!
//! Command-line interface for sending packets to a packetlog server.

use std::io::Write;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use packetlog::network::send_packet;

/// packetlog CLI
#[derive(Parser, Debug)]
#[command(name = "packetlog-cli")]
#[command(about = "CLI for the packetlog server")]
#[command(version)]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:9000")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Send one line and print the log echoed back
    Send {
        /// The packet (a newline is appended)
        line: String,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    match args.command {
        Commands::Send { line } => match send_packet(args.server.as_str(), line.as_bytes()) {
            Ok(echo) => {
                let mut stdout = std::io::stdout().lock();
                if stdout.write_all(&echo).and_then(|_| stdout.flush()).is_err() {
                    return ExitCode::FAILURE;
                }
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("packetlog-cli: {}", e);
                ExitCode::FAILURE
            }
        },
    }
}
