//! skkbridge CLI Client
//!
//! Sends one skkserv command and prints the reply.

use std::io::Read;
use std::net::TcpStream;
use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand};
use skkbridge::protocol::{decode_text, encode_text, write_command, Command};

/// skkbridge CLI
#[derive(Parser, Debug)]
#[command(name = "skkbridge-cli")]
#[command(about = "CLI for an skkserv dictionary server")]
#[command(version)]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:1178")]
    server: String,

    /// Reply timeout in milliseconds
    #[arg(short, long, default_value = "15000")]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert a reading
    Request {
        /// The reading, e.g. ねこ
        reading: String,
    },

    /// Show server name and version
    Version,

    /// Show the address the server accepted on
    Host,

    /// Send END (no reply expected)
    End,
}

fn main() {
    let args = Args::parse();

    let command = match &args.command {
        Commands::Request { reading } => Command::Request {
            reading: encode_text(reading),
        },
        Commands::Version => Command::Version,
        Commands::Host => Command::Host,
        Commands::End => Command::End,
    };

    match exchange(&args.server, &command, args.timeout_ms) {
        Ok(reply) if reply.is_empty() => {}
        Ok(reply) => println!("{}", reply),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

/// Send `command` and read the reply until the server closes
fn exchange(server: &str, command: &Command, timeout_ms: u64) -> skkbridge::Result<String> {
    let mut stream = TcpStream::connect(server)?;
    stream.set_read_timeout(Some(Duration::from_millis(timeout_ms)))?;

    write_command(&mut stream, command)?;

    let mut reply = Vec::new();
    stream.read_to_end(&mut reply)?;

    decode_text(&reply)
}
