//! skkbridge Server Binary
//!
//! Starts the skkserv TCP server.

use clap::Parser;
use skkbridge::network::Server;
use skkbridge::{Config, HttpTransliterator, LookupService};
use tracing_subscriber::{fmt, EnvFilter};

/// skkbridge Server
#[derive(Parser, Debug)]
#[command(name = "skkbridge-server")]
#[command(about = "skkserv dictionary server backed by a remote transliteration API")]
#[command(version)]
struct Args {
    /// Listen host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Listen port
    #[arg(short, long, default_value = "1178")]
    port: u16,

    /// Cache file
    #[arg(short, long, default_value = "./skkbridge_cache.tsv")]
    cache_file: String,

    /// Transliteration endpoint
    #[arg(long, default_value = "http://www.google.com/transliterate")]
    endpoint: String,

    /// Seconds a cached conversion stays fresh
    #[arg(long, default_value = "86400")]
    ttl: u64,

    /// Per-connection read timeout in milliseconds (0 disables it)
    #[arg(long, default_value = "5000")]
    read_timeout_ms: u64,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    // Initialize tracing/logging
    let default_filter = if args.verbose {
        "debug,skkbridge=debug"
    } else {
        "info,skkbridge=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    fmt().with_env_filter(filter).with_target(true).init();

    tracing::info!("skkbridge Server v{}", skkbridge::VERSION);
    tracing::info!("Cache file: {}", args.cache_file);
    tracing::info!("Endpoint: {}", args.endpoint);

    // Build config from args
    let config = Config::builder()
        .listen_addr(format!("{}:{}", args.host, args.port))
        .cache_path(&args.cache_file)
        .endpoint(&args.endpoint)
        .cache_ttl_secs(args.ttl)
        .read_timeout_ms(args.read_timeout_ms)
        .build();

    if let Err(e) = config.validate() {
        tracing::error!("Invalid configuration: {}", e);
        std::process::exit(2);
    }

    let remote = match HttpTransliterator::from_config(&config) {
        Ok(remote) => remote,
        Err(e) => {
            tracing::error!("Failed to create remote client: {}", e);
            std::process::exit(1);
        }
    };

    let service = LookupService::from_config(&config, remote);

    // Start server
    let mut server = Server::new(config, service);
    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
