//! XCodec proxy binary.
//!
//! # Usage
//!
//! ```bash
//! # Ephemeral in-memory cache
//! xcodec-proxy --bind 0.0.0.0:7890 --peer 10.0.0.2:7890
//!
//! # Disk-backed cache, 512 MiB per connection
//! xcodec-proxy --bind 0.0.0.0:7890 --peer 10.0.0.2:7890 \
//!     --cache-dir /var/cache/xcodec-proxy --cache-size-mb 512
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use xcodec_proxy::{Listener, ProxyConfig};

/// XCodec WAN-accelerating TCP proxy
#[derive(Parser, Debug)]
#[command(name = "xcodec-proxy")]
#[command(about = "Redundancy-eliminating TCP proxy")]
#[command(version)]
struct Args {
    /// Interface-facing address to bind to
    #[arg(short, long, default_value = "0.0.0.0:7890")]
    bind: String,

    /// Remote peer address dialed for each accepted connection
    #[arg(short, long)]
    peer: String,

    /// Directory for a disk-backed cache shared across restarts. Omit for
    /// an ephemeral in-memory cache per connection.
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Size in megabytes of each connection's disk-backed cache, ignored
    /// without `--cache-dir`
    #[arg(long, default_value = "256")]
    cache_size_mb: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!("xcodec proxy starting");

    if args.cache_dir.is_none() {
        tracing::info!("no cache directory configured, using an ephemeral in-memory cache per connection");
    }

    let config =
        ProxyConfig::new(args.bind, args.peer, args.cache_dir, args.cache_size_mb);

    let listener = Listener::bind(config).await?;
    tracing::info!(addr = %listener.local_addr()?, "bound interface listener");

    listener.run().await?;

    Ok(())
}
