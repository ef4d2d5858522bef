//! pingwatch: continuous reachability monitor with rolling success percentages.
//!
//! Run with:  `RUST_LOG=info pingwatch [path/to/pingwatch.toml]`

use anyhow::Result;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Structured logging; RUST_LOG controls verbosity (default: info).
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("pingwatch v{} starting", env!("CARGO_PKG_VERSION"));

    let config_path = std::env::args_os().nth(1).map(Into::into);
    pingwatch_console::run(config_path).await.map_err(Into::into)
}
