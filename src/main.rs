//! mockgate: HTTP mock server and reverse proxy.
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http server ──▶ dispatcher ──▶ engine.mediate
//!                                                      │
//!                              active endpoint matched │ no match / inactive
//!                                      ┌───────────────┴──────────────┐
//!                                      ▼                              ▼
//!                               mock renderer                  proxy mediator ──▶ upstream
//!                               (delay, body)                  (rewrite, Host, CORS strip)
//!
//!     admin API ──▶ engine mutations ──▶ config store (config dir) ◀── watcher / SIGHUP
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use mockgate::config::{ConfigStore, DirStore};
use mockgate::engine::Engine;
use mockgate::lifecycle::{self, Shutdown, StartupOptions};
use mockgate::observability::logging;

#[derive(Parser)]
#[command(name = "mockgate", version)]
#[command(about = "HTTP mock server that proxies everything it does not mock", long_about = None)]
struct Cli {
    /// Configuration directory (config.toml plus one JSON file per feature)
    #[arg(short, long, env = "MOCKGATE_CONFIG_DIR", default_value = "mocks")]
    config_dir: PathBuf,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long)]
    debug: bool,

    /// Do not reload when configuration files change
    #[arg(long)]
    no_watch: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let store = DirStore::open(&cli.config_dir)
        .with_context(|| format!("opening config directory {}", cli.config_dir.display()))?;
    let snapshot = store.load().context("loading configuration")?;

    logging::init_logging(&snapshot.global.observability, cli.debug);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config_dir = %cli.config_dir.display(),
        "mockgate starting"
    );

    let engine = Arc::new(Engine::with_snapshot(Arc::new(store), snapshot)?);
    let shutdown = Arc::new(Shutdown::new());

    lifecycle::run(
        engine,
        &cli.config_dir,
        StartupOptions { watch: !cli.no_watch },
        shutdown,
    )
    .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
