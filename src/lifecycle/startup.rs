//! Startup sequence.
//!
//! Config is already loaded into the engine by the time this runs; here the
//! listeners are bound and the background tasks started:
//! metrics exporter → public listener → admin API → watcher + reload loop →
//! signal handler → serve until shutdown.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};

use crate::admin;
use crate::config::watcher::ConfigWatcher;
use crate::engine::Engine;
use crate::http::HttpServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals;
use crate::observability::metrics;

/// Editors and atomic writes produce bursts of events; collapse them.
const RELOAD_DEBOUNCE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone)]
pub struct StartupOptions {
    /// Reload when files in the configuration directory change.
    pub watch: bool,
}

/// Bind everything and serve until `shutdown` fires.
pub async fn run(
    engine: Arc<Engine>,
    config_dir: &Path,
    options: StartupOptions,
    shutdown: Arc<Shutdown>,
) -> Result<(), std::io::Error> {
    let global = engine.global();

    if global.observability.metrics_enabled {
        match global.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %global.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(engine.server_address()).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        target = %engine.target_url(),
        "Listening for connections"
    );

    if global.admin.enabled {
        let admin_listener = TcpListener::bind(&global.admin.bind_address).await?;
        let engine = engine.clone();
        let rx = shutdown.subscribe();
        tokio::spawn(async move {
            if let Err(e) = admin::serve(engine, admin_listener, rx).await {
                tracing::error!(error = %e, "Admin API failed");
            }
        });
    }

    let (watcher, changes) = ConfigWatcher::new(config_dir);
    let notifier = watcher.notifier();
    let _watch_handle = if options.watch {
        match watcher.run() {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::warn!(error = %e, "Config watcher unavailable; reload with SIGHUP or the admin API");
                None
            }
        }
    } else {
        None
    };

    tokio::spawn(reload_loop(engine.clone(), changes, shutdown.subscribe()));
    signals::spawn_signal_handler(shutdown.clone(), notifier);

    HttpServer::new(engine).run(listener, shutdown.subscribe()).await
}

/// Apply reload requests one at a time until shutdown.
pub async fn reload_loop(
    engine: Arc<Engine>,
    mut changes: mpsc::UnboundedReceiver<Vec<PathBuf>>,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        let mut paths = tokio::select! {
            _ = shutdown.recv() => return,
            next = changes.recv() => match next {
                Some(paths) => paths,
                None => return,
            },
        };

        tokio::time::sleep(RELOAD_DEBOUNCE).await;
        while let Ok(more) = changes.try_recv() {
            paths.extend(more);
        }

        let engine = engine.clone();
        match tokio::task::spawn_blocking(move || engine.reload()).await {
            Ok(Ok(())) => tracing::debug!(paths = ?paths, "Reload applied"),
            Ok(Err(e)) => tracing::error!(error = %e, "Reload failed; keeping current configuration"),
            Err(e) => tracing::error!(error = %e, "Reload task failed"),
        }
    }
}
