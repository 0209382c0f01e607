//! OS signal handling.
//!
//! - Ctrl-C / SIGTERM: graceful shutdown
//! - SIGHUP: configuration reload

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::lifecycle::shutdown::Shutdown;

/// Listen for signals until shutdown. Reload requests go to `reload` as an
/// empty path list.
pub fn spawn_signal_handler(shutdown: Arc<Shutdown>, reload: mpsc::UnboundedSender<Vec<PathBuf>>) {
    tokio::spawn(async move {
        wait_for_shutdown(reload).await;
        tracing::info!("Shutdown signal received");
        shutdown.trigger();
    });
}

#[cfg(unix)]
async fn wait_for_shutdown(reload: mpsc::UnboundedSender<Vec<PathBuf>>) {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut term, mut hup) = match (signal(SignalKind::terminate()), signal(SignalKind::hangup())) {
        (Ok(term), Ok(hup)) => (term, hup),
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(error = %e, "Unix signal handlers unavailable; only Ctrl-C is handled");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => return,
            _ = term.recv() => return,
            _ = hup.recv() => {
                tracing::info!("SIGHUP received, reloading configuration");
                let _ = reload.send(Vec::new());
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown(_reload: mpsc::UnboundedSender<Vec<PathBuf>>) {
    let _ = tokio::signal::ctrl_c().await;
}
