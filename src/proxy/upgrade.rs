//! Bidirectional tunnel for upgraded (101 Switching Protocols) connections.

use hyper::upgrade::OnUpgrade;
use hyper_util::rt::TokioIo;

/// Splice the client and upstream connections once both have upgraded.
///
/// Runs detached; failures only abort the tunnel.
pub fn spawn_tunnel(client: OnUpgrade, upstream: OnUpgrade, path: String) {
    tokio::spawn(async move {
        let (client, upstream) = match tokio::try_join!(client, upstream) {
            Ok(pair) => pair,
            Err(e) => {
                tracing::debug!(path = %path, error = %e, "Upgrade handshake aborted");
                return;
            }
        };

        let mut client = TokioIo::new(client);
        let mut upstream = TokioIo::new(upstream);

        match tokio::io::copy_bidirectional(&mut client, &mut upstream).await {
            Ok((sent, received)) => {
                tracing::debug!(path = %path, sent, received, "Upgraded connection closed");
            }
            Err(e) => {
                tracing::debug!(path = %path, error = %e, "Upgraded connection aborted");
            }
        }
    });
}
