//! Interface-facing TCP listener.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::net::{TcpListener, TcpStream};
use xcodec_core::Cache;

use crate::{config::ProxyConfig, error::ProxyError, session};

/// Binds the interface-facing listener and, for each accepted connection,
/// dials the configured peer and drives a pipe-pair joining the two.
pub struct Listener {
    tcp: TcpListener,
    config: ProxyConfig,
    next_connection_id: AtomicU64,
}

impl Listener {
    /// Binds `config.interface_addr`.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::Io`] if the address cannot be bound.
    pub async fn bind(config: ProxyConfig) -> Result<Self, ProxyError> {
        let tcp = TcpListener::bind(&config.interface_addr).await?;
        Ok(Self { tcp, config, next_connection_id: AtomicU64::new(0) })
    }

    /// The address the listener ended up bound to.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::Io`] if the local address cannot be read back.
    pub fn local_addr(&self) -> Result<std::net::SocketAddr, ProxyError> {
        Ok(self.tcp.local_addr()?)
    }

    /// Accepts connections forever, spawning one task per connection. Runs
    /// until the listener errors.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::Io`] if `accept` itself fails; per-connection
    /// errors are logged and do not stop the loop.
    pub async fn run(self) -> Result<(), ProxyError> {
        tracing::info!(addr = %self.config.interface_addr, "listening for interface connections");

        loop {
            let (interface_stream, remote_addr) = self.tcp.accept().await?;
            let connection_id = self.next_connection_id.fetch_add(1, Ordering::Relaxed);
            let peer_addr = self.config.peer_addr.clone();
            let cache_backing = self.config.cache_backing.clone();

            tracing::info!(connection_id, interface = %remote_addr, "accepted interface connection");

            tokio::spawn(async move {
                let cache = match cache_backing.open_for_connection(connection_id) {
                    Ok(cache) => cache,
                    Err(error) => {
                        tracing::error!(connection_id, %error, "failed to open cache for connection");
                        return;
                    },
                };
                let local_uuid = cache.uuid();

                let peer_stream = match TcpStream::connect(&peer_addr).await {
                    Ok(stream) => stream,
                    Err(error) => {
                        tracing::error!(connection_id, %error, "failed to connect to peer");
                        return;
                    },
                };
                tracing::info!(connection_id, peer = %peer_addr, "connected to peer");

                if let Err(error) = session::run_session(
                    connection_id,
                    interface_stream,
                    peer_stream,
                    local_uuid,
                    cache,
                )
                .await
                {
                    tracing::warn!(connection_id, %error, "session ended with an error");
                }
            });
        }
    }
}
