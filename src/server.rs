//! The listening socket and connection supervision.
//!
//! The accept loop spawns one task per connection, all sharing the cache and
//! config. In-flight tasks are tracked in a [`JoinSet`]: finished handlers
//! are reaped opportunistically before each accept, and once the ceiling is
//! reached the loop blocks until a handler completes before accepting again.
//! On shutdown the server stops accepting and drains every handler.

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::{TcpListener, TcpSocket};
use tokio::signal;
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::cache::Cache;
use crate::config::Config;
use crate::connection::{handle_connection, ConnectionError};
use crate::rdb::load_cache;

/// Ceiling on concurrently served connections.
const MAX_CONNECTIONS: usize = 100;

const LISTEN_BACKLOG: u32 = 1024;

/// Failures to set up the listening socket. These are the only errors that
/// terminate the process with a non-zero status.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("failed to create or bind the listening socket: {0}")]
    Bind(#[source] std::io::Error),
    #[error("failed to listen on the bound socket: {0}")]
    Listen(#[source] std::io::Error),
}

pub struct RedisServer {
    listener: TcpListener,
    cache: Arc<Cache>,
    config: Arc<Config>,
}

impl RedisServer {
    /// Loads the snapshot (if one is configured) and binds the listening
    /// socket.
    ///
    /// The snapshot is read before any connection exists, so handlers only
    /// ever see the seeded cache. `SO_REUSEADDR` is set so a restart
    /// immediately after a crash can rebind the port.
    pub async fn bind(config: Config) -> Result<Self, ServerError> {
        let cache = Arc::new(load_cache(&config).await);

        let address = SocketAddr::from(([127, 0, 0, 1], config.port));
        let socket = TcpSocket::new_v4().map_err(ServerError::Bind)?;
        socket.set_reuseaddr(true).map_err(ServerError::Bind)?;
        socket.bind(address).map_err(ServerError::Bind)?;
        let listener = socket.listen(LISTEN_BACKLOG).map_err(ServerError::Listen)?;

        Ok(Self {
            listener,
            cache,
            config: Arc::new(config),
        })
    }

    /// The address actually bound, which differs from the configured one
    /// when port 0 requested an ephemeral port.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts and serves connections until a shutdown signal or an accept
    /// failure, then drains the in-flight handlers.
    ///
    /// A handler that fails is logged and forgotten; the accept loop and the
    /// other handlers are unaffected. A failure of the accept loop itself
    /// ends the server.
    pub async fn run(self) {
        if let Ok(address) = self.listener.local_addr() {
            info!(%address, "listening for connections");
        }

        let mut handlers: JoinSet<Result<(), ConnectionError>> = JoinSet::new();

        loop {
            // Reap whatever finished since the last accept.
            while let Some(result) = handlers.try_join_next() {
                log_handler_result(result);
            }

            // At the ceiling, wait for a handler to finish before accepting
            // again.
            if handlers.len() >= MAX_CONNECTIONS {
                if let Some(result) = handlers.join_next().await {
                    log_handler_result(result);
                }
            }

            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer_address)) => {
                        info!(%peer_address, "accepted connection");
                        let cache = Arc::clone(&self.cache);
                        let config = Arc::clone(&self.config);
                        handlers.spawn(handle_connection(stream, cache, config));
                    }
                    Err(error) => {
                        error!(%error, "accept failed, shutting down");
                        break;
                    }
                },
                _ = signal::ctrl_c() => {
                    info!("shutdown signal received, draining connections");
                    break;
                }
            }
        }

        while let Some(result) = handlers.join_next().await {
            log_handler_result(result);
        }
    }
}

fn log_handler_result(result: Result<Result<(), ConnectionError>, tokio::task::JoinError>) {
    match result {
        Ok(Ok(())) => {}
        Ok(Err(error)) => error!(%error, "connection handler failed"),
        Err(error) => error!(%error, "connection task panicked"),
    }
}
