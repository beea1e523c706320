//! Signaling server listener
//!
//! Handles TCP accept loop and spawns connection handlers.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

use crate::error::Result;
use crate::protocol::ConnId;
use crate::registry::{RegistryConfig, RoomRegistry};
use crate::relay::SignalRelay;
use crate::server::config::ServerConfig;
use crate::server::connection::Connection;
use crate::server::handler::{ConnectionContext, SignalHandler};
use crate::stats::{ConnectionCounters, ServerStats};

/// Signaling server
pub struct SignalServer<H: SignalHandler> {
    config: ServerConfig,
    handler: Arc<H>,
    relay: Arc<SignalRelay>,
    next_conn_id: AtomicU64,
    connection_semaphore: Option<Arc<Semaphore>>,
    counters: Arc<ConnectionCounters>,
}

impl<H: SignalHandler> SignalServer<H> {
    /// Create a new server with the given configuration and handler
    pub fn new(config: ServerConfig, handler: H) -> Self {
        Self::with_registry_config(config, handler, RegistryConfig::default())
    }

    /// Create a new server with custom registry configuration
    pub fn with_registry_config(
        config: ServerConfig,
        handler: H,
        registry_config: RegistryConfig,
    ) -> Self {
        let connection_semaphore = if config.max_connections > 0 {
            Some(Arc::new(Semaphore::new(config.max_connections)))
        } else {
            None
        };

        let registry = Arc::new(RoomRegistry::with_config(registry_config));

        Self {
            config,
            handler: Arc::new(handler),
            relay: Arc::new(SignalRelay::new(registry)),
            next_conn_id: AtomicU64::new(1),
            connection_semaphore,
            counters: Arc::new(ConnectionCounters::new()),
        }
    }

    /// Get a reference to the room registry
    pub fn registry(&self) -> &Arc<RoomRegistry> {
        self.relay.registry()
    }

    /// Get a reference to the relay
    pub fn relay(&self) -> &Arc<SignalRelay> {
        &self.relay
    }

    /// Snapshot of server-wide statistics
    pub async fn stats(&self) -> ServerStats {
        ServerStats {
            total_connections: self.counters.total(),
            active_connections: self.counters.active(),
            active_rooms: self.registry().room_count().await as u64,
            relay: self.relay.stats(),
            uptime: self.counters.uptime(),
        }
    }

    /// Run the server
    ///
    /// This method blocks until the server is shut down.
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "Signaling server listening");

        self.accept_loop(&listener).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "Signaling server listening");

        self.serve_until(listener, shutdown).await
    }

    /// Serve an already bound listener until `shutdown` resolves
    pub async fn serve_until<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
                Ok(())
            }
            result = self.accept_loop(&listener) => result,
        }
    }

    async fn accept_loop(&self, listener: &TcpListener) -> Result<()> {
        loop {
            match listener.accept().await {
                Ok((socket, peer_addr)) => {
                    self.handle_connection(socket, peer_addr).await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }

    async fn handle_connection(&self, socket: TcpStream, peer_addr: SocketAddr) {
        // Check connection limit
        let permit = if let Some(ref sem) = self.connection_semaphore {
            match sem.clone().try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    tracing::warn!(peer = %peer_addr, "Connection rejected: limit reached");
                    return;
                }
            }
        } else {
            None
        };

        let conn_id = ConnId::new(self.next_conn_id.fetch_add(1, Ordering::Relaxed));

        tracing::debug!(
            conn_id = %conn_id,
            peer = %peer_addr,
            "New connection"
        );

        if let Err(e) = self.configure_socket(&socket) {
            tracing::error!(error = %e, "Failed to configure socket");
            return;
        }

        if !self
            .handler
            .on_connection(&ConnectionContext::new(conn_id, peer_addr))
            .await
        {
            tracing::info!(conn_id = %conn_id, peer = %peer_addr, "Connection rejected by handler");
            return;
        }

        // Spawn connection handler
        let config = self.config.clone();
        let handler = Arc::clone(&self.handler);
        let relay = Arc::clone(&self.relay);
        let counters = Arc::clone(&self.counters);

        counters.opened();
        tokio::spawn(async move {
            // Held until the connection ends
            let _permit = permit;

            let mut connection = Connection::new(conn_id, peer_addr, config, handler, relay);

            if let Err(e) = connection.run(socket).await {
                tracing::debug!(
                    conn_id = %conn_id,
                    error = %e,
                    "Connection error"
                );
            }

            counters.closed();
            tracing::debug!(conn_id = %conn_id, "Connection closed");
        });
    }

    fn configure_socket(&self, socket: &TcpStream) -> std::io::Result<()> {
        if self.config.tcp_nodelay {
            socket.set_nodelay(true)?;
        }
        Ok(())
    }

    /// Get the bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }
}
