//! Signaling server demo with logging hooks
//!
//! Run with: cargo run --example signal_server [BIND_ADDR]
//!
//! Examples:
//!   cargo run --example signal_server                    # binds to 0.0.0.0:3000
//!   cargo run --example signal_server localhost          # binds to 127.0.0.1:3000
//!   cargo run --example signal_server 127.0.0.1:3001     # binds to 127.0.0.1:3001
//!
//! Each connection speaks newline-delimited JSON. Try it with netcat:
//!
//! ```text
//! $ nc localhost 3000
//! {"type":"join-room","room_id":"r1","link_id":"a1","name":"Alice"}
//! {"type":"send-message","room_id":"r1","text":"hi","name":"Alice"}
//! ```

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use meet_rs::protocol::ChatMessage;
use meet_rs::server::{Admission, ConnectionContext};
use meet_rs::{RegistryConfig, RoomId, RoomInvite, ServerConfig, SignalHandler, SignalServer};

const DEFAULT_PORT: u16 = 3000;

/// Handler that logs events and counts chat traffic
struct LoggingHandler {
    chats: AtomicU64,
}

impl SignalHandler for LoggingHandler {
    async fn on_connection(&self, ctx: &ConnectionContext) -> bool {
        println!("[{}] New connection from {}", ctx.conn_id, ctx.peer_addr);
        true
    }

    async fn on_join(&self, ctx: &ConnectionContext, room_id: &RoomId, name: &str) -> Admission {
        println!("[{}] {} joins room {}", ctx.conn_id, name, room_id);
        Admission::Accept
    }

    async fn on_chat(&self, ctx: &ConnectionContext, message: &ChatMessage) {
        let total = self.chats.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!(
            conn_id = %ctx.conn_id,
            name = %message.name,
            total,
            "Chat relayed"
        );
    }

    async fn on_disconnect(&self, ctx: &ConnectionContext) {
        println!("[{}] Disconnected", ctx.conn_id);
    }
}

/// Parse bind address from command line argument.
///
/// Accepts `IP:PORT`, `IP`, or `localhost[:PORT]`.
fn parse_bind_addr(arg: &str) -> Result<SocketAddr, String> {
    let normalized = arg.replace("localhost", "127.0.0.1");

    if let Ok(addr) = normalized.parse::<SocketAddr>() {
        return Ok(addr);
    }

    if let Ok(ip) = normalized.parse::<std::net::IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    Err(format!(
        "Invalid bind address: '{}'. Expected format: IP:PORT or IP or 'localhost'",
        arg
    ))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let bind_addr = match std::env::args().nth(1) {
        Some(arg) => parse_bind_addr(&arg)?,
        None => SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("meet_rs=debug".parse()?)
                .add_directive("signal_server=debug".parse()?),
        )
        .init();

    let config = ServerConfig::with_addr(bind_addr).idle_timeout(Duration::from_secs(300));
    let server = Arc::new(SignalServer::with_registry_config(
        config,
        LoggingHandler {
            chats: AtomicU64::new(0),
        },
        RegistryConfig::default().max_participants(16),
    ));

    let invite = RoomInvite::create(&format!("http://localhost:{}", bind_addr.port()));
    println!("Starting signaling server on {}", server.bind_addr());
    println!("Example room: {}", invite.room_link);
    println!("{}", serde_json::to_string_pretty(&invite)?);

    let stats_server = Arc::clone(&server);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(30));
        loop {
            ticker.tick().await;
            let stats = stats_server.stats().await;
            tracing::info!(
                active_connections = stats.active_connections,
                active_rooms = stats.active_rooms,
                delivered = stats.relay.delivered,
                dropped = stats.relay.dropped,
                "Server stats"
            );
        }
    });

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                eprintln!("Server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            println!("\nShutting down...");
        }
    }

    Ok(())
}
