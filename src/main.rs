//! Line chat server - Entry Point
//!
//! Binds the TCP listener, starts the Room actor and accepts connections.

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use line_chat::{serve, Config, Room};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=line_chat=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("line_chat=info")),
        )
        .init();

    let config = Config::parse();

    // Without a listener the server has nothing to do, so this one is fatal
    let listener = TcpListener::bind(config.bind_addr()).await?;
    info!("Chat server listening on {}", listener.local_addr()?);

    let (room, handle) = Room::new();
    tokio::spawn(room.run());

    serve(listener, handle).await;
    Ok(())
}
