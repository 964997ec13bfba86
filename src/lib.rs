//! Line-oriented multi-user TCP chat server library
//!
//! Clients connect over TCP, pick a display name, then every line they send
//! is broadcast to everyone in the room as `[name]: line`.
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `Room` is the central actor owning the member registry
//! - Each participant runs a read task and a write task with a private mailbox
//! - No locks needed - all membership changes and broadcasts go through the room
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use line_chat::{serve, Room};
//!
//! #[tokio::main]
//! async fn main() {
//!     let listener = TcpListener::bind("127.0.0.1:6677").await.unwrap();
//!     let (room, handle) = Room::new();
//!
//!     tokio::spawn(room.run());
//!     serve(listener, handle).await;
//! }
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod handler;
pub mod member;
pub mod message;
pub mod participant;
pub mod room;
pub mod types;

// Re-export main types for convenience
pub use config::Config;
pub use connection::{LineChannel, LineReader, LineWriter};
pub use error::{AppError, ConnectionError, SendError};
pub use handler::{handle_connection, serve};
pub use member::Member;
pub use message::ServerMessage;
pub use participant::Participant;
pub use room::{MemberInfo, Room, RoomHandle};
pub use types::ConnectionId;
