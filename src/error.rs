//! Error types for the chat server
//!
//! Defines application-level errors, connection (transport) errors and
//! mailbox send errors. Uses thiserror for ergonomic error definitions.

use thiserror::Error;
use tokio_util::codec::LinesCodecError;

/// Application-level errors
///
/// Returned by the acceptance driver and the room handle. None of these are
/// fatal to the process; they end a single connection at most.
#[derive(Debug, Error)]
pub enum AppError {
    /// The participant's connection failed
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// The room task is gone and no longer accepts events
    #[error("Room closed")]
    RoomClosed,

    /// A participant was handed to the room before registering a name
    #[error("Participant not registered")]
    NotRegistered,
}

/// Transport errors on a single line channel
///
/// Every variant means "this participant is gone"; nothing is retried.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The peer closed the stream
    #[error("Connection closed by peer")]
    Closed,

    /// The peer sent a line longer than the framing limit
    #[error("Line exceeds maximum length")]
    LineTooLong,

    /// Read, write or UTF-8 decoding failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<LinesCodecError> for ConnectionError {
    fn from(err: LinesCodecError) -> Self {
        match err {
            LinesCodecError::MaxLineLengthExceeded => ConnectionError::LineTooLong,
            LinesCodecError::Io(e) => ConnectionError::Io(e),
        }
    }
}

/// Mailbox send errors
///
/// Occurs when the room pushes a line into a member's outbox.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendError {
    /// The member's writer loop has ended
    #[error("Channel closed")]
    ChannelClosed,

    /// The member's writer loop is not keeping up
    #[error("Mailbox full")]
    MailboxFull,
}
