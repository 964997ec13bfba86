//! Member handle
//!
//! The room-side view of a registered participant: its name, the sending end
//! of its mailbox, and its liveness token.

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;

use crate::error::SendError;
use crate::types::ConnectionId;

/// Registered participant as seen by the room
///
/// Cheap to clone; every clone talks to the same mailbox and token.
#[derive(Debug, Clone)]
pub struct Member {
    /// Connection this member belongs to
    pub id: ConnectionId,
    /// Registered display name
    pub name: String,
    /// Room → participant mailbox
    outbox: mpsc::Sender<String>,
    /// Cancelled once the participant is torn down
    alive: CancellationToken,
}

impl Member {
    pub fn new(
        id: ConnectionId,
        name: String,
        outbox: mpsc::Sender<String>,
        alive: CancellationToken,
    ) -> Self {
        Self {
            id,
            name,
            outbox,
            alive,
        }
    }

    /// Queue a line for this member without waiting
    ///
    /// A torn-down member reports `ChannelClosed`; a member whose writer has
    /// stalled reports `MailboxFull`. Neither blocks the caller.
    pub fn send(&self, line: &str) -> Result<(), SendError> {
        if !self.is_alive() {
            return Err(SendError::ChannelClosed);
        }
        self.outbox.try_send(line.to_string()).map_err(|e| match e {
            TrySendError::Full(_) => SendError::MailboxFull,
            TrySendError::Closed(_) => SendError::ChannelClosed,
        })
    }

    /// Stop both of the participant's loops; the writer loop closes the socket
    ///
    /// Safe to call any number of times.
    pub fn close(&self) {
        self.alive.cancel();
    }

    pub fn is_alive(&self) -> bool {
        !self.alive.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(capacity: usize) -> (Member, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity);
        let member = Member::new(
            ConnectionId::new(),
            "alice".to_string(),
            tx,
            CancellationToken::new(),
        );
        (member, rx)
    }

    #[tokio::test]
    async fn test_send_delivers_in_order() {
        let (member, mut rx) = member(8);

        member.send("one").unwrap();
        member.send("two").unwrap();

        assert_eq!(rx.recv().await.unwrap(), "one");
        assert_eq!(rx.recv().await.unwrap(), "two");
    }

    #[tokio::test]
    async fn test_full_mailbox_does_not_block() {
        let (member, _rx) = member(2);

        member.send("one").unwrap();
        member.send("two").unwrap();

        assert_eq!(member.send("three"), Err(SendError::MailboxFull));
    }

    #[tokio::test]
    async fn test_send_after_receiver_dropped() {
        let (member, rx) = member(2);
        drop(rx);

        assert_eq!(member.send("hello"), Err(SendError::ChannelClosed));
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let (member, _rx) = member(2);
        assert!(member.is_alive());

        member.close();
        member.close();

        assert!(!member.is_alive());
        assert_eq!(member.send("late"), Err(SendError::ChannelClosed));
    }
}
