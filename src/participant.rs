//! Participant actor
//!
//! One participant per accepted connection. It negotiates a name over the
//! raw connection, then (once the room admits it) runs two tasks: an inbound
//! loop that forwards chat lines to the room, and an outbound loop that drains
//! the participant's private mailbox onto the socket.

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::connection::{LineChannel, LineReader, LineWriter};
use crate::error::AppError;
use crate::member::Member;
use crate::message::ServerMessage;
use crate::room::RoomHandle;
use crate::types::ConnectionId;

/// Mailbox capacity per participant
///
/// The room never waits on a mailbox: once a stalled client has this many
/// lines pending, further lines for it are dropped (see `Room::broadcast`).
pub const OUTBOX_CAPACITY: usize = 64;

/// A connected client, before and during room membership
pub struct Participant {
    id: ConnectionId,
    /// None until registration succeeds
    name: Option<String>,
    channel: LineChannel,
    /// Sending end handed to the room through `member()`
    outbox: mpsc::Sender<String>,
    /// Receiving end, drained by the outbound loop
    mailbox: mpsc::Receiver<String>,
    /// Cancelled exactly once, on teardown
    alive: CancellationToken,
    room: RoomHandle,
}

impl Participant {
    /// Wrap a freshly accepted stream
    pub fn new<S>(stream: S, room: RoomHandle) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        Self::with_outbox_capacity(stream, room, OUTBOX_CAPACITY)
    }

    pub fn with_outbox_capacity<S>(stream: S, room: RoomHandle, capacity: usize) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (outbox, mailbox) = mpsc::channel(capacity);
        Self {
            id: ConnectionId::new(),
            name: None,
            channel: LineChannel::new(stream),
            outbox,
            mailbox,
            alive: CancellationToken::new(),
            room,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Room-side handle, available once registered
    pub fn member(&self) -> Option<Member> {
        let name = self.name.clone()?;
        Some(Member::new(
            self.id,
            name,
            self.outbox.clone(),
            self.alive.clone(),
        ))
    }

    /// Run the registration handshake on the raw connection
    ///
    /// Re-prompts on an empty or taken name. The name is reserved in the room
    /// as part of the availability check, so two handshakes can never both
    /// win the same name. Fails only on a transport error or a closed room.
    pub async fn register(&mut self) -> Result<(), AppError> {
        self.channel
            .writer()
            .write_line(&ServerMessage::Welcome.to_string())
            .await?;

        let name = loop {
            self.channel
                .writer()
                .write_prompt(&ServerMessage::NamePrompt.to_string())
                .await?;

            let line = self.channel.reader().read_line().await?;
            let offered = line.trim();

            if offered.is_empty() {
                self.channel
                    .writer()
                    .write_line(&ServerMessage::NameEmpty.to_string())
                    .await?;
                continue;
            }

            if self.room.claim_name(self.id, offered).await? {
                break offered.to_string();
            }

            debug!("Connection {} offered taken name '{}'", self.id, offered);
            self.channel
                .writer()
                .write_line(
                    &ServerMessage::NameTaken {
                        name: offered.to_string(),
                    }
                    .to_string(),
                )
                .await?;
        };

        let signed_in = ServerMessage::SignedIn { name: name.clone() }.to_string();
        if let Err(e) = self.channel.writer().write_line(&signed_in).await {
            // Give the reservation back; this participant will never join.
            let _ = self.room.request_leave(self.id, name).await;
            return Err(e.into());
        }

        info!("Connection {} registered as '{}'", self.id, name);
        self.name = Some(name);
        Ok(())
    }

    /// Spawn the inbound and outbound loops
    ///
    /// Called by the room after the participant has been added to the member
    /// registry, so the first line the outbound loop writes is its own join
    /// notice.
    pub fn start_loops(self) -> Result<(), AppError> {
        let Participant {
            id,
            name,
            channel,
            outbox,
            mailbox,
            alive,
            room,
        } = self;
        let Some(name) = name else {
            return Err(AppError::NotRegistered);
        };
        // Only the room's member handle keeps the mailbox open from here on.
        drop(outbox);

        let (reader, writer) = channel.into_split();

        tokio::spawn(write_loop(
            id,
            name.clone(),
            writer,
            mailbox,
            alive.clone(),
            room.clone(),
        ));
        tokio::spawn(read_loop(id, name, reader, alive, room));
        Ok(())
    }

    /// Tear down a participant that never joined
    pub async fn close(self) {
        self.alive.cancel();
        let (_, mut writer) = self.channel.into_split();
        if let Err(e) = writer.shutdown().await {
            debug!("Shutdown of connection {} failed: {}", self.id, e);
        }
    }
}

/// Drain the mailbox onto the socket until cancelled or a write fails
async fn write_loop(
    id: ConnectionId,
    name: String,
    mut writer: LineWriter,
    mut mailbox: mpsc::Receiver<String>,
    alive: CancellationToken,
    room: RoomHandle,
) {
    loop {
        let line = tokio::select! {
            _ = alive.cancelled() => break,
            line = mailbox.recv() => line,
        };
        let Some(line) = line else {
            break;
        };

        let result = tokio::select! {
            _ = alive.cancelled() => break,
            result = writer.write_line(&line) => result,
        };
        if let Err(e) = result {
            debug!("Write to '{}' ({}) failed: {}", name, id, e);
            let _ = room.request_leave(id, name.as_str()).await;
            break;
        }
    }

    if let Err(e) = writer.shutdown().await {
        debug!("Shutdown of connection {} failed: {}", id, e);
    }
    debug!("Write loop ended for '{}' ({})", name, id);
}

/// Forward non-empty lines to the room until cancelled or a read fails
async fn read_loop(
    id: ConnectionId,
    name: String,
    mut reader: LineReader,
    alive: CancellationToken,
    room: RoomHandle,
) {
    loop {
        let result = tokio::select! {
            _ = alive.cancelled() => break,
            result = reader.read_line() => result,
        };

        match result {
            Ok(line) if line.is_empty() => continue,
            Ok(line) => {
                let chat = ServerMessage::Chat {
                    from: name.clone(),
                    content: line,
                };
                if room.post_incoming(chat.to_string()).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                debug!("Read from '{}' ({}) failed: {}", name, id, e);
                let _ = room.request_leave(id, name.as_str()).await;
                break;
            }
        }
    }
    debug!("Read loop ended for '{}' ({})", name, id);
}
