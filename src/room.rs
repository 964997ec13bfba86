//! Room actor implementation
//!
//! The room is the single owner of the member registry. Everything that
//! reads or changes membership, and every broadcast, happens inside `run`;
//! other tasks only ever talk to it through a [`RoomHandle`].

use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::error::{AppError, SendError};
use crate::member::Member;
use crate::message::ServerMessage;
use crate::participant::Participant;
use crate::types::ConnectionId;

/// Buffer size of each of the room's control channels
///
/// Senders wait when a channel is full. The room itself never waits on a
/// participant, so these always drain.
pub const CONTROL_CHANNEL_CAPACITY: usize = 256;

/// A participant asking to be removed
#[derive(Debug)]
pub struct Departure {
    pub id: ConnectionId,
    pub name: String,
}

/// Requests that need an answer from the room
#[derive(Debug)]
pub enum RoomQuery {
    /// Reserve a name for a connection still in its handshake
    ClaimName {
        id: ConnectionId,
        name: String,
        reply: oneshot::Sender<bool>,
    },
    /// Snapshot of the current members
    Members {
        reply: oneshot::Sender<Vec<MemberInfo>>,
    },
}

/// Roster entry returned by [`RoomHandle::members`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInfo {
    pub id: ConnectionId,
    pub name: String,
}

/// The chat room actor
pub struct Room {
    /// Registered members: name -> member handle
    members: HashMap<String, Member>,
    /// Names claimed by a handshake that has not joined yet: name -> claimant
    reserved: HashMap<String, ConnectionId>,
    joins: mpsc::Receiver<Participant>,
    incoming: mpsc::Receiver<String>,
    leaves: mpsc::Receiver<Departure>,
    queries: mpsc::Receiver<RoomQuery>,
}

/// Cloneable sending side of the room
///
/// The only way for participants and the acceptance driver to affect room
/// state. Every method is a hand-off onto a channel.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    joins: mpsc::Sender<Participant>,
    incoming: mpsc::Sender<String>,
    leaves: mpsc::Sender<Departure>,
    queries: mpsc::Sender<RoomQuery>,
}

impl Room {
    /// Create an empty room and its handle
    pub fn new() -> (Self, RoomHandle) {
        let (joins_tx, joins) = mpsc::channel(CONTROL_CHANNEL_CAPACITY);
        let (incoming_tx, incoming) = mpsc::channel(CONTROL_CHANNEL_CAPACITY);
        let (leaves_tx, leaves) = mpsc::channel(CONTROL_CHANNEL_CAPACITY);
        let (queries_tx, queries) = mpsc::channel(CONTROL_CHANNEL_CAPACITY);

        let room = Self {
            members: HashMap::new(),
            reserved: HashMap::new(),
            joins,
            incoming,
            leaves,
            queries,
        };
        let handle = RoomHandle {
            joins: joins_tx,
            incoming: incoming_tx,
            leaves: leaves_tx,
            queries: queries_tx,
        };
        (room, handle)
    }

    /// Run the room event loop
    ///
    /// Events from the four channels are handled one at a time, in arrival
    /// order per channel, with no priority between channels. Returns once
    /// every handle has been dropped.
    pub async fn run(mut self) {
        info!("Room started");

        loop {
            tokio::select! {
                Some(participant) = self.joins.recv() => self.handle_join(participant),
                Some(line) = self.incoming.recv() => self.broadcast(&line),
                Some(departure) = self.leaves.recv() => self.handle_leave(departure),
                Some(query) = self.queries.recv() => self.handle_query(query),
                else => break,
            }
        }

        info!("Room shutting down");
    }

    /// Admit a registered participant and start its loops
    fn handle_join(&mut self, participant: Participant) {
        let Some(member) = participant.member() else {
            warn!(
                "Connection {} tried to join without a name",
                participant.id()
            );
            tokio::spawn(participant.close());
            return;
        };

        let held_by_other = self
            .reserved
            .get(&member.name)
            .is_some_and(|holder| *holder != member.id);
        if self.members.contains_key(&member.name) || held_by_other {
            warn!(
                "Rejecting join of '{}' ({}): name in use",
                member.name, member.id
            );
            tokio::spawn(participant.close());
            return;
        }

        let name = member.name.clone();
        self.reserved.remove(&name);
        self.members.insert(name.clone(), member);
        info!(
            "'{}' ({}) joined, {} members",
            name,
            participant.id(),
            self.members.len()
        );

        self.broadcast(&ServerMessage::Joined { name: name.clone() }.to_string());

        if let Err(e) = participant.start_loops() {
            warn!("Could not start loops for '{}': {}", name, e);
        }
    }

    /// Remove a member, or release a reservation
    ///
    /// A leave for a name that is absent, or held by a different connection,
    /// is a no-op.
    fn handle_leave(&mut self, departure: Departure) {
        let Departure { id, name } = departure;

        if self.members.get(&name).is_some_and(|m| m.id == id) {
            if let Some(member) = self.members.remove(&name) {
                member.close();
            }
            info!("'{}' ({}) left, {} members", name, id, self.members.len());
            self.broadcast(&ServerMessage::Left { name }.to_string());
        } else if self.reserved.get(&name) == Some(&id) {
            self.reserved.remove(&name);
            debug!("Released reservation of '{}' ({})", name, id);
        } else {
            debug!("Ignoring leave of '{}' ({}): not a member", name, id);
        }
    }

    fn handle_query(&mut self, query: RoomQuery) {
        match query {
            RoomQuery::ClaimName { id, name, reply } => {
                let available =
                    !self.members.contains_key(&name) && !self.reserved.contains_key(&name);
                if available {
                    self.reserved.insert(name, id);
                }
                let _ = reply.send(available);
            }
            RoomQuery::Members { reply } => {
                let mut roster: Vec<MemberInfo> = self
                    .members
                    .values()
                    .map(|m| MemberInfo {
                        id: m.id,
                        name: m.name.clone(),
                    })
                    .collect();
                roster.sort_by(|a, b| a.name.cmp(&b.name));
                let _ = reply.send(roster);
            }
        }
    }

    /// Queue `line` for every member, the originator included
    ///
    /// Never waits: a member whose mailbox is full misses this line, and a
    /// member already torn down is skipped.
    fn broadcast(&self, line: &str) {
        for member in self.members.values() {
            match member.send(line) {
                Ok(()) => {}
                Err(SendError::MailboxFull) => {
                    warn!("Mailbox of '{}' is full, dropping line", member.name);
                }
                Err(SendError::ChannelClosed) => {
                    debug!("Skipping closed mailbox of '{}'", member.name);
                }
            }
        }
    }
}

impl RoomHandle {
    /// Hand a registered participant to the room
    pub async fn request_join(&self, participant: Participant) -> Result<(), AppError> {
        self.joins
            .send(participant)
            .await
            .map_err(|_| AppError::RoomClosed)
    }

    /// Submit an already formatted chat line for broadcast
    pub async fn post_incoming(&self, line: String) -> Result<(), AppError> {
        self.incoming
            .send(line)
            .await
            .map_err(|_| AppError::RoomClosed)
    }

    /// Ask the room to remove `name`, as held by connection `id`
    pub async fn request_leave(
        &self,
        id: ConnectionId,
        name: impl Into<String>,
    ) -> Result<(), AppError> {
        self.leaves
            .send(Departure {
                id,
                name: name.into(),
            })
            .await
            .map_err(|_| AppError::RoomClosed)
    }

    /// Reserve `name` for connection `id` if nobody holds it
    pub async fn claim_name(
        &self,
        id: ConnectionId,
        name: impl Into<String>,
    ) -> Result<bool, AppError> {
        let (reply, response) = oneshot::channel();
        self.queries
            .send(RoomQuery::ClaimName {
                id,
                name: name.into(),
                reply,
            })
            .await
            .map_err(|_| AppError::RoomClosed)?;
        response.await.map_err(|_| AppError::RoomClosed)
    }

    /// Current members, sorted by name
    pub async fn members(&self) -> Result<Vec<MemberInfo>, AppError> {
        let (reply, response) = oneshot::channel();
        self.queries
            .send(RoomQuery::Members { reply })
            .await
            .map_err(|_| AppError::RoomClosed)?;
        response.await.map_err(|_| AppError::RoomClosed)
    }
}
