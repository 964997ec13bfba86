//! Connection acceptance
//!
//! Turns each accepted connection into a participant, runs its registration
//! handshake and hands it to the room. A failed handshake only ever ends its
//! own connection.

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::error::AppError;
use crate::participant::Participant;
use crate::room::RoomHandle;

/// Handle a new connection
///
/// Registers the client and posts it to the room. On registration failure the
/// connection is shut down and the error returned; the caller only logs it.
pub async fn handle_connection<S>(stream: S, peer: String, room: RoomHandle) -> Result<(), AppError>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let mut participant = Participant::new(stream, room.clone());
    debug!("Connection {} from {}", participant.id(), peer);

    if let Err(e) = participant.register().await {
        info!(
            "Connection {} from {} failed to register: {}",
            participant.id(),
            peer,
            e
        );
        participant.close().await;
        return Err(e);
    }

    room.request_join(participant).await
}

/// Accept connections forever
///
/// Each connection runs on its own task. Accept errors are logged and the
/// loop keeps going.
pub async fn serve(listener: TcpListener, room: RoomHandle) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                info!("New connection from {}", addr);
                let room = room.clone();

                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, addr.to_string(), room).await {
                        debug!("Connection from {} ended before joining: {}", addr, e);
                    }
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
