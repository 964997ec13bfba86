//! End-to-end chat sessions over loopback TCP.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

use line_chat::{serve, Room, RoomHandle};

const TIMEOUT: Duration = Duration::from_secs(5);

/// Start a room and an accept loop on an ephemeral port
async fn start_server() -> (SocketAddr, RoomHandle) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (room, handle) = Room::new();
    tokio::spawn(room.run());
    tokio::spawn(serve(listener, handle.clone()));

    (addr, handle)
}

struct ChatClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl ChatClient {
    async fn open(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (reader, writer) = stream.into_split();
        let mut client = Self {
            reader: BufReader::new(reader),
            writer,
        };
        client.expect("Welcome to the chat\n").await;
        client.expect("Please enter your name: ").await;
        client
    }

    async fn join(addr: SocketAddr, name: &str) -> Self {
        let mut client = Self::open(addr).await;
        client.send(name).await;
        client
            .expect(&format!("You are successfully signed in as {}\n", name))
            .await;
        assert_eq!(client.line().await, format!("--- {} joined", name));
        client
    }

    async fn expect(&mut self, text: &str) {
        let mut buf = vec![0u8; text.len()];
        timeout(TIMEOUT, self.reader.read_exact(&mut buf))
            .await
            .expect("timed out waiting for server")
            .unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), text);
    }

    async fn line(&mut self) -> String {
        let mut line = String::new();
        timeout(TIMEOUT, self.reader.read_line(&mut line))
            .await
            .expect("timed out waiting for server")
            .unwrap();
        line.trim_end_matches('\n').to_string()
    }

    async fn send(&mut self, text: &str) {
        self.writer
            .write_all(format!("{}\n", text).as_bytes())
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_alice_and_bob_session() {
    let (addr, room) = start_server().await;

    let mut alice = ChatClient::join(addr, "alice").await;

    let mut bob = ChatClient::open(addr).await;
    bob.send("alice").await;
    bob.expect("Name 'alice' is unavailable\n").await;
    bob.expect("Please enter your name: ").await;
    bob.send("bob").await;
    bob.expect("You are successfully signed in as bob\n").await;
    assert_eq!(bob.line().await, "--- bob joined");
    assert_eq!(alice.line().await, "--- bob joined");

    alice.send("hi").await;
    assert_eq!(alice.line().await, "[alice]: hi");
    assert_eq!(bob.line().await, "[alice]: hi");

    drop(bob);
    assert_eq!(alice.line().await, "--- bob left the room");

    let names: Vec<String> = room
        .members()
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.name)
        .collect();
    assert_eq!(names, vec!["alice"]);
}

#[tokio::test]
async fn test_crlf_clients_are_understood() {
    let (addr, _room) = start_server().await;

    let mut client = ChatClient::open(addr).await;
    client.writer.write_all(b"carol\r\n").await.unwrap();
    client
        .expect("You are successfully signed in as carol\n")
        .await;
    assert_eq!(client.line().await, "--- carol joined");

    client.writer.write_all(b"hello\r\n").await.unwrap();
    assert_eq!(client.line().await, "[carol]: hello");
}

#[tokio::test]
async fn test_abandoned_handshake_keeps_server_running() {
    let (addr, _room) = start_server().await;

    let quitter = ChatClient::open(addr).await;
    drop(quitter);

    let mut alice = ChatClient::join(addr, "alice").await;
    alice.send("still up").await;
    assert_eq!(alice.line().await, "[alice]: still up");
}
