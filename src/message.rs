//! Text protocol definitions
//!
//! Every line the server writes to a client is produced from a
//! `ServerMessage` through its `Display` impl. Line terminators are added by
//! the connection layer, never here.

use std::fmt;

/// Server → Client text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// First line after connecting
    Welcome,
    /// Name prompt, written without a terminator
    NamePrompt,
    /// The offered name was blank
    NameEmpty,
    /// The offered name is held by a member or an in-flight registration
    NameTaken { name: String },
    /// Registration finished
    SignedIn { name: String },
    /// Chat line from a member
    Chat { from: String, content: String },
    /// A member was admitted
    Joined { name: String },
    /// A member left or was disconnected
    Left { name: String },
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerMessage::Welcome => write!(f, "Welcome to the chat"),
            ServerMessage::NamePrompt => write!(f, "Please enter your name: "),
            ServerMessage::NameEmpty => write!(f, "Name cannot be empty"),
            ServerMessage::NameTaken { name } => write!(f, "Name '{}' is unavailable", name),
            ServerMessage::SignedIn { name } => {
                write!(f, "You are successfully signed in as {}", name)
            }
            ServerMessage::Chat { from, content } => write!(f, "[{}]: {}", from, content),
            ServerMessage::Joined { name } => write!(f, "--- {} joined", name),
            ServerMessage::Left { name } => write!(f, "--- {} left the room", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_format() {
        let msg = ServerMessage::Chat {
            from: "alice".to_string(),
            content: "hi".to_string(),
        };
        assert_eq!(msg.to_string(), "[alice]: hi");
    }

    #[test]
    fn test_notice_format() {
        let joined = ServerMessage::Joined {
            name: "bob".to_string(),
        };
        let left = ServerMessage::Left {
            name: "bob".to_string(),
        };
        assert_eq!(joined.to_string(), "--- bob joined");
        assert_eq!(left.to_string(), "--- bob left the room");
    }

    #[test]
    fn test_prompt_has_no_terminator() {
        assert!(!ServerMessage::NamePrompt.to_string().ends_with('\n'));
    }
}
