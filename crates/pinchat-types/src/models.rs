use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ChatError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Image,
    File,
    Voice,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::File => "file",
            Self::Voice => "voice",
        }
    }

    /// Text messages carry `content`; every other kind carries an attachment.
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = ChatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "image" => Ok(Self::Image),
            "file" => Ok(Self::File),
            "voice" => Ok(Self::Voice),
            other => Err(ChatError::Validation(format!(
                "unsupported message kind '{}'",
                other
            ))),
        }
    }
}

/// Opaque handle to a stored attachment blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRef {
    /// Storage key inside the upload directory.
    pub key: String,
    /// File name as supplied by the uploader.
    pub file_name: String,
}

/// A stored chat message.
///
/// Exactly one of `content` and `attachment` is set, decided by `kind`.
/// Only `content` ever changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub author: String,
    /// `None` for global messages.
    pub recipient: Option<String>,
    pub created_at: DateTime<Utc>,
    pub kind: MessageKind,
    pub content: Option<String>,
    pub attachment: Option<AttachmentRef>,
    pub reply_to: Option<Uuid>,
}

impl Message {
    pub fn is_global(&self) -> bool {
        self.recipient.is_none()
    }

    /// Whether `username` may see this message.
    pub fn visible_to(&self, username: &str) -> bool {
        match &self.recipient {
            None => true,
            Some(recipient) => recipient == username || self.author == username,
        }
    }
}

/// Partition of messages a chat view is drawn from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", content = "peer", rename_all = "snake_case")]
pub enum Scope {
    Global,
    /// Conversation between the viewer and `peer`, in either direction.
    PrivateWith(String),
}

impl Scope {
    pub fn from_peer(peer: Option<&str>) -> Self {
        match peer {
            Some(peer) => Self::PrivateWith(peer.to_string()),
            None => Self::Global,
        }
    }

    pub fn title(&self) -> String {
        match self {
            Self::Global => "Global Chat".to_string(),
            Self::PrivateWith(peer) => format!("Private Chat with {}", peer),
        }
    }
}

/// One page of a filtered scope, plus the number of rows matching the
/// filter across all pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub messages: Vec<Message>,
    pub total_count: u64,
}
