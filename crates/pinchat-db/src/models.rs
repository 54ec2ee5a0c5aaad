//! Database row types. These map directly to SQLite rows and are kept
//! distinct from the `pinchat-types` models so the schema can evolve
//! independently.

use anyhow::{Context, Result};
use pinchat_types::models::{AttachmentRef, Message, MessageKind};
use rusqlite::Row;
use tracing::warn;
use uuid::Uuid;

use crate::clock;

pub const MESSAGE_COLUMNS: &str =
    "id, author, recipient, created_at, kind, content, attachment_key, attachment_name, reply_to";

pub struct MessageRow {
    pub id: String,
    pub author: String,
    pub recipient: Option<String>,
    pub created_at: String,
    pub kind: String,
    pub content: Option<String>,
    pub attachment_key: Option<String>,
    pub attachment_name: Option<String>,
    pub reply_to: Option<String>,
}

impl MessageRow {
    /// Reads a row selected with [`MESSAGE_COLUMNS`].
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            author: row.get(1)?,
            recipient: row.get(2)?,
            created_at: row.get(3)?,
            kind: row.get(4)?,
            content: row.get(5)?,
            attachment_key: row.get(6)?,
            attachment_name: row.get(7)?,
            reply_to: row.get(8)?,
        })
    }

    pub fn into_message(self) -> Result<Message> {
        let id: Uuid = self
            .id
            .parse()
            .with_context(|| format!("corrupt message id '{}'", self.id))?;
        let kind: MessageKind = self
            .kind
            .parse()
            .map_err(|e| anyhow::anyhow!("message {}: {}", id, e))?;
        let created_at = clock::from_storage(&self.created_at)?;

        // Old rows may carry '' for global messages.
        let recipient = self.recipient.filter(|r| !r.is_empty());

        let attachment = match (self.attachment_key, self.attachment_name) {
            (Some(key), name) => Some(AttachmentRef {
                file_name: name.unwrap_or_else(|| key.clone()),
                key,
            }),
            (None, _) => None,
        };

        let reply_to = self.reply_to.and_then(|raw| match raw.parse::<Uuid>() {
            Ok(target) => Some(target),
            Err(e) => {
                warn!("Ignoring corrupt reply_to '{}' on message {}: {}", raw, id, e);
                None
            }
        });

        Ok(Message {
            id,
            author: self.author,
            recipient,
            created_at,
            kind,
            content: self.content,
            attachment,
            reply_to,
        })
    }
}
