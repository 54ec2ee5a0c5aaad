use pinchat_types::models::{AttachmentRef, Message, MessageKind, Page, Scope};
use pinchat_types::{ChatError, Result};
use rusqlite::params_from_iter;
use rusqlite::types::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{MESSAGE_COLUMNS, MessageRow};
use crate::{Database, OptionalExt, clock};

/// Body of a message about to be stored.
#[derive(Debug, Clone)]
pub enum Payload {
    Text(String),
    Attachment { file_name: String, bytes: Vec<u8> },
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub author: String,
    /// `None` (or an empty name) stores a global message.
    pub recipient: Option<String>,
    pub kind: MessageKind,
    pub payload: Payload,
    pub reply_to: Option<Uuid>,
}

enum EditOutcome {
    Updated,
    Missing,
    NotText(MessageKind),
}

impl Database {
    // -- Messages --

    /// Persists a message. Attachment bytes are durably written before the
    /// row is inserted, so a row never references a missing blob.
    pub fn append(&self, new: NewMessage) -> Result<Message> {
        if new.author.trim().is_empty() {
            return Err(ChatError::validation("author must not be empty"));
        }
        let recipient = new.recipient.filter(|r| !r.is_empty());

        let id = Uuid::new_v4();
        let (content, attachment) = match (new.kind, new.payload) {
            (MessageKind::Text, Payload::Text(text)) => {
                if text.trim().is_empty() {
                    return Err(ChatError::validation("text message must not be empty"));
                }
                (Some(text), None)
            }
            (kind, Payload::Attachment { file_name, bytes }) if !kind.is_text() => {
                let key = self.attachments.key_for(id, &file_name);
                self.attachments.write(&key, &bytes)?;
                (None, Some(AttachmentRef { key, file_name }))
            }
            (kind, _) => {
                return Err(ChatError::validation(format!(
                    "payload does not match message kind '{}'",
                    kind
                )));
            }
        };

        let inserted = self.with_conn_mut(|conn| {
            // Timestamp and sequence are taken under the writer lock so both
            // follow commit order.
            let created_at = clock::truncate(self.clock.now());
            conn.execute(
                "INSERT INTO messages
                    (id, seq, author, recipient, created_at, kind, content,
                     attachment_key, attachment_name, reply_to)
                 VALUES
                    (?1, (SELECT COALESCE(MAX(seq), 0) + 1 FROM messages),
                     ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                rusqlite::params![
                    id.to_string(),
                    &new.author,
                    &recipient,
                    clock::to_storage(&created_at),
                    new.kind.as_str(),
                    &content,
                    attachment.as_ref().map(|a| a.key.as_str()),
                    attachment.as_ref().map(|a| a.file_name.as_str()),
                    new.reply_to.map(|r| r.to_string()),
                ],
            )?;
            Ok(created_at)
        });

        let created_at = match inserted {
            Ok(ts) => ts,
            Err(e) => {
                if let Some(a) = &attachment {
                    if let Err(cleanup) = self.attachments.remove(&a.key) {
                        warn!("Failed to remove orphaned attachment {}: {}", a.key, cleanup);
                    }
                }
                return Err(e.into());
            }
        };

        debug!("Stored {} message {} from {}", new.kind, id, new.author);
        Ok(Message {
            id,
            author: new.author,
            recipient,
            created_at,
            kind: new.kind,
            content,
            attachment,
            reply_to: new.reply_to,
        })
    }

    /// Replaces the content of a text message. No history is kept.
    pub fn edit_content(&self, id: Uuid, new_content: &str) -> Result<()> {
        let outcome = self.with_conn_mut(|conn| {
            let kind: Option<String> = conn
                .query_row(
                    "SELECT kind FROM messages WHERE id = ?1",
                    [id.to_string()],
                    |row| row.get(0),
                )
                .optional()?;
            let Some(kind) = kind else {
                return Ok(EditOutcome::Missing);
            };
            let kind: MessageKind = kind
                .parse()
                .map_err(|e| anyhow::anyhow!("message {}: {}", id, e))?;
            if !kind.is_text() {
                return Ok(EditOutcome::NotText(kind));
            }
            conn.execute(
                "UPDATE messages SET content = ?1 WHERE id = ?2",
                (new_content, id.to_string()),
            )?;
            Ok(EditOutcome::Updated)
        })?;

        match outcome {
            EditOutcome::Updated => {
                debug!("Edited message {}", id);
                Ok(())
            }
            EditOutcome::Missing => Err(ChatError::message_not_found(id)),
            EditOutcome::NotText(kind) => Err(ChatError::validation(format!(
                "{} messages cannot be edited",
                kind
            ))),
        }
    }

    /// `None` when the id was never stored; callers render that as an
    /// unknown message.
    pub fn get_by_id(&self, id: Uuid) -> Result<Option<Message>> {
        let row = self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {} FROM messages WHERE id = ?1", MESSAGE_COLUMNS),
                [id.to_string()],
                MessageRow::from_row,
            )
            .optional()
        })?;
        Ok(row.map(MessageRow::into_message).transpose()?)
    }

    /// Number of messages `viewer` sees in `scope` that match `search`.
    pub fn count(&self, viewer: &str, scope: &Scope, search: Option<&str>) -> Result<u64> {
        let filter = Filter::new(viewer, scope, search);
        let total = self.with_conn(|conn| filter.count(conn))?;
        Ok(total)
    }

    /// One page (1-indexed) of `scope` in ascending creation order, plus
    /// the number of matching rows across all pages. A page past the end
    /// is empty.
    pub fn page(
        &self,
        viewer: &str,
        scope: &Scope,
        search: Option<&str>,
        page: u32,
        page_size: u32,
    ) -> Result<Page> {
        if page == 0 {
            return Err(ChatError::validation("page numbers start at 1"));
        }
        if page_size == 0 {
            return Err(ChatError::validation("page size must be positive"));
        }
        let offset = (u64::from(page) - 1).saturating_mul(u64::from(page_size));
        let filter = Filter::new(viewer, scope, search);

        let (rows, total_count) = self.with_conn(|conn| {
            // Offsets SQLite cannot take are past any stored row.
            let Ok(offset) = i64::try_from(offset) else {
                return Ok((Vec::new(), filter.count(conn)?));
            };

            // Rows and count from the same snapshot.
            let tx = conn.unchecked_transaction()?;

            let mut params = filter.params.clone();
            params.push(Value::Integer(i64::from(page_size)));
            params.push(Value::Integer(offset));

            let sql = format!(
                "SELECT {} FROM messages WHERE {} \
                 ORDER BY created_at ASC, seq ASC LIMIT ? OFFSET ?",
                MESSAGE_COLUMNS, filter.where_sql
            );
            let rows = {
                let mut stmt = tx.prepare(&sql)?;
                stmt.query_map(params_from_iter(params), MessageRow::from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?
            };
            let total = filter.count(&tx)?;
            tx.finish()?;
            Ok((rows, total))
        })?;

        let messages = rows
            .into_iter()
            .map(MessageRow::into_message)
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Page {
            messages,
            total_count,
        })
    }
}

/// WHERE clause and positional parameters for a scope + search filter.
struct Filter {
    where_sql: String,
    params: Vec<Value>,
}

impl Filter {
    fn new(viewer: &str, scope: &Scope, search: Option<&str>) -> Self {
        let mut clauses = Vec::new();
        let mut params = Vec::new();

        match scope {
            Scope::Global => clauses.push("(recipient IS NULL OR recipient = '')"),
            Scope::PrivateWith(peer) => {
                clauses.push("((author = ? AND recipient = ?) OR (author = ? AND recipient = ?))");
                for name in [viewer, peer.as_str(), peer.as_str(), viewer] {
                    params.push(Value::Text(name.to_string()));
                }
            }
        }

        if let Some(needle) = search.filter(|s| !s.is_empty()) {
            // Attachments have NULL content and never match.
            clauses.push("lower(content) LIKE ? ESCAPE '\\'");
            params.push(Value::Text(format!("%{}%", escape_like(&needle.to_lowercase()))));
        }

        Self {
            where_sql: clauses.join(" AND "),
            params,
        }
    }

    fn count(&self, conn: &rusqlite::Connection) -> anyhow::Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM messages WHERE {}", self.where_sql);
        let total: i64 =
            conn.query_row(&sql, params_from_iter(self.params.iter()), |row| row.get(0))?;
        Ok(u64::try_from(total)?)
    }
}

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
