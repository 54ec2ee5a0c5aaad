use std::collections::{HashMap, HashSet};

use pinchat_types::{ChatError, Result};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{Database, OptionalExt};

impl Database {
    // -- Likes --

    /// Adds `username` to the likers of `message_id`. Liking twice is a
    /// no-op; liking an unknown message is `NotFound`.
    pub fn like(&self, username: &str, message_id: Uuid) -> Result<()> {
        let found = self.with_conn_mut(|conn| {
            let exists = conn
                .query_row(
                    "SELECT 1 FROM messages WHERE id = ?1",
                    [message_id.to_string()],
                    |_| Ok(()),
                )
                .optional()?
                .is_some();
            if exists {
                conn.execute(
                    "INSERT OR IGNORE INTO message_likes (message_id, username) VALUES (?1, ?2)",
                    (message_id.to_string(), username),
                )?;
            }
            Ok(exists)
        })?;

        if !found {
            return Err(ChatError::message_not_found(message_id));
        }
        debug!("{} likes {}", username, message_id);
        Ok(())
    }

    /// Removing a like that does not exist is a no-op.
    pub fn unlike(&self, username: &str, message_id: Uuid) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "DELETE FROM message_likes WHERE message_id = ?1 AND username = ?2",
                (message_id.to_string(), username),
            )?;
            Ok(())
        })?;
        debug!("{} unlikes {}", username, message_id);
        Ok(())
    }

    /// Unordered; sort before displaying.
    pub fn likes_for(&self, message_id: Uuid) -> Result<HashSet<String>> {
        let likers = self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT username FROM message_likes WHERE message_id = ?1")?;
            let rows = stmt
                .query_map([message_id.to_string()], |row| row.get(0))?
                .collect::<std::result::Result<HashSet<String>, _>>()?;
            Ok(rows)
        })?;
        Ok(likers)
    }

    pub fn has_liked(&self, username: &str, message_id: Uuid) -> Result<bool> {
        let liked = self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT 1 FROM message_likes WHERE message_id = ?1 AND username = ?2",
                    (message_id.to_string(), username),
                    |_| Ok(()),
                )
                .optional()?;
            Ok(row.is_some())
        })?;
        Ok(liked)
    }

    /// Batch-fetch likers for a page of messages. Messages without likes
    /// are absent from the map.
    pub fn likes_for_many(&self, message_ids: &[Uuid]) -> Result<HashMap<Uuid, HashSet<String>>> {
        if message_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = self.with_conn(|conn| {
            let placeholders: Vec<String> =
                (1..=message_ids.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT message_id, username FROM message_likes WHERE message_id IN ({})",
                placeholders.join(", ")
            );

            let mut stmt = conn.prepare(&sql)?;
            let ids: Vec<String> = message_ids.iter().map(Uuid::to_string).collect();
            let rows = stmt
                .query_map(rusqlite::params_from_iter(ids.iter()), |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;

        let mut likes: HashMap<Uuid, HashSet<String>> = HashMap::new();
        for (message_id, username) in rows {
            match message_id.parse::<Uuid>() {
                Ok(id) => {
                    likes.entry(id).or_default().insert(username);
                }
                Err(e) => warn!("Corrupt message_id '{}' in likes: {}", message_id, e),
            }
        }
        Ok(likes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{NewMessage, Payload};
    use crate::test_support::{self, TestDb};
    use pinchat_types::models::MessageKind;

    fn post(t: &TestDb, body: &str) -> Uuid {
        t.db.append(NewMessage {
            author: "alice".into(),
            recipient: None,
            kind: MessageKind::Text,
            payload: Payload::Text(body.into()),
            reply_to: None,
        })
        .unwrap()
        .id
    }

    #[test]
    fn like_is_idempotent() {
        let t = test_support::open();
        let id = post(&t, "hi");
        t.db.like("bob", id).unwrap();
        t.db.like("bob", id).unwrap();
        assert_eq!(t.db.likes_for(id).unwrap(), HashSet::from(["bob".to_string()]));
        assert!(t.db.has_liked("bob", id).unwrap());
        assert!(!t.db.has_liked("carol", id).unwrap());
    }

    #[test]
    fn like_then_unlike_restores_initial_state() {
        let t = test_support::open();
        let id = post(&t, "hi");

        t.db.like("bob", id).unwrap();
        t.db.unlike("bob", id).unwrap();
        assert!(t.db.likes_for(id).unwrap().is_empty());

        // Starting from unliked: unlike is a no-op, then like.
        t.db.unlike("bob", id).unwrap();
        assert!(t.db.likes_for(id).unwrap().is_empty());
        t.db.like("bob", id).unwrap();
        t.db.unlike("bob", id).unwrap();
        assert!(!t.db.has_liked("bob", id).unwrap());
    }

    #[test]
    fn liking_unknown_message_is_not_found() {
        let t = test_support::open();
        assert!(matches!(
            t.db.like("bob", Uuid::new_v4()),
            Err(ChatError::NotFound(_))
        ));
        t.db.unlike("bob", Uuid::new_v4()).unwrap();
    }

    #[test]
    fn batch_fetch_groups_by_message() {
        let t = test_support::open();
        let a = post(&t, "a");
        let b = post(&t, "b");
        let c = post(&t, "c");
        t.db.like("bob", a).unwrap();
        t.db.like("carol", a).unwrap();
        t.db.like("bob", b).unwrap();

        let likes = t.db.likes_for_many(&[a, b, c]).unwrap();
        assert_eq!(likes[&a].len(), 2);
        assert_eq!(likes[&b], HashSet::from(["bob".to_string()]));
        assert!(!likes.contains_key(&c));
        assert!(t.db.likes_for_many(&[]).unwrap().is_empty());
    }
}
