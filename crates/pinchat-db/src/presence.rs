use std::time::Duration;

use chrono::{DateTime, Utc};
use pinchat_types::Result;

use crate::{Database, OptionalExt, clock};

pub const DEFAULT_PRESENCE_WINDOW: Duration = Duration::from_secs(120);

impl Database {
    // -- Presence --

    pub fn touch(&self, username: &str) -> Result<()> {
        let now = clock::to_storage(&self.clock.now());
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users_online (username, last_seen) VALUES (?1, ?2)
                 ON CONFLICT(username) DO UPDATE SET last_seen = excluded.last_seen",
                (username, &now),
            )?;
            Ok(())
        })?;
        Ok(())
    }

    /// Users seen strictly after `now - window`, sorted by name.
    pub fn online_users(&self, window: Duration) -> Result<Vec<String>> {
        let window = chrono::Duration::from_std(window)
            .map_err(|e| anyhow::anyhow!("presence window out of range: {}", e))?;
        let threshold = clock::to_storage(&(self.clock.now() - window));

        let users = self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT username FROM users_online WHERE last_seen > ?1 ORDER BY username",
            )?;
            let rows = stmt
                .query_map([&threshold], |row| row.get(0))?
                .collect::<std::result::Result<Vec<String>, _>>()?;
            Ok(rows)
        })?;
        Ok(users)
    }

    pub fn last_seen(&self, username: &str) -> Result<Option<DateTime<Utc>>> {
        let raw: Option<String> = self.with_conn(|conn| {
            conn.query_row(
                "SELECT last_seen FROM users_online WHERE username = ?1",
                [username],
                |row| row.get(0),
            )
            .optional()
        })?;
        Ok(raw.map(|raw| clock::from_storage(&raw)).transpose()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[test]
    fn window_boundary() {
        let t = test_support::open();
        t.db.touch("alice").unwrap();

        t.clock.advance(chrono::Duration::seconds(120) - chrono::Duration::milliseconds(1));
        assert_eq!(
            t.db.online_users(DEFAULT_PRESENCE_WINDOW).unwrap(),
            vec!["alice".to_string()]
        );

        // Exactly on the boundary is already outside: the comparison is strict.
        t.clock.advance(chrono::Duration::milliseconds(1));
        assert!(t.db.online_users(DEFAULT_PRESENCE_WINDOW).unwrap().is_empty());

        t.clock.advance(chrono::Duration::milliseconds(1));
        assert!(t.db.online_users(DEFAULT_PRESENCE_WINDOW).unwrap().is_empty());
    }

    #[test]
    fn touch_refreshes_last_seen() {
        let t = test_support::open();
        t.db.touch("alice").unwrap();
        t.db.touch("bob").unwrap();
        t.clock.advance(chrono::Duration::seconds(100));
        t.db.touch("alice").unwrap();
        t.clock.advance(chrono::Duration::seconds(60));

        assert_eq!(
            t.db.online_users(DEFAULT_PRESENCE_WINDOW).unwrap(),
            vec!["alice".to_string()]
        );
        assert_eq!(
            t.db.last_seen("bob").unwrap().map(|ts| ts.timestamp()),
            Some(1_704_067_200)
        );
        assert!(t.db.last_seen("nobody").unwrap().is_none());
    }

    #[test]
    fn online_users_are_sorted() {
        let t = test_support::open();
        for name in ["carol", "alice", "bob"] {
            t.db.touch(name).unwrap();
        }
        assert_eq!(
            t.db.online_users(Duration::from_secs(5)).unwrap(),
            vec!["alice", "bob", "carol"]
        );
    }
}
