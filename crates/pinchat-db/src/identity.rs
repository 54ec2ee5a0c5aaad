use pinchat_types::{ChatError, Result};
use tracing::info;

use crate::{Database, OptionalExt, clock};

impl Database {
    // -- Identity --

    /// Stores a credential for a new user. An existing credential is never
    /// overwritten.
    pub fn register(&self, username: &str, pin: &str) -> Result<()> {
        if username.trim().is_empty() {
            return Err(ChatError::validation("username must not be empty"));
        }
        if pin.is_empty() {
            return Err(ChatError::validation("PIN must not be empty"));
        }

        let pin_hash = self.pin_hasher.hash(pin)?;
        let created_at = clock::to_storage(&self.clock.now());

        let inserted = self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "INSERT INTO user_pins (username, pin_hash, created_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(username) DO NOTHING",
                (username, &pin_hash, &created_at),
            )?;
            Ok(changed == 1)
        })?;

        if !inserted {
            return Err(ChatError::AlreadyRegistered(username.to_string()));
        }
        info!("Registered user {}", username);
        Ok(())
    }

    /// `false` for a wrong PIN and for an unknown user alike.
    pub fn verify(&self, username: &str, pin: &str) -> Result<bool> {
        let stored = self.pin_hash(username)?;
        Ok(stored.is_some_and(|hash| self.pin_hasher.verify(pin, &hash)))
    }

    pub fn is_registered(&self, username: &str) -> Result<bool> {
        Ok(self.pin_hash(username)?.is_some())
    }

    fn pin_hash(&self, username: &str) -> Result<Option<String>> {
        let hash = self.with_conn(|conn| {
            conn.query_row(
                "SELECT pin_hash FROM user_pins WHERE username = ?1",
                [username],
                |row| row.get(0),
            )
            .optional()
        })?;
        Ok(hash)
    }
}
