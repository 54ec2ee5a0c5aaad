use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            BEGIN;

            CREATE TABLE messages (
                id               TEXT PRIMARY KEY,
                seq              INTEGER NOT NULL UNIQUE,
                author           TEXT NOT NULL,
                recipient        TEXT,
                created_at       TEXT NOT NULL,
                kind             TEXT NOT NULL
                                 CHECK (kind IN ('text', 'image', 'file', 'voice')),
                content          TEXT,
                attachment_key   TEXT,
                attachment_name  TEXT,
                reply_to         TEXT
            );

            CREATE INDEX idx_messages_order
                ON messages(created_at, seq);

            CREATE INDEX idx_messages_conversation
                ON messages(author, recipient);

            CREATE TABLE user_pins (
                username    TEXT PRIMARY KEY,
                pin_hash    TEXT NOT NULL,
                created_at  TEXT NOT NULL
            );

            CREATE TABLE users_online (
                username    TEXT PRIMARY KEY,
                last_seen   TEXT NOT NULL
            );

            CREATE TABLE message_likes (
                message_id  TEXT NOT NULL REFERENCES messages(id),
                username    TEXT NOT NULL,
                PRIMARY KEY (message_id, username)
            );

            INSERT INTO schema_version (version) VALUES (1);

            COMMIT;
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
