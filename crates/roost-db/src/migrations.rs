use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

/// Tables use `IF NOT EXISTS` so a database created by an earlier
/// deployment (same table and column names) is picked up as-is.
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
            CREATE TABLE IF NOT EXISTS users (
                id                INTEGER PRIMARY KEY,
                username          TEXT NOT NULL UNIQUE,
                display_name      TEXT NOT NULL,
                password_hash     TEXT NOT NULL,
                bio               TEXT NOT NULL DEFAULT '',
                profile_pic_path  TEXT,
                created_at        REAL NOT NULL,
                wallet_address    TEXT NOT NULL,
                private_key       TEXT NOT NULL,
                mnemonic          TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS posts (
                id            INTEGER PRIMARY KEY,
                user_id       INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                text          TEXT NOT NULL,
                image_path    TEXT,
                created_at    REAL NOT NULL,
                orig_post_id  INTEGER DEFAULT NULL REFERENCES posts(id) ON DELETE SET NULL
            );

            CREATE INDEX IF NOT EXISTS idx_posts_user
                ON posts(user_id, created_at);

            CREATE TABLE IF NOT EXISTS follows (
                follower_id  INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                followed_id  INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at   REAL NOT NULL,
                PRIMARY KEY (follower_id, followed_id)
            );

            CREATE INDEX IF NOT EXISTS idx_follows_followed
                ON follows(followed_id);

            CREATE TABLE IF NOT EXISTS likes (
                user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                post_id     INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
                created_at  REAL NOT NULL,
                PRIMARY KEY (user_id, post_id)
            );

            CREATE INDEX IF NOT EXISTS idx_likes_post
                ON likes(post_id);

            CREATE TABLE IF NOT EXISTS bookmarks (
                user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                post_id     INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
                created_at  REAL NOT NULL,
                PRIMARY KEY (user_id, post_id)
            );

            CREATE TABLE IF NOT EXISTS replies (
                id          INTEGER PRIMARY KEY,
                post_id     INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
                user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                text        TEXT NOT NULL,
                created_at  REAL NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_replies_post
                ON replies(post_id, created_at);
            CREATE INDEX IF NOT EXISTS idx_replies_user
                ON replies(user_id, created_at);

            CREATE TABLE IF NOT EXISTS messages (
                id           INTEGER PRIMARY KEY,
                sender_id    INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                receiver_id  INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                text         TEXT NOT NULL,
                created_at   REAL NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_messages_pair
                ON messages(sender_id, receiver_id, created_at);

            CREATE TABLE IF NOT EXISTS notifications (
                id          INTEGER PRIMARY KEY,
                user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                text        TEXT NOT NULL,
                seen        INTEGER NOT NULL DEFAULT 0,
                created_at  REAL NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_notifications_user
                ON notifications(user_id, created_at);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        run(&conn).unwrap();

        let versions: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(versions, 1);

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN
                 ('users','posts','follows','likes','bookmarks','replies','messages','notifications')",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(tables, 8);
    }
}
