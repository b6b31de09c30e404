use anyhow::Result;

use crate::models::MessageRow;
use crate::queries::notifications::{NotificationKind, dispatch};
use crate::{LIST_LIMIT, Session, now_ts};

impl Session<'_> {
    /// Store a direct message and notify the receiver.
    pub fn send_message(&self, sender_id: i64, receiver_id: i64, text: &str) -> Result<i64> {
        self.conn().execute(
            "INSERT INTO messages (sender_id, receiver_id, text, created_at) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![sender_id, receiver_id, text, now_ts()],
        )?;
        let id = self.conn().last_insert_rowid();

        dispatch(self.conn(), receiver_id, sender_id, NotificationKind::Message)?;
        Ok(id)
    }

    /// Conversation between two users in both directions, oldest first.
    pub fn messages_between(&self, a: i64, b: i64) -> Result<Vec<MessageRow>> {
        let mut stmt = self.conn().prepare(
            "SELECT * FROM (
                SELECT m.id, m.sender_id, m.receiver_id, su.username, ru.username, m.text, m.created_at
                FROM messages m
                JOIN users su ON m.sender_id = su.id
                JOIN users ru ON m.receiver_id = ru.id
                WHERE (m.sender_id = ?1 AND m.receiver_id = ?2)
                   OR (m.sender_id = ?2 AND m.receiver_id = ?1)
                ORDER BY m.created_at DESC, m.id DESC
                LIMIT ?3
             ) ORDER BY 7, 1",
        )?;

        let rows = stmt
            .query_map(rusqlite::params![a, b, LIST_LIMIT], |row| {
                Ok(MessageRow {
                    id: row.get(0)?,
                    sender_id: row.get(1)?,
                    receiver_id: row.get(2)?,
                    sender_username: row.get(3)?,
                    receiver_username: row.get(4)?,
                    text: row.get(5)?,
                    created_at: row.get(6)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }
}
