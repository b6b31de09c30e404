use anyhow::{Result, anyhow};
use rusqlite::Connection;
use tracing::debug;

use crate::models::NotificationRow;
use crate::{LIST_LIMIT, Session, now_ts};

/// The actions that notify another user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Followed,
    Liked,
    Replied,
    Message,
    Tip,
}

impl NotificationKind {
    pub fn text(self, actor_username: &str) -> String {
        match self {
            Self::Followed => format!("@{} followed you", actor_username),
            Self::Liked => format!("@{} liked your post", actor_username),
            Self::Replied => format!("@{} replied to your post", actor_username),
            Self::Message => format!("New message from @{}", actor_username),
            Self::Tip => format!("Tip from @{}", actor_username),
        }
    }
}

/// Resolve the actor's username and insert one unseen notification for
/// `recipient`. Runs inline in the triggering write; no dedup.
pub(crate) fn dispatch(
    conn: &Connection,
    recipient: i64,
    actor: i64,
    kind: NotificationKind,
) -> Result<()> {
    let username: String = conn
        .query_row("SELECT username FROM users WHERE id = ?1", [actor], |row| {
            row.get(0)
        })
        .map_err(|_| anyhow!("User not found: {}", actor))?;

    conn.execute(
        "INSERT INTO notifications (user_id, text, seen, created_at) VALUES (?1, ?2, 0, ?3)",
        rusqlite::params![recipient, kind.text(&username), now_ts()],
    )?;

    debug!("Notified user {} ({:?} by {})", recipient, kind, actor);
    Ok(())
}

impl Session<'_> {
    /// Notify for actions completed outside the database (e.g. a tip that
    /// settled on chain).
    pub fn notify(&self, recipient: i64, actor: i64, kind: NotificationKind) -> Result<()> {
        dispatch(self.conn(), recipient, actor, kind)
    }

    /// Newest first.
    pub fn notifications(&self, user_id: i64) -> Result<Vec<NotificationRow>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, user_id, text, seen, created_at FROM notifications
             WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC
             LIMIT ?2",
        )?;

        let rows = stmt
            .query_map(rusqlite::params![user_id, LIST_LIMIT], |row| {
                Ok(NotificationRow {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    text: row.get(2)?,
                    seen: row.get(3)?,
                    created_at: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    pub fn unseen_count(&self, user_id: i64) -> Result<i64> {
        Ok(self.conn().query_row(
            "SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND seen = 0",
            [user_id],
            |row| row.get(0),
        )?)
    }

    pub fn mark_notifications_seen(&self, user_id: i64) -> Result<usize> {
        Ok(self.conn().execute(
            "UPDATE notifications SET seen = 1 WHERE user_id = ?1 AND seen = 0",
            [user_id],
        )?)
    }
}
