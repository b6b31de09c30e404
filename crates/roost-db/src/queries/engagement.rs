use anyhow::Result;
use rusqlite::OptionalExtension;

use crate::queries::notifications::{NotificationKind, dispatch};
use crate::{Session, is_unique_violation, now_ts};

impl Session<'_> {
    /// Like a post. Returns false when the like already exists. The post
    /// owner is notified on success.
    pub fn like(&self, user_id: i64, post_id: i64) -> Result<bool> {
        if !self.insert_pair("likes", user_id, post_id)? {
            return Ok(false);
        }
        if let Some(owner) = self.post_owner(post_id)? {
            dispatch(self.conn(), owner, user_id, NotificationKind::Liked)?;
        }
        Ok(true)
    }

    pub fn unlike(&self, user_id: i64, post_id: i64) -> Result<bool> {
        self.delete_pair("likes", user_id, post_id)
    }

    /// Same contract as `like`, without a notification.
    pub fn bookmark(&self, user_id: i64, post_id: i64) -> Result<bool> {
        self.insert_pair("bookmarks", user_id, post_id)
    }

    pub fn unbookmark(&self, user_id: i64, post_id: i64) -> Result<bool> {
        self.delete_pair("bookmarks", user_id, post_id)
    }

    /// Add a flat reply and notify the post owner.
    pub fn reply(&self, user_id: i64, post_id: i64, text: &str) -> Result<i64> {
        self.conn().execute(
            "INSERT INTO replies (post_id, user_id, text, created_at) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![post_id, user_id, text, now_ts()],
        )?;
        let reply_id = self.conn().last_insert_rowid();

        if let Some(owner) = self.post_owner(post_id)? {
            dispatch(self.conn(), owner, user_id, NotificationKind::Replied)?;
        }
        Ok(reply_id)
    }

    fn post_owner(&self, post_id: i64) -> Result<Option<i64>> {
        Ok(self
            .conn()
            .query_row("SELECT user_id FROM posts WHERE id = ?1", [post_id], |row| {
                row.get(0)
            })
            .optional()?)
    }

    fn insert_pair(&self, table: &str, user_id: i64, post_id: i64) -> Result<bool> {
        let sql = format!("INSERT INTO {table} (user_id, post_id, created_at) VALUES (?1, ?2, ?3)");
        match self
            .conn()
            .execute(&sql, rusqlite::params![user_id, post_id, now_ts()])
        {
            Ok(_) => Ok(true),
            Err(e) if is_unique_violation(&e) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn delete_pair(&self, table: &str, user_id: i64, post_id: i64) -> Result<bool> {
        let sql = format!("DELETE FROM {table} WHERE user_id = ?1 AND post_id = ?2");
        Ok(self.conn().execute(&sql, [user_id, post_id])? > 0)
    }
}
