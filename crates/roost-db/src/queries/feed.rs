use anyhow::Result;
use rusqlite::named_params;

use crate::models::{PostRow, UserReplyRow};
use crate::queries::{POST_SELECT, map_post};
use crate::{LIST_LIMIT, Session};

impl Session<'_> {
    /// Posts by `user_id` and everyone they follow, newest first.
    pub fn feed(&self, user_id: i64, limit: u32) -> Result<Vec<PostRow>> {
        let sql = format!(
            "{POST_SELECT}
             WHERE p.user_id = :viewer
                OR p.user_id IN (SELECT followed_id FROM follows WHERE follower_id = :viewer)
             ORDER BY p.created_at DESC, p.id DESC
             LIMIT :limit"
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt
            .query_map(named_params! { ":viewer": user_id, ":limit": limit }, map_post)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Posts `user_id` liked, most recently liked first (profile LIKES tab).
    pub fn liked_posts(&self, user_id: i64, viewer: Option<i64>) -> Result<Vec<PostRow>> {
        let sql = format!(
            "{POST_SELECT}
             JOIN likes lk ON lk.post_id = p.id
             WHERE lk.user_id = :user
             ORDER BY lk.created_at DESC, lk.rowid DESC
             LIMIT :limit"
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt
            .query_map(
                named_params! { ":viewer": viewer, ":user": user_id, ":limit": LIST_LIMIT },
                map_post,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Posts `user_id` bookmarked, most recently saved first.
    pub fn bookmarked_posts(&self, user_id: i64) -> Result<Vec<PostRow>> {
        let sql = format!(
            "{POST_SELECT}
             JOIN bookmarks bm ON bm.post_id = p.id
             WHERE bm.user_id = :viewer
             ORDER BY bm.created_at DESC, bm.rowid DESC
             LIMIT :limit"
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt
            .query_map(named_params! { ":viewer": user_id, ":limit": LIST_LIMIT }, map_post)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Replies written by `user_id`, each with the post it answers
    /// (profile REPLIES tab).
    pub fn replies_for_user(&self, user_id: i64) -> Result<Vec<UserReplyRow>> {
        let mut stmt = self.conn().prepare(
            "SELECT r.id, r.text, r.created_at,
                    p.id, p.text, p.image_path, p.created_at,
                    u.username, u.display_name, u.profile_pic_path
             FROM replies r
             JOIN posts p ON r.post_id = p.id
             JOIN users u ON p.user_id = u.id
             WHERE r.user_id = ?1
             ORDER BY r.created_at DESC, r.id DESC
             LIMIT ?2",
        )?;

        let rows = stmt
            .query_map(rusqlite::params![user_id, LIST_LIMIT], |row| {
                Ok(UserReplyRow {
                    reply_id: row.get(0)?,
                    reply_text: row.get(1)?,
                    reply_created_at: row.get(2)?,
                    orig_post_id: row.get(3)?,
                    orig_text: row.get(4)?,
                    orig_image_path: row.get(5)?,
                    orig_created_at: row.get(6)?,
                    orig_username: row.get(7)?,
                    orig_display_name: row.get(8)?,
                    orig_profile_pic_path: row.get(9)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }
}
