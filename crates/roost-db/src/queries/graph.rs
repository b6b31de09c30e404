use anyhow::Result;
use rusqlite::OptionalExtension;

use crate::models::{MutualFollowerRow, UserSummaryRow};
use crate::queries::notifications::{NotificationKind, dispatch};
use crate::queries::{USER_SUMMARY_SELECT, map_user_summary};
use crate::{MUTUAL_FOLLOWERS_LIMIT, Session, is_unique_violation, now_ts};

impl Session<'_> {
    /// Add the edge follower → followed. Returns false when it already
    /// exists. Self-follow is not prevented here.
    pub fn follow(&self, follower_id: i64, followed_id: i64) -> Result<bool> {
        let inserted = self.conn().execute(
            "INSERT INTO follows (follower_id, followed_id, created_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![follower_id, followed_id, now_ts()],
        );

        match inserted {
            Ok(_) => {
                dispatch(self.conn(), followed_id, follower_id, NotificationKind::Followed)?;
                Ok(true)
            }
            Err(e) if is_unique_violation(&e) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub fn unfollow(&self, follower_id: i64, followed_id: i64) -> Result<bool> {
        let removed = self.conn().execute(
            "DELETE FROM follows WHERE follower_id = ?1 AND followed_id = ?2",
            [follower_id, followed_id],
        )?;
        Ok(removed > 0)
    }

    pub fn is_following(&self, follower_id: i64, followed_id: i64) -> Result<bool> {
        let found = self
            .conn()
            .query_row(
                "SELECT 1 FROM follows WHERE follower_id = ?1 AND followed_id = ?2",
                [follower_id, followed_id],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn follower_count(&self, user_id: i64) -> Result<i64> {
        Ok(self.conn().query_row(
            "SELECT COUNT(*) FROM follows WHERE followed_id = ?1",
            [user_id],
            |row| row.get(0),
        )?)
    }

    pub fn following_count(&self, user_id: i64) -> Result<i64> {
        Ok(self.conn().query_row(
            "SELECT COUNT(*) FROM follows WHERE follower_id = ?1",
            [user_id],
            |row| row.get(0),
        )?)
    }

    /// Users who follow `user_id`.
    pub fn followers(&self, user_id: i64) -> Result<Vec<UserSummaryRow>> {
        let sql = format!(
            "{USER_SUMMARY_SELECT} JOIN follows f ON u.id = f.follower_id
             WHERE f.followed_id = ?1 ORDER BY f.created_at DESC"
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt
            .query_map([user_id], map_user_summary)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Users `user_id` follows.
    pub fn following(&self, user_id: i64) -> Result<Vec<UserSummaryRow>> {
        let sql = format!(
            "{USER_SUMMARY_SELECT} JOIN follows f ON u.id = f.followed_id
             WHERE f.follower_id = ?1 ORDER BY f.created_at DESC"
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt
            .query_map([user_id], map_user_summary)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Users who follow `target_id` and are followed by `viewer_id`, at most three.
    pub fn common_followers(&self, viewer_id: i64, target_id: i64) -> Result<Vec<MutualFollowerRow>> {
        let mut stmt = self.conn().prepare(
            "SELECT u.username, u.profile_pic_path
             FROM users u
             JOIN follows f_target ON u.id = f_target.follower_id
             JOIN follows f_me ON u.id = f_me.followed_id
             WHERE f_target.followed_id = ?1 AND f_me.follower_id = ?2
             ORDER BY u.username
             LIMIT ?3",
        )?;

        let rows = stmt
            .query_map(
                rusqlite::params![target_id, viewer_id, MUTUAL_FOLLOWERS_LIMIT],
                |row| {
                    Ok(MutualFollowerRow {
                        username: row.get(0)?,
                        profile_pic_path: row.get(1)?,
                    })
                },
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }
}
