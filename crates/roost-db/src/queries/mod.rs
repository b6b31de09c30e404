pub mod engagement;
pub mod feed;
pub mod graph;
pub mod messages;
pub mod notifications;
pub mod posts;
pub mod users;

use rusqlite::Row;

use crate::models::{PostRow, UserSummaryRow};

/// Post columns shared by every post list. Expects a `:viewer` parameter
/// (NULL for anonymous) and aliases `p` for posts and `u` for the author.
pub(crate) const POST_SELECT: &str = "
    SELECT p.id, p.user_id, u.username, u.display_name, u.profile_pic_path,
           p.text, p.image_path, p.orig_post_id, p.created_at,
           (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id),
           (SELECT COUNT(*) FROM replies r WHERE r.post_id = p.id),
           EXISTS(SELECT 1 FROM likes l WHERE l.post_id = p.id AND l.user_id = :viewer),
           EXISTS(SELECT 1 FROM bookmarks b WHERE b.post_id = p.id AND b.user_id = :viewer)
    FROM posts p
    JOIN users u ON p.user_id = u.id";

pub(crate) fn map_post(row: &Row<'_>) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        username: row.get(2)?,
        display_name: row.get(3)?,
        profile_pic_path: row.get(4)?,
        text: row.get(5)?,
        image_path: row.get(6)?,
        orig_post_id: row.get(7)?,
        created_at: row.get(8)?,
        like_count: row.get(9)?,
        reply_count: row.get(10)?,
        liked_by_me: row.get(11)?,
        bookmarked_by_me: row.get(12)?,
    })
}

pub(crate) const USER_SUMMARY_SELECT: &str =
    "SELECT u.id, u.username, u.display_name, u.bio, u.profile_pic_path FROM users u";

pub(crate) fn map_user_summary(row: &Row<'_>) -> rusqlite::Result<UserSummaryRow> {
    Ok(UserSummaryRow {
        id: row.get(0)?,
        username: row.get(1)?,
        display_name: row.get(2)?,
        bio: row.get(3)?,
        profile_pic_path: row.get(4)?,
    })
}
