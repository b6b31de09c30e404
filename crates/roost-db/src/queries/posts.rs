use anyhow::Result;
use rusqlite::{OptionalExtension, named_params};

use crate::models::{PostRow, ReplyRow};
use crate::queries::{POST_SELECT, map_post};
use crate::{SEARCH_POSTS_LIMIT, Session, now_ts};

impl Session<'_> {
    /// Posts are never edited or deleted once written.
    pub fn create_post(
        &self,
        user_id: i64,
        text: &str,
        image_path: Option<&str>,
        orig_post_id: Option<i64>,
    ) -> Result<i64> {
        self.conn().execute(
            "INSERT INTO posts (user_id, text, image_path, created_at, orig_post_id) VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![user_id, text, image_path, now_ts(), orig_post_id],
        )?;
        Ok(self.conn().last_insert_rowid())
    }

    pub fn get_post(&self, post_id: i64, viewer: Option<i64>) -> Result<Option<PostRow>> {
        let sql = format!("{POST_SELECT} WHERE p.id = :post");
        let row = self
            .conn()
            .query_row(&sql, named_params! { ":viewer": viewer, ":post": post_id }, map_post)
            .optional()?;
        Ok(row)
    }

    /// A user's own posts, newest first (profile POSTS tab).
    pub fn posts_for_user(&self, user_id: i64, viewer: Option<i64>, limit: u32) -> Result<Vec<PostRow>> {
        let sql = format!(
            "{POST_SELECT} WHERE p.user_id = :user ORDER BY p.created_at DESC, p.id DESC LIMIT :limit"
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt
            .query_map(
                named_params! { ":viewer": viewer, ":user": user_id, ":limit": limit },
                map_post,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Everyone's posts, newest first (explore).
    pub fn recent_posts(&self, viewer: Option<i64>, limit: u32) -> Result<Vec<PostRow>> {
        let sql = format!("{POST_SELECT} ORDER BY p.created_at DESC, p.id DESC LIMIT :limit");
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt
            .query_map(named_params! { ":viewer": viewer, ":limit": limit }, map_post)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn search_posts(&self, term: &str, viewer: Option<i64>) -> Result<Vec<PostRow>> {
        let pattern = format!("%{}%", term);
        let sql = format!(
            "{POST_SELECT} WHERE p.text LIKE :pattern ORDER BY p.created_at DESC, p.id DESC LIMIT :limit"
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt
            .query_map(
                named_params! { ":viewer": viewer, ":pattern": pattern, ":limit": SEARCH_POSTS_LIMIT },
                map_post,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn like_count(&self, post_id: i64) -> Result<i64> {
        Ok(self.conn().query_row(
            "SELECT COUNT(*) FROM likes WHERE post_id = ?1",
            [post_id],
            |row| row.get(0),
        )?)
    }

    /// Flat thread under a post, oldest first.
    pub fn replies_for_post(&self, post_id: i64) -> Result<Vec<ReplyRow>> {
        let mut stmt = self.conn().prepare(
            "SELECT r.id, r.post_id, r.user_id, u.username, u.display_name, r.text, r.created_at
             FROM replies r
             JOIN users u ON r.user_id = u.id
             WHERE r.post_id = ?1
             ORDER BY r.created_at, r.id",
        )?;

        let rows = stmt
            .query_map([post_id], |row| {
                Ok(ReplyRow {
                    id: row.get(0)?,
                    post_id: row.get(1)?,
                    user_id: row.get(2)?,
                    username: row.get(3)?,
                    display_name: row.get(4)?,
                    text: row.get(5)?,
                    created_at: row.get(6)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use crate::queries::fixtures;

    #[test]
    fn post_view_carries_author_and_viewer_flags() {
        let db = fixtures::db();
        let s = db.session().unwrap();
        let alice = fixtures::user(&s, "alice");
        let bob = fixtures::user(&s, "bob");
        let post = s
            .create_post(bob, "gm", Some("uploads/posts/1_gm.png"), None)
            .unwrap();

        s.like(alice, post).unwrap();
        s.bookmark(alice, post).unwrap();
        s.reply(alice, post, "gm!").unwrap();

        let as_alice = s.get_post(post, Some(alice)).unwrap().unwrap();
        assert_eq!(as_alice.username, "bob");
        assert_eq!(as_alice.display_name, "BOB");
        assert_eq!(as_alice.image_path.as_deref(), Some("uploads/posts/1_gm.png"));
        assert_eq!(as_alice.like_count, 1);
        assert_eq!(as_alice.reply_count, 1);
        assert!(as_alice.liked_by_me && as_alice.bookmarked_by_me);

        let anonymous = s.get_post(post, None).unwrap().unwrap();
        assert!(!anonymous.liked_by_me && !anonymous.bookmarked_by_me);

        assert!(s.get_post(post + 1, None).unwrap().is_none());
    }

    #[test]
    fn profile_posts_are_newest_first_and_capped() {
        let db = fixtures::db();
        let s = db.session().unwrap();
        let bob = fixtures::user(&s, "bob");
        let ids: Vec<i64> = (0..5)
            .map(|i| s.create_post(bob, &format!("post {i}"), None, None).unwrap())
            .collect();

        let posts = s.posts_for_user(bob, None, 3).unwrap();
        let got: Vec<i64> = posts.iter().map(|p| p.id).collect();
        assert_eq!(got, vec![ids[4], ids[3], ids[2]]);
    }

    #[test]
    fn search_and_explore_cover_all_authors() {
        let db = fixtures::db();
        let s = db.session().unwrap();
        let alice = fixtures::user(&s, "alice");
        let bob = fixtures::user(&s, "bob");
        s.create_post(alice, "rust is fun", None, None).unwrap();
        s.create_post(bob, "coffee", None, None).unwrap();
        s.create_post(bob, "more Rust", None, None).unwrap();

        let hits: Vec<String> = s
            .search_posts("rust", None)
            .unwrap()
            .into_iter()
            .map(|p| p.text)
            .collect();
        assert_eq!(hits, vec!["more Rust", "rust is fun"]);

        assert_eq!(s.recent_posts(None, 100).unwrap().len(), 3);
    }

    #[test]
    fn replies_are_flat_and_oldest_first() {
        let db = fixtures::db();
        let s = db.session().unwrap();
        let alice = fixtures::user(&s, "alice");
        let bob = fixtures::user(&s, "bob");
        let post = s.create_post(bob, "question?", None, None).unwrap();

        s.reply(alice, post, "first").unwrap();
        s.reply(bob, post, "second").unwrap();

        let replies = s.replies_for_post(post).unwrap();
        let texts: Vec<&str> = replies.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
        assert_eq!(replies[0].username, "alice");
    }
}
