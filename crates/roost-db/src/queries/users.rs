use anyhow::Result;
use rusqlite::{OptionalExtension, Row, named_params};
use tracing::info;

use crate::models::{NewUser, UserRow, UserSummaryRow, WalletSecretsRow};
use crate::queries::{USER_SUMMARY_SELECT, map_user_summary};
use crate::{DuplicateUsername, SEARCH_USERS_LIMIT, Session, is_unique_violation, now_ts};

const USER_SELECT: &str = "SELECT id, username, display_name, password_hash, bio, profile_pic_path, created_at, wallet_address FROM users";

impl Session<'_> {
    /// Insert a new account. A taken username yields `DuplicateUsername`
    /// and leaves the table untouched.
    pub fn create_user(&self, user: &NewUser<'_>) -> Result<i64> {
        let inserted = self.conn().execute(
            "INSERT INTO users (username, display_name, password_hash, bio, profile_pic_path,
                                created_at, wallet_address, private_key, mnemonic)
             VALUES (:username, :display_name, :password_hash, :bio, :pic, :created_at,
                     :address, :private_key, :mnemonic)",
            named_params! {
                ":username": user.username,
                ":display_name": user.display_name,
                ":password_hash": user.password_hash,
                ":bio": user.bio,
                ":pic": user.profile_pic_path,
                ":created_at": now_ts(),
                ":address": user.wallet_address,
                ":private_key": user.private_key,
                ":mnemonic": user.mnemonic,
            },
        );

        match inserted {
            Ok(_) => {
                let id = self.conn().last_insert_rowid();
                info!("Created user {} (id {})", user.username, id);
                Ok(id)
            }
            Err(e) if is_unique_violation(&e) => {
                Err(DuplicateUsername(user.username.to_string()).into())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn username_exists(&self, username: &str) -> Result<bool> {
        let found = self
            .conn()
            .query_row("SELECT 1 FROM users WHERE username = ?1", [username], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        let sql = format!("{USER_SELECT} WHERE id = ?1");
        Ok(self.conn().query_row(&sql, [id], map_user).optional()?)
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        let sql = format!("{USER_SELECT} WHERE username = ?1");
        Ok(self.conn().query_row(&sql, [username], map_user).optional()?)
    }

    /// Replace display name and bio. The profile picture only changes when
    /// a new one is given. Returns the updated row.
    pub fn update_user_details(
        &self,
        id: i64,
        display_name: &str,
        bio: &str,
        new_pic_path: Option<&str>,
    ) -> Result<Option<UserRow>> {
        match new_pic_path {
            Some(pic) => self.conn().execute(
                "UPDATE users SET display_name = ?1, bio = ?2, profile_pic_path = ?3 WHERE id = ?4",
                rusqlite::params![display_name, bio, pic, id],
            )?,
            None => self.conn().execute(
                "UPDATE users SET display_name = ?1, bio = ?2 WHERE id = ?3",
                rusqlite::params![display_name, bio, id],
            )?,
        };
        self.get_user_by_id(id)
    }

    pub fn wallet_secrets(&self, id: i64) -> Result<Option<WalletSecretsRow>> {
        let row = self
            .conn()
            .query_row(
                "SELECT wallet_address, private_key, mnemonic FROM users WHERE id = ?1",
                [id],
                |row| {
                    Ok(WalletSecretsRow {
                        wallet_address: row.get(0)?,
                        private_key: row.get(1)?,
                        mnemonic: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    /// Substring match on username or display name.
    pub fn search_users(&self, term: &str) -> Result<Vec<UserSummaryRow>> {
        let pattern = format!("%{}%", term);
        let sql = format!(
            "{USER_SUMMARY_SELECT} WHERE u.username LIKE ?1 OR u.display_name LIKE ?1 ORDER BY u.username LIMIT ?2"
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt
            .query_map(rusqlite::params![pattern, SEARCH_USERS_LIMIT], map_user_summary)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Everyone except `user_id`, for picking a conversation.
    pub fn chat_partners(&self, user_id: i64) -> Result<Vec<UserSummaryRow>> {
        let sql = format!("{USER_SUMMARY_SELECT} WHERE u.id != ?1 ORDER BY u.username");
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt
            .query_map([user_id], map_user_summary)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        display_name: row.get(2)?,
        password_hash: row.get(3)?,
        bio: row.get(4)?,
        profile_pic_path: row.get(5)?,
        created_at: row.get(6)?,
        wallet_address: row.get(7)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::fixtures;

    #[test]
    fn duplicate_username_is_rejected_without_a_second_row() {
        let db = fixtures::db();
        let s = db.session().unwrap();
        fixtures::user(&s, "alice");

        let err = s
            .create_user(&NewUser {
                username: "alice",
                display_name: "Another Alice",
                password_hash: "hash",
                bio: "",
                profile_pic_path: None,
                wallet_address: "0xsecond",
                private_key: "key2",
                mnemonic: "words2",
            })
            .unwrap_err();
        assert!(err.downcast_ref::<DuplicateUsername>().is_some());

        let count: i64 = s
            .conn()
            .query_row("SELECT COUNT(*) FROM users WHERE username = 'alice'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
        let wallets: i64 = s
            .conn()
            .query_row("SELECT COUNT(*) FROM users WHERE wallet_address = '0xsecond'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(wallets, 0);
    }

    #[test]
    fn update_keeps_picture_unless_replaced() {
        let db = fixtures::db();
        let s = db.session().unwrap();
        let id = fixtures::user(&s, "bob");

        s.update_user_details(id, "Bobby", "hello", Some("uploads/profile_pics/1_b.png"))
            .unwrap();
        let user = s.update_user_details(id, "Robert", "bio", None).unwrap().unwrap();

        assert_eq!(user.display_name, "Robert");
        assert_eq!(user.bio, "bio");
        assert_eq!(user.profile_pic_path.as_deref(), Some("uploads/profile_pics/1_b.png"));
    }

    #[test]
    fn search_matches_username_and_display_name() {
        let db = fixtures::db();
        let s = db.session().unwrap();
        fixtures::user(&s, "alice");
        let bob = fixtures::user(&s, "bob");
        s.update_user_details(bob, "Alicia's friend", "", None).unwrap();
        fixtures::user(&s, "carol");

        let names: Vec<String> = s
            .search_users("ali")
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, vec!["alice", "bob"]);
    }

    #[test]
    fn chat_partners_excludes_self() {
        let db = fixtures::db();
        let s = db.session().unwrap();
        let alice = fixtures::user(&s, "alice");
        fixtures::user(&s, "bob");

        let partners = s.chat_partners(alice).unwrap();
        assert_eq!(partners.len(), 1);
        assert_eq!(partners[0].username, "bob");
    }

    #[test]
    fn secrets_are_loaded_separately() {
        let db = fixtures::db();
        let s = db.session().unwrap();
        let id = fixtures::user(&s, "dave");

        let secrets = s.wallet_secrets(id).unwrap().unwrap();
        assert_eq!(secrets.private_key, "key");
        assert_eq!(secrets.mnemonic, "words");
        assert!(s.wallet_secrets(id + 100).unwrap().is_none());
    }
}
