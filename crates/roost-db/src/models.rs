/// Database row types. These map directly to SQLite rows.
/// Distinct from roost-types API models to keep the DB layer independent.
/// Timestamps are seconds since the epoch.

pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub password_hash: String,
    pub bio: String,
    pub profile_pic_path: Option<String>,
    pub created_at: f64,
    pub wallet_address: String,
}

/// Custodial key material. Loaded only by the wallet paths, never with `UserRow`.
pub struct WalletSecretsRow {
    pub wallet_address: String,
    pub private_key: String,
    pub mnemonic: String,
}

pub struct NewUser<'a> {
    pub username: &'a str,
    pub display_name: &'a str,
    pub password_hash: &'a str,
    pub bio: &'a str,
    pub profile_pic_path: Option<&'a str>,
    pub wallet_address: &'a str,
    pub private_key: &'a str,
    pub mnemonic: &'a str,
}

pub struct UserSummaryRow {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub bio: String,
    pub profile_pic_path: Option<String>,
}

pub struct MutualFollowerRow {
    pub username: String,
    pub profile_pic_path: Option<String>,
}

/// A post joined with its author, counters, and the viewer's own flags.
pub struct PostRow {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub display_name: String,
    pub profile_pic_path: Option<String>,
    pub text: String,
    pub image_path: Option<String>,
    pub orig_post_id: Option<i64>,
    pub created_at: f64,
    pub like_count: i64,
    pub reply_count: i64,
    pub liked_by_me: bool,
    pub bookmarked_by_me: bool,
}

pub struct ReplyRow {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub username: String,
    pub display_name: String,
    pub text: String,
    pub created_at: f64,
}

pub struct UserReplyRow {
    pub reply_id: i64,
    pub reply_text: String,
    pub reply_created_at: f64,
    pub orig_post_id: i64,
    pub orig_text: String,
    pub orig_image_path: Option<String>,
    pub orig_created_at: f64,
    pub orig_username: String,
    pub orig_display_name: String,
    pub orig_profile_pic_path: Option<String>,
}

pub struct MessageRow {
    pub id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub sender_username: String,
    pub receiver_username: String,
    pub text: String,
    pub created_at: f64,
}

pub struct NotificationRow {
    pub id: i64,
    pub user_id: i64,
    pub text: String,
    pub seen: bool,
    pub created_at: f64,
}
