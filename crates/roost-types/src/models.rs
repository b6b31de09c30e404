use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Public view of an account. Never carries password or wallet secrets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub bio: String,
    pub profile_pic_path: Option<String>,
    pub wallet_address: String,
    pub created_at: DateTime<Utc>,
}

/// Compact user row used by lists (followers, following, search, chat picker).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub bio: String,
    pub profile_pic_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutualFollower {
    pub username: String,
    pub profile_pic_path: Option<String>,
}

/// A post joined with its author's display identity and engagement counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostView {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub display_name: String,
    pub profile_pic_path: Option<String>,
    pub text: String,
    pub image_path: Option<String>,
    pub orig_post_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub like_count: i64,
    pub reply_count: i64,
    pub liked_by_me: bool,
    pub bookmarked_by_me: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyView {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub username: String,
    pub display_name: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// A reply written by a user, shown together with the post it answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserReplyView {
    pub reply_id: i64,
    pub reply_text: String,
    pub reply_created_at: DateTime<Utc>,
    pub orig_post_id: i64,
    pub orig_text: String,
    pub orig_image_path: Option<String>,
    pub orig_created_at: DateTime<Utc>,
    pub orig_username: String,
    pub orig_display_name: String,
    pub orig_profile_pic_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageView {
    pub id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub sender_username: String,
    pub receiver_username: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationView {
    pub id: i64,
    pub text: String,
    pub seen: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletSummary {
    pub address: String,
    /// Balance in SUI.
    pub balance: f64,
    /// USD price per SUI.
    pub price: f64,
    pub price_change_pct: f64,
    pub holdings_value: f64,
}
