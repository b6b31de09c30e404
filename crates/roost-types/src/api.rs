use serde::{Deserialize, Serialize};

// -- Auth --

/// Session claims. `sub` is the numeric user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub username: String,
    pub exp: usize,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub display_name: String,
    pub password: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub profile_pic_path: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: i64,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: i64,
    pub username: String,
    pub token: String,
}

// -- Profile --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub display_name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub profile_pic_path: Option<String>,
}

// -- Posts --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePostRequest {
    pub text: String,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub orig_post_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplyRequest {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub id: i64,
}

/// Result of an idempotent insert or a delete: `changed` is false when the
/// row already existed (insert) or was absent (delete).
#[derive(Debug, Serialize, Deserialize)]
pub struct ToggleResponse {
    pub changed: bool,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

// -- Messages --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    pub text: String,
}

// -- Wallet --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransferRequest {
    pub destination: String,
    pub amount: f64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TipRequest {
    pub amount: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransferResponse {
    pub digest: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RevealKeysRequest {
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WalletKeysResponse {
    pub address: String,
    pub private_key: String,
    pub mnemonic: String,
}

// -- Uploads --

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub filename: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Filesystem path stored in rows that reference the image.
    pub path: String,
    /// Where the image is served.
    pub url: String,
    pub size: u64,
}
