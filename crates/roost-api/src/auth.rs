use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::info;

use roost_crypto::seal_secret;
use roost_db::models::NewUser;
use roost_types::api::{Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

use crate::error::ApiError;
use crate::middleware::SESSION_COOKIE;
use crate::{AppState, blocking, offload};

const MAX_DISPLAY_NAME: usize = 50;
pub(crate) const MAX_BIO: usize = 160;

pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_username(&req.username)?;
    if req.password.len() < 8 {
        return Err(ApiError::bad_request("password must be at least 8 characters"));
    }
    let bio = req.bio.unwrap_or_default();
    validate_profile(&req.display_name, &bio)?;

    // Check first so a taken name never provisions a wallet
    let username = req.username.clone();
    if blocking(&state, move |s| Ok(s.username_exists(&username)?)).await? {
        return Err(ApiError::Conflict(format!("username already taken: {}", req.username)));
    }

    // Seed derivation and Argon2 both stay off the async workers and
    // outside the database lock
    let wallets = state.wallet.clone();
    let password = req.password.clone();
    let (wallet, password_hash) = offload(move || {
        let wallet = wallets.generate()?;
        let password_hash = hash_password(&password)?;
        Ok((wallet, password_hash))
    })
    .await?;
    let private_key = seal_secret(&state.sealing_key, &wallet.private_key)?;
    let mnemonic = seal_secret(&state.sealing_key, &wallet.mnemonic)?;

    let username = req.username.clone();
    let user_id = blocking(&state, move |s| {
        Ok(s.create_user(&NewUser {
            username: &req.username,
            display_name: req.display_name.trim(),
            password_hash: &password_hash,
            bio: &bio,
            profile_pic_path: req.profile_pic_path.as_deref(),
            wallet_address: &wallet.address,
            private_key: &private_key,
            mnemonic: &mnemonic,
        })?)
    })
    .await?;

    info!("Registered @{} (id {})", username, user_id);

    let token = create_token(&state.jwt_secret, state.session_days, user_id, &username)?;
    Ok((
        StatusCode::CREATED,
        jar.add(session_cookie(token.clone(), state.session_days)),
        Json(RegisterResponse { user_id, token }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = req.username.clone();
    let user = blocking(&state, move |s| Ok(s.get_user_by_username(&username)?))
        .await?
        .ok_or(ApiError::Unauthorized)?;
    let user = offload(move || {
        Ok(verify_password(&req.password, &user.password_hash).then_some(user))
    })
    .await?
    .ok_or(ApiError::Unauthorized)?;

    let token = create_token(&state.jwt_secret, state.session_days, user.id, &user.username)?;
    Ok((
        jar.add(session_cookie(token.clone(), state.session_days)),
        Json(LoginResponse {
            user_id: user.id,
            username: user.username,
            token,
        }),
    ))
}

pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
    )
}

pub(crate) fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?;
    Ok(hash.to_string())
}

pub(crate) fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

fn create_token(secret: &str, days: i64, user_id: i64, username: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(days)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

fn session_cookie(token: String, days: i64) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .path("/")
        .max_age(time::Duration::days(days))
        .same_site(SameSite::Lax)
        .build()
}

fn validate_username(username: &str) -> Result<(), ApiError> {
    let valid_chars = username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !(3..=32).contains(&username.len()) || !valid_chars {
        return Err(ApiError::bad_request(
            "username must be 3-32 letters, digits or underscores",
        ));
    }
    Ok(())
}

pub(crate) fn validate_profile(display_name: &str, bio: &str) -> Result<(), ApiError> {
    let name = display_name.trim();
    if name.is_empty() || name.chars().count() > MAX_DISPLAY_NAME {
        return Err(ApiError::bad_request("display name must be 1-50 characters"));
    }
    if bio.chars().count() > MAX_BIO {
        return Err(ApiError::bad_request("bio must be at most 160 characters"));
    }
    Ok(())
}
