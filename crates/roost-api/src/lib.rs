pub mod auth;
pub mod convert;
pub mod error;
pub mod messages;
pub mod middleware;
pub mod notifications;
pub mod pages;
pub mod posts;
pub mod social;
pub mod uploads;
pub mod users;
pub mod wallet;

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post, put},
};
use tower_http::services::ServeDir;
use tracing::error;

use roost_crypto::SealingKey;
use roost_db::{Database, Session};
use roost_wallet::WalletService;

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub session_days: i64,
    pub sealing_key: SealingKey,
    pub wallet: Arc<dyn WalletService>,
    pub upload_dir: PathBuf,
}

/// Run `f` against a fresh request session on the blocking pool.
pub(crate) async fn blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Session<'_>) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || {
        let session = state.db.session()?;
        f(&session)
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal(anyhow::anyhow!("blocking task failed"))
    })?
}

/// Run CPU-heavy work (password hashing, seed derivation) on the blocking
/// pool without taking the database lock.
pub(crate) async fn offload<F, T>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal(anyhow::anyhow!("blocking task failed"))
    })?
}

pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout));

    let upload_routes = Router::new()
        .route("/uploads/profile-pics", post(uploads::upload_profile_pic))
        .route("/uploads/post-images", post(uploads::upload_post_image))
        .layer(DefaultBodyLimit::max(uploads::MAX_UPLOAD_SIZE));

    let protected_routes = Router::new()
        .route("/me", get(users::me))
        .route("/me/profile", put(users::update_profile))
        .route("/users/search", get(users::search_users))
        .route("/users/{username}", get(users::get_profile))
        .route("/users/{username}/follow", post(social::follow).delete(social::unfollow))
        .route("/users/{username}/followers", get(social::followers))
        .route("/users/{username}/following", get(social::following))
        .route("/users/{username}/tip", post(wallet::tip))
        .route("/posts", post(posts::create_post))
        .route("/posts/search", get(posts::search_posts))
        .route("/posts/{post_id}", get(posts::get_post))
        .route("/posts/{post_id}/like", post(posts::like).delete(posts::unlike))
        .route("/posts/{post_id}/bookmark", post(posts::bookmark).delete(posts::unbookmark))
        .route("/posts/{post_id}/replies", post(posts::reply))
        .route("/messages/{username}", get(messages::conversation).post(messages::send_message))
        .route("/notifications", get(notifications::list))
        .route("/notifications/unseen", get(notifications::unseen))
        .route("/wallet", get(wallet::summary))
        .route("/wallet/transfer", post(wallet::transfer))
        .route("/wallet/keys", post(wallet::reveal_keys))
        .route("/pages", get(pages::home))
        .route("/pages/{*path}", get(pages::view))
        .merge(upload_routes)
        .nest_service("/media", ServeDir::new(&state.upload_dir))
        .layer(from_fn_with_state(state.clone(), middleware::require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
