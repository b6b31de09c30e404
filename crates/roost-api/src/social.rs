use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::info;

use roost_types::api::ToggleResponse;

use crate::convert::user_summaries;
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::users::resolve_user;
use crate::{AppState, blocking};

pub async fn follow(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(me): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let changed = blocking(&state, move |s| {
        let target = resolve_user(s, &username)?;
        if target.id == me.id {
            return Err(ApiError::bad_request("you cannot follow yourself"));
        }
        let changed = s.follow(me.id, target.id)?;
        if changed {
            info!("@{} followed @{}", me.username, target.username);
        }
        Ok(changed)
    })
    .await?;
    Ok(Json(ToggleResponse { changed }))
}

pub async fn unfollow(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(me): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let changed = blocking(&state, move |s| {
        let target = resolve_user(s, &username)?;
        Ok(s.unfollow(me.id, target.id)?)
    })
    .await?;
    Ok(Json(ToggleResponse { changed }))
}

pub async fn followers(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(_me): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let users = blocking(&state, move |s| {
        let target = resolve_user(s, &username)?;
        Ok(s.followers(target.id)?)
    })
    .await?;
    Ok(Json(user_summaries(users)))
}

pub async fn following(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(_me): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let users = blocking(&state, move |s| {
        let target = resolve_user(s, &username)?;
        Ok(s.following(target.id)?)
    })
    .await?;
    Ok(Json(user_summaries(users)))
}
