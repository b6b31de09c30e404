use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};

use roost_db::Session;
use roost_db::models::UserRow;
use roost_types::api::{SearchQuery, UpdateProfileRequest};

use crate::auth::validate_profile;
use crate::convert::{user_profile, user_summaries};
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::{AppState, blocking};

pub(crate) fn resolve_user(s: &Session<'_>, username: &str) -> Result<UserRow, ApiError> {
    s.get_user_by_username(username)?
        .ok_or(ApiError::NotFound("user"))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(me): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let user = blocking(&state, move |s| {
        s.get_user_by_id(me.id)?.ok_or(ApiError::NotFound("user"))
    })
    .await?;
    Ok(Json(user_profile(user)))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(_me): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let user = blocking(&state, move |s| resolve_user(s, &username)).await?;
    Ok(Json(user_profile(user)))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(me): Extension<CurrentUser>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_profile(&req.display_name, &req.bio)?;

    let user = blocking(&state, move |s| {
        s.update_user_details(
            me.id,
            req.display_name.trim(),
            &req.bio,
            req.profile_pic_path.as_deref(),
        )?
        .ok_or(ApiError::NotFound("user"))
    })
    .await?;
    Ok(Json(user_profile(user)))
}

pub async fn search_users(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
    Extension(_me): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let term = query.q.trim().to_string();
    let users = if term.is_empty() {
        vec![]
    } else {
        blocking(&state, move |s| Ok(s.search_users(&term)?)).await?
    };
    Ok(Json(user_summaries(users)))
}
