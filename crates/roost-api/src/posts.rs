use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use roost_types::api::{CreatePostRequest, CreatedResponse, ReplyRequest, SearchQuery, ToggleResponse};

use crate::convert::{post_view, post_views, reply_view};
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::{AppState, blocking};

/// Posts and replies share the classic length limit.
pub const MAX_POST_CHARS: usize = 280;

pub(crate) fn validate_text(text: &str) -> Result<(), ApiError> {
    if text.trim().is_empty() {
        return Err(ApiError::bad_request("text must not be empty"));
    }
    if text.chars().count() > MAX_POST_CHARS {
        return Err(ApiError::bad_request("text must be at most 280 characters"));
    }
    Ok(())
}

pub async fn create_post(
    State(state): State<AppState>,
    Extension(me): Extension<CurrentUser>,
    Json(req): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_text(&req.text)?;

    let id = blocking(&state, move |s| {
        if let Some(orig) = req.orig_post_id {
            s.get_post(orig, None)?.ok_or(ApiError::NotFound("post"))?;
        }
        Ok(s.create_post(me.id, &req.text, req.image_path.as_deref(), req.orig_post_id)?)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// A post with its flat reply thread.
pub async fn get_post(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    Extension(me): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let (post, replies) = blocking(&state, move |s| {
        let post = s
            .get_post(post_id, Some(me.id))?
            .ok_or(ApiError::NotFound("post"))?;
        Ok((post, s.replies_for_post(post_id)?))
    })
    .await?;

    let replies: Vec<_> = replies.into_iter().map(reply_view).collect();
    Ok(Json(json!({ "post": post_view(post), "replies": replies })))
}

pub async fn search_posts(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
    Extension(me): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let term = query.q.trim().to_string();
    let posts = if term.is_empty() {
        vec![]
    } else {
        blocking(&state, move |s| Ok(s.search_posts(&term, Some(me.id))?)).await?
    };
    Ok(Json(post_views(posts)))
}

pub async fn like(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    Extension(me): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let changed = blocking(&state, move |s| {
        s.get_post(post_id, None)?.ok_or(ApiError::NotFound("post"))?;
        Ok(s.like(me.id, post_id)?)
    })
    .await?;
    Ok(Json(ToggleResponse { changed }))
}

pub async fn unlike(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    Extension(me): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let changed = blocking(&state, move |s| Ok(s.unlike(me.id, post_id)?)).await?;
    Ok(Json(ToggleResponse { changed }))
}

pub async fn bookmark(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    Extension(me): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let changed = blocking(&state, move |s| {
        s.get_post(post_id, None)?.ok_or(ApiError::NotFound("post"))?;
        Ok(s.bookmark(me.id, post_id)?)
    })
    .await?;
    Ok(Json(ToggleResponse { changed }))
}

pub async fn unbookmark(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    Extension(me): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let changed = blocking(&state, move |s| Ok(s.unbookmark(me.id, post_id)?)).await?;
    Ok(Json(ToggleResponse { changed }))
}

pub async fn reply(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    Extension(me): Extension<CurrentUser>,
    Json(req): Json<ReplyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_text(&req.text)?;

    let id = blocking(&state, move |s| {
        s.get_post(post_id, None)?.ok_or(ApiError::NotFound("post"))?;
        Ok(s.reply(me.id, post_id, &req.text)?)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_limits() {
        assert!(validate_text("hello").is_ok());
        assert!(validate_text("   ").is_err());
        assert!(validate_text(&"é".repeat(280)).is_ok());
        assert!(validate_text(&"a".repeat(281)).is_err());
    }
}
