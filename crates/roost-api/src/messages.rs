use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use roost_types::api::{CreatedResponse, SendMessageRequest};

use crate::convert::message_view;
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::users::resolve_user;
use crate::{AppState, blocking};

pub async fn send_message(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(me): Extension<CurrentUser>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.text.trim().is_empty() {
        return Err(ApiError::bad_request("message must not be empty"));
    }

    let id = blocking(&state, move |s| {
        let receiver = resolve_user(s, &username)?;
        Ok(s.send_message(me.id, receiver.id, &req.text)?)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// Both directions of the conversation with `username`, oldest first.
pub async fn conversation(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(me): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = blocking(&state, move |s| {
        let other = resolve_user(s, &username)?;
        Ok(s.messages_between(me.id, other.id)?)
    })
    .await?;

    let messages: Vec<_> = rows.into_iter().map(message_view).collect();
    Ok(Json(messages))
}
