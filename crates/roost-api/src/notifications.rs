use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde_json::json;

use roost_db::Session;
use roost_types::models::NotificationView;

use crate::convert::notification_view;
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::{AppState, blocking};

/// Load the recipient's notifications, then mark them all seen. The
/// returned list still shows which ones were new.
pub(crate) fn view_notifications(
    s: &Session<'_>,
    user_id: i64,
) -> Result<Vec<NotificationView>, ApiError> {
    let rows = s.notifications(user_id)?;
    s.mark_notifications_seen(user_id)?;
    Ok(rows.into_iter().map(notification_view).collect())
}

pub async fn list(
    State(state): State<AppState>,
    Extension(me): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let notifications = blocking(&state, move |s| view_notifications(s, me.id)).await?;
    Ok(Json(notifications))
}

pub async fn unseen(
    State(state): State<AppState>,
    Extension(me): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let count = blocking(&state, move |s| Ok(s.unseen_count(me.id)?)).await?;
    Ok(Json(json!({ "unseen": count })))
}
