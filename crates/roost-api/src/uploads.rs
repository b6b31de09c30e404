use std::io;
use std::path::Path;

use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tokio::io::AsyncWriteExt;
use tracing::{error, info, warn};

use roost_types::api::{UploadQuery, UploadResponse};

use crate::AppState;
use crate::error::ApiError;
use crate::middleware::CurrentUser;

/// 10 MB upload limit for images
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

pub const PROFILE_PIC_DIR: &str = "profile_pics";
pub const POST_IMAGE_DIR: &str = "posts";

const PROFILE_PIC_TYPES: &[&str] = &["png", "jpg", "jpeg"];
const POST_IMAGE_TYPES: &[&str] = &["png", "jpg", "jpeg", "gif"];

/// POST /uploads/profile-pics?filename=, raw image bytes.
pub async fn upload_profile_pic(
    State(state): State<AppState>,
    Extension(me): Extension<CurrentUser>,
    Query(query): Query<UploadQuery>,
    bytes: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    store(&state, &me, PROFILE_PIC_DIR, PROFILE_PIC_TYPES, &query.filename, bytes).await
}

/// POST /uploads/post-images?filename=, raw image bytes.
pub async fn upload_post_image(
    State(state): State<AppState>,
    Extension(me): Extension<CurrentUser>,
    Query(query): Query<UploadQuery>,
    bytes: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    store(&state, &me, POST_IMAGE_DIR, POST_IMAGE_TYPES, &query.filename, bytes).await
}

/// Write under `{upload_dir}/{subdir}/{millis}_{filename}` and return the
/// path rows should reference.
async fn store(
    state: &AppState,
    me: &CurrentUser,
    subdir: &str,
    allowed: &[&str],
    filename: &str,
    bytes: Bytes,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    if bytes.is_empty() {
        return Err(ApiError::bad_request("empty upload"));
    }
    if bytes.len() > MAX_UPLOAD_SIZE {
        return Err(ApiError::PayloadTooLarge("image exceeds 10 MB".into()));
    }

    let safe_name = sanitize_filename(filename);
    let extension = safe_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if !allowed.contains(&extension.as_str()) {
        return Err(ApiError::bad_request(format!(
            "unsupported image type, expected one of {}",
            allowed.join(", ")
        )));
    }

    let dir = state.upload_dir.join(subdir);
    tokio::fs::create_dir_all(&dir).await.map_err(|e| {
        error!("Failed to create upload directory {}: {}", dir.display(), e);
        ApiError::Internal(e.into())
    })?;

    let stored_name = format!("{}_{}", chrono::Utc::now().timestamp_millis(), safe_name);
    let file_path = dir.join(&stored_name);
    write_new(&file_path, &bytes).await?;

    info!("@{} uploaded {} ({} bytes)", me.username, file_path.display(), bytes.len());

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            path: file_path.to_string_lossy().into_owned(),
            url: format!("/media/{}/{}", subdir, stored_name),
            size: bytes.len() as u64,
        }),
    ))
}

/// Create `path` and write `bytes`, refusing to replace an existing file.
async fn write_new(path: &Path, bytes: &[u8]) -> Result<(), ApiError> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
        .map_err(|e| {
            if e.kind() == io::ErrorKind::AlreadyExists {
                warn!("Upload collided with {}", path.display());
                return ApiError::Conflict("an upload with this name already exists, retry".into());
            }
            error!("Failed to create file {}: {}", path.display(), e);
            ApiError::Internal(e.into())
        })?;
    file.write_all(bytes).await.map_err(|e| {
        error!("Failed to write file {}: {}", path.display(), e);
        ApiError::Internal(e.into())
    })
}

/// Keep only the final path component, restricted to a safe character set.
fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        "upload".to_string()
    } else {
        trimmed.to_string()
    }
}
