use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Extension, Json,
};
use gallery_core::{
    listing, object::guess_content_type, AccessToken, FolderSummary, GalleryEntry, MediaLinks,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

/// Index page
pub async fn index() -> &'static str {
    "Media gallery API"
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessCodeRequest {
    #[serde(default)]
    pub access_code: String,
}

#[derive(Debug, Serialize)]
pub struct AccessCodeResponse {
    pub result: &'static str,
}

/// Login check for the landing page; the same code is then used as the token.
///
/// The body is read as JSON whatever its content type. Anything unreadable
/// is treated as an empty code and gets the usual rejection.
pub async fn validate_access_code(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<AccessCodeResponse>, ApiError> {
    let request: AccessCodeRequest = serde_json::from_slice(&body).unwrap_or_else(|e| {
        tracing::debug!("Unreadable access code body: {}", e);
        AccessCodeRequest::default()
    });

    match state.gate.issue(&request.access_code) {
        Ok(_) => Ok(Json(AccessCodeResponse { result: "ok" })),
        Err(_) => {
            tracing::info!("Access code rejected");
            Err(ApiError::InvalidAccessCode)
        }
    }
}

/// Folder list with representative thumbnails
pub async fn list_folders(
    State(state): State<AppState>,
) -> Result<Json<Vec<FolderSummary>>, ApiError> {
    tracing::info!("Folder list request");

    let folders = listing::load_folders(state.store.as_ref())
        .await
        .map_err(|e| {
            tracing::error!("Failed to list folders: {}", e);
            e
        })?;

    Ok(Json(folders))
}

/// Gallery items for one folder, with playlist entries merged in
pub async fn list_media(
    State(state): State<AppState>,
    Path(media): Path<String>,
    Extension(token): Extension<AccessToken>,
) -> Result<Json<Vec<GalleryEntry>>, ApiError> {
    tracing::info!("Gallery request: media={}", media);

    let links = MediaLinks::new(state.base_uri.as_str()).with_token(token);
    let entries = listing::load_gallery(
        state.store.as_ref(),
        state.playlist.as_deref(),
        &media,
        &links,
        state.listing,
    )
    .await
    .map_err(|e| {
        tracing::error!("Failed to list gallery {}: {}", media, e);
        e
    })?;

    tracing::debug!("Gallery {} has {} entries", media, entries.len());
    Ok(Json(entries))
}

/// Single object as a download
pub async fn fetch_object(
    State(state): State<AppState>,
    Path((folder, filename)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    tracing::info!("Object request: folder={}, filename={}", folder, filename);

    let key = format!("{folder}/{filename}");
    let object = state.store.get_object(&key).await.map_err(|e| {
        tracing::error!("Failed to fetch object {}: {}", key, e);
        e
    })?;

    let content_type = object
        .content_type
        .as_deref()
        .and_then(|ct| HeaderValue::from_str(ct).ok())
        .unwrap_or_else(|| HeaderValue::from_static(guess_content_type(&filename)));

    tracing::debug!("Serving object: key={}, content_type={:?}, size={} bytes", key, content_type, object.body.len());
    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, attachment(&filename)),
        ],
        object.body,
    )
        .into_response())
}

fn attachment(filename: &str) -> HeaderValue {
    let escaped = filename.replace('\\', "\\\\").replace('"', "\\\"");
    // from_bytes keeps non-ASCII names that from_str would reject
    HeaderValue::from_bytes(format!("attachment; filename=\"{escaped}\"").as_bytes())
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}
