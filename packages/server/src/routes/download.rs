//! File downloads: generated outputs, the cover proxy and static music.

use std::path::Path;

use axum::body::Body;
use axum::extract::{Path as UrlPath, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use podcast_studio::SpeechProvider;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{ApiError, Result};
use crate::state::AppState;

pub async fn download_audio<P: SpeechProvider>(
    State(state): State<AppState<P>>,
    UrlPath(filename): UrlPath<String>,
) -> Result<Response> {
    serve_output(&state, &filename, "audio/mpeg").await
}

pub async fn download_script<P: SpeechProvider>(
    State(state): State<AppState<P>>,
    UrlPath(filename): UrlPath<String>,
) -> Result<Response> {
    serve_output(&state, &filename, "text/plain; charset=utf-8").await
}

async fn serve_output<P: SpeechProvider>(
    state: &AppState<P>,
    filename: &str,
    content_type: &'static str,
) -> Result<Response> {
    let path = state
        .studio
        .storage()
        .output_path(filename)
        .map_err(|_| ApiError::NotFound("File not found".to_string()))?;
    let data = read_existing(&path).await?;
    debug!(file = %filename, bytes = data.len(), "serving output file");

    Ok(attachment(data, content_type, filename))
}

#[derive(Debug, Deserialize)]
pub struct CoverQuery {
    pub url: Option<String>,
}

/// Proxy a generated cover so the browser can save it under a local name.
pub async fn download_cover<P: SpeechProvider>(
    State(state): State<AppState<P>>,
    Query(query): Query<CoverQuery>,
) -> Result<Response> {
    let raw = query
        .url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ApiError::MissingParameter("No cover URL provided".to_string()))?;
    let url = reqwest::Url::parse(raw.trim())
        .ok()
        .filter(|u| matches!(u.scheme(), "http" | "https"))
        .ok_or_else(|| ApiError::Upstream(format!("Failed to download cover: invalid URL {raw}")))?;

    let response = state
        .http
        .get(url)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|e| {
            warn!(error = %e, "cover download failed");
            ApiError::Upstream(format!("Failed to download cover: {e}"))
        })?;
    let data = response
        .bytes()
        .await
        .map_err(|e| ApiError::Upstream(format!("Failed to download cover: {e}")))?;

    let filename = format!("podcast_cover_{}.jpg", chrono::Utc::now().timestamp());
    Ok(attachment(data.to_vec(), "image/jpeg", &filename))
}

/// Background music referenced by the front end.
pub async fn static_file<P: SpeechProvider>(
    State(state): State<AppState<P>>,
    UrlPath(filename): UrlPath<String>,
) -> Result<Response> {
    let path = state
        .settings()
        .bgm
        .resolve(&filename)
        .ok_or_else(|| ApiError::NotFound("File not found".to_string()))?;
    let data = read_existing(path).await?;
    Ok(([(CONTENT_TYPE, "audio/wav")], data).into_response())
}

async fn read_existing(path: &Path) -> Result<Vec<u8>> {
    match tokio::fs::read(path).await {
        Ok(data) => Ok(data),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ApiError::NotFound("File not found".to_string()))
        }
        Err(e) => Err(ApiError::Internal(format!(
            "Failed to read {}: {e}",
            path.display()
        ))),
    }
}

fn attachment(data: Vec<u8>, content_type: &'static str, filename: &str) -> Response {
    let disposition = format!("attachment; filename=\"{filename}\"");
    (
        [(CONTENT_TYPE, content_type.to_string()), (CONTENT_DISPOSITION, disposition)],
        Body::from(data),
    )
        .into_response()
}
