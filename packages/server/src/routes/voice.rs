//! Recording upload and standalone voice cloning.

use std::path::PathBuf;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use podcast_domain::{SessionId, SpeakerSlot};
use podcast_studio::storage::recording_name;
use podcast_studio::{SpeechProvider, StudioError};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ApiError, Result};
use crate::routes::form::FormData;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UploadAudioResponse {
    pub success: bool,
    pub filepath: String,
    pub filename: String,
}

/// `POST /api/upload_audio`: store a browser recording for later cloning.
pub async fn upload_audio<P: SpeechProvider>(
    State(state): State<AppState<P>>,
    multipart: Multipart,
) -> Result<Json<UploadAudioResponse>> {
    let form = FormData::collect(multipart).await?;
    let audio = form
        .file("audio")
        .ok_or_else(|| ApiError::InvalidRequest("No audio file provided".to_string()))?;

    let session = match form.text("session_id") {
        id if id.is_empty() => SessionId::generate().to_string(),
        id => id,
    };
    let speaker = match form.text("speaker") {
        s if s.is_empty() => "unknown".to_string(),
        s => s,
    };
    let filename = recording_name(&session, &speaker, chrono::Utc::now().timestamp())
        .ok_or_else(|| ApiError::InvalidRequest("Invalid session or speaker name".to_string()))?;

    let path = state.studio.storage().save_upload(&filename, &audio.data).await?;
    info!(file = %filename, bytes = audio.data.len(), "recording uploaded");

    Ok(Json(UploadAudioResponse {
        success: true,
        filepath: path.display().to_string(),
        filename,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CloneVoiceRequest {
    pub filepath: Option<PathBuf>,
    #[serde(default)]
    pub speaker: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CloneVoiceResponse {
    pub success: bool,
    pub voice_id: String,
    pub upload_trace_id: Option<String>,
    pub clone_trace_id: Option<String>,
}

/// `POST /api/clone-voice`: clone a voice from a file in the upload directory.
pub async fn clone_voice<P: SpeechProvider>(
    State(state): State<AppState<P>>,
    body: std::result::Result<Json<CloneVoiceRequest>, JsonRejection>,
) -> Result<Json<CloneVoiceResponse>> {
    let Json(request) =
        body.map_err(|e| ApiError::InvalidRequest(format!("Invalid request body: {e}")))?;

    let filepath = request
        .filepath
        .filter(|p| !p.as_os_str().is_empty())
        .ok_or(StudioError::AudioFileMissing)?;
    // Anything that does not name speaker1 clones for speaker2
    let slot = request
        .speaker
        .as_deref()
        .and_then(|raw| raw.parse::<SpeakerSlot>().ok())
        .unwrap_or(SpeakerSlot::Speaker2);

    let cloned = state
        .studio
        .clone_voice(&filepath, slot, request.api_key.as_deref())
        .await?;

    Ok(Json(CloneVoiceResponse {
        success: true,
        voice_id: cloned.voice_id.to_string(),
        upload_trace_id: cloned.upload_trace_id,
        clone_trace_id: cloned.clone_trace_id,
    }))
}
