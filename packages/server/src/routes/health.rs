use axum::Json;
use axum::extract::State;
use podcast_studio::SpeechProvider;
use serde_json::{Value, json};

use crate::state::AppState;

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Podcast generation service is running",
    }))
}

/// Configured default voices, keyed by the name used in `speakerN_voice_name`.
pub async fn default_voices<P: SpeechProvider>(State(state): State<AppState<P>>) -> Json<Value> {
    Json(json!({
        "success": true,
        "voices": state.settings().voices,
    }))
}
