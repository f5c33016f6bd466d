//! HTTP routes
//!
//! JSON endpoints live under `/api`, file downloads under `/download` and
//! `/static`. Podcast generation answers with an SSE stream.

mod content;
mod download;
mod form;
mod health;
mod podcast;
mod voice;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use podcast_studio::SpeechProvider;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Create the application router
pub fn create_router<P: SpeechProvider>(state: AppState<P>) -> Router {
    let body_limit = state.settings().server.body_limit_bytes;

    Router::new()
        .route("/health", get(health::health))
        .route("/api/default-voices", get(health::default_voices::<P>))
        // Generation
        .route("/api/generate_podcast", post(podcast::generate_podcast::<P>))
        .route("/api/parse-content", post(content::parse_content::<P>))
        // Voices
        .route("/api/upload_audio", post(voice::upload_audio::<P>))
        .route("/api/upload-audio", post(voice::upload_audio::<P>))
        .route("/api/clone-voice", post(voice::clone_voice::<P>))
        // Files
        .route("/download/audio/{filename}", get(download::download_audio::<P>))
        .route("/download/script/{filename}", get(download::download_script::<P>))
        .route("/download/cover", get(download::download_cover::<P>))
        .route("/static/{filename}", get(download::static_file::<P>))
        // Middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
