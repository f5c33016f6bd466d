//! Shared application state.

use std::sync::Arc;

use podcast_studio::{Settings, SpeechProvider, Studio};

/// Cheap to clone: handlers receive a copy per request.
#[derive(Clone)]
pub struct AppState<P> {
    pub studio: Arc<Studio<P>>,
    /// Outbound client for the cover proxy, with the configured timeout
    pub http: reqwest::Client,
}

impl<P: SpeechProvider> AppState<P> {
    pub fn new(studio: Studio<P>) -> podcast_studio::Result<Self> {
        let http = podcast_minimax::http_client_builder()
            .timeout(studio.settings().limits.cover_download_timeout())
            .build()
            .map_err(podcast_minimax::Error::from)?;
        Ok(Self {
            studio: Arc::new(studio),
            http,
        })
    }

    pub fn settings(&self) -> &Settings {
        self.studio.settings()
    }
}
