//! # Podcast Studio
//!
//! Everything between an HTTP request and a finished podcast: configuration,
//! content extraction (PDF, web pages), voice preparation including cloning,
//! script generation, speech synthesis and cover art.
//!
//! The provider is abstracted behind [`SpeechProvider`]; production code uses
//! [`MiniMaxProvider`].

pub mod config;
pub mod content;
pub mod error;
pub mod generator;
pub mod pipeline;
pub mod prompt;
pub mod provider;
pub mod storage;
pub mod voices;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use config::Settings;
pub use content::ContentParser;
pub use error::{Result, StudioError, UrlErrorCode};
pub use generator::PodcastGenerator;
pub use pipeline::{ParsedContent, PodcastRequest, SpeakerRequest, Studio, UploadedFile};
pub use provider::{MiniMaxProvider, SpeechProvider};
pub use storage::Storage;
pub use voices::{ClonedVoice, PreparedVoices, VoiceManager};
