//! Error types for the podcast studio
//!
//! Everything that can go wrong between receiving a request and writing the
//! finished podcast ends up in [`StudioError`]. Its `Display` text is what the
//! caller sees in `error` events, so messages are written for end users.

use std::path::PathBuf;

use podcast_domain::{DomainError, SpeakerSlot};
use strum::Display;
use thiserror::Error;

/// Main error type for studio operations
#[derive(Error, Debug)]
pub enum StudioError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Provider error: {0}")]
    Provider(#[from] podcast_minimax::Error),

    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("{0}")]
    Io(#[from] IoError),

    #[error("Failed to parse PDF {path}: {reason}")]
    Pdf { path: PathBuf, reason: String },

    #[error("{0}")]
    Url(#[from] UrlFetchError),

    #[error("Please provide at least one input (text, URL or PDF)")]
    EmptyContent,

    #[error("{} selected a custom voice but no audio file was uploaded", .0.script_label())]
    MissingSpeakerAudio(SpeakerSlot),

    #[error("Unknown default voice: {0}")]
    UnknownVoice(String),

    #[error("Failed to prepare voice for {}: {source}", .slot.script_label())]
    VoicePreparation {
        slot: SpeakerSlot,
        #[source]
        source: Box<StudioError>,
    },

    #[error("No API key provided")]
    MissingApiKey,

    #[error("The generated script contained no dialogue lines")]
    EmptyScript,

    #[error("Speech synthesis failed for line {index}: {source}")]
    Synthesis {
        index: usize,
        #[source]
        source: Box<StudioError>,
    },

    #[error("Audio file does not exist")]
    AudioFileMissing,

    #[error("Background task failed: {0}")]
    Task(String),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Configuration parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Configuration validation error: {field} - {reason}")]
    ValidationError { field: String, reason: String },
}

/// File system errors with the path that caused them
#[derive(Error, Debug)]
pub enum IoError {
    #[error("File operation failed: {path} - {source}")]
    FileOperation {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Path is outside the upload directory: {path}")]
    OutsideUploadDir { path: PathBuf },

    #[error("Not a plain file name: {name}")]
    InvalidFileName { name: String },
}

/// Classification of a failed web page fetch, reported to the caller as
/// `error_code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum UrlErrorCode {
    InvalidUrl,
    Timeout,
    ConnectionFailed,
    Forbidden,
    NotFound,
    HttpError,
    EmptyContent,
    RequestFailed,
}

#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct UrlFetchError {
    pub code: UrlErrorCode,
    pub message: String,
}

impl UrlFetchError {
    pub fn new(code: UrlErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, StudioError>;

/// Attach a path to `std::io::Error`s
pub trait IoErrorExt<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> std::result::Result<T, IoError>;
}

impl<T> IoErrorExt<T> for std::result::Result<T, std::io::Error> {
    fn with_path(self, path: impl Into<PathBuf>) -> std::result::Result<T, IoError> {
        self.map_err(|source| {
            let path = path.into();
            match source.kind() {
                std::io::ErrorKind::NotFound => IoError::FileNotFound { path },
                _ => IoError::FileOperation { path, source },
            }
        })
    }
}

pub(crate) fn validation_error(field: &str, reason: &str) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_codes_render_snake_case() {
        assert_eq!(UrlErrorCode::ConnectionFailed.to_string(), "connection_failed");
        assert_eq!(UrlErrorCode::InvalidUrl.to_string(), "invalid_url");
    }

    #[test]
    fn not_found_keeps_path() {
        let err: std::result::Result<(), _> =
            Err(std::io::Error::from(std::io::ErrorKind::NotFound));
        match err.with_path("/tmp/x.wav") {
            Err(IoError::FileNotFound { path }) => assert_eq!(path, PathBuf::from("/tmp/x.wav")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn voice_preparation_names_the_speaker() {
        let err = StudioError::VoicePreparation {
            slot: SpeakerSlot::Speaker2,
            source: Box::new(StudioError::AudioFileMissing),
        };
        assert_eq!(
            err.to_string(),
            "Failed to prepare voice for Speaker2: Audio file does not exist"
        );
    }
}
