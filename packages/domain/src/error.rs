//! Errors raised while building domain values from untrusted input.
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Speaker type form value that is neither `default` nor `custom`.
    #[error("unknown speaker type: {0}")]
    UnknownSpeakerType(String),
    /// Identifier rejected by the provider's custom voice rules.
    #[error("invalid custom voice id: {0}")]
    InvalidVoiceId(String),
    /// Speaker slot name other than `speaker1` / `speaker2`.
    #[error("unknown speaker slot: {0}")]
    UnknownSpeakerSlot(String),
}
