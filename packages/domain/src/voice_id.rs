//! Opaque provider voice identifier (system voice name or cloned voice id).
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;
use crate::session::SessionId;
use crate::speaker::SpeakerSlot;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoiceId(pub String);

impl VoiceId {
    /// Create a new voice identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the underlying identifier string.
    pub fn id(&self) -> &str {
        &self.0
    }

    /// Identifier to register a cloned voice under, unique per session and slot.
    ///
    /// The provider requires custom ids to start with a letter, contain only
    /// ASCII letters and digits and be at least eight characters long.
    pub fn for_clone(slot: SpeakerSlot, session: &SessionId) -> Self {
        Self(format!("podcast{}{}", slot.number(), session.short_hex(12)))
    }

    /// Validate an identifier destined for the voice cloning endpoint.
    pub fn validate_custom(id: &str) -> Result<(), DomainError> {
        let starts_with_letter = id.chars().next().is_some_and(|c| c.is_ascii_alphabetic());
        let charset_ok = id.chars().all(|c| c.is_ascii_alphanumeric());
        if starts_with_letter && charset_ok && (8..=256).contains(&id.len()) {
            Ok(())
        } else {
            Err(DomainError::InvalidVoiceId(id.to_string()))
        }
    }
}

impl fmt::Display for VoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VoiceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}
