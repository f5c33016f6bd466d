//! Speaker slots and their voice configuration.
//!
//! A podcast always has exactly two speakers. Each one is configured either
//! with a built-in named voice or with a custom audio sample that gets cloned
//! by the provider before synthesis.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use strum::{Display, EnumString};

use crate::error::DomainError;

/// One of the two podcast hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum SpeakerSlot {
    #[serde(rename = "speaker1")]
    #[strum(serialize = "speaker1")]
    Speaker1,
    #[serde(rename = "speaker2")]
    #[strum(serialize = "speaker2")]
    Speaker2,
}

impl SpeakerSlot {
    pub const ALL: [SpeakerSlot; 2] = [SpeakerSlot::Speaker1, SpeakerSlot::Speaker2];

    /// 1-based position of the speaker.
    pub fn number(self) -> u8 {
        match self {
            SpeakerSlot::Speaker1 => 1,
            SpeakerSlot::Speaker2 => 2,
        }
    }

    /// Label used for this speaker inside dialogue scripts.
    pub fn script_label(self) -> &'static str {
        match self {
            SpeakerSlot::Speaker1 => "Speaker1",
            SpeakerSlot::Speaker2 => "Speaker2",
        }
    }

    /// Built-in voice used when the form does not name one.
    pub fn default_voice_name(self) -> &'static str {
        match self {
            SpeakerSlot::Speaker1 => "mini",
            SpeakerSlot::Speaker2 => "max",
        }
    }

    /// Trace-id key for the file upload performed while cloning this speaker.
    pub fn upload_trace_key(self) -> String {
        format!("{self}_upload")
    }

    /// Trace-id key for the clone call of this speaker.
    pub fn clone_trace_key(self) -> String {
        format!("{self}_clone")
    }
}

impl FromStr for SpeakerSlot {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "speaker1" | "1" => Ok(SpeakerSlot::Speaker1),
            "speaker2" | "2" => Ok(SpeakerSlot::Speaker2),
            other => Err(DomainError::UnknownSpeakerSlot(other.to_string())),
        }
    }
}

/// Raw `speakerN_type` form value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SpeakerKind {
    #[default]
    Default,
    Custom,
}

impl SpeakerKind {
    /// Parse a form value, treating a blank value as [`SpeakerKind::Default`].
    pub fn parse_form(value: &str) -> Result<Self, DomainError> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(SpeakerKind::Default);
        }
        value
            .parse()
            .map_err(|_| DomainError::UnknownSpeakerType(value.to_string()))
    }
}

/// Voice configuration for one speaker, consumed once to obtain a voice id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeakerConfig {
    /// Built-in voice looked up by name (`mini`, `max`, ...).
    Default { voice_name: String },
    /// Uploaded audio sample to clone.
    Custom { audio_file: PathBuf },
}

impl SpeakerConfig {
    pub fn default_voice(voice_name: impl Into<String>) -> Self {
        SpeakerConfig::Default {
            voice_name: voice_name.into(),
        }
    }

    pub fn custom(audio_file: impl Into<PathBuf>) -> Self {
        SpeakerConfig::Custom {
            audio_file: audio_file.into(),
        }
    }

    pub fn kind(&self) -> SpeakerKind {
        match self {
            SpeakerConfig::Default { .. } => SpeakerKind::Default,
            SpeakerConfig::Custom { .. } => SpeakerKind::Custom,
        }
    }
}
