//! Progress events streamed to the caller while a podcast is produced.
//!
//! Every event serializes to a flat JSON object tagged by `type`, which is
//! exactly what ends up in the `data:` line of each Server-Sent Event.

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::script::DialogueLine;
use crate::speaker::SpeakerSlot;

/// Coarse pipeline stage announced by [`ProgressEvent::Progress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Step {
    ParsingContent,
    PreparingVoices,
    GeneratingScript,
    GeneratingCover,
    SynthesizingAudio,
    Finalizing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    Progress {
        step: Step,
        message: String,
    },
    Log {
        message: String,
    },
    Error {
        message: String,
    },
    /// URL extraction failed; generation continues with the other inputs.
    UrlParseWarning {
        message: String,
        error_code: String,
    },
    TraceId {
        api: String,
        trace_id: String,
    },
    /// Incremental text of the dialogue script as the writer produces it.
    ScriptChunk {
        content: String,
    },
    Script {
        lines: Vec<DialogueLine>,
    },
    AudioChunk {
        index: usize,
        total: usize,
        speaker: SpeakerSlot,
        duration_ms: u64,
    },
    Cover {
        cover_url: String,
    },
    Complete {
        audio_url: String,
        script_url: String,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        cover_url: Option<String>,
        duration_ms: u64,
        line_count: usize,
    },
}

impl ProgressEvent {
    pub fn progress(step: Step, message: impl Into<String>) -> Self {
        ProgressEvent::Progress {
            step,
            message: message.into(),
        }
    }

    pub fn log(message: impl Into<String>) -> Self {
        ProgressEvent::Log {
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ProgressEvent::Error {
            message: message.into(),
        }
    }

    pub fn trace_id(api: impl Into<String>, trace_id: impl Into<String>) -> Self {
        ProgressEvent::TraceId {
            api: api.into(),
            trace_id: trace_id.into(),
        }
    }

    /// Whether the event ends the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProgressEvent::Error { .. } | ProgressEvent::Complete { .. }
        )
    }

    /// Value of the `type` tag, handy for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ProgressEvent::Progress { .. } => "progress",
            ProgressEvent::Log { .. } => "log",
            ProgressEvent::Error { .. } => "error",
            ProgressEvent::UrlParseWarning { .. } => "url_parse_warning",
            ProgressEvent::TraceId { .. } => "trace_id",
            ProgressEvent::ScriptChunk { .. } => "script_chunk",
            ProgressEvent::Script { .. } => "script",
            ProgressEvent::AudioChunk { .. } => "audio_chunk",
            ProgressEvent::Cover { .. } => "cover",
            ProgressEvent::Complete { .. } => "complete",
        }
    }
}
