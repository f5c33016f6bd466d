//! # Podcast Domain
//!
//! Shared domain objects and types for the podcast studio service.
//!
//! Everything in here is request-scoped: a session identifier, the two speaker
//! configurations, the merged content corpus, the generated dialogue script and
//! the progress events streamed back to the caller.

pub mod content;
pub mod error;
pub mod progress;
pub mod script;
pub mod session;
pub mod speaker;
pub mod voice_id;

// Re-export core types
pub use content::{ContentSource, MergedContent};
pub use error::DomainError;
pub use progress::{ProgressEvent, Step};
pub use script::{DialogueLine, Script};
pub use session::SessionId;
pub use speaker::{SpeakerConfig, SpeakerKind, SpeakerSlot};
pub use voice_id::VoiceId;

/// Prelude module containing commonly used types.
pub mod prelude {
    pub use crate::{
        ContentSource, DialogueLine, DomainError, MergedContent, ProgressEvent, Script, SessionId,
        SpeakerConfig, SpeakerKind, SpeakerSlot, Step, VoiceId,
    };
}
