//! Per-request session identifier.
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier generated once per request and used to namespace the file
/// names of uploads and generated assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generate a fresh random session identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// First `len` hex digits of the identifier without hyphens.
    pub fn short_hex(&self, len: usize) -> String {
        let simple = self.0.simple().to_string();
        simple.chars().take(len).collect()
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::generate()
    }
}

impl From<Uuid> for SessionId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_hyphenated_uuid() {
        let id = SessionId::from(Uuid::nil());
        assert_eq!(id.to_string(), "00000000-0000-0000-0000-000000000000");
    }

    #[test]
    fn short_hex_skips_hyphens() {
        let id = SessionId::from(Uuid::parse_str("a1b2c3d4-e5f6-4711-8899-aabbccddeeff").unwrap());
        assert_eq!(id.short_hex(12), "a1b2c3d4e5f6");
        assert_eq!(id.short_hex(100).len(), 32);
    }

    #[test]
    fn generated_ids_differ() {
        assert_ne!(SessionId::generate(), SessionId::generate());
    }
}
