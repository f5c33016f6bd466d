//! Merged content corpus built from the user's inputs.
use serde::{Deserialize, Serialize};
use strum::Display;

/// Where a piece of content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum ContentSource {
    #[strum(serialize = "Text input")]
    Text,
    #[strum(serialize = "Web page")]
    Url,
    #[strum(serialize = "PDF document")]
    Pdf,
}

/// Single text blob concatenated from up to three optional sources.
///
/// A lone source is kept verbatim. When several sources contribute, each one
/// is introduced by a bracketed heading so the script writer can tell them
/// apart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MergedContent(String);

impl MergedContent {
    pub fn merge(text: &str, url: &str, pdf: &str) -> Self {
        let parts: Vec<(ContentSource, &str)> = [
            (ContentSource::Text, text.trim()),
            (ContentSource::Url, url.trim()),
            (ContentSource::Pdf, pdf.trim()),
        ]
        .into_iter()
        .filter(|(_, body)| !body.is_empty())
        .collect();

        match parts.as_slice() {
            [] => Self::default(),
            [(_, body)] => Self(body.to_string()),
            many => Self(
                many.iter()
                    .map(|(source, body)| format!("[{source}]\n{body}"))
                    .collect::<Vec<_>>()
                    .join("\n\n"),
            ),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Length in characters (not bytes).
    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Cut the corpus down to `max_chars` characters. Returns whether anything
    /// was removed.
    pub fn truncate_chars(&mut self, max_chars: usize) -> bool {
        match self.0.char_indices().nth(max_chars) {
            Some((byte_idx, _)) => {
                self.0.truncate(byte_idx);
                true
            }
            None => false,
        }
    }
}

impl From<String> for MergedContent {
    fn from(text: String) -> Self {
        Self(text)
    }
}
