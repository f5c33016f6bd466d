//! Two-speaker dialogue script.
use serde::{Deserialize, Serialize};

use crate::speaker::SpeakerSlot;

/// One spoken turn of the podcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueLine {
    pub speaker: SpeakerSlot,
    pub text: String,
}

impl DialogueLine {
    pub fn new(speaker: SpeakerSlot, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
        }
    }
}

/// Ordered dialogue lines parsed from the script writer's raw output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    pub lines: Vec<DialogueLine>,
}

impl Script {
    /// Parse `Speaker1: ...` / `Speaker2: ...` lines.
    ///
    /// Labels are matched case-insensitively, may contain a space before the
    /// digit, may be wrapped in markdown emphasis or brackets, and may be
    /// followed by an ASCII or full-width colon. Anything else is ignored.
    pub fn parse(raw: &str) -> Self {
        let lines = raw.lines().filter_map(parse_line).collect();
        Self { lines }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Keep at most `max` lines. Returns whether lines were dropped.
    pub fn truncate(&mut self, max: usize) -> bool {
        let dropped = self.lines.len() > max;
        self.lines.truncate(max);
        dropped
    }

    /// Plain-text rendering written next to the generated audio.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(line.speaker.script_label());
            out.push_str(": ");
            out.push_str(&line.text);
            out.push('\n');
        }
        out
    }
}

const DECORATION: &[char] = &['*', '_', '[', ']', '(', ')', '【', '】', '#', '-', ' ', '\t'];

fn parse_line(line: &str) -> Option<DialogueLine> {
    let rest = line.trim().trim_start_matches(DECORATION);
    let head = rest.get(..7)?;
    if !head.eq_ignore_ascii_case("speaker") {
        return None;
    }
    let rest = rest[7..].trim_start();
    let speaker = match rest.chars().next()? {
        '1' => SpeakerSlot::Speaker1,
        '2' => SpeakerSlot::Speaker2,
        _ => return None,
    };
    let rest = rest[1..].trim_start_matches(DECORATION);
    let rest = rest
        .strip_prefix(':')
        .or_else(|| rest.strip_prefix('：'))?;
    let text = rest
        .trim_start_matches(['*', ' '])
        .trim_end_matches('*')
        .trim();
    if text.is_empty() {
        return None;
    }
    Some(DialogueLine::new(speaker, text))
}
