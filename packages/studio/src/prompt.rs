//! Prompts for script and cover generation.

use podcast_minimax::endpoints::chat::ChatMessage;

const SCRIPT_SYSTEM_PROMPT: &str = "\
You are the producer of a lively two-host podcast. Turn the material the user \
provides into a natural, engaging conversation between two hosts.

Rules:
- Write only dialogue lines, one per line, each starting with `Speaker1:` or `Speaker2:`.
- Speaker1 opens the show and introduces the topic; Speaker2 asks questions, reacts and adds insight.
- Alternate speakers and keep each line short enough to be spoken in one breath.
- Stay faithful to the material. Do not invent facts.
- Write in the same language as the material.
- No headings, stage directions, sound effects or markdown.";

/// Chat messages asking for a dialogue script of at most `max_lines` lines.
pub fn script_messages(content: &str, max_lines: usize) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SCRIPT_SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "Write a podcast dialogue of at most {max_lines} lines about the following material.\n\n\
             ---\n{content}\n---"
        )),
    ]
}

const COVER_TOPIC_CHARS: usize = 300;

/// Image prompt for the podcast cover, derived from the opening of the content.
pub fn cover_prompt(content: &str) -> String {
    let topic: String = content
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(COVER_TOPIC_CHARS)
        .collect();
    format!(
        "Square podcast cover art, modern flat illustration, bold colors, two microphones, \
         no text or letters. Theme: {topic}"
    )
}
