//! Script, cover and audio generation for one podcast.
//!
//! [`PodcastGenerator::generate`] turns merged content and two voice ids into
//! a stream of [`ProgressEvent`]s that ends with `complete`, or with `error`
//! on the first fatal failure.

use async_stream::{stream, try_stream};
use futures_util::{Stream, StreamExt, pin_mut};
use podcast_domain::{MergedContent, ProgressEvent, Script, SessionId, SpeakerSlot, Step, VoiceId};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::{Result, StudioError};
use crate::prompt;
use crate::provider::SpeechProvider;
use crate::storage::{self, Storage};

/// Route prefixes the finished files are served under.
pub const AUDIO_ROUTE: &str = "/download/audio";
pub const SCRIPT_ROUTE: &str = "/download/script";

#[derive(Debug, Clone)]
pub struct PodcastGenerator<P> {
    provider: P,
    storage: Storage,
    max_dialogue_lines: usize,
}

/// Aborts the cover task when generation stops early.
struct CoverTask(JoinHandle<Result<podcast_minimax::Traced<String>>>);

impl Drop for CoverTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

impl<P: SpeechProvider> PodcastGenerator<P> {
    pub fn new(provider: P, storage: Storage, max_dialogue_lines: usize) -> Self {
        Self {
            provider,
            storage,
            max_dialogue_lines,
        }
    }

    /// Infallible event stream: failures become a final `error` event.
    pub fn generate(
        self,
        content: MergedContent,
        speaker1: VoiceId,
        speaker2: VoiceId,
        session: SessionId,
    ) -> impl Stream<Item = ProgressEvent> + Send + 'static {
        stream! {
            let inner = self.run(content, speaker1, speaker2, session);
            pin_mut!(inner);
            while let Some(item) = inner.next().await {
                match item {
                    Ok(event) => yield event,
                    Err(err) => {
                        error!(session = %session, error = %err, "podcast generation failed");
                        yield ProgressEvent::error(format!("Podcast generation failed: {err}"));
                        break;
                    }
                }
            }
        }
    }

    fn run(
        self,
        content: MergedContent,
        speaker1: VoiceId,
        speaker2: VoiceId,
        session: SessionId,
    ) -> impl Stream<Item = Result<ProgressEvent>> + Send + 'static {
        try_stream! {
            // Script
            yield ProgressEvent::progress(Step::GeneratingScript, "Generating podcast script...");
            let messages = prompt::script_messages(content.as_str(), self.max_dialogue_lines);
            let chat = self.provider.stream_chat(messages).await?;
            if let Some(trace_id) = chat.trace_id {
                yield ProgressEvent::trace_id("script", trace_id);
            }

            let mut raw = String::new();
            let mut deltas = chat.value;
            while let Some(delta) = deltas.next().await {
                let delta = delta?;
                raw.push_str(&delta);
                yield ProgressEvent::ScriptChunk { content: delta };
            }

            let mut script = Script::parse(&raw);
            if script.is_empty() {
                warn!(session = %session, raw_len = raw.len(), "no dialogue lines in script");
                Err(StudioError::EmptyScript)?;
            }
            if script.truncate(self.max_dialogue_lines) {
                yield ProgressEvent::log(format!(
                    "Script trimmed to {} lines",
                    self.max_dialogue_lines
                ));
            }
            info!(session = %session, lines = script.len(), "script ready");
            yield ProgressEvent::Script { lines: script.lines.clone() };

            // Cover, concurrently with synthesis
            yield ProgressEvent::progress(Step::GeneratingCover, "Generating cover image...");
            let cover = {
                let provider = self.provider.clone();
                let cover_prompt = prompt::cover_prompt(content.as_str());
                CoverTask(tokio::spawn(async move {
                    provider.generate_image(&cover_prompt).await
                }))
            };

            // Audio
            let total = script.len();
            yield ProgressEvent::progress(
                Step::SynthesizingAudio,
                format!("Synthesizing {total} dialogue lines..."),
            );
            let mut audio = Vec::new();
            let mut duration_ms = 0u64;
            for (index, line) in script.lines.iter().enumerate() {
                let voice = match line.speaker {
                    SpeakerSlot::Speaker1 => &speaker1,
                    SpeakerSlot::Speaker2 => &speaker2,
                };
                let segment = self
                    .provider
                    .synthesize(&line.text, voice)
                    .await
                    .map_err(|source| StudioError::Synthesis {
                        index,
                        source: Box::new(source),
                    })?;
                debug!(index, bytes = segment.value.bytes.len(), "line synthesized");
                audio.extend_from_slice(&segment.value.bytes);
                duration_ms += segment.value.duration_ms;
                yield ProgressEvent::AudioChunk {
                    index,
                    total,
                    speaker: line.speaker,
                    duration_ms: segment.value.duration_ms,
                };
                if let Some(trace_id) = segment.trace_id {
                    yield ProgressEvent::trace_id(format!("tts_{index}"), trace_id);
                }
            }

            // Finalize
            yield ProgressEvent::progress(Step::Finalizing, "Finalizing podcast...");
            let cover_url = match join_cover(cover).await {
                Ok(traced) => {
                    yield ProgressEvent::Cover { cover_url: traced.value.clone() };
                    if let Some(trace_id) = traced.trace_id {
                        yield ProgressEvent::trace_id("cover", trace_id);
                    }
                    Some(traced.value)
                }
                Err(err) => {
                    warn!(session = %session, error = %err, "cover generation failed");
                    yield ProgressEvent::log(format!("Cover generation failed, continuing without cover: {err}"));
                    None
                }
            };

            let audio_name = storage::podcast_audio_name(&session);
            let script_name = storage::script_file_name(&session);
            self.storage.write_output(&audio_name, &audio).await?;
            self.storage
                .write_output(&script_name, script.render().as_bytes())
                .await?;
            info!(session = %session, duration_ms, file = %audio_name, "podcast written");

            yield ProgressEvent::Complete {
                audio_url: format!("{AUDIO_ROUTE}/{audio_name}"),
                script_url: format!("{SCRIPT_ROUTE}/{script_name}"),
                cover_url,
                duration_ms,
                line_count: total,
            };
        }
    }
}

async fn join_cover(mut task: CoverTask) -> Result<podcast_minimax::Traced<String>> {
    (&mut task.0)
        .await
        .map_err(|e| StudioError::Task(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeProvider;

    async fn run(fake: &FakeProvider, max_lines: usize) -> (Vec<ProgressEvent>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().join("up"), dir.path().join("out"));
        storage.ensure_dirs().await.unwrap();
        let generator = PodcastGenerator::new(fake.clone(), storage, max_lines);
        let events = generator
            .generate(
                MergedContent::from("Rust ownership explained".to_string()),
                VoiceId::new("voice-a"),
                VoiceId::new("voice-b"),
                SessionId::generate(),
            )
            .collect()
            .await;
        (events, dir)
    }

    fn kinds(events: &[ProgressEvent]) -> Vec<&'static str> {
        events.iter().map(ProgressEvent::kind).collect()
    }

    #[tokio::test]
    async fn full_run_emits_events_in_order_and_writes_files() {
        let fake = FakeProvider::new();
        let (events, dir) = run(&fake, 10).await;

        assert_eq!(
            kinds(&events),
            vec![
                "progress", "trace_id", "script_chunk", "script_chunk", "script", "progress",
                "progress", "audio_chunk", "trace_id", "audio_chunk", "trace_id", "audio_chunk",
                "trace_id", "progress", "cover", "trace_id", "complete",
            ]
        );

        let Some(ProgressEvent::Complete {
            audio_url,
            script_url,
            cover_url,
            duration_ms,
            line_count,
        }) = events.last()
        else {
            panic!("last event must be complete");
        };
        assert_eq!(*line_count, 3);
        assert_eq!(*duration_ms, 3000);
        assert_eq!(cover_url.as_deref(), Some("https://cdn.example.com/cover.jpeg"));

        let audio_name = audio_url.strip_prefix("/download/audio/").unwrap();
        let audio = std::fs::read(dir.path().join("out").join(audio_name)).unwrap();
        assert_eq!(audio, b"[voice-a][voice-b][voice-a]");

        let script_name = script_url.strip_prefix("/download/script/").unwrap();
        let script = std::fs::read_to_string(dir.path().join("out").join(script_name)).unwrap();
        assert_eq!(
            script,
            "Speaker1: Welcome to the show.\nSpeaker2: Glad to be here.\nSpeaker1: Let's dig in.\n"
        );

        assert!(events.contains(&ProgressEvent::trace_id("tts_1", "trace-tts-1")));
    }

    #[tokio::test]
    async fn cover_failure_is_not_fatal() {
        let fake = FakeProvider::new();
        fake.fail_image();
        let (events, _dir) = run(&fake, 10).await;
        assert!(!events.iter().any(|e| matches!(e, ProgressEvent::Cover { .. })));
        assert!(matches!(
            events.last(),
            Some(ProgressEvent::Complete { cover_url: None, .. })
        ));
    }

    #[tokio::test]
    async fn tts_failure_stops_with_error() {
        let fake = FakeProvider::new();
        fake.fail_tts_at(1);
        let (events, dir) = run(&fake, 10).await;
        let last = events.last().unwrap();
        match last {
            ProgressEvent::Error { message } => {
                assert!(message.starts_with("Podcast generation failed: Speech synthesis failed for line 1"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            events.iter().filter(|e| e.kind() == "audio_chunk").count(),
            1
        );
        assert_eq!(std::fs::read_dir(dir.path().join("out")).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn empty_script_is_an_error() {
        let fake = FakeProvider::new();
        fake.set_script(&["Sorry, I can't help with that."]);
        let (events, _dir) = run(&fake, 10).await;
        assert_eq!(
            events.last(),
            Some(&ProgressEvent::error(
                "Podcast generation failed: The generated script contained no dialogue lines"
            ))
        );
        assert!(!fake.calls().iter().any(|c| c.starts_with("tts:")));
    }

    #[tokio::test]
    async fn long_scripts_are_capped() {
        let fake = FakeProvider::new();
        let (events, _dir) = run(&fake, 2).await;
        assert!(events.contains(&ProgressEvent::log("Script trimmed to 2 lines")));
        assert!(matches!(
            events.last(),
            Some(ProgressEvent::Complete { line_count: 2, .. })
        ));
    }
}
