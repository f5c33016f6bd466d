//! Request-level orchestration
//!
//! [`Studio`] owns everything a request needs (settings, provider, content
//! parser, storage) and exposes the operations behind the HTTP routes.
//! [`Studio::generate_podcast`] is the long one: it parses the inputs,
//! prepares both voices and then forwards the generator's events, all as one
//! [`ProgressEvent`] stream. Dropping the stream stops the work at the next
//! await point.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_stream::stream;
use futures_util::{Stream, StreamExt, pin_mut};
use podcast_domain::{
    MergedContent, ProgressEvent, SessionId, SpeakerConfig, SpeakerKind, SpeakerSlot, Step,
};
use tracing::{info, warn};

use crate::config::Settings;
use crate::content::ContentParser;
use crate::error::{IoError, Result, StudioError};
use crate::generator::PodcastGenerator;
use crate::provider::SpeechProvider;
use crate::storage::Storage;
use crate::voices::{ClonedVoice, VoiceManager};

/// A file the route layer already saved to the upload directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub path: PathBuf,
    /// Sanitized client file name, for log messages
    pub name: String,
}

/// One speaker as submitted in the form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpeakerRequest {
    /// Raw `speaker{N}_type` value; blank means `default`
    pub kind: String,
    pub voice_name: String,
    pub audio: Option<PathBuf>,
}

impl SpeakerRequest {
    pub fn parsed_kind(&self) -> Result<SpeakerKind> {
        Ok(SpeakerKind::parse_form(&self.kind)?)
    }

    pub fn config(&self, slot: SpeakerSlot) -> Result<SpeakerConfig> {
        match self.parsed_kind()? {
            SpeakerKind::Default => {
                let name = self.voice_name.trim();
                let name = if name.is_empty() {
                    slot.default_voice_name()
                } else {
                    name
                };
                Ok(SpeakerConfig::default_voice(name))
            }
            SpeakerKind::Custom => match &self.audio {
                Some(path) => Ok(SpeakerConfig::custom(path)),
                None => Err(StudioError::MissingSpeakerAudio(slot)),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PodcastRequest {
    pub api_key: String,
    pub text_input: String,
    pub url: String,
    pub pdf: Option<UploadedFile>,
    pub speaker1: SpeakerRequest,
    pub speaker2: SpeakerRequest,
}

/// Merged content plus the summary shown to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedContent {
    pub content: MergedContent,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct Studio<P> {
    settings: Arc<Settings>,
    provider: P,
    parser: ContentParser,
    storage: Storage,
    fallback_api_key: Option<String>,
}

impl<P: SpeechProvider> Studio<P> {
    pub fn new(settings: Settings, provider: P, fallback_api_key: Option<String>) -> Result<Self> {
        let parser = ContentParser::new(
            settings.limits.url_fetch_timeout(),
            settings.limits.max_content_chars,
        )?;
        let storage = Storage::new(&settings.storage.upload_dir, &settings.storage.output_dir);
        Ok(Self {
            settings: Arc::new(settings),
            provider,
            parser,
            storage,
            fallback_api_key: fallback_api_key.filter(|key| !key.trim().is_empty()),
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Run the whole podcast flow for one request.
    pub fn generate_podcast(
        &self,
        request: PodcastRequest,
        session: SessionId,
    ) -> impl Stream<Item = ProgressEvent> + Send + 'static {
        let settings = Arc::clone(&self.settings);
        let base_provider = self.provider.clone();
        let parser = self.parser.clone();
        let storage = self.storage.clone();

        stream! {
            let api_key = request.api_key.trim();
            if api_key.is_empty() {
                yield ProgressEvent::error(StudioError::MissingApiKey.to_string());
                return;
            }
            let provider = base_provider.with_api_key(api_key);
            info!(session = %session, "podcast generation started");

            yield ProgressEvent::progress(Step::ParsingContent, "Parsing input content...");

            let mut pdf_content = String::new();
            if let Some(pdf) = &request.pdf {
                yield ProgressEvent::log(format!("PDF uploaded: {}", pdf.name));
                match parser.parse_pdf(&pdf.path).await {
                    Ok(outcome) => {
                        for line in outcome.logs {
                            yield ProgressEvent::log(line);
                        }
                        pdf_content = outcome.content;
                    }
                    Err(err) => {
                        warn!(session = %session, error = %err, "PDF parsing failed");
                        yield ProgressEvent::error(err.to_string());
                        return;
                    }
                }
            }

            let mut url_content = String::new();
            let url = request.url.trim();
            if !url.is_empty() {
                yield ProgressEvent::log(format!("Fetching web page: {url}"));
                match parser.parse_url(url).await {
                    Ok(outcome) => {
                        for line in outcome.logs {
                            yield ProgressEvent::log(line);
                        }
                        url_content = outcome.content;
                    }
                    Err(failure) => {
                        warn!(session = %session, url, code = %failure.error.code, "URL parsing failed, continuing");
                        yield ProgressEvent::UrlParseWarning {
                            message: failure.error.message.clone(),
                            error_code: failure.error.code.to_string(),
                        };
                        for line in failure.logs {
                            yield ProgressEvent::log(line);
                        }
                    }
                }
            }

            let (merged, truncation) = parser.merge(&request.text_input, &url_content, &pdf_content);
            if merged.is_empty() {
                yield ProgressEvent::error(StudioError::EmptyContent.to_string());
                return;
            }
            if let Some(line) = truncation {
                yield ProgressEvent::log(line);
            }
            yield ProgressEvent::log(format!(
                "Content parsed, {} characters in total",
                merged.char_count()
            ));

            yield ProgressEvent::progress(Step::PreparingVoices, "Preparing voices...");
            let mut configs = Vec::with_capacity(2);
            for (slot, speaker) in [
                (SpeakerSlot::Speaker1, &request.speaker1),
                (SpeakerSlot::Speaker2, &request.speaker2),
            ] {
                match speaker.config(slot) {
                    Ok(config) => {
                        if config.kind() == SpeakerKind::Custom {
                            yield ProgressEvent::log(format!("{} audio uploaded", slot.script_label()));
                        }
                        configs.push(config);
                    }
                    Err(err) => {
                        yield ProgressEvent::error(err.to_string());
                        return;
                    }
                }
            }

            let voices = VoiceManager::new(provider.clone(), settings.voices.clone());
            let prepared = match voices.prepare_voices(&configs[0], &configs[1], &session).await {
                Ok(prepared) => prepared,
                Err(err) => {
                    warn!(session = %session, error = %err, "voice preparation failed");
                    yield ProgressEvent::error(err.to_string());
                    return;
                }
            };
            for line in prepared.logs {
                yield ProgressEvent::log(line);
            }
            for (api, trace_id) in prepared.trace_ids {
                yield ProgressEvent::trace_id(api, trace_id);
            }

            let generator = PodcastGenerator::new(provider, storage, settings.limits.max_dialogue_lines);
            let events = generator.generate(merged, prepared.speaker1, prepared.speaker2, session);
            pin_mut!(events);
            while let Some(event) = events.next().await {
                yield event;
            }
        }
    }

    /// Parse and merge inputs without generating anything. A URL failure is
    /// an error here.
    pub async fn parse_content(
        &self,
        text_input: &str,
        url_input: &str,
        pdf: Option<&Path>,
    ) -> Result<ParsedContent> {
        let mut url_content = String::new();
        if !url_input.trim().is_empty() {
            url_content = self
                .parser
                .parse_url(url_input)
                .await
                .map_err(|failure| StudioError::Url(failure.error))?
                .content;
        }

        let mut pdf_content = String::new();
        if let Some(path) = pdf {
            pdf_content = self.parser.parse_pdf(path).await?.content;
        }

        let (content, _) = self.parser.merge(text_input, &url_content, &pdf_content);
        if content.is_empty() {
            return Err(StudioError::EmptyContent);
        }
        let message = format!("Content parsed, {} characters in total", content.char_count());
        Ok(ParsedContent { content, message })
    }

    /// Clone a voice from a previously uploaded recording.
    pub async fn clone_voice(
        &self,
        filepath: &Path,
        slot: SpeakerSlot,
        api_key: Option<&str>,
    ) -> Result<ClonedVoice> {
        let api_key = api_key
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .or(self.fallback_api_key.as_deref())
            .ok_or(StudioError::MissingApiKey)?;

        let path = match self.storage.confine_upload(filepath).await {
            Ok(path) => path,
            Err(StudioError::Io(IoError::FileNotFound { .. })) => {
                return Err(StudioError::AudioFileMissing);
            }
            Err(err) => return Err(err),
        };
        info!(path = %path.display(), speaker = %slot, "cloning voice");

        let voices = VoiceManager::new(
            self.provider.with_api_key(api_key),
            self.settings.voices.clone(),
        );
        voices.clone_voice(slot, &path, &SessionId::generate()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeProvider;

    struct Fixture {
        studio: Studio<FakeProvider>,
        fake: FakeProvider,
        _dir: tempfile::TempDir,
    }

    async fn fixture(fallback_key: Option<&str>) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::new();
        settings.storage.upload_dir = dir.path().join("uploads");
        settings.storage.output_dir = dir.path().join("outputs");
        let fake = FakeProvider::new();
        let studio = Studio::new(settings, fake.clone(), fallback_key.map(str::to_string)).unwrap();
        studio.storage().ensure_dirs().await.unwrap();
        Fixture {
            studio,
            fake,
            _dir: dir,
        }
    }

    fn request(text: &str) -> PodcastRequest {
        PodcastRequest {
            api_key: "user-key".to_string(),
            text_input: text.to_string(),
            ..PodcastRequest::default()
        }
    }

    async fn events(fx: &Fixture, request: PodcastRequest) -> Vec<ProgressEvent> {
        fx.studio
            .generate_podcast(request, SessionId::generate())
            .collect()
            .await
    }

    #[tokio::test]
    async fn missing_api_key_yields_single_error() {
        let fx = fixture(Some("server-key")).await;
        let mut req = request("hello");
        req.api_key = "   ".to_string();
        let out = events(&fx, req).await;
        assert_eq!(out, vec![ProgressEvent::error("No API key provided")]);
        assert!(fx.fake.calls().is_empty());
    }

    #[tokio::test]
    async fn empty_inputs_stop_after_parsing() {
        let fx = fixture(None).await;
        let out = events(&fx, request("  ")).await;
        assert_eq!(
            out,
            vec![
                ProgressEvent::progress(Step::ParsingContent, "Parsing input content..."),
                ProgressEvent::error("Please provide at least one input (text, URL or PDF)"),
            ]
        );
    }

    #[tokio::test]
    async fn custom_speaker_without_audio_is_an_error() {
        let fx = fixture(None).await;
        let mut req = request("topic");
        req.speaker2.kind = "custom".to_string();
        let out = events(&fx, req).await;
        assert_eq!(
            out.last(),
            Some(&ProgressEvent::error(
                "Speaker2 selected a custom voice but no audio file was uploaded"
            ))
        );
    }

    #[tokio::test]
    async fn unknown_speaker_type_is_an_error() {
        let fx = fixture(None).await;
        let mut req = request("topic");
        req.speaker1.kind = "robot".to_string();
        let out = events(&fx, req).await;
        assert_eq!(out.last(), Some(&ProgressEvent::error("unknown speaker type: robot")));
    }

    #[tokio::test]
    async fn happy_path_reaches_complete() {
        let fx = fixture(None).await;
        let audio = fx
            .studio
            .storage()
            .save_upload("s_speaker1_me.wav", b"RIFF")
            .await
            .unwrap();
        let mut req = request("Rust ownership");
        req.speaker1 = SpeakerRequest {
            kind: "custom".to_string(),
            voice_name: String::new(),
            audio: Some(audio),
        };
        req.speaker2.voice_name = "max".to_string();

        let out = events(&fx, req).await;
        let kinds: Vec<_> = out.iter().map(ProgressEvent::kind).collect();
        assert_eq!(&kinds[..3], &["progress", "log", "progress"]);
        assert!(out.contains(&ProgressEvent::log("Speaker1 audio uploaded")));
        assert!(out.contains(&ProgressEvent::trace_id("speaker1_upload", "trace-upload")));
        assert!(out.contains(&ProgressEvent::trace_id("speaker1_clone", "trace-clone")));
        assert!(matches!(out.last(), Some(ProgressEvent::Complete { line_count: 3, .. })));

        let tts: Vec<String> = fx
            .fake
            .calls()
            .into_iter()
            .filter(|c| c.starts_with("tts:"))
            .collect();
        assert!(tts[1].starts_with("tts:male-qn-jingying:"));
        assert!(tts[0].starts_with("tts:podcast1"));
        assert_eq!(fx.fake.api_keys(), vec!["user-key".to_string()]);
    }

    #[tokio::test]
    async fn clone_voice_requires_key_and_confined_file() {
        let fx = fixture(None).await;
        let inside = fx
            .studio
            .storage()
            .save_upload("rec.wav", b"RIFF")
            .await
            .unwrap();

        assert!(matches!(
            fx.studio.clone_voice(&inside, SpeakerSlot::Speaker1, None).await,
            Err(StudioError::MissingApiKey)
        ));

        let missing = fx.studio.storage().upload_dir().join("nope.wav");
        assert!(matches!(
            fx.studio
                .clone_voice(&missing, SpeakerSlot::Speaker1, Some("k"))
                .await,
            Err(StudioError::AudioFileMissing)
        ));

        let cloned = fx
            .studio
            .clone_voice(&inside, SpeakerSlot::Speaker2, Some("k"))
            .await
            .unwrap();
        assert!(cloned.voice_id.id().starts_with("podcast2"));
        assert_eq!(cloned.upload_trace_id.as_deref(), Some("trace-upload"));
    }

    #[tokio::test]
    async fn clone_voice_falls_back_to_server_key() {
        let fx = fixture(Some("server-key")).await;
        let inside = fx
            .studio
            .storage()
            .save_upload("rec.wav", b"RIFF")
            .await
            .unwrap();
        assert!(
            fx.studio
                .clone_voice(&inside, SpeakerSlot::Speaker1, Some(" "))
                .await
                .is_ok()
        );
        assert_eq!(fx.fake.api_keys(), vec!["server-key".to_string()]);
    }

    #[tokio::test]
    async fn generation_ignores_server_key() {
        let fx = fixture(Some("server-key")).await;
        let out = events(&fx, request("Traits and generics")).await;
        assert!(matches!(out.last(), Some(ProgressEvent::Complete { .. })));
        assert_eq!(fx.fake.api_keys(), vec!["user-key".to_string()]);
    }

    #[tokio::test]
    async fn unreadable_pdf_stops_generation() {
        let fx = fixture(None).await;
        let path = fx
            .studio
            .storage()
            .save_upload("s_broken.pdf", b"%PDF-garbage")
            .await
            .unwrap();
        let mut req = request("");
        req.pdf = Some(UploadedFile {
            path,
            name: "broken.pdf".to_string(),
        });

        let out = events(&fx, req).await;
        assert_eq!(out[1], ProgressEvent::log("PDF uploaded: broken.pdf"));
        assert_eq!(out.len(), 3);
        assert!(matches!(&out[2], ProgressEvent::Error { message } if message.starts_with("Failed to parse PDF")));
        assert!(fx.fake.calls().is_empty());
    }

    #[tokio::test]
    async fn pdf_text_feeds_the_script() {
        let fx = fixture(None).await;
        let path = fx
            .studio
            .storage()
            .save_upload("s_notes.pdf", &crate::testing::minimal_pdf("Pattern matching"))
            .await
            .unwrap();
        let mut req = request("");
        req.pdf = Some(UploadedFile {
            path,
            name: "notes.pdf".to_string(),
        });

        let out = events(&fx, req).await;
        assert!(out.iter().any(|e| matches!(e, ProgressEvent::Log { message } if message.starts_with("PDF parsed: s_notes.pdf"))));
        assert!(matches!(out.last(), Some(ProgressEvent::Complete { .. })));
    }

    #[tokio::test]
    async fn parse_content_merges_text() {
        let fx = fixture(None).await;
        let parsed = fx.studio.parse_content("  hello  ", "", None).await.unwrap();
        assert_eq!(parsed.content.as_str(), "hello");
        assert_eq!(parsed.message, "Content parsed, 5 characters in total");
        assert!(matches!(
            fx.studio.parse_content("", "", None).await,
            Err(StudioError::EmptyContent)
        ));
        assert!(matches!(
            fx.studio.parse_content("x", "ftp://nope", None).await,
            Err(StudioError::Url(_))
        ));
    }
}
