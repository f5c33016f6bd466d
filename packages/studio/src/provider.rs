//! Provider seam
//!
//! The studio never talks HTTP itself; everything the podcast needs from the
//! speech provider goes through [`SpeechProvider`]. [`MiniMaxProvider`] is
//! the production implementation.

use std::future::Future;
use std::path::Path;

use podcast_domain::VoiceId;
use podcast_minimax::endpoints::chat::{ChatBody, ChatCompletionStream, ChatMessage, DeltaStream};
use podcast_minimax::endpoints::files::{FilePurpose, UploadFile};
use podcast_minimax::endpoints::image::{ImageGeneration, ImageGenerationBody};
use podcast_minimax::endpoints::t2a::{SynthesizedAudio, TextToAudio, TextToAudioBody, VoiceSetting};
use podcast_minimax::endpoints::voice_clone::{VoiceClone, VoiceCloneBody};
use podcast_minimax::{MiniMaxClient, Traced};
use tracing::debug;

use crate::config::ProviderSettings;
use crate::error::Result;

/// Operations the studio needs from a TTS / voice-cloning provider.
///
/// Implementations are cheap to clone; a clone bound to the caller's key is
/// created per request with [`SpeechProvider::with_api_key`].
pub trait SpeechProvider: Clone + Send + Sync + 'static {
    fn with_api_key(&self, api_key: &str) -> Self;

    /// Upload a voice sample, returning the provider file id.
    fn upload_voice_sample(&self, path: &Path) -> impl Future<Output = Result<Traced<i64>>> + Send;

    fn clone_voice(
        &self,
        file_id: i64,
        voice_id: &VoiceId,
    ) -> impl Future<Output = Result<Traced<()>>> + Send;

    fn synthesize(
        &self,
        text: &str,
        voice_id: &VoiceId,
    ) -> impl Future<Output = Result<Traced<SynthesizedAudio>>> + Send;

    /// Stream a chat completion as text deltas.
    fn stream_chat(
        &self,
        messages: Vec<ChatMessage>,
    ) -> impl Future<Output = Result<Traced<DeltaStream>>> + Send;

    /// Generate one image and return its hosted URL.
    fn generate_image(&self, prompt: &str) -> impl Future<Output = Result<Traced<String>>> + Send;
}

#[derive(Debug, Clone)]
pub struct MiniMaxProvider {
    client: MiniMaxClient,
    settings: ProviderSettings,
}

impl MiniMaxProvider {
    /// Build a provider with no credentials; bind a key per request with
    /// [`SpeechProvider::with_api_key`].
    pub fn new(settings: ProviderSettings) -> Result<Self> {
        let client = MiniMaxClient::new_with_config(String::new(), settings.client_config())?;
        Ok(Self { client, settings })
    }
}

impl SpeechProvider for MiniMaxProvider {
    fn with_api_key(&self, api_key: &str) -> Self {
        Self {
            client: self.client.with_api_key(api_key),
            settings: self.settings.clone(),
        }
    }

    async fn upload_voice_sample(&self, path: &Path) -> Result<Traced<i64>> {
        let resp = self
            .client
            .hit_with_trace(UploadFile::new(path, FilePurpose::VoiceClone))
            .await?;
        let file_id = resp.value.file_id()?;
        debug!(file_id, trace_id = ?resp.trace_id, "voice sample uploaded");
        Ok(Traced {
            value: file_id,
            trace_id: resp.trace_id,
        })
    }

    async fn clone_voice(&self, file_id: i64, voice_id: &VoiceId) -> Result<Traced<()>> {
        let body = VoiceCloneBody::new(file_id, voice_id.id());
        let resp = self.client.hit_with_trace(VoiceClone::new(body)).await?;
        Ok(resp.map(|_| ()))
    }

    async fn synthesize(&self, text: &str, voice_id: &VoiceId) -> Result<Traced<SynthesizedAudio>> {
        let voice = VoiceSetting::new(voice_id.id()).with_speed(self.settings.speech_speed);
        let body = TextToAudioBody::new(&self.settings.tts_model, text, voice_id.id())
            .with_voice_setting(voice);
        let mut resp = self.client.hit_with_trace(TextToAudio::new(body)).await?;
        if resp.trace_id.is_none() {
            resp.trace_id = resp.value.body_trace_id.clone();
        }
        Ok(resp)
    }

    async fn stream_chat(&self, messages: Vec<ChatMessage>) -> Result<Traced<DeltaStream>> {
        let body = ChatBody::new(&self.settings.chat_model, messages)
            .with_temperature(self.settings.script_temperature);
        Ok(self
            .client
            .hit_with_trace(ChatCompletionStream::new(body))
            .await?)
    }

    async fn generate_image(&self, prompt: &str) -> Result<Traced<String>> {
        let body = ImageGenerationBody::new(&self.settings.image_model, prompt);
        let resp = self.client.hit_with_trace(ImageGeneration::new(body)).await?;
        let url = resp.value.first_url()?.to_string();
        Ok(Traced {
            value: url,
            trace_id: resp.trace_id,
        })
    }
}
