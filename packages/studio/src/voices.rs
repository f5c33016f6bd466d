//! Speaker configuration to provider voice ids.

use std::collections::BTreeMap;
use std::path::Path;

use podcast_domain::{SessionId, SpeakerConfig, SpeakerSlot, VoiceId};
use tracing::info;

use crate::config::DefaultVoice;
use crate::error::{Result, StudioError};
use crate::provider::SpeechProvider;

/// Result of cloning one voice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClonedVoice {
    pub voice_id: VoiceId,
    pub upload_trace_id: Option<String>,
    pub clone_trace_id: Option<String>,
}

/// Voice ids for both speakers plus what to tell the caller.
#[derive(Debug, Clone)]
pub struct PreparedVoices {
    pub speaker1: VoiceId,
    pub speaker2: VoiceId,
    pub logs: Vec<String>,
    /// `(api, trace_id)` in call order, e.g. `("speaker1_upload", "...")`
    pub trace_ids: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct VoiceManager<P> {
    provider: P,
    default_voices: BTreeMap<String, DefaultVoice>,
}

impl<P: SpeechProvider> VoiceManager<P> {
    pub fn new(provider: P, default_voices: BTreeMap<String, DefaultVoice>) -> Self {
        Self {
            provider,
            default_voices,
        }
    }

    pub fn resolve_default(&self, voice_name: &str) -> Result<VoiceId> {
        self.default_voices
            .get(voice_name.trim())
            .map(|voice| VoiceId::new(&voice.voice_id))
            .ok_or_else(|| StudioError::UnknownVoice(voice_name.to_string()))
    }

    /// Upload `audio_file` and register it as a new voice for `slot`.
    pub async fn clone_voice(
        &self,
        slot: SpeakerSlot,
        audio_file: &Path,
        session: &SessionId,
    ) -> Result<ClonedVoice> {
        let voice_id = VoiceId::for_clone(slot, session);
        VoiceId::validate_custom(voice_id.id())?;

        let upload = self.provider.upload_voice_sample(audio_file).await?;
        let clone = self.provider.clone_voice(upload.value, &voice_id).await?;
        info!(speaker = %slot, voice_id = %voice_id, "voice cloned");

        Ok(ClonedVoice {
            voice_id,
            upload_trace_id: upload.trace_id,
            clone_trace_id: clone.trace_id,
        })
    }

    /// Resolve both speakers, cloning custom voices one after the other.
    pub async fn prepare_voices(
        &self,
        speaker1: &SpeakerConfig,
        speaker2: &SpeakerConfig,
        session: &SessionId,
    ) -> Result<PreparedVoices> {
        let mut logs = Vec::new();
        let mut trace_ids = Vec::new();

        let speaker1 = self
            .prepare_one(SpeakerSlot::Speaker1, speaker1, session, &mut logs, &mut trace_ids)
            .await?;
        let speaker2 = self
            .prepare_one(SpeakerSlot::Speaker2, speaker2, session, &mut logs, &mut trace_ids)
            .await?;

        Ok(PreparedVoices {
            speaker1,
            speaker2,
            logs,
            trace_ids,
        })
    }

    async fn prepare_one(
        &self,
        slot: SpeakerSlot,
        config: &SpeakerConfig,
        session: &SessionId,
        logs: &mut Vec<String>,
        trace_ids: &mut Vec<(String, String)>,
    ) -> Result<VoiceId> {
        let label = slot.script_label();
        let wrap = |source| StudioError::VoicePreparation {
            slot,
            source: Box::new(source),
        };

        match config {
            SpeakerConfig::Default { voice_name } => {
                let voice_id = self.resolve_default(voice_name).map_err(wrap)?;
                logs.push(format!("{label} uses default voice {voice_name} ({voice_id})"));
                Ok(voice_id)
            }
            SpeakerConfig::Custom { audio_file } => {
                logs.push(format!("Cloning custom voice for {label}..."));
                let cloned = self
                    .clone_voice(slot, audio_file, session)
                    .await
                    .map_err(wrap)?;
                logs.push(format!("{label} voice cloned: {}", cloned.voice_id));
                for (api, trace_id) in [
                    (slot.upload_trace_key(), cloned.upload_trace_id),
                    (slot.clone_trace_key(), cloned.clone_trace_id),
                ] {
                    if let Some(trace_id) = trace_id.filter(|t| !t.is_empty()) {
                        trace_ids.push((api, trace_id));
                    }
                }
                Ok(cloned.voice_id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_voices;
    use crate::testing::FakeProvider;

    fn manager(fake: &FakeProvider) -> VoiceManager<FakeProvider> {
        VoiceManager::new(fake.clone(), default_voices())
    }

    #[tokio::test]
    async fn default_voices_need_no_provider_calls() {
        let fake = FakeProvider::new();
        let prepared = manager(&fake)
            .prepare_voices(
                &SpeakerConfig::default_voice("mini"),
                &SpeakerConfig::default_voice("max"),
                &SessionId::generate(),
            )
            .await
            .unwrap();
        assert_eq!(prepared.speaker1.id(), "female-shaonv");
        assert_eq!(prepared.speaker2.id(), "male-qn-jingying");
        assert!(prepared.trace_ids.is_empty());
        assert_eq!(prepared.logs.len(), 2);
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn custom_voice_is_uploaded_then_cloned() {
        let fake = FakeProvider::new();
        let session = SessionId::generate();
        let prepared = manager(&fake)
            .prepare_voices(
                &SpeakerConfig::default_voice("mini"),
                &SpeakerConfig::custom("/uploads/s_speaker2_a.wav"),
                &session,
            )
            .await
            .unwrap();

        let expected = format!("podcast2{}", session.short_hex(12));
        assert_eq!(prepared.speaker2.id(), expected);
        assert_eq!(
            prepared.trace_ids,
            vec![
                ("speaker2_upload".to_string(), "trace-upload".to_string()),
                ("speaker2_clone".to_string(), "trace-clone".to_string()),
            ]
        );
        assert_eq!(
            fake.calls(),
            vec![
                "upload:/uploads/s_speaker2_a.wav".to_string(),
                format!("clone:42:{expected}"),
            ]
        );
    }

    #[tokio::test]
    async fn failures_name_the_speaker() {
        let fake = FakeProvider::new();
        fake.fail_upload();
        let err = manager(&fake)
            .prepare_voices(
                &SpeakerConfig::custom("/uploads/a.wav"),
                &SpeakerConfig::default_voice("max"),
                &SessionId::generate(),
            )
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Failed to prepare voice for Speaker1"));

        let err = manager(&fake)
            .prepare_voices(
                &SpeakerConfig::default_voice("mini"),
                &SpeakerConfig::default_voice("nobody"),
                &SessionId::generate(),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StudioError::VoicePreparation {
                slot: SpeakerSlot::Speaker2,
                ..
            }
        ));
    }
}
