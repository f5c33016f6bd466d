//! Text to audio synthesis (`t2a_v2`), non-streaming.
use super::*;

/// Synthesizes `text` with one voice and returns the decoded audio.
///
/// See [T2A v2 API reference](https://platform.minimaxi.com/document/T2A%20V2)
#[derive(Clone, Debug)]
pub struct TextToAudio {
    body: TextToAudioBody,
}

impl TextToAudio {
    pub fn new(body: TextToAudioBody) -> Self {
        TextToAudio { body }
    }
}

impl MiniMaxEndpoint for TextToAudio {
    const PATH: &'static str = "v1/t2a_v2";

    const METHOD: Method = Method::POST;

    type ResponseBody = SynthesizedAudio;

    async fn request_body(&self) -> Result<RequestBody> {
        Ok(RequestBody::Json(serde_json::to_value(&self.body)?))
    }

    async fn response_body(self, resp: Response) -> Result<Self::ResponseBody> {
        let body: TextToAudioResponse = resp.json().await?;
        body.base_resp.ensure_ok()?;
        body.into_audio(self.body.audio_setting.format)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct TextToAudioBody {
    pub model: String,
    pub text: String,
    pub stream: bool,
    pub voice_setting: VoiceSetting,
    pub audio_setting: AudioSetting,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_boost: Option<String>,
}

impl TextToAudioBody {
    pub fn new(model: impl Into<String>, text: impl Into<String>, voice_id: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            text: text.into(),
            stream: false,
            voice_setting: VoiceSetting::new(voice_id),
            audio_setting: AudioSetting::default(),
            language_boost: None,
        }
    }

    pub fn with_voice_setting(mut self, voice_setting: VoiceSetting) -> Self {
        self.voice_setting = voice_setting;
        self
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct VoiceSetting {
    pub voice_id: String,
    pub speed: f32,
    pub vol: f32,
    pub pitch: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emotion: Option<String>,
}

impl VoiceSetting {
    pub fn new(voice_id: impl Into<String>) -> Self {
        Self {
            voice_id: voice_id.into(),
            speed: 1.0,
            vol: 1.0,
            pitch: 0,
            emotion: None,
        }
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Mp3,
    Wav,
    Flac,
    Pcm,
}

#[derive(Clone, Debug, Serialize)]
pub struct AudioSetting {
    pub sample_rate: u32,
    pub bitrate: u32,
    pub format: AudioFormat,
    pub channel: u8,
}

impl Default for AudioSetting {
    fn default() -> Self {
        Self {
            sample_rate: 32_000,
            bitrate: 128_000,
            format: AudioFormat::Mp3,
            channel: 1,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct TextToAudioResponse {
    #[serde(default)]
    pub data: Option<AudioData>,
    #[serde(default)]
    pub extra_info: Option<ExtraInfo>,
    #[serde(default)]
    pub trace_id: Option<String>,
    #[serde(default)]
    pub base_resp: BaseResp,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AudioData {
    /// Hex-encoded audio bytes.
    #[serde(default)]
    pub audio: String,
    #[serde(default)]
    pub status: Option<i64>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ExtraInfo {
    /// Duration in milliseconds.
    #[serde(default)]
    pub audio_length: u64,
    #[serde(default)]
    pub audio_sample_rate: Option<u32>,
    #[serde(default)]
    pub audio_size: Option<u64>,
    #[serde(default)]
    pub usage_characters: Option<u64>,
}

/// Decoded result of a synthesis call.
#[derive(Clone, Debug)]
pub struct SynthesizedAudio {
    pub bytes: Bytes,
    pub duration_ms: u64,
    pub format: AudioFormat,
    /// Trace id echoed in the response body, when the provider includes one.
    pub body_trace_id: Option<String>,
}

impl TextToAudioResponse {
    pub fn into_audio(self, format: AudioFormat) -> Result<SynthesizedAudio> {
        let data = self.data.ok_or(Error::MissingField("data.audio"))?;
        if data.audio.is_empty() {
            return Err(Error::MissingField("data.audio"));
        }
        let bytes = hex::decode(data.audio.trim())?;
        Ok(SynthesizedAudio {
            bytes: Bytes::from(bytes),
            duration_ms: self.extra_info.map(|info| info.audio_length).unwrap_or(0),
            format,
            body_trace_id: self.trace_id,
        })
    }
}
