//! Voice cloning from a previously uploaded sample.
use super::*;

/// Registers `voice_id` as a clone of the uploaded audio `file_id`.
///
/// See [Voice Clone API reference](https://platform.minimaxi.com/document/Voice%20Cloning)
#[derive(Clone, Debug)]
pub struct VoiceClone {
    body: VoiceCloneBody,
}

impl VoiceClone {
    pub fn new(body: VoiceCloneBody) -> Self {
        VoiceClone { body }
    }
}

impl MiniMaxEndpoint for VoiceClone {
    const PATH: &'static str = "v1/voice_clone";

    const METHOD: Method = Method::POST;

    type ResponseBody = VoiceCloneResponse;

    async fn request_body(&self) -> Result<RequestBody> {
        Ok(RequestBody::Json(serde_json::to_value(&self.body)?))
    }

    async fn response_body(self, resp: Response) -> Result<Self::ResponseBody> {
        let body: VoiceCloneResponse = resp.json().await?;
        body.base_resp.ensure_ok()?;
        Ok(body)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct VoiceCloneBody {
    pub file_id: i64,
    pub voice_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub need_noise_reduction: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub need_volume_normalization: Option<bool>,
}

impl VoiceCloneBody {
    pub fn new(file_id: i64, voice_id: impl Into<String>) -> Self {
        Self {
            file_id,
            voice_id: voice_id.into(),
            need_noise_reduction: None,
            need_volume_normalization: None,
        }
    }

    pub fn with_noise_reduction(mut self, enabled: bool) -> Self {
        self.need_noise_reduction = Some(enabled);
        self
    }

    pub fn with_volume_normalization(mut self, enabled: bool) -> Self {
        self.need_volume_normalization = Some(enabled);
        self
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct VoiceCloneResponse {
    /// Content moderation verdict on the sample, shape varies by API version.
    #[serde(default)]
    pub input_sensitive: Option<Value>,
    #[serde(default)]
    pub demo_audio: Option<String>,
    #[serde(default)]
    pub base_resp: BaseResp,
}
