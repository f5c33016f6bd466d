//! Text to image, used for podcast cover art.
use super::*;

/// See [Image Generation API reference](https://platform.minimaxi.com/document/image_generation)
#[derive(Clone, Debug)]
pub struct ImageGeneration {
    body: ImageGenerationBody,
}

impl ImageGeneration {
    pub fn new(body: ImageGenerationBody) -> Self {
        ImageGeneration { body }
    }
}

impl MiniMaxEndpoint for ImageGeneration {
    const PATH: &'static str = "v1/image_generation";

    const METHOD: Method = Method::POST;

    type ResponseBody = ImageGenerationResponse;

    async fn request_body(&self) -> Result<RequestBody> {
        Ok(RequestBody::Json(serde_json::to_value(&self.body)?))
    }

    async fn response_body(self, resp: Response) -> Result<Self::ResponseBody> {
        let body: ImageGenerationResponse = resp.json().await?;
        body.base_resp.ensure_ok()?;
        Ok(body)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ImageGenerationBody {
    pub model: String,
    pub prompt: String,
    pub aspect_ratio: String,
    pub response_format: String,
    pub n: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_optimizer: Option<bool>,
}

impl ImageGenerationBody {
    /// One square image, returned as a hosted URL.
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            aspect_ratio: "1:1".to_string(),
            response_format: "url".to_string(),
            n: 1,
            prompt_optimizer: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ImageGenerationResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub data: Option<ImageData>,
    #[serde(default)]
    pub base_resp: BaseResp,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ImageData {
    #[serde(default)]
    pub image_urls: Vec<String>,
}

impl ImageGenerationResponse {
    pub fn first_url(&self) -> Result<&str> {
        self.data
            .as_ref()
            .and_then(|data| data.image_urls.first())
            .map(String::as_str)
            .ok_or(Error::MissingField("data.image_urls"))
    }
}
