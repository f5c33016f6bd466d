pub(crate) use crate::error::{Error, Result};
pub(crate) use bytes::Bytes;
pub(crate) use reqwest::{
    Method, Response, Url,
    multipart::{Form, Part},
};
pub(crate) use serde::{Deserialize, Serialize};
pub(crate) use serde_json::Value;

pub mod chat;
pub mod files;
pub mod image;
pub mod t2a;
pub mod voice_clone;

#[derive(Debug)]
pub enum RequestBody {
    Json(Value),
    Multipart(Form),
    Empty,
}

#[allow(async_fn_in_trait)]
pub trait MiniMaxEndpoint {
    /// Path relative to the client's base URL, without a leading slash.
    const PATH: &'static str;

    const METHOD: Method;

    type ResponseBody;

    async fn request_body(&self) -> Result<RequestBody> {
        Ok(RequestBody::Empty)
    }

    async fn response_body(self, resp: Response) -> Result<Self::ResponseBody>;

    fn url(&self, base_url: &Url) -> Result<Url> {
        Ok(base_url.join(Self::PATH)?)
    }
}

/// Status envelope present in every MiniMax JSON response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseResp {
    #[serde(default)]
    pub status_code: i64,
    #[serde(default)]
    pub status_msg: String,
}

impl BaseResp {
    pub fn ensure_ok(&self) -> Result<()> {
        if self.status_code == 0 {
            Ok(())
        } else {
            Err(Error::ApiError {
                status_code: self.status_code,
                status_msg: self.status_msg.clone(),
                trace_id: None,
            })
        }
    }
}
