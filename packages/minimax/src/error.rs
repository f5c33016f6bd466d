use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("reqwest error: {0}")]
    ReqwestError(#[from] reqwest::Error),
    #[error("serde error: {0}")]
    SerdeError(#[from] serde_json::Error),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("invalid url: {0}")]
    UrlError(#[from] url::ParseError),
    #[error("http error {status}: {body}")]
    HttpError {
        status: u16,
        body: String,
        trace_id: Option<String>,
    },
    #[error("api error {status_code}: {status_msg}")]
    ApiError {
        status_code: i64,
        status_msg: String,
        trace_id: Option<String>,
    },
    #[error("request must have a body")]
    MissingRequestBody,
    #[error("response field missing: {0}")]
    MissingField(&'static str),
    #[error("audio payload is not valid hex: {0}")]
    InvalidAudioHex(#[from] hex::FromHexError),
    #[error("malformed stream chunk: {0}")]
    MalformedChunk(String),
}

impl Error {
    /// Trace id reported by the provider for the failed call, if any.
    pub fn trace_id(&self) -> Option<&str> {
        match self {
            Error::HttpError { trace_id, .. } | Error::ApiError { trace_id, .. } => {
                trace_id.as_deref()
            }
            _ => None,
        }
    }

    pub(crate) fn with_trace_id(self, header_trace: Option<String>) -> Self {
        match self {
            Error::ApiError {
                status_code,
                status_msg,
                trace_id: None,
            } => Error::ApiError {
                status_code,
                status_msg,
                trace_id: header_trace,
            },
            other => other,
        }
    }
}
