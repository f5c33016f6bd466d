//! File upload, the first half of voice cloning.
use super::*;
use std::path::{Path, PathBuf};

/// Why a file is uploaded; the provider validates the content accordingly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilePurpose {
    VoiceClone,
}

impl FilePurpose {
    pub fn as_str(self) -> &'static str {
        match self {
            FilePurpose::VoiceClone => "voice_clone",
        }
    }
}

/// Uploads a local file. The file is read when the request is sent, not
/// when the endpoint is built.
///
/// See [File Upload API reference](https://platform.minimaxi.com/document/file)
#[derive(Clone, Debug)]
pub struct UploadFile {
    path: PathBuf,
    purpose: FilePurpose,
}

impl UploadFile {
    pub fn new(path: impl Into<PathBuf>, purpose: FilePurpose) -> Self {
        UploadFile {
            path: path.into(),
            purpose,
        }
    }
}

impl MiniMaxEndpoint for UploadFile {
    const PATH: &'static str = "v1/files/upload";

    const METHOD: Method = Method::POST;

    type ResponseBody = UploadFileResponse;

    async fn request_body(&self) -> Result<RequestBody> {
        let data = tokio::fs::read(&self.path).await?;
        let file_name = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload.bin")
            .to_string();
        let mime = mime_for_extension(&self.path);

        let part = Part::bytes(data).file_name(file_name).mime_str(mime)?;
        let form = Form::new()
            .text("purpose", self.purpose.as_str())
            .part("file", part);
        Ok(RequestBody::Multipart(form))
    }

    async fn response_body(self, resp: Response) -> Result<Self::ResponseBody> {
        let body: UploadFileResponse = resp.json().await?;
        body.base_resp.ensure_ok()?;
        Ok(body)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct UploadFileResponse {
    pub file: Option<FileObject>,
    #[serde(default)]
    pub base_resp: BaseResp,
}

impl UploadFileResponse {
    pub fn file_id(&self) -> Result<i64> {
        self.file
            .as_ref()
            .map(|f| f.file_id)
            .ok_or(Error::MissingField("file.file_id"))
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct FileObject {
    pub file_id: i64,
    #[serde(default)]
    pub bytes: Option<u64>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub purpose: Option<String>,
}

fn mime_for_extension(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|s| s.to_ascii_lowercase());
    match ext.as_deref() {
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("m4a") => "audio/mp4",
        Some("flac") => "audio/flac",
        Some("ogg") => "audio/ogg",
        _ => "application/octet-stream",
    }
}
