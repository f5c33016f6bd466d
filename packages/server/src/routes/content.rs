//! `POST /api/parse-content`: parse and merge inputs without generating.

use axum::Json;
use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::header::CONTENT_TYPE;
use podcast_studio::SpeechProvider;
use podcast_studio::storage::{PDF_EXTENSIONS, accepted_upload_name};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ApiError, Result};
use crate::routes::form::FormData;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ParseContentBody {
    pub text_input: String,
    pub url_input: String,
}

#[derive(Debug, Serialize)]
pub struct ParseContentResponse {
    pub success: bool,
    pub content: String,
    pub message: String,
}

pub async fn parse_content<P: SpeechProvider>(
    State(state): State<AppState<P>>,
    request: Request,
) -> Result<Json<ParseContentResponse>> {
    let is_multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"));

    let (body, pdf_path) = if is_multipart {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
        let form = FormData::collect(multipart).await?;
        let body = ParseContentBody {
            text_input: form.text("text_input"),
            url_input: form.text("url_input"),
        };
        let pdf_path = match form.file("file") {
            Some(file) => {
                let name = accepted_upload_name(&file.file_name, PDF_EXTENSIONS)
                    .ok_or_else(|| {
                        ApiError::InvalidRequest("Only PDF files are supported".to_string())
                    })?;
                let stored = format!("{}_{name}", chrono::Utc::now().timestamp());
                Some(state.studio.storage().save_upload(&stored, &file.data).await?)
            }
            None => None,
        };
        (body, pdf_path)
    } else {
        let Json(body) = Json::<ParseContentBody>::from_request(request, &state)
            .await
            .map_err(|e| ApiError::InvalidRequest(format!("Invalid request body: {e}")))?;
        (body, None)
    };

    info!(
        text_chars = body.text_input.chars().count(),
        url = %body.url_input,
        pdf = pdf_path.is_some(),
        "parse-content request"
    );
    let parsed = state
        .studio
        .parse_content(&body.text_input, &body.url_input, pdf_path.as_deref())
        .await?;

    Ok(Json(ParseContentResponse {
        success: true,
        content: parsed.content.into_string(),
        message: parsed.message,
    }))
}
