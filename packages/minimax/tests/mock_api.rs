use axum::extract::{Multipart, Query};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use futures_util::StreamExt;
use podcast_minimax::endpoints::chat::{ChatBody, ChatCompletionStream, ChatMessage};
use podcast_minimax::endpoints::files::{FilePurpose, UploadFile};
use podcast_minimax::endpoints::image::{ImageGeneration, ImageGenerationBody};
use podcast_minimax::endpoints::t2a::{TextToAudio, TextToAudioBody};
use podcast_minimax::endpoints::voice_clone::{VoiceClone, VoiceCloneBody};
use podcast_minimax::{ClientConfig, Error, MiniMaxClient};
use serde_json::{Value, json};
use std::collections::HashMap;

const KEY: &str = "test-key";

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {KEY}"))
}

fn traced(trace: &str, body: Value) -> impl IntoResponse {
    ([("Trace-Id", trace.to_string())], Json(body))
}

async fn upload(headers: HeaderMap, mut form: Multipart) -> impl IntoResponse {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, "bad key").into_response();
    }
    let mut purpose = String::new();
    let mut size = 0usize;
    let mut filename = String::new();
    while let Ok(Some(field)) = form.next_field().await {
        match field.name() {
            Some("purpose") => purpose = field.text().await.unwrap_or_default(),
            Some("file") => {
                filename = field.file_name().unwrap_or_default().to_string();
                size = field.bytes().await.map(|b| b.len()).unwrap_or(0);
            }
            _ => {}
        }
    }
    traced(
        "trace-upload",
        json!({
            "file": {"file_id": 9001, "bytes": size, "filename": filename, "purpose": purpose},
            "base_resp": {"status_code": 0, "status_msg": "success"}
        }),
    )
    .into_response()
}

async fn clone_voice(Json(body): Json<Value>) -> impl IntoResponse {
    if body["voice_id"] == "taken" {
        return traced(
            "trace-clone-fail",
            json!({"base_resp": {"status_code": 2038, "status_msg": "voice id already exists"}}),
        );
    }
    traced(
        "trace-clone",
        json!({"input_sensitive": false, "base_resp": {"status_code": 0, "status_msg": "success"}}),
    )
}

async fn t2a(headers: HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
    if !authorized(&headers) {
        return (
            StatusCode::UNAUTHORIZED,
            [("Trace-Id", "trace-denied")],
            "invalid api key",
        )
            .into_response();
    }
    let text = body["text"].as_str().unwrap_or_default();
    traced(
        "trace-t2a",
        json!({
            "data": {"audio": hex_of(text.as_bytes()), "status": 2},
            "extra_info": {"audio_length": 1200},
            "base_resp": {"status_code": 0, "status_msg": "success"}
        }),
    )
    .into_response()
}

async fn chat(Query(query): Query<HashMap<String, String>>, Json(body): Json<Value>) -> impl IntoResponse {
    assert_eq!(body["stream"], true);
    assert_eq!(query.get("GroupId").map(String::as_str), Some("group-7"));
    let events = concat!(
        "data: {\"choices\":[{\"delta\":{\"content\":\"Speaker1: Welcome\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\" back.\\nSpeaker2: Thanks!\"}}]}\n\n",
        "data: {\"choices\":[{\"message\":{\"content\":\"full text\"}}],\"base_resp\":{\"status_code\":0,\"status_msg\":\"\"}}\n\n",
        "data: [DONE]\n\n",
    );
    (
        [
            (header::CONTENT_TYPE.as_str(), "text/event-stream"),
            ("Trace-Id", "trace-chat"),
        ],
        events,
    )
}

async fn image(Json(body): Json<Value>) -> impl IntoResponse {
    assert_eq!(body["response_format"], "url");
    traced(
        "trace-image",
        json!({
            "id": "img-1",
            "data": {"image_urls": ["https://cdn.example.com/cover.jpeg"]},
            "base_resp": {"status_code": 0, "status_msg": "success"}
        }),
    )
}

fn hex_of(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

async fn spawn_mock() -> String {
    let app = Router::new()
        .route("/v1/files/upload", post(upload))
        .route("/v1/voice_clone", post(clone_voice))
        .route("/v1/t2a_v2", post(t2a))
        .route("/v1/text/chatcompletion_v2", post(chat))
        .route("/v1/image_generation", post(image));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn client() -> MiniMaxClient {
    let config = ClientConfig {
        base_url: spawn_mock().await,
        group_id: Some("group-7".into()),
        ..ClientConfig::default()
    };
    MiniMaxClient::new_with_config(KEY, config).unwrap()
}

#[tokio::test]
async fn upload_sends_multipart_and_returns_file_id() {
    let client = client().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sample.wav");
    std::fs::write(&path, b"RIFF0000WAVE").unwrap();

    let resp = client
        .hit_with_trace(UploadFile::new(&path, FilePurpose::VoiceClone))
        .await
        .unwrap();
    assert_eq!(resp.trace_id.as_deref(), Some("trace-upload"));
    assert_eq!(resp.value.file_id().unwrap(), 9001);
    let file = resp.value.file.unwrap();
    assert_eq!(file.bytes, Some(12));
    assert_eq!(file.filename.as_deref(), Some("sample.wav"));
    assert_eq!(file.purpose.as_deref(), Some("voice_clone"));
}

#[tokio::test]
async fn voice_clone_error_carries_header_trace_id() {
    let client = client().await;

    let ok = client
        .hit_with_trace(VoiceClone::new(VoiceCloneBody::new(9001, "podcast1abc")))
        .await
        .unwrap();
    assert_eq!(ok.trace_id.as_deref(), Some("trace-clone"));

    let err = client
        .hit(VoiceClone::new(VoiceCloneBody::new(9001, "taken")))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ApiError { status_code: 2038, .. }));
    assert_eq!(err.trace_id(), Some("trace-clone-fail"));
}

#[tokio::test]
async fn synthesis_decodes_audio() {
    let client = client().await;
    let body = TextToAudioBody::new("speech-02-hd", "hello", "female-shaonv");
    let audio = client.hit_with_trace(TextToAudio::new(body)).await.unwrap();
    assert_eq!(audio.trace_id.as_deref(), Some("trace-t2a"));
    assert_eq!(&audio.value.bytes[..], b"hello");
    assert_eq!(audio.value.duration_ms, 1200);
}

#[tokio::test]
async fn http_failure_keeps_status_body_and_trace() {
    let client = client().await.with_api_key("wrong");
    let body = TextToAudioBody::new("speech-02-hd", "hello", "female-shaonv");
    let err = client.hit(TextToAudio::new(body)).await.unwrap_err();
    match &err {
        Error::HttpError { status, body, .. } => {
            assert_eq!(*status, 401);
            assert_eq!(body, "invalid api key");
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(err.trace_id(), Some("trace-denied"));
}

#[tokio::test]
async fn chat_stream_yields_only_deltas() {
    let client = client().await;
    let body = ChatBody::new(
        "MiniMax-M1",
        vec![ChatMessage::system("write a dialogue"), ChatMessage::user("topic")],
    );
    let resp = client
        .hit_with_trace(ChatCompletionStream::new(body))
        .await
        .unwrap();
    assert_eq!(resp.trace_id.as_deref(), Some("trace-chat"));

    let parts: Vec<String> = resp
        .value
        .map(|delta| delta.unwrap())
        .collect()
        .await;
    assert_eq!(parts.concat(), "Speaker1: Welcome back.\nSpeaker2: Thanks!");
}

#[tokio::test]
async fn image_generation_returns_url() {
    let client = client().await;
    let resp = client
        .hit(ImageGeneration::new(ImageGenerationBody::new("image-01", "studio mic")))
        .await
        .unwrap();
    assert_eq!(resp.first_url().unwrap(), "https://cdn.example.com/cover.jpeg");
}
