//! In-memory [`SpeechProvider`] for tests.

use std::path::Path;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use futures_util::stream;
use podcast_domain::VoiceId;
use podcast_minimax::endpoints::chat::{ChatMessage, DeltaStream};
use podcast_minimax::endpoints::t2a::{AudioFormat, SynthesizedAudio};
use podcast_minimax::{Error as ProviderError, Traced};

use crate::error::Result;
use crate::provider::SpeechProvider;

/// Scripted provider. Every call is recorded; failures can be switched on
/// per operation.
#[derive(Debug, Clone, Default)]
pub struct FakeProvider {
    inner: Arc<FakeState>,
}

#[derive(Debug, Default)]
struct FakeState {
    script_chunks: Mutex<Vec<String>>,
    fail_upload: Mutex<bool>,
    fail_image: Mutex<bool>,
    fail_tts_at: Mutex<Option<usize>>,
    calls: Mutex<Vec<String>>,
    api_keys: Mutex<Vec<String>>,
}

fn api_error(msg: &str) -> ProviderError {
    ProviderError::ApiError {
        status_code: 1004,
        status_msg: msg.to_string(),
        trace_id: Some("fake-trace-error".to_string()),
    }
}

impl FakeProvider {
    pub fn new() -> Self {
        let fake = Self::default();
        fake.set_script(&[
            "Speaker1: Welcome to the show.\n",
            "Speaker2: Glad to be here.\nSpeaker1: Let's dig in.\n",
        ]);
        fake
    }

    /// Text deltas returned by the next chat completion.
    pub fn set_script(&self, chunks: &[&str]) {
        *lock(&self.inner.script_chunks) = chunks.iter().map(|c| c.to_string()).collect();
    }

    pub fn fail_upload(&self) {
        *lock(&self.inner.fail_upload) = true;
    }

    pub fn fail_image(&self) {
        *lock(&self.inner.fail_image) = true;
    }

    /// Fail synthesis of the line at `index` (zero-based call count).
    pub fn fail_tts_at(&self, index: usize) {
        *lock(&self.inner.fail_tts_at) = Some(index);
    }

    /// Calls made so far, as `operation:detail` strings.
    pub fn calls(&self) -> Vec<String> {
        lock(&self.inner.calls).clone()
    }

    /// Keys bound through [`SpeechProvider::with_api_key`], in order.
    pub fn api_keys(&self) -> Vec<String> {
        lock(&self.inner.api_keys).clone()
    }

    fn record(&self, call: String) {
        lock(&self.inner.calls).push(call);
    }

    fn tts_calls(&self) -> usize {
        lock(&self.inner.calls)
            .iter()
            .filter(|c| c.starts_with("tts:"))
            .count()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SpeechProvider for FakeProvider {
    fn with_api_key(&self, api_key: &str) -> Self {
        lock(&self.inner.api_keys).push(api_key.to_string());
        Self {
            inner: Arc::clone(&self.inner),
        }
    }

    async fn upload_voice_sample(&self, path: &Path) -> Result<Traced<i64>> {
        self.record(format!("upload:{}", path.display()));
        if *lock(&self.inner.fail_upload) {
            return Err(api_error("upload rejected").into());
        }
        Ok(Traced {
            value: 42,
            trace_id: Some("trace-upload".to_string()),
        })
    }

    async fn clone_voice(&self, file_id: i64, voice_id: &VoiceId) -> Result<Traced<()>> {
        self.record(format!("clone:{file_id}:{voice_id}"));
        Ok(Traced {
            value: (),
            trace_id: Some("trace-clone".to_string()),
        })
    }

    async fn synthesize(&self, text: &str, voice_id: &VoiceId) -> Result<Traced<SynthesizedAudio>> {
        let index = self.tts_calls();
        self.record(format!("tts:{voice_id}:{text}"));
        if *lock(&self.inner.fail_tts_at) == Some(index) {
            return Err(api_error("tts quota exceeded").into());
        }
        Ok(Traced {
            value: SynthesizedAudio {
                bytes: Bytes::from(format!("[{voice_id}]")),
                duration_ms: 1000,
                format: AudioFormat::Mp3,
                body_trace_id: None,
            },
            trace_id: Some(format!("trace-tts-{index}")),
        })
    }

    async fn stream_chat(&self, messages: Vec<ChatMessage>) -> Result<Traced<DeltaStream>> {
        self.record(format!("chat:{}", messages.len()));
        let chunks: Vec<podcast_minimax::Result<String>> =
            lock(&self.inner.script_chunks).iter().cloned().map(Ok).collect();
        let stream: DeltaStream = Box::pin(stream::iter(chunks));
        Ok(Traced {
            value: stream,
            trace_id: Some("trace-script".to_string()),
        })
    }

    async fn generate_image(&self, prompt: &str) -> Result<Traced<String>> {
        self.record(format!("image:{}", prompt.chars().count()));
        if *lock(&self.inner.fail_image) {
            return Err(api_error("image filtered").into());
        }
        Ok(Traced {
            value: "https://cdn.example.com/cover.jpeg".to_string(),
            trace_id: Some("trace-cover".to_string()),
        })
    }
}

/// A one-page PDF whose text layer is `text`, set in Helvetica.
/// `text` must not contain parentheses or backslashes.
pub fn minimal_pdf(text: &str) -> Vec<u8> {
    let stream = format!("BT /F1 18 Tf 72 720 Td ({text}) Tj ET");
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R \
         /Resources << /Font << /F1 5 0 R >> >> >>"
            .to_string(),
        format!("<< /Length {} >>\nstream\n{stream}\nendstream", stream.len()),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
    ];

    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
    }
    let xref_at = pdf.len();
    pdf.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
    for offset in offsets {
        pdf.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    pdf.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
            objects.len() + 1
        )
        .as_bytes(),
    );
    pdf
}
