//! Streaming chat completion (`chatcompletion_v2`).
//!
//! The provider answers with Server-Sent Events whose `data:` payloads carry
//! `choices[].delta.content` fragments and end with `data: [DONE]`. The final
//! chunk repeats the whole message under `choices[].message`; only deltas are
//! forwarded so the text is never duplicated.

use super::*;
use async_stream::stream;
use futures_util::{Stream, StreamExt, pin_mut};
use std::pin::Pin;

/// Text fragments of the assistant reply, in order.
pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// See [ChatCompletion v2 API reference](https://platform.minimaxi.com/document/ChatCompletion%20v2)
#[derive(Clone, Debug)]
pub struct ChatCompletionStream {
    body: ChatBody,
}

impl ChatCompletionStream {
    pub fn new(body: ChatBody) -> Self {
        ChatCompletionStream {
            body: ChatBody {
                stream: true,
                ..body
            },
        }
    }
}

impl MiniMaxEndpoint for ChatCompletionStream {
    const PATH: &'static str = "v1/text/chatcompletion_v2";

    const METHOD: Method = Method::POST;

    type ResponseBody = DeltaStream;

    async fn request_body(&self) -> Result<RequestBody> {
        Ok(RequestBody::Json(serde_json::to_value(&self.body)?))
    }

    async fn response_body(self, resp: Response) -> Result<Self::ResponseBody> {
        Ok(Box::pin(delta_stream(resp.bytes_stream())))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ChatBody {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ChatBody {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            stream: false,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

#[derive(Debug, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    base_resp: Option<BaseResp>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Option<ChunkDelta>,
}

#[derive(Debug, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Accumulates raw bytes and hands out complete lines.
#[derive(Debug, Default)]
struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            lines.push(decode_line(&line));
        }
        lines
    }

    fn finish(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.buf);
        Some(decode_line(&line))
    }
}

fn decode_line(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim_end_matches(['\r', '\n'])
        .to_string()
}

#[derive(Debug)]
enum LineEvent {
    Skip,
    Delta(String),
    Done,
    Failed(Error),
}

fn parse_line(line: &str) -> LineEvent {
    let line = line.trim();
    let payload = match line.strip_prefix("data:") {
        Some(payload) => payload.trim(),
        // Error responses can arrive as a bare JSON body even in stream mode
        None if line.starts_with('{') => line,
        None => return LineEvent::Skip,
    };
    if payload == "[DONE]" {
        return LineEvent::Done;
    }
    if payload.is_empty() {
        return LineEvent::Skip;
    }

    let chunk: ChatChunk = match serde_json::from_str(payload) {
        Ok(chunk) => chunk,
        Err(_) => return LineEvent::Failed(Error::MalformedChunk(payload.to_string())),
    };
    if let Some(base_resp) = &chunk.base_resp
        && let Err(err) = base_resp.ensure_ok()
    {
        return LineEvent::Failed(err);
    }

    let text: String = chunk
        .choices
        .into_iter()
        .filter_map(|choice| choice.delta.and_then(|delta| delta.content))
        .collect();
    if text.is_empty() {
        LineEvent::Skip
    } else {
        LineEvent::Delta(text)
    }
}

pub(crate) fn delta_stream<S, E>(bytes: S) -> impl Stream<Item = Result<String>> + Send + 'static
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
    E: Into<Error> + Send + 'static,
{
    stream! {
        pin_mut!(bytes);
        let mut lines = LineBuffer::default();
        let mut finished = false;

        while !finished {
            let chunk = match bytes.next().await {
                Some(Ok(chunk)) => chunk,
                Some(Err(err)) => {
                    yield Err(err.into());
                    return;
                }
                None => break,
            };

            for line in lines.push(&chunk) {
                match parse_line(&line) {
                    LineEvent::Skip => {}
                    LineEvent::Delta(text) => yield Ok(text),
                    LineEvent::Done => {
                        finished = true;
                        break;
                    }
                    LineEvent::Failed(err) => {
                        yield Err(err);
                        return;
                    }
                }
            }
        }

        let tail = if finished { None } else { lines.finish() };
        if let Some(line) = tail {
            match parse_line(&line) {
                LineEvent::Delta(text) => yield Ok(text),
                LineEvent::Failed(err) => yield Err(err),
                LineEvent::Skip | LineEvent::Done => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    async fn collect(chunks: Vec<&'static str>) -> Vec<Result<String>> {
        let source = stream::iter(
            chunks
                .into_iter()
                .map(|c| Ok::<Bytes, Error>(Bytes::from_static(c.as_bytes()))),
        );
        delta_stream(source).collect().await
    }

    #[tokio::test]
    async fn yields_deltas_until_done() {
        let out = collect(vec![
            "data: {\"choices\":[{\"delta\":{\"content\":\"Speaker1: Hel\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n",
            "data: {\"choices\":[{\"message\":{\"content\":\"Speaker1: Hello\"}}]}\n\n",
            "data: [DONE]\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"ignored\"}}]}\n\n",
        ])
        .await;
        let texts: Vec<String> = out.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(texts, vec!["Speaker1: Hel", "lo"]);
    }

    #[tokio::test]
    async fn reassembles_lines_split_across_chunks() {
        let out = collect(vec![
            "data: {\"choices\":[{\"del",
            "ta\":{\"content\":\"你好\"}}]}\r\n",
        ])
        .await;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].as_ref().unwrap(), "你好");
    }

    #[tokio::test]
    async fn surfaces_api_errors_in_stream() {
        let out = collect(vec![
            "{\"base_resp\":{\"status_code\":1008,\"status_msg\":\"insufficient balance\"}}",
        ])
        .await;
        assert_eq!(out.len(), 1);
        assert!(matches!(
            &out[0],
            Err(Error::ApiError { status_code: 1008, .. })
        ));
    }

    #[tokio::test]
    async fn malformed_payload_stops_stream() {
        let out = collect(vec!["data: {not json}\n", "data: [DONE]\n"]).await;
        assert_eq!(out.len(), 1);
        assert!(matches!(&out[0], Err(Error::MalformedChunk(_))));
    }

    #[test]
    fn constructor_forces_streaming() {
        let endpoint = ChatCompletionStream::new(ChatBody::new("MiniMax-M1", vec![ChatMessage::user("hi")]));
        assert!(endpoint.body.stream);
        let value = serde_json::to_value(&endpoint.body).unwrap();
        assert_eq!(value["messages"][0]["role"], "user");
        assert!(value.get("temperature").is_none());
    }
}
