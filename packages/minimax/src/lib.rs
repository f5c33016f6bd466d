//! MiniMax provider client
//!
//! Thin, typed wrapper over the MiniMax HTTP API: file upload and voice
//! cloning, text-to-audio synthesis, streaming chat completion and image
//! generation. Each API operation is a value implementing
//! [`endpoints::MiniMaxEndpoint`] and is dispatched through
//! [`MiniMaxClient::hit`] or [`MiniMaxClient::hit_with_trace`].
//!
//! # Usage
//!
//! ```no_run
//! use podcast_minimax::endpoints::t2a::{TextToAudio, TextToAudioBody};
//! use podcast_minimax::{MiniMaxClient, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = MiniMaxClient::new("your-api-key")?;
//!     let body = TextToAudioBody::new("speech-02-hd", "Hello there!", "female-shaonv");
//!     let audio = client.hit_with_trace(TextToAudio::new(body)).await?;
//!     println!("{} bytes, trace {:?}", audio.value.bytes.len(), audio.trace_id);
//!     Ok(())
//! }
//! ```

mod client;
pub mod endpoints;
mod error;

pub use client::{ClientConfig, DEFAULT_BASE_URL, MiniMaxClient, Traced, http_client_builder};
pub use error::{Error, Result};
