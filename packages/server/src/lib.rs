//! # Podcast Server
//!
//! Axum front end for [`podcast_studio`]. Routes accept form uploads and
//! JSON, stream generation progress as Server-Sent Events and serve the
//! generated files back.

pub mod cli;
pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
