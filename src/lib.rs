//! A small Gemini client with tutoring helpers for Singapore O-Level students.
//!
//! The library wraps the Gemini `generateContent` API (Google AI Studio or
//! Vertex AI) behind a model handle and in-memory chat sessions, and carries
//! the subject prompts and HTML formatting used by the tutor.

pub mod accumulator;
pub mod app;
pub mod chat;
pub mod error;
pub mod model;
pub mod provider;
pub mod providers;
pub mod response;
pub mod sse_stream;
pub mod tutor;
pub mod types;

// Re-export core types for easy usage
pub use chat::ChatSession;
pub use error::Error;
pub use model::{GenerativeModel, ModelName};
pub use provider::ContentGenerator;
pub use providers::*;
pub use response::*;
pub use sse_stream::SseEvent;
pub use types::*;
