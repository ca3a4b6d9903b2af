//! Backend implementations of [`crate::ContentGenerator`].

pub mod gemini;

pub use gemini::{GeminiAuth, GeminiProvider};
