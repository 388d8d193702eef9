//! Gemini Live provider.

pub mod client;
pub mod config;
pub mod messages;

pub use client::GeminiLive;
pub use config::{GeminiConfig, DEFAULT_MODEL, DEFAULT_VOICE};
