//! Realtime speech-model transports.

pub mod base;
pub mod gemini;

pub use base::{
    RealtimeTransport, SessionSetup, TransportError, TransportEvent, TransportResult,
};
pub use gemini::{GeminiConfig, GeminiLive};
