//! Vancix realtime voice core.
//!
//! Streams microphone PCM to a realtime speech model, plays the model's
//! speech back gaplessly, and services the device function calls the model
//! issues (dialer, SMS, schedule, contacts, clock, URLs).

pub mod config;
pub mod core;

// Re-export commonly used items for convenience
pub use config::{AppConfig, ConfigError};
pub use core::audio::{AudioError, AudioFrame, EncodedFrame, PlaybackScheduler};
pub use core::realtime::{
    GeminiConfig, GeminiLive, RealtimeTransport, SessionSetup, TransportError, TransportEvent,
};
pub use core::session::{Session, SessionError, SessionHandle, SessionState};
pub use core::tools::{ToolCall, ToolDispatcher, ToolResult};
