//! Provider-independent realtime transport contract.
//!
//! The session layer talks to the speech model exclusively through
//! [`RealtimeTransport`] and the [`TransportEvent`] stream it yields, so the
//! orchestrator is testable against a scripted transport and a second
//! provider can be slotted in without touching session logic.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::core::audio::codec::EncodedFrame;
use crate::core::session::feed::GroundingLink;
use crate::core::tools::declarations::FunctionDeclaration;
use crate::core::tools::dispatcher::{ToolCall, ToolResult};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("websocket error: {0}")]
    WebSocketError(String),

    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("provider error: {0}")]
    ProviderError(String),

    #[error("not connected")]
    NotConnected,

    #[error("outbound queue full")]
    QueueFull,
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        TransportError::SerializationError(err.to_string())
    }
}

pub type TransportResult<T> = Result<T, TransportError>;

// ============================================================================
// Session Setup
// ============================================================================

/// Everything the provider needs to open a model session.
#[derive(Debug, Clone)]
pub struct SessionSetup {
    /// Prebuilt voice the model speaks with.
    pub voice: String,
    /// Persona and behavioral instructions.
    pub system_instruction: String,
    /// Functions the model may call.
    pub tools: Vec<FunctionDeclaration>,
    /// Whether the provider's web-search grounding tool is enabled.
    pub enable_search: bool,
}

// ============================================================================
// Transport Events
// ============================================================================

/// Inbound events from the model, delivered on a single channel so the
/// session consumes them from one place in arrival order.
#[derive(Debug)]
pub enum TransportEvent {
    /// Setup handshake completed; the session is live.
    Opened,
    /// The model requests an ordered batch of function calls.
    ToolCall(Vec<ToolCall>),
    /// One chunk of raw PCM model speech, already base64-decoded.
    Audio(Bytes),
    /// Web sources the model grounded its answer on.
    Grounding(Vec<GroundingLink>),
    /// The provider closed the connection cleanly.
    Closed,
    /// The connection failed; no further events follow.
    Failed(TransportError),
}

// ============================================================================
// Transport Trait
// ============================================================================

/// Bidirectional realtime connection to a speech model provider.
#[async_trait]
pub trait RealtimeTransport: Send + Sync {
    /// Open the connection, perform the setup handshake in the background,
    /// and return the inbound event stream. `TransportEvent::Opened` arrives
    /// on the stream once the handshake completes.
    async fn connect(&mut self, setup: SessionSetup)
        -> TransportResult<mpsc::Receiver<TransportEvent>>;

    /// Queue one microphone frame for delivery. Non-blocking: if the
    /// outbound queue is full the frame is rejected with
    /// [`TransportError::QueueFull`] and the caller drops it, keeping
    /// capture real-time instead of backing up.
    fn try_send_audio(&self, frame: EncodedFrame) -> TransportResult<()>;

    /// Submit the results for a previously received tool-call batch.
    async fn send_tool_results(&self, results: Vec<ToolResult>) -> TransportResult<()>;

    /// Close the connection and stop the reader task.
    async fn close(&mut self) -> TransportResult<()>;
}
