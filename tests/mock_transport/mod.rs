//! Scripted transport for session tests.
//!
//! The test keeps the event sender and feeds the session whatever server
//! behavior the scenario needs; everything the session sends back is
//! recorded in shared state the test can assert on.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use vancix_core::core::audio::codec::EncodedFrame;
use vancix_core::core::realtime::base::{
    RealtimeTransport, SessionSetup, TransportError, TransportEvent, TransportResult,
};
use vancix_core::core::tools::dispatcher::ToolResult;

/// Everything the session sent through the transport.
#[derive(Default)]
pub struct MockShared {
    pub setup: Mutex<Option<SessionSetup>>,
    pub sent_audio: Mutex<Vec<EncodedFrame>>,
    pub tool_results: Mutex<Vec<Vec<ToolResult>>>,
    pub closed: AtomicBool,
}

impl MockShared {
    pub fn audio_count(&self) -> usize {
        self.sent_audio.lock().len()
    }

    pub fn result_batches(&self) -> Vec<Vec<ToolResult>> {
        self.tool_results.lock().clone()
    }
}

pub struct MockTransport {
    fail_connect: bool,
    reject_audio_as_full: bool,
    events: Option<mpsc::Receiver<TransportEvent>>,
    shared: Arc<MockShared>,
}

impl MockTransport {
    /// Returns the transport, the sender the test scripts events with, and
    /// the shared record of outbound traffic.
    pub fn new() -> (Self, mpsc::Sender<TransportEvent>, Arc<MockShared>) {
        let (tx, rx) = mpsc::channel(64);
        let shared = Arc::new(MockShared::default());
        let transport = Self {
            fail_connect: false,
            reject_audio_as_full: false,
            events: Some(rx),
            shared: shared.clone(),
        };
        (transport, tx, shared)
    }

    /// Make `connect` fail, simulating an unreachable or rejecting server.
    pub fn failing_connect(mut self) -> Self {
        self.fail_connect = true;
        self
    }

    /// Make every audio send report a full outbound queue.
    pub fn rejecting_audio_as_full(mut self) -> Self {
        self.reject_audio_as_full = true;
        self
    }
}

#[async_trait]
impl RealtimeTransport for MockTransport {
    async fn connect(
        &mut self,
        setup: SessionSetup,
    ) -> TransportResult<mpsc::Receiver<TransportEvent>> {
        if self.fail_connect {
            return Err(TransportError::ConnectionFailed("scripted refusal".into()));
        }
        *self.shared.setup.lock() = Some(setup);
        self.events
            .take()
            .ok_or_else(|| TransportError::ConnectionFailed("already connected".into()))
    }

    fn try_send_audio(&self, frame: EncodedFrame) -> TransportResult<()> {
        if self.reject_audio_as_full {
            return Err(TransportError::QueueFull);
        }
        self.shared.sent_audio.lock().push(frame);
        Ok(())
    }

    async fn send_tool_results(&self, results: Vec<ToolResult>) -> TransportResult<()> {
        self.shared.tool_results.lock().push(results);
        Ok(())
    }

    async fn close(&mut self) -> TransportResult<()> {
        self.shared.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
