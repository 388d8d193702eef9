//! Session orchestrator.
//!
//! Wires capture, transport, playback, and tools into one running session.
//! All inbound traffic is consumed by a single dispatch loop inside one
//! spawned task; the caller holds a [`SessionHandle`] that observes state
//! and volume through watch channels and stops the session by cancelling.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::core::audio::capture::{rms_volume, CaptureSource};
use crate::core::audio::codec::{self, OUTPUT_SAMPLE_RATE};
use crate::core::audio::playback::{AudioSink, Completion, PlaybackScheduler};
use crate::core::audio::AudioError;
use crate::core::realtime::base::{
    RealtimeTransport, SessionSetup, TransportError, TransportEvent,
};
use crate::core::session::feed::{CommandLog, IntelFeed, LogKind};
use crate::core::session::state::{SessionEvent, SessionState, StateMachine};
use crate::core::tools::device::ScheduleStore;
use crate::core::tools::dispatcher::{ToolDispatcher, ToolResult};

/// Only one session may hold the audio path at a time.
static SESSION_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Depth of the playback-completion and tool-result channels.
const INTERNAL_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("a session is already active")]
    AlreadyActive,

    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

// ============================================================================
// Session Handle
// ============================================================================

/// The caller's view of a running session. Dropping the handle does not
/// stop the session; call [`SessionHandle::stop`].
pub struct SessionHandle {
    state_rx: watch::Receiver<SessionState>,
    volume_rx: watch::Receiver<f32>,
    log: Arc<CommandLog>,
    feed: Arc<IntelFeed>,
    schedule: Arc<ScheduleStore>,
    dropped_frames: Arc<AtomicU64>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl SessionHandle {
    pub fn state(&self) -> SessionState {
        *self.state_rx.borrow()
    }

    /// Watch for state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.state_rx.clone()
    }

    /// Latest microphone volume, scaled for display.
    pub fn volume(&self) -> f32 {
        *self.volume_rx.borrow()
    }

    pub fn subscribe_volume(&self) -> watch::Receiver<f32> {
        self.volume_rx.clone()
    }

    pub fn log(&self) -> &CommandLog {
        &self.log
    }

    pub fn feed(&self) -> &IntelFeed {
        &self.feed
    }

    pub fn schedule(&self) -> &ScheduleStore {
        &self.schedule
    }

    /// Microphone frames dropped because the outbound queue was full.
    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames.load(Ordering::Relaxed)
    }

    /// Request teardown and wait for the session task to finish. Idempotent.
    pub async fn stop(self) {
        self.cancel.cancel();
        let _ = self.task.await;
    }

    /// Wait for the session to end on its own (server close or failure).
    pub async fn wait(self) {
        let _ = self.task.await;
    }
}

// ============================================================================
// Session
// ============================================================================

pub struct Session;

impl Session {
    /// Start a session over the given transport and audio endpoints.
    ///
    /// Rejects with [`SessionError::AlreadyActive`] while another session
    /// holds the audio path. The connection itself is established inside the
    /// spawned task; a connect failure surfaces as the `Error` state and a
    /// log entry, matching how every other mid-session failure surfaces.
    pub fn start(
        mut transport: Box<dyn RealtimeTransport>,
        mut capture: Box<dyn CaptureSource>,
        mut sink: Box<dyn AudioSink>,
        dispatcher: ToolDispatcher,
        setup: SessionSetup,
    ) -> Result<SessionHandle, SessionError> {
        if SESSION_ACTIVE
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SessionError::AlreadyActive);
        }

        let (state_tx, state_rx) = watch::channel(SessionState::Idle);
        let (volume_tx, volume_rx) = watch::channel(0.0f32);
        let log = Arc::new(CommandLog::new());
        let feed = Arc::new(IntelFeed::new());
        let schedule = dispatcher.schedule();
        let dropped_frames = Arc::new(AtomicU64::new(0));
        let cancel = CancellationToken::new();

        let task_log = log.clone();
        let task_feed = feed.clone();
        let task_dropped = dropped_frames.clone();
        let task_cancel = cancel.clone();

        let task = tokio::spawn(async move {
            let mut machine = StateMachine::new();
            let mut scheduler = PlaybackScheduler::new();
            let capture_rate = capture.sample_rate();

            let mut events = match transport.connect(setup).await {
                Ok(events) => events,
                Err(err) => {
                    tracing::error!("session initialization failed: {err}");
                    task_log.push(LogKind::System, "Initialization Failed");
                    apply(&mut machine, &state_tx, SessionEvent::TransportFailed);
                    SESSION_ACTIVE.store(false, Ordering::SeqCst);
                    return;
                }
            };

            apply(&mut machine, &state_tx, SessionEvent::StartRequested);

            // Wall-clock origin for the playback timeline.
            let epoch = Instant::now();
            let (done_tx, mut done_rx) = mpsc::channel::<Uuid>(INTERNAL_CHANNEL_CAPACITY);
            let (results_tx, mut results_rx) =
                mpsc::channel::<Vec<ToolResult>>(INTERNAL_CHANNEL_CAPACITY);

            // Capture is held back until the setup handshake completes.
            let mut capturing = false;

            loop {
                tokio::select! {
                    _ = task_cancel.cancelled() => {
                        task_log.push(LogKind::System, "Connection Closed");
                        apply(&mut machine, &state_tx, SessionEvent::TransportClosed);
                        break;
                    }

                    Some(id) = done_rx.recv() => {
                        if scheduler.complete(id) == Completion::Drained {
                            apply(&mut machine, &state_tx, SessionEvent::PlaybackDrained);
                        }
                    }

                    Some(results) = results_rx.recv() => {
                        if let Err(err) = transport.send_tool_results(results).await {
                            tracing::error!("failed to submit tool results: {err}");
                        }
                    }

                    event = events.recv() => {
                        let Some(event) = event else {
                            // Transport task gone without a close frame.
                            task_log.push(LogKind::System, "Connection Closed");
                            apply(&mut machine, &state_tx, SessionEvent::TransportClosed);
                            break;
                        };
                        match event {
                            TransportEvent::Opened => {
                                task_log.push(
                                    LogKind::System,
                                    "Vancix OS Online. Systems Nominal.",
                                );
                                capturing = true;
                            }

                            TransportEvent::Audio(bytes) => {
                                let frame = codec::decode(&bytes, OUTPUT_SAMPLE_RATE);
                                if frame.is_empty() {
                                    continue;
                                }
                                if let Err(err) = sink.write(&frame) {
                                    tracing::error!("playback sink error: {err}");
                                }
                                apply(&mut machine, &state_tx, SessionEvent::AudioChunkReceived);
                                let entry = scheduler
                                    .schedule(&frame, epoch.elapsed().as_secs_f64());
                                let deadline =
                                    epoch + Duration::from_secs_f64(entry.end_time());
                                let done_tx = done_tx.clone();
                                tokio::spawn(async move {
                                    tokio::time::sleep_until(deadline).await;
                                    let _ = done_tx.send(entry.id).await;
                                });
                            }

                            TransportEvent::ToolCall(calls) => {
                                apply(&mut machine, &state_tx, SessionEvent::ToolCallReceived);
                                for call in &calls {
                                    task_log.push(
                                        LogKind::System,
                                        format!("Executing: {}", call.name),
                                    );
                                }
                                // Dispatch off the event loop so a slow tool
                                // handler cannot stall capture or playback.
                                let dispatcher = dispatcher.clone();
                                let results_tx = results_tx.clone();
                                tokio::spawn(async move {
                                    let results = tokio::task::spawn_blocking(move || {
                                        dispatcher.dispatch(calls)
                                    })
                                    .await;
                                    match results {
                                        Ok(results) => {
                                            let _ = results_tx.send(results).await;
                                        }
                                        Err(err) => {
                                            tracing::error!("tool dispatch panicked: {err}");
                                        }
                                    }
                                });
                            }

                            TransportEvent::Grounding(links) => {
                                task_feed.extend(links);
                            }

                            TransportEvent::Closed => {
                                task_log.push(LogKind::System, "Connection Closed");
                                apply(&mut machine, &state_tx, SessionEvent::TransportClosed);
                                break;
                            }

                            TransportEvent::Failed(err) => {
                                task_log.push(LogKind::System, format!("Error: {err}"));
                                apply(&mut machine, &state_tx, SessionEvent::TransportFailed);
                                break;
                            }
                        }
                    }

                    window = capture.next_window(), if capturing => {
                        let Some(samples) = window else {
                            // Source exhausted; keep the session open for
                            // the model's remaining speech.
                            capturing = false;
                            continue;
                        };
                        let _ = volume_tx.send(rms_volume(&samples));
                        let frame = codec::encode(&samples, capture_rate);
                        match transport.try_send_audio(frame) {
                            Ok(()) => {}
                            Err(TransportError::QueueFull) => {
                                task_dropped.fetch_add(1, Ordering::Relaxed);
                                tracing::debug!("outbound queue full, dropped capture frame");
                            }
                            Err(err) => {
                                tracing::warn!("failed to send capture frame: {err}");
                            }
                        }
                    }
                }
            }

            // Teardown releases every session resource in one place.
            scheduler.clear();
            let _ = volume_tx.send(0.0);
            if let Err(err) = transport.close().await {
                tracing::warn!("transport close error: {err}");
            }
            SESSION_ACTIVE.store(false, Ordering::SeqCst);
            tracing::info!(state = %machine.state(), "session ended");
        });

        Ok(SessionHandle {
            state_rx,
            volume_rx,
            log,
            feed,
            schedule,
            dropped_frames,
            cancel,
            task,
        })
    }
}

fn apply(
    machine: &mut StateMachine,
    state_tx: &watch::Sender<SessionState>,
    event: SessionEvent,
) {
    if let Some(next) = machine.apply(event) {
        let _ = state_tx.send(next);
    }
}
