//! End-to-end session tests over a scripted transport.
//!
//! These run the real orchestrator, state machine, codec, scheduler, and
//! dispatcher; only the network and the microphone are replaced. Tests are
//! serialized because only one session may be active at a time.

mod mock_transport;

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde_json::json;
use serial_test::serial;
use tokio::sync::watch;
use tokio::time::timeout;

use vancix_core::core::audio::capture::{ChannelCapture, CAPTURE_WINDOW_SAMPLES};
use vancix_core::core::audio::codec::INPUT_SAMPLE_RATE;
use vancix_core::core::audio::playback::NullSink;
use vancix_core::core::realtime::base::{TransportError, TransportEvent};
use vancix_core::core::session::{Session, SessionError, SessionHandle, SessionState};
use vancix_core::core::tools::declarations::{function_declarations, SYSTEM_INSTRUCTION};
use vancix_core::core::tools::device::{LoggingActions, MockContacts, ScheduleStore};
use vancix_core::core::tools::dispatcher::{ToolCall, ToolDispatcher};
use vancix_core::core::realtime::SessionSetup;
use vancix_core::core::session::feed::{GroundingLink, LogKind};

use mock_transport::MockTransport;

fn dispatcher() -> ToolDispatcher {
    ToolDispatcher::new(
        Arc::new(LoggingActions),
        Arc::new(MockContacts),
        Arc::new(ScheduleStore::empty()),
    )
}

fn setup() -> SessionSetup {
    SessionSetup {
        voice: "Fenrir".to_string(),
        system_instruction: SYSTEM_INSTRUCTION.to_string(),
        tools: function_declarations(),
        enable_search: true,
    }
}

/// Start a session over the given transport with a channel microphone.
fn start_session(
    transport: MockTransport,
) -> (SessionHandle, tokio::sync::mpsc::Sender<Vec<f32>>) {
    let (mic_tx, capture) = ChannelCapture::new(INPUT_SAMPLE_RATE, 8);
    let handle = Session::start(
        Box::new(transport),
        Box::new(capture),
        Box::new(NullSink),
        dispatcher(),
        setup(),
    )
    .expect("session should start");
    (handle, mic_tx)
}

async fn wait_for_state(rx: &mut watch::Receiver<SessionState>, want: SessionState) {
    timeout(Duration::from_secs(5), async {
        loop {
            if *rx.borrow() == want {
                return;
            }
            rx.changed().await.expect("state channel closed early");
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for state {want}"));
}

/// Poll a condition until it holds or the deadline passes.
async fn eventually(what: &str, condition: impl Fn() -> bool) {
    timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {what}"));
}

/// Zeroed 16-bit PCM for the given number of 24 kHz samples.
fn pcm_chunk(samples: usize) -> Bytes {
    Bytes::from(vec![0u8; samples * 2])
}

#[tokio::test]
#[serial]
async fn test_connect_failure_surfaces_as_error_state() {
    let (transport, _events, _shared) = MockTransport::new();
    let (handle, _mic) = start_session(transport.failing_connect());

    let mut states = handle.subscribe_state();
    wait_for_state(&mut states, SessionState::Error).await;

    let log = handle.log().snapshot();
    assert!(log.iter().any(|e| e.text == "Initialization Failed"));
    handle.wait().await;
}

#[tokio::test]
#[serial]
async fn test_second_session_rejected_while_active() {
    let (transport, events, _shared) = MockTransport::new();
    let (handle, _mic) = start_session(transport);

    let (second, _e2, _s2) = MockTransport::new();
    let (_tx2, capture2) = ChannelCapture::new(INPUT_SAMPLE_RATE, 8);
    let err = Session::start(
        Box::new(second),
        Box::new(capture2),
        Box::new(NullSink),
        dispatcher(),
        setup(),
    )
    .err()
    .expect("second session must be rejected");
    assert!(matches!(err, SessionError::AlreadyActive));

    // After teardown the slot frees up again.
    drop(events);
    handle.wait().await;
    let (third, _e3, _s3) = MockTransport::new();
    let (handle, _mic) = start_session(third);
    handle.stop().await;
}

#[tokio::test]
#[serial]
async fn test_open_records_banner_and_setup() {
    let (transport, events, shared) = MockTransport::new();
    let (handle, _mic) = start_session(transport);

    events.send(TransportEvent::Opened).await.unwrap();
    eventually("online banner", || {
        handle
            .log()
            .snapshot()
            .iter()
            .any(|e| e.text == "Vancix OS Online. Systems Nominal.")
    })
    .await;

    let recorded = shared.setup.lock().clone().expect("setup recorded");
    assert_eq!(recorded.tools.len(), 6);
    assert!(recorded.enable_search);
    assert_eq!(recorded.voice, "Fenrir");

    handle.stop().await;
}

#[tokio::test]
#[serial]
async fn test_capture_window_is_encoded_and_sent() {
    let (transport, events, shared) = MockTransport::new();
    let (handle, mic) = start_session(transport);

    events.send(TransportEvent::Opened).await.unwrap();
    mic.send(vec![0.5f32; CAPTURE_WINDOW_SAMPLES]).await.unwrap();

    eventually("audio frame at transport", || shared.audio_count() == 1).await;
    {
        let sent = shared.sent_audio.lock();
        assert_eq!(sent[0].byte_len(), CAPTURE_WINDOW_SAMPLES * 2);
        assert_eq!(sent[0].mime_type, "audio/pcm;rate=16000");
    }
    assert!(handle.volume() > 0.0);
    assert_eq!(handle.dropped_frames(), 0);

    handle.stop().await;
}

#[tokio::test]
#[serial]
async fn test_full_send_queue_drops_frames_and_counts() {
    let (transport, events, shared) = MockTransport::new();
    let (handle, mic) = start_session(transport.rejecting_audio_as_full());

    events.send(TransportEvent::Opened).await.unwrap();
    mic.send(vec![0.1f32; CAPTURE_WINDOW_SAMPLES]).await.unwrap();
    mic.send(vec![0.1f32; CAPTURE_WINDOW_SAMPLES]).await.unwrap();

    eventually("dropped frame counter", || handle.dropped_frames() == 2).await;
    assert_eq!(shared.audio_count(), 0);

    handle.stop().await;
}

#[tokio::test]
#[serial]
async fn test_tool_call_batch_keeps_order_and_logs_execution() {
    let (transport, events, shared) = MockTransport::new();
    let (handle, _mic) = start_session(transport);

    events.send(TransportEvent::Opened).await.unwrap();
    events
        .send(TransportEvent::ToolCall(vec![
            ToolCall {
                id: "c1".into(),
                name: "makeCall".into(),
                args: json!({ "number": "+255700000001" }),
            },
            ToolCall {
                id: "c2".into(),
                name: "openUrl".into(),
                args: json!({ "url": "definitely not a url" }),
            },
            ToolCall {
                id: "c3".into(),
                name: "getContacts".into(),
                args: json!({}),
            },
        ]))
        .await
        .unwrap();

    let mut states = handle.subscribe_state();
    wait_for_state(&mut states, SessionState::Thinking).await;

    eventually("tool result batch", || !shared.result_batches().is_empty()).await;
    let batches = shared.result_batches();
    assert_eq!(batches.len(), 1);
    let results = &batches[0];
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].id, "c1");
    assert_eq!(results[1].id, "c2");
    assert_eq!(results[2].id, "c3");
    assert_eq!(results[0].response["result"], "Calling +255700000001");
    assert!(results[1].response.get("error").is_some());
    assert!(results[2].response.get("contacts").is_some());

    let log = handle.log().snapshot();
    for name in ["makeCall", "openUrl", "getContacts"] {
        let entry = log
            .iter()
            .find(|e| e.text == format!("Executing: {name}"))
            .unwrap_or_else(|| panic!("no execution entry for {name}"));
        assert_eq!(entry.kind, LogKind::System);
    }

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
#[serial]
async fn test_playback_drain_returns_to_listening() {
    let (transport, events, _shared) = MockTransport::new();
    let (handle, _mic) = start_session(transport);
    let mut states = handle.subscribe_state();

    events.send(TransportEvent::Opened).await.unwrap();

    // Two back-to-back chunks of 0.2 s each. The second is queued after the
    // first, so the state holds at Speaking until both complete.
    events
        .send(TransportEvent::Audio(pcm_chunk(4800)))
        .await
        .unwrap();
    events
        .send(TransportEvent::Audio(pcm_chunk(4800)))
        .await
        .unwrap();

    wait_for_state(&mut states, SessionState::Speaking).await;
    wait_for_state(&mut states, SessionState::Listening).await;

    handle.stop().await;
}

#[tokio::test]
#[serial]
async fn test_empty_audio_chunk_is_ignored() {
    let (transport, events, _shared) = MockTransport::new();
    let (handle, _mic) = start_session(transport);

    events.send(TransportEvent::Opened).await.unwrap();
    events.send(TransportEvent::Audio(Bytes::new())).await.unwrap();
    // An odd single byte truncates to zero samples as well.
    events
        .send(TransportEvent::Audio(Bytes::from_static(&[0x7f])))
        .await
        .unwrap();
    events
        .send(TransportEvent::Grounding(vec![GroundingLink {
            title: "Marker".into(),
            uri: "https://example.com".into(),
        }]))
        .await
        .unwrap();

    // The grounding event proves both audio events were consumed without a
    // Speaking transition.
    eventually("grounding marker", || !handle.feed().snapshot().is_empty()).await;
    assert_eq!(handle.state(), SessionState::Listening);

    handle.stop().await;
}

#[tokio::test]
#[serial]
async fn test_grounding_links_reach_feed() {
    let (transport, events, _shared) = MockTransport::new();
    let (handle, _mic) = start_session(transport);

    events.send(TransportEvent::Opened).await.unwrap();
    events
        .send(TransportEvent::Grounding(vec![
            GroundingLink {
                title: "First".into(),
                uri: "https://a.example".into(),
            },
            GroundingLink {
                title: "Second".into(),
                uri: "https://b.example".into(),
            },
        ]))
        .await
        .unwrap();

    eventually("feed populated", || handle.feed().snapshot().len() == 2).await;
    let links = handle.feed().snapshot();
    assert_eq!(links[0].title, "First");
    assert_eq!(links[1].title, "Second");

    handle.stop().await;
}

#[tokio::test]
#[serial]
async fn test_server_close_returns_to_idle() {
    let (transport, events, shared) = MockTransport::new();
    let (handle, _mic) = start_session(transport);
    let mut states = handle.subscribe_state();

    events.send(TransportEvent::Opened).await.unwrap();
    events.send(TransportEvent::Closed).await.unwrap();

    wait_for_state(&mut states, SessionState::Idle).await;
    let log = handle.log().snapshot();
    assert!(log.iter().any(|e| e.text == "Connection Closed"));

    handle.wait().await;
    assert!(shared.closed.load(std::sync::atomic::Ordering::SeqCst));
}

#[tokio::test]
#[serial]
async fn test_transport_failure_is_terminal_error() {
    let (transport, events, _shared) = MockTransport::new();
    let (handle, _mic) = start_session(transport);
    let mut states = handle.subscribe_state();

    events.send(TransportEvent::Opened).await.unwrap();
    events
        .send(TransportEvent::Failed(TransportError::WebSocketError(
            "boom".into(),
        )))
        .await
        .unwrap();

    wait_for_state(&mut states, SessionState::Error).await;
    let log = handle.log().snapshot();
    assert!(log
        .iter()
        .any(|e| e.text == "Error: websocket error: boom"));

    handle.wait().await;
}

#[tokio::test]
#[serial]
async fn test_stop_closes_transport_and_resets_volume() {
    let (transport, events, shared) = MockTransport::new();
    let (handle, mic) = start_session(transport);

    events.send(TransportEvent::Opened).await.unwrap();
    mic.send(vec![0.8f32; CAPTURE_WINDOW_SAMPLES]).await.unwrap();
    eventually("volume reading", || handle.volume() > 0.0).await;

    let volume_rx = handle.subscribe_volume();
    handle.stop().await;
    assert!(shared.closed.load(std::sync::atomic::Ordering::SeqCst));
    assert_eq!(*volume_rx.borrow(), 0.0);
}
