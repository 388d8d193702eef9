//! Gemini Live websocket client.
//!
//! Owns the websocket and a single spawned I/O task. Outbound traffic goes
//! through a bounded channel feeding the sink half; inbound frames are
//! parsed and forwarded as [`TransportEvent`]s on the channel handed back
//! from `connect`. The task exits on server close, socket error, or when
//! the outbound channel is dropped, and emits `Closed` / `Failed` exactly
//! once before ending the stream.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

use crate::core::audio::codec::EncodedFrame;
use crate::core::realtime::base::{
    RealtimeTransport, SessionSetup, TransportError, TransportEvent, TransportResult,
};
use crate::core::session::feed::GroundingLink;
use crate::core::tools::dispatcher::ToolResult;

use super::config::{GeminiConfig, SEND_QUEUE_CAPACITY};
use super::messages::{
    ClientMessage, Content, GenerationConfig, GoogleSearch, MediaChunk, Part,
    PrebuiltVoiceConfig, RealtimeInput, ServerMessage, Setup, SpeechConfig, ToolConfig,
    ToolResponse, VoiceConfig,
};

/// Event channel depth. Model audio arrives in bursts well below this.
const EVENT_CHANNEL_CAPACITY: usize = 256;

pub struct GeminiLive {
    config: GeminiConfig,
    /// Shared with the spawned task, which clears it when the socket dies.
    connected: Arc<AtomicBool>,
    outbound: Mutex<Option<mpsc::Sender<ClientMessage>>>,
    io_handle: Mutex<Option<JoinHandle<()>>>,
}

impl GeminiLive {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            config,
            connected: Arc::new(AtomicBool::new(false)),
            outbound: Mutex::new(None),
            io_handle: Mutex::new(None),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn setup_message(&self, setup: &SessionSetup) -> ClientMessage {
        let mut tools = vec![ToolConfig {
            function_declarations: Some(setup.tools.clone()),
            google_search: None,
        }];
        if setup.enable_search {
            tools.push(ToolConfig {
                function_declarations: None,
                google_search: Some(GoogleSearch {}),
            });
        }
        ClientMessage::Setup(Setup {
            model: self.config.model_path(),
            generation_config: GenerationConfig {
                response_modalities: vec!["AUDIO".to_string()],
                speech_config: SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: setup.voice.clone(),
                        },
                    },
                },
            },
            system_instruction: Content {
                parts: vec![Part::text(setup.system_instruction.clone())],
            },
            tools,
        })
    }
}

/// Translate one parsed server frame into transport events.
fn forward_server_message(
    msg: ServerMessage,
    events: &mpsc::Sender<TransportEvent>,
    setup_done: &mut bool,
) {
    if msg.setup_complete.is_some() && !*setup_done {
        *setup_done = true;
        let _ = events.try_send(TransportEvent::Opened);
    }

    if let Some(tool_call) = msg.tool_call {
        if !tool_call.function_calls.is_empty() {
            let _ = events.try_send(TransportEvent::ToolCall(tool_call.function_calls));
        }
    }

    if let Some(content) = msg.server_content {
        if let Some(turn) = content.model_turn {
            for part in turn.parts {
                let Some(chunk) = part.inline_data else { continue };
                match BASE64.decode(chunk.data.as_bytes()) {
                    Ok(pcm) => {
                        let _ = events.try_send(TransportEvent::Audio(Bytes::from(pcm)));
                    }
                    Err(e) => {
                        // One bad chunk is a glitch, not a session failure.
                        tracing::warn!("dropping undecodable audio chunk: {e}");
                    }
                }
            }
        }
        if let Some(metadata) = content.grounding_metadata {
            let links: Vec<GroundingLink> = metadata
                .grounding_chunks
                .into_iter()
                .filter_map(|chunk| chunk.web)
                .filter_map(|web| {
                    Some(GroundingLink {
                        uri: web.uri?,
                        title: web.title.unwrap_or_else(|| "Untitled Source".to_string()),
                    })
                })
                .collect();
            if !links.is_empty() {
                let _ = events.try_send(TransportEvent::Grounding(links));
            }
        }
    }
}

#[async_trait]
impl RealtimeTransport for GeminiLive {
    async fn connect(
        &mut self,
        setup: SessionSetup,
    ) -> TransportResult<mpsc::Receiver<TransportEvent>> {
        if self.connected.load(Ordering::SeqCst) {
            return Err(TransportError::ConnectionFailed(
                "already connected".to_string(),
            ));
        }

        let (ws_stream, _response) = tokio_tungstenite::connect_async(self.config.ws_url())
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        tracing::info!(model = %self.config.model(), "connected to Gemini Live");

        let (mut ws_sink, mut ws_stream) = ws_stream.split();
        let (tx, mut rx) = mpsc::channel::<ClientMessage>(SEND_QUEUE_CAPACITY);
        let (event_tx, event_rx) = mpsc::channel::<TransportEvent>(EVENT_CHANNEL_CAPACITY);

        // The setup frame must be the first thing on the wire.
        let setup_json = serde_json::to_string(&self.setup_message(&setup))?;
        ws_sink
            .send(Message::Text(setup_json.into()))
            .await
            .map_err(|e| TransportError::WebSocketError(e.to_string()))?;

        *self.outbound.lock().await = Some(tx);
        self.connected.store(true, Ordering::SeqCst);
        let connected = self.connected.clone();

        let handle = tokio::spawn(async move {
            let mut setup_done = false;
            let outcome = loop {
                tokio::select! {
                    outgoing = rx.recv() => {
                        let Some(message) = outgoing else {
                            // Sender side dropped; we are closing.
                            break None;
                        };
                        let json = match serde_json::to_string(&message) {
                            Ok(j) => j,
                            Err(e) => {
                                tracing::error!("failed to serialize client message: {e}");
                                continue;
                            }
                        };
                        if let Err(e) = ws_sink.send(Message::Text(json.into())).await {
                            break Some(TransportEvent::Failed(
                                TransportError::WebSocketError(e.to_string()),
                            ));
                        }
                    }

                    incoming = ws_stream.next() => {
                        match incoming {
                            Some(Ok(Message::Text(text))) => {
                                match serde_json::from_str::<ServerMessage>(&text) {
                                    Ok(msg) => forward_server_message(msg, &event_tx, &mut setup_done),
                                    Err(e) => tracing::warn!("unparseable server frame: {e}"),
                                }
                            }
                            // Gemini delivers frames as binary JSON as well.
                            Some(Ok(Message::Binary(data))) => {
                                match serde_json::from_slice::<ServerMessage>(&data) {
                                    Ok(msg) => forward_server_message(msg, &event_tx, &mut setup_done),
                                    Err(e) => tracing::warn!("unparseable server frame: {e}"),
                                }
                            }
                            Some(Ok(Message::Ping(data))) => {
                                if let Err(e) = ws_sink.send(Message::Pong(data)).await {
                                    tracing::error!("failed to send pong: {e}");
                                }
                            }
                            Some(Ok(Message::Close(frame))) => {
                                tracing::info!(?frame, "server closed connection");
                                break Some(TransportEvent::Closed);
                            }
                            Some(Ok(_)) => {}
                            Some(Err(e)) => {
                                break Some(TransportEvent::Failed(
                                    TransportError::WebSocketError(e.to_string()),
                                ));
                            }
                            None => break Some(TransportEvent::Closed),
                        }
                    }
                }
            };

            connected.store(false, Ordering::SeqCst);
            if let Some(event) = outcome {
                let _ = event_tx.send(event).await;
            }
        });
        *self.io_handle.lock().await = Some(handle);

        Ok(event_rx)
    }

    fn try_send_audio(&self, frame: EncodedFrame) -> TransportResult<()> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(TransportError::NotConnected);
        }
        let sender = self.outbound.try_lock().ok().and_then(|guard| guard.clone());
        let Some(sender) = sender else {
            return Err(TransportError::NotConnected);
        };
        let message = ClientMessage::RealtimeInput(RealtimeInput {
            media_chunks: vec![MediaChunk {
                mime_type: frame.mime_type.clone(),
                data: BASE64.encode(&frame.data),
            }],
        });
        sender.try_send(message).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => TransportError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => TransportError::NotConnected,
        })
    }

    async fn send_tool_results(&self, results: Vec<ToolResult>) -> TransportResult<()> {
        let sender = self
            .outbound
            .lock()
            .await
            .clone()
            .ok_or(TransportError::NotConnected)?;
        sender
            .send(ClientMessage::ToolResponse(ToolResponse {
                function_responses: results,
            }))
            .await
            .map_err(|_| TransportError::NotConnected)
    }

    async fn close(&mut self) -> TransportResult<()> {
        // Dropping the outbound sender ends the select loop's recv arm.
        self.outbound.lock().await.take();
        if let Some(handle) = self.io_handle.lock().await.take() {
            handle.abort();
        }
        self.connected.store(false, Ordering::SeqCst);
        tracing::info!("Gemini Live connection closed");
        Ok(())
    }
}
