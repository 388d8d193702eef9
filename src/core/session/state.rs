//! Assistant session state machine.
//!
//! Exactly one state at a time, driven solely by discrete events. The
//! machine is owned by the orchestrator; the UI observes it read-only
//! through a watch channel.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Assistant state as shown to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SessionState {
    /// Before any session has started, or after a clean close.
    #[default]
    Idle,
    /// Capture active, no response in flight.
    Listening,
    /// A tool-call batch has been received and is being serviced.
    Thinking,
    /// At least one playback entry is sounding.
    Speaking,
    /// Terminal for the session; requires a full restart.
    Error,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "IDLE"),
            SessionState::Listening => write!(f, "LISTENING"),
            SessionState::Thinking => write!(f, "THINKING"),
            SessionState::Speaking => write!(f, "SPEAKING"),
            SessionState::Error => write!(f, "ERROR"),
        }
    }
}

/// Discrete events that drive state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A session start was requested.
    StartRequested,
    /// A tool-call batch arrived from the transport.
    ToolCallReceived,
    /// A response audio chunk arrived.
    AudioChunkReceived,
    /// The active playback set emptied.
    PlaybackDrained,
    /// The transport closed cleanly.
    TransportClosed,
    /// The transport failed, or session open failed.
    TransportFailed,
}

/// The state machine proper.
///
/// `apply` returns the new state if the event caused a transition, `None`
/// if the event is not valid in the current state. `Error` is terminal:
/// no event moves out of it; recovery is a new machine for a new session.
#[derive(Debug, Default)]
pub struct StateMachine {
    state: SessionState,
}

impl StateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn apply(&mut self, event: SessionEvent) -> Option<SessionState> {
        use SessionEvent::*;
        use SessionState::*;

        let next = match (self.state, event) {
            (Error, _) => None,
            (Idle, StartRequested) => Some(Listening),
            (Listening | Thinking | Speaking, ToolCallReceived) => Some(Thinking),
            (Listening | Thinking | Speaking, AudioChunkReceived) => Some(Speaking),
            // A tool call during speech moves to Thinking while chunks are
            // still sounding; the drain must still return to Listening.
            (Speaking | Thinking, PlaybackDrained) => Some(Listening),
            (_, TransportClosed) => Some(Idle),
            (_, TransportFailed) => Some(SessionState::Error),
            _ => None,
        };

        if let Some(next) = next {
            if next != self.state {
                tracing::debug!("session state {} -> {}", self.state, next);
                self.state = next;
                return Some(next);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_idle() {
        assert_eq!(StateMachine::new().state(), SessionState::Idle);
    }

    #[test]
    fn test_start_moves_to_listening() {
        let mut machine = StateMachine::new();
        assert_eq!(
            machine.apply(SessionEvent::StartRequested),
            Some(SessionState::Listening)
        );
    }

    #[test]
    fn test_tool_call_then_audio_then_drain() {
        let mut machine = StateMachine::new();
        machine.apply(SessionEvent::StartRequested);

        assert_eq!(
            machine.apply(SessionEvent::ToolCallReceived),
            Some(SessionState::Thinking)
        );
        assert_eq!(
            machine.apply(SessionEvent::AudioChunkReceived),
            Some(SessionState::Speaking)
        );
        // Repeated audio chunks keep the state without re-transitioning.
        assert_eq!(machine.apply(SessionEvent::AudioChunkReceived), None);
        assert_eq!(
            machine.apply(SessionEvent::PlaybackDrained),
            Some(SessionState::Listening)
        );
    }

    #[test]
    fn test_drain_while_thinking_returns_to_listening() {
        // A tool call can arrive while speech is still sounding; the drain
        // that follows must not leave the session parked in Thinking.
        let mut machine = StateMachine::new();
        machine.apply(SessionEvent::StartRequested);
        machine.apply(SessionEvent::AudioChunkReceived);
        assert_eq!(
            machine.apply(SessionEvent::ToolCallReceived),
            Some(SessionState::Thinking)
        );
        assert_eq!(
            machine.apply(SessionEvent::PlaybackDrained),
            Some(SessionState::Listening)
        );
    }

    #[test]
    fn test_drain_is_invalid_while_listening() {
        let mut machine = StateMachine::new();
        machine.apply(SessionEvent::StartRequested);
        assert_eq!(machine.apply(SessionEvent::PlaybackDrained), None);
        assert_eq!(machine.state(), SessionState::Listening);
    }

    #[test]
    fn test_close_returns_to_idle() {
        let mut machine = StateMachine::new();
        machine.apply(SessionEvent::StartRequested);
        machine.apply(SessionEvent::AudioChunkReceived);
        assert_eq!(
            machine.apply(SessionEvent::TransportClosed),
            Some(SessionState::Idle)
        );
    }

    #[test]
    fn test_error_is_terminal() {
        let mut machine = StateMachine::new();
        machine.apply(SessionEvent::StartRequested);
        assert_eq!(
            machine.apply(SessionEvent::TransportFailed),
            Some(SessionState::Error)
        );

        for event in [
            SessionEvent::StartRequested,
            SessionEvent::ToolCallReceived,
            SessionEvent::AudioChunkReceived,
            SessionEvent::PlaybackDrained,
            SessionEvent::TransportClosed,
            SessionEvent::TransportFailed,
        ] {
            assert_eq!(machine.apply(event), None);
            assert_eq!(machine.state(), SessionState::Error);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(SessionState::Speaking.to_string(), "SPEAKING");
        assert_eq!(SessionState::Idle.to_string(), "IDLE");
    }
}
