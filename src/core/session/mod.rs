//! Session lifecycle: state machine, operator-facing feeds, and the
//! orchestrator that runs a live session end to end.

pub mod feed;
pub mod orchestrator;
pub mod state;

pub use feed::{CommandLog, GroundingLink, IntelFeed, LogEntry, LogKind};
pub use orchestrator::{Session, SessionError, SessionHandle};
pub use state::{SessionEvent, SessionState, StateMachine};
