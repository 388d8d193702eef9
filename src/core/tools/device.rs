//! Device-side collaborators of the tool dispatcher: contacts, the session
//! schedule, and OS action handlers.
//!
//! OS handlers (URL open, dialer, SMS composer) are inert side effects from
//! the session's point of view; they are modeled as a trait so tests and
//! headless runs can observe or fail them deliberately.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Failure of a single tool invocation.
///
/// These never propagate: the dispatcher converts them into an `{error}`
/// payload inside the affected call's result.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("missing argument: {0}")]
    MissingArgument(&'static str),

    #[error("{0}")]
    ActionFailed(String),
}

/// A saved contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub phone: String,
}

/// Source of the contact list.
pub trait ContactsProvider: Send + Sync {
    fn contacts(&self) -> Vec<Contact>;
}

/// Built-in contact list used until a real device directory is wired in.
#[derive(Debug, Default)]
pub struct MockContacts;

impl ContactsProvider for MockContacts {
    fn contacts(&self) -> Vec<Contact> {
        vec![
            Contact {
                name: "Boss".to_string(),
                phone: "+255700000001".to_string(),
            },
            Contact {
                name: "Mom".to_string(),
                phone: "+255700000002".to_string(),
            },
            Contact {
                name: "John Dev".to_string(),
                phone: "+255700000003".to_string(),
            },
        ]
    }
}

/// One schedule line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub time: String,
    pub event: String,
}

/// Append-only schedule held for the lifetime of the session.
/// No persistence across sessions.
#[derive(Debug)]
pub struct ScheduleStore {
    entries: Mutex<Vec<ScheduleEntry>>,
}

impl Default for ScheduleStore {
    fn default() -> Self {
        Self {
            entries: Mutex::new(vec![ScheduleEntry {
                time: "10:00 AM".to_string(),
                event: "System Diagnostics".to_string(),
            }]),
        }
    }
}

impl ScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty store, without the seeded diagnostics entry.
    pub fn empty() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn add(&self, entry: ScheduleEntry) {
        self.entries.lock().push(entry);
    }

    pub fn list(&self) -> Vec<ScheduleEntry> {
        self.entries.lock().clone()
    }
}

/// OS-level action handlers invoked by tool calls.
pub trait ActionHandler: Send + Sync {
    /// Open an external URL handler. The URL has already been validated.
    fn open_url(&self, url: &Url) -> Result<(), ToolError>;

    /// Open the external dial handler.
    fn dial(&self, number: &str) -> Result<(), ToolError>;

    /// Open the external SMS composer. `body` is already percent-encoded.
    fn compose_sms(&self, number: &str, body: &str) -> Result<(), ToolError>;
}

/// Handler that records the would-be device action in the log stream.
/// The default for headless runs, where there is no OS shell to hand off to.
#[derive(Debug, Default)]
pub struct LoggingActions;

impl ActionHandler for LoggingActions {
    fn open_url(&self, url: &Url) -> Result<(), ToolError> {
        tracing::info!("device action: open {url}");
        Ok(())
    }

    fn dial(&self, number: &str) -> Result<(), ToolError> {
        tracing::info!("device action: open tel:{number}");
        Ok(())
    }

    fn compose_sms(&self, number: &str, body: &str) -> Result<(), ToolError> {
        tracing::info!("device action: open sms:{number}?body={body}");
        Ok(())
    }
}
