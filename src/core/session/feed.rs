//! Bounded, newest-first feeds surfaced to the UI: the command log and the
//! grounding Intel Feed.

use std::collections::VecDeque;

use chrono::{DateTime, Local};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Maximum number of retained log entries.
pub const LOG_CAPACITY: usize = 50;

/// Maximum number of retained grounding links.
pub const FEED_CAPACITY: usize = 5;

/// Source of a command-log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    User,
    Agent,
    System,
}

/// One command-log line.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub kind: LogKind,
    pub text: String,
    pub timestamp: DateTime<Local>,
}

/// Append-only log capped to the most recent [`LOG_CAPACITY`] entries,
/// newest first. Oldest entries are evicted.
#[derive(Debug, Default)]
pub struct CommandLog {
    entries: Mutex<VecDeque<LogEntry>>,
}

impl CommandLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, kind: LogKind, text: impl Into<String>) {
        let mut entries = self.entries.lock();
        entries.push_front(LogEntry {
            kind,
            text: text.into(),
            timestamp: Local::now(),
        });
        entries.truncate(LOG_CAPACITY);
    }

    /// Snapshot of the retained entries, newest first.
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

/// A web source attached to a grounded response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingLink {
    pub title: String,
    pub uri: String,
}

/// Most-recent-first list of grounding links, capped to [`FEED_CAPACITY`].
///
/// Purely informational; has no effect on the state machine.
#[derive(Debug, Default)]
pub struct IntelFeed {
    links: Mutex<Vec<GroundingLink>>,
}

impl IntelFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend a batch of links, preserving the batch's own order, and
    /// evict anything beyond the cap.
    pub fn extend(&self, new_links: Vec<GroundingLink>) {
        if new_links.is_empty() {
            return;
        }
        let mut links = self.links.lock();
        let mut merged = new_links;
        merged.extend(links.drain(..));
        merged.truncate(FEED_CAPACITY);
        *links = merged;
    }

    pub fn snapshot(&self) -> Vec<GroundingLink> {
        self.links.lock().clone()
    }
}
