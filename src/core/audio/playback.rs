//! Streamed playback scheduling.
//!
//! Response audio arrives as chunks at irregular times with non-uniform
//! duration. The scheduler places each decoded chunk on the output timeline
//! so that successive chunks play back-to-back with no audible gap and no
//! overlap, and tracks the set of chunks that are currently sounding. The
//! active set draining to empty is the signal that the assistant has
//! finished speaking.
//!
//! The scheduler is pure bookkeeping over a caller-supplied timeline clock;
//! it owns no timers and spawns no tasks, which keeps timeline placement
//! testable without real time.

use std::collections::HashMap;

use uuid::Uuid;

use super::codec::AudioFrame;
use crate::core::audio::AudioError;

/// A chunk scheduled on the output timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackEntry {
    /// Handle for completion and cancellation.
    pub id: Uuid,
    /// Start time on the output timeline, in seconds.
    pub start_time: f64,
    /// Duration of the chunk in seconds.
    pub duration: f64,
}

impl PlaybackEntry {
    /// Time on the output timeline at which this chunk finishes.
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }
}

/// Outcome of completing a scheduled chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The chunk was removed and others are still sounding.
    Removed,
    /// The chunk was removed and the active set is now empty.
    Drained,
    /// The id was not in the active set.
    Unknown,
}

/// Gapless, non-overlapping scheduler for streamed response audio.
#[derive(Debug, Default)]
pub struct PlaybackScheduler {
    /// Monotonically non-decreasing cursor on the output timeline.
    next_start_time: f64,
    /// Currently sounding (not-yet-completed) entries.
    active: HashMap<Uuid, PlaybackEntry>,
}

impl PlaybackScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a decoded frame for playback.
    ///
    /// The actual start time is `max(next_start_time, now)`: a chunk never
    /// schedules into the past relative to real playback progress, and never
    /// overlaps a still-pending chunk. The cursor then advances by the
    /// frame's duration.
    pub fn schedule(&mut self, frame: &AudioFrame, now: f64) -> PlaybackEntry {
        let start_time = self.next_start_time.max(now);
        let entry = PlaybackEntry {
            id: Uuid::new_v4(),
            start_time,
            duration: frame.duration_secs(),
        };
        self.next_start_time = entry.end_time();
        self.active.insert(entry.id, entry);
        entry
    }

    /// Mark a chunk as naturally completed and remove it from the active set.
    pub fn complete(&mut self, id: Uuid) -> Completion {
        if self.active.remove(&id).is_none() {
            return Completion::Unknown;
        }
        if self.active.is_empty() {
            Completion::Drained
        } else {
            Completion::Removed
        }
    }

    /// Number of chunks currently sounding.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Whether nothing is scheduled or sounding.
    pub fn is_idle(&self) -> bool {
        self.active.is_empty()
    }

    /// Current value of the timeline cursor.
    pub fn next_start_time(&self) -> f64 {
        self.next_start_time
    }

    /// Cancel all pending playback. Used on session teardown so no handles
    /// leak across restarts.
    pub fn clear(&mut self) {
        self.active.clear();
        self.next_start_time = 0.0;
    }
}

/// Destination for decoded response audio.
///
/// The session core does not own an audio device; the consumer decides what
/// "sounding" means (a WAV file in the headless binary, a speaker elsewhere).
pub trait AudioSink: Send {
    fn write(&mut self, frame: &AudioFrame) -> Result<(), AudioError>;
}

/// Sink that discards audio. Scheduling bookkeeping still runs.
#[derive(Debug, Default)]
pub struct NullSink;

impl AudioSink for NullSink {
    fn write(&mut self, _frame: &AudioFrame) -> Result<(), AudioError> {
        Ok(())
    }
}
