//! Audio path: PCM codec, capture seam, playback scheduling, WAV adapters.
//!
//! # Audio Format
//!
//! Capture audio is PCM 16-bit signed little-endian at 16 kHz mono; response
//! audio is the same format at 24 kHz. The codec is the only place where the
//! float and wire representations meet.

pub mod capture;
pub mod codec;
pub mod playback;
pub mod wav;

use thiserror::Error;

pub use capture::{rms_volume, CaptureSource, ChannelCapture, CAPTURE_WINDOW_SAMPLES};
pub use codec::{AudioFrame, EncodedFrame, INPUT_SAMPLE_RATE, OUTPUT_SAMPLE_RATE};
pub use playback::{AudioSink, Completion, NullSink, PlaybackEntry, PlaybackScheduler};
pub use wav::{WavCapture, WavSink};

/// Errors on the audio path.
///
/// Decode problems never crash playback: the offending chunk is dropped and
/// the session continues.
#[derive(Debug, Error)]
pub enum AudioError {
    /// A capture or sink file is not in the expected format.
    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// A response chunk could not be interpreted as PCM audio.
    #[error("malformed audio payload: {0}")]
    MalformedPayload(String),

    /// WAV file I/O failed.
    #[error("wav error: {0}")]
    Wav(#[from] hound::Error),
}
