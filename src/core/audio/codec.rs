//! PCM codec for the realtime audio path.
//!
//! The wire format on both directions is raw PCM 16-bit signed little-endian:
//! 16 kHz mono on the capture side, 24 kHz mono on the playback side. Capture
//! windows are encoded into a [`EncodedFrame`] carrying the MIME tag the
//! transport envelope expects; response chunks are decoded back into float
//! samples in `[-1.0, 1.0]`.

use bytes::Bytes;

/// Sample rate for microphone capture audio sent to the model.
pub const INPUT_SAMPLE_RATE: u32 = 16_000;

/// Sample rate for synthesized audio received from the model.
pub const OUTPUT_SAMPLE_RATE: u32 = 24_000;

/// Bit depth of the wire format.
pub const BIT_DEPTH: u16 = 16;

/// An encoded PCM frame ready for the transport envelope.
#[derive(Debug, Clone)]
pub struct EncodedFrame {
    /// Raw 16-bit LE PCM bytes.
    pub data: Bytes,
    /// Sample rate the bytes were encoded at.
    pub sample_rate: u32,
    /// MIME tag for the transport envelope, e.g. `audio/pcm;rate=16000`.
    pub mime_type: String,
}

impl EncodedFrame {
    /// Length of the encoded payload in bytes.
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }
}

/// A decoded PCM frame.
///
/// Immutable once produced; consumed exactly once by its downstream stage
/// (the playback scheduler or an audio sink).
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFrame {
    /// Float samples in `[-1.0, 1.0]`.
    pub samples: Vec<f32>,
    /// Sample rate of the frame.
    pub sample_rate: u32,
}

impl AudioFrame {
    /// Duration of the frame in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Length of the frame in wire bytes (two bytes per sample).
    pub fn byte_len(&self) -> usize {
        self.samples.len() * 2
    }

    /// Whether the frame carries no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Encode float samples into a 16-bit LE PCM frame.
///
/// Each sample is clamped to `[-1.0, 1.0]` and scaled by 32767. Non-finite
/// samples (NaN, infinity) are treated as silence rather than propagated.
pub fn encode(samples: &[f32], sample_rate: u32) -> EncodedFrame {
    let mut data = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        let sample = if sample.is_finite() { sample } else { 0.0 };
        let value = (sample.clamp(-1.0, 1.0) * 32767.0) as i16;
        data.extend_from_slice(&value.to_le_bytes());
    }
    EncodedFrame {
        data: Bytes::from(data),
        sample_rate,
        mime_type: format!("audio/pcm;rate={sample_rate}"),
    }
}

/// Decode 16-bit LE PCM bytes back into float samples.
///
/// A trailing partial sample (odd byte length) is truncated; the output
/// length is always `floor(bytes.len() / 2)`.
pub fn decode(bytes: &[u8], sample_rate: u32) -> AudioFrame {
    let samples = bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect();
    AudioFrame {
        samples,
        sample_rate,
    }
}
