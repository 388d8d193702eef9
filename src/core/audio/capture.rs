//! Capture source seam and per-window volume metering.
//!
//! Microphone access is an external capability; the session core consumes
//! any [`CaptureSource`] that yields fixed-size windows of float samples at
//! 16 kHz. [`ChannelCapture`] is the embedding seam (a device integration
//! pushes windows into it); the headless binary feeds the pipeline from a
//! WAV file instead (see [`super::wav::WavCapture`]).

use async_trait::async_trait;
use tokio::sync::mpsc;

/// Number of samples per capture window (~256 ms at 16 kHz).
pub const CAPTURE_WINDOW_SAMPLES: usize = 4096;

/// Scale factor applied to the raw RMS for UI feedback.
const VOLUME_SCALE: f32 = 5.0;

/// A source of fixed-size capture windows.
///
/// `next_window` must be cancel-safe: the orchestrator polls it inside its
/// dispatch loop alongside transport events. Returning `None` ends capture.
#[async_trait]
pub trait CaptureSource: Send {
    async fn next_window(&mut self) -> Option<Vec<f32>>;

    /// Sample rate of the windows this source produces.
    fn sample_rate(&self) -> u32;
}

/// Capture source fed through a channel by an external device integration.
pub struct ChannelCapture {
    rx: mpsc::Receiver<Vec<f32>>,
    sample_rate: u32,
}

impl ChannelCapture {
    /// Create a channel-backed capture source and its feeding half.
    pub fn new(sample_rate: u32, capacity: usize) -> (mpsc::Sender<Vec<f32>>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self { rx, sample_rate })
    }
}

#[async_trait]
impl CaptureSource for ChannelCapture {
    async fn next_window(&mut self) -> Option<Vec<f32>> {
        self.rx.recv().await
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// RMS-derived volume scalar for one capture window.
///
/// Matches what the visualizer expects: `sqrt(mean(x^2))` scaled up a bit.
pub fn rms_volume(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f32 = samples.iter().map(|s| s * s).sum();
    (sum / samples.len() as f32).sqrt() * VOLUME_SCALE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::audio::codec::INPUT_SAMPLE_RATE;

    #[test]
    fn test_rms_volume_of_silence_is_zero() {
        assert_eq!(rms_volume(&[0.0; 128]), 0.0);
        assert_eq!(rms_volume(&[]), 0.0);
    }

    #[test]
    fn test_rms_volume_of_full_scale_square() {
        // RMS of a +/-1.0 square wave is 1.0, scaled by 5.
        let samples: Vec<f32> = (0..64).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        assert!((rms_volume(&samples) - 5.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_channel_capture_yields_pushed_windows() {
        let (tx, mut capture) = ChannelCapture::new(INPUT_SAMPLE_RATE, 4);
        tx.send(vec![0.5; CAPTURE_WINDOW_SAMPLES]).await.unwrap();
        drop(tx);

        let window = capture.next_window().await.unwrap();
        assert_eq!(window.len(), CAPTURE_WINDOW_SAMPLES);
        assert_eq!(capture.sample_rate(), INPUT_SAMPLE_RATE);
        assert!(capture.next_window().await.is_none());
    }
}
