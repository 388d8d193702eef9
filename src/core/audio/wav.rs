//! WAV-file capture source and audio sink for the headless binary.
//!
//! These adapters let the whole pipeline run without a sound device: a
//! 16 kHz mono WAV file stands in for the microphone (windows are paced at
//! real time so the transport sees the same cadence a device would produce)
//! and response audio lands in a 24 kHz WAV file.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{interval, Interval, MissedTickBehavior};

use super::capture::{CaptureSource, CAPTURE_WINDOW_SAMPLES};
use super::codec::{AudioFrame, INPUT_SAMPLE_RATE, OUTPUT_SAMPLE_RATE};
use super::playback::AudioSink;
use crate::core::audio::AudioError;

/// Capture source backed by a 16-bit mono WAV file at the capture rate.
pub struct WavCapture {
    reader: hound::WavReader<std::io::BufReader<File>>,
    ticker: Interval,
    window_samples: usize,
}

impl WavCapture {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AudioError> {
        let reader = hound::WavReader::open(path)?;
        let spec = reader.spec();
        if spec.bits_per_sample != 16 || spec.sample_format != hound::SampleFormat::Int {
            return Err(AudioError::UnsupportedFormat(format!(
                "expected 16-bit integer PCM, got {}-bit {:?}",
                spec.bits_per_sample, spec.sample_format
            )));
        }
        if spec.channels != 1 {
            return Err(AudioError::UnsupportedFormat(format!(
                "expected mono, got {} channels",
                spec.channels
            )));
        }
        if spec.sample_rate != INPUT_SAMPLE_RATE {
            return Err(AudioError::UnsupportedFormat(format!(
                "expected {INPUT_SAMPLE_RATE} Hz, got {} Hz",
                spec.sample_rate
            )));
        }

        let window_samples = CAPTURE_WINDOW_SAMPLES;
        let window_duration =
            Duration::from_secs_f64(window_samples as f64 / INPUT_SAMPLE_RATE as f64);
        let mut ticker = interval(window_duration);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Ok(Self {
            reader,
            ticker,
            window_samples,
        })
    }
}

#[async_trait]
impl CaptureSource for WavCapture {
    async fn next_window(&mut self) -> Option<Vec<f32>> {
        self.ticker.tick().await;

        let window: Vec<f32> = self
            .reader
            .samples::<i16>()
            .take(self.window_samples)
            .filter_map(|sample| sample.ok())
            .map(|sample| sample as f32 / 32768.0)
            .collect();

        if window.is_empty() {
            None
        } else {
            Some(window)
        }
    }

    fn sample_rate(&self) -> u32 {
        INPUT_SAMPLE_RATE
    }
}

/// Sink that appends decoded response audio to a 24 kHz mono WAV file.
pub struct WavSink {
    writer: hound::WavWriter<BufWriter<File>>,
}

impl WavSink {
    pub fn create(path: impl AsRef<Path>) -> Result<Self, AudioError> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: OUTPUT_SAMPLE_RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let writer = hound::WavWriter::create(path, spec)?;
        Ok(Self { writer })
    }

    /// Flush and close the output file.
    pub fn finalize(self) -> Result<(), AudioError> {
        self.writer.finalize()?;
        Ok(())
    }
}

impl AudioSink for WavSink {
    fn write(&mut self, frame: &AudioFrame) -> Result<(), AudioError> {
        for &sample in &frame.samples {
            let value = (sample.clamp(-1.0, 1.0) * 32767.0) as i16;
            self.writer.write_sample(value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_test_wav(path: &Path, sample_rate: u32, samples: &[i16]) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &sample in samples {
            writer.write_sample(sample).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_wav_capture_windows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.wav");
        // One full window plus a partial tail.
        let samples = vec![1000i16; CAPTURE_WINDOW_SAMPLES + 100];
        write_test_wav(&path, INPUT_SAMPLE_RATE, &samples);

        let mut capture = WavCapture::open(&path).unwrap();
        let first = capture.next_window().await.unwrap();
        assert_eq!(first.len(), CAPTURE_WINDOW_SAMPLES);
        let second = capture.next_window().await.unwrap();
        assert_eq!(second.len(), 100);
        assert!(capture.next_window().await.is_none());
    }

    #[test]
    fn test_wav_capture_rejects_wrong_rate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wrong_rate.wav");
        write_test_wav(&path, 44_100, &[0i16; 16]);

        match WavCapture::open(&path) {
            Err(AudioError::UnsupportedFormat(msg)) => assert!(msg.contains("44100")),
            other => panic!("expected UnsupportedFormat, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_wav_sink_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.wav");

        let frame = AudioFrame {
            samples: vec![0.25, -0.25, 1.0, -1.0],
            sample_rate: OUTPUT_SAMPLE_RATE,
        };
        let mut sink = WavSink::create(&path).unwrap();
        sink.write(&frame).unwrap();
        sink.finalize().unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, OUTPUT_SAMPLE_RATE);
        assert_eq!(reader.len(), 4);
    }
}
