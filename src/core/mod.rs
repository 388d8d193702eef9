//! Core pipeline: audio codecs and playback, realtime transports, session
//! orchestration, and the device tool surface.

pub mod audio;
pub mod realtime;
pub mod session;
pub mod tools;
