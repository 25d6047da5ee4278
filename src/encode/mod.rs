//! Encoding sinks.
//!
//! Sinks consume rendered frames in timeline order and are driven by the frame pump.

/// `ffmpeg`-based MP4 output via the system `ffmpeg`.
pub mod ffmpeg;
/// Frame sink trait and the in-memory sink.
pub mod sink;
