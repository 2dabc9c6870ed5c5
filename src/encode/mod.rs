//! Encoding sinks.
//!
//! Sinks consume composited, canvas-sized frames in output order. The actual codecs live in
//! external crates (`image`, `png`) or the system `ffmpeg` binary.

/// Animated PNG output via the `png` crate.
pub mod apng;
/// `ffmpeg`-based video output (MP4/MOV via system `ffmpeg`).
pub mod ffmpeg;
/// Output format selection.
pub mod format;
/// Animated GIF output via the `image` crate.
pub mod gif;
/// Generic sink trait and the in-memory sink.
pub mod sink;
