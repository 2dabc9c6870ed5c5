//! Composite image sequences onto a common canvas and encode them as GIF, APNG, or video.
//!
//! - Build [`Frame`]s from in-memory images (or a JSON [`AnimationManifest`])
//! - Resolve a canvas with [`infer_canvas_size`] and center each frame with [`composite`]
//! - Hand the uniformly sized frames to an [`AnimationSink`] via [`animate`], or use
//!   [`encode_animation`] / [`write_animation`] for the built-in encoders
#![forbid(unsafe_code)]

mod assets;
mod foundation;

pub mod compose;
/// Encoding sinks.
pub mod encode;
pub mod frame;
pub mod manifest;
pub mod pipeline;

pub use crate::assets::{IntoRaster, decode_image, load_image};
pub use crate::foundation::core::{Rgba8, Size};
pub use crate::foundation::error::{AnimatorError, AnimatorResult};

pub use crate::compose::batch::{CompositeOptions, CompositedFrame, composite_frames, order_frames};
pub use crate::compose::canvas::infer_canvas_size;
pub use crate::compose::composite::{CenterRounding, composite};
pub use crate::encode::apng::ApngSink;
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, is_ffmpeg_on_path};
pub use crate::encode::format::OutputFormat;
pub use crate::encode::gif::GifSink;
pub use crate::encode::sink::{AnimationSink, InMemorySink, SinkConfig};
pub use crate::frame::{Frame, frames_from_images};
pub use crate::manifest::{AnimationManifest, ManifestFrame};
pub use crate::pipeline::{AnimateOpts, AnimateStats, animate, encode_animation, write_animation};
