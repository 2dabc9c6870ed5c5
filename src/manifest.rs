//! JSON manifest describing an animation: frame files, durations, and output settings.
//!
//! ```json
//! {
//!   "canvas": { "width": 400, "height": 200 },
//!   "loop_count": 0,
//!   "background": "#000000",
//!   "frames": [
//!     { "path": "a.png", "duration": 0.5 },
//!     { "path": "b.png", "duration": 0.5, "background": "#ff0000", "position": 0 }
//!   ]
//! }
//! ```

use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::{
    assets::load_image,
    compose::composite::CenterRounding,
    encode::ffmpeg::DEFAULT_VIDEO_FPS,
    foundation::{
        core::{Rgba8, Size},
        error::{AnimatorError, AnimatorResult},
    },
    frame::{Frame, validate_duration},
    pipeline::AnimateOpts,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnimationManifest {
    /// Explicit canvas; inferred from the frames when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canvas: Option<Size>,
    /// `0` loops forever.
    #[serde(default)]
    pub loop_count: u16,
    #[serde(default)]
    pub rounding: CenterRounding,
    /// Constant frame rate for video output.
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Background for frames that do not set their own.
    #[serde(default)]
    pub background: Rgba8,
    pub frames: Vec<ManifestFrame>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestFrame {
    /// Image file, relative to the manifest's directory unless absolute.
    pub path: PathBuf,
    /// Display duration in seconds.
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<Rgba8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,
}

fn default_fps() -> u32 {
    DEFAULT_VIDEO_FPS
}

impl AnimationManifest {
    pub fn from_json_str(s: &str) -> AnimatorResult<Self> {
        serde_json::from_str(s).map_err(|e| AnimatorError::serde(e.to_string()))
    }

    /// Read and parse a manifest file (not validated).
    pub fn load(path: &Path) -> AnimatorResult<Self> {
        let f = File::open(path).with_context(|| format!("open manifest '{}'", path.display()))?;
        serde_json::from_reader(BufReader::new(f)).map_err(|e| {
            AnimatorError::serde(format!("parse manifest '{}': {e}", path.display()))
        })
    }

    pub fn validate(&self) -> AnimatorResult<()> {
        if self.frames.is_empty() {
            return Err(AnimatorError::validation("manifest has no frames"));
        }
        if self.fps == 0 {
            return Err(AnimatorError::validation("manifest fps must be non-zero"));
        }
        if let Some(canvas) = self.canvas
            && canvas.is_empty()
        {
            return Err(AnimatorError::invalid_canvas(canvas.width, canvas.height));
        }
        for (i, f) in self.frames.iter().enumerate() {
            validate_duration(f.duration).map_err(|e| match e {
                AnimatorError::InvalidFrame(msg) => AnimatorError::invalid_frame(format!(
                    "frame {i} ('{}'): {msg}",
                    f.path.display()
                )),
                other => other,
            })?;
        }
        Ok(())
    }

    /// Decode every frame image, resolving relative paths against `root`.
    pub fn load_frames(&self, root: &Path) -> AnimatorResult<Vec<Frame>> {
        self.frames
            .iter()
            .map(|f| {
                let path = if f.path.is_absolute() {
                    f.path.clone()
                } else {
                    root.join(&f.path)
                };
                let mut frame = Frame::new(load_image(&path)?, f.duration)?
                    .with_background(f.background.unwrap_or(self.background));
                if let Some(position) = f.position {
                    frame = frame.with_position(position);
                }
                Ok(frame)
            })
            .collect()
    }

    pub fn animate_opts(&self) -> AnimateOpts {
        AnimateOpts {
            canvas: self.canvas,
            rounding: self.rounding,
            loop_count: self.loop_count,
            fps: self.fps,
            video_background: self.background,
            ..AnimateOpts::default()
        }
    }
}
