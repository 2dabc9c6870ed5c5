use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::foundation::error::{AnimatorError, AnimatorResult};

/// Output container for an animation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Animated GIF.
    Gif,
    /// Animated PNG.
    Apng,
    /// H.264 video via `ffmpeg` (MP4/MOV container chosen by file extension).
    Video,
}

impl OutputFormat {
    /// Infer the format from a file extension (case-insensitive).
    ///
    /// `gif` maps to GIF, `png`/`apng` to APNG, and `mp4`/`mov`/`m4v` to video.
    pub fn from_path(path: &Path) -> AnimatorResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .ok_or_else(|| {
                AnimatorError::validation(format!(
                    "cannot infer output format from '{}' (no extension)",
                    path.display()
                ))
            })?;
        match ext.as_str() {
            "gif" => Ok(Self::Gif),
            "png" | "apng" => Ok(Self::Apng),
            "mp4" | "mov" | "m4v" => Ok(Self::Video),
            other => Err(AnimatorError::validation(format!(
                "unsupported output extension '.{other}' (expected gif, png, apng, mp4, mov, m4v)"
            ))),
        }
    }

    /// `true` when the format can be produced as an in-memory byte buffer.
    pub fn is_in_memory(self) -> bool {
        matches!(self, Self::Gif | Self::Apng)
    }
}
