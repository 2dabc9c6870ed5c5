/// Convenience result type used across the crate.
pub type AnimatorResult<T> = Result<T, AnimatorError>;

/// Errors returned by canvas inference, compositing, and the encoding sinks.
#[derive(thiserror::Error, Debug)]
pub enum AnimatorError {
    /// The resolved canvas has a zero dimension.
    #[error("invalid canvas: {width}x{height} (width and height must be > 0)")]
    InvalidCanvas {
        /// Resolved canvas width.
        width: u32,
        /// Resolved canvas height.
        height: u32,
    },

    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    /// The canvas raster could not be allocated.
    #[error("compositing failure: {0}")]
    Compositing(String),

    #[error("validation error: {0}")]
    Validation(String),

    /// Failure reported by an encoder behind an [`AnimationSink`](crate::AnimationSink).
    #[error("encode error: {0}")]
    Encode(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AnimatorError {
    pub fn invalid_canvas(width: u32, height: u32) -> Self {
        Self::InvalidCanvas { width, height }
    }

    pub fn invalid_frame(msg: impl Into<String>) -> Self {
        Self::InvalidFrame(msg.into())
    }

    pub fn compositing(msg: impl Into<String>) -> Self {
        Self::Compositing(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<image::ImageError> for AnimatorError {
    fn from(e: image::ImageError) -> Self {
        Self::Encode(e.to_string())
    }
}

impl From<png::EncodingError> for AnimatorError {
    fn from(e: png::EncodingError) -> Self {
        Self::Encode(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            AnimatorError::invalid_canvas(0, 5)
                .to_string()
                .contains("invalid canvas: 0x5")
        );
        assert!(
            AnimatorError::invalid_frame("x")
                .to_string()
                .contains("invalid frame:")
        );
        assert!(
            AnimatorError::compositing("x")
                .to_string()
                .contains("compositing failure:")
        );
        assert!(
            AnimatorError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(
            AnimatorError::encode("x")
                .to_string()
                .contains("encode error:")
        );
        assert!(
            AnimatorError::serde("x")
                .to_string()
                .contains("serialization error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = AnimatorError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
