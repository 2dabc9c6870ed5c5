use std::sync::Arc;

use image::RgbaImage;

use crate::{
    assets::IntoRaster,
    foundation::{
        core::{Rgba8, Size},
        error::{AnimatorError, AnimatorResult},
    },
};

/// One still image plus its display duration and compositing metadata.
///
/// The image is shared read-only; compositing always produces a new raster.
#[derive(Clone, Debug)]
pub struct Frame {
    image: Arc<RgbaImage>,
    duration: f64,
    background: Rgba8,
    position: Option<i64>,
}

impl Frame {
    /// Create a frame with the default background (opaque black) and no explicit position.
    ///
    /// Fails when the image has a zero dimension or `duration` is negative or not finite.
    pub fn new(image: impl IntoRaster, duration: f64) -> AnimatorResult<Self> {
        Self::from_shared(Arc::new(image.into_raster()), duration)
    }

    /// Like [`Frame::new`] but reuses an already shared raster.
    pub fn from_shared(image: Arc<RgbaImage>, duration: f64) -> AnimatorResult<Self> {
        let (w, h) = image.dimensions();
        if w == 0 || h == 0 {
            return Err(AnimatorError::invalid_frame(format!(
                "image must have non-zero area (got {w}x{h})"
            )));
        }
        validate_duration(duration)?;
        Ok(Self {
            image,
            duration,
            background: Rgba8::BLACK,
            position: None,
        })
    }

    pub fn with_background(mut self, background: Rgba8) -> Self {
        self.background = background;
        self
    }

    /// Set the ordering key used by [`order_frames`](crate::order_frames).
    pub fn with_position(mut self, position: i64) -> Self {
        self.position = Some(position);
        self
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn size(&self) -> Size {
        let (width, height) = self.image.dimensions();
        Size { width, height }
    }

    /// Display duration in seconds.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn background(&self) -> Rgba8 {
        self.background
    }

    pub fn position(&self) -> Option<i64> {
        self.position
    }
}

pub(crate) fn validate_duration(duration: f64) -> AnimatorResult<()> {
    if !duration.is_finite() || duration < 0.0 {
        return Err(AnimatorError::invalid_frame(format!(
            "duration must be finite and >= 0 (got {duration})"
        )));
    }
    Ok(())
}

/// Build one frame per image, all sharing `duration` and `background`.
///
/// Fails on the first image that cannot form a valid frame; nothing is skipped silently.
pub fn frames_from_images<I>(
    images: impl IntoIterator<Item = I>,
    duration: f64,
    background: Rgba8,
) -> AnimatorResult<Vec<Frame>>
where
    I: IntoRaster,
{
    images
        .into_iter()
        .enumerate()
        .map(|(i, img)| {
            Frame::new(img, duration)
                .map(|f| f.with_background(background))
                .map_err(|e| match e {
                    AnimatorError::InvalidFrame(msg) => {
                        AnimatorError::invalid_frame(format!("image {i}: {msg}"))
                    }
                    other => other,
                })
        })
        .collect()
}
