use std::path::Path;

use anyhow::Context as _;
use image::RgbaImage;

use crate::foundation::error::AnimatorResult;

/// Decode an encoded image (PNG, JPEG, GIF first frame, ...) into straight-alpha RGBA8.
pub fn decode_image(bytes: &[u8]) -> AnimatorResult<RgbaImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    Ok(dyn_img.into_rgba8())
}

/// Read and decode an image file.
pub fn load_image(path: &Path) -> AnimatorResult<RgbaImage> {
    let bytes =
        std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
    let dyn_img = image::load_from_memory(&bytes)
        .with_context(|| format!("decode image '{}'", path.display()))?;
    Ok(dyn_img.into_rgba8())
}
