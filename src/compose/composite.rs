use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::{
    foundation::{
        core::Size,
        error::{AnimatorError, AnimatorResult},
        math::over_straight,
    },
    frame::Frame,
};

/// How a fractional centering offset snaps to the pixel grid.
///
/// The offset is `(canvas - image) / 2`; it is fractional only when the size difference is odd,
/// and all rules agree when it is even.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CenterRounding {
    /// Round toward negative infinity. The extra pixel of margin goes right/bottom.
    #[default]
    Floor,
    /// Truncate toward zero. Same as `Floor` for images smaller than the canvas.
    TowardZero,
    /// Round toward positive infinity. The extra pixel of margin goes left/top.
    Ceil,
}

impl CenterRounding {
    /// Top-left offset of an `image`-sized span centered in a `canvas`-sized span.
    ///
    /// Negative when the image is larger than the canvas.
    pub fn center_offset(self, canvas: u32, image: u32) -> i64 {
        let diff = i64::from(canvas) - i64::from(image);
        match self {
            Self::Floor => diff.div_euclid(2),
            Self::TowardZero => diff / 2,
            Self::Ceil => -(-diff).div_euclid(2),
        }
    }
}

/// Draw `frame` centered on a fresh `canvas`-sized raster filled with the frame's background.
///
/// The image is drawn unscaled with straight-alpha source-over against the fill, so opaque
/// source pixels are copied exactly. Parts of an image larger than the canvas are clipped.
/// The frame's own raster is never modified.
pub fn composite(
    frame: &Frame,
    canvas: Size,
    rounding: CenterRounding,
) -> AnimatorResult<RgbaImage> {
    if canvas.is_empty() {
        return Err(AnimatorError::invalid_canvas(canvas.width, canvas.height));
    }
    let len = canvas.rgba8_len().ok_or_else(|| {
        AnimatorError::compositing(format!("canvas {canvas} is too large to address"))
    })?;

    let mut buf: Vec<u8> = Vec::new();
    buf.try_reserve_exact(len).map_err(|e| {
        AnimatorError::compositing(format!("failed to allocate {canvas} canvas: {e}"))
    })?;
    let bg = frame.background().to_array();
    for _ in 0..len / 4 {
        buf.extend_from_slice(&bg);
    }

    let src = frame.image();
    let (sw, sh) = src.dimensions();
    let ox = rounding.center_offset(canvas.width, sw);
    let oy = rounding.center_offset(canvas.height, sh);

    // Visible source rect, in source coordinates.
    let x0 = (-ox).max(0);
    let x1 = i64::from(sw).min(i64::from(canvas.width) - ox);
    let y0 = (-oy).max(0);
    let y1 = i64::from(sh).min(i64::from(canvas.height) - oy);

    if x0 < x1 && y0 < y1 {
        let src_raw = src.as_raw();
        let src_stride = sw as usize * 4;
        let dst_stride = canvas.width as usize * 4;
        let span = (x1 - x0) as usize * 4;
        let src_x = x0 as usize * 4;
        let dst_x = (x0 + ox) as usize * 4;

        for sy in y0..y1 {
            let dy = (sy + oy) as usize;
            let s_off = sy as usize * src_stride + src_x;
            let d_off = dy * dst_stride + dst_x;
            let src_row = &src_raw[s_off..s_off + span];
            let dst_row = &mut buf[d_off..d_off + span];
            for (d, s) in dst_row.chunks_exact_mut(4).zip(src_row.chunks_exact(4)) {
                let out = over_straight([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
                d.copy_from_slice(&out);
            }
        }
    }

    RgbaImage::from_raw(canvas.width, canvas.height, buf)
        .ok_or_else(|| AnimatorError::compositing("canvas buffer does not match its dimensions"))
}
