use crate::{
    foundation::{
        core::Size,
        error::{AnimatorError, AnimatorResult},
    },
    frame::Frame,
};

/// Resolve the common output canvas for `frames`.
///
/// An explicit size is used verbatim, even when some frames are larger (those get center-cropped
/// by [`composite`](crate::composite)). Otherwise the canvas is the per-axis maximum over all
/// frames, so no frame is cropped. An empty list resolves to `0x0`.
///
/// This is the validation gate for everything downstream: a resolved size with a zero dimension
/// fails with [`AnimatorError::InvalidCanvas`].
pub fn infer_canvas_size(frames: &[Frame], explicit: Option<Size>) -> AnimatorResult<Size> {
    let size = match explicit {
        Some(size) => size,
        None => frames.iter().map(Frame::size).fold(Size::default(), |acc, s| {
            Size::new(acc.width.max(s.width), acc.height.max(s.height))
        }),
    };

    if size.is_empty() {
        return Err(AnimatorError::invalid_canvas(size.width, size.height));
    }
    Ok(size)
}
