use image::RgbaImage;
use rayon::prelude::*;

use crate::{
    compose::{
        canvas::infer_canvas_size,
        composite::{CenterRounding, composite},
    },
    foundation::{
        core::Size,
        error::{AnimatorError, AnimatorResult},
    },
    frame::Frame,
};

/// Options shared by every frame of one compositing batch.
#[derive(Clone, Debug, Default)]
pub struct CompositeOptions {
    /// Explicit canvas size. When `None`, the canvas is inferred from the frames.
    pub canvas: Option<Size>,
    pub rounding: CenterRounding,
    /// Composite frames on a rayon pool instead of the calling thread.
    pub parallel: bool,
    /// Worker count for the parallel pool (`None` uses rayon's default). Must be >= 1 when set.
    pub threads: Option<usize>,
}

/// A canvas-sized raster ready for an encoder, in output order.
#[derive(Clone, Debug)]
pub struct CompositedFrame {
    /// 0-based position in the output sequence.
    pub index: usize,
    pub image: RgbaImage,
    /// Display duration in seconds, forwarded from the source frame.
    pub duration: f64,
}

/// Return frames in output order.
///
/// Frames sort ascending by their explicit position; a frame without one uses its insertion
/// index. The sort is stable, so ties keep insertion order and an unpositioned list comes back
/// unchanged.
pub fn order_frames(frames: &[Frame]) -> Vec<&Frame> {
    let mut keyed: Vec<(i64, &Frame)> = frames
        .iter()
        .enumerate()
        .map(|(i, f)| {
            let key = f
                .position()
                .unwrap_or_else(|| i64::try_from(i).unwrap_or(i64::MAX));
            (key, f)
        })
        .collect();
    keyed.sort_by_key(|(key, _)| *key);
    keyed.into_iter().map(|(_, f)| f).collect()
}

/// Order, size, and composite a whole batch of frames.
///
/// Either every frame composites and the full sequence is returned, or the first error is.
#[tracing::instrument(skip_all, fields(frames = frames.len(), parallel = opts.parallel))]
pub fn composite_frames(
    frames: &[Frame],
    opts: &CompositeOptions,
) -> AnimatorResult<Vec<CompositedFrame>> {
    let canvas = infer_canvas_size(frames, opts.canvas)?;
    let ordered = order_frames(frames);
    tracing::debug!(%canvas, explicit = opts.canvas.is_some(), "resolved canvas");

    let rounding = opts.rounding;
    let job = |(index, frame): (usize, &&Frame)| -> AnimatorResult<CompositedFrame> {
        Ok(CompositedFrame {
            index,
            image: composite(frame, canvas, rounding)?,
            duration: frame.duration(),
        })
    };

    if !opts.parallel {
        return ordered.iter().enumerate().map(job).collect();
    }

    let pool = build_thread_pool(opts.threads)?;
    pool.install(|| ordered.par_iter().enumerate().map(job).collect())
}

fn build_thread_pool(threads: Option<usize>) -> AnimatorResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(AnimatorError::validation(
            "compositing 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| AnimatorError::compositing(format!("failed to build rayon thread pool: {e}")))
}
