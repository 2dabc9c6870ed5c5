use std::path::Path;

use anyhow::Context as _;

use crate::{
    compose::{
        batch::{CompositeOptions, composite_frames},
        composite::CenterRounding,
    },
    encode::{
        apng::ApngSink,
        ffmpeg::{DEFAULT_VIDEO_FPS, FfmpegSink, FfmpegSinkOpts, ensure_parent_dir},
        format::OutputFormat,
        gif::GifSink,
        sink::{AnimationSink, SinkConfig},
    },
    foundation::{
        core::{Rgba8, Size},
        error::{AnimatorError, AnimatorResult},
    },
    frame::Frame,
};

/// Options for [`animate`], [`encode_animation`], and [`write_animation`].
#[derive(Clone, Debug)]
pub struct AnimateOpts {
    /// Explicit canvas size; inferred from the frames when `None`.
    pub canvas: Option<Size>,
    pub rounding: CenterRounding,
    /// Animation loop count (`0` loops forever). Ignored by video output.
    pub loop_count: u16,
    /// Constant frame rate for video output.
    pub fps: u32,
    /// Color translucent pixels are flattened over for video output.
    pub video_background: Rgba8,
    /// Whether an existing output file may be replaced.
    pub overwrite: bool,
    /// Composite frames on a rayon pool.
    pub parallel: bool,
    pub threads: Option<usize>,
}

impl Default for AnimateOpts {
    fn default() -> Self {
        Self {
            canvas: None,
            rounding: CenterRounding::default(),
            loop_count: 0,
            fps: DEFAULT_VIDEO_FPS,
            video_background: Rgba8::BLACK,
            overwrite: true,
            parallel: false,
            threads: None,
        }
    }
}

impl AnimateOpts {
    pub fn composite_options(&self) -> CompositeOptions {
        CompositeOptions {
            canvas: self.canvas,
            rounding: self.rounding,
            parallel: self.parallel,
            threads: self.threads,
        }
    }
}

/// Summary of one [`animate`] run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimateStats {
    /// Canvas every frame was composited onto.
    pub canvas: Size,
    /// Frames handed to the sink.
    pub frames: usize,
    /// Sum of frame durations in seconds.
    pub total_duration: f64,
}

/// Composite `frames` and stream them into `sink`.
///
/// Every frame is composited before the sink is touched: when compositing fails, `begin` is
/// never called and no output is produced.
#[tracing::instrument(skip_all, fields(frames = frames.len()))]
pub fn animate(
    frames: &[Frame],
    opts: &AnimateOpts,
    sink: &mut dyn AnimationSink,
) -> AnimatorResult<AnimateStats> {
    let composited = composite_frames(frames, &opts.composite_options())?;
    let Some(first) = composited.first() else {
        return Err(AnimatorError::validation("no frames to encode"));
    };
    let (width, height) = first.image.dimensions();

    let cfg = SinkConfig {
        width,
        height,
        frame_count: composited.len(),
        loop_count: opts.loop_count,
    };
    sink.begin(&cfg)?;
    for frame in &composited {
        sink.push_frame(frame)?;
    }
    sink.end()?;

    let stats = AnimateStats {
        canvas: Size::new(width, height),
        frames: composited.len(),
        total_duration: composited.iter().map(|f| f.duration).sum(),
    };
    tracing::debug!(?stats, "animation encoded");
    Ok(stats)
}

/// Encode `frames` as an in-memory GIF or APNG.
///
/// Video output needs a file; use [`write_animation`] for it.
pub fn encode_animation(
    frames: &[Frame],
    format: OutputFormat,
    opts: &AnimateOpts,
) -> AnimatorResult<Vec<u8>> {
    encode_to_vec(frames, format, opts).map(|(bytes, _)| bytes)
}

fn encode_to_vec(
    frames: &[Frame],
    format: OutputFormat,
    opts: &AnimateOpts,
) -> AnimatorResult<(Vec<u8>, AnimateStats)> {
    let mut buf = Vec::new();
    let stats = match format {
        OutputFormat::Gif => {
            let mut sink = GifSink::new(&mut buf);
            animate(frames, opts, &mut sink)?
        }
        OutputFormat::Apng => {
            let mut sink = ApngSink::new(&mut buf);
            animate(frames, opts, &mut sink)?
        }
        OutputFormat::Video => {
            return Err(AnimatorError::validation(
                "video output must be written to a file (use write_animation)",
            ));
        }
    };
    Ok((buf, stats))
}

/// Encode `frames` to `path`, choosing the format from the file extension.
///
/// Parent directories are created as needed. GIF and APNG are encoded in memory first, so a
/// failed run never leaves a truncated file behind.
#[tracing::instrument(skip_all, fields(frames = frames.len(), path = %path.display()))]
pub fn write_animation(
    frames: &[Frame],
    path: &Path,
    opts: &AnimateOpts,
) -> AnimatorResult<AnimateStats> {
    let format = OutputFormat::from_path(path)?;
    if !opts.overwrite && path.exists() {
        return Err(AnimatorError::validation(format!(
            "output file '{}' already exists",
            path.display()
        )));
    }

    if format.is_in_memory() {
        let (bytes, stats) = encode_to_vec(frames, format, opts)?;
        ensure_parent_dir(path)?;
        std::fs::write(path, &bytes).with_context(|| format!("write '{}'", path.display()))?;
        return Ok(stats);
    }

    let mut sink = FfmpegSink::new(FfmpegSinkOpts {
        out_path: path.to_path_buf(),
        overwrite: opts.overwrite,
        fps: opts.fps,
        bg_rgba: opts.video_background,
    });
    animate(frames, opts, &mut sink)
}
