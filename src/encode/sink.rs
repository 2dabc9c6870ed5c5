use std::time::Duration;

use crate::compose::batch::CompositedFrame;
use crate::foundation::error::{AnimatorError, AnimatorResult};

/// Configuration provided to an [`AnimationSink`] before any frames are pushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkConfig {
    /// Canvas width in pixels; every pushed frame has this width.
    pub width: u32,
    /// Canvas height in pixels; every pushed frame has this height.
    pub height: u32,
    /// Number of frames that will be pushed.
    pub frame_count: usize,
    /// Animation loop count. `0` loops forever.
    pub loop_count: u16,
}

/// Sink contract for consuming composited frames.
///
/// Ordering contract: `push_frame` is called in output order (`CompositedFrame::index` strictly
/// increasing), and every frame matches the size announced in `begin`.
pub trait AnimationSink: Send {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: &SinkConfig) -> AnimatorResult<()>;
    /// Push one frame in output order.
    fn push_frame(&mut self, frame: &CompositedFrame) -> AnimatorResult<()>;
    /// Called once after the last frame is pushed.
    fn end(&mut self) -> AnimatorResult<()>;
}

/// In-memory sink for tests and for callers that drive their own encoder.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<CompositedFrame>,
    finished: bool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the sink configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    /// Borrow the captured frames.
    pub fn frames(&self) -> &[CompositedFrame] {
        &self.frames
    }

    /// `true` once `end` has been called.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl AnimationSink for InMemorySink {
    fn begin(&mut self, cfg: &SinkConfig) -> AnimatorResult<()> {
        self.cfg = Some(*cfg);
        self.frames.clear();
        self.finished = false;
        Ok(())
    }

    fn push_frame(&mut self, frame: &CompositedFrame) -> AnimatorResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| AnimatorError::encode("in-memory sink not started"))?;
        check_frame(cfg, frame)?;
        self.frames.push(frame.clone());
        Ok(())
    }

    fn end(&mut self) -> AnimatorResult<()> {
        self.finished = true;
        Ok(())
    }
}

/// Reject frames whose size differs from the announced canvas.
pub(crate) fn check_frame(cfg: &SinkConfig, frame: &CompositedFrame) -> AnimatorResult<()> {
    let (w, h) = frame.image.dimensions();
    if w != cfg.width || h != cfg.height {
        return Err(AnimatorError::validation(format!(
            "frame size mismatch: got {w}x{h}, expected {}x{}",
            cfg.width, cfg.height
        )));
    }
    Ok(())
}

/// Convert a frame duration in seconds to a `Duration`, saturating on huge values.
pub(crate) fn frame_delay(duration_secs: f64) -> Duration {
    Duration::try_from_secs_f64(duration_secs.max(0.0)).unwrap_or(Duration::MAX)
}

#[cfg(test)]
mod tests {
    use image::RgbaImage;

    use super::*;

    fn cfg() -> SinkConfig {
        SinkConfig {
            width: 2,
            height: 2,
            frame_count: 1,
            loop_count: 0,
        }
    }

    fn composited(w: u32, h: u32) -> CompositedFrame {
        CompositedFrame {
            index: 0,
            image: RgbaImage::new(w, h),
            duration: 0.5,
        }
    }

    #[test]
    fn in_memory_sink_captures_frames() {
        let mut sink = InMemorySink::new();
        sink.begin(&cfg()).unwrap();
        sink.push_frame(&composited(2, 2)).unwrap();
        sink.end().unwrap();
        assert_eq!(sink.config(), Some(cfg()));
        assert_eq!(sink.frames().len(), 1);
        assert!(sink.is_finished());
    }

    #[test]
    fn in_memory_sink_rejects_wrong_size() {
        let mut sink = InMemorySink::new();
        sink.begin(&cfg()).unwrap();
        assert!(matches!(
            sink.push_frame(&composited(3, 2)),
            Err(AnimatorError::Validation(_))
        ));
    }

    #[test]
    fn push_before_begin_is_an_error() {
        let mut sink = InMemorySink::new();
        assert!(sink.push_frame(&composited(2, 2)).is_err());
    }

    #[test]
    fn frame_delay_saturates() {
        assert_eq!(frame_delay(0.25), Duration::from_millis(250));
        assert_eq!(frame_delay(1e300), Duration::MAX);
    }
}
