use std::io::Write;

use crate::compose::batch::CompositedFrame;
use crate::encode::sink::{AnimationSink, SinkConfig, check_frame};
use crate::foundation::error::{AnimatorError, AnimatorResult};

/// Sink that writes an animated PNG through the `png` crate.
///
/// The frame count must be known up front (it goes into the `acTL` chunk), so `begin` uses
/// `SinkConfig::frame_count` and `end` fails if a different number of frames was pushed.
pub struct ApngSink<W: Write> {
    writer: Option<W>,
    stream: Option<png::Writer<W>>,
    cfg: Option<SinkConfig>,
    pushed: usize,
}

impl<W: Write> ApngSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Some(writer),
            stream: None,
            cfg: None,
            pushed: 0,
        }
    }
}

/// Frame delay as an `fcTL` fraction in milliseconds.
fn apng_delay(duration_secs: f64) -> (u16, u16) {
    let ms = (duration_secs.max(0.0) * 1000.0).round();
    let ms = if ms >= f64::from(u16::MAX) {
        u16::MAX
    } else {
        ms as u16
    };
    (ms, 1000)
}

impl<W: Write + Send> AnimationSink for ApngSink<W> {
    fn begin(&mut self, cfg: &SinkConfig) -> AnimatorResult<()> {
        if cfg.frame_count == 0 {
            return Err(AnimatorError::validation(
                "apng output needs at least one frame",
            ));
        }
        let num_frames = u32::try_from(cfg.frame_count).map_err(|_| {
            AnimatorError::validation(format!("too many frames for apng: {}", cfg.frame_count))
        })?;
        let writer = self
            .writer
            .take()
            .ok_or_else(|| AnimatorError::encode("apng sink was already started"))?;

        let mut encoder = png::Encoder::new(writer, cfg.width, cfg.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_animated(num_frames, u32::from(cfg.loop_count))?;
        let stream = encoder.write_header()?;
        tracing::debug!(
            width = cfg.width,
            height = cfg.height,
            frames = cfg.frame_count,
            loop_count = cfg.loop_count,
            "apng sink started"
        );

        self.stream = Some(stream);
        self.cfg = Some(*cfg);
        self.pushed = 0;
        Ok(())
    }

    fn push_frame(&mut self, frame: &CompositedFrame) -> AnimatorResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| AnimatorError::encode("apng sink not started"))?;
        check_frame(cfg, frame)?;
        if self.pushed >= cfg.frame_count {
            return Err(AnimatorError::encode(format!(
                "apng sink announced {} frames but received more",
                cfg.frame_count
            )));
        }

        let Some(stream) = self.stream.as_mut() else {
            return Err(AnimatorError::encode("apng sink is already finalized"));
        };
        let (num, den) = apng_delay(frame.duration);
        stream.set_frame_delay(num, den)?;
        stream.write_image_data(frame.image.as_raw())?;
        self.pushed += 1;
        Ok(())
    }

    fn end(&mut self) -> AnimatorResult<()> {
        let stream = self
            .stream
            .take()
            .ok_or_else(|| AnimatorError::encode("apng sink not started"))?;
        let expected = self.cfg.take().map(|c| c.frame_count).unwrap_or_default();
        if self.pushed != expected {
            return Err(AnimatorError::encode(format!(
                "apng sink announced {expected} frames but received {}",
                self.pushed
            )));
        }
        stream.finish()?;
        tracing::debug!(frames = self.pushed, "apng sink finished");
        Ok(())
    }
}
