use std::io::Write;
use std::sync::{Arc, Mutex};

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame as ImageFrame};

use crate::compose::batch::CompositedFrame;
use crate::encode::sink::{AnimationSink, SinkConfig, check_frame, frame_delay};
use crate::foundation::error::{AnimatorError, AnimatorResult};

/// NeuQuant speed passed to the GIF encoder (1 = best quality, 30 = fastest).
const GIF_SPEED: i32 = 10;

/// Sink that writes an animated GIF through `image`'s GIF encoder.
///
/// Quantization, LZW compression, and block layout are all done by the encoder. The stream is
/// staged in memory and copied to the writer in `end`, so trailer and flush errors surface there.
pub struct GifSink<W: Write> {
    writer: Option<W>,
    staged: StagedBytes,
    encoder: Option<GifEncoder<StagedBytes>>,
    cfg: Option<SinkConfig>,
    pushed: usize,
}

impl<W: Write> GifSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Some(writer),
            staged: StagedBytes::default(),
            encoder: None,
            cfg: None,
            pushed: 0,
        }
    }
}

/// Byte buffer the encoder writes into while the sink keeps a handle to read it back.
#[derive(Clone, Default)]
struct StagedBytes(Arc<Mutex<Vec<u8>>>);

impl StagedBytes {
    fn take(&self) -> AnimatorResult<Vec<u8>> {
        let mut bytes = self
            .0
            .lock()
            .map_err(|_| AnimatorError::encode("gif staging buffer is poisoned"))?;
        Ok(std::mem::take(&mut *bytes))
    }
}

impl Write for StagedBytes {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut bytes = self
            .0
            .lock()
            .map_err(|_| std::io::Error::other("gif staging buffer is poisoned"))?;
        bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn gif_repeat(loop_count: u16) -> Repeat {
    if loop_count == 0 {
        Repeat::Infinite
    } else {
        Repeat::Finite(loop_count)
    }
}

impl<W: Write + Send> AnimationSink for GifSink<W> {
    fn begin(&mut self, cfg: &SinkConfig) -> AnimatorResult<()> {
        if cfg.width > u32::from(u16::MAX) || cfg.height > u32::from(u16::MAX) {
            return Err(AnimatorError::validation(format!(
                "gif canvas {}x{} exceeds the 65535 pixel limit",
                cfg.width, cfg.height
            )));
        }
        if self.writer.is_none() || self.encoder.is_some() || self.cfg.is_some() {
            return Err(AnimatorError::encode("gif sink was already started"));
        }

        let mut encoder = GifEncoder::new_with_speed(self.staged.clone(), GIF_SPEED);
        encoder.set_repeat(gif_repeat(cfg.loop_count))?;
        tracing::debug!(
            width = cfg.width,
            height = cfg.height,
            frames = cfg.frame_count,
            loop_count = cfg.loop_count,
            "gif sink started"
        );

        self.encoder = Some(encoder);
        self.cfg = Some(*cfg);
        self.pushed = 0;
        Ok(())
    }

    fn push_frame(&mut self, frame: &CompositedFrame) -> AnimatorResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| AnimatorError::encode("gif sink not started"))?;
        check_frame(cfg, frame)?;

        let Some(encoder) = self.encoder.as_mut() else {
            return Err(AnimatorError::encode("gif sink is already finalized"));
        };
        let delay = Delay::from_saturating_duration(frame_delay(frame.duration));
        encoder.encode_frame(ImageFrame::from_parts(frame.image.clone(), 0, 0, delay))?;
        self.pushed += 1;
        Ok(())
    }

    fn end(&mut self) -> AnimatorResult<()> {
        let encoder = self
            .encoder
            .take()
            .ok_or_else(|| AnimatorError::encode("gif sink not started"))?;
        // The encoder writes the trailer on drop.
        drop(encoder);
        self.cfg = None;

        let bytes = self.staged.take()?;
        let mut writer = self
            .writer
            .take()
            .ok_or_else(|| AnimatorError::encode("gif sink was already finished"))?;
        writer
            .write_all(&bytes)
            .and_then(|()| writer.flush())
            .map_err(|e| AnimatorError::encode(format!("failed to write gif output: {e}")))?;
        tracing::debug!(frames = self.pushed, bytes = bytes.len(), "gif sink finished");
        Ok(())
    }
}
