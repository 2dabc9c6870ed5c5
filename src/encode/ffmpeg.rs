use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};

use crate::compose::batch::CompositedFrame;
use crate::encode::sink::{AnimationSink, SinkConfig, check_frame};
use crate::foundation::core::Rgba8;
use crate::foundation::error::{AnimatorError, AnimatorResult};
use crate::foundation::math::flatten_over_opaque;

/// Default constant frame rate for video output.
pub const DEFAULT_VIDEO_FPS: u32 = 30;

/// Options for [`FfmpegSink`] video output.
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// Output file path; `ffmpeg` picks the container from the extension (`.mp4`, `.mov`, ...).
    pub out_path: PathBuf,
    /// Overwrite output file if it already exists.
    pub overwrite: bool,
    /// Constant output frame rate. Frame durations are quantized to this rate.
    pub fps: u32,
    /// Color that translucent canvas pixels are flattened over (alpha is ignored).
    pub bg_rgba: Rgba8,
}

impl FfmpegSinkOpts {
    /// Create options for writing a video to `out_path`.
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite: true,
            fps: DEFAULT_VIDEO_FPS,
            bg_rgba: Rgba8::BLACK,
        }
    }
}

/// Sink that spawns the system `ffmpeg` and streams raw RGBA frames to its stdin.
///
/// Output is H.264 in yuv420p, so the canvas must have even dimensions. A frame shown for
/// `duration` seconds is written `max(1, round(duration * fps))` times.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,

    scratch: Vec<u8>,
    cfg: Option<SinkConfig>,
    last_idx: Option<usize>,
    frames_written: u64,
}

impl FfmpegSink {
    /// Create a new sink that streams into `ffmpeg`.
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            child: None,
            stdin: None,
            stderr_drain: None,
            scratch: Vec::new(),
            cfg: None,
            last_idx: None,
            frames_written: 0,
        }
    }

    /// Close stdin, wait for `ffmpeg` to exit, and collect its stderr.
    fn shut_down(&mut self) -> AnimatorResult<(ExitStatus, String)> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| AnimatorError::encode("ffmpeg sink not started"))?;

        let status = child.wait().map_err(|e| {
            AnimatorError::encode(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| AnimatorError::encode("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| AnimatorError::encode(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };
        Ok((status, String::from_utf8_lossy(&stderr_bytes).trim().to_owned()))
    }

    /// Turn a failed stdin write into an error carrying ffmpeg's own diagnostics.
    ///
    /// A broken pipe almost always means ffmpeg already exited; its status and stderr explain why.
    fn write_failed(&mut self, err: std::io::Error) -> AnimatorError {
        self.cfg = None;
        match self.shut_down() {
            Ok((status, stderr)) if !status.success() => exited_with(status, &stderr),
            Ok((status, stderr)) => AnimatorError::encode(format!(
                "failed to write frame to ffmpeg stdin: {err} (ffmpeg {status}: {stderr})"
            )),
            Err(shutdown) => AnimatorError::encode(format!(
                "failed to write frame to ffmpeg stdin: {err} ({shutdown})"
            )),
        }
    }
}

fn exited_with(status: ExitStatus, stderr: &str) -> AnimatorError {
    AnimatorError::encode(format!("ffmpeg exited with status {status}: {stderr}"))
}

impl Drop for FfmpegSink {
    // An abandoned encode (an error between `begin` and `end`) must not leave a zombie behind.
    fn drop(&mut self) {
        if let Some(child) = self.child.as_mut() {
            drop(self.stdin.take());
            let _ = child.kill();
            let _ = child.wait();
            if let Some(handle) = self.stderr_drain.take() {
                let _ = handle.join();
            }
            tracing::debug!("ffmpeg sink dropped before end; child reaped");
        }
    }
}

/// Number of constant-rate video frames that represent `duration_secs`.
pub(crate) fn repeat_count(duration_secs: f64, fps: u32) -> u64 {
    let n = (duration_secs.max(0.0) * f64::from(fps)).round();
    if n >= u64::MAX as f64 {
        u64::MAX
    } else {
        (n as u64).max(1)
    }
}

impl AnimationSink for FfmpegSink {
    fn begin(&mut self, cfg: &SinkConfig) -> AnimatorResult<()> {
        if self.opts.fps == 0 {
            return Err(AnimatorError::validation("fps must be non-zero"));
        }
        if cfg.width == 0 || cfg.height == 0 {
            return Err(AnimatorError::validation(
                "ffmpeg sink width/height must be non-zero",
            ));
        }
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(AnimatorError::validation(
                "ffmpeg sink width/height must be even (required for yuv420p output)",
            ));
        }

        ensure_parent_dir(&self.opts.out_path)?;
        if !self.opts.overwrite && self.opts.out_path.exists() {
            return Err(AnimatorError::validation(format!(
                "output file '{}' already exists",
                self.opts.out_path.display()
            )));
        }

        if !is_ffmpeg_on_path() {
            return Err(AnimatorError::encode(
                "ffmpeg is required for video encoding, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        if self.opts.overwrite {
            cmd.arg("-y");
        } else {
            cmd.arg("-n");
        }

        // Input: opaque RGBA8 frames (flattened in push_frame).
        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
            "-r",
            &self.opts.fps.to_string(),
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ])
        .arg(&self.opts.out_path);

        tracing::debug!(
            out = %self.opts.out_path.display(),
            width = cfg.width,
            height = cfg.height,
            fps = self.opts.fps,
            "spawning ffmpeg"
        );
        let mut child = cmd.spawn().map_err(|e| {
            AnimatorError::encode(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| AnimatorError::encode("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| AnimatorError::encode("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        let len = (cfg.width as usize) * (cfg.height as usize) * 4;
        self.scratch = vec![0u8; len];
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.cfg = Some(*cfg);
        self.last_idx = None;
        self.frames_written = 0;
        Ok(())
    }

    fn push_frame(&mut self, frame: &CompositedFrame) -> AnimatorResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| AnimatorError::encode("ffmpeg sink not started"))?;
        if let Some(last) = self.last_idx
            && frame.index <= last
        {
            return Err(AnimatorError::encode(
                "ffmpeg sink received out-of-order frame index",
            ));
        }
        self.last_idx = Some(frame.index);
        check_frame(cfg, frame)?;

        let bg = self.opts.bg_rgba;
        flatten_over_opaque(&mut self.scratch, frame.image.as_raw(), [bg.r, bg.g, bg.b]);

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(AnimatorError::encode("ffmpeg sink is already finalized"));
        };

        use std::io::Write as _;
        let mut written = Ok(());
        for _ in 0..repeat_count(frame.duration, self.opts.fps) {
            written = stdin.write_all(&self.scratch);
            if written.is_err() {
                break;
            }
            self.frames_written += 1;
        }
        written.map_err(|e| self.write_failed(e))
    }

    fn end(&mut self) -> AnimatorResult<()> {
        let (status, stderr) = self.shut_down()?;
        self.cfg = None;
        if !status.success() {
            return Err(exited_with(status, &stderr));
        }

        tracing::debug!(video_frames = self.frames_written, "ffmpeg sink finished");
        Ok(())
    }
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> AnimatorResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    std::process::Command::new("ffmpeg")
        .arg("-version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeat_count_rounds_and_has_floor_of_one() {
        assert_eq!(repeat_count(1.0, 30), 30);
        assert_eq!(repeat_count(0.05, 30), 2);
        assert_eq!(repeat_count(0.0, 30), 1);
        assert_eq!(repeat_count(0.01, 30), 1);
    }

    #[test]
    fn odd_canvas_is_rejected_before_spawning() {
        let mut sink = FfmpegSink::new(FfmpegSinkOpts::new("target/ffmpeg_odd/out.mp4"));
        let err = sink
            .begin(&SinkConfig {
                width: 11,
                height: 10,
                frame_count: 1,
                loop_count: 0,
            })
            .unwrap_err();
        assert!(matches!(err, AnimatorError::Validation(_)));
    }

    #[test]
    fn zero_fps_is_rejected() {
        let mut opts = FfmpegSinkOpts::new("target/ffmpeg_fps/out.mp4");
        opts.fps = 0;
        let mut sink = FfmpegSink::new(opts);
        assert!(
            sink.begin(&SinkConfig {
                width: 10,
                height: 10,
                frame_count: 1,
                loop_count: 0,
            })
            .is_err()
        );
    }

    #[test]
    fn end_before_begin_is_an_error() {
        let mut sink = FfmpegSink::new(FfmpegSinkOpts::new("target/ffmpeg_end/out.mp4"));
        assert!(sink.end().is_err());
    }
}
