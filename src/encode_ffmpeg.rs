//! MP4 output through a piped system `ffmpeg` process.
//!
//! The system binary is used rather than linking FFmpeg so builds do
//! not need native dev headers. Frames arrive premultiplied from the
//! CPU backend and are flattened over the scene background before they
//! hit the pipe; yuv420p carries no alpha.

use std::{
    io::Read as _,
    path::Path,
    process::{Child, ChildStdin, Command, Stdio},
    thread::JoinHandle,
};

use crate::{
    core::Canvas,
    error::{VignetteError, VignetteResult},
    render::FrameRGBA,
    scene::Color,
};

pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

fn check_encodable(canvas: Canvas, fps: u32) -> VignetteResult<()> {
    if canvas.width == 0 || canvas.height == 0 {
        return Err(VignetteError::validation(
            "encode width/height must be non-zero",
        ));
    }
    if fps == 0 {
        return Err(VignetteError::validation("encode fps must be non-zero"));
    }
    if !canvas.width.is_multiple_of(2) || !canvas.height.is_multiple_of(2) {
        // yuv420p subsamples chroma 2x2.
        return Err(VignetteError::validation(
            "encode width/height must be even (required for yuv420p mp4 output)",
        ));
    }
    Ok(())
}

/// Streams premultiplied RGBA frames into `ffmpeg`, flattened over the
/// scene background, and muxes them as yuv420p H.264.
pub struct Mp4Encoder {
    canvas: Canvas,
    background: Color,
    child: Child,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<JoinHandle<String>>,
    scratch: Vec<u8>,
}

impl Mp4Encoder {
    pub fn create(
        out_path: &Path,
        canvas: Canvas,
        fps: u32,
        background: Color,
    ) -> VignetteResult<Self> {
        check_encodable(canvas, fps)?;

        if let Some(parent) = out_path.parent() {
            use anyhow::Context as _;
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create output directory '{}'", parent.display())
            })?;
        }

        if !is_ffmpeg_on_path() {
            return Err(VignetteError::evaluation(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        // Re-rendering the same scene is the normal workflow, so the
        // output is always overwritten.
        let mut child = Command::new("ffmpeg")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .arg("-y")
            .args([
                "-loglevel",
                "error",
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgba",
                "-s",
                &format!("{}x{}", canvas.width, canvas.height),
                "-r",
                &fps.to_string(),
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
            .arg(out_path)
            .spawn()
            .map_err(|e| {
                VignetteError::evaluation(format!(
                    "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
                ))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| VignetteError::evaluation("failed to open ffmpeg stdin (unexpected)"))?;

        // Drain stderr as it is produced so a chatty ffmpeg cannot fill
        // the pipe and stall the frame loop.
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| VignetteError::evaluation("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf);
            buf
        });

        Ok(Self {
            canvas,
            background,
            child,
            stdin: Some(stdin),
            stderr_drain: Some(stderr_drain),
            scratch: vec![0u8; canvas.width as usize * canvas.height as usize * 4],
        })
    }

    pub fn push_frame(&mut self, frame: &FrameRGBA) -> VignetteResult<()> {
        if frame.width != self.canvas.width || frame.height != self.canvas.height {
            return Err(VignetteError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, self.canvas.width, self.canvas.height
            )));
        }
        if frame.data.len() != self.scratch.len() {
            return Err(VignetteError::validation(
                "frame.data size mismatch with width*height*4",
            ));
        }

        flatten_over_background(&mut self.scratch, &frame.data, self.background)?;

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(VignetteError::evaluation(
                "ffmpeg encoder is already finalized",
            ));
        };

        use std::io::Write as _;
        stdin.write_all(&self.scratch).map_err(|e| {
            VignetteError::evaluation(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;

        Ok(())
    }

    pub fn finish(mut self) -> VignetteResult<()> {
        drop(self.stdin.take());

        let status = self.child.wait().map_err(|e| {
            VignetteError::evaluation(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;

        let stderr = self
            .stderr_drain
            .take()
            .and_then(|h| h.join().ok())
            .unwrap_or_default();

        if !status.success() {
            return Err(VignetteError::evaluation(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}

/// Composites premultiplied RGBA8 pixels over the opaque background
/// color and writes the result as opaque RGBA8.
fn flatten_over_background(dst: &mut [u8], src: &[u8], bg: Color) -> VignetteResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(VignetteError::validation(
            "flatten_over_background expects equal-length rgba8 buffers",
        ));
    }

    let bg = [u16::from(bg.r), u16::from(bg.g), u16::from(bg.b)];
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }

        let inv = 255 - a;
        for c in 0..3 {
            d[c] = (u16::from(s[c]) + mul_div255(bg[c], inv)).min(255) as u8;
        }
        d[3] = 255;
    }

    Ok(())
}

fn mul_div255(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn odd_dimensions_and_zero_fps_are_rejected() {
        let ok = Canvas {
            width: 64,
            height: 64,
        };
        assert!(check_encodable(ok, 30).is_ok());
        assert!(check_encodable(ok, 0).is_err());
        assert!(
            check_encodable(
                Canvas {
                    width: 0,
                    height: 64,
                },
                30
            )
            .is_err()
        );
        assert!(
            check_encodable(
                Canvas {
                    width: 63,
                    height: 64,
                },
                30
            )
            .is_err()
        );
    }

    #[test]
    fn flatten_premul_over_black_keeps_the_premul_rgb() {
        // Premultiplied red @ 50% alpha already carries rgb 128,0,0.
        let src = vec![128u8, 0u8, 0u8, 128u8];
        let mut dst = vec![0u8; 4];
        flatten_over_background(&mut dst, &src, Color::BLACK).unwrap();
        assert_eq!(dst, vec![128u8, 0u8, 0u8, 255u8]);
    }

    #[test]
    fn transparent_pixel_flattens_to_the_background() {
        let src = vec![0u8, 0u8, 0u8, 0u8];
        let mut dst = vec![0u8; 4];
        flatten_over_background(&mut dst, &src, Color::rgb(10, 20, 30)).unwrap();
        assert_eq!(dst, vec![10u8, 20u8, 30u8, 255u8]);
    }

    #[test]
    fn opaque_pixel_passes_through() {
        let src = vec![1u8, 2u8, 3u8, 255u8];
        let mut dst = vec![0u8; 4];
        flatten_over_background(&mut dst, &src, Color::WHITE).unwrap();
        assert_eq!(dst, src);
    }
}
