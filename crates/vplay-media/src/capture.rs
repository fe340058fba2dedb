//! Frame extraction from mounted playable resources.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use vplay_models::{CapturedFrame, ResourceHandle};

use crate::error::{MediaError, MediaResult};
use crate::probe::probe_media;
use crate::surface::MountedSurface;

/// Rasterizes the frame at a playback position into an encoded still image.
#[async_trait]
pub trait FrameExtractor: Send + Sync {
    /// Render exactly `width x height` pixels from the resource at
    /// `at_seconds`. Fails with the capture error class when no decoded
    /// frame is available.
    async fn capture(
        &self,
        handle: &ResourceHandle,
        at_seconds: f64,
        width: u32,
        height: u32,
    ) -> MediaResult<CapturedFrame>;
}

/// FFmpeg-backed extractor producing PNG stills.
///
/// The source resolution is resampled to the requested raster; for fixed
/// inputs the output is deterministic.
#[derive(Debug, Default)]
pub struct FfmpegFrameExtractor;

impl FfmpegFrameExtractor {
    /// Create an extractor.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FrameExtractor for FfmpegFrameExtractor {
    async fn capture(
        &self,
        handle: &ResourceHandle,
        at_seconds: f64,
        width: u32,
        height: u32,
    ) -> MediaResult<CapturedFrame> {
        let bytes = handle
            .bytes()
            .ok_or_else(|| MediaError::capture("resource handle has been released"))?;

        which::which("ffmpeg")
            .map_err(|_| MediaError::capture("ffmpeg not found in PATH"))?;

        let surface = MountedSurface::mount(&bytes, "mp4").await?;

        // Clamp the seek position into the decodable range when the surface
        // metadata is readable; otherwise take the position as requested.
        let position = match probe_media(surface.path()).await {
            Ok(info) if info.duration > 0.0 => at_seconds.clamp(0.0, info.duration),
            _ => at_seconds.max(0.0),
        };

        let out = tempfile::Builder::new()
            .prefix("vplay-frame-")
            .suffix(".png")
            .tempfile()?;

        let output = Command::new("ffmpeg")
            .args([
                "-y",
                "-hide_banner",
                "-nostdin",
                "-ss",
                &format!("{:.3}", position),
            ])
            .arg("-i")
            .arg(surface.path())
            .args([
                "-vframes",
                "1",
                "-vf",
                &format!("scale={}:{}", width, height),
            ])
            .arg(out.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            return Err(MediaError::capture(format!(
                "frame render failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let image = tokio::fs::read(out.path()).await?;
        if image.is_empty() {
            return Err(MediaError::capture("no decoded frame available"));
        }

        debug!(
            at_seconds = position,
            width = width,
            height = height,
            size = image.len(),
            "captured frame"
        );
        Ok(CapturedFrame::new(image, position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_released_handle_is_a_capture_error() {
        let handle = ResourceHandle::new(vec![0u8; 8]);
        handle.release();

        let err = FfmpegFrameExtractor::new()
            .capture(&handle, 0.0, 320, 240)
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::Capture(_)));
    }
}
