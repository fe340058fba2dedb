//! Direct-playability probing.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::debug;

use vplay_models::{ResourceHandle, SourceFile};

use crate::error::{MediaError, MediaResult};
use crate::surface::MountedSurface;

/// Default bound on the direct-load metadata wait, in seconds.
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 3;

/// Classification of a probed file.
#[derive(Debug)]
pub enum ProbeOutcome {
    /// The file decodes as-is; the handle wraps the original bytes.
    Playable(ResourceHandle),
    /// Metadata did not become ready in time (or failed to decode); the
    /// file goes through the transcode path.
    NeedsTranscode,
}

/// Attempts to load file metadata through a minimal decode probe.
#[async_trait]
pub trait PlayabilityProbe: Send + Sync {
    /// Classify a file as playable as-is or requiring a transcode.
    async fn probe(&self, file: &SourceFile) -> ProbeOutcome;
}

/// Video file information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoInfo {
    /// Duration in seconds
    pub duration: f64,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Frame rate (fps)
    pub fps: f64,
    /// Video codec
    pub codec: String,
    /// Container size in bytes
    pub size: u64,
    /// Overall bitrate in bits per second, when the container reports it
    pub bitrate: Option<u64>,
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
    size: Option<String>,
    bit_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
}

/// Probe a mounted media file for information.
pub async fn probe_media(path: impl AsRef<Path>) -> MediaResult<VideoInfo> {
    let path = path.as_ref();

    which::which("ffprobe")
        .map_err(|_| MediaError::probe_failed("ffprobe not found in PATH"))?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::probe_failed(
            String::from_utf8_lossy(&output.stderr).to_string(),
        ));
    }

    let probe: FfprobeOutput = serde_json::from_slice(&output.stdout)?;

    let video_stream = probe
        .streams
        .iter()
        .find(|s| s.codec_type == "video")
        .ok_or_else(|| MediaError::InvalidVideo("no video stream found".to_string()))?;

    let duration = probe
        .format
        .duration
        .as_ref()
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0);

    let fps = video_stream
        .avg_frame_rate
        .as_ref()
        .or(video_stream.r_frame_rate.as_ref())
        .and_then(|r| parse_frame_rate(r))
        .unwrap_or(30.0);

    let size = probe
        .format
        .size
        .as_ref()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0);

    let bitrate = probe
        .format
        .bit_rate
        .as_ref()
        .and_then(|b| b.parse::<u64>().ok());

    Ok(VideoInfo {
        duration,
        width: video_stream.width.unwrap_or(0),
        height: video_stream.height.unwrap_or(0),
        fps,
        codec: video_stream.codec_name.clone().unwrap_or_default(),
        size,
        bitrate,
    })
}

/// Parse frame rate string (e.g., "30/1" or "29.97").
fn parse_frame_rate(s: &str) -> Option<f64> {
    if let Some((num, den)) = s.split_once('/') {
        let num: f64 = num.parse().ok()?;
        let den: f64 = den.parse().ok()?;
        if den > 0.0 {
            return Some(num / den);
        }
    }
    s.parse().ok()
}

/// FFprobe-backed prober with a bounded metadata wait.
pub struct FfprobeProbe {
    timeout_secs: u64,
}

impl FfprobeProbe {
    /// Create a prober with the default 3 second bound.
    pub fn new() -> Self {
        Self {
            timeout_secs: DEFAULT_PROBE_TIMEOUT_SECS,
        }
    }

    /// Create a prober with a custom bound.
    pub fn with_timeout(timeout_secs: u64) -> Self {
        Self { timeout_secs }
    }

    async fn try_probe(&self, file: &SourceFile) -> MediaResult<VideoInfo> {
        // The surface is dropped on every exit path, so a failed probe
        // never leaks its decode resources.
        let surface = MountedSurface::mount(
            &file.data,
            file.extension().as_deref().unwrap_or("mp4"),
        )
        .await?;

        tokio::time::timeout(
            Duration::from_secs(self.timeout_secs),
            probe_media(surface.path()),
        )
        .await
        .map_err(|_| MediaError::ProbeTimeout(self.timeout_secs))?
    }
}

impl Default for FfprobeProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlayabilityProbe for FfprobeProbe {
    async fn probe(&self, file: &SourceFile) -> ProbeOutcome {
        match self.try_probe(file).await {
            Ok(info) => {
                debug!(
                    name = %file.name,
                    codec = %info.codec,
                    duration = info.duration,
                    "file is directly playable"
                );
                ProbeOutcome::Playable(ResourceHandle::new(file.data.clone()))
            }
            Err(e) => {
                // Not a user-facing error; the transcode path takes over.
                debug!(name = %file.name, error = %e, "direct-load probe fell through");
                ProbeOutcome::NeedsTranscode
            }
        }
    }
}
