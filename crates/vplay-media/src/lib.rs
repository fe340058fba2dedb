#![deny(unreachable_patterns)]
//! Engine boundary for the playback normalization subsystem.
//!
//! This crate provides:
//! - The transcode engine contract and its FFmpeg-backed implementation
//!   (sandboxed working directory, log/progress event taps)
//! - Progress estimation from structured events with a log-clock fallback
//! - The direct-playability probe with a bounded metadata wait
//! - Frame extraction into encoded stills

pub mod capture;
pub mod engine;
pub mod error;
pub mod probe;
pub mod progress;
pub mod surface;

pub use capture::{FfmpegFrameExtractor, FrameExtractor};
pub use engine::{EngineEvent, EngineEventCallback, FfmpegEngine, TranscodeEngine};
pub use error::{MediaError, MediaResult};
pub use probe::{
    probe_media, FfprobeProbe, PlayabilityProbe, ProbeOutcome, VideoInfo,
    DEFAULT_PROBE_TIMEOUT_SECS,
};
pub use progress::{LogClockEstimator, ProgressEstimator, ProgressTracker, StructuredEstimator};
pub use surface::MountedSurface;
