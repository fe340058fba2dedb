#![deny(unreachable_patterns)]
//! Media normalization and playback-cache subsystem.
//!
//! Accepts an arbitrary user-supplied video file, determines whether it can
//! be played back directly, transcodes it into the canonical playable
//! format when it cannot, and manages a bounded, time-expiring cache of the
//! resulting playable resources so repeated requests for the same source
//! are served without re-encoding.
//!
//! Everything is local and in-process; the UI layer consumes the pipeline's
//! state stream and nothing else.

pub mod cache;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod service;

pub use cache::{CachedResource, ResourceCache, SharedCache};
pub use config::{PlayerConfig, CACHE_TTL_SECS, MAX_CACHE_ENTRIES, PROBE_TIMEOUT_SECS};
pub use error::{PlayerError, PlayerResult};
pub use pipeline::{PipelineUpdate, PlaybackPipeline, SubmissionId};
pub use service::EngineService;

// The models and engine boundary are part of this crate's public surface.
pub use vplay_media::{
    EngineEvent, EngineEventCallback, FfmpegEngine, FfmpegFrameExtractor, FfprobeProbe,
    FrameExtractor, MediaError, MediaResult, PlayabilityProbe, ProbeOutcome, TranscodeEngine,
};
pub use vplay_models::{
    CapturedFrame, Fingerprint, PipelineState, ResourceHandle, SourceFile,
};
