//! Error types for the playback pipeline.

use thiserror::Error;

use vplay_media::MediaError;

/// Result type for pipeline operations.
pub type PlayerResult<T> = Result<T, PlayerError>;

/// Errors surfaced to pipeline callers.
#[derive(Debug, Error)]
pub enum PlayerError {
    /// Frame capture was requested while no resource is mounted.
    #[error("no decoded frame available: no resource is ready")]
    NoFrameAvailable,

    /// An engine-boundary error.
    #[error(transparent)]
    Media(#[from] MediaError),
}
