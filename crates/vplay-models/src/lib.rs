//! Shared data models for the playback normalization subsystem.
//!
//! This crate provides the types shared between the engine boundary and
//! the playback pipeline:
//! - Source files and their cache fingerprints
//! - Revocable handles to playable bytes
//! - Pipeline state machine states
//! - Captured still frames
//! - Canonical encoding constants and the fixed transcode argv

pub mod encoding;
pub mod fingerprint;
pub mod frame;
pub mod handle;
pub mod source;
pub mod state;

// Re-export common types
pub use encoding::{canonical_transcode_args, CANONICAL_CONTAINER_EXT, CANONICAL_MEDIA_TYPE};
pub use fingerprint::Fingerprint;
pub use frame::CapturedFrame;
pub use handle::ResourceHandle;
pub use source::SourceFile;
pub use state::PipelineState;
