//! Error types for media operations.

use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur at the engine boundary.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("engine initialization failed: {message}")]
    EngineInit { message: String },

    #[error("direct-load probe timed out after {0} seconds")]
    ProbeTimeout(u64),

    #[error("probe failed: {message}")]
    ProbeFailed { message: String },

    #[error("transcode failed: {message}")]
    TranscodeFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("frame capture failed: {0}")]
    Capture(String),

    #[error("security violation: {0}")]
    SecurityViolation(String),

    #[error("invalid video file: {0}")]
    InvalidVideo(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl MediaError {
    /// Create an engine initialization error.
    pub fn engine_init(message: impl Into<String>) -> Self {
        Self::EngineInit {
            message: message.into(),
        }
    }

    /// Create a probe failure error.
    pub fn probe_failed(message: impl Into<String>) -> Self {
        Self::ProbeFailed {
            message: message.into(),
        }
    }

    /// Create a transcode failure error.
    pub fn transcode_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::TranscodeFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create a frame capture error.
    pub fn capture(message: impl Into<String>) -> Self {
        Self::Capture(message.into())
    }

    /// Whether this error is fatal for all transcodes until the engine is
    /// reloaded.
    pub fn is_engine_init(&self) -> bool {
        matches!(self, Self::EngineInit { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_message() {
        let err = MediaError::transcode_failed("exit status 1", None, Some(1));
        assert!(err.to_string().contains("exit status 1"));
    }

    #[test]
    fn test_engine_init_classification() {
        assert!(MediaError::engine_init("no binary").is_engine_init());
        assert!(!MediaError::capture("no frame").is_engine_init());
    }
}
