//! Pipeline state machine states.

use std::fmt;

use crate::handle::ResourceHandle;

/// State of a playback pipeline instance.
///
/// Exactly one state is active per pipeline at any time. Transitions are
/// monotonic within a submission:
///
/// ```text
/// Idle --submit--> LoadingEngine --engine ready--> Processing --success--> Ready
/// LoadingEngine | Processing --failure--> Error
/// Ready | Error --submit(new file)--> Idle (immediately re-entered)
/// ```
///
/// Cache hits and direct-playable files jump from `Idle` to `Ready` without
/// touching the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineState {
    /// No submission in flight
    Idle,
    /// Waiting for the shared transcode engine to finish loading
    LoadingEngine,
    /// Transcode in progress
    Processing {
        /// Completion estimate, 0-100
        percent: u8,
    },
    /// A playable resource is mounted
    Ready {
        /// Handle to the playable bytes (shared with the cache)
        handle: ResourceHandle,
    },
    /// The submission failed; no automatic retry
    Error {
        /// Human-readable failure description
        message: String,
    },
}

impl PipelineState {
    /// Get string representation of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::Idle => "idle",
            PipelineState::LoadingEngine => "loading_engine",
            PipelineState::Processing { .. } => "processing",
            PipelineState::Ready { .. } => "ready",
            PipelineState::Error { .. } => "error",
        }
    }

    /// Check if this is a terminal state for the current submission.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineState::Ready { .. } | PipelineState::Error { .. }
        )
    }

    /// The mounted handle, when the state is `Ready`.
    pub fn handle(&self) -> Option<&ResourceHandle> {
        match self {
            PipelineState::Ready { handle } => Some(handle),
            _ => None,
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Processing { percent } => write!(f, "processing ({}%)", percent),
            PipelineState::Error { message } => write!(f, "error: {}", message),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!PipelineState::Idle.is_terminal());
        assert!(!PipelineState::LoadingEngine.is_terminal());
        assert!(!PipelineState::Processing { percent: 50 }.is_terminal());
        assert!(PipelineState::Ready {
            handle: ResourceHandle::new(vec![0u8; 1])
        }
        .is_terminal());
        assert!(PipelineState::Error {
            message: "boom".into()
        }
        .is_terminal());
    }

    #[test]
    fn test_handle_accessor() {
        let handle = ResourceHandle::new(vec![0u8; 1]);
        let ready = PipelineState::Ready {
            handle: handle.clone(),
        };
        assert_eq!(ready.handle(), Some(&handle));
        assert!(PipelineState::Idle.handle().is_none());
    }

    #[test]
    fn test_display() {
        assert_eq!(PipelineState::Processing { percent: 42 }.to_string(), "processing (42%)");
        assert_eq!(PipelineState::Idle.to_string(), "idle");
    }
}
