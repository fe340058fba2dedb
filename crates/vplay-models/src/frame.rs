//! Captured still frames.

/// A still frame rasterized from a mounted playable resource.
///
/// Produced on demand and handed to the caller immediately; the subsystem
/// keeps no copy.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedFrame {
    /// Encoded still image bytes (PNG)
    pub image: Vec<u8>,
    /// Playback position the frame was taken at, in seconds
    pub at_seconds: f64,
    /// Caller-side markup slots; always empty when produced here
    pub annotations: Vec<String>,
}

impl CapturedFrame {
    /// Create a frame with no annotations.
    pub fn new(image: Vec<u8>, at_seconds: f64) -> Self {
        Self {
            image,
            at_seconds,
            annotations: Vec::new(),
        }
    }
}
