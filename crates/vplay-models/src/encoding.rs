//! Canonical encoding target.
//!
//! All transcoded results are normalized to a single fixed format so cache
//! entries stay interchangeable across requests for the same source. None of
//! these parameters are user-configurable.

/// Canonical container extension
pub const CANONICAL_CONTAINER_EXT: &str = "mp4";
/// Canonical container media type
pub const CANONICAL_MEDIA_TYPE: &str = "video/mp4";
/// Canonical video codec (H.264)
pub const CANONICAL_VIDEO_CODEC: &str = "libx264";
/// Canonical encoding preset (speed/quality balance)
pub const CANONICAL_PRESET: &str = "veryfast";
/// Canonical CRF (constant quality factor)
pub const CANONICAL_CRF: u8 = 23;
/// Canonical audio codec
pub const CANONICAL_AUDIO_CODEC: &str = "aac";
/// Scale filter that rounds each dimension down to the nearest even value,
/// which the canonical video codec requires
pub const EVEN_DIMENSIONS_FILTER: &str = "scale=trunc(iw/2)*2:trunc(ih/2)*2";
/// Container flags for a progressive, streaming-friendly layout
pub const STREAMING_MOVFLAGS: &str = "+faststart";

/// Build the canonical transcode argv.
///
/// The argument order is a fixed contract with the engine: input path,
/// video codec selector, speed/quality preset, quality factor, audio codec
/// selector, even-dimensions scale filter, streaming-friendly container
/// flag, output path.
pub fn canonical_transcode_args(input: &str, output: &str) -> Vec<String> {
    [
        "-i",
        input,
        "-c:v",
        CANONICAL_VIDEO_CODEC,
        "-preset",
        CANONICAL_PRESET,
        "-crf",
        "23",
        "-c:a",
        CANONICAL_AUDIO_CODEC,
        "-vf",
        EVEN_DIMENSIONS_FILTER,
        "-movflags",
        STREAMING_MOVFLAGS,
        output,
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
