//! Caller-supplied source files.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::encoding::{CANONICAL_CONTAINER_EXT, CANONICAL_MEDIA_TYPE};

/// A user-supplied video file handed to the subsystem.
///
/// The subsystem never mutates a source file; it only reads bytes from it.
/// Cloning is cheap (the byte payload is shared).
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// File name as declared by the caller (e.g., "clip.mov")
    pub name: String,
    /// Declared media type, if the caller knows it (e.g., "video/mp4")
    pub media_type: Option<String>,
    /// Last-modified timestamp as declared by the caller
    pub modified: DateTime<Utc>,
    /// File contents
    pub data: Arc<[u8]>,
}

impl SourceFile {
    /// Create a new source file.
    pub fn new(
        name: impl Into<String>,
        media_type: Option<String>,
        modified: DateTime<Utc>,
        data: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            name: name.into(),
            media_type,
            modified,
            data: data.into(),
        }
    }

    /// File size in bytes.
    pub fn size_bytes(&self) -> u64 {
        self.data.len() as u64
    }

    /// Lower-cased extension of the file name, if any.
    pub fn extension(&self) -> Option<String> {
        let (_, ext) = self.name.rsplit_once('.')?;
        if ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    /// Whether the declared container already matches the canonical target.
    ///
    /// Only files for which this returns `true` are worth a direct-playability
    /// probe; everything else goes straight to transcoding.
    pub fn is_canonical_container(&self) -> bool {
        if let Some(media_type) = &self.media_type {
            if media_type.eq_ignore_ascii_case(CANONICAL_MEDIA_TYPE) {
                return true;
            }
        }
        self.extension().as_deref() == Some(CANONICAL_CONTAINER_EXT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, media_type: Option<&str>) -> SourceFile {
        SourceFile::new(
            name,
            media_type.map(String::from),
            Utc::now(),
            vec![0u8; 16],
        )
    }

    #[test]
    fn test_canonical_container_by_media_type() {
        assert!(file("movie.bin", Some("video/mp4")).is_canonical_container());
        assert!(file("movie.bin", Some("VIDEO/MP4")).is_canonical_container());
        assert!(!file("movie.bin", Some("video/x-matroska")).is_canonical_container());
    }

    #[test]
    fn test_canonical_container_by_extension() {
        assert!(file("movie.MP4", None).is_canonical_container());
        assert!(!file("movie.mkv", None).is_canonical_container());
        assert!(!file("movie", None).is_canonical_container());
    }

    #[test]
    fn test_size_matches_payload() {
        assert_eq!(file("a.mp4", None).size_bytes(), 16);
    }
}
