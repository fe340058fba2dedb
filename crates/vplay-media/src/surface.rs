//! Temp-file mounts for decode surfaces.
//!
//! The probe and the frame extractor both need the in-memory bytes visible
//! to the external engine as a file. A mount is a named temp file that is
//! discarded on drop, so a failed probe never leaks its surface.

use std::path::Path;

use crate::error::MediaResult;

/// A source's bytes mounted as a temp file the engine can decode.
pub struct MountedSurface {
    file: tempfile::NamedTempFile,
}

impl MountedSurface {
    /// Mount bytes under a fresh temp path with the given extension.
    pub async fn mount(bytes: &[u8], ext: &str) -> MediaResult<Self> {
        let file = tempfile::Builder::new()
            .prefix("vplay-surface-")
            .suffix(&format!(".{}", ext))
            .tempfile()?;
        tokio::fs::write(file.path(), bytes).await?;
        Ok(Self { file })
    }

    /// Path of the mounted surface.
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mount_writes_bytes_and_keeps_extension() {
        let surface = MountedSurface::mount(b"abc", "mp4").await.unwrap();
        assert_eq!(tokio::fs::read(surface.path()).await.unwrap(), b"abc");
        assert!(surface.path().to_string_lossy().ends_with(".mp4"));
    }

    #[tokio::test]
    async fn test_surface_is_discarded_on_drop() {
        let surface = MountedSurface::mount(b"abc", "mov").await.unwrap();
        let path = surface.path().to_path_buf();
        drop(surface);
        assert!(!path.exists());
    }
}
