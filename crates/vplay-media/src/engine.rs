//! Transcode engine binding.
//!
//! The engine is an external encoding process with a constrained command
//! surface: write an input file into its sandbox, execute a fixed argv,
//! read the output artifact back. Log and progress taps are surfaced as
//! [`EngineEvent`]s during execution.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// Number of trailing log lines retained for error reporting.
const STDERR_TAIL_LINES: usize = 40;

/// Event emitted by the engine while a job executes.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Raw log line from the engine
    Log(String),
    /// Normalized completion fraction (0.0 - 1.0), when the engine reports it
    Progress(f64),
}

/// Callback type for engine events.
pub type EngineEventCallback = Box<dyn Fn(EngineEvent) + Send + Sync + 'static>;

/// Contract with the external encoding engine.
///
/// One instance is shared process-wide; callers are expected to serialize
/// `exec` invocations (the pipeline's engine service does this).
#[async_trait]
pub trait TranscodeEngine: Send + Sync {
    /// Load the engine's runtime artifacts. Must be cheap to call again
    /// after a success and safe to retry after a failure.
    async fn load(&self) -> MediaResult<()>;

    /// Write `bytes` under a virtual file name inside the engine sandbox.
    async fn write_input(&self, name: &str, bytes: &[u8]) -> MediaResult<()>;

    /// Execute an argv against the sandbox contents, tapping log/progress
    /// events into `on_event`.
    async fn exec(&self, argv: &[String], on_event: EngineEventCallback) -> MediaResult<()>;

    /// Read an output artifact back out of the sandbox.
    async fn read_output(&self, name: &str) -> MediaResult<Vec<u8>>;

    /// Remove a virtual file from the sandbox.
    async fn remove(&self, name: &str) -> MediaResult<()>;
}

/// FFmpeg-backed engine with a temp-dir sandbox.
///
/// All virtual file names resolve inside a private working directory, which
/// is deleted with the engine.
pub struct FfmpegEngine {
    workdir: tempfile::TempDir,
}

impl FfmpegEngine {
    /// Create an engine with a fresh sandbox directory.
    pub fn new() -> MediaResult<Self> {
        let workdir = tempfile::TempDir::new()
            .map_err(|e| MediaError::engine_init(format!("sandbox setup failed: {}", e)))?;
        Ok(Self { workdir })
    }

    /// Resolve a virtual file name inside the sandbox.
    fn resolve(&self, name: &str) -> MediaResult<PathBuf> {
        if name.is_empty()
            || name.contains('/')
            || name.contains('\\')
            || name.contains("..")
        {
            return Err(MediaError::SecurityViolation(format!(
                "virtual file name escapes the sandbox: {:?}",
                name
            )));
        }
        Ok(self.workdir.path().join(name))
    }
}

/// Build the full invocation argv from the job argv.
///
/// The job argv is the fixed, order-sensitive contract; the engine prepends
/// its own invocation flags (never prompt, no banner noise, no tty reads).
fn invocation_args(argv: &[String]) -> Vec<String> {
    let mut args = vec![
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-nostdin".to_string(),
    ];
    args.extend(argv.iter().cloned());
    args
}

#[async_trait]
impl TranscodeEngine for FfmpegEngine {
    async fn load(&self) -> MediaResult<()> {
        which::which("ffmpeg")
            .map_err(|_| MediaError::engine_init("ffmpeg not found in PATH"))?;
        debug!("transcode engine runtime resolved");
        Ok(())
    }

    async fn write_input(&self, name: &str, bytes: &[u8]) -> MediaResult<()> {
        let path = self.resolve(name)?;
        tokio::fs::write(&path, bytes).await?;
        debug!(name = name, size = bytes.len(), "wrote engine input");
        Ok(())
    }

    async fn exec(&self, argv: &[String], on_event: EngineEventCallback) -> MediaResult<()> {
        let args = invocation_args(argv);
        debug!("running engine: ffmpeg {}", args.join(" "));

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .current_dir(self.workdir.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        let stderr = child.stderr.take().ok_or_else(|| {
            MediaError::transcode_failed("engine stderr not captured", None, None)
        })?;
        let mut reader = BufReader::new(stderr).lines();

        // Tap every log line; keep a bounded tail for error reporting.
        let tail_handle = tokio::spawn(async move {
            let mut tail: Vec<String> = Vec::new();
            while let Ok(Some(line)) = reader.next_line().await {
                if tail.len() == STDERR_TAIL_LINES {
                    tail.remove(0);
                }
                tail.push(line.clone());
                on_event(EngineEvent::Log(line));
            }
            tail
        });

        let status = child.wait().await?;
        let tail = tail_handle.await.unwrap_or_default();

        if status.success() {
            Ok(())
        } else {
            warn!(exit_code = ?status.code(), "engine exec failed");
            Err(MediaError::transcode_failed(
                "engine exited with non-zero status",
                Some(tail.join("\n")),
                status.code(),
            ))
        }
    }

    async fn read_output(&self, name: &str) -> MediaResult<Vec<u8>> {
        let path = self.resolve(name)?;
        let bytes = tokio::fs::read(&path).await.map_err(|e| {
            MediaError::transcode_failed(
                format!("output artifact unreadable: {}", e),
                None,
                None,
            )
        })?;
        if bytes.is_empty() {
            return Err(MediaError::transcode_failed(
                "output artifact is empty",
                None,
                None,
            ));
        }
        Ok(bytes)
    }

    async fn remove(&self, name: &str) -> MediaResult<()> {
        let path = self.resolve(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(MediaError::from(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_prefix() {
        let argv = vec!["-i".to_string(), "in.mov".to_string(), "out.mp4".to_string()];
        let args = invocation_args(&argv);
        assert_eq!(args[0], "-y");
        assert_eq!(args[1], "-hide_banner");
        assert_eq!(args[2], "-nostdin");
        assert_eq!(&args[3..], &argv[..]);
    }

    #[test]
    fn test_sandbox_rejects_escaping_names() {
        let engine = FfmpegEngine::new().unwrap();
        assert!(matches!(
            engine.resolve("../evil.mp4"),
            Err(MediaError::SecurityViolation(_))
        ));
        assert!(matches!(
            engine.resolve("a/b.mp4"),
            Err(MediaError::SecurityViolation(_))
        ));
        assert!(matches!(
            engine.resolve(""),
            Err(MediaError::SecurityViolation(_))
        ));
        assert!(engine.resolve("in.mp4").is_ok());
    }

    #[tokio::test]
    async fn test_write_and_read_roundtrip_within_sandbox() {
        let engine = FfmpegEngine::new().unwrap();
        engine.write_input("in.bin", b"abc").await.unwrap();
        let bytes = engine.read_output("in.bin").await.unwrap();
        assert_eq!(bytes, b"abc");

        engine.remove("in.bin").await.unwrap();
        assert!(engine.read_output("in.bin").await.is_err());
        // Removing a missing file is not an error.
        engine.remove("in.bin").await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_output_is_a_transcode_failure() {
        let engine = FfmpegEngine::new().unwrap();
        engine.write_input("out.mp4", b"").await.unwrap();
        assert!(matches!(
            engine.read_output("out.mp4").await,
            Err(MediaError::TranscodeFailed { .. })
        ));
    }
}
