//! Shared transcode engine service.
//!
//! Exactly one engine instance lives per service; consumers hold `Arc`
//! clones as lightweight client handles. Loading is awaited once and shared
//! between concurrent callers, and a failed load stays retryable. Jobs are
//! serialized: only one `submit` runs against the engine at a time.

use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info};

use vplay_media::{
    EngineEventCallback, FfmpegEngine, MediaResult, TranscodeEngine,
};

/// Lifecycle owner for the external encoding engine.
pub struct EngineService {
    engine: Arc<dyn TranscodeEngine>,
    loaded: OnceCell<()>,
    exec_lock: Mutex<()>,
}

impl EngineService {
    /// Wrap an engine instance.
    pub fn new(engine: Arc<dyn TranscodeEngine>) -> Arc<Self> {
        Arc::new(Self {
            engine,
            loaded: OnceCell::new(),
            exec_lock: Mutex::new(()),
        })
    }

    /// Create a service over the FFmpeg engine.
    pub fn ffmpeg() -> MediaResult<Arc<Self>> {
        Ok(Self::new(Arc::new(FfmpegEngine::new()?)))
    }

    /// Load the engine's runtime artifacts, once.
    ///
    /// Concurrent callers await the same attempt. A failed attempt leaves
    /// the service unloaded, so a later call retries from scratch.
    pub async fn ensure_loaded(&self) -> MediaResult<()> {
        self.loaded
            .get_or_try_init(|| async {
                info!("loading transcode engine");
                self.engine.load().await
            })
            .await?;
        Ok(())
    }

    /// Whether a load has completed successfully.
    pub fn is_loaded(&self) -> bool {
        self.loaded.initialized()
    }

    /// Run one encode job: write the input under its virtual name, execute
    /// the argv, read the output artifact back.
    ///
    /// Jobs are serialized per service; both virtual files are removed
    /// afterwards regardless of outcome (best effort).
    pub async fn submit(
        &self,
        input_name: &str,
        input: &[u8],
        argv: &[String],
        output_name: &str,
        on_event: EngineEventCallback,
    ) -> MediaResult<Vec<u8>> {
        let _guard = self.exec_lock.lock().await;

        self.engine.write_input(input_name, input).await?;

        let result = match self.engine.exec(argv, on_event).await {
            Ok(()) => self.engine.read_output(output_name).await,
            Err(e) => Err(e),
        };

        if let Err(e) = self.engine.remove(input_name).await {
            debug!(name = input_name, error = %e, "input cleanup failed");
        }
        if let Err(e) = self.engine.remove(output_name).await {
            debug!(name = output_name, error = %e, "output cleanup failed");
        }

        result
    }
}
