//! Playback pipeline state machine.
//!
//! Per submission: fingerprint, cache lookup, direct-playability probe for
//! canonical containers, engine transcode otherwise. State transitions are
//! observable through a watch channel intended for a UI layer; that stream
//! is the only contract the UI may depend on.
//!
//! There is no cancellation primitive. Each submission carries a unique
//! token; a later submission supersedes the earlier one, whose in-flight
//! work still completes and still populates the cache under its own
//! fingerprint, but whose state updates are no longer published.

use std::fmt;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;

use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use vplay_media::{
    EngineEventCallback, FfmpegFrameExtractor, FfprobeProbe, FrameExtractor,
    PlayabilityProbe, ProbeOutcome, ProgressTracker,
};
use vplay_models::{
    canonical_transcode_args, CapturedFrame, Fingerprint, PipelineState, ResourceHandle,
    SourceFile, CANONICAL_CONTAINER_EXT,
};

use crate::cache::{ResourceCache, SharedCache};
use crate::config::PlayerConfig;
use crate::error::{PlayerError, PlayerResult};
use crate::service::EngineService;

/// Token identifying one submission; the state-stream consumer acts only on
/// updates whose token matches the most recently issued one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubmissionId(Uuid);

impl SubmissionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Token carried by the stream before any submission.
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One observable state transition.
#[derive(Debug, Clone)]
pub struct PipelineUpdate {
    /// Which submission this state belongs to
    pub submission: SubmissionId,
    /// The state itself
    pub state: PipelineState,
}

struct Tracked {
    submission: SubmissionId,
    fingerprint: Fingerprint,
    failed: bool,
}

/// Media normalization pipeline with a bounded playable-resource cache.
pub struct PlaybackPipeline {
    engine: Arc<EngineService>,
    probe: Arc<dyn PlayabilityProbe>,
    extractor: Arc<dyn FrameExtractor>,
    cache: SharedCache,
    state_tx: watch::Sender<PipelineUpdate>,
    current: StdMutex<Option<Tracked>>,
}

impl PlaybackPipeline {
    /// Create a pipeline over the real FFmpeg engine, prober and extractor.
    pub fn new(config: &PlayerConfig) -> PlayerResult<Self> {
        Ok(Self::with_components(
            EngineService::ffmpeg()?,
            Arc::new(FfprobeProbe::with_timeout(config.probe_timeout_secs)),
            Arc::new(FfmpegFrameExtractor::new()),
            ResourceCache::shared(config),
        ))
    }

    /// Create a pipeline from explicit components.
    ///
    /// The engine service and cache are process-wide collaborators; passing
    /// the same `Arc`s to several pipelines shares them.
    pub fn with_components(
        engine: Arc<EngineService>,
        probe: Arc<dyn PlayabilityProbe>,
        extractor: Arc<dyn FrameExtractor>,
        cache: SharedCache,
    ) -> Self {
        let (state_tx, _) = watch::channel(PipelineUpdate {
            submission: SubmissionId::nil(),
            state: PipelineState::Idle,
        });
        Self {
            engine,
            probe,
            extractor,
            cache,
            state_tx,
            current: StdMutex::new(None),
        }
    }

    /// Subscribe to state transitions.
    pub fn subscribe(&self) -> watch::Receiver<PipelineUpdate> {
        self.state_tx.subscribe()
    }

    /// The most recently published state.
    pub fn state(&self) -> PipelineState {
        self.state_tx.borrow().state.clone()
    }

    /// The shared cache backing this pipeline.
    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }

    /// Submit a source file and drive it to `Ready` or `Error`.
    ///
    /// Re-submitting the file currently tracked as `Processing` or `Ready`
    /// is an idempotent no-op; a file whose last attempt errored starts a
    /// fresh attempt. Failures are reported through the state stream, not
    /// as a return value, so a superseded submission cannot surface stale
    /// errors to the caller.
    pub async fn submit(&self, file: SourceFile) -> SubmissionId {
        let fingerprint = Fingerprint::of(&file);

        {
            let current = self.current.lock().expect("pipeline lock poisoned");
            if let Some(tracked) = current.as_ref() {
                if tracked.fingerprint == fingerprint && !tracked.failed {
                    debug!(%fingerprint, "same file already tracked; submission skipped");
                    return tracked.submission;
                }
            }
        }

        let submission = SubmissionId::new();
        {
            let mut current = self.current.lock().expect("pipeline lock poisoned");
            *current = Some(Tracked {
                submission,
                fingerprint: fingerprint.clone(),
                failed: false,
            });
        }
        info!(%submission, name = %file.name, "submission accepted");
        self.publish(submission, PipelineState::Idle);

        self.run(submission, fingerprint, file).await;
        submission
    }

    async fn run(&self, submission: SubmissionId, fingerprint: Fingerprint, file: SourceFile) {
        // 1. Cache lookup; a fresh hit needs no engine involvement.
        if let Some(handle) = self.cache.lock().await.get(&fingerprint) {
            debug!(%fingerprint, "cache hit");
            self.finish_ready(submission, handle);
            return;
        }

        // 2. Direct-playability probe, only for canonical containers; other
        // formats are known to need conversion, so the timeout window is
        // not spent on them.
        if file.is_canonical_container() {
            if let ProbeOutcome::Playable(handle) = self.probe.probe(&file).await {
                self.cache.lock().await.put(fingerprint, handle.clone());
                self.finish_ready(submission, handle);
                return;
            }
        }

        // 3. Transcode.
        self.publish(submission, PipelineState::LoadingEngine);
        if let Err(e) = self.engine.ensure_loaded().await {
            warn!(%submission, error = %e, "engine failed to load");
            self.finish_error(submission, e.to_string());
            return;
        }
        self.publish(submission, PipelineState::Processing { percent: 0 });

        let job = Uuid::new_v4();
        let input_name = format!(
            "in-{}.{}",
            job,
            file.extension().unwrap_or_else(|| "bin".to_string())
        );
        let output_name = format!("out-{}.{}", job, CANONICAL_CONTAINER_EXT);
        let argv = canonical_transcode_args(&input_name, &output_name);

        let on_event = self.progress_callback(submission);
        let submitted = self
            .engine
            .submit(&input_name, &file.data, &argv, &output_name, on_event)
            .await;

        match submitted {
            Ok(bytes) => {
                let handle = ResourceHandle::new(bytes);
                self.cache.lock().await.put(fingerprint, handle.clone());
                self.finish_ready(submission, handle);
            }
            Err(e) if file.is_canonical_container() && !e.is_engine_init() => {
                // One direct-load fallback on the original bytes before
                // giving up on a canonical-container file.
                warn!(%submission, error = %e, "transcode failed; trying direct load");
                match self.probe.probe(&file).await {
                    ProbeOutcome::Playable(handle) => {
                        self.cache.lock().await.put(fingerprint, handle.clone());
                        self.finish_ready(submission, handle);
                    }
                    ProbeOutcome::NeedsTranscode => {
                        self.finish_error(submission, e.to_string());
                    }
                }
            }
            Err(e) => {
                self.finish_error(submission, e.to_string());
            }
        }
    }

    /// Build the engine event tap for one submission: estimates progress
    /// and publishes `Processing` updates while the submission is current.
    fn progress_callback(&self, submission: SubmissionId) -> EngineEventCallback {
        let tracker = StdMutex::new(ProgressTracker::new());
        let state_tx = self.state_tx.clone();
        Box::new(move |event| {
            let percent = {
                let mut tracker = tracker.lock().expect("tracker lock poisoned");
                tracker.observe(&event)
            };
            if let Some(percent) = percent {
                // Latest-wins: a newer submission owns the stream now.
                if state_tx.borrow().submission == submission {
                    state_tx.send_replace(PipelineUpdate {
                        submission,
                        state: PipelineState::Processing { percent },
                    });
                }
            }
        })
    }

    /// Capture a still frame from the currently mounted resource.
    ///
    /// Fails when no resource is `Ready`; never retried automatically.
    pub async fn capture_frame(
        &self,
        at_seconds: f64,
        width: u32,
        height: u32,
    ) -> PlayerResult<CapturedFrame> {
        let handle = {
            let update = self.state_tx.borrow();
            match &update.state {
                PipelineState::Ready { handle } => handle.clone(),
                _ => return Err(PlayerError::NoFrameAvailable),
            }
        };
        Ok(self
            .extractor
            .capture(&handle, at_seconds, width, height)
            .await?)
    }

    /// Tear the subsystem down: drain the cache, releasing every handle,
    /// and reset the state stream.
    pub async fn shutdown(&self) {
        let released = {
            let mut cache = self.cache.lock().await;
            cache.clear()
        };
        info!(released, "pipeline shut down; cache drained");
        *self.current.lock().expect("pipeline lock poisoned") = None;
        self.state_tx.send_replace(PipelineUpdate {
            submission: SubmissionId::nil(),
            state: PipelineState::Idle,
        });
    }

    fn is_current(&self, submission: SubmissionId) -> bool {
        self.current
            .lock()
            .expect("pipeline lock poisoned")
            .as_ref()
            .map_or(false, |t| t.submission == submission)
    }

    fn publish(&self, submission: SubmissionId, state: PipelineState) {
        if self.is_current(submission) {
            self.state_tx.send_replace(PipelineUpdate { submission, state });
        }
    }

    fn finish_ready(&self, submission: SubmissionId, handle: ResourceHandle) {
        if self.is_current(submission) {
            self.state_tx.send_replace(PipelineUpdate {
                submission,
                state: PipelineState::Ready { handle },
            });
        } else {
            // Superseded: the result stays cached for a future hit but is
            // not delivered to the stream.
            debug!(%submission, "superseded submission completed; cached only");
        }
    }

    fn finish_error(&self, submission: SubmissionId, message: String) {
        let mut current = self.current.lock().expect("pipeline lock poisoned");
        let is_current = current
            .as_ref()
            .map_or(false, |t| t.submission == submission);
        if is_current {
            if let Some(tracked) = current.as_mut() {
                tracked.failed = true;
            }
            drop(current);
            warn!(%submission, %message, "submission failed");
            self.state_tx.send_replace(PipelineUpdate {
                submission,
                state: PipelineState::Error { message },
            });
        } else {
            debug!(%submission, %message, "superseded submission failed; dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nil_submission_token() {
        assert_eq!(SubmissionId::nil(), SubmissionId::nil());
        assert_ne!(SubmissionId::new(), SubmissionId::new());
    }
}
