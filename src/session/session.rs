use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::state::{RecordingSession, SessionState};
use super::stats::SessionStats;
use crate::artifact::{Artifact, CaptureKind};
use crate::audio::AudioTranscoder;
use crate::capture::{CaptureSource, ChunkBuffer, MediaChunk};
use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::video::VideoFrameTransformer;

/// Orchestrates one capture from start to finished artifact.
///
/// The session drains chunk events from the capture source on a spawned
/// task, so appends never block the source's delivery side. On stop the
/// accumulated buffer is frozen and handed to the transform matching the
/// session's capture kind; `stop()` returns only once the artifact is
/// produced. Because every operation takes `&mut self` and `stop()` awaits
/// the transform inline, a new `start()` can never overlap an in-flight
/// transform, and each transform builds its own encoder context.
pub struct CaptureSession {
    kind: CaptureKind,
    config: PipelineConfig,
    state: SessionState,
    recording: Option<RecordingSession>,
    buffer: Arc<Mutex<ChunkBuffer>>,
    /// True only while in `Recording`; the drain task drops chunks that
    /// arrive while paused.
    accepting: Arc<AtomicBool>,
    drain_handle: Option<JoinHandle<()>>,
    stop_tx: Option<watch::Sender<bool>>,
}

impl CaptureSession {
    pub fn new(kind: CaptureKind, config: PipelineConfig) -> Self {
        Self {
            kind,
            config,
            state: SessionState::Idle,
            recording: None,
            buffer: Arc::new(Mutex::new(ChunkBuffer::new())),
            accepting: Arc::new(AtomicBool::new(false)),
            drain_handle: None,
            stop_tx: None,
        }
    }

    pub fn kind(&self) -> CaptureKind {
        self.kind
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Start a capture, draining chunks from the given receiver.
    ///
    /// Valid only from `Idle`. Allocates a fresh recording and an empty
    /// buffer, then spawns the drain task.
    pub async fn start(&mut self, mut chunks: mpsc::Receiver<MediaChunk>) -> PipelineResult<()> {
        self.state = self.state.on_start()?;
        self.recording = Some(RecordingSession::new());
        self.buffer = Arc::new(Mutex::new(ChunkBuffer::new()));
        self.accepting = Arc::new(AtomicBool::new(true));

        let (stop_tx, mut stop_rx) = watch::channel(false);
        let buffer = Arc::clone(&self.buffer);
        let accepting = Arc::clone(&self.accepting);

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    maybe_chunk = chunks.recv() => match maybe_chunk {
                        Some(chunk) => {
                            if !accepting.load(Ordering::SeqCst) {
                                debug!(
                                    "Dropping chunk {} delivered while paused",
                                    chunk.sequence
                                );
                                continue;
                            }

                            let mut buf = buffer.lock().await;
                            if let Err(e) = buf.append(chunk) {
                                warn!("Chunk append rejected: {}", e);
                                break;
                            }
                        }
                        None => {
                            info!("Capture source closed, drain task finishing");
                            break;
                        }
                    },
                    _ = stop_rx.changed() => {
                        // Chunks already queued were delivered before the
                        // stop; drain them before exiting.
                        while let Ok(chunk) = chunks.try_recv() {
                            if !accepting.load(Ordering::SeqCst) {
                                debug!(
                                    "Dropping chunk {} delivered while paused",
                                    chunk.sequence
                                );
                                continue;
                            }
                            let mut buf = buffer.lock().await;
                            if let Err(e) = buf.append(chunk) {
                                warn!("Chunk append rejected: {}", e);
                                break;
                            }
                        }
                        debug!("Drain task received stop signal");
                        break;
                    }
                }
            }
        });

        self.drain_handle = Some(handle);
        self.stop_tx = Some(stop_tx);

        let id = self.recording.as_ref().map(|r| r.id).unwrap_or_default();
        info!("Capture session {} started ({:?})", id, self.kind);

        Ok(())
    }

    /// Start a capture by wiring up a capture source.
    pub async fn start_source(&mut self, source: &mut dyn CaptureSource) -> PipelineResult<()> {
        if self.state != SessionState::Idle {
            return Err(PipelineError::InvalidTransition {
                from: self.state,
                op: "start",
            });
        }

        let chunks = source
            .start()
            .await
            .map_err(|e| PipelineError::Source(e.to_string()))?;

        info!("Capture source '{}' wired to session", source.name());
        self.start(chunks).await
    }

    /// Suspend chunk acceptance and the elapsed clock. Valid only from
    /// `Recording`.
    pub fn pause(&mut self) -> PipelineResult<()> {
        self.state = self.state.on_pause()?;
        self.accepting.store(false, Ordering::SeqCst);
        if let Some(recording) = &mut self.recording {
            recording.suspend_clock();
        }
        info!("Capture session paused");
        Ok(())
    }

    /// Resume chunk acceptance and the elapsed clock. Valid only from
    /// `Paused`.
    pub fn resume(&mut self) -> PipelineResult<()> {
        self.state = self.state.on_resume()?;
        self.accepting.store(true, Ordering::SeqCst);
        if let Some(recording) = &mut self.recording {
            recording.resume_clock();
        }
        info!("Capture session resumed");
        Ok(())
    }

    /// Finish the capture and produce the artifact.
    ///
    /// Valid from `Recording` or `Paused`. Joins the drain task, freezes
    /// the buffer and runs the transform for this session's capture kind.
    /// Audio transcode failures are recovered by the raw-byte fallback
    /// inside the transcoder; video transform failures propagate.
    pub async fn stop(&mut self) -> PipelineResult<Artifact> {
        self.state = self.state.on_stop()?;
        if let Some(recording) = &mut self.recording {
            recording.suspend_clock();
        }

        // Shut the drain task down before freezing so no append can race
        // the freeze.
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(true);
        }
        if let Some(handle) = self.drain_handle.take() {
            if let Err(e) = handle.await {
                error!("Chunk drain task panicked: {}", e);
            }
        }

        let frozen = self.buffer.lock().await.freeze();
        info!(
            "Capture stopped: {} chunks, {} bytes frozen",
            frozen.chunk_count(),
            frozen.total_bytes()
        );

        let raw = frozen.concatenate();
        let bytes = match self.kind {
            CaptureKind::Audio => {
                AudioTranscoder::new(self.config.audio.clone()).transcode(raw)
            }
            CaptureKind::Video => {
                VideoFrameTransformer::new(self.config.video.clone()).transform(raw)?
            }
        };

        let id = self
            .recording
            .as_ref()
            .map(|r| r.id)
            .unwrap_or_else(Uuid::new_v4);

        Ok(Artifact::new(self.kind, id, bytes))
    }

    /// Discard the finished capture and return to `Idle`. Valid only from
    /// `Stopped`.
    pub fn reset(&mut self) -> PipelineResult<()> {
        self.state = self.state.on_reset()?;
        self.recording = None;
        self.buffer = Arc::new(Mutex::new(ChunkBuffer::new()));
        info!("Capture session reset to idle");
        Ok(())
    }

    /// Snapshot of the session for status reporting
    pub async fn stats(&self) -> SessionStats {
        let buffer = self.buffer.lock().await;
        SessionStats {
            state: self.state,
            started_at: self.recording.as_ref().map(|r| r.started_at),
            elapsed_units: self
                .recording
                .as_ref()
                .map(|r| r.elapsed_units())
                .unwrap_or(0),
            chunk_count: buffer.chunk_count(),
            total_bytes: buffer.total_bytes(),
        }
    }
}
