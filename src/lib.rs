pub mod artifact;
pub mod audio;
pub mod capture;
pub mod config;
pub mod error;
pub mod session;
pub mod video;

pub use artifact::{Artifact, CaptureKind};
pub use audio::{AudioTranscoder, PcmBuffer};
pub use capture::{CaptureSource, ChunkBuffer, FrozenBuffer, MediaChunk, ScriptedSource};
pub use config::{AudioEncodeConfig, CaptureConfig, PipelineConfig, VideoTransformConfig};
pub use error::{PipelineError, PipelineResult};
pub use session::{CaptureSession, RecordingSession, SessionState, SessionStats};
pub use video::{VideoFrameTransformer, VideoStream};
