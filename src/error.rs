//! Error types used across the pipeline.

use thiserror::Error;

use crate::session::SessionState;

/// Library-wide error type
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to decode captured stream: {0}")]
    Decode(String),

    #[error("Malformed video container: {0}")]
    Container(String),

    #[error("Encoder initialization failed: {0}")]
    EncoderInit(String),

    #[error("Audio encoding failed: {0}")]
    Encode(String),

    #[error("Invalid operation '{op}' in state {from:?}")]
    InvalidTransition {
        from: SessionState,
        op: &'static str,
    },

    #[error("Chunk buffer is frozen")]
    BufferFrozen,

    #[error("Capture source failed: {0}")]
    Source(String),
}

/// Result type alias using PipelineError
pub type PipelineResult<T> = Result<T, PipelineError>;
