//! Capture session management
//!
//! This module provides the `CaptureSession` abstraction that manages:
//! - The capture lifecycle state machine (idle/recording/paused/stopped)
//! - Asynchronous chunk accumulation from a capture source
//! - Hand-off of the frozen buffer to the audio or video transform on stop
//! - Session statistics and elapsed-time tracking

mod session;
mod state;
mod stats;

pub use session::CaptureSession;
pub use state::{RecordingSession, SessionState};
pub use stats::SessionStats;
