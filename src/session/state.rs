//! Session state machine
//!
//! Capture lifecycle is a tagged state value with explicit transition
//! functions: `Idle -> Recording <-> Paused -> Stopped`, with `reset`
//! returning a stopped session to `Idle`. Invalid transitions are rejected
//! with an error, never absorbed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::error::{PipelineError, PipelineResult};

/// Current state of a capture session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// No capture in progress
    Idle,
    /// Currently accepting chunks
    Recording,
    /// Capture suspended, buffer retained
    Paused,
    /// Capture finished; terminal until reset
    Stopped,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Idle
    }
}

impl SessionState {
    pub fn on_start(self) -> PipelineResult<Self> {
        match self {
            SessionState::Idle => Ok(SessionState::Recording),
            from => Err(PipelineError::InvalidTransition { from, op: "start" }),
        }
    }

    pub fn on_pause(self) -> PipelineResult<Self> {
        match self {
            SessionState::Recording => Ok(SessionState::Paused),
            from => Err(PipelineError::InvalidTransition { from, op: "pause" }),
        }
    }

    pub fn on_resume(self) -> PipelineResult<Self> {
        match self {
            SessionState::Paused => Ok(SessionState::Recording),
            from => Err(PipelineError::InvalidTransition { from, op: "resume" }),
        }
    }

    pub fn on_stop(self) -> PipelineResult<Self> {
        match self {
            SessionState::Recording | SessionState::Paused => Ok(SessionState::Stopped),
            from => Err(PipelineError::InvalidTransition { from, op: "stop" }),
        }
    }

    pub fn on_reset(self) -> PipelineResult<Self> {
        match self {
            SessionState::Stopped => Ok(SessionState::Idle),
            from => Err(PipelineError::InvalidTransition { from, op: "reset" }),
        }
    }
}

/// Per-capture record created on start and discarded on reset.
///
/// Tracks identity, wall-clock start time and elapsed recording time. The
/// elapsed clock only runs while the session is in `Recording`; paused time
/// is excluded.
#[derive(Debug)]
pub struct RecordingSession {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    accumulated: Duration,
    recording_since: Option<Instant>,
}

impl RecordingSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            accumulated: Duration::ZERO,
            recording_since: Some(Instant::now()),
        }
    }

    /// Fold running time into the accumulator (pause / stop)
    pub fn suspend_clock(&mut self) {
        if let Some(since) = self.recording_since.take() {
            self.accumulated += since.elapsed();
        }
    }

    /// Restart the clock after a pause
    pub fn resume_clock(&mut self) {
        if self.recording_since.is_none() {
            self.recording_since = Some(Instant::now());
        }
    }

    pub fn elapsed(&self) -> Duration {
        let running = self
            .recording_since
            .map(|since| since.elapsed())
            .unwrap_or_default();
        self.accumulated + running
    }

    /// Whole seconds of recording time
    pub fn elapsed_units(&self) -> u64 {
        self.elapsed().as_secs()
    }
}

impl Default for RecordingSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transition_cycle() {
        let state = SessionState::Idle;
        let state = state.on_start().unwrap();
        assert_eq!(state, SessionState::Recording);
        let state = state.on_pause().unwrap();
        assert_eq!(state, SessionState::Paused);
        let state = state.on_resume().unwrap();
        assert_eq!(state, SessionState::Recording);
        let state = state.on_stop().unwrap();
        assert_eq!(state, SessionState::Stopped);
        let state = state.on_reset().unwrap();
        assert_eq!(state, SessionState::Idle);
    }

    #[test]
    fn test_stop_is_valid_from_paused() {
        let state = SessionState::Paused;
        assert_eq!(state.on_stop().unwrap(), SessionState::Stopped);
    }

    #[test]
    fn test_invalid_transitions_are_rejected() {
        assert!(SessionState::Idle.on_pause().is_err());
        assert!(SessionState::Idle.on_stop().is_err());
        assert!(SessionState::Recording.on_start().is_err());
        assert!(SessionState::Recording.on_resume().is_err());
        assert!(SessionState::Paused.on_pause().is_err());
        assert!(SessionState::Stopped.on_stop().is_err());
        assert!(SessionState::Idle.on_reset().is_err());
    }

    #[test]
    fn test_rejection_reports_state_and_operation() {
        let err = SessionState::Idle.on_pause().unwrap_err();
        match err {
            PipelineError::InvalidTransition { from, op } => {
                assert_eq!(from, SessionState::Idle);
                assert_eq!(op, "pause");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_suspended_clock_does_not_advance() {
        let mut recording = RecordingSession::new();
        recording.suspend_clock();
        let frozen = recording.elapsed();
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(recording.elapsed(), frozen);

        recording.resume_clock();
        std::thread::sleep(Duration::from_millis(5));
        assert!(recording.elapsed() > frozen);
    }
}
