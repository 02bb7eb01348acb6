use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::SessionState;

/// Point-in-time snapshot of a capture session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    /// Current lifecycle state
    pub state: SessionState,

    /// When the capture started, if one exists
    pub started_at: Option<DateTime<Utc>>,

    /// Whole seconds spent recording (paused time excluded)
    pub elapsed_units: u64,

    /// Chunks accumulated so far
    pub chunk_count: usize,

    /// Total raw bytes accumulated so far
    pub total_bytes: usize,
}
