use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of a speech session's state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    /// Whether the runtime exposes a speech engine at all
    pub supported: bool,

    /// Whether the session is currently listening
    pub listening: bool,

    /// When listening last started
    pub started_at: Option<DateTime<Utc>>,

    /// Seconds since listening started (0 if never started)
    pub duration_secs: f64,

    /// Number of result events received this session
    pub result_events: usize,

    /// Number of automatic engine restarts this session
    pub restarts: usize,
}
