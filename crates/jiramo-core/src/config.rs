//! Configuration management utilities

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Database connection pool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 20,
            min_connections: 1,
        }
    }
}

/// Tunables of the session stitching and aggregation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyticsConfig {
    /// Sliding inactivity window after which a session expires
    pub session_ttl: Duration,
    /// Trailing window counted by the real-time snapshot
    pub realtime_window: Duration,
    /// Dwell times at or above this are discarded by the backfill
    pub max_dwell_seconds: i64,
    /// How far before `prev_created_at` a page view may have been stored
    pub clock_skew_tolerance: Duration,
    /// Number of event names returned by the windowed summary
    pub top_events_limit: usize,
    /// Width of the summary window when the caller gives no `from`
    pub default_window: Duration,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            session_ttl: Duration::minutes(30),
            realtime_window: Duration::minutes(5),
            max_dwell_seconds: 3600,
            clock_skew_tolerance: Duration::seconds(2),
            top_events_limit: 20,
            default_window: Duration::days(30),
        }
    }
}

impl AnalyticsConfig {
    pub fn with_session_ttl_minutes(mut self, minutes: i64) -> Self {
        self.session_ttl = Duration::minutes(minutes);
        self
    }
}
