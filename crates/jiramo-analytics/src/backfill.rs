//! Retroactive dwell time for the page a visitor just left

use crate::store::AnalyticsStore;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

/// Whole seconds between `prev` and `now`, if strictly between 0 and `max_seconds`.
pub fn dwell_seconds(prev: DateTime<Utc>, now: DateTime<Utc>, max_seconds: i64) -> Option<i32> {
    let dwell = (now - prev).num_seconds();
    if dwell > 0 && dwell < max_seconds {
        i32::try_from(dwell).ok()
    } else {
        None
    }
}

pub struct DurationBackfiller {
    store: Arc<dyn AnalyticsStore>,
    max_dwell_seconds: i64,
    clock_skew_tolerance: Duration,
}

impl DurationBackfiller {
    pub fn new(
        store: Arc<dyn AnalyticsStore>,
        max_dwell_seconds: i64,
        clock_skew_tolerance: Duration,
    ) -> Self {
        Self {
            store,
            max_dwell_seconds,
            clock_skew_tolerance,
        }
    }

    /// Record how long the visitor stayed on `prev_path`.
    ///
    /// Never fails the caller: bad timestamps, out-of-range dwell times,
    /// missing rows and store errors all leave the data untouched.
    /// Returns the duration written, if any.
    pub async fn backfill(
        &self,
        session_id: &str,
        prev_path: &str,
        prev_created_at: &str,
        now: DateTime<Utc>,
    ) -> Option<i32> {
        let prev = match DateTime::parse_from_rfc3339(prev_created_at.trim()) {
            Ok(prev) => prev.with_timezone(&Utc),
            Err(e) => {
                debug!("Ignoring unparseable prev_created_at {:?}: {}", prev_created_at, e);
                return None;
            }
        };

        let Some(dwell) = dwell_seconds(prev, now, self.max_dwell_seconds) else {
            debug!("Dwell time on {} out of range, skipping backfill", prev_path);
            return None;
        };

        match self
            .store
            .fill_pending_duration(session_id, prev_path, prev - self.clock_skew_tolerance, dwell)
            .await
        {
            Ok(true) => {
                debug!("Backfilled {}s on {} for session {}", dwell, prev_path, session_id);
                Some(dwell)
            }
            Ok(false) => {
                debug!("No pending page view {} in session {}", prev_path, session_id);
                None
            }
            Err(e) => {
                warn!("Failed to backfill duration for session {}: {}", session_id, e);
                None
            }
        }
    }
}
