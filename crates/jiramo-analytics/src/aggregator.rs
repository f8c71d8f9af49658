//! Read-side traffic metrics

use crate::store::{AnalyticsStore, TimeWindow};
use crate::types::responses::{EventCount, ProjectStats, RealtimeStats, StatsSummary};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use sea_orm::DbErr;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone, Copy)]
enum Bound {
    Start,
    End,
}

fn parse_bound(raw: &str, bound: Bound) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    let day = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    let time = match bound {
        Bound::Start => NaiveTime::MIN,
        Bound::End => NaiveTime::from_hms_opt(23, 59, 59)?,
    };
    Some(day.and_time(time).and_utc())
}

/// Build the summary window from optional query bounds.
///
/// `to` defaults to `now` and `from` to `to - default_width`. A bare
/// `YYYY-MM-DD` covers the whole day; anything unparseable is ignored.
pub fn parse_window(
    from: Option<&str>,
    to: Option<&str>,
    now: DateTime<Utc>,
    default_width: Duration,
) -> TimeWindow {
    let to = to
        .and_then(|raw| parse_bound(raw, Bound::End))
        .unwrap_or(now);
    let from = from
        .and_then(|raw| parse_bound(raw, Bound::Start))
        .unwrap_or(to - default_width);
    TimeWindow::new(from, to)
}

/// `bounced / visits * 100`, clamped to `[0, 100]` and 0 without visits.
pub fn bounce_rate(bounced: u64, visits: u64) -> f64 {
    if visits == 0 {
        return 0.0;
    }
    (bounced as f64 * 100.0 / visits as f64).clamp(0.0, 100.0)
}

pub struct Aggregator {
    store: Arc<dyn AnalyticsStore>,
    top_events_limit: u64,
    realtime_window: Duration,
}

impl Aggregator {
    pub fn new(
        store: Arc<dyn AnalyticsStore>,
        top_events_limit: usize,
        realtime_window: Duration,
    ) -> Self {
        Self {
            store,
            top_events_limit: top_events_limit as u64,
            realtime_window,
        }
    }

    pub async fn summary(
        &self,
        project_id: Uuid,
        window: TimeWindow,
    ) -> Result<ProjectStats, DbErr> {
        let visitors = self.store.count_visitors(project_id, window).await?;
        let visits = self.store.count_sessions(project_id, window).await?;
        let views = self.store.count_page_views(project_id, window).await?;
        let bounced = self.store.count_bounced_sessions(project_id, window).await?;
        let events = self
            .store
            .top_events(project_id, window, self.top_events_limit)
            .await?
            .into_iter()
            .map(|(event_name, count)| EventCount { event_name, count })
            .collect();

        Ok(ProjectStats {
            summary: StatsSummary {
                visitors,
                visits,
                views,
                bounce_rate: bounce_rate(bounced, visits),
            },
            events,
        })
    }

    /// Distinct visitors with a page view in the trailing real-time window.
    pub async fn realtime(
        &self,
        project_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<RealtimeStats, DbErr> {
        let window = TimeWindow::new(now - self.realtime_window, now);
        let active_visitors = self.store.count_visitors(project_id, window).await?;

        Ok(RealtimeStats {
            active_visitors,
            as_of: now,
        })
    }
}
