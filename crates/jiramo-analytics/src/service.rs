use crate::aggregator::{parse_window, Aggregator};
use crate::backfill::DurationBackfiller;
use crate::recorder::{parse_page_url, parse_project_id, validate_event_name, HitOrigin, Recorder};
use crate::sessions::{LandingPage, SessionStitcher, VisitContext};
use crate::store::{AnalyticsStore, ProjectDirectory, SeaOrmAnalyticsStore};
use crate::traits::Analytics;
use crate::types::requests::{EventRequest, StatsQuery, TrackRequest};
use crate::types::responses::{EventResponse, ProjectStats, RealtimeStats, TrackResponse};
use crate::types::AnalyticsError;
use crate::utm::parse_utm_params;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jiramo_core::{AnalyticsConfig, RequestMetadata};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

pub struct AnalyticsService {
    config: AnalyticsConfig,
    recorder: Recorder,
    stitcher: SessionStitcher,
    backfiller: DurationBackfiller,
    aggregator: Aggregator,
}

impl AnalyticsService {
    pub fn new(db: Arc<DatabaseConnection>, config: AnalyticsConfig) -> Self {
        let store = Arc::new(SeaOrmAnalyticsStore::new(db));
        Self::with_store(store.clone(), store, config)
    }

    pub fn with_store(
        directory: Arc<dyn ProjectDirectory>,
        store: Arc<dyn AnalyticsStore>,
        config: AnalyticsConfig,
    ) -> Self {
        AnalyticsService {
            recorder: Recorder::new(directory, store.clone()),
            stitcher: SessionStitcher::new(store.clone(), config.session_ttl),
            backfiller: DurationBackfiller::new(
                store.clone(),
                config.max_dwell_seconds,
                config.clock_skew_tolerance,
            ),
            aggregator: Aggregator::new(store, config.top_events_limit, config.realtime_window),
            config,
        }
    }

    /// [`Analytics::track`] with an explicit clock.
    pub async fn track_at(
        &self,
        request: TrackRequest,
        metadata: &RequestMetadata,
        now: DateTime<Utc>,
    ) -> Result<TrackResponse, AnalyticsError> {
        let project_id = self.recorder.resolve_project(&request.project_id).await?;
        let page_url = parse_page_url(&request.url)?;

        let visit = VisitContext::from_metadata(project_id, metadata);
        // Campaign tags on the beacon request win over tags on the page itself
        let utm = metadata
            .query
            .as_deref()
            .map(parse_utm_params)
            .unwrap_or_default()
            .or(page_url.query().map(parse_utm_params).unwrap_or_default());
        let landing = LandingPage {
            hostname: page_url.host_str().unwrap_or_default().to_string(),
            referrer: request.referrer.clone(),
            utm,
        };

        let session = self.stitcher.resolve_page_view(&visit, landing, now).await?;

        // Must run before the new view is stored so a reload of the same path
        // does not fill in its own duration
        if let (Some(prev_path), Some(prev_created_at)) = (
            non_blank(request.prev_path.as_deref()),
            non_blank(request.prev_created_at.as_deref()),
        ) {
            self.backfiller
                .backfill(&session.session_id, prev_path, prev_created_at, now)
                .await;
        }

        let origin = HitOrigin {
            project_id,
            session_id: session.session_id.clone(),
            visitor_id: visit.fingerprint,
            raw_url: request.url,
            url: page_url,
            created_at: now,
        };
        let view_id = self
            .recorder
            .record_page_view(origin, request.referrer, request.title)
            .await?;

        Ok(TrackResponse {
            session_id: session.session_id,
            view_id,
            new_session: session.is_new,
        })
    }

    /// [`Analytics::track_event`] with an explicit clock.
    pub async fn track_event_at(
        &self,
        request: EventRequest,
        metadata: &RequestMetadata,
        now: DateTime<Utc>,
    ) -> Result<EventResponse, AnalyticsError> {
        let project_id = self.recorder.resolve_project(&request.project_id).await?;
        validate_event_name(&request.event_name)?;
        let page_url = parse_page_url(&request.url)?;

        let visit = VisitContext::from_metadata(project_id, metadata);
        let session_id = self.stitcher.resolve_event(&visit, now).await?;
        let event_data = request.event_data_text();

        let origin = HitOrigin {
            project_id,
            session_id,
            visitor_id: visit.fingerprint,
            raw_url: request.url,
            url: page_url,
            created_at: now,
        };
        let event_id = self
            .recorder
            .record_event(origin, request.event_name, event_data)
            .await?;

        Ok(EventResponse { event_id })
    }

    /// [`Analytics::get_project_stats`] with an explicit clock.
    pub async fn get_project_stats_at(
        &self,
        project_id: &str,
        query: &StatsQuery,
        now: DateTime<Utc>,
    ) -> Result<ProjectStats, AnalyticsError> {
        let project_id = parse_project_id(project_id)?;
        let window = parse_window(
            query.from.as_deref(),
            query.to.as_deref(),
            now,
            self.config.default_window,
        );

        Ok(self.aggregator.summary(project_id, window).await?)
    }

    /// [`Analytics::get_realtime_stats`] with an explicit clock.
    pub async fn get_realtime_stats_at(
        &self,
        project_id: &str,
        now: DateTime<Utc>,
    ) -> Result<RealtimeStats, AnalyticsError> {
        let project_id = parse_project_id(project_id)?;
        Ok(self.aggregator.realtime(project_id, now).await?)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[async_trait]
impl Analytics for AnalyticsService {
    async fn track(
        &self,
        request: TrackRequest,
        metadata: &RequestMetadata,
    ) -> Result<TrackResponse, AnalyticsError> {
        self.track_at(request, metadata, Utc::now()).await
    }

    async fn track_event(
        &self,
        request: EventRequest,
        metadata: &RequestMetadata,
    ) -> Result<EventResponse, AnalyticsError> {
        self.track_event_at(request, metadata, Utc::now()).await
    }

    async fn get_project_stats(
        &self,
        project_id: &str,
        query: StatsQuery,
    ) -> Result<ProjectStats, AnalyticsError> {
        self.get_project_stats_at(project_id, &query, Utc::now())
            .await
    }

    async fn get_realtime_stats(&self, project_id: &str) -> Result<RealtimeStats, AnalyticsError> {
        self.get_realtime_stats_at(project_id, Utc::now()).await
    }
}
