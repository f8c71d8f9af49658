use async_trait::async_trait;
use jiramo_core::RequestMetadata;

use crate::types::requests::{EventRequest, StatsQuery, TrackRequest};
use crate::types::responses::{EventResponse, ProjectStats, RealtimeStats, TrackResponse};
use crate::types::AnalyticsError;

/// Ingestion and reporting operations exposed over HTTP
#[async_trait]
pub trait Analytics: Send + Sync {
    /// Record a page view, stitching it into the visitor's session
    async fn track(
        &self,
        request: TrackRequest,
        metadata: &RequestMetadata,
    ) -> Result<TrackResponse, AnalyticsError>;

    /// Record a custom event against the visitor's live session, if any
    async fn track_event(
        &self,
        request: EventRequest,
        metadata: &RequestMetadata,
    ) -> Result<EventResponse, AnalyticsError>;

    /// Windowed traffic summary for a project
    async fn get_project_stats(
        &self,
        project_id: &str,
        query: StatsQuery,
    ) -> Result<ProjectStats, AnalyticsError>;

    /// Visitors active in the last few minutes
    async fn get_realtime_stats(&self, project_id: &str) -> Result<RealtimeStats, AnalyticsError>;
}
