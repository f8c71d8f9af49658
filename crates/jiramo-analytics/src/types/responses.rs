use jiramo_core::UtcDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TrackResponse {
    /// Session key the page view was attached to
    pub session_id: String,
    pub view_id: Uuid,
    pub new_session: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EventResponse {
    pub event_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StatsSummary {
    pub visitors: u64,
    pub visits: u64,
    pub views: u64,
    /// Percentage of visits with a single page view, 0..=100
    pub bounce_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EventCount {
    pub event_name: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProjectStats {
    pub summary: StatsSummary,
    pub events: Vec<EventCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RealtimeStats {
    pub active_visitors: u64,
    #[schema(value_type = String, format = DateTime)]
    pub as_of: UtcDateTime,
}
