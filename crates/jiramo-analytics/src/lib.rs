pub mod aggregator;
pub mod backfill;
pub mod fingerprint;
pub mod handler;
pub mod recorder;
pub mod service;
pub mod sessions;
pub mod store;
pub mod traits;
pub mod types;
pub mod user_agent;
pub mod utm;

#[cfg(test)]
pub mod testing;

// Re-export main types, service, and store
pub use handler::{configure_routes, AnalyticsApiDoc, AppState};
pub use service::AnalyticsService;
pub use store::{AnalyticsStore, ProjectDirectory, SeaOrmAnalyticsStore, TimeWindow};
pub use traits::Analytics;
pub use types::*;
pub use utm::{parse_utm_params, UtmParams};
