pub mod projects;

// Analytics entities
pub mod analytics_events;
pub mod analytics_sessions;
pub mod page_views;
