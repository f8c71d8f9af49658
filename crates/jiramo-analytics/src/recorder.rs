//! Validation and persistence of page views and custom events

use crate::store::{AnalyticsStore, ProjectDirectory};
use crate::types::AnalyticsError;
use chrono::{DateTime, Utc};
use jiramo_entities::{analytics_events, page_views};
use std::sync::Arc;
use tracing::info;
use url::Url;
use uuid::Uuid;

pub fn parse_project_id(raw: &str) -> Result<Uuid, AnalyticsError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AnalyticsError::InvalidProjectId(raw.to_string()))
}

/// Only absolute URLs are accepted.
pub fn parse_page_url(raw: &str) -> Result<Url, AnalyticsError> {
    Url::parse(raw.trim()).map_err(|_| AnalyticsError::InvalidUrl(raw.to_string()))
}

pub fn validate_event_name(name: &str) -> Result<(), AnalyticsError> {
    if name.trim().is_empty() {
        return Err(AnalyticsError::InvalidEventName);
    }
    Ok(())
}

/// Where a hit happened and who made it.
#[derive(Debug, Clone)]
pub struct HitOrigin {
    pub project_id: Uuid,
    pub session_id: String,
    pub visitor_id: String,
    /// URL exactly as the client sent it
    pub raw_url: String,
    pub url: Url,
    pub created_at: DateTime<Utc>,
}

pub struct Recorder {
    directory: Arc<dyn ProjectDirectory>,
    store: Arc<dyn AnalyticsStore>,
}

impl Recorder {
    pub fn new(directory: Arc<dyn ProjectDirectory>, store: Arc<dyn AnalyticsStore>) -> Self {
        Self { directory, store }
    }

    /// Parse `raw` and make sure it names a known project.
    pub async fn resolve_project(&self, raw: &str) -> Result<Uuid, AnalyticsError> {
        let project_id = parse_project_id(raw)?;
        if !self.directory.project_exists(project_id).await? {
            return Err(AnalyticsError::ProjectNotFound(project_id));
        }
        Ok(project_id)
    }

    pub async fn record_page_view(
        &self,
        origin: HitOrigin,
        referrer: String,
        title: String,
    ) -> Result<Uuid, AnalyticsError> {
        let view = page_views::Model {
            id: Uuid::new_v4(),
            project_id: origin.project_id,
            session_id: origin.session_id,
            visitor_id: origin.visitor_id,
            path: origin.url.path().to_string(),
            url: origin.raw_url,
            referrer,
            title,
            duration: None,
            created_at: origin.created_at,
        };
        let view_id = view.id;
        let path = view.path.clone();

        self.store.insert_page_view(view).await?;
        info!("Recorded page view {} on {} ({})", view_id, path, origin.project_id);

        Ok(view_id)
    }

    pub async fn record_event(
        &self,
        origin: HitOrigin,
        event_name: String,
        event_data: String,
    ) -> Result<Uuid, AnalyticsError> {
        let event = analytics_events::Model {
            id: Uuid::new_v4(),
            project_id: origin.project_id,
            session_id: origin.session_id,
            visitor_id: origin.visitor_id,
            path: origin.url.path().to_string(),
            url: origin.raw_url,
            event_name,
            event_data,
            created_at: origin.created_at,
        };
        let event_id = event.id;
        let name = event.event_name.clone();

        self.store.insert_event(event).await?;
        info!("Recorded event {} ({}) for project {}", name, event_id, origin.project_id);

        Ok(event_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SeaOrmAnalyticsStore;
    use jiramo_database::test_utils::TestDatabase;
    use sea_orm::EntityTrait;

    #[test]
    fn test_parse_project_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_project_id(&id.to_string()).unwrap(), id);
        assert!(matches!(
            parse_project_id("not-a-uuid"),
            Err(AnalyticsError::InvalidProjectId(raw)) if raw == "not-a-uuid"
        ));
    }

    #[test]
    fn test_parse_page_url_requires_absolute_url() {
        let url = parse_page_url("https://example.com/docs/intro?ref=x").unwrap();
        assert_eq!(url.path(), "/docs/intro");
        assert_eq!(url.host_str(), Some("example.com"));

        assert!(matches!(
            parse_page_url("/docs/intro"),
            Err(AnalyticsError::InvalidUrl(_))
        ));
        assert!(matches!(parse_page_url(""), Err(AnalyticsError::InvalidUrl(_))));
    }

    #[test]
    fn test_validate_event_name() {
        assert!(validate_event_name("signup").is_ok());
        assert!(matches!(
            validate_event_name("   "),
            Err(AnalyticsError::InvalidEventName)
        ));
        assert!(validate_event_name("").is_err());
    }

    fn recorder(test_db: &TestDatabase) -> Recorder {
        let store = Arc::new(SeaOrmAnalyticsStore::new(test_db.connection()));
        Recorder::new(store.clone(), store)
    }

    #[tokio::test]
    async fn test_resolve_project() -> anyhow::Result<()> {
        let test_db = TestDatabase::with_migrations().await?;
        let project = test_db.create_project("site").await?;
        let recorder = recorder(&test_db);

        assert_eq!(recorder.resolve_project(&project.id.to_string()).await?, project.id);

        let missing = Uuid::new_v4();
        assert!(matches!(
            recorder.resolve_project(&missing.to_string()).await,
            Err(AnalyticsError::ProjectNotFound(id)) if id == missing
        ));
        assert!(matches!(
            recorder.resolve_project("42").await,
            Err(AnalyticsError::InvalidProjectId(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_record_page_view_stores_path_and_raw_url() -> anyhow::Result<()> {
        let test_db = TestDatabase::with_migrations().await?;
        let project = test_db.create_project("site").await?;
        let recorder = recorder(&test_db);
        let raw_url = "https://example.com/blog/post-1?utm_source=x".to_string();

        let origin = HitOrigin {
            project_id: project.id,
            session_id: "s".repeat(64),
            visitor_id: "v".repeat(64),
            url: parse_page_url(&raw_url)?,
            raw_url: raw_url.clone(),
            created_at: Utc::now(),
        };
        let view_id = recorder
            .record_page_view(origin, "https://google.com/".into(), "Post 1".into())
            .await?;

        let stored = page_views::Entity::find_by_id(view_id)
            .one(test_db.db.as_ref())
            .await?
            .ok_or_else(|| anyhow::anyhow!("page view not stored"))?;
        assert_eq!(stored.url, raw_url);
        assert_eq!(stored.path, "/blog/post-1");
        assert_eq!(stored.title, "Post 1");
        assert_eq!(stored.duration, None);
        Ok(())
    }
}
