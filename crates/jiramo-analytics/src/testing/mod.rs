//! Shared fixtures for service and handler tests

use crate::store::{AnalyticsStore, ProjectDirectory, SeaOrmAnalyticsStore, TimeWindow};
use crate::types::requests::{EventRequest, TrackRequest};
use crate::AnalyticsService;
use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderValue};
use chrono::{DateTime, Utc};
use jiramo_core::{AnalyticsConfig, RequestMetadata};
use jiramo_database::test_utils::TestDatabase;
use jiramo_entities::{analytics_events, analytics_sessions, page_views};
use sea_orm::{DatabaseConnection, DbErr, EntityTrait, PaginatorTrait};
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Metadata of a beacon request from `ip` with the given user agent.
pub fn metadata(ip: &str, user_agent: &str) -> RequestMetadata {
    let mut headers = HeaderMap::new();
    headers.insert("accept-language", HeaderValue::from_static("en-US,en;q=0.9"));
    RequestMetadata {
        remote_addr: format!("{}:443", ip),
        user_agent: user_agent.to_string(),
        headers,
        query: None,
    }
}

/// A migrated database with one project and a service over it
pub struct AnalyticsTestHelper {
    pub service: AnalyticsService,
    pub db: Arc<DatabaseConnection>,
    pub project_id: Uuid,
    #[allow(dead_code)]
    test_database: TestDatabase,
}

impl AnalyticsTestHelper {
    pub async fn new() -> anyhow::Result<Self> {
        let test_database = TestDatabase::with_migrations().await?;
        let project = test_database.create_project("test_project").await?;
        let db = test_database.connection();
        let service = AnalyticsService::new(db.clone(), AnalyticsConfig::default());

        Ok(Self {
            service,
            db,
            project_id: project.id,
            test_database,
        })
    }

    /// Same fixture, but the service writes through a [`FailingStore`].
    pub async fn with_failing_store() -> anyhow::Result<(Self, Arc<FailingStore>)> {
        let mut helper = Self::new().await?;
        let store = Arc::new(FailingStore::new(helper.db.clone()));
        helper.service =
            AnalyticsService::with_store(store.clone(), store.clone(), AnalyticsConfig::default());
        Ok((helper, store))
    }

    pub fn track_request(&self, url: &str) -> TrackRequest {
        TrackRequest {
            project_id: self.project_id.to_string(),
            url: url.to_string(),
            ..Default::default()
        }
    }

    pub fn event_request(&self, event_name: &str, url: &str) -> EventRequest {
        EventRequest {
            project_id: self.project_id.to_string(),
            url: url.to_string(),
            event_name: event_name.to_string(),
            event_data: Some(json!({"plan": "pro"})),
        }
    }

    /// Row count of any table.
    pub async fn count<E>(&self) -> anyhow::Result<u64>
    where
        E: EntityTrait,
        E::Model: Sync,
    {
        Ok(E::find().count(self.db.as_ref()).await?)
    }
}

/// Store that delegates to SQLite but can be told to fail individual writes.
pub struct FailingStore {
    inner: SeaOrmAnalyticsStore,
    insert_session: AtomicBool,
    renew_session: AtomicBool,
    fill_pending_duration: AtomicBool,
}

impl FailingStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            inner: SeaOrmAnalyticsStore::new(db),
            insert_session: AtomicBool::new(false),
            renew_session: AtomicBool::new(false),
            fill_pending_duration: AtomicBool::new(false),
        }
    }

    pub fn fail_insert_session(&self, fail: bool) {
        self.insert_session.store(fail, Ordering::SeqCst);
    }

    pub fn fail_renew_session(&self, fail: bool) {
        self.renew_session.store(fail, Ordering::SeqCst);
    }

    pub fn fail_fill_pending_duration(&self, fail: bool) {
        self.fill_pending_duration.store(fail, Ordering::SeqCst);
    }

    fn check(flag: &AtomicBool, operation: &str) -> Result<(), DbErr> {
        if flag.load(Ordering::SeqCst) {
            return Err(DbErr::Custom(format!("{} unavailable", operation)));
        }
        Ok(())
    }
}

#[async_trait]
impl ProjectDirectory for FailingStore {
    async fn project_exists(&self, project_id: Uuid) -> Result<bool, DbErr> {
        self.inner.project_exists(project_id).await
    }
}

#[async_trait]
impl AnalyticsStore for FailingStore {
    async fn find_live_session(
        &self,
        visitor_id: &str,
        project_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<analytics_sessions::Model>, DbErr> {
        self.inner.find_live_session(visitor_id, project_id, now).await
    }

    async fn insert_session(&self, session: analytics_sessions::Model) -> Result<(), DbErr> {
        Self::check(&self.insert_session, "insert_session")?;
        self.inner.insert_session(session).await
    }

    async fn renew_session(
        &self,
        id: Uuid,
        expires_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<(), DbErr> {
        Self::check(&self.renew_session, "renew_session")?;
        self.inner.renew_session(id, expires_at, updated_at).await
    }

    async fn fill_pending_duration(
        &self,
        session_id: &str,
        path: &str,
        not_before: DateTime<Utc>,
        duration: i32,
    ) -> Result<bool, DbErr> {
        Self::check(&self.fill_pending_duration, "fill_pending_duration")?;
        self.inner
            .fill_pending_duration(session_id, path, not_before, duration)
            .await
    }

    async fn insert_page_view(&self, view: page_views::Model) -> Result<(), DbErr> {
        self.inner.insert_page_view(view).await
    }

    async fn insert_event(&self, event: analytics_events::Model) -> Result<(), DbErr> {
        self.inner.insert_event(event).await
    }

    async fn count_page_views(&self, project_id: Uuid, window: TimeWindow) -> Result<u64, DbErr> {
        self.inner.count_page_views(project_id, window).await
    }

    async fn count_visitors(&self, project_id: Uuid, window: TimeWindow) -> Result<u64, DbErr> {
        self.inner.count_visitors(project_id, window).await
    }

    async fn count_sessions(&self, project_id: Uuid, window: TimeWindow) -> Result<u64, DbErr> {
        self.inner.count_sessions(project_id, window).await
    }

    async fn count_bounced_sessions(
        &self,
        project_id: Uuid,
        window: TimeWindow,
    ) -> Result<u64, DbErr> {
        self.inner.count_bounced_sessions(project_id, window).await
    }

    async fn top_events(
        &self,
        project_id: Uuid,
        window: TimeWindow,
        limit: u64,
    ) -> Result<Vec<(String, i64)>, DbErr> {
        self.inner.top_events(project_id, window, limit).await
    }
}
