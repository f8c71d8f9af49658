//! Persistence seams of the engine and their sea-orm implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jiramo_entities::{analytics_events, analytics_sessions, page_views, projects};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, QueryTrait, Set,
};
use std::sync::Arc;
use uuid::Uuid;

/// Closed time interval `[from, to]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }
}

/// Answers whether a project id refers to a known project.
#[async_trait]
pub trait ProjectDirectory: Send + Sync {
    async fn project_exists(&self, project_id: Uuid) -> Result<bool, DbErr>;
}

/// Reads and writes of sessions, page views and events.
#[async_trait]
pub trait AnalyticsStore: Send + Sync {
    /// Unexpired session of `(visitor_id, project_id)` with the furthest-future expiry.
    async fn find_live_session(
        &self,
        visitor_id: &str,
        project_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<analytics_sessions::Model>, DbErr>;

    async fn insert_session(&self, session: analytics_sessions::Model) -> Result<(), DbErr>;

    async fn renew_session(
        &self,
        id: Uuid,
        expires_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<(), DbErr>;

    /// Set `duration` on the most recent page view of `session_id` at `path`
    /// created at or after `not_before` whose duration is still unset.
    /// Returns whether a row was updated.
    async fn fill_pending_duration(
        &self,
        session_id: &str,
        path: &str,
        not_before: DateTime<Utc>,
        duration: i32,
    ) -> Result<bool, DbErr>;

    async fn insert_page_view(&self, view: page_views::Model) -> Result<(), DbErr>;

    async fn insert_event(&self, event: analytics_events::Model) -> Result<(), DbErr>;

    async fn count_page_views(&self, project_id: Uuid, window: TimeWindow) -> Result<u64, DbErr>;

    /// Distinct fingerprints among page views in the window.
    async fn count_visitors(&self, project_id: Uuid, window: TimeWindow) -> Result<u64, DbErr>;

    /// Sessions created in the window.
    async fn count_sessions(&self, project_id: Uuid, window: TimeWindow) -> Result<u64, DbErr>;

    /// Sessions created in the window that have exactly one page view in it.
    async fn count_bounced_sessions(
        &self,
        project_id: Uuid,
        window: TimeWindow,
    ) -> Result<u64, DbErr>;

    /// `(event_name, count)` ordered by count descending then name ascending.
    async fn top_events(
        &self,
        project_id: Uuid,
        window: TimeWindow,
        limit: u64,
    ) -> Result<Vec<(String, i64)>, DbErr>;
}

/// [`AnalyticsStore`] and [`ProjectDirectory`] over a sea-orm connection.
#[derive(Clone)]
pub struct SeaOrmAnalyticsStore {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmAnalyticsStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProjectDirectory for SeaOrmAnalyticsStore {
    async fn project_exists(&self, project_id: Uuid) -> Result<bool, DbErr> {
        let count = projects::Entity::find_by_id(project_id)
            .count(self.db.as_ref())
            .await?;
        Ok(count > 0)
    }
}

#[async_trait]
impl AnalyticsStore for SeaOrmAnalyticsStore {
    async fn find_live_session(
        &self,
        visitor_id: &str,
        project_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<analytics_sessions::Model>, DbErr> {
        analytics_sessions::Entity::find()
            .filter(analytics_sessions::Column::VisitorId.eq(visitor_id))
            .filter(analytics_sessions::Column::ProjectId.eq(project_id))
            .filter(analytics_sessions::Column::ExpiresAt.gt(now))
            .order_by_desc(analytics_sessions::Column::ExpiresAt)
            .one(self.db.as_ref())
            .await
    }

    async fn insert_session(&self, session: analytics_sessions::Model) -> Result<(), DbErr> {
        let active = analytics_sessions::ActiveModel {
            id: Set(session.id),
            session_id: Set(session.session_id),
            project_id: Set(session.project_id),
            visitor_id: Set(session.visitor_id),
            hostname: Set(session.hostname),
            browser: Set(session.browser),
            os: Set(session.os),
            device: Set(session.device),
            country: Set(session.country),
            language: Set(session.language),
            referrer: Set(session.referrer),
            utm_source: Set(session.utm_source),
            utm_medium: Set(session.utm_medium),
            utm_campaign: Set(session.utm_campaign),
            created_at: Set(session.created_at),
            updated_at: Set(session.updated_at),
            expires_at: Set(session.expires_at),
        };
        active.insert(self.db.as_ref()).await?;
        Ok(())
    }

    async fn renew_session(
        &self,
        id: Uuid,
        expires_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<(), DbErr> {
        analytics_sessions::Entity::update_many()
            .col_expr(analytics_sessions::Column::ExpiresAt, Expr::value(expires_at))
            .col_expr(analytics_sessions::Column::UpdatedAt, Expr::value(updated_at))
            .filter(analytics_sessions::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;
        Ok(())
    }

    async fn fill_pending_duration(
        &self,
        session_id: &str,
        path: &str,
        not_before: DateTime<Utc>,
        duration: i32,
    ) -> Result<bool, DbErr> {
        let latest_pending = page_views::Entity::find()
            .select_only()
            .column(page_views::Column::Id)
            .filter(page_views::Column::SessionId.eq(session_id))
            .filter(page_views::Column::Path.eq(path))
            .filter(page_views::Column::CreatedAt.gte(not_before))
            .filter(page_views::Column::Duration.is_null())
            .order_by_desc(page_views::Column::CreatedAt)
            .limit(1)
            .into_query();

        let result = page_views::Entity::update_many()
            .col_expr(page_views::Column::Duration, Expr::value(duration))
            .filter(page_views::Column::Id.in_subquery(latest_pending))
            .filter(page_views::Column::Duration.is_null())
            .exec(self.db.as_ref())
            .await?;

        Ok(result.rows_affected > 0)
    }

    async fn insert_page_view(&self, view: page_views::Model) -> Result<(), DbErr> {
        let active = page_views::ActiveModel {
            id: Set(view.id),
            project_id: Set(view.project_id),
            session_id: Set(view.session_id),
            visitor_id: Set(view.visitor_id),
            url: Set(view.url),
            path: Set(view.path),
            referrer: Set(view.referrer),
            title: Set(view.title),
            duration: Set(view.duration),
            created_at: Set(view.created_at),
        };
        active.insert(self.db.as_ref()).await?;
        Ok(())
    }

    async fn insert_event(&self, event: analytics_events::Model) -> Result<(), DbErr> {
        let active = analytics_events::ActiveModel {
            id: Set(event.id),
            project_id: Set(event.project_id),
            session_id: Set(event.session_id),
            visitor_id: Set(event.visitor_id),
            url: Set(event.url),
            path: Set(event.path),
            event_name: Set(event.event_name),
            event_data: Set(event.event_data),
            created_at: Set(event.created_at),
        };
        active.insert(self.db.as_ref()).await?;
        Ok(())
    }

    async fn count_page_views(&self, project_id: Uuid, window: TimeWindow) -> Result<u64, DbErr> {
        page_views::Entity::find()
            .filter(page_views::Column::ProjectId.eq(project_id))
            .filter(page_views::Column::CreatedAt.between(window.from, window.to))
            .count(self.db.as_ref())
            .await
    }

    async fn count_visitors(&self, project_id: Uuid, window: TimeWindow) -> Result<u64, DbErr> {
        page_views::Entity::find()
            .select_only()
            .column(page_views::Column::VisitorId)
            .distinct()
            .filter(page_views::Column::ProjectId.eq(project_id))
            .filter(page_views::Column::CreatedAt.between(window.from, window.to))
            .count(self.db.as_ref())
            .await
    }

    async fn count_sessions(&self, project_id: Uuid, window: TimeWindow) -> Result<u64, DbErr> {
        analytics_sessions::Entity::find()
            .filter(analytics_sessions::Column::ProjectId.eq(project_id))
            .filter(analytics_sessions::Column::CreatedAt.between(window.from, window.to))
            .count(self.db.as_ref())
            .await
    }

    async fn count_bounced_sessions(
        &self,
        project_id: Uuid,
        window: TimeWindow,
    ) -> Result<u64, DbErr> {
        let sessions_in_window = analytics_sessions::Entity::find()
            .select_only()
            .column(analytics_sessions::Column::SessionId)
            .filter(analytics_sessions::Column::ProjectId.eq(project_id))
            .filter(analytics_sessions::Column::CreatedAt.between(window.from, window.to))
            .into_query();

        page_views::Entity::find()
            .select_only()
            .column(page_views::Column::SessionId)
            .filter(page_views::Column::ProjectId.eq(project_id))
            .filter(page_views::Column::CreatedAt.between(window.from, window.to))
            .filter(page_views::Column::SessionId.in_subquery(sessions_in_window))
            .group_by(page_views::Column::SessionId)
            .having(Expr::expr(Expr::col(page_views::Column::Id).count()).eq(1))
            .count(self.db.as_ref())
            .await
    }

    async fn top_events(
        &self,
        project_id: Uuid,
        window: TimeWindow,
        limit: u64,
    ) -> Result<Vec<(String, i64)>, DbErr> {
        analytics_events::Entity::find()
            .select_only()
            .column(analytics_events::Column::EventName)
            .column_as(Expr::col(analytics_events::Column::Id).count(), "count")
            .filter(analytics_events::Column::ProjectId.eq(project_id))
            .filter(analytics_events::Column::CreatedAt.between(window.from, window.to))
            .group_by(analytics_events::Column::EventName)
            .order_by(Expr::col(analytics_events::Column::Id).count(), Order::Desc)
            .order_by_asc(analytics_events::Column::EventName)
            .limit(limit)
            .into_tuple::<(String, i64)>()
            .all(self.db.as_ref())
            .await
    }
}
