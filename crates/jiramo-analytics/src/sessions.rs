//! Session stitching: attach each hit to the visitor's live session

use crate::fingerprint::{client_ip, new_session_key, visitor_fingerprint};
use crate::store::AnalyticsStore;
use crate::user_agent::{classify, UserAgentInfo};
use crate::utm::UtmParams;
use chrono::{DateTime, Duration, Utc};
use jiramo_core::RequestMetadata;
use jiramo_entities::analytics_sessions;
use sea_orm::DbErr;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Who is visiting, derived once per ingestion request.
#[derive(Debug, Clone)]
pub struct VisitContext {
    pub project_id: Uuid,
    pub fingerprint: String,
    pub user_agent: UserAgentInfo,
    /// First `Accept-Language` entry
    pub language: String,
}

impl VisitContext {
    pub fn from_metadata(project_id: Uuid, metadata: &RequestMetadata) -> Self {
        let ip = client_ip(&metadata.remote_addr, &metadata.headers);
        let language = metadata
            .header("accept-language")
            .and_then(|value| value.split(',').next())
            .map(|tag| tag.trim().to_string())
            .unwrap_or_default();

        Self {
            project_id,
            fingerprint: visitor_fingerprint(&ip, &metadata.user_agent, project_id),
            user_agent: classify(&metadata.user_agent),
            language,
        }
    }
}

/// Attributes recorded on a session when it is first created.
#[derive(Debug, Clone, Default)]
pub struct LandingPage {
    pub hostname: String,
    pub referrer: String,
    pub utm: UtmParams,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSession {
    pub session_id: String,
    pub is_new: bool,
}

pub struct SessionStitcher {
    store: Arc<dyn AnalyticsStore>,
    ttl: Duration,
}

impl SessionStitcher {
    pub fn new(store: Arc<dyn AnalyticsStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Renew the visitor's live session, or open a new one starting at `landing`.
    pub async fn resolve_page_view(
        &self,
        visit: &VisitContext,
        landing: LandingPage,
        now: DateTime<Utc>,
    ) -> Result<ResolvedSession, DbErr> {
        let live = self
            .store
            .find_live_session(&visit.fingerprint, visit.project_id, now)
            .await?;

        if let Some(session) = live {
            // A failed renewal only shortens the session; the hit still belongs to it
            match self.store.renew_session(session.id, now + self.ttl, now).await {
                Ok(()) => debug!("Renewed session {} until {}", session.session_id, now + self.ttl),
                Err(e) => warn!("Failed to renew session {}: {}", session.session_id, e),
            }
            return Ok(ResolvedSession {
                session_id: session.session_id,
                is_new: false,
            });
        }

        let session = analytics_sessions::Model {
            id: Uuid::new_v4(),
            session_id: new_session_key(&visit.fingerprint, now),
            project_id: visit.project_id,
            visitor_id: visit.fingerprint.clone(),
            hostname: landing.hostname,
            browser: visit.user_agent.browser.clone(),
            os: visit.user_agent.os.clone(),
            device: visit.user_agent.device.clone(),
            country: None,
            language: visit.language.clone(),
            referrer: landing.referrer,
            utm_source: landing.utm.utm_source.unwrap_or_default(),
            utm_medium: landing.utm.utm_medium.unwrap_or_default(),
            utm_campaign: landing.utm.utm_campaign.unwrap_or_default(),
            created_at: now,
            updated_at: now,
            expires_at: now + self.ttl,
        };
        let session_id = session.session_id.clone();

        self.store.insert_session(session).await?;
        info!(
            "Started session {} for project {}",
            session_id, visit.project_id
        );

        Ok(ResolvedSession {
            session_id,
            is_new: true,
        })
    }

    /// Session key for an event: the live one if any, otherwise a fresh key
    /// that is not persisted as a session.
    pub async fn resolve_event(
        &self,
        visit: &VisitContext,
        now: DateTime<Utc>,
    ) -> Result<String, DbErr> {
        let live = self
            .store
            .find_live_session(&visit.fingerprint, visit.project_id, now)
            .await?;

        Ok(match live {
            Some(session) => session.session_id,
            None => new_session_key(&visit.fingerprint, now),
        })
    }
}
