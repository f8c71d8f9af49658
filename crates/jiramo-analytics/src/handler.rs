use crate::types::{requests::*, responses::*};
use crate::{Analytics, AnalyticsError, ErrorKind};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use jiramo_core::error_builder::{bad_request, internal_server_error, not_found};
use jiramo_core::problemdetails::Problem;
use jiramo_core::{capture_request_metadata, ProblemDetails, RequestMetadata};
use std::sync::Arc;
use tracing::{error, warn};
use utoipa::OpenApi;

pub struct AppState {
    pub analytics_service: Arc<dyn Analytics>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        track_page_view,
        track_event,
        get_project_stats,
        get_realtime_stats,
    ),
    components(schemas(
        TrackRequest,
        TrackResponse,
        EventRequest,
        EventResponse,
        StatsQuery,
        StatsSummary,
        EventCount,
        ProjectStats,
        RealtimeStats,
        ProblemDetails,
    )),
    info(
        title = "Analytics API",
        description = "Cookieless page view and event ingestion with session stitching, \
        plus windowed traffic summaries and real-time visitor counts per project.",
        version = "1.0.0"
    )
)]
pub struct AnalyticsApiDoc;

/// Analytics routes. Request metadata is captured for every route; the
/// client address is only known when the server is started with connect info.
pub fn configure_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/analytics/track", post(track_page_view))
        .route("/analytics/event", post(track_event))
        .route("/projects/{id}/analytics", get(get_project_stats))
        .route("/projects/{id}/analytics/realtime", get(get_realtime_stats))
        .route_layer(middleware::from_fn(capture_request_metadata))
}

pub(crate) fn handle_analytics_error(error: AnalyticsError) -> Problem {
    match error.kind() {
        ErrorKind::MalformedInput => {
            warn!("Rejected analytics request: {}", error);
            bad_request().detail(error.to_string()).build()
        }
        ErrorKind::NotFound => {
            warn!("Analytics target missing: {}", error);
            not_found().detail("Project not found").build()
        }
        ErrorKind::StoreUnavailable => {
            error!("Analytics store error: {}", error);
            internal_server_error()
                .detail("Database error while processing analytics data")
                .build()
        }
    }
}

fn handle_payload_rejection(rejection: JsonRejection) -> Problem {
    warn!("Invalid analytics payload: {}", rejection.body_text());
    bad_request()
        .detail(format!("Invalid payload: {}", rejection.body_text()))
        .build()
}

/// Record a page view
#[utoipa::path(
    tag = "Analytics",
    post,
    path = "/analytics/track",
    request_body = TrackRequest,
    responses(
        (status = 201, description = "Page view recorded", body = TrackResponse),
        (status = 400, description = "Invalid payload, project id or URL", body = ProblemDetails),
        (status = 404, description = "Project not found", body = ProblemDetails),
        (status = 500, description = "Internal server error", body = ProblemDetails)
    )
)]
pub async fn track_page_view(
    State(app_state): State<Arc<AppState>>,
    Extension(metadata): Extension<RequestMetadata>,
    payload: Result<Json<TrackRequest>, JsonRejection>,
) -> Result<impl IntoResponse, Problem> {
    let Json(request) = payload.map_err(handle_payload_rejection)?;

    let response = app_state
        .analytics_service
        .track(request, &metadata)
        .await
        .map_err(handle_analytics_error)?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// Record a custom event
#[utoipa::path(
    tag = "Analytics",
    post,
    path = "/analytics/event",
    request_body = EventRequest,
    responses(
        (status = 201, description = "Event recorded", body = EventResponse),
        (status = 400, description = "Invalid payload, project id, event name or URL", body = ProblemDetails),
        (status = 404, description = "Project not found", body = ProblemDetails),
        (status = 500, description = "Internal server error", body = ProblemDetails)
    )
)]
pub async fn track_event(
    State(app_state): State<Arc<AppState>>,
    Extension(metadata): Extension<RequestMetadata>,
    payload: Result<Json<EventRequest>, JsonRejection>,
) -> Result<impl IntoResponse, Problem> {
    let Json(request) = payload.map_err(handle_payload_rejection)?;

    let response = app_state
        .analytics_service
        .track_event(request, &metadata)
        .await
        .map_err(handle_analytics_error)?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// Traffic summary for a project over a time window
#[utoipa::path(
    tag = "Analytics",
    get,
    path = "/projects/{id}/analytics",
    params(
        ("id" = String, Path, description = "Project UUID"),
        StatsQuery
    ),
    responses(
        (status = 200, description = "Successfully retrieved project stats", body = ProjectStats),
        (status = 400, description = "Invalid project id", body = ProblemDetails),
        (status = 500, description = "Internal server error", body = ProblemDetails)
    )
)]
pub async fn get_project_stats(
    State(app_state): State<Arc<AppState>>,
    Path(project_id): Path<String>,
    Query(query): Query<StatsQuery>,
) -> Result<impl IntoResponse, Problem> {
    match app_state
        .analytics_service
        .get_project_stats(&project_id, query)
        .await
    {
        Ok(stats) => Ok(Json(stats)),
        Err(e) => Err(handle_analytics_error(e)),
    }
}

/// Visitors active in the last five minutes
#[utoipa::path(
    tag = "Analytics",
    get,
    path = "/projects/{id}/analytics/realtime",
    params(
        ("id" = String, Path, description = "Project UUID")
    ),
    responses(
        (status = 200, description = "Successfully retrieved realtime stats", body = RealtimeStats),
        (status = 400, description = "Invalid project id", body = ProblemDetails),
        (status = 500, description = "Internal server error", body = ProblemDetails)
    )
)]
pub async fn get_realtime_stats(
    State(app_state): State<Arc<AppState>>,
    Path(project_id): Path<String>,
) -> Result<impl IntoResponse, Problem> {
    match app_state
        .analytics_service
        .get_realtime_stats(&project_id)
        .await
    {
        Ok(stats) => Ok(Json(stats)),
        Err(e) => Err(handle_analytics_error(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{AnalyticsTestHelper, FailingStore};
    use crate::AnalyticsService;
    use axum::body::Body;
    use axum::http::header::{CONTENT_TYPE, USER_AGENT};
    use axum::http::Request;
    use jiramo_core::AnalyticsConfig;
    use jiramo_entities::analytics_sessions;
    use sea_orm::EntityTrait;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app(helper: &AnalyticsTestHelper) -> Router {
        let service = AnalyticsService::new(helper.db.clone(), AnalyticsConfig::default());
        configure_routes().with_state(Arc::new(AppState {
            analytics_service: Arc::new(service),
        }))
    }

    fn post_json(uri: &str, body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .header(USER_AGENT, "Mozilla/5.0 (X11; Linux x86_64) Firefox/121.0")
            .header("x-forwarded-for", "203.0.113.50")
            .body(Body::from(body))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_track_returns_created() -> anyhow::Result<()> {
        let helper = AnalyticsTestHelper::new().await?;
        let body = json!({
            "project_id": helper.project_id,
            "url": "https://example.com/welcome",
            "title": "Welcome"
        });

        let response = app(&helper)
            .oneshot(post_json("/analytics/track", body.to_string()))
            .await?;

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        assert_eq!(body["new_session"], json!(true));
        assert_eq!(body["session_id"].as_str().map(str::len), Some(64));
        assert!(body["view_id"].is_string());
        Ok(())
    }

    #[tokio::test]
    async fn test_track_reads_utm_from_beacon_query() -> anyhow::Result<()> {
        let helper = AnalyticsTestHelper::new().await?;
        let body = json!({
            "project_id": helper.project_id,
            "url": "https://example.com/"
        });

        let response = app(&helper)
            .oneshot(post_json(
                "/analytics/track?utm_source=twitter&utm_medium=social",
                body.to_string(),
            ))
            .await?;
        assert_eq!(response.status(), StatusCode::CREATED);

        let sessions = analytics_sessions::Entity::find()
            .all(helper.db.as_ref())
            .await?;
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].utm_source, "twitter");
        assert_eq!(sessions[0].utm_medium, "social");
        assert_eq!(sessions[0].browser, "Firefox");
        assert_eq!(sessions[0].os, "Linux");
        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() -> anyhow::Result<()> {
        let helper = AnalyticsTestHelper::new().await?;

        let response = app(&helper)
            .oneshot(post_json("/analytics/track", "{not json".to_string()))
            .await?;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/problem+json"
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_project_id_is_bad_request() -> anyhow::Result<()> {
        let helper = AnalyticsTestHelper::new().await?;
        let body = json!({ "project_id": "nope", "url": "https://example.com/" });

        let response = app(&helper)
            .oneshot(post_json("/analytics/track", body.to_string()))
            .await?;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error_code"], json!("BAD_REQUEST"));
        assert_eq!(body["detail"], json!("Invalid project_id: nope"));
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_project_is_not_found() -> anyhow::Result<()> {
        let helper = AnalyticsTestHelper::new().await?;
        let body = json!({
            "project_id": uuid::Uuid::new_v4(),
            "url": "https://example.com/",
            "event_name": "signup"
        });

        let response = app(&helper)
            .oneshot(post_json("/analytics/event", body.to_string()))
            .await?;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json_body(response).await;
        assert_eq!(body["error_code"], json!("NOT_FOUND"));
        Ok(())
    }

    #[tokio::test]
    async fn test_event_returns_created() -> anyhow::Result<()> {
        let helper = AnalyticsTestHelper::new().await?;
        let body = json!({
            "project_id": helper.project_id,
            "url": "https://example.com/pricing",
            "event_name": "upgrade_clicked",
            "event_data": "{\"plan\":\"team\"}"
        });

        let response = app(&helper)
            .oneshot(post_json("/analytics/event", body.to_string()))
            .await?;

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        assert!(body["event_id"].is_string());
        Ok(())
    }

    #[tokio::test]
    async fn test_project_stats() -> anyhow::Result<()> {
        let helper = AnalyticsTestHelper::new().await?;
        let router = app(&helper);
        let view = json!({ "project_id": helper.project_id, "url": "https://example.com/" });
        let event = json!({
            "project_id": helper.project_id,
            "url": "https://example.com/",
            "event_name": "signup"
        });

        router
            .clone()
            .oneshot(post_json("/analytics/track", view.to_string()))
            .await?;
        router
            .clone()
            .oneshot(post_json("/analytics/event", event.to_string()))
            .await?;

        let response = router
            .oneshot(get(&format!("/projects/{}/analytics", helper.project_id)))
            .await?;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["summary"]["visitors"], json!(1));
        assert_eq!(body["summary"]["visits"], json!(1));
        assert_eq!(body["summary"]["views"], json!(1));
        assert_eq!(body["summary"]["bounce_rate"], json!(100.0));
        assert_eq!(body["events"], json!([{ "event_name": "signup", "count": 1 }]));
        Ok(())
    }

    #[tokio::test]
    async fn test_project_stats_with_bare_date_window() -> anyhow::Result<()> {
        let helper = AnalyticsTestHelper::new().await?;

        let response = app(&helper)
            .oneshot(get(&format!(
                "/projects/{}/analytics?from=2020-01-01&to=2020-01-31",
                helper.project_id
            )))
            .await?;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["summary"]["views"], json!(0));
        assert_eq!(body["summary"]["bounce_rate"], json!(0.0));
        Ok(())
    }

    #[tokio::test]
    async fn test_realtime_stats() -> anyhow::Result<()> {
        let helper = AnalyticsTestHelper::new().await?;
        let router = app(&helper);
        let view = json!({ "project_id": helper.project_id, "url": "https://example.com/" });

        router
            .clone()
            .oneshot(post_json("/analytics/track", view.to_string()))
            .await?;

        let response = router
            .oneshot(get(&format!(
                "/projects/{}/analytics/realtime",
                helper.project_id
            )))
            .await?;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["active_visitors"], json!(1));
        assert!(body["as_of"].is_string());
        Ok(())
    }

    #[tokio::test]
    async fn test_realtime_rejects_malformed_id() -> anyhow::Result<()> {
        let helper = AnalyticsTestHelper::new().await?;

        let response = app(&helper)
            .oneshot(get("/projects/not-a-uuid/analytics/realtime"))
            .await?;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn test_store_failure_is_internal_error() -> anyhow::Result<()> {
        let helper = AnalyticsTestHelper::new().await?;
        let store = Arc::new(FailingStore::new(helper.db.clone()));
        store.fail_insert_session(true);
        let service = AnalyticsService::with_store(store.clone(), store, AnalyticsConfig::default());
        let router = configure_routes().with_state(Arc::new(AppState {
            analytics_service: Arc::new(service),
        }));
        let body = json!({ "project_id": helper.project_id, "url": "https://example.com/" });

        let response = router
            .oneshot(post_json("/analytics/track", body.to_string()))
            .await?;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["error_code"], json!("INTERNAL_SERVER_ERROR"));
        Ok(())
    }

    #[test]
    fn test_error_kinds_map_to_status() {
        let cases = [
            (AnalyticsError::InvalidEventName, StatusCode::BAD_REQUEST),
            (
                AnalyticsError::ProjectNotFound(uuid::Uuid::nil()),
                StatusCode::NOT_FOUND,
            ),
            (
                AnalyticsError::Database(sea_orm::DbErr::Custom("down".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(handle_analytics_error(error).status_code, status);
        }
    }

    #[test]
    fn test_openapi_lists_routes() {
        let doc = AnalyticsApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();

        assert!(paths.iter().any(|p| p.as_str() == "/analytics/track"));
        assert!(paths.iter().any(|p| p.as_str() == "/analytics/event"));
        assert!(paths.iter().any(|p| p.as_str() == "/projects/{id}/analytics"));
        assert!(paths
            .iter()
            .any(|p| p.as_str() == "/projects/{id}/analytics/realtime"));
    }
}
