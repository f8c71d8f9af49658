mod shutdown;

use axum::Router;
use clap::Args;
use jiramo_analytics::{configure_routes, AnalyticsApiDoc, AnalyticsService, AppState};
use jiramo_core::{AnalyticsConfig, DatabaseConfig};
use jiramo_database::{establish_connection, DbConnection};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use shutdown::shutdown_signal;

/// One year
const MAX_SESSION_TTL_MINUTES: i64 = 525_600;

#[derive(Args)]
pub struct ServeCommand {
    /// Address to bind the server to
    #[arg(long, default_value = "127.0.0.1:8080", env = "JIRAMO_ADDRESS")]
    pub address: String,

    /// Database connection URL
    #[arg(long, env = "JIRAMO_DATABASE_URL")]
    pub database_url: String,

    /// Maximum number of pooled database connections
    #[arg(long, default_value_t = 20, env = "JIRAMO_DB_MAX_CONNECTIONS")]
    pub max_connections: u32,

    /// Minimum number of idle database connections
    #[arg(long, default_value_t = 1, env = "JIRAMO_DB_MIN_CONNECTIONS")]
    pub min_connections: u32,

    /// Minutes of inactivity after which a visit session expires
    #[arg(
        long,
        default_value_t = 30,
        env = "JIRAMO_SESSION_TTL_MINUTES",
        value_parser = clap::value_parser!(i64).range(1..=MAX_SESSION_TTL_MINUTES)
    )]
    pub session_ttl_minutes: i64,
}

impl ServeCommand {
    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.database_url.clone(),
            max_connections: self.max_connections,
            min_connections: self.min_connections,
        }
    }

    pub fn analytics_config(&self) -> AnalyticsConfig {
        AnalyticsConfig::default().with_session_ttl_minutes(self.session_ttl_minutes)
    }

    pub fn execute(self) -> anyhow::Result<()> {
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(self.serve())
    }

    async fn serve(self) -> anyhow::Result<()> {
        debug!("Initializing database connection...");
        let db = establish_connection(&self.database_config()).await?;

        let app = build_application(db, self.analytics_config());

        let listener = TcpListener::bind(&self.address).await?;
        info!("Jiramo server listening on {}", self.address);

        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        info!("Jiramo server exited");
        Ok(())
    }
}

/// Analytics routes plus the Swagger UI over their OpenAPI document.
pub fn build_application(db: Arc<DbConnection>, config: AnalyticsConfig) -> Router {
    let analytics_service = Arc::new(AnalyticsService::new(db, config));
    let state = Arc::new(AppState { analytics_service });

    configure_routes()
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", AnalyticsApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use clap::Parser;
    use jiramo_database::test_utils::TestDatabase;
    use tower::ServiceExt;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        serve: ServeCommand,
    }

    #[test]
    fn test_serve_defaults() {
        let harness =
            Harness::try_parse_from(["jiramo", "--database-url", "sqlite::memory:"]).unwrap();
        let serve = harness.serve;

        assert_eq!(serve.address, "127.0.0.1:8080");
        assert_eq!(serve.database_config().max_connections, 20);
        assert_eq!(serve.database_config().min_connections, 1);
        assert_eq!(serve.analytics_config(), AnalyticsConfig::default());
    }

    #[test]
    fn test_session_ttl_flag() {
        let harness = Harness::try_parse_from([
            "jiramo",
            "--database-url",
            "sqlite::memory:",
            "--session-ttl-minutes",
            "45",
        ])
        .unwrap();

        assert_eq!(
            harness.serve.analytics_config().session_ttl,
            chrono::Duration::minutes(45)
        );
    }

    #[test]
    fn test_session_ttl_must_be_positive() {
        let result = Harness::try_parse_from([
            "jiramo",
            "--database-url",
            "sqlite::memory:",
            "--session-ttl-minutes",
            "0",
        ]);

        assert!(result.is_err());
    }

    #[test]
    fn test_session_ttl_is_capped() {
        let parse = |minutes: &str| {
            Harness::try_parse_from([
                "jiramo",
                "--database-url",
                "sqlite::memory:",
                "--session-ttl-minutes",
                minutes,
            ])
        };

        let harness = parse("525600").unwrap();
        assert_eq!(
            harness.serve.analytics_config().session_ttl,
            chrono::Duration::days(365)
        );
        assert!(parse("525601").is_err());
        assert!(parse("9223372036854775807").is_err());
    }

    #[tokio::test]
    async fn test_application_serves_openapi_document() -> anyhow::Result<()> {
        let test_db = TestDatabase::with_migrations().await?;
        let app = build_application(test_db.connection(), AnalyticsConfig::default());

        let response = app
            .oneshot(Request::builder().uri("/api-docs/openapi.json").body(Body::empty())?)
            .await?;

        assert_eq!(response.status(), StatusCode::OK);
        Ok(())
    }

    #[tokio::test]
    async fn test_application_routes_analytics() -> anyhow::Result<()> {
        let test_db = TestDatabase::with_migrations().await?;
        let project = test_db.create_project("site").await?;
        let app = build_application(test_db.connection(), AnalyticsConfig::default());

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/projects/{}/analytics/realtime", project.id))
                    .body(Body::empty())?,
            )
            .await?;

        assert_eq!(response.status(), StatusCode::OK);
        Ok(())
    }
}
