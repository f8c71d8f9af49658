//! Database connection management

use jiramo_core::{DatabaseConfig, ServiceError, ServiceResult};
use jiramo_migrations::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use std::sync::Arc;
use tracing::{debug, info};

pub type DbConnection = DatabaseConnection;

/// Connect to the database and bring its schema up to date.
pub async fn establish_connection(config: &DatabaseConfig) -> ServiceResult<Arc<DbConnection>> {
    if config.min_connections > config.max_connections {
        return Err(ServiceError::Configuration {
            message: format!(
                "min_connections ({}) exceeds max_connections ({})",
                config.min_connections, config.max_connections
            ),
        });
    }

    let mut opt = ConnectOptions::new(config.url.as_str());
    opt.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .sqlx_logging(false);

    let db = Database::connect(opt)
        .await
        .map_err(|e| ServiceError::Database(e.to_string()))?;
    debug!("Connected to {:?} database", db.get_database_backend());

    // Run migrations
    Migrator::up(&db, None)
        .await
        .map_err(|e| ServiceError::Database(e.to_string()))?;
    info!("Database migrations applied");

    Ok(Arc::new(db))
}
