//! Test utilities for database-backed tests
//!
//! Every [`TestDatabase`] is a private in-memory SQLite database with the
//! full migration set applied, so tests never share rows.

use crate::DbConnection;
use chrono::{DateTime, Utc};
use jiramo_entities::projects;
use jiramo_migrations::Migrator;
use sea_orm::*;
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;
use uuid::Uuid;

pub struct TestDatabase {
    pub db: Arc<DbConnection>,
    pub database_url: String,
}

impl TestDatabase {
    /// Empty database without any schema.
    pub async fn new() -> anyhow::Result<Self> {
        let database_url = "sqlite::memory:".to_string();

        // A single pooled connection keeps every query on the same memory database
        let mut opt = ConnectOptions::new(database_url.as_str());
        opt.max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);
        let db = Database::connect(opt).await?;

        Ok(Self {
            db: Arc::new(db),
            database_url,
        })
    }

    /// Database with all migrations applied.
    pub async fn with_migrations() -> anyhow::Result<Self> {
        let test_db = Self::new().await?;
        Migrator::up(test_db.db.as_ref(), None).await?;
        Ok(test_db)
    }

    pub fn connection(&self) -> Arc<DbConnection> {
        self.db.clone()
    }

    /// Insert a project row and return it.
    pub async fn create_project(&self, title: &str) -> anyhow::Result<projects::Model> {
        self.create_project_at(title, Utc::now()).await
    }

    pub async fn create_project_at(
        &self,
        title: &str,
        created_at: DateTime<Utc>,
    ) -> anyhow::Result<projects::Model> {
        let project = projects::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(title.to_string()),
            description: Set(None),
            created_at: Set(created_at),
        };
        Ok(project.insert(self.db.as_ref()).await?)
    }

    pub async fn query_sql(&self, sql: &str) -> anyhow::Result<Vec<QueryResult>> {
        let backend = self.db.get_database_backend();
        Ok(self
            .db
            .query_all(Statement::from_string(backend, sql.to_owned()))
            .await?)
    }
}
