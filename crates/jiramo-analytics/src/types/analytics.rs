use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Invalid project_id: {0}")]
    InvalidProjectId(String),
    #[error("Project not found: {0}")]
    ProjectNotFound(Uuid),
    #[error("Invalid event name")]
    InvalidEventName,
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Coarse failure class, mapped one-to-one onto HTTP status families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedInput,
    NotFound,
    StoreUnavailable,
}

impl AnalyticsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalyticsError::InvalidProjectId(_)
            | AnalyticsError::InvalidEventName
            | AnalyticsError::InvalidUrl(_) => ErrorKind::MalformedInput,
            AnalyticsError::ProjectNotFound(_) => ErrorKind::NotFound,
            AnalyticsError::Database(_) => ErrorKind::StoreUnavailable,
        }
    }
}
