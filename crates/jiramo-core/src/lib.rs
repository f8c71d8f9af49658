//! Core utilities and types shared across all Jiramo crates

pub mod config;
pub mod error;
pub mod error_builder;
pub mod problemdetails;
pub mod request_metadata;
pub mod types;

pub use problemdetails::ProblemDetails;

// Re-export commonly used types
pub use config::*;
pub use error::*;
pub use error_builder::*;
pub use request_metadata::{capture_request_metadata, RequestMetadata};
pub use types::*;

// Re-export external dependencies
pub use anyhow;
pub use chrono;
pub use serde;
pub use serde_json;
pub use thiserror;
pub use tracing;
pub use uuid;
