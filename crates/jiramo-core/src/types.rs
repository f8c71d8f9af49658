//! Shared datetime aliases

use chrono::{DateTime, Utc};

/// Datetime stored in database timestamp columns.
pub type DBDateTime = DateTime<Utc>;

/// Datetime used in API requests and responses (serialises as RFC 3339).
///
/// When exposed through utoipa, annotate the field with
/// `#[schema(value_type = String, format = DateTime)]`.
pub type UtcDateTime = DateTime<Utc>;
