use serde::Deserialize;
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

/// Page view beacon
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct TrackRequest {
    pub project_id: String,
    /// Absolute page URL
    pub url: String,
    #[serde(default)]
    pub referrer: String,
    #[serde(default)]
    pub title: String,
    /// Path of the page the visitor just left
    #[serde(default)]
    pub prev_path: Option<String>,
    /// RFC 3339 timestamp of the previous page view
    #[serde(default)]
    pub prev_created_at: Option<String>,
}

/// Custom event beacon
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct EventRequest {
    pub project_id: String,
    pub url: String,
    pub event_name: String,
    /// Opaque payload; strings are stored verbatim, other JSON is stored serialised
    #[serde(default)]
    #[schema(value_type = Object)]
    pub event_data: Option<Value>,
}

impl EventRequest {
    pub fn event_data_text(&self) -> String {
        match &self.event_data {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
        }
    }
}

/// Optional summary window bounds: RFC 3339 or `YYYY-MM-DD`
#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatsQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}
