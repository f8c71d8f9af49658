use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use jiramo_core::DBDateTime;

/// One continuous visit of a fingerprint to a project, with a sliding expiry.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "analytics_sessions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Session key shared by every page view and event of the visit
    #[sea_orm(unique)]
    pub session_id: String,
    pub project_id: Uuid,
    /// Visitor fingerprint
    pub visitor_id: String,
    pub hostname: String,
    pub browser: String,
    pub os: String,
    pub device: String,
    /// Never populated by the engine
    pub country: Option<String>,
    pub language: String,
    pub referrer: String,
    pub utm_source: String,
    pub utm_medium: String,
    pub utm_campaign: String,
    pub created_at: DBDateTime,
    pub updated_at: DBDateTime,
    pub expires_at: DBDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::projects::Entity",
        from = "Column::ProjectId",
        to = "super::projects::Column::Id"
    )]
    Project,
}

impl Related<super::projects::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
