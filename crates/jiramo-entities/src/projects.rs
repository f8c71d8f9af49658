use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use jiramo_core::DBDateTime;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DBDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::analytics_sessions::Entity")]
    AnalyticsSessions,
    #[sea_orm(has_many = "super::page_views::Entity")]
    PageViews,
    #[sea_orm(has_many = "super::analytics_events::Entity")]
    AnalyticsEvents,
}

impl Related<super::analytics_sessions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AnalyticsSessions.def()
    }
}

impl Related<super::page_views::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PageViews.def()
    }
}

impl Related<super::analytics_events::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AnalyticsEvents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
