//! Database migrations for the Jiramo analytics engine

pub use sea_orm_migration::prelude::*;

mod migration;
pub use migration::Migrator;
