use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

fn text_col(name: &str) -> ColumnDef {
    ColumnDef::new(Alias::new(name))
        .string()
        .not_null()
        .default("")
        .to_owned()
}

fn timestamp_col(name: &str) -> ColumnDef {
    ColumnDef::new(Alias::new(name))
        .timestamp_with_time_zone()
        .not_null()
        .to_owned()
}

fn project_fk(table: &str) -> ForeignKeyCreateStatement {
    ForeignKey::create()
        .name(format!("fk_{table}_project_id"))
        .from(Alias::new(table), Alias::new("project_id"))
        .to(Alias::new("projects"), Alias::new("id"))
        .on_delete(ForeignKeyAction::Cascade)
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Sessions
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("analytics_sessions"))
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Alias::new("id"))
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Alias::new("session_id"))
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Alias::new("project_id")).uuid().not_null())
                    .col(
                        ColumnDef::new(Alias::new("visitor_id"))
                            .string_len(64)
                            .not_null(),
                    )
                    .col(&mut text_col("hostname"))
                    .col(&mut text_col("browser"))
                    .col(&mut text_col("os"))
                    .col(&mut text_col("device"))
                    .col(ColumnDef::new(Alias::new("country")).string().null())
                    .col(&mut text_col("language"))
                    .col(&mut text_col("referrer"))
                    .col(&mut text_col("utm_source"))
                    .col(&mut text_col("utm_medium"))
                    .col(&mut text_col("utm_campaign"))
                    .col(&mut timestamp_col("created_at"))
                    .col(&mut timestamp_col("updated_at"))
                    .col(&mut timestamp_col("expires_at"))
                    .foreign_key(&mut project_fk("analytics_sessions"))
                    .to_owned(),
            )
            .await?;

        // Page views
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("page_views"))
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Alias::new("id"))
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Alias::new("project_id")).uuid().not_null())
                    .col(
                        ColumnDef::new(Alias::new("session_id"))
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Alias::new("visitor_id"))
                            .string_len(64)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Alias::new("url")).text().not_null())
                    .col(ColumnDef::new(Alias::new("path")).text().not_null())
                    .col(&mut text_col("referrer"))
                    .col(&mut text_col("title"))
                    .col(ColumnDef::new(Alias::new("duration")).integer().null())
                    .col(&mut timestamp_col("created_at"))
                    .foreign_key(&mut project_fk("page_views"))
                    .to_owned(),
            )
            .await?;

        // Custom events
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("analytics_events"))
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Alias::new("id"))
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Alias::new("project_id")).uuid().not_null())
                    .col(
                        ColumnDef::new(Alias::new("session_id"))
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Alias::new("visitor_id"))
                            .string_len(64)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Alias::new("url")).text().not_null())
                    .col(ColumnDef::new(Alias::new("path")).text().not_null())
                    .col(ColumnDef::new(Alias::new("event_name")).string().not_null())
                    .col(ColumnDef::new(Alias::new("event_data")).text().not_null())
                    .col(&mut timestamp_col("created_at"))
                    .foreign_key(&mut project_fk("analytics_events"))
                    .to_owned(),
            )
            .await?;

        // Live-session lookup: (fingerprint, project) with the latest expiry
        manager
            .create_index(
                Index::create()
                    .name("idx_analytics_sessions_visitor_project_expires")
                    .table(Alias::new("analytics_sessions"))
                    .col(Alias::new("visitor_id"))
                    .col(Alias::new("project_id"))
                    .col(Alias::new("expires_at"))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_analytics_sessions_project_created")
                    .table(Alias::new("analytics_sessions"))
                    .col(Alias::new("project_id"))
                    .col(Alias::new("created_at"))
                    .to_owned(),
            )
            .await?;

        // Duration backfill lookup
        manager
            .create_index(
                Index::create()
                    .name("idx_page_views_session_path_created")
                    .table(Alias::new("page_views"))
                    .col(Alias::new("session_id"))
                    .col(Alias::new("path"))
                    .col(Alias::new("created_at"))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_page_views_project_created")
                    .table(Alias::new("page_views"))
                    .col(Alias::new("project_id"))
                    .col(Alias::new("created_at"))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_analytics_events_project_created")
                    .table(Alias::new("analytics_events"))
                    .col(Alias::new("project_id"))
                    .col(Alias::new("created_at"))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in ["analytics_events", "page_views", "analytics_sessions"] {
            manager
                .drop_table(Table::drop().table(Alias::new(table)).if_exists().to_owned())
                .await?;
        }
        Ok(())
    }
}
