use chrono::Utc;
use clap::{Args, Subcommand};
use colored::Colorize;
use jiramo_core::DatabaseConfig;
use jiramo_entities::projects;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};
use tracing::info;
use uuid::Uuid;

#[derive(Args)]
pub struct ProjectCommand {
    #[command(subcommand)]
    command: ProjectCommands,
}

#[derive(Subcommand)]
enum ProjectCommands {
    /// Register a project and print the id beacons report with
    Add(AddProjectArgs),
    /// List registered projects
    List(ListProjectsArgs),
}

#[derive(Args)]
struct AddProjectArgs {
    /// Database connection URL
    #[arg(long, env = "JIRAMO_DATABASE_URL")]
    database_url: String,

    /// Project title
    #[arg(long)]
    title: String,

    /// Optional free-form description
    #[arg(long)]
    description: Option<String>,
}

#[derive(Args)]
struct ListProjectsArgs {
    /// Database connection URL
    #[arg(long, env = "JIRAMO_DATABASE_URL")]
    database_url: String,
}

impl ProjectCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let rt = tokio::runtime::Runtime::new()?;
        match self.command {
            ProjectCommands::Add(args) => rt.block_on(Self::execute_add(args)),
            ProjectCommands::List(args) => rt.block_on(Self::execute_list(args)),
        }
    }

    async fn execute_add(args: AddProjectArgs) -> anyhow::Result<()> {
        let db = jiramo_database::establish_connection(&DatabaseConfig::new(args.database_url))
            .await?;
        let project = create_project(&db, &args.title, args.description).await?;

        println!(
            "{} {}",
            "Created project".bright_green().bold(),
            project.title.bright_white()
        );
        println!("{}", project.id.to_string().bright_cyan());
        Ok(())
    }

    async fn execute_list(args: ListProjectsArgs) -> anyhow::Result<()> {
        let db = jiramo_database::establish_connection(&DatabaseConfig::new(args.database_url))
            .await?;
        let projects = list_projects(&db).await?;

        if projects.is_empty() {
            println!("{}", "No projects yet".bright_yellow());
            return Ok(());
        }

        for project in projects {
            println!(
                "{}  {}  {}",
                project.id.to_string().bright_cyan(),
                project.created_at.format("%Y-%m-%d"),
                project.title.bright_white()
            );
        }
        Ok(())
    }
}

pub async fn create_project(
    db: &DatabaseConnection,
    title: &str,
    description: Option<String>,
) -> anyhow::Result<projects::Model> {
    let title = title.trim();
    if title.is_empty() {
        anyhow::bail!("Project title must not be empty");
    }

    let project = projects::ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(title.to_string()),
        description: Set(description.filter(|d| !d.trim().is_empty())),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await?;

    info!("Created project {} ({})", project.title, project.id);
    Ok(project)
}

pub async fn list_projects(db: &DatabaseConnection) -> anyhow::Result<Vec<projects::Model>> {
    Ok(projects::Entity::find()
        .order_by_asc(projects::Column::CreatedAt)
        .all(db)
        .await?)
}
