mod briefs;

use std::sync::Arc;

use bezz_db::{BriefStore, PgBriefStore};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "bezz-cli")]
#[command(about = "Run and inspect brand brief pipelines")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance commands
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Submit a brief and run its pipeline in this process
    Run {
        #[arg(long)]
        company: String,
        #[arg(long)]
        sector: String,
        #[arg(long)]
        tone: String,
        #[arg(long)]
        audience: String,
        #[arg(long, default_value = "en")]
        language: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        info: String,
        #[arg(long, env = "BEZZ_CLI_OWNER", default_value = "cli")]
        owner: String,
        /// Print each status change while the run is in flight
        #[arg(long)]
        watch: bool,
    },
    /// Show a brief's status and results
    Status {
        id: String,
        /// Print the stored document as JSON
        #[arg(long)]
        json: bool,
    },
    /// Re-run a failed brief in this process
    Retry {
        id: String,
        #[arg(long)]
        watch: bool,
    },
    /// Park abandoned runs so they can be retried
    Sweep,
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    Migrate,
    Ping,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("bezz-cli: no command given; see --help");
        return Ok(());
    };

    let db = bezz_core::load_db_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(db.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool =
        bezz_db::connect_pool(&db.database_url, bezz_db::PoolConfig::from_db_config(&db)).await?;

    match command {
        Commands::Db { command } => match command {
            DbCommands::Migrate => {
                let applied = bezz_db::run_migrations(&pool).await?;
                println!("applied {applied} migration(s)");
            }
            DbCommands::Ping => {
                bezz_db::ping(&pool).await?;
                println!("database reachable");
            }
        },
        Commands::Run {
            company,
            sector,
            tone,
            audience,
            language,
            description,
            info,
            owner,
            watch,
        } => {
            let input = bezz_core::BriefInput {
                company_name: company,
                sector,
                tone,
                target_audience: audience,
                language,
                business_description: description,
                additional_info: info,
            };
            let (store, orchestrator) = pipeline(pool)?;
            briefs::run(store.as_ref(), &orchestrator, &owner, input, watch).await?;
        }
        Commands::Status { id, json } => {
            let store = PgBriefStore::new(pool);
            briefs::status(&store, &id, json).await?;
        }
        Commands::Retry { id, watch } => {
            let (store, orchestrator) = pipeline(pool)?;
            briefs::retry(store.as_ref(), &orchestrator, &id, watch).await?;
        }
        Commands::Sweep => {
            let (_, orchestrator) = pipeline(pool)?;
            let parked = orchestrator.sweep_stale(chrono::Utc::now()).await?;
            println!("parked {parked} stale brief(s)");
        }
    }

    Ok(())
}

/// Commands that run the pipeline need the full configuration, model and
/// storage credentials included.
fn pipeline(
    pool: sqlx::PgPool,
) -> anyhow::Result<(Arc<dyn BriefStore>, bezz_pipeline::PipelineOrchestrator)> {
    let config = bezz_core::load_app_config()?;
    let store: Arc<dyn BriefStore> = Arc::new(PgBriefStore::new(pool));
    let orchestrator = bezz_pipeline::from_app_config(&config, Arc::clone(&store))?;
    Ok((store, orchestrator))
}

#[cfg(test)]
mod tests;
