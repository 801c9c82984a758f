use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use warehouse::config::{self, ServerConfig};
use warehouse::{router, AppState};
use warehouse_core::db::{self, DEFAULT_MAX_CONNECTIONS};
use warehouse_core::PgDeviceStore;

#[derive(Parser, Debug)]
#[command(author, version, about = "Warehouse device tracker API server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP API server
    Serve(ServeArgs),
    /// Run database migrations
    Migrate,
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Skip running migrations before serving
    #[arg(long)]
    skip_migrations: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::Migrate => {
            dotenvy::dotenv().ok();
            let database_url = config::database_url()?;
            let pool = db::connect(&database_url, DEFAULT_MAX_CONNECTIONS).await?;
            db::run_migrations(&pool).await?;
            info!("Database migrations applied");
            Ok(())
        }
    }
}

async fn serve(args: ServeArgs) -> Result<()> {
    let config = ServerConfig::from_env()?;
    let pool = db::connect(&config.database_url, config.max_connections).await?;

    if args.skip_migrations {
        warn!("Skipping migrations before serving");
    } else {
        db::run_migrations(&pool).await?;
    }

    let state = AppState::new(Arc::new(PgDeviceStore::new(pool)));
    let app = router(state);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
