use anyhow::{Context, Result};
use clap::Parser;
use inkpost_backend::api;
use inkpost_backend::config::InkpostConfig;
use inkpost_backend::database::Database;
use inkpost_backend::telemetry;

#[derive(Parser)]
#[command(author, version, about = "Inkpost blog backend daemon")]
struct Args {
    /// Override the configured API port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing();

    let args = Args::parse();

    let mut config = InkpostConfig::from_env()?;
    if let Some(port) = args.port {
        config.api_port = port;
    }

    std::fs::create_dir_all(&config.paths.data_dir)
        .with_context(|| format!("failed to create {}", config.paths.data_dir.display()))?;
    std::fs::create_dir_all(&config.paths.media_dir)
        .with_context(|| format!("failed to create {}", config.paths.media_dir.display()))?;

    let database = Database::connect(&config.paths)?;
    let fresh = database.ensure_migrations()?;
    tracing::info!(
        db = %config.paths.db_path.display(),
        fresh,
        author_mode = config.author_mode,
        "database ready"
    );

    api::serve_http(config, database).await
}
