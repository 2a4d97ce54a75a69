use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::Parser;
use db::DBService;
use services::services::{card_ingest::CardIngestor, clash_api::ClashApiClient};
use tracing::{info, warn};

/// Load the Clash Royale card catalog into the database.
#[derive(Debug, Parser)]
#[command(name = "ingest_cards")]
struct Args {
    /// JSON export with an `items` array; the live API is used when omitted
    #[arg(long)]
    file: Option<PathBuf>,

    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://deckbuilder.db")]
    database_url: String,

    #[arg(long, env = "CLASH_ROYALE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[arg(long, env = "CLASH_ROYALE_API_BASE_URL")]
    api_base_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    utils::log::init_tracing(false);
    let args = Args::parse();

    let items = match &args.file {
        Some(path) => {
            info!(path = %path.display(), "Reading cards from file");
            CardIngestor::load_file(path).await?
        }
        None => {
            info!("Fetching cards from the Clash Royale API");
            let client = ClashApiClient::new(args.api_key.clone(), args.api_base_url.clone())?;
            CardIngestor::load_api(&client).await?
        }
    };
    if items.is_empty() {
        warn!("No cards found in source");
        return Ok(());
    }
    info!(cards = items.len(), "Found cards");

    let db = DBService::new(&args.database_url)
        .await
        .with_context(|| format!("failed to open database {}", args.database_url))?;
    let report = CardIngestor::new(db.pool.clone()).ingest(&items).await?;

    info!(
        processed = report.processed(),
        inserted = report.inserted,
        updated = report.updated,
        skipped = report.skipped,
        failed = report.failed,
        "Ingestion summary"
    );
    if report.processed() == 0 {
        bail!("no valid cards were ingested");
    }
    if report.failed > 0 {
        bail!("{} cards could not be stored", report.failed);
    }
    Ok(())
}
