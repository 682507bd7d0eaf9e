//! Daily lunch planner entry point.
//!
//! Runs to completion once per invocation (typically from a scheduler) and
//! exits. No arguments; all configuration comes from the environment.

use lunchbot::config::Config;
use lunchbot::inventory::SheetsClient;
use lunchbot::llm::gemini::GeminiProvider;
use lunchbot::memory::MemoryStore;
use lunchbot::notify::DiscordNotifier;
use lunchbot::pipeline::{PlanOutcome, Planner};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> lunchbot::Result<()> {
    let config = Config::from_env()?;
    let today = chrono::Local::now().date_naive();

    info!(date = %today, sheet = %config.spreadsheet_id, "starting lunch planner");

    let sheets = SheetsClient::new(
        &config.sheets_api_key,
        &config.spreadsheet_id,
        &config.sheet_range,
    );
    let inventory = sheets.fetch_items().await?;
    info!(items = inventory.len(), "inventory fetched");

    let store = MemoryStore::new(&config.memory_path);
    let planner = Planner::new(
        GeminiProvider::new(&config.gemini_api_key),
        store,
        &config.model,
        config.variety_window_days,
    );

    match planner.run(inventory, today).await? {
        PlanOutcome::Planned { record, message } => {
            info!(meal = %record.meal_name, "selection persisted");

            // The meal is chosen and recorded regardless of delivery.
            let notifier = DiscordNotifier::new(&config.webhook_url);
            if let Err(e) = notifier.send(&message).await {
                warn!("notification failed: {}", e);
            } else {
                info!("notification sent");
            }
        }
        PlanOutcome::AlreadyPlanned { date, meal_name } => {
            info!(%date, meal = %meal_name, "already planned today, nothing to do");
        }
    }

    Ok(())
}
