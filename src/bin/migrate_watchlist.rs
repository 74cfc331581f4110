/// Convert a record-style watchlist into a plain list of symbols
/// Usage: cargo run --bin migrate_watchlist -- [path]
use std::path::PathBuf;

use tracing::info;

use tradedesk::config::load_config_or_default;
use tradedesk::utils::init_logging;
use tradedesk::watchlist::{MigrationOutcome, Watchlist};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    let config = load_config_or_default(&config_path)?;
    init_logging(&config.log_level, config.log_json);

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| config.watchlist_path());
    info!("Migrating watchlist {}", path.display());

    match Watchlist::migrate_file(&path).await? {
        MigrationOutcome::Migrated(n) => println!("Converted {} to a plain list of {} symbols", path.display(), n),
        MigrationOutcome::AlreadyPlain(n) => println!("{} is already a plain list ({} symbols)", path.display(), n),
    }
    Ok(())
}
