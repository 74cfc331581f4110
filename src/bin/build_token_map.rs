/// Download the scrip master and write the NSE symbol -> token map
/// Usage: cargo run --bin build_token_map --release
use std::time::Duration;

use tracing::info;

use tradedesk::broker::{HttpScripSource, TokenMapBuilder};
use tradedesk::config::load_config_or_default;
use tradedesk::utils::init_logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    let config = load_config_or_default(&config_path)?;
    init_logging(&config.log_level, config.log_json);

    info!("🔍 Building {} token map", config.exchange_segment);

    let source = HttpScripSource::new(Duration::from_secs(config.http_timeout_sec))?;
    let builder = TokenMapBuilder::from_config(source, &config);
    let out = config.token_map_path();
    let report = builder.build_and_save(&out).await?;

    for (url, reason) in &report.skipped {
        info!("Skipped {}: {}", url, reason);
    }
    println!("Saved {} symbols to {} (source: {})", report.symbols, out.display(), report.url);
    Ok(())
}
