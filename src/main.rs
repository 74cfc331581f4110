/// Main entry point for the paper trading desk
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::{NaiveDate, NaiveTime, Utc};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use tradedesk::{
    broker::{AngelOneClient, HttpScripSource, PaperTradingBroker, SessionManager, TokenMap, TokenMapBuilder},
    config::load_config_or_default,
    data::MarketWatch,
    utils::{init_logging, is_market_open, is_past_square_off, is_trading_weekday, ist_date, parse_clock_time},
    watchlist::{WatchEntry, Watchlist},
    Config,
};

/// Application state
pub struct TradingApp {
    config: Arc<Config>,
    entries: Vec<WatchEntry>,
    market_watch: Arc<MarketWatch>,
    quote_source: Arc<AngelOneClient>,
    paper: Arc<PaperTradingBroker>,
    square_off_at: NaiveTime,
    last_square_off: RwLock<Option<NaiveDate>>,
    shutdown: Arc<RwLock<bool>>,
}

impl TradingApp {
    pub async fn new(config_path: &str) -> anyhow::Result<Self> {
        let config = Arc::new(load_config_or_default(config_path)?);
        init_logging(&config.log_level, config.log_json);

        info!("Starting trading desk (config: {})", config_path);

        let timeout = Duration::from_secs(config.http_timeout_sec);
        let tokens = Self::load_token_map(&config, timeout).await?;

        let watchlist = Watchlist::load(&config.watchlist_path()).await?;
        let entries = watchlist.resolve_tokens(&tokens, &config.exchange_segment);
        info!("Watching {} symbols on {}", entries.len(), config.exchange_segment);

        let square_off_at = parse_clock_time(&config.square_off_time)
            .with_context(|| format!("bad square_off_time {}", config.square_off_time))?;

        let paper = Arc::new(
            PaperTradingBroker::load(&config.paper_state_path(), config.initial_cash, config.leverage)
                .await?
                .with_order_cutoff(square_off_at),
        );

        let session = Arc::new(SessionManager::new(config.session_path()));
        if let Err(e) = session.load_from_file().await {
            warn!("No usable broker session ({}) - quotes will fail until one is saved", e);
        } else if !session.is_valid().await {
            warn!("Broker session has expired - quotes will fail until it is refreshed");
        }
        let quote_source = Arc::new(AngelOneClient::new(session, config.angel_one_api_key.clone(), timeout)?);

        Ok(TradingApp {
            market_watch: Arc::new(MarketWatch::new(config.exchange_segment.clone(), config.max_concurrent_requests)),
            config,
            entries,
            quote_source,
            paper,
            square_off_at,
            last_square_off: RwLock::new(None),
            shutdown: Arc::new(RwLock::new(false)),
        })
    }

    /// Saved map if present, otherwise build one from the scrip master
    async fn load_token_map(config: &Config, timeout: Duration) -> anyhow::Result<TokenMap> {
        let path = config.token_map_path();
        if path.exists() {
            return Ok(TokenMap::load(&path).await?);
        }

        warn!("Token map {} missing - building it now", path.display());
        let builder = TokenMapBuilder::from_config(HttpScripSource::new(timeout)?, config);
        let (tokens, report) = builder.fetch().await?;
        tokens.save(&path).await?;
        info!("Built token map with {} symbols from {}", report.symbols, report.url);
        Ok(tokens)
    }

    pub async fn run(&self) -> anyhow::Result<()> {
        self.setup_shutdown_handler();

        let every = Duration::from_secs(self.config.refresh_interval_sec);
        let refresher: JoinHandle<()> = Arc::clone(&self.market_watch).spawn_refresh_loop(
            Arc::clone(&self.quote_source),
            self.entries.clone(),
            every,
            true,
            Arc::clone(&self.shutdown),
        );

        info!("Trading loop started");
        loop {
            if *self.shutdown.read().await {
                info!("Shutdown flag set - exiting trading loop");
                break;
            }

            if let Err(e) = self.run_trading_cycle().await {
                if e.is_recoverable() {
                    warn!("Trading cycle failed: {} ({})", e, e.error_code());
                } else {
                    error!("Fatal error encountered: {} ({}) - initiating shutdown", e, e.error_code());
                    *self.shutdown.write().await = true;
                    break;
                }
            }

            tokio::time::sleep(every).await;
        }

        if let Err(e) = refresher.await {
            warn!("Quote refresh task ended abnormally: {}", e);
        }
        self.shutdown_sequence().await
    }

    /// Mark positions, run SL/target exits and the daily square-off
    ///
    /// The `paper` tool writes the same state file, so the account is re-read
    /// before any cycle that is going to modify and save it.
    async fn run_trading_cycle(&self) -> tradedesk::Result<()> {
        let now = Utc::now();
        let mut changed = false;

        let square_off_due = is_trading_weekday(now)
            && is_past_square_off(now, self.square_off_at)
            && *self.last_square_off.read().await != Some(ist_date(now));
        if !is_market_open(now) && !square_off_due {
            return Ok(());
        }
        self.paper.reload(&self.config.paper_state_path()).await?;

        if is_market_open(now) {
            let prices = self.market_watch.snapshot().await;
            let exits = self.paper.mark_to_market(&prices).await?;
            for trade in &exits {
                info!("Exit {} ({}): pnl {:.2}", trade.symbol, trade.reason, trade.pnl);
            }
            changed = true;
        }

        if square_off_due {
            let today = ist_date(now);
            let prices = self.market_watch.snapshot().await;
            let trades = self.paper.square_off_all(&prices).await?;
            info!("Square-off for {}: {} positions closed", today, trades.len());
            *self.last_square_off.write().await = Some(today);
            changed = true;
        }

        if changed {
            self.paper.save(&self.config.paper_state_path()).await?;
        }
        Ok(())
    }

    /// Setup graceful shutdown handler
    fn setup_shutdown_handler(&self) {
        let shutdown = Arc::clone(&self.shutdown);

        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl+C: {}", e);
                return;
            }

            info!("Ctrl+C received - initiating graceful shutdown");
            let mut flag = shutdown.write().await;
            *flag = true;
        });
    }

    /// Persist the account and report where it stands
    async fn shutdown_sequence(&self) -> anyhow::Result<()> {
        info!("Starting shutdown sequence...");

        let state_path = self.config.paper_state_path();
        self.paper.reload(&state_path).await.context("re-reading paper account")?;
        self.paper.save(&state_path).await.context("saving paper account")?;

        let summary = self.paper.summary().await;
        info!(
            "Cash {:.2} | open positions {} | trades {} | total pnl {:.2}",
            summary.cash, summary.open_positions, summary.total_trades, summary.total_pnl
        );
        if summary.open_positions > 0 {
            warn!("{} positions left open", summary.open_positions);
        }

        info!("Shutdown sequence completed");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());

    let app = TradingApp::new(&config_path).await?;
    app.run().await
}
