/// Shared quote table refreshed off the caller's task
///
/// Readers only ever take a read lock on the table, so a slow broker never
/// blocks them. Every refresh cycle is stamped with a sequence number and a
/// quote is only replaced by one from a newer cycle: if two refreshes overlap,
/// the older one cannot overwrite prices written by the newer one.
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::future::BoxFuture;
use futures_util::{stream, StreamExt};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{Result, TradingError};
use crate::types::Quote;
use crate::utils::is_market_open;
use crate::watchlist::WatchEntry;

/// Source of last traded prices
pub trait QuoteSource: Send + Sync {
    fn ltp<'a>(&'a self, exchange: &'a str, symbol: &'a str, token: &'a str) -> BoxFuture<'a, Result<f64>>;
}

/// Counters for one refresh cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshStats {
    pub seq: u64,
    pub updated: usize,
    pub failed: usize,
    /// Entries without a token, or superseded by a newer cycle
    pub skipped: usize,
}

pub struct MarketWatch {
    exchange: String,
    max_concurrent: usize,
    quotes: Arc<RwLock<HashMap<String, Quote>>>,
    next_seq: AtomicU64,
}

impl MarketWatch {
    pub fn new(exchange: impl Into<String>, max_concurrent: usize) -> Self {
        MarketWatch {
            exchange: exchange.into(),
            max_concurrent: max_concurrent.max(1),
            quotes: Arc::new(RwLock::new(HashMap::new())),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Reserve the sequence number for a new refresh cycle
    pub fn begin_cycle(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Fetch quotes for every entry with a token and merge them in
    pub async fn refresh<S>(&self, source: &S, entries: &[WatchEntry]) -> RefreshStats
    where
        S: QuoteSource + ?Sized,
    {
        let seq = self.begin_cycle();
        let mut stats = RefreshStats {
            seq,
            ..RefreshStats::default()
        };

        let requests: Vec<(String, String)> = entries
            .iter()
            .filter_map(|e| e.token.clone().map(|t| (e.symbol.clone(), t)))
            .collect();
        stats.skipped = entries.len() - requests.len();

        let exchange = self.exchange.as_str();
        let results: Vec<(String, String, Result<f64>)> = stream::iter(requests)
            .map(|(symbol, token)| async move {
                let ltp = source.ltp(exchange, &symbol, &token).await;
                (symbol, token, ltp)
            })
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        let now = Utc::now();
        let mut quotes = Vec::with_capacity(results.len());
        for (symbol, token, ltp) in results {
            match ltp {
                Ok(ltp) if ltp.is_finite() && ltp > 0.0 => quotes.push(Quote {
                    symbol,
                    token,
                    ltp,
                    updated_at: now,
                    seq,
                }),
                Ok(ltp) => {
                    warn!("Discarding LTP {} for {}", ltp, symbol);
                    stats.failed += 1;
                }
                Err(e) => {
                    warn!("LTP fetch failed for {}: {} ({})", symbol, e, e.error_code());
                    stats.failed += 1;
                }
            }
        }

        let applied = self.apply(quotes).await;
        stats.skipped += applied.1;
        stats.updated = applied.0;
        debug!(
            "Refresh #{}: {} updated, {} failed, {} skipped",
            stats.seq, stats.updated, stats.failed, stats.skipped
        );
        stats
    }

    /// Merge quotes, keeping whichever of old/new carries the later cycle
    ///
    /// Returns (applied, superseded).
    pub async fn apply(&self, quotes: Vec<Quote>) -> (usize, usize) {
        let mut table = self.quotes.write().await;
        let mut applied = 0;
        let mut superseded = 0;

        for quote in quotes {
            match table.get(&quote.symbol) {
                Some(existing) if existing.seq > quote.seq => superseded += 1,
                _ => {
                    table.insert(quote.symbol.clone(), quote);
                    applied += 1;
                }
            }
        }

        (applied, superseded)
    }

    pub async fn ltp(&self, symbol: &str) -> Option<f64> {
        let table = self.quotes.read().await;
        table.get(symbol).map(|q| q.ltp)
    }

    pub async fn quote(&self, symbol: &str) -> Option<Quote> {
        let table = self.quotes.read().await;
        table.get(symbol).cloned()
    }

    /// Current symbol -> LTP prices
    pub async fn snapshot(&self) -> HashMap<String, f64> {
        let table = self.quotes.read().await;
        table.iter().map(|(s, q)| (s.clone(), q.ltp)).collect()
    }

    pub async fn len(&self) -> usize {
        self.quotes.read().await.len()
    }

    /// Refresh `entries` every `every` until `shutdown` flips to true
    ///
    /// With `market_hours_only` the cycle is skipped outside NSE hours.
    pub fn spawn_refresh_loop<S>(
        self: Arc<Self>,
        source: Arc<S>,
        entries: Vec<WatchEntry>,
        every: Duration,
        market_hours_only: bool,
        shutdown: Arc<RwLock<bool>>,
    ) -> JoinHandle<()>
    where
        S: QuoteSource + ?Sized + 'static,
    {
        tokio::spawn(async move {
            info!("Quote refresh started for {} symbols every {:?}", entries.len(), every);
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;

                if *shutdown.read().await {
                    break;
                }
                if market_hours_only && !is_market_open(Utc::now()) {
                    continue;
                }

                self.refresh(source.as_ref(), &entries).await;
            }

            info!("Quote refresh stopped");
        })
    }
}

/// Fixed price table, used by the paper tool and tests
#[derive(Debug, Clone, Default)]
pub struct StaticQuotes {
    prices: HashMap<String, f64>,
}

impl StaticQuotes {
    pub fn new(prices: HashMap<String, f64>) -> Self {
        StaticQuotes { prices }
    }
}

impl QuoteSource for StaticQuotes {
    fn ltp<'a>(&'a self, _exchange: &'a str, symbol: &'a str, _token: &'a str) -> BoxFuture<'a, Result<f64>> {
        let price = self
            .prices
            .get(symbol)
            .copied()
            .ok_or_else(|| TradingError::MissingData(format!("No price for {}", symbol)));
        Box::pin(async move { price })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(symbol: &str, token: Option<&str>) -> WatchEntry {
        WatchEntry {
            symbol: symbol.to_string(),
            token: token.map(str::to_string),
        }
    }

    fn quote(symbol: &str, ltp: f64, seq: u64) -> Quote {
        Quote {
            symbol: symbol.to_string(),
            token: "1".to_string(),
            ltp,
            updated_at: Utc::now(),
            seq,
        }
    }

    #[tokio::test]
    async fn test_refresh_updates_and_counts() {
        let watch = MarketWatch::new("NSE", 4);
        let source = StaticQuotes::new(HashMap::from([
            ("RELIANCE".to_string(), 2895.0),
            ("TCS".to_string(), 4012.0),
        ]));
        let entries = vec![
            entry("RELIANCE", Some("2885")),
            entry("TCS", Some("11536")),
            entry("WIPRO", Some("3787")),
            entry("UNKNOWN", None),
        ];

        let stats = watch.refresh(&source, &entries).await;
        assert_eq!(stats.seq, 1);
        assert_eq!(stats.updated, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.skipped, 1);
        assert_eq!(watch.ltp("RELIANCE").await, Some(2895.0));
        assert_eq!(watch.quote("TCS").await.unwrap().token, "11536");
        assert_eq!(watch.len().await, 2);
    }

    #[tokio::test]
    async fn test_older_cycle_never_overwrites_newer_quote() {
        let watch = MarketWatch::new("NSE", 1);
        let older = watch.begin_cycle();
        let newer = watch.begin_cycle();

        watch.apply(vec![quote("SBIN", 836.0, newer)]).await;
        let (applied, superseded) = watch.apply(vec![quote("SBIN", 820.0, older)]).await;

        assert_eq!((applied, superseded), (0, 1));
        assert_eq!(watch.ltp("SBIN").await, Some(836.0));

        watch.apply(vec![quote("SBIN", 840.0, newer + 1)]).await;
        assert_eq!(watch.snapshot().await.get("SBIN"), Some(&840.0));
    }

    #[tokio::test]
    async fn test_refresh_loop_stops_on_shutdown() {
        let watch = Arc::new(MarketWatch::new("NSE", 2));
        let source = Arc::new(StaticQuotes::new(HashMap::from([("ITC".to_string(), 430.0)])));
        let shutdown = Arc::new(RwLock::new(false));

        let handle = Arc::clone(&watch).spawn_refresh_loop(
            source,
            vec![entry("ITC", Some("1660"))],
            Duration::from_millis(10),
            false,
            Arc::clone(&shutdown),
        );

        tokio::time::sleep(Duration::from_millis(50)).await;
        *shutdown.write().await = true;
        tokio::time::timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();

        assert_eq!(watch.ltp("ITC").await, Some(430.0));
    }
}
