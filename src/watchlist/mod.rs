/// Ordered watchlist of symbols persisted as JSON
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::broker::TokenMap;
use crate::error::{Result, TradingError};
use crate::orders::sanitize_symbol;
use crate::utils::{write_bytes_atomic, write_json_atomic};

/// One watchlist symbol with its resolved token, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEntry {
    pub symbol: String,
    pub token: Option<String>,
}

/// Result of converting a watchlist file to the plain format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationOutcome {
    AlreadyPlain(usize),
    Migrated(usize),
}

// Older tooling stored `[{symbol, token, exchange, name}]`
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredEntry {
    Plain(String),
    Record {
        #[serde(default)]
        symbol: Option<String>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Watchlist {
    symbols: Vec<String>,
}

impl Watchlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw symbols, sanitising and dropping duplicates
    pub fn from_symbols<I, S>(symbols: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut watchlist = Watchlist::new();
        for symbol in symbols {
            watchlist.add(symbol.as_ref())?;
        }
        Ok(watchlist)
    }

    /// Append a symbol; returns false when it was already present
    pub fn add(&mut self, symbol: &str) -> Result<bool> {
        let symbol = sanitize_symbol(symbol)?;
        if self.symbols.contains(&symbol) {
            return Ok(false);
        }
        self.symbols.push(symbol);
        Ok(true)
    }

    pub fn remove(&mut self, symbol: &str) -> bool {
        let symbol = symbol.trim().to_uppercase();
        let before = self.symbols.len();
        self.symbols.retain(|s| *s != symbol);
        self.symbols.len() != before
    }

    pub fn contains(&self, symbol: &str) -> bool {
        let symbol = symbol.trim().to_uppercase();
        self.symbols.iter().any(|s| *s == symbol)
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Pair every symbol with its token, keeping watchlist order
    pub fn resolve_tokens(&self, tokens: &TokenMap, exchange: &str) -> Vec<WatchEntry> {
        let entries: Vec<WatchEntry> = self
            .symbols
            .iter()
            .map(|symbol| WatchEntry {
                symbol: symbol.clone(),
                token: tokens.resolve(symbol, exchange).map(str::to_string),
            })
            .collect();

        let missing = entries.iter().filter(|e| e.token.is_none()).count();
        if missing > 0 {
            warn!("{} of {} watchlist symbols have no token", missing, entries.len());
        }
        entries
    }

    /// Load either format; a missing file is an empty watchlist
    pub async fn load(path: &Path) -> Result<Self> {
        let raw = match tokio::fs::read(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No watchlist at {} - starting empty", path.display());
                return Ok(Watchlist::new());
            }
            Err(e) => return Err(e.into()),
        };

        let (watchlist, _) = Self::decode(&raw)?;
        info!("Loaded watchlist: {} symbols", watchlist.len());
        Ok(watchlist)
    }

    /// Persist as a plain JSON array of strings
    pub async fn save(&self, path: &Path) -> Result<()> {
        write_json_atomic(path, &self.symbols, true).await
    }

    /// Rewrite a record-format file as a plain list, keeping a `.backup`
    pub async fn migrate_file(path: &Path) -> Result<MigrationOutcome> {
        let raw = match tokio::fs::read(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TradingError::FileNotFound(path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let (watchlist, had_records) = Self::decode(&raw)?;
        if !had_records {
            return Ok(MigrationOutcome::AlreadyPlain(watchlist.len()));
        }

        let backup = backup_path(path);
        write_bytes_atomic(&backup, &raw).await?;
        info!("Backup created: {}", backup.display());

        watchlist.save(path).await?;
        info!("Converted watchlist to plain list ({} symbols)", watchlist.len());
        Ok(MigrationOutcome::Migrated(watchlist.len()))
    }

    /// Decode raw JSON; the flag reports whether any legacy records were seen
    fn decode(raw: &[u8]) -> Result<(Self, bool)> {
        let stored: Vec<StoredEntry> = serde_json::from_slice(raw)
            .map_err(|e| TradingError::InvalidWatchlist(format!("expected a JSON list: {}", e)))?;

        let mut watchlist = Watchlist::new();
        let mut had_records = false;
        for (idx, entry) in stored.into_iter().enumerate() {
            let symbol = match entry {
                StoredEntry::Plain(symbol) => symbol,
                StoredEntry::Record { symbol } => {
                    had_records = true;
                    symbol.ok_or_else(|| {
                        TradingError::InvalidWatchlist(format!("entry {} has no symbol", idx))
                    })?
                }
            };
            watchlist
                .add(&symbol)
                .map_err(|e| TradingError::InvalidWatchlist(format!("entry {}: {}", idx, e)))?;
        }

        Ok((watchlist, had_records))
    }
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".backup");
    path.with_file_name(name)
}
