/// Symbol -> token map persisted for the trading desk
use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, info};

use crate::error::Result;
use crate::utils::{read_json, write_json_atomic};

/// Flat symbol -> token lookup for one exchange segment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenMap {
    entries: BTreeMap<String, String>,
}

impl TokenMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: String, token: String) -> Option<String> {
        self.entries.insert(symbol, token)
    }

    /// Exact symbol lookup
    pub fn token(&self, symbol: &str) -> Option<&str> {
        self.entries.get(symbol).map(String::as_str)
    }

    /// Lookup tolerant of the key styles found in older map files
    ///
    /// Tries `EXCH:SYM-EQ`, `EXCH:SYM`, `SYM-EQ`, `SYM` in that order.
    pub fn resolve(&self, symbol: &str, exchange: &str) -> Option<&str> {
        let symbol = symbol.trim();
        let candidates = [
            format!("{}:{}-EQ", exchange, symbol),
            format!("{}:{}", exchange, symbol),
            format!("{}-EQ", symbol),
            symbol.to_string(),
        ];

        let found = candidates.iter().find_map(|key| self.token(key));
        if found.is_none() {
            debug!("No token for {} on {}", symbol, exchange);
        }
        found
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Load a previously saved map
    pub async fn load(path: &Path) -> Result<Self> {
        let entries: BTreeMap<String, String> = read_json(path).await?;
        info!("Loaded {} tokens from {}", entries.len(), path.display());
        Ok(TokenMap { entries })
    }

    /// Persist the map, replacing any previous file in one step
    pub async fn save(&self, path: &Path) -> Result<()> {
        write_json_atomic(path, &self.entries, false).await?;
        info!("Saved token map: {} ({} symbols)", path.display(), self.len());
        Ok(())
    }
}

impl FromIterator<(String, String)> for TokenMap {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        TokenMap {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TokenMap {
        [
            ("RELIANCE-EQ", "2885"),
            ("M&M-EQ", "2031"),
            ("NSE:TCS", "11536"),
            ("NIFTY", "99926000"),
        ]
        .into_iter()
        .map(|(s, t)| (s.to_string(), t.to_string()))
        .collect()
    }

    #[test]
    fn test_resolve_tries_each_key_style() {
        let map = sample();

        assert_eq!(map.resolve("RELIANCE", "NSE"), Some("2885"));
        assert_eq!(map.resolve("M&M", "NSE"), Some("2031"));
        assert_eq!(map.resolve("TCS", "NSE"), Some("11536"));
        assert_eq!(map.resolve(" NIFTY ", "NSE"), Some("99926000"));
        assert_eq!(map.resolve("WIPRO", "NSE"), None);
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("angel_tokens_map.json");

        let map = sample();
        map.save(&path).await.unwrap();

        let raw = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(raw.starts_with('{'));

        let loaded = TokenMap::load(&path).await.unwrap();
        assert_eq!(loaded, map);
    }
}
