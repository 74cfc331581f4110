/// Scrip master download with ordered URL fallback
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use reqwest::Client;
use tracing::{info, warn};

use crate::broker::scrip_master::{parse_token_map, ScripFormat};
use crate::broker::token_map::TokenMap;
use crate::error::{Result, TradingError};
use crate::types::Config;
use crate::utils::write_bytes_atomic;

/// Anything that can hand back the raw bytes behind a scrip master URL
pub trait ScripSource: Send + Sync {
    fn download<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>>>;
}

/// Plain HTTP GET source
pub struct HttpScripSource {
    client: Client,
}

impl HttpScripSource {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(HttpScripSource { client })
    }
}

impl ScripSource for HttpScripSource {
    fn download<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>>> {
        async move {
            let response = self.client.get(url).send().await?.error_for_status()?;
            let bytes = response.bytes().await?;
            Ok(bytes.to_vec())
        }
        .boxed()
    }
}

/// Outcome of a successful build
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub url: String,
    pub format: ScripFormat,
    pub symbols: usize,
    /// URLs tried before the winning one, with the reason each was skipped
    pub skipped: Vec<(String, String)>,
}

/// Builds the symbol -> token map from the first usable scrip master URL
pub struct TokenMapBuilder<S> {
    source: S,
    urls: Vec<String>,
    exchange_segment: String,
    data_dir: PathBuf,
}

impl<S: ScripSource> TokenMapBuilder<S> {
    pub fn new(source: S, urls: Vec<String>, exchange_segment: String, data_dir: PathBuf) -> Self {
        TokenMapBuilder {
            source,
            urls,
            exchange_segment,
            data_dir,
        }
    }

    pub fn from_config(source: S, config: &Config) -> Self {
        Self::new(
            source,
            config.scrip_master_urls.clone(),
            config.exchange_segment.clone(),
            config.data_dir.clone(),
        )
    }

    /// Try each URL in order and stop at the first non-empty map
    pub async fn fetch(&self) -> Result<(TokenMap, BuildReport)> {
        let mut skipped = Vec::new();

        for url in &self.urls {
            info!("Downloading: {}", url);
            match self.try_url(url).await {
                Ok(map) if !map.is_empty() => {
                    let report = BuildReport {
                        url: url.clone(),
                        format: ScripFormat::from_url(url),
                        symbols: map.len(),
                        skipped,
                    };
                    return Ok((map, report));
                }
                Ok(_) => {
                    warn!("No {} symbols in {}", self.exchange_segment, url);
                    skipped.push((url.clone(), "empty map".to_string()));
                }
                Err(e) => {
                    warn!("Download/parse failed for {}: {} ({})", url, e, e.error_code());
                    skipped.push((url.clone(), e.to_string()));
                }
            }
        }

        let detail = skipped
            .iter()
            .map(|(url, reason)| format!("{} -> {}", url, reason))
            .collect::<Vec<_>>()
            .join("; ");
        Err(TradingError::TokenMapUnavailable(format!(
            "could not build token map from any known URL: {}",
            if detail.is_empty() { "no URLs configured" } else { detail.as_str() }
        )))
    }

    /// Fetch, then persist the map to `out`
    pub async fn build_and_save(&self, out: &Path) -> Result<BuildReport> {
        let (map, report) = self.fetch().await?;
        map.save(out).await?;
        info!("Symbols mapped: {} (from {})", report.symbols, report.url);
        Ok(report)
    }

    async fn try_url(&self, url: &str) -> Result<TokenMap> {
        let raw = self.source.download(url).await?;
        let format = ScripFormat::from_url(url);

        // keep the raw file around for offline inspection
        write_bytes_atomic(&self.data_dir.join(format.raw_file_name()), &raw).await?;

        parse_token_map(&raw, format, &self.exchange_segment)
    }
}
