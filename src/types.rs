/// Core type definitions for the trading desk
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One row of the broker's scrip master file
///
/// The published JSON carries every value as a string, but older dumps and
/// hand-edited files use bare numbers for `token`, so all fields go through
/// a lenient deserializer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScripRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub token: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub symbol: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub exch_seg: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub instrumenttype: String,
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s,
        Some(other) => other.to_string(),
    })
}

/// Trade side (Buy or Sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }

    /// Direction of the position a fresh order on this side opens
    pub fn opens(&self) -> PositionType {
        match self {
            Side::Buy => PositionType::Long,
            Side::Sell => PositionType::Short,
        }
    }
}

/// Direction of an open position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionType {
    Long,
    Short,
}

impl PositionType {
    pub fn as_str(&self) -> &str {
        match self {
            PositionType::Long => "LONG",
            PositionType::Short => "SHORT",
        }
    }

    /// Per-share profit when moving from `entry` to `price`
    pub fn unit_pnl(&self, entry: f64, price: f64) -> f64 {
        match self {
            PositionType::Long => price - entry,
            PositionType::Short => entry - price,
        }
    }
}

/// Why a position was closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitReason {
    StopLoss,
    Target,
    SquareOff,
    OppositeOrder,
    Manual,
}

impl ExitReason {
    pub fn as_str(&self) -> &str {
        match self {
            ExitReason::StopLoss => "Stop Loss Hit",
            ExitReason::Target => "Target Hit",
            ExitReason::SquareOff => "Auto Square Off",
            ExitReason::OppositeOrder => "Opposite Order",
            ExitReason::Manual => "Manual",
        }
    }
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Paper order as requested by the operator or a strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: Side,
    pub quantity: u32,
    pub price: f64,
    pub stop_loss: Option<f64>,
    pub target: Option<f64>,
}

impl OrderRequest {
    pub fn new(symbol: impl Into<String>, side: Side, quantity: u32, price: f64) -> Self {
        OrderRequest {
            symbol: symbol.into(),
            side,
            quantity,
            price,
            stop_loss: None,
            target: None,
        }
    }

    pub fn with_stop_loss(mut self, stop_loss: f64) -> Self {
        self.stop_loss = Some(stop_loss);
        self
    }

    pub fn with_target(mut self, target: f64) -> Self {
        self.target = Some(target);
        self
    }
}

/// Open paper position
///
/// Aliases keep state files written under the older field names readable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    #[serde(alias = "action")]
    pub position_type: PositionType,
    #[serde(alias = "qty")]
    pub quantity: u32,
    #[serde(alias = "entry_price")]
    pub avg_price: f64,
    #[serde(default)]
    pub current_price: f64,
    #[serde(default)]
    pub pnl: f64,
    #[serde(default, alias = "pnl_percent")]
    pub pnl_pct: f64,
    #[serde(default, alias = "stoploss")]
    pub stop_loss: f64,
    #[serde(default)]
    pub target: f64,
    #[serde(default)]
    pub margin_blocked: f64,
    #[serde(default)]
    pub order_id: String,
    #[serde(default = "Utc::now")]
    pub entry_time: DateTime<Utc>,
}

impl Position {
    pub fn entry_value(&self) -> f64 {
        self.avg_price * self.quantity as f64
    }
}

/// Completed (closed) position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: String,
    pub order_id: String,
    pub symbol: String,
    pub position_type: PositionType,
    pub quantity: u32,
    pub entry_price: f64,
    pub exit_price: f64,
    pub pnl: f64,
    pub pnl_pct: f64,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub reason: ExitReason,
}

/// Simulated execution of one paper order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub order_id: String,
    pub symbol: String,
    pub side: Side,
    pub quantity: u32,
    pub price: f64,
    pub realized_pnl: f64,
    pub timestamp: DateTime<Utc>,
}

/// Last traded price for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub token: String,
    pub ltp: f64,
    pub updated_at: DateTime<Utc>,
    /// Refresh cycle that produced this quote
    pub seq: u64,
}

/// Configuration for the trading desk
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // Storage
    pub data_dir: PathBuf,
    pub token_map_file: String,
    pub watchlist_file: String,
    pub paper_state_file: String,
    pub session_file: String,

    // Scrip master
    pub scrip_master_urls: Vec<String>,
    pub exchange_segment: String,
    pub http_timeout_sec: u64,

    // Paper trading
    pub initial_cash: f64,
    pub leverage: f64,
    pub square_off_time: String,

    // Quote refresh
    pub refresh_interval_sec: u64,
    pub max_concurrent_requests: usize,

    // Logging
    pub log_level: String,
    pub log_json: bool,

    // Broker
    pub angel_one_api_key: String,
}

pub const DEFAULT_SCRIP_MASTER_URLS: [&str; 3] = [
    "https://margincalculator.angelbroking.com/OpenAPI_File/files/OpenAPIScripMaster.json",
    "https://margincalculator.angelbroking.com/OpenAPI_File/files/OpenAPIScripMaster.csv",
    "https://margincalculator.angelbroking.com/OpenAPI_File/files/OpenAPIScripMaster_2020.csv",
];

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: PathBuf::from("data"),
            token_map_file: "angel_tokens_map.json".to_string(),
            watchlist_file: "watchlist.json".to_string(),
            paper_state_file: "paper_trading.json".to_string(),
            session_file: "session.json".to_string(),
            scrip_master_urls: DEFAULT_SCRIP_MASTER_URLS.iter().map(|u| u.to_string()).collect(),
            exchange_segment: "NSE".to_string(),
            http_timeout_sec: 30,
            initial_cash: 100_000.0,
            leverage: 5.0,
            square_off_time: "15:25".to_string(),
            refresh_interval_sec: 5,
            max_concurrent_requests: 8,
            log_level: "info".to_string(),
            log_json: false,
            angel_one_api_key: String::new(),
        }
    }
}

impl Config {
    pub fn token_map_path(&self) -> PathBuf {
        self.data_dir.join(&self.token_map_file)
    }

    pub fn watchlist_path(&self) -> PathBuf {
        self.data_dir.join(&self.watchlist_file)
    }

    pub fn paper_state_path(&self) -> PathBuf {
        self.data_dir.join(&self.paper_state_file)
    }

    pub fn session_path(&self) -> PathBuf {
        self.data_dir.join(&self.session_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scrip_record_accepts_numeric_and_missing_fields() {
        let json = r#"{"token": 2885, "symbol": "RELIANCE-EQ", "exch_seg": "NSE", "name": null}"#;
        let record: ScripRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.token, "2885");
        assert_eq!(record.symbol, "RELIANCE-EQ");
        assert_eq!(record.name, "");
        assert_eq!(record.instrumenttype, "");
    }

    #[test]
    fn test_position_reads_legacy_field_names() {
        let json = r#"{
            "symbol": "TCS",
            "action": "SHORT",
            "qty": 10,
            "entry_price": 4012.0,
            "stoploss": 4100.0
        }"#;
        let position: Position = serde_json::from_str(json).unwrap();

        assert_eq!(position.position_type, PositionType::Short);
        assert_eq!(position.quantity, 10);
        assert_eq!(position.avg_price, 4012.0);
        assert_eq!(position.stop_loss, 4100.0);
        assert_eq!(position.target, 0.0);
    }

    #[test]
    fn test_unit_pnl_by_direction() {
        assert_eq!(PositionType::Long.unit_pnl(100.0, 110.0), 10.0);
        assert_eq!(PositionType::Short.unit_pnl(100.0, 110.0), -10.0);
    }
}
