/// Configuration loading from TOML file
use std::path::Path;
use tracing::info;

use crate::error::{Result, TradingError};
use crate::types::Config;
use crate::orders::sanitize_exchange;
use crate::utils::parse_clock_time;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| TradingError::ConfigError(format!("Failed to read config file: {}", e)))?;

    let mut config: Config = toml::from_str(&content)
        .map_err(|e| TradingError::ConfigError(format!("Failed to parse config: {}", e)))?;

    // Validate config
    validate_config(&config)?;
    config.exchange_segment = config.exchange_segment.trim().to_uppercase();

    Ok(config)
}

/// Load the config file if it exists, otherwise run with built-in defaults
pub fn load_config_or_default<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    if path.exists() {
        load_config(path)
    } else {
        info!("No config file at {} - using defaults", path.display());
        let config = Config::default();
        validate_config(&config)?;
        Ok(config)
    }
}

fn validate_config(config: &Config) -> Result<()> {
    if config.scrip_master_urls.is_empty() {
        return Err(TradingError::ConfigError("scrip_master_urls is empty".to_string()));
    }

    sanitize_exchange(&config.exchange_segment)
        .map_err(|e| TradingError::ConfigError(format!("exchange_segment: {}", e)))?;

    if config.http_timeout_sec == 0 {
        return Err(TradingError::ConfigError("http_timeout_sec must be > 0".to_string()));
    }

    // Validate paper account
    if config.initial_cash <= 0.0 {
        return Err(TradingError::ConfigError(
            format!("Invalid initial_cash: {}", config.initial_cash)
        ));
    }

    if config.leverage < 1.0 {
        return Err(TradingError::ConfigError(
            format!("Invalid leverage: {} (must be >= 1)", config.leverage)
        ));
    }

    if parse_clock_time(&config.square_off_time).is_none() {
        return Err(TradingError::ConfigError(
            format!("Invalid square_off_time: {}", config.square_off_time)
        ));
    }

    // Validate refresh loop
    if config.refresh_interval_sec == 0 || config.max_concurrent_requests == 0 {
        return Err(TradingError::ConfigError(
            "refresh_interval_sec and max_concurrent_requests must be > 0".to_string()
        ));
    }

    Ok(())
}
