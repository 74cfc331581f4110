/// Centralized error types for the trading desk
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TradingError {
    // Session Errors
    #[error("Token expired: {0}")]
    TokenExpired(String),

    // Network Errors
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Network timeout: {0}")]
    NetworkTimeout(String),

    // Data Errors
    #[error("Missing data: {0}")]
    MissingData(String),

    #[error("Deserialization failed: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("CSV parse failed: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Token map unavailable: {0}")]
    TokenMapUnavailable(String),

    #[error("Invalid watchlist: {0}")]
    InvalidWatchlist(String),

    // Order Errors
    #[error("Order rejection: {0}")]
    OrderRejected(String),

    #[error("Insufficient margin: {0}")]
    InsufficientMargin(String),

    // Position Errors
    #[error("Position not found: {0}")]
    PositionNotFound(String),

    // Configuration Errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    // File I/O Errors
    #[error("File I/O error: {0}")]
    FileError(#[from] std::io::Error),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("File write failed: {0}")]
    FileWriteFailed(String),

    // Market Session Errors
    #[error("Market closed: {0}")]
    MarketClosed(String),

    // Broker Errors
    #[error("Broker API error: {code} - {message}")]
    BrokerApiError { code: String, message: String },

    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type Result<T> = std::result::Result<T, TradingError>;

impl TradingError {
    /// Check if the failed operation may succeed when simply tried again
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            TradingError::NetworkTimeout(_)
                | TradingError::HttpError(_)
                | TradingError::MissingData(_)
                | TradingError::BrokerApiError { .. }
                | TradingError::MarketClosed(_)
                | TradingError::FileError(_)
                | TradingError::FileWriteFailed(_)
        )
    }

    /// Get error code for logging/monitoring
    pub fn error_code(&self) -> &str {
        match self {
            TradingError::TokenExpired(_) => "AUTH_002",
            TradingError::HttpError(_) => "NET_001",
            TradingError::NetworkTimeout(_) => "NET_004",
            TradingError::MissingData(_) => "DATA_003",
            TradingError::DeserializationError(_) => "DATA_004",
            TradingError::CsvError(_) => "DATA_005",
            TradingError::TokenMapUnavailable(_) => "DATA_006",
            TradingError::InvalidWatchlist(_) => "DATA_007",
            TradingError::OrderRejected(_) => "ORDER_003",
            TradingError::InsufficientMargin(_) => "ORDER_004",
            TradingError::PositionNotFound(_) => "POS_001",
            TradingError::ConfigError(_) => "CFG_001",
            TradingError::InvalidParameter(_) => "CFG_002",
            TradingError::FileError(_) => "FILE_001",
            TradingError::FileNotFound(_) => "FILE_002",
            TradingError::FileWriteFailed(_) => "FILE_003",
            TradingError::MarketClosed(_) => "MKT_001",
            TradingError::BrokerApiError { .. } => "BROKER_001",
            TradingError::InternalError(_) => "INT_001",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_and_recoverability() {
        let err = TradingError::InsufficientMargin("need 100".to_string());
        assert_eq!(err.error_code(), "ORDER_004");
        assert!(!err.is_recoverable());

        let err = TradingError::NetworkTimeout("ltp".to_string());
        assert!(err.is_recoverable());
        assert_eq!(err.to_string(), "Network timeout: ltp");

        let err = TradingError::MarketClosed("after 15:25".to_string());
        assert_eq!(err.error_code(), "MKT_001");
        assert!(err.is_recoverable());

        // a corrupt state file will not fix itself
        let err: TradingError = serde_json::from_str::<f64>("null").unwrap_err().into();
        assert!(!err.is_recoverable());
    }
}
