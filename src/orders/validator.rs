/// Pre-order input sanitising for paper orders and watchlist edits
use crate::error::{Result, TradingError};
use crate::types::OrderRequest;

pub const MAX_SYMBOL_LENGTH: usize = 20;
pub const MAX_QUANTITY: u32 = 100_000;
pub const MAX_PRICE: f64 = 1_000_000.0;
pub const VALID_EXCHANGES: [&str; 5] = ["NSE", "BSE", "NFO", "MCX", "CDS"];

/// Trim and uppercase a symbol, rejecting anything outside `[A-Z0-9&_-]`
pub fn sanitize_symbol(symbol: &str) -> Result<String> {
    let symbol = symbol.trim().to_uppercase();

    if symbol.is_empty() {
        return Err(TradingError::InvalidParameter("Symbol must be non-empty".to_string()));
    }

    if symbol.len() > MAX_SYMBOL_LENGTH {
        return Err(TradingError::InvalidParameter(format!(
            "Symbol too long (max {} characters): {}",
            MAX_SYMBOL_LENGTH, symbol
        )));
    }

    if !symbol
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || matches!(c, '&' | '_' | '-'))
    {
        return Err(TradingError::InvalidParameter(format!(
            "Symbol contains invalid characters: {}",
            symbol
        )));
    }

    Ok(symbol)
}

pub fn sanitize_exchange(exchange: &str) -> Result<String> {
    let exchange = exchange.trim().to_uppercase();
    if VALID_EXCHANGES.contains(&exchange.as_str()) {
        Ok(exchange)
    } else {
        Err(TradingError::InvalidParameter(format!(
            "Invalid exchange {} (expected one of {})",
            exchange,
            VALID_EXCHANGES.join(", ")
        )))
    }
}

/// Reject prices that are non-finite, non-positive or above `MAX_PRICE`
pub fn check_price(price: f64) -> Result<()> {
    if !price.is_finite() || price <= 0.0 || price > MAX_PRICE {
        return Err(TradingError::InvalidParameter(format!(
            "Price {} outside (0, {}]",
            price, MAX_PRICE
        )));
    }
    Ok(())
}

pub struct OrderValidator;

impl OrderValidator {
    /// Validate an order and return it with a normalised symbol
    pub fn validate_order(order: &OrderRequest) -> Result<OrderRequest> {
        let symbol = sanitize_symbol(&order.symbol)?;
        Self::check_quantity(order.quantity)?;
        check_price(order.price)?;

        if let Some(stop_loss) = order.stop_loss {
            Self::check_level("stop loss", stop_loss)?;
        }
        if let Some(target) = order.target {
            Self::check_level("target", target)?;
        }

        Ok(OrderRequest {
            symbol,
            ..order.clone()
        })
    }

    fn check_quantity(quantity: u32) -> Result<()> {
        if quantity == 0 || quantity > MAX_QUANTITY {
            return Err(TradingError::InvalidParameter(format!(
                "Quantity {} outside 1..={}",
                quantity, MAX_QUANTITY
            )));
        }
        Ok(())
    }

    fn check_level(label: &str, level: f64) -> Result<()> {
        if !level.is_finite() || level < 0.0 {
            return Err(TradingError::InvalidParameter(format!("Invalid {}: {}", label, level)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Side;

    #[test]
    fn test_sanitize_symbol() {
        assert_eq!(sanitize_symbol(" reliance ").unwrap(), "RELIANCE");
        assert_eq!(sanitize_symbol("m&m").unwrap(), "M&M");
        assert_eq!(sanitize_symbol("BAJAJ-AUTO").unwrap(), "BAJAJ-AUTO");
        assert!(sanitize_symbol("").is_err());
        assert!(sanitize_symbol("DROP TABLE").is_err());
        assert!(sanitize_symbol("../etc/passwd").is_err());
        assert!(sanitize_symbol("ABCDEFGHIJKLMNOPQRSTUVWXYZ").is_err());
    }

    #[test]
    fn test_sanitize_exchange() {
        assert_eq!(sanitize_exchange("nse").unwrap(), "NSE");
        assert!(sanitize_exchange("NYSE").is_err());
    }

    #[test]
    fn test_check_price() {
        assert!(check_price(836.25).is_ok());
        assert!(check_price(f64::NAN).is_err());
        assert!(check_price(f64::INFINITY).is_err());
        assert!(check_price(0.0).is_err());
        assert!(check_price(-1.0).is_err());
    }

    #[test]
    fn test_validate_order() {
        let order = OrderRequest::new("infy", Side::Buy, 30, 1600.0).with_stop_loss(1568.0);
        let validated = OrderValidator::validate_order(&order).unwrap();
        assert_eq!(validated.symbol, "INFY");
        assert_eq!(validated.stop_loss, Some(1568.0));

        assert!(OrderValidator::validate_order(&OrderRequest::new("INFY", Side::Buy, 0, 1600.0)).is_err());
        assert!(OrderValidator::validate_order(&OrderRequest::new("INFY", Side::Buy, 1, f64::NAN)).is_err());
        assert!(OrderValidator::validate_order(&OrderRequest::new("INFY", Side::Buy, 1, 2_000_000.0)).is_err());
        assert!(OrderValidator::validate_order(
            &OrderRequest::new("INFY", Side::Sell, 1, 1600.0).with_target(-5.0)
        )
        .is_err());
    }
}
