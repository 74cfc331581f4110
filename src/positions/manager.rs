/// Open paper positions keyed by symbol
///
/// The book only knows about quantities, prices and blocked margin. Cash is
/// owned by the paper broker, which applies the realized pnl each of these
/// operations reports.
use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, TradingError};
use crate::types::{ExitReason, Position, PositionType, Trade};

/// Stop loss / target check for one position at `price`
pub fn exit_signal(position: &Position, price: f64) -> Option<ExitReason> {
    let stop_loss = position.stop_loss;
    let target = position.target;

    match position.position_type {
        PositionType::Long => {
            if stop_loss > 0.0 && price <= stop_loss {
                Some(ExitReason::StopLoss)
            } else if target > 0.0 && price >= target {
                Some(ExitReason::Target)
            } else {
                None
            }
        }
        PositionType::Short => {
            if stop_loss > 0.0 && price >= stop_loss {
                Some(ExitReason::StopLoss)
            } else if target > 0.0 && price <= target {
                Some(ExitReason::Target)
            } else {
                None
            }
        }
    }
}

/// Part of a position taken off the book
#[derive(Debug, Clone, PartialEq)]
pub struct Reduction {
    pub trade: Trade,
    pub margin_released: f64,
    /// True when nothing of the position is left
    pub closed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositionBook {
    positions: HashMap<String, Position>,
}

impl PositionBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.positions.contains_key(symbol)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Symbols in a stable order
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.positions.keys().cloned().collect();
        symbols.sort();
        symbols
    }

    pub fn iter(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    pub fn total_margin(&self) -> f64 {
        self.positions.values().map(|p| p.margin_blocked).sum()
    }

    pub fn unrealized_pnl(&self) -> f64 {
        self.positions.values().map(|p| p.pnl).sum()
    }

    /// Put a fresh position on the book
    pub fn open(&mut self, position: Position) -> Result<()> {
        if self.positions.contains_key(&position.symbol) {
            return Err(TradingError::OrderRejected(format!(
                "Position already open for {}",
                position.symbol
            )));
        }

        info!(
            "Opened {} {} x {} @ {:.2}",
            position.position_type.as_str(),
            position.symbol,
            position.quantity,
            position.avg_price
        );
        self.positions.insert(position.symbol.clone(), position);
        Ok(())
    }

    /// Add to an existing position at a weighted average price
    pub fn average_in(
        &mut self,
        symbol: &str,
        quantity: u32,
        price: f64,
        margin: f64,
        stop_loss: Option<f64>,
        target: Option<f64>,
    ) -> Result<&Position> {
        let position = self
            .positions
            .get_mut(symbol)
            .ok_or_else(|| TradingError::PositionNotFound(symbol.to_string()))?;

        let total = position.quantity + quantity;
        position.avg_price =
            (position.entry_value() + price * quantity as f64) / total as f64;
        position.quantity = total;
        position.margin_blocked += margin;
        if let Some(stop_loss) = stop_loss {
            position.stop_loss = stop_loss;
        }
        if let Some(target) = target {
            position.target = target;
        }
        mark(position, price);

        info!(
            "Averaged {} to {} @ {:.2}",
            symbol, position.quantity, position.avg_price
        );
        Ok(position)
    }

    /// Take `quantity` (capped at the held size) off a position at `price`
    pub fn reduce(
        &mut self,
        symbol: &str,
        quantity: u32,
        price: f64,
        reason: ExitReason,
    ) -> Result<Reduction> {
        let position = self
            .positions
            .get_mut(symbol)
            .ok_or_else(|| TradingError::PositionNotFound(symbol.to_string()))?;

        let quantity = quantity.min(position.quantity);
        let closed = quantity == position.quantity;
        let margin_released = if closed {
            position.margin_blocked
        } else {
            position.margin_blocked * quantity as f64 / position.quantity as f64
        };

        let pnl = position.position_type.unit_pnl(position.avg_price, price) * quantity as f64;
        let entry_value = position.avg_price * quantity as f64;
        let trade = Trade {
            trade_id: uuid::Uuid::new_v4().to_string(),
            order_id: position.order_id.clone(),
            symbol: symbol.to_string(),
            position_type: position.position_type,
            quantity,
            entry_price: position.avg_price,
            exit_price: price,
            pnl,
            pnl_pct: if entry_value > 0.0 { pnl / entry_value * 100.0 } else { 0.0 },
            entry_time: position.entry_time,
            exit_time: Utc::now(),
            reason,
        };

        if closed {
            self.positions.remove(symbol);
        } else {
            position.quantity -= quantity;
            position.margin_blocked -= margin_released;
            mark(position, price);
        }

        info!(
            "{} {} x {} @ {:.2} ({}) pnl {:.2}",
            if closed { "Closed" } else { "Reduced" },
            symbol,
            quantity,
            price,
            reason,
            pnl
        );
        Ok(Reduction {
            trade,
            margin_released,
            closed,
        })
    }

    /// Mark one position to `price`
    pub fn mark(&mut self, symbol: &str, price: f64) -> Result<&Position> {
        let position = self
            .positions
            .get_mut(symbol)
            .ok_or_else(|| TradingError::PositionNotFound(symbol.to_string()))?;
        mark(position, price);
        debug!("{} marked @ {:.2}: pnl {:.2}", symbol, price, position.pnl);
        Ok(position)
    }

    pub fn clear(&mut self) {
        self.positions.clear();
    }
}

fn mark(position: &mut Position, price: f64) {
    position.current_price = price;
    position.pnl = position.position_type.unit_pnl(position.avg_price, price) * position.quantity as f64;
    let entry_value = position.entry_value();
    position.pnl_pct = if entry_value > 0.0 { position.pnl / entry_value * 100.0 } else { 0.0 };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(symbol: &str, position_type: PositionType, quantity: u32, price: f64) -> Position {
        Position {
            symbol: symbol.to_string(),
            position_type,
            quantity,
            avg_price: price,
            current_price: price,
            pnl: 0.0,
            pnl_pct: 0.0,
            stop_loss: 0.0,
            target: 0.0,
            margin_blocked: price * quantity as f64 / 5.0,
            order_id: "PAPER_test".to_string(),
            entry_time: Utc::now(),
        }
    }

    #[test]
    fn test_exit_signal_long_and_short() {
        let mut long = position("INFY", PositionType::Long, 10, 100.0);
        long.stop_loss = 95.0;
        long.target = 110.0;
        assert_eq!(exit_signal(&long, 95.0), Some(ExitReason::StopLoss));
        assert_eq!(exit_signal(&long, 110.5), Some(ExitReason::Target));
        assert_eq!(exit_signal(&long, 100.0), None);

        let mut short = position("INFY", PositionType::Short, 10, 100.0);
        short.stop_loss = 105.0;
        short.target = 90.0;
        assert_eq!(exit_signal(&short, 105.0), Some(ExitReason::StopLoss));
        assert_eq!(exit_signal(&short, 89.0), Some(ExitReason::Target));
        assert_eq!(exit_signal(&short, 95.0), None);

        // unset levels never trigger
        let bare = position("INFY", PositionType::Short, 10, 100.0);
        assert_eq!(exit_signal(&bare, 0.5), None);
        assert_eq!(exit_signal(&bare, 1_000.0), None);
    }

    #[test]
    fn test_average_in_weights_price_and_margin() {
        let mut book = PositionBook::new();
        book.open(position("TCS", PositionType::Long, 10, 100.0)).unwrap();

        let averaged = book.average_in("TCS", 30, 120.0, 720.0, Some(110.0), None).unwrap();
        assert_eq!(averaged.quantity, 40);
        assert!((averaged.avg_price - 115.0).abs() < 1e-9);
        assert!((averaged.margin_blocked - 920.0).abs() < 1e-9);
        assert_eq!(averaged.stop_loss, 110.0);
        assert!((averaged.pnl - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_reduce_partial_then_full() {
        let mut book = PositionBook::new();
        book.open(position("SBIN", PositionType::Short, 20, 800.0)).unwrap();

        let partial = book.reduce("SBIN", 5, 780.0, ExitReason::OppositeOrder).unwrap();
        assert!(!partial.closed);
        assert_eq!(partial.trade.pnl, 100.0);
        assert!((partial.margin_released - 800.0).abs() < 1e-9);
        assert_eq!(book.get("SBIN").unwrap().quantity, 15);

        // asking for more than is held only closes what is there
        let rest = book.reduce("SBIN", 50, 810.0, ExitReason::Manual).unwrap();
        assert!(rest.closed);
        assert_eq!(rest.trade.quantity, 15);
        assert_eq!(rest.trade.pnl, -150.0);
        assert!(book.is_empty());
        assert_eq!(book.total_margin(), 0.0);
    }

    #[test]
    fn test_unknown_symbol() {
        let mut book = PositionBook::new();
        assert!(matches!(book.mark("NOPE", 1.0), Err(TradingError::PositionNotFound(_))));
        assert!(matches!(
            book.reduce("NOPE", 1, 1.0, ExitReason::Manual),
            Err(TradingError::PositionNotFound(_))
        ));
    }

    #[test]
    fn test_open_twice_is_rejected() {
        let mut book = PositionBook::new();
        book.open(position("ITC", PositionType::Long, 1, 430.0)).unwrap();
        assert!(book.open(position("ITC", PositionType::Long, 1, 430.0)).is_err());
    }
}
