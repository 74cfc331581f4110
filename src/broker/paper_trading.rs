/// Paper trading (simulation mode) broker
///
/// Orders fill instantly at the requested price. Opening a position blocks
/// `quantity * price / leverage` of margin; closing it releases that margin
/// and credits the realized pnl to cash.
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::{Result, TradingError};
use crate::orders::{check_price, sanitize_symbol, OrderValidator};
use crate::positions::{exit_signal, PositionBook, Reduction};
use crate::types::{ExitReason, Fill, OrderRequest, Position, PositionType, Side, Trade};
use crate::utils::{is_market_open, is_past_square_off, read_json, write_json_atomic};

/// Whole simulated account, persisted as one JSON document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperAccount {
    pub initial_cash: f64,
    pub cash: f64,
    pub leverage: f64,
    #[serde(default)]
    pub used_margin: f64,
    #[serde(default)]
    pub positions: PositionBook,
    #[serde(default)]
    pub trade_history: Vec<Trade>,
    #[serde(default)]
    pub fills: Vec<Fill>,
    #[serde(default)]
    pub winning_trades: u32,
    #[serde(default)]
    pub losing_trades: u32,
}

impl PaperAccount {
    pub fn new(initial_cash: f64, leverage: f64) -> Self {
        PaperAccount {
            initial_cash,
            cash: initial_cash,
            leverage,
            used_margin: 0.0,
            positions: PositionBook::new(),
            trade_history: Vec::new(),
            fills: Vec::new(),
            winning_trades: 0,
            losing_trades: 0,
        }
    }

    pub fn available_margin(&self) -> f64 {
        (self.cash - self.used_margin).max(0.0)
    }

    fn margin_for(&self, quantity: u32, price: f64) -> f64 {
        quantity as f64 * price / self.leverage
    }

    fn check_margin(&self, symbol: &str, required: f64, headroom: f64) -> Result<()> {
        let available = (self.available_margin() + headroom).max(0.0);
        if required > available {
            return Err(TradingError::InsufficientMargin(format!(
                "{} needs {:.2}, available {:.2}",
                symbol, required, available
            )));
        }
        Ok(())
    }

    fn book_reduction(&mut self, reduction: Reduction) -> Trade {
        let trade = reduction.trade;
        self.cash += trade.pnl;
        self.used_margin = self.positions.total_margin();

        if trade.pnl > 0.0 {
            self.winning_trades += 1;
        } else if trade.pnl < 0.0 {
            self.losing_trades += 1;
        }
        self.trade_history.push(trade.clone());
        trade
    }

    fn record_fill(&mut self, order_id: &str, symbol: &str, side: Side, quantity: u32, price: f64, realized_pnl: f64) {
        self.fills.push(Fill {
            order_id: order_id.to_string(),
            symbol: symbol.to_string(),
            side,
            quantity,
            price,
            realized_pnl,
            timestamp: Utc::now(),
        });
    }

    /// Close one position entirely and record the exit fill
    fn close(&mut self, symbol: &str, price: f64, reason: ExitReason) -> Result<Trade> {
        check_price(price)?;
        let (position_type, quantity) = self
            .positions
            .get(symbol)
            .map(|p| (p.position_type, p.quantity))
            .ok_or_else(|| TradingError::PositionNotFound(symbol.to_string()))?;
        let side = match position_type {
            PositionType::Long => Side::Sell,
            PositionType::Short => Side::Buy,
        };

        let reduction = self.positions.reduce(symbol, quantity, price, reason)?;
        let trade = self.book_reduction(reduction);
        let order_id = new_order_id();
        self.record_fill(&order_id, symbol, side, quantity, price, trade.pnl);
        Ok(trade)
    }
}

/// Snapshot of the account for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountSummary {
    pub initial_cash: f64,
    pub cash: f64,
    pub used_margin: f64,
    pub available_margin: f64,
    pub unrealized_pnl: f64,
    pub portfolio_value: f64,
    pub total_pnl: f64,
    pub open_positions: usize,
    pub total_trades: usize,
    pub winning_trades: u32,
    pub losing_trades: u32,
    pub win_rate: f64,
}

/// Result of one accepted paper order
#[derive(Debug, Clone, PartialEq)]
pub struct OrderOutcome {
    pub order_id: String,
    pub fill: Fill,
    /// Trade booked when the order reduced or closed a position
    pub closed_trade: Option<Trade>,
    /// Position for the symbol after the order, if any is left
    pub position: Option<Position>,
}

fn new_order_id() -> String {
    format!("PAPER_{}", uuid::Uuid::new_v4())
}

/// Paper trading broker that simulates intraday orders
pub struct PaperTradingBroker {
    account: Arc<RwLock<PaperAccount>>,
    /// New orders are refused outside market hours and from this IST time on
    order_cutoff: Option<NaiveTime>,
}

impl PaperTradingBroker {
    pub fn new(initial_cash: f64, leverage: f64) -> Self {
        Self::from_account(PaperAccount::new(initial_cash, leverage))
    }

    pub fn from_account(account: PaperAccount) -> Self {
        PaperTradingBroker {
            account: Arc::new(RwLock::new(account)),
            order_cutoff: None,
        }
    }

    /// Enforce the intraday order window, closing at `square_off` IST
    pub fn with_order_cutoff(mut self, square_off: NaiveTime) -> Self {
        self.order_cutoff = Some(square_off);
        self
    }

    /// Restore the account saved at `path`, or start fresh when there is none
    pub async fn load(path: &Path, initial_cash: f64, leverage: f64) -> Result<Self> {
        match read_json::<PaperAccount>(path).await {
            Ok(account) => {
                info!(
                    "📝 [PAPER] Restored account: cash {:.2}, {} open positions",
                    account.cash,
                    account.positions.len()
                );
                Ok(Self::from_account(account))
            }
            Err(TradingError::FileNotFound(_)) => {
                info!("📝 [PAPER] No saved account - starting with {:.2}", initial_cash);
                Ok(Self::new(initial_cash, leverage))
            }
            Err(e) => Err(e),
        }
    }

    /// Replace the in-memory account with the one saved at `path`
    ///
    /// Picks up orders written by another process since the last load. A
    /// missing file leaves the account as it is.
    pub async fn reload(&self, path: &Path) -> Result<()> {
        match read_json::<PaperAccount>(path).await {
            Ok(saved) => {
                *self.account.write().await = saved;
                Ok(())
            }
            Err(TradingError::FileNotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        let account = self.account.read().await;
        write_json_atomic(path, &*account, true).await
    }

    /// Clone of the full account state
    pub async fn account(&self) -> PaperAccount {
        self.account.read().await.clone()
    }

    /// Execute a paper order against the current position in its symbol
    pub async fn execute_order(&self, request: OrderRequest) -> Result<OrderOutcome> {
        self.execute_order_at(request, Utc::now()).await
    }

    /// `execute_order` with the order window checked against `now`
    pub async fn execute_order_at(&self, request: OrderRequest, now: DateTime<Utc>) -> Result<OrderOutcome> {
        if let Some(cutoff) = self.order_cutoff {
            if !is_market_open(now) {
                return Err(TradingError::MarketClosed("orders are accepted 09:15-15:30 IST on weekdays".to_string()));
            }
            if is_past_square_off(now, cutoff) {
                return Err(TradingError::MarketClosed(format!(
                    "intraday orders are not accepted from {} IST",
                    cutoff.format("%H:%M")
                )));
            }
        }

        let order = OrderValidator::validate_order(&request)?;
        let symbol = order.symbol.clone();
        let order_id = new_order_id();

        let mut account = self.account.write().await;
        let held = account
            .positions
            .get(&symbol)
            .map(|p| (p.position_type, p.quantity, p.avg_price, p.margin_blocked));

        let mut closed_trade = None;
        match held {
            None => {
                let margin = account.margin_for(order.quantity, order.price);
                account.check_margin(&symbol, margin, 0.0)?;
                account.positions.open(new_position(&order, &order_id, margin))?;
            }
            Some((position_type, _, _, _)) if position_type == order.side.opens() => {
                let margin = account.margin_for(order.quantity, order.price);
                account.check_margin(&symbol, margin, 0.0)?;
                account.positions.average_in(
                    &symbol,
                    order.quantity,
                    order.price,
                    margin,
                    order.stop_loss,
                    order.target,
                )?;
            }
            Some((position_type, quantity, avg_price, margin_blocked)) => {
                let remainder = order.quantity.saturating_sub(quantity);
                if remainder > 0 {
                    // closing first frees the margin and books the pnl
                    let freed = margin_blocked + position_type.unit_pnl(avg_price, order.price) * quantity as f64;
                    let margin = account.margin_for(remainder, order.price);
                    account.check_margin(&symbol, margin, freed)?;
                }

                let reduction =
                    account
                        .positions
                        .reduce(&symbol, order.quantity, order.price, ExitReason::OppositeOrder)?;
                closed_trade = Some(account.book_reduction(reduction));

                if remainder > 0 {
                    let reversed = OrderRequest {
                        quantity: remainder,
                        ..order.clone()
                    };
                    let margin = account.margin_for(remainder, order.price);
                    account.positions.open(new_position(&reversed, &order_id, margin))?;
                    info!("📝 [PAPER] Reversed {} into {} x {}", symbol, order.side.opens().as_str(), remainder);
                }
            }
        }

        account.used_margin = account.positions.total_margin();
        let realized = closed_trade.as_ref().map(|t| t.pnl).unwrap_or(0.0);
        account.record_fill(&order_id, &symbol, order.side, order.quantity, order.price, realized);

        info!(
            "📝 [PAPER] {} {} x {} @ {:.2} filled ({})",
            order.side.as_str(),
            symbol,
            order.quantity,
            order.price,
            order_id
        );

        let fill = account.fills.last().cloned().ok_or_else(|| {
            TradingError::InternalError("fill was not recorded".to_string())
        })?;
        Ok(OrderOutcome {
            order_id,
            fill,
            closed_trade,
            position: account.positions.get(&symbol).cloned(),
        })
    }

    /// Mark a position to `price`
    pub async fn update_price(&self, symbol: &str, price: f64) -> Result<Position> {
        let symbol = sanitize_symbol(symbol)?;
        check_price(price)?;
        let mut account = self.account.write().await;
        let position = account.positions.mark(&symbol, price)?.clone();
        Ok(position)
    }

    /// Close the position if `price` crosses its stop loss or target
    pub async fn check_exit(&self, symbol: &str, price: f64) -> Result<Option<Trade>> {
        let symbol = sanitize_symbol(symbol)?;
        check_price(price)?;
        let mut account = self.account.write().await;
        let position = account
            .positions
            .get(&symbol)
            .ok_or_else(|| TradingError::PositionNotFound(symbol.clone()))?;

        let Some(reason) = exit_signal(position, price) else {
            return Ok(None);
        };

        warn!("📝 [PAPER] {}: {} @ {:.2}", reason, symbol, price);
        account.close(&symbol, price, reason).map(Some)
    }

    pub async fn close_position(&self, symbol: &str, price: f64, reason: ExitReason) -> Result<Trade> {
        let symbol = sanitize_symbol(symbol)?;
        let mut account = self.account.write().await;
        account.close(&symbol, price, reason)
    }

    /// Mark every position that has a price, then close any that hit SL/target
    pub async fn mark_to_market(&self, prices: &HashMap<String, f64>) -> Result<Vec<Trade>> {
        let mut account = self.account.write().await;
        let mut exits = Vec::new();

        for symbol in account.positions.symbols() {
            let Some(&price) = prices.get(&symbol) else {
                continue;
            };
            if let Err(e) = check_price(price) {
                warn!("📝 [PAPER] Ignoring quote for {}: {}", symbol, e);
                continue;
            }
            account.positions.mark(&symbol, price)?;

            let reason = account.positions.get(&symbol).and_then(|p| exit_signal(p, price));
            if let Some(reason) = reason {
                warn!("📝 [PAPER] {}: {} @ {:.2}", reason, symbol, price);
                exits.push(account.close(&symbol, price, reason)?);
            }
        }

        Ok(exits)
    }

    /// Close every position that has a price in `prices`
    pub async fn square_off_all(&self, prices: &HashMap<String, f64>) -> Result<Vec<Trade>> {
        let mut account = self.account.write().await;
        let mut trades = Vec::new();

        for symbol in account.positions.symbols() {
            match prices.get(&symbol) {
                Some(&price) if check_price(price).is_ok() => {
                    trades.push(account.close(&symbol, price, ExitReason::SquareOff)?)
                }
                Some(&price) => warn!("📝 [PAPER] Bad price {} for {} - left open at square-off", price, symbol),
                None => warn!("📝 [PAPER] No price for {} - left open at square-off", symbol),
            }
        }

        info!("📝 [PAPER] Square-off closed {} positions", trades.len());
        Ok(trades)
    }

    pub async fn positions(&self) -> Vec<Position> {
        let account = self.account.read().await;
        let mut positions: Vec<Position> = account.positions.iter().cloned().collect();
        positions.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        positions
    }

    pub async fn trade_history(&self) -> Vec<Trade> {
        self.account.read().await.trade_history.clone()
    }

    pub async fn summary(&self) -> AccountSummary {
        let account = self.account.read().await;
        let unrealized_pnl = account.positions.unrealized_pnl();
        let total_trades = account.trade_history.len();

        AccountSummary {
            initial_cash: account.initial_cash,
            cash: account.cash,
            used_margin: account.used_margin,
            available_margin: account.available_margin(),
            unrealized_pnl,
            portfolio_value: account.cash + unrealized_pnl,
            total_pnl: account.cash + unrealized_pnl - account.initial_cash,
            open_positions: account.positions.len(),
            total_trades,
            winning_trades: account.winning_trades,
            losing_trades: account.losing_trades,
            win_rate: if total_trades > 0 {
                account.winning_trades as f64 / total_trades as f64 * 100.0
            } else {
                0.0
            },
        }
    }

    /// Back to the initial cash with an empty book and history
    pub async fn reset(&self) {
        let mut account = self.account.write().await;
        *account = PaperAccount::new(account.initial_cash, account.leverage);
        warn!("📝 [PAPER] Account reset to {:.2}", account.cash);
    }
}

fn new_position(order: &OrderRequest, order_id: &str, margin: f64) -> Position {
    Position {
        symbol: order.symbol.clone(),
        position_type: order.side.opens(),
        quantity: order.quantity,
        avg_price: order.price,
        current_price: order.price,
        pnl: 0.0,
        pnl_pct: 0.0,
        stop_loss: order.stop_loss.unwrap_or(0.0),
        target: order.target.unwrap_or(0.0),
        margin_blocked: margin,
        order_id: order_id.to_string(),
        entry_time: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[tokio::test]
    async fn test_open_and_close_conserves_cash() {
        let broker = PaperTradingBroker::new(100_000.0, 5.0);

        let outcome = broker
            .execute_order(OrderRequest::new("reliance", Side::Buy, 10, 2900.0))
            .await
            .unwrap();
        assert!(outcome.order_id.starts_with("PAPER_"));
        assert_eq!(outcome.position.as_ref().unwrap().position_type, PositionType::Long);

        let summary = broker.summary().await;
        assert!(approx(summary.used_margin, 5800.0));
        assert!(approx(summary.available_margin, 94_200.0));

        let trade = broker.close_position("RELIANCE", 2950.0, ExitReason::Manual).await.unwrap();
        assert!(approx(trade.pnl, 500.0));

        let account = broker.account().await;
        assert!(approx(account.cash, 100_000.0 + trade.pnl));
        assert_eq!(account.used_margin, 0.0);
        assert!(account.positions.is_empty());
        assert_eq!(account.fills.len(), 2);
    }

    #[tokio::test]
    async fn test_insufficient_margin_is_rejected() {
        let broker = PaperTradingBroker::new(10_000.0, 5.0);

        // needs 60_000 / 5 = 12_000
        let err = broker
            .execute_order(OrderRequest::new("TCS", Side::Sell, 15, 4000.0))
            .await
            .unwrap_err();
        assert!(matches!(err, TradingError::InsufficientMargin(_)));
        assert!(broker.positions().await.is_empty());
        assert!(broker.account().await.fills.is_empty());
    }

    #[tokio::test]
    async fn test_opposite_order_partial_close_and_reverse() {
        let broker = PaperTradingBroker::new(100_000.0, 5.0);
        broker.execute_order(OrderRequest::new("SBIN", Side::Buy, 100, 800.0)).await.unwrap();

        let partial = broker.execute_order(OrderRequest::new("SBIN", Side::Sell, 40, 810.0)).await.unwrap();
        assert!(approx(partial.closed_trade.unwrap().pnl, 400.0));
        let position = partial.position.unwrap();
        assert_eq!(position.quantity, 60);
        assert!(approx(position.margin_blocked, 9600.0));

        let reversed = broker.execute_order(OrderRequest::new("SBIN", Side::Sell, 80, 790.0)).await.unwrap();
        assert!(approx(reversed.closed_trade.unwrap().pnl, -600.0));
        let position = reversed.position.unwrap();
        assert_eq!(position.position_type, PositionType::Short);
        assert_eq!(position.quantity, 20);
        assert!(approx(position.avg_price, 790.0));

        let account = broker.account().await;
        assert!(approx(account.cash, 100_000.0 + 400.0 - 600.0));
        assert!(approx(account.used_margin, 20.0 * 790.0 / 5.0));
        assert_eq!(account.winning_trades, 1);
        assert_eq!(account.losing_trades, 1);
    }

    #[tokio::test]
    async fn test_same_direction_averages_in() {
        let broker = PaperTradingBroker::new(100_000.0, 5.0);
        broker.execute_order(OrderRequest::new("INFY", Side::Buy, 10, 1500.0)).await.unwrap();
        let outcome = broker
            .execute_order(OrderRequest::new("INFY", Side::Buy, 10, 1600.0).with_stop_loss(1450.0))
            .await
            .unwrap();

        let position = outcome.position.unwrap();
        assert_eq!(position.quantity, 20);
        assert!(approx(position.avg_price, 1550.0));
        assert_eq!(position.stop_loss, 1450.0);
        assert!(outcome.closed_trade.is_none());
        assert!(approx(broker.summary().await.used_margin, 6200.0));
    }

    #[tokio::test]
    async fn test_stop_loss_and_target_exits() {
        let broker = PaperTradingBroker::new(100_000.0, 5.0);
        broker
            .execute_order(OrderRequest::new("ITC", Side::Buy, 100, 430.0).with_stop_loss(425.0).with_target(440.0))
            .await
            .unwrap();
        broker
            .execute_order(OrderRequest::new("WIPRO", Side::Sell, 50, 300.0).with_stop_loss(306.0))
            .await
            .unwrap();

        let position = broker.update_price("ITC", 432.0).await.unwrap();
        assert!(approx(position.pnl, 200.0));
        assert!(broker.check_exit("ITC", 432.0).await.unwrap().is_none());

        let trade = broker.check_exit("ITC", 441.0).await.unwrap().unwrap();
        assert_eq!(trade.reason, ExitReason::Target);

        let exits = broker
            .mark_to_market(&HashMap::from([("WIPRO".to_string(), 307.0)]))
            .await
            .unwrap();
        assert_eq!(exits.len(), 1);
        assert_eq!(exits[0].reason, ExitReason::StopLoss);
        assert!(approx(exits[0].pnl, -350.0));
        assert!(broker.positions().await.is_empty());
    }

    #[tokio::test]
    async fn test_square_off_skips_symbols_without_price() {
        let broker = PaperTradingBroker::new(100_000.0, 5.0);
        broker.execute_order(OrderRequest::new("ITC", Side::Buy, 10, 430.0)).await.unwrap();
        broker.execute_order(OrderRequest::new("TCS", Side::Sell, 2, 4000.0)).await.unwrap();

        let trades = broker
            .square_off_all(&HashMap::from([("TCS".to_string(), 3990.0)]))
            .await
            .unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].reason, ExitReason::SquareOff);

        let left = broker.positions().await;
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].symbol, "ITC");
    }

    #[tokio::test]
    async fn test_non_finite_exit_prices_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paper_trading.json");
        let broker = PaperTradingBroker::new(100_000.0, 5.0);
        broker.execute_order(OrderRequest::new("SBIN", Side::Buy, 10, 800.0)).await.unwrap();

        for bad in [f64::NAN, f64::INFINITY, 0.0, -5.0] {
            assert!(matches!(
                broker.close_position("SBIN", bad, ExitReason::Manual).await,
                Err(TradingError::InvalidParameter(_))
            ));
            assert!(broker.update_price("SBIN", bad).await.is_err());
            assert!(broker.check_exit("SBIN", bad).await.is_err());
        }

        let prices = HashMap::from([("SBIN".to_string(), f64::NAN)]);
        assert!(broker.mark_to_market(&prices).await.unwrap().is_empty());
        assert!(broker.square_off_all(&prices).await.unwrap().is_empty());

        let account = broker.account().await;
        assert_eq!(account.cash, 100_000.0);
        assert_eq!(account.positions.len(), 1);

        // state still round-trips through the file
        broker.save(&path).await.unwrap();
        let restored = PaperTradingBroker::load(&path, 1.0, 1.0).await.unwrap();
        assert_eq!(restored.account().await.cash, 100_000.0);
    }

    #[tokio::test]
    async fn test_reload_keeps_orders_written_by_another_process() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paper_trading.json");

        let runner = PaperTradingBroker::load(&path, 100_000.0, 5.0).await.unwrap();
        runner.save(&path).await.unwrap();

        let operator = PaperTradingBroker::load(&path, 100_000.0, 5.0).await.unwrap();
        operator.execute_order(OrderRequest::new("SBIN", Side::Buy, 10, 800.0)).await.unwrap();
        operator.save(&path).await.unwrap();

        runner.reload(&path).await.unwrap();
        runner
            .mark_to_market(&HashMap::from([("SBIN".to_string(), 805.0)]))
            .await
            .unwrap();
        runner.save(&path).await.unwrap();

        let saved = PaperTradingBroker::load(&path, 1.0, 1.0).await.unwrap();
        let positions = saved.positions().await;
        assert_eq!(positions.len(), 1);
        assert!(approx(positions[0].pnl, 50.0));
    }

    #[tokio::test]
    async fn test_order_window_is_enforced() {
        use chrono::TimeZone;
        use chrono_tz::Asia::Kolkata;

        let ist = |d: u32, h: u32, m: u32| Kolkata.with_ymd_and_hms(2026, 10, d, h, m, 0).unwrap().with_timezone(&Utc);
        let cutoff = NaiveTime::from_hms_opt(15, 25, 0).unwrap();
        let broker = PaperTradingBroker::new(100_000.0, 5.0).with_order_cutoff(cutoff);
        let order = || OrderRequest::new("ITC", Side::Buy, 10, 430.0);

        // Monday 19 Oct 2026
        assert!(broker.execute_order_at(order(), ist(19, 10, 0)).await.is_ok());
        for now in [ist(19, 15, 25), ist(19, 15, 40), ist(19, 9, 0), ist(17, 11, 0)] {
            assert!(matches!(
                broker.execute_order_at(order(), now).await,
                Err(TradingError::MarketClosed(_))
            ));
        }
        assert_eq!(broker.positions().await[0].quantity, 10);
    }

    #[tokio::test]
    async fn test_close_unknown_position() {
        let broker = PaperTradingBroker::new(100_000.0, 5.0);
        let err = broker.close_position("NOPE", 1.0, ExitReason::Manual).await.unwrap_err();
        assert!(matches!(err, TradingError::PositionNotFound(_)));
    }

    #[tokio::test]
    async fn test_save_load_and_reset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paper_trading.json");

        let broker = PaperTradingBroker::load(&path, 50_000.0, 4.0).await.unwrap();
        broker.execute_order(OrderRequest::new("HDFCBANK", Side::Buy, 5, 1700.0)).await.unwrap();
        broker.save(&path).await.unwrap();

        let restored = PaperTradingBroker::load(&path, 1.0, 1.0).await.unwrap();
        assert_eq!(restored.account().await, broker.account().await);

        restored.reset().await;
        let summary = restored.summary().await;
        assert_eq!(summary.cash, 50_000.0);
        assert_eq!(summary.open_positions, 0);
        assert_eq!(summary.total_trades, 0);
    }
}
