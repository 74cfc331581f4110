/// Operator CLI for the persisted paper trading account
/// Usage: cargo run --bin paper -- <command>
use std::collections::HashMap;

use clap::{Parser, Subcommand};

use tradedesk::broker::PaperTradingBroker;
use tradedesk::orders::check_price;
use tradedesk::config::load_config_or_default;
use tradedesk::utils::{init_logging, parse_clock_time};
use tradedesk::{ExitReason, OrderRequest, Side};

#[derive(Parser, Debug)]
#[command(name = "paper", about = "Paper trading account tool")]
struct Args {
    /// Config file (falls back to CONFIG_PATH, then config.toml)
    #[arg(long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Buy (opens or adds to a long, reduces a short)
    Buy(OrderArgs),
    /// Sell (opens or adds to a short, reduces a long)
    Sell(OrderArgs),
    /// Close a position at the given price
    Close { symbol: String, price: f64 },
    /// Close every open position; prices as SYMBOL=PRICE
    SquareOff { prices: Vec<String> },
    /// List open positions
    Positions,
    /// Account summary
    Summary,
    /// Wipe positions and history back to the initial cash
    Reset,
}

#[derive(clap::Args, Debug)]
struct OrderArgs {
    symbol: String,
    quantity: u32,
    price: f64,
    #[arg(long)]
    stop_loss: Option<f64>,
    #[arg(long)]
    target: Option<f64>,
}

impl OrderArgs {
    fn into_request(self, side: Side) -> OrderRequest {
        OrderRequest {
            symbol: self.symbol,
            side,
            quantity: self.quantity,
            price: self.price,
            stop_loss: self.stop_loss,
            target: self.target,
        }
    }
}

fn parse_prices(pairs: &[String]) -> anyhow::Result<HashMap<String, f64>> {
    pairs
        .iter()
        .map(|pair| {
            let (symbol, price) = pair
                .split_once('=')
                .ok_or_else(|| anyhow::anyhow!("expected SYMBOL=PRICE, got {}", pair))?;
            let price = price.trim().parse::<f64>()?;
            check_price(price)?;
            Ok((symbol.trim().to_uppercase(), price))
        })
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config_path = args
        .config
        .or_else(|| std::env::var("CONFIG_PATH").ok())
        .unwrap_or_else(|| "config.toml".to_string());
    let config = load_config_or_default(&config_path)?;
    init_logging(&config.log_level, config.log_json);

    let state_path = config.paper_state_path();
    let cutoff = parse_clock_time(&config.square_off_time)
        .ok_or_else(|| anyhow::anyhow!("bad square_off_time {}", config.square_off_time))?;
    let broker = PaperTradingBroker::load(&state_path, config.initial_cash, config.leverage)
        .await?
        .with_order_cutoff(cutoff);

    match args.command {
        Command::Buy(order) => {
            let outcome = broker.execute_order(order.into_request(Side::Buy)).await?;
            println!("{} filled: BUY {} x {} @ {:.2}", outcome.order_id, outcome.fill.symbol, outcome.fill.quantity, outcome.fill.price);
        }
        Command::Sell(order) => {
            let outcome = broker.execute_order(order.into_request(Side::Sell)).await?;
            println!("{} filled: SELL {} x {} @ {:.2}", outcome.order_id, outcome.fill.symbol, outcome.fill.quantity, outcome.fill.price);
        }
        Command::Close { symbol, price } => {
            let trade = broker.close_position(&symbol, price, ExitReason::Manual).await?;
            println!("Closed {} x {} @ {:.2}: pnl {:.2}", trade.symbol, trade.quantity, trade.exit_price, trade.pnl);
        }
        Command::SquareOff { prices } => {
            let trades = broker.square_off_all(&parse_prices(&prices)?).await?;
            println!("Squared off {} positions", trades.len());
        }
        Command::Positions => {
            let positions = broker.positions().await;
            if positions.is_empty() {
                println!("No open positions");
            }
            for p in positions {
                println!(
                    "{:<12} {:<5} {:>6} @ {:>10.2}  ltp {:>10.2}  pnl {:>10.2} ({:+.2}%)  sl {:.2} tgt {:.2}",
                    p.symbol,
                    p.position_type.as_str(),
                    p.quantity,
                    p.avg_price,
                    p.current_price,
                    p.pnl,
                    p.pnl_pct,
                    p.stop_loss,
                    p.target
                );
            }
        }
        Command::Summary => {
            println!("{}", serde_json::to_string_pretty(&broker.summary().await)?);
        }
        Command::Reset => {
            broker.reset().await;
            println!("Account reset");
        }
    }

    broker.save(&state_path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prices() {
        let prices = parse_prices(&["itc=431.5".to_string(), "TCS = 4010".to_string()]).unwrap();
        assert_eq!(prices.get("ITC"), Some(&431.5));
        assert_eq!(prices.get("TCS"), Some(&4010.0));
        assert!(parse_prices(&["ITC".to_string()]).is_err());
        assert!(parse_prices(&["ITC=abc".to_string()]).is_err());
        assert!(parse_prices(&["ITC=NaN".to_string()]).is_err());
        assert!(parse_prices(&["ITC=inf".to_string()]).is_err());
        assert!(parse_prices(&["ITC=0".to_string()]).is_err());
    }
}
