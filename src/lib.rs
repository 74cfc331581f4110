pub mod types;
pub mod error;
pub mod config;
pub mod broker;
pub mod data;
pub mod orders;
pub mod positions;
pub mod utils;
pub mod watchlist;

pub use types::*;
pub use error::{Result, TradingError};
