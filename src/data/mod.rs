pub mod market_watch;

pub use market_watch::{MarketWatch, QuoteSource, RefreshStats};
