pub mod angel_one;
pub mod fetcher;
pub mod paper_trading;
pub mod scrip_master;
pub mod session;
pub mod token_map;

pub use angel_one::AngelOneClient;
pub use fetcher::{BuildReport, HttpScripSource, ScripSource, TokenMapBuilder};
pub use paper_trading::{AccountSummary, OrderOutcome, PaperAccount, PaperTradingBroker};
pub use scrip_master::ScripFormat;
pub use session::{SessionManager, SessionTokens};
pub use token_map::TokenMap;
