pub mod validator;

pub use validator::{check_price, sanitize_exchange, sanitize_symbol, OrderValidator};
