pub mod manager;

pub use manager::{exit_signal, PositionBook, Reduction};
