pub mod fs;
pub mod logging;
pub mod time;

pub use fs::{read_json, write_bytes_atomic, write_json_atomic};
pub use logging::init_logging;
pub use time::*;
