/// Subscriber setup shared by every binary
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins over `default_level`; `json` switches to structured lines
pub fn init_logging(default_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    let result = if json { builder.json().try_init() } else { builder.try_init() };
    if let Err(e) = result {
        eprintln!("Logging already initialised: {}", e);
    }
}
