//! stderr logging for the CLI.
//!
//! The core logs through the `log` facade; `tracing-subscriber`'s `init`
//! bridges those records into the fmt subscriber.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// `verbose` shows debug output; otherwise only warnings and errors.
fn log_level(verbose: bool) -> Level {
    if verbose {
        Level::DEBUG
    } else {
        Level::WARN
    }
}

/// `RUST_LOG` takes precedence over `--verbose` when set.
fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level(verbose).as_str().to_ascii_lowercase()))
}

pub fn init_logging(verbose: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbose))
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();
}
