//! Tracing setup.

use quill_core::{QuillError, Result};
use tracing_subscriber::EnvFilter;

/// Builds the filter: `RUST_LOG` wins over the configured level.
fn filter(level: &str) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(level).map_err(|e| QuillError::config(format!("Invalid log level '{level}': {e}")))
}

/// Installs a global fmt subscriber writing to stderr.
///
/// # Errors
///
/// Fails on an unparsable level or if a global subscriber is already set.
pub fn init_tracing(level: &str) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(filter(level)?)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| QuillError::internal(format!("Failed to initialize tracing: {e}")))
}
