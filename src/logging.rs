//! Logging setup for the command line tool.
//!
//! Diagnostics go to stderr through a global tracing subscriber so that the
//! results printed on stdout stay clean. `RUST_LOG` picks the level.

use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

/// Failed to install the global tracing subscriber
#[derive(Debug, thiserror::Error)]
#[error("Failed to install global tracing subscriber: {0}")]
pub struct LoggingError(#[from] tracing::subscriber::SetGlobalDefaultError);

/// Initialize tracing on stderr, defaulting to `info`
pub fn init() -> Result<(), LoggingError> {
    let subscriber = Registry::default()
        .with(build_env_filter())
        .with(fmt::layer().with_writer(std::io::stderr));
    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

fn build_env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}
