//! Log output for tessera applications.
//!
//! The library crates emit [`tracing`] events under the `tessera_render` and
//! `tessera_dispatch` targets. [`init`] installs a formatting subscriber for
//! them; applications with their own subscriber skip it.

use thiserror::Error;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset and none is given.
pub const DEFAULT_FILTER: &str = "tessera_render=info,tessera_dispatch=info";

/// Error raised while installing the log subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter '{filter}': {source}")]
    Filter {
        filter: String,
        source: tracing_subscriber::filter::ParseError,
    },

    #[error("a global log subscriber is already installed: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
}

/// Builds the filter: `RUST_LOG` when set, else `filter`, else
/// [`DEFAULT_FILTER`].
pub fn env_filter(filter: Option<&str>) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let directives = filter.unwrap_or(DEFAULT_FILTER);
    EnvFilter::try_new(directives).map_err(|source| LoggingError::Filter {
        filter: directives.to_string(),
        source,
    })
}

/// Installs a global `fmt` subscriber writing to stderr.
pub fn init(filter: Option<&str>) -> Result<(), LoggingError> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(filter)?)
        .with_writer(std::io::stderr)
        .with_target(true)
        .finish()
        .try_init()?;
    Ok(())
}
