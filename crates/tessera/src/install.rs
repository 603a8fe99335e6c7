//! Process-wide site.
//!
//! Applications that serve one site can install it once at startup and reach
//! it from request handlers with [`site`], instead of threading an
//! `Arc<Site>` through every layer.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use tessera_render::{ConfigError, Site};
use tracing::info;

static SITE: OnceCell<Arc<Site>> = OnceCell::new();

/// Installs the process-wide site.
///
/// # Errors
///
/// Returns [`ConfigError::AlreadyInstalled`] if a site was installed before.
pub fn install(site: Arc<Site>) -> Result<(), ConfigError> {
    let units = site.registry().len();
    SITE.set(site).map_err(|_| ConfigError::AlreadyInstalled)?;
    info!(units, "site installed");
    Ok(())
}

/// The installed site, if any.
pub fn site() -> Option<Arc<Site>> {
    SITE.get().cloned()
}

/// Whether a site has been installed.
pub fn is_installed() -> bool {
    SITE.get().is_some()
}
