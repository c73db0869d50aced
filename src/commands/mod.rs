//! CLI command handlers.

mod cookies;
mod heartbeat;
mod serve;
mod status;

pub use cookies::{
    run_cookies_clear_command, run_cookies_list_command, run_cookies_remove_command,
    run_cookies_set_command,
};
pub use heartbeat::run_heartbeat_command;
pub use serve::run_serve_command;
pub use status::run_status_command;

use std::path::Path;

use anyhow::{Result, anyhow};
use cookie_relay::{CookieStore, StoreConfig};

/// Loads the store configuration from the environment, applying a CLI path override.
pub(crate) fn load_store_config(store_path: Option<&Path>) -> Result<StoreConfig> {
    let config = StoreConfig::from_env()?;
    Ok(match store_path {
        Some(path) => config.with_file_path(path),
        None => config,
    })
}

/// Builds the cookie store selected by `config`.
pub(crate) fn open_store(config: &StoreConfig) -> Result<CookieStore> {
    CookieStore::from_config(config)
        .map_err(|error| anyhow!("Failed to initialise cookie store: {error}"))
}
