//! Status command handler: show the active storage backend.

use std::path::Path;

use anyhow::Result;
use cookie_relay::BackendKind;

use super::{load_store_config, open_store};

pub fn run_status_command(store_path: Option<&Path>) -> Result<()> {
    let config = load_store_config(store_path)?;
    let store = open_store(&config)?;
    let status = store.status();

    println!("backend = {}", store.backend_kind());
    if store.backend_kind() == BackendKind::File {
        println!("store_path = {}", config.file_path.display());
        println!("encrypted = {}", config.store_key.is_some());
    }
    println!("appwrite = {}", status.appwrite);
    println!("supabase = {}", status.supabase);
    Ok(())
}
