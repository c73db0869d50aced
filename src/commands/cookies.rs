//! Cookies command handlers: list, set, remove, and clear a stored jar.

use std::path::Path;

use anyhow::{Result, bail};
use cookie_relay::{CookieRecord, CookieStore, UserId, parse_expiry};
use tracing::{info, warn};

use crate::cli::{RemoveCookieArgs, SetCookieArgs, UserArgs};

use super::{load_store_config, open_store};

pub async fn run_cookies_list_command(args: &UserArgs, store_path: Option<&Path>) -> Result<()> {
    let (store, user) = open_for_user(args, store_path)?;
    let jar = store.load(&user).await;
    println!("{}", serde_json::to_string_pretty(&jar)?);
    info!(
        user = %user,
        cookies = jar.len(),
        domains = jar.domain_count(),
        "Listed stored cookies"
    );
    Ok(())
}

pub async fn run_cookies_set_command(
    args: &SetCookieArgs,
    store_path: Option<&Path>,
) -> Result<()> {
    if args.domain.trim().is_empty() || args.name.trim().is_empty() {
        bail!("domain and name are required");
    }
    let (store, user) = open_for_user(&args.user, store_path)?;

    let mut record = CookieRecord::new(&args.value).with_path(&args.path);
    if let Some(expires) = args.expires.as_deref().filter(|value| !value.trim().is_empty()) {
        if parse_expiry(expires).is_none() {
            warn!(expires, "Expiry is not a recognised date; the cookie will never be pruned");
        }
        record.expires = Some(expires.to_string());
    }
    record.http_only = args.http_only.then_some(true);
    record.secure = args.secure.then_some(true);
    record.same_site.clone_from(&args.same_site);

    store
        .upsert_record(&user, &args.domain, &args.name, record)
        .await;
    info!(user = %user, domain = %args.domain, name = %args.name, "Stored cookie");
    Ok(())
}

pub async fn run_cookies_remove_command(
    args: &RemoveCookieArgs,
    store_path: Option<&Path>,
) -> Result<()> {
    let (store, user) = open_for_user(&args.user, store_path)?;
    store.remove_record(&user, &args.domain, &args.name).await;
    info!(user = %user, domain = %args.domain, name = %args.name, "Removed cookie");
    Ok(())
}

pub async fn run_cookies_clear_command(args: &UserArgs, store_path: Option<&Path>) -> Result<()> {
    let (store, user) = open_for_user(args, store_path)?;
    store.clear(&user).await;
    info!(user = %user, "Cleared cookie jar");
    Ok(())
}

fn open_for_user(args: &UserArgs, store_path: Option<&Path>) -> Result<(CookieStore, UserId)> {
    let user = args.user.trim();
    if user.is_empty() {
        bail!("--user must not be empty");
    }
    let config = load_store_config(store_path)?;
    Ok((open_store(&config)?, UserId::new(user)))
}
