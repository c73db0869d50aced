//! Serve command handler: runs the management API until Ctrl-C.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use cookie_relay::{
    AppState, BackendKind, DEFAULT_QUEUE_CAPACITY, IdentityResolver, InterceptionBridge,
    SingleUser, StoreConfig, SupabaseIdentity, build_store_http_client, serve,
};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::cli::ServeArgs;

use super::{load_store_config, open_store};

/// Longest wait for queued captures to persist after shutdown.
const BRIDGE_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

pub async fn run_serve_command(args: &ServeArgs, store_path: Option<&Path>) -> Result<()> {
    let config = load_store_config(store_path)?;
    let store = open_store(&config)?;
    let identity = build_identity(args.multi_user, &config)?;

    let (bridge, worker) = InterceptionBridge::spawn(store.clone(), DEFAULT_QUEUE_CAPACITY);
    let state = AppState::new(store.clone(), identity, bridge);

    let address = format!("{}:{}", args.host, args.port);
    let listener = TcpListener::bind(address.as_str())
        .await
        .with_context(|| format!("Cannot bind management API to {address}"))?;
    info!(
        address = %address,
        backend = %store.backend_kind(),
        multi_user = args.multi_user,
        "cookie-relay starting"
    );

    serve(listener, state, shutdown_signal()).await?;

    info!("server stopped; draining captured cookies");
    match tokio::time::timeout(BRIDGE_DRAIN_TIMEOUT, worker).await {
        Ok(Ok(())) => {}
        Ok(Err(error)) => warn!(error = %error, "cookie persistence worker failed"),
        Err(_) => warn!(
            timeout_secs = BRIDGE_DRAIN_TIMEOUT.as_secs(),
            "timed out waiting for captured cookies to persist"
        ),
    }
    Ok(())
}

fn build_identity(multi_user: bool, config: &StoreConfig) -> Result<Arc<dyn IdentityResolver>> {
    if !multi_user {
        return Ok(Arc::new(SingleUser));
    }

    let Some(supabase) = &config.supabase else {
        bail!("--multi-user requires SUPABASE_URL and SUPABASE_SERVICE_ROLE_KEY");
    };
    let client = build_store_http_client(BackendKind::Supabase, config.timeouts)
        .map_err(|error| anyhow!("Failed to build identity client: {error}"))?;
    info!("multi-user mode: resolving users through Supabase auth");
    Ok(Arc::new(SupabaseIdentity::new(client, supabase)))
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(error = %error, "cannot listen for Ctrl-C; serving until killed");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
