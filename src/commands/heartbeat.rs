//! Heartbeat command handler: periodic keep-alive pings.

use std::time::Duration;

use anyhow::{Result, anyhow, bail};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::cli::HeartbeatArgs;

const PING_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
struct HeartbeatReply {
    ok: bool,
    #[serde(default)]
    time: Option<i64>,
}

pub async fn run_heartbeat_command(args: &HeartbeatArgs) -> Result<()> {
    let endpoint = heartbeat_endpoint(&args.url)?;
    let client = Client::builder()
        .timeout(PING_TIMEOUT)
        .build()
        .map_err(|error| anyhow!("Failed to build HTTP client: {error}"))?;

    if args.once {
        return ping(&client, &endpoint).await;
    }

    info!(
        endpoint = %endpoint,
        interval_secs = args.interval_secs,
        "Heartbeat started"
    );
    let mut ticker = tokio::time::interval(Duration::from_secs(args.interval_secs));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(error) = ping(&client, &endpoint).await {
                    warn!(error = %error, "Heartbeat ping failed");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Heartbeat stopped");
                return Ok(());
            }
        }
    }
}

async fn ping(client: &Client, endpoint: &str) -> Result<()> {
    let response = client.get(endpoint).send().await?;
    let status = response.status();
    if !status.is_success() {
        bail!("Heartbeat returned HTTP {status}");
    }
    let reply: HeartbeatReply = response.json().await?;
    if !reply.ok {
        bail!("Heartbeat reply was not ok");
    }
    debug!(server_time = ?reply.time, "Heartbeat ok");
    Ok(())
}

fn heartbeat_endpoint(base: &str) -> Result<String> {
    let url = url::Url::parse(base.trim())
        .map_err(|error| anyhow!("Invalid heartbeat URL '{base}': {error}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("Heartbeat URL must use http or https: {base}");
    }
    Ok(format!("{}/api/heartbeat", url.as_str().trim_end_matches('/')))
}
