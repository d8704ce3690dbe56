//! Scheduled downstream liveness prober.
//!
//! On a fixed interval, probes every configured downstream health endpoint
//! concurrently and logs a summary. Probes keep connection pools and DNS
//! caches warm; a failed probe is logged and never escalated to the saga or
//! the cache layer. One endpoint failing cannot cancel its sibling probes:
//! each runs as its own task and the tick joins all of them.

use resilience::CancellationToken;
use std::time::Duration;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

/// One named downstream to probe
#[derive(Debug, Clone)]
pub struct ProbeTarget {
    pub name: String,
    pub base_url: String,
}

impl ProbeTarget {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
        }
    }
}

async fn probe_one(client: reqwest::Client, target: ProbeTarget) -> (String, bool) {
    let url = format!("{}/health", target.base_url);
    let healthy = match client.get(&url).send().await {
        Ok(response) => response.status().is_success(),
        Err(e) => {
            debug!(target = %target.name, error = %e, "probe request failed");
            false
        }
    };
    (target.name, healthy)
}

/// Probe all targets once, joining every probe before summarizing
pub async fn probe_all(client: &reqwest::Client, targets: &[ProbeTarget]) -> usize {
    let mut set = JoinSet::new();
    for target in targets {
        set.spawn(probe_one(client.clone(), target.clone()));
    }

    let mut healthy = 0;
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((name, true)) => {
                debug!(target = %name, "probe ok");
                healthy += 1;
            }
            Ok((name, false)) => warn!(target = %name, "probe failed"),
            Err(e) => warn!(error = %e, "probe task panicked"),
        }
    }

    info!(healthy, total = targets.len(), "downstream probe sweep complete");
    healthy
}

/// Spawn the periodic prober; cancel the token to stop it
pub fn spawn_prober(
    targets: Vec<ProbeTarget>,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_default();
        let mut ticker = tokio::time::interval(interval);
        // The first tick fires immediately; skip it so startup ordering of
        // downstreams does not produce a spurious warning burst.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("prober shutting down");
                    return;
                }
                _ = ticker.tick() => {
                    probe_all(&client, &targets).await;
                }
            }
        }
    })
}
