//! Install and activate.
//!
//! Install pre-warms the configured asset lists into their partitions and
//! requests immediate activation. Activate retires every partition from an
//! older version, takes over open clients, and broadcasts the transition.

use wayfare_client::resolve;
use wayfare_core::Error;

use crate::gateway::{AssetRequest, ClientEvent, Gateway, strategies};

/// Pre-warm the critical pages, static assets, and fonts, then request
/// skip-waiting so the new version goes live without waiting for the next
/// navigation.
///
/// Individual pre-warm failures are logged and skipped; install itself
/// always completes. Returns the number of entries warmed.
pub async fn install(gateway: &Gateway) -> u64 {
    let config = gateway.config();
    let partitions = gateway.partitions();

    let mut warmed = 0;
    warmed += prewarm(gateway, &partitions.static_assets, &config.critical_assets).await;
    warmed += prewarm(gateway, &partitions.static_assets, &config.static_assets).await;
    warmed += prewarm(gateway, &partitions.fonts, &config.font_assets).await;

    gateway.request_skip_waiting();
    tracing::info!(warmed, version = gateway.version(), "install complete");
    warmed
}

async fn prewarm(gateway: &Gateway, partition: &str, paths: &[String]) -> u64 {
    let mut warmed = 0;
    for path in paths {
        let target = match resolve(gateway.upstream(), path) {
            Ok(url) => url,
            Err(err) => {
                tracing::warn!(path = %path, error = %err, "skipping unresolvable pre-warm path");
                continue;
            }
        };
        let request = AssetRequest::get(target, None);
        match gateway.network().fetch(&request.url).await {
            Ok(fetched) if fetched.is_success() => {
                strategies::store(gateway, partition, &request, &fetched, None).await;
                warmed += 1;
            }
            Ok(fetched) => {
                tracing::warn!(path = %path, status = fetched.status, "pre-warm fetch returned non-success");
            }
            Err(err) => {
                tracing::warn!(path = %path, error = %err, "pre-warm fetch failed");
            }
        }
    }
    warmed
}

/// Retire stale-versioned partitions, take control of open clients, and
/// broadcast the activation. Returns the number of retired entries.
pub async fn activate(gateway: &Gateway) -> Result<u64, Error> {
    let deleted = gateway.cache().purge_stale_partitions(gateway.version()).await?;

    gateway.set_controlling();
    gateway.broadcast(ClientEvent::Activated { version: gateway.version().to_string() });

    tracing::info!(version = gateway.version(), stale_entries_deleted = deleted, "activated");
    Ok(deleted)
}
