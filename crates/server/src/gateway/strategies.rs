//! The per-category routing strategies.
//!
//! Every strategy is infallible from the caller's point of view: internal
//! cache errors degrade to a miss, and a failed fetch with nothing cached
//! degrades to the offline fallback. A response is only written into a
//! partition when its transport status is 2xx.

use tokio::task::JoinHandle;

use wayfare_client::FetchResponse;
use wayfare_core::Error;
use wayfare_core::cache::Entry;

use super::{AssetRequest, Gateway, ServedOutcome};

/// Cache-first: serve the cached copy, otherwise fetch and store.
pub(crate) async fn cache_first(gateway: &Gateway, request: &AssetRequest, partition: &str) -> ServedOutcome {
    if let Some(entry) = lookup(gateway, partition, request).await {
        return ServedOutcome::cached(entry);
    }
    fetch_and_store(gateway, request, partition, None).await
}

/// Cache-first with a bounded partition: identical to cache-first except
/// the oldest entries are evicted (FIFO by insertion) to keep the
/// partition at its cap when a miss stores a new entry.
pub(crate) async fn cache_first_bounded(
    gateway: &Gateway, request: &AssetRequest, partition: &str, cap: u64,
) -> ServedOutcome {
    if let Some(entry) = lookup(gateway, partition, request).await {
        return ServedOutcome::cached(entry);
    }
    fetch_and_store(gateway, request, partition, Some(cap)).await
}

/// Cache-first with background refresh: serve the cached copy immediately
/// and refetch behind it, overwriting the cache for the next request. On
/// a miss, wait on the network like plain cache-first.
pub(crate) async fn cache_first_with_refresh(
    gateway: &Gateway, request: &AssetRequest, partition: &str,
) -> ServedOutcome {
    if let Some(entry) = lookup(gateway, partition, request).await {
        let handle = spawn_refresh(gateway, request, partition);
        return ServedOutcome::cached(entry).with_refresh(handle);
    }
    fetch_and_store(gateway, request, partition, None).await
}

// Stale-while-revalidate and cache-first-with-refresh coincide: both serve
// the cached copy immediately and revalidate behind it. They differ only
// in which partition the caller points them at.
pub(crate) use self::cache_first_with_refresh as stale_while_revalidate;

/// Network-first: always try the network; fall back to the last cached
/// copy on transport failure, and to the offline response when there is
/// none.
pub(crate) async fn network_first(gateway: &Gateway, request: &AssetRequest, partition: &str) -> ServedOutcome {
    match gateway.network().fetch(&request.url).await {
        Ok(fetched) => {
            if fetched.is_success() {
                store(gateway, partition, request, &fetched, None).await;
            }
            ServedOutcome::network(&fetched)
        }
        Err(err) => {
            tracing::debug!(url = %request.url, error = %err, "network-first fetch failed; trying cache");
            match cached(gateway, partition, request).await {
                Ok(entry) => ServedOutcome::cached(entry),
                Err(miss) => {
                    tracing::debug!(url = %request.url, error = %miss, "no cached fallback");
                    ServedOutcome::offline(request)
                }
            }
        }
    }
}

/// Write a successful response into a partition, making room first when
/// the partition is bounded. Write failures (including quota) are logged
/// and swallowed; serving the response matters more than caching it.
pub(crate) async fn store(
    gateway: &Gateway, partition: &str, request: &AssetRequest, fetched: &FetchResponse, cap: Option<u64>,
) {
    if let Some(cap) = cap
        && let Err(err) = gateway.cache().make_room(partition, cap).await
    {
        tracing::warn!(partition, error = %err, "eviction failed before insert");
    }

    let entry = Entry::new(
        partition,
        request.url.as_str(),
        fetched.status,
        fetched.content_type.clone(),
        fetched.headers_json(),
        fetched.body.to_vec(),
    );
    if let Err(err) = gateway.cache().put_entry(&entry).await {
        tracing::warn!(partition, url = %request.url, error = %err, "failed to write cache entry");
    }
}

async fn fetch_and_store(
    gateway: &Gateway, request: &AssetRequest, partition: &str, cap: Option<u64>,
) -> ServedOutcome {
    match gateway.network().fetch(&request.url).await {
        Ok(fetched) => {
            if fetched.is_success() {
                store(gateway, partition, request, &fetched, cap).await;
            }
            ServedOutcome::network(&fetched)
        }
        Err(err) => {
            tracing::debug!(url = %request.url, error = %err, "fetch failed with nothing cached");
            ServedOutcome::offline(request)
        }
    }
}

async fn lookup(gateway: &Gateway, partition: &str, request: &AssetRequest) -> Option<Entry> {
    match gateway.cache().get_entry(partition, request.url.as_str()).await {
        Ok(found) => found,
        Err(err) => {
            tracing::warn!(partition, error = %err, "cache read failed; treating as miss");
            None
        }
    }
}

async fn cached(gateway: &Gateway, partition: &str, request: &AssetRequest) -> Result<Entry, Error> {
    gateway
        .cache()
        .get_entry(partition, request.url.as_str())
        .await?
        .ok_or_else(|| Error::CacheMiss(format!("{partition} {}", request.url)))
}

fn spawn_refresh(gateway: &Gateway, request: &AssetRequest, partition: &str) -> JoinHandle<()> {
    let gateway = gateway.clone();
    let request = request.clone();
    let partition = partition.to_string();
    tokio::spawn(async move {
        match gateway.network().fetch(&request.url).await {
            Ok(fetched) if fetched.is_success() => store(&gateway, &partition, &request, &fetched, None).await,
            Ok(fetched) => {
                tracing::debug!(url = %request.url, status = fetched.status, "refresh returned non-success; keeping stale copy");
            }
            Err(err) => {
                tracing::debug!(url = %request.url, error = %err, "refresh failed; keeping stale copy");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::Source;
    use crate::test_support::{get, test_gateway};

    #[tokio::test]
    async fn test_cache_first_stores_on_miss_then_hits() {
        let (gateway, network) = test_gateway().await;
        let partition = gateway.partitions().static_assets.clone();
        let request = get("http://origin.test/assets/css/main.css", None);

        let first = cache_first(&gateway, &request, &partition).await;
        assert_eq!(first.response.source, Source::Network);

        let second = cache_first(&gateway, &request, &partition).await;
        assert_eq!(second.response.source, Source::Cache);
        assert_eq!(second.response.body, first.response.body);
        assert_eq!(network.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_cache_first_does_not_store_non_success() {
        let (gateway, network) = test_gateway().await;
        let partition = gateway.partitions().static_assets.clone();
        let request = get("http://origin.test/assets/js/missing.js", None);
        network.set_status(404);

        let first = cache_first(&gateway, &request, &partition).await;
        assert_eq!(first.response.status, 404);
        assert_eq!(first.response.source, Source::Network);

        // Nothing was cached, so the next request fetches again.
        cache_first(&gateway, &request, &partition).await;
        assert_eq!(network.calls().len(), 2);
        assert_eq!(gateway.cache().count_entries(&partition).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_cache_first_offline_fallback() {
        let (gateway, network) = test_gateway().await;
        let partition = gateway.partitions().static_assets.clone();
        let request = get("http://origin.test/assets/js/app.js", None);
        network.set_fail(true);

        let outcome = cache_first(&gateway, &request, &partition).await;
        assert_eq!(outcome.response.source, Source::Offline);
        assert_eq!(outcome.response.status, 503);
    }

    #[tokio::test]
    async fn test_refresh_overwrites_for_next_request() {
        let (gateway, network) = test_gateway().await;
        let partition = gateway.partitions().static_assets.clone();
        let request = get("http://origin.test/", Some("text/html"));
        network.set_body("http://origin.test/", "v1");

        let first = cache_first_with_refresh(&gateway, &request, &partition).await;
        assert_eq!(first.response.source, Source::Network);
        assert_eq!(first.response.body, bytes::Bytes::from("v1"));

        // The origin changed; the cached copy is served while the refresh
        // replaces it in the background.
        network.set_body("http://origin.test/", "v2");
        let second = cache_first_with_refresh(&gateway, &request, &partition).await;
        assert_eq!(second.response.source, Source::Cache);
        assert_eq!(second.response.body, bytes::Bytes::from("v1"));

        second.refresh.unwrap().await.unwrap();

        let third = cache_first_with_refresh(&gateway, &request, &partition).await;
        assert_eq!(third.response.source, Source::Cache);
        assert_eq!(third.response.body, bytes::Bytes::from("v2"));
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_stale_copy() {
        let (gateway, network) = test_gateway().await;
        let partition = gateway.partitions().static_assets.clone();
        let request = get("http://origin.test/", Some("text/html"));

        cache_first_with_refresh(&gateway, &request, &partition).await;

        network.set_fail(true);
        let outcome = cache_first_with_refresh(&gateway, &request, &partition).await;
        assert_eq!(outcome.response.source, Source::Cache);
        outcome.refresh.unwrap().await.unwrap();

        // Still served from cache afterwards.
        network.set_fail(false);
        let after = cache_first_with_refresh(&gateway, &request, &partition).await;
        assert_eq!(after.response.source, Source::Cache);
    }

    #[tokio::test]
    async fn test_bounded_partition_keeps_newest_entries() {
        let (gateway, _network) = test_gateway().await;
        let partition = gateway.partitions().images.clone();
        let cap = gateway.config().image_cache_cap as u64;
        assert_eq!(cap, 100);

        for i in 0..105 {
            let request = get(&format!("http://origin.test/img/{i}.png"), None);
            cache_first_bounded(&gateway, &request, &partition, cap).await;
        }

        assert_eq!(gateway.cache().count_entries(&partition).await.unwrap(), 100);
        let urls = gateway.cache().urls_in_partition(&partition).await.unwrap();
        assert_eq!(urls.first().unwrap(), "http://origin.test/img/5.png");
        assert_eq!(urls.last().unwrap(), "http://origin.test/img/104.png");
    }

    #[tokio::test]
    async fn test_bounded_partition_hit_does_not_evict() {
        let (gateway, network) = test_gateway().await;
        let partition = gateway.partitions().images.clone();

        for i in 0..3 {
            let request = get(&format!("http://origin.test/img/{i}.png"), None);
            cache_first_bounded(&gateway, &request, &partition, 3).await;
        }

        // A hit on a full partition must not trigger eviction.
        let request = get("http://origin.test/img/0.png", None);
        let outcome = cache_first_bounded(&gateway, &request, &partition, 3).await;
        assert_eq!(outcome.response.source, Source::Cache);
        assert_eq!(gateway.cache().count_entries(&partition).await.unwrap(), 3);
        assert_eq!(network.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_network_first_serves_cache_on_failure() {
        let (gateway, network) = test_gateway().await;
        let partition = gateway.partitions().api.clone();
        let request = get("http://origin.test/api/cars", None);
        network.set_body("http://origin.test/api/cars", "[\"suv\"]");

        let first = network_first(&gateway, &request, &partition).await;
        assert_eq!(first.response.source, Source::Network);

        network.set_fail(true);
        let second = network_first(&gateway, &request, &partition).await;
        assert_eq!(second.response.source, Source::Cache);
        assert_eq!(second.response.body, bytes::Bytes::from("[\"suv\"]"));
    }

    #[tokio::test]
    async fn test_network_first_failure_without_cache_propagates() {
        let (gateway, network) = test_gateway().await;
        let partition = gateway.partitions().api.clone();
        let request = get("http://origin.test/api/testimonials", None);
        network.set_fail(true);

        let outcome = network_first(&gateway, &request, &partition).await;
        assert_eq!(outcome.response.source, Source::Offline);
        assert_eq!(outcome.response.status, 503);
    }

    #[tokio::test]
    async fn test_network_first_always_asks_network() {
        let (gateway, network) = test_gateway().await;
        let partition = gateway.partitions().api.clone();
        let request = get("http://origin.test/api/cars", None);

        network_first(&gateway, &request, &partition).await;
        network_first(&gateway, &request, &partition).await;
        assert_eq!(network.calls().len(), 2);
    }
}
