//! Periodic dynamic-partition sweep.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use wayfare_core::CacheDb;

/// Spawn the background sweeper: every `every`, trim `partition` down to
/// `max_entries` with the same FIFO-by-insertion rule the bounded
/// partitions use. Errors are logged and the sweeper keeps going.
pub fn spawn(cache: CacheDb, partition: String, max_entries: u64, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately; skip it so the first sweep
        // happens a full period after startup.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match cache.trim_to(&partition, max_entries).await {
                Ok(0) => {}
                Ok(trimmed) => {
                    tracing::info!(partition = %partition, trimmed, "sweep trimmed dynamic partition");
                }
                Err(err) => {
                    tracing::warn!(partition = %partition, error = %err, "sweep failed");
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfare_core::cache::Entry;

    #[tokio::test]
    async fn test_sweep_trims_to_cap() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let partition = "wayfare-dynamic-v2.0.0";
        for i in 0..10 {
            let entry = Entry::new(partition, &format!("http://origin.test/p/{i}"), 200, None, None, vec![i]);
            cache.put_entry(&entry).await.unwrap();
        }

        let sweeper = spawn(cache.clone(), partition.to_string(), 4, Duration::from_millis(20));

        // Give the sweeper a couple of periods to run.
        tokio::time::sleep(Duration::from_millis(200)).await;
        sweeper.abort();

        assert_eq!(cache.count_entries(partition).await.unwrap(), 4);
        let urls = cache.urls_in_partition(partition).await.unwrap();
        assert_eq!(urls.first().unwrap(), "http://origin.test/p/6");
    }
}
