//! Background sync hook.
//!
//! Reserved for replaying actions queued while offline. Nothing writes to
//! the queue yet, so the replay loop drains an empty list; the hook exists
//! so registrations for the tag are acknowledged instead of erroring.

use serde::{Deserialize, Serialize};

/// The one sync tag the gateway responds to.
pub const BACKGROUND_SYNC_TAG: &str = "background-sync";

/// An action captured while offline, waiting to be replayed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfflineAction {
    pub id: i64,
    pub endpoint: String,
    pub payload: serde_json::Value,
}

fn queued_actions() -> Vec<OfflineAction> {
    Vec::new()
}

/// Handle a sync event. Returns the number of replayed actions.
pub async fn handle_sync(tag: &str) -> u64 {
    if tag != BACKGROUND_SYNC_TAG {
        tracing::debug!(tag, "ignoring unknown sync tag");
        return 0;
    }

    let actions = queued_actions();
    if actions.is_empty() {
        tracing::debug!("background sync: nothing queued");
        return 0;
    }

    let mut replayed = 0;
    for action in actions {
        tracing::info!(id = action.id, endpoint = %action.endpoint, "replaying offline action");
        replayed += 1;
    }
    replayed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_known_tag_with_empty_queue() {
        assert_eq!(handle_sync(BACKGROUND_SYNC_TAG).await, 0);
    }

    #[tokio::test]
    async fn test_unknown_tag_ignored() {
        assert_eq!(handle_sync("periodic-refresh").await, 0);
    }
}
