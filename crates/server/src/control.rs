//! Page-to-gateway control messages.
//!
//! The wire format is a tagged JSON object: `{"type": "SKIP_WAITING"}`,
//! `{"type": "GET_VERSION"}`, `{"type": "CLEAR_CACHE"}`, or
//! `{"type": "PERFORMANCE_MEASURE", "data": ...}`. Unknown types fail to
//! parse and are rejected as invalid input at the HTTP layer.

use serde::{Deserialize, Serialize};

use wayfare_core::Error;

use crate::gateway::Gateway;

/// Control commands a page can send to the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    /// Force the new version live without waiting.
    SkipWaiting,
    /// Ask for the current cache version token.
    GetVersion,
    /// Delete every cache partition.
    ClearCache,
    /// No-op measurement echo used by the performance probes.
    PerformanceMeasure {
        #[serde(default)]
        data: serde_json::Value,
    },
}

/// Replies on the control channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ControlReply {
    Version { version: String },
    Cleared { success: bool },
    Measured { echoed: serde_json::Value },
    Ack { ok: bool },
}

/// Dispatch one control message.
pub async fn handle_message(gateway: &Gateway, message: ControlMessage) -> Result<ControlReply, Error> {
    match message {
        ControlMessage::SkipWaiting => {
            gateway.request_skip_waiting();
            Ok(ControlReply::Ack { ok: true })
        }
        ControlMessage::GetVersion => Ok(ControlReply::Version { version: gateway.version().to_string() }),
        ControlMessage::ClearCache => {
            let deleted = gateway.cache().clear_all().await?;
            tracing::info!(deleted, "cleared all cache partitions");
            Ok(ControlReply::Cleared { success: true })
        }
        ControlMessage::PerformanceMeasure { data } => {
            tracing::debug!(measure = %data, "performance measure");
            Ok(ControlReply::Measured { echoed: data })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_gateway;
    use wayfare_core::cache::Entry;

    #[test]
    fn test_wire_format_parses() {
        let message: ControlMessage = serde_json::from_str(r#"{"type": "SKIP_WAITING"}"#).unwrap();
        assert!(matches!(message, ControlMessage::SkipWaiting));

        let message: ControlMessage =
            serde_json::from_str(r#"{"type": "PERFORMANCE_MEASURE", "data": {"lcp_ms": 1200}}"#).unwrap();
        let ControlMessage::PerformanceMeasure { data } = message else {
            panic!("expected PerformanceMeasure");
        };
        assert_eq!(data["lcp_ms"], 1200);
    }

    #[test]
    fn test_unknown_type_rejected() {
        let result = serde_json::from_str::<ControlMessage>(r#"{"type": "REWIND_TIME"}"#);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_skip_waiting() {
        let (gateway, _network) = test_gateway().await;
        let reply = handle_message(&gateway, ControlMessage::SkipWaiting).await.unwrap();
        assert!(matches!(reply, ControlReply::Ack { ok: true }));
        assert!(gateway.skip_waiting_requested());
    }

    #[tokio::test]
    async fn test_get_version() {
        let (gateway, _network) = test_gateway().await;
        let reply = handle_message(&gateway, ControlMessage::GetVersion).await.unwrap();
        let ControlReply::Version { version } = reply else {
            panic!("expected Version");
        };
        assert_eq!(version, "v2.0.0");
    }

    #[tokio::test]
    async fn test_clear_cache_empties_every_partition() {
        let (gateway, _network) = test_gateway().await;
        for partition in [
            gateway.partitions().static_assets.clone(),
            gateway.partitions().images.clone(),
            gateway.partitions().api.clone(),
        ] {
            let entry = Entry::new(&partition, "http://origin.test/x", 200, None, None, vec![0]);
            gateway.cache().put_entry(&entry).await.unwrap();
        }

        let reply = handle_message(&gateway, ControlMessage::ClearCache).await.unwrap();
        assert!(matches!(reply, ControlReply::Cleared { success: true }));
        assert!(gateway.cache().list_partitions().await.unwrap().is_empty());

        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json, serde_json::json!({"success": true}));
    }

    #[tokio::test]
    async fn test_performance_measure_echoes() {
        let (gateway, _network) = test_gateway().await;
        let data = serde_json::json!({"fcp_ms": 640});
        let reply = handle_message(&gateway, ControlMessage::PerformanceMeasure { data: data.clone() })
            .await
            .unwrap();
        let ControlReply::Measured { echoed } = reply else {
            panic!("expected Measured");
        };
        assert_eq!(echoed, data);
    }
}
