//! Push payloads and notification clicks.

use serde::{Deserialize, Serialize};

use wayfare_core::Error;

const DEFAULT_ICON: &str = "/favicon.png";

/// JSON payload carried by a push event. Every field is optional; the
/// defaults keep a malformed-but-parseable payload displayable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PushPayload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub id: Option<i64>,
}

/// An action button on a displayed notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
}

/// A displayable notification built from a push payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    #[serde(default)]
    pub image: Option<String>,
    /// URL opened when the notification is clicked.
    pub url: String,
    pub actions: Vec<NotificationAction>,
    pub require_interaction: bool,
}

/// Parse a push payload into a displayable notification.
pub fn parse_push(data: &[u8]) -> Result<Notification, Error> {
    if data.is_empty() {
        return Err(Error::InvalidInput("empty push payload".to_string()));
    }
    let payload: PushPayload =
        serde_json::from_slice(data).map_err(|e| Error::InvalidInput(format!("bad push payload: {e}")))?;
    Ok(build_notification(payload))
}

fn build_notification(payload: PushPayload) -> Notification {
    Notification {
        title: payload.title.unwrap_or_else(|| "Wayfare".to_string()),
        body: payload.body.unwrap_or_else(|| "New update available!".to_string()),
        icon: payload.icon.unwrap_or_else(|| DEFAULT_ICON.to_string()),
        badge: DEFAULT_ICON.to_string(),
        image: payload.image,
        url: payload.url.unwrap_or_else(|| "/".to_string()),
        actions: vec![
            NotificationAction { action: "open".to_string(), title: "Open App".to_string() },
            NotificationAction { action: "close".to_string(), title: "Close".to_string() },
        ],
        require_interaction: true,
    }
}

/// Resolve a notification click: the URL to open, or None to just close.
///
/// A bare click (no action button) opens the notification URL, as does the
/// explicit open action. Close dismisses without opening anything.
pub fn notification_click(action: Option<&str>, notification: &Notification) -> Option<String> {
    match action {
        None | Some("open") => Some(notification.url.clone()),
        _ => None,
    }
}
