//! Locally generated fallback responses for failures with nothing cached.

use bytes::Bytes;

use super::{AssetRequest, ServedResponse, Source};

/// Canned page shown for navigations that fail with no cached copy.
const OFFLINE_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>You're offline</title>
  <style>
    body { font-family: sans-serif; text-align: center; padding: 48px 16px; }
    h1 { margin-bottom: 12px; }
    p { color: #555; margin-bottom: 24px; }
  </style>
</head>
<body>
  <h1>You're offline</h1>
  <p>Cached pages are still available. This one isn't yet; reconnect and try again.</p>
  <button onclick="window.location.reload()">Try again</button>
</body>
</html>
"#;

/// Build the fallback for a request that failed with no cached copy.
///
/// Navigations get the canned offline page; everything else degrades to a
/// plain 503 and the requesting page handles the gap (missing image,
/// failed script) the way it always does.
pub(crate) fn offline_response(request: &AssetRequest) -> ServedResponse {
    if request.is_navigation() {
        ServedResponse {
            status: 200,
            content_type: Some("text/html; charset=utf-8".to_string()),
            body: Bytes::from_static(OFFLINE_PAGE.as_bytes()),
            source: Source::Offline,
        }
    } else {
        ServedResponse {
            status: 503,
            content_type: Some("text/plain".to_string()),
            body: Bytes::from_static(b"Offline"),
            source: Source::Offline,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::get;

    #[test]
    fn test_navigation_gets_offline_page() {
        let request = get("http://origin.test/travel-packages", Some("text/html"));
        let response = offline_response(&request);
        assert_eq!(response.status, 200);
        assert_eq!(response.content_type.as_deref(), Some("text/html; charset=utf-8"));
        assert!(String::from_utf8_lossy(&response.body).contains("offline"));
        assert_eq!(response.source, Source::Offline);
    }

    #[test]
    fn test_non_navigation_gets_503() {
        let request = get("http://origin.test/img/hero.jpg", None);
        let response = offline_response(&request);
        assert_eq!(response.status, 503);
        assert_eq!(response.source, Source::Offline);
    }
}
