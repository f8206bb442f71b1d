//! URL normalization for consistent cache keys.

/// Error type for URL normalization failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Normalize a URL string so equivalent requests share one cache key.
///
/// Lowercases the host, drops the fragment, and keeps the query as-is.
/// A missing scheme defaults to https. Only http(s) URLs are accepted;
/// everything else is the pass-through path's problem.
pub fn canonicalize(input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let with_scheme;
    let candidate = if trimmed.contains("://") {
        trimmed
    } else {
        with_scheme = format!("https://{trimmed}");
        &with_scheme
    };

    let mut parsed = url::Url::parse(candidate).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(UrlError::UnsupportedScheme(parsed.scheme().to_string()));
    }

    if let Some(host) = parsed.host_str() {
        let lowered = host.to_lowercase();
        if lowered != host {
            parsed
                .set_host(Some(&lowered))
                .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
        }
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

/// Resolve an intercepted path-and-query against the upstream origin.
///
/// This is how the gateway turns `/assets/css/main.css?v=3` into the
/// absolute URL it fetches and caches under.
pub fn resolve(origin: &url::Url, path_and_query: &str) -> Result<url::Url, UrlError> {
    let joined = origin
        .join(path_and_query)
        .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    canonicalize(joined.as_str())
}
