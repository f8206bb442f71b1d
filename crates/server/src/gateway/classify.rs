//! Request classification.
//!
//! Checked in priority order, first match wins. Order matters: fonts that
//! live under `/assets/` classify as static assets, and any request whose
//! Accept header names text/html counts as a critical page before the
//! stale-while-revalidate HTML class is ever consulted.

use wayfare_core::AppConfig;

use super::AssetRequest;

const STATIC_EXTS: &[&str] = &[".css", ".js", ".json"];
const IMAGE_EXTS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp", ".svg", ".ico"];
const FONT_EXTS: &[&str] = &[".woff", ".woff2", ".ttf", ".otf", ".eot"];
const HTML_EXTS: &[&str] = &[".html", ".htm"];

/// The request categories the routing policy distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    CriticalPage,
    StaticAsset,
    Image,
    Font,
    Api,
    HtmlPage,
    Other,
}

/// Classify an intercepted request.
pub fn classify(request: &AssetRequest, config: &AppConfig) -> RequestClass {
    let path = request.url.path().to_ascii_lowercase();

    if config.critical_assets.iter().any(|a| a == &path) || request.is_navigation() {
        return RequestClass::CriticalPage;
    }

    if path.contains("/assets/") || has_extension(&path, STATIC_EXTS) {
        return RequestClass::StaticAsset;
    }

    if has_extension(&path, IMAGE_EXTS) {
        return RequestClass::Image;
    }

    if has_extension(&path, FONT_EXTS) {
        return RequestClass::Font;
    }

    if path.contains("/api/") || is_api_host(request, config) {
        return RequestClass::Api;
    }

    if has_extension(&path, HTML_EXTS) {
        return RequestClass::HtmlPage;
    }

    RequestClass::Other
}

fn has_extension(path: &str, exts: &[&str]) -> bool {
    exts.iter().any(|ext| path.ends_with(ext))
}

fn is_api_host(request: &AssetRequest, config: &AppConfig) -> bool {
    let Some(host) = request.url.host_str() else {
        return false;
    };
    config.api_hosts.iter().any(|pattern| host.contains(pattern.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::get;

    fn class_of(url: &str, accept: Option<&str>) -> RequestClass {
        classify(&get(url, accept), &AppConfig::default())
    }

    #[test]
    fn test_critical_by_path() {
        assert_eq!(class_of("http://origin.test/", None), RequestClass::CriticalPage);
        assert_eq!(class_of("http://origin.test/travel-packages", None), RequestClass::CriticalPage);
        assert_eq!(class_of("http://origin.test/manifest.json", None), RequestClass::CriticalPage);
    }

    #[test]
    fn test_critical_by_accept_header() {
        let accept = Some("text/html,application/xhtml+xml");
        assert_eq!(class_of("http://origin.test/anything", accept), RequestClass::CriticalPage);
        // Accept wins over later classes, matching the priority order.
        assert_eq!(class_of("http://origin.test/api/cars", accept), RequestClass::CriticalPage);
    }

    #[test]
    fn test_static_assets() {
        assert_eq!(class_of("http://origin.test/assets/js/main.js", None), RequestClass::StaticAsset);
        assert_eq!(class_of("http://origin.test/theme.css", None), RequestClass::StaticAsset);
        assert_eq!(class_of("http://origin.test/data/config.json", None), RequestClass::StaticAsset);
    }

    #[test]
    fn test_fonts_under_assets_are_static() {
        assert_eq!(
            class_of("http://origin.test/assets/fonts/fa-solid-900.woff2", None),
            RequestClass::StaticAsset
        );
    }

    #[test]
    fn test_images() {
        assert_eq!(class_of("http://origin.test/img/hero.jpg", None), RequestClass::Image);
        assert_eq!(class_of("http://origin.test/img/logo.SVG", None), RequestClass::Image);
        assert_eq!(class_of("http://origin.test/favicon.ico", None), RequestClass::Image);
    }

    #[test]
    fn test_fonts_outside_assets() {
        assert_eq!(class_of("http://origin.test/fonts/custom.ttf", None), RequestClass::Font);
        assert_eq!(class_of("http://origin.test/fonts/custom.woff2", None), RequestClass::Font);
    }

    #[test]
    fn test_api_by_path_and_host() {
        assert_eq!(class_of("http://origin.test/api/cars", None), RequestClass::Api);
        assert_eq!(
            class_of("https://abc.supabase.co/rest/v1/cars", None),
            RequestClass::Api
        );
        assert_eq!(class_of("https://api.example.com/v1/quote", None), RequestClass::Api);
    }

    #[test]
    fn test_images_win_over_api_host() {
        assert_eq!(
            class_of("https://abc.supabase.co/storage/v1/object/public/hero.png", None),
            RequestClass::Image
        );
    }

    #[test]
    fn test_html_extension_without_accept() {
        assert_eq!(class_of("http://origin.test/fragment.html", None), RequestClass::HtmlPage);
    }

    #[test]
    fn test_everything_else() {
        assert_eq!(class_of("http://origin.test/ping", None), RequestClass::Other);
        assert_eq!(class_of("http://origin.test/download.pdf", None), RequestClass::Other);
    }
}
