//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (WAYFARE_*)
//! 2. TOML config file (if WAYFARE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (WAYFARE_*)
/// 2. TOML config file (if WAYFARE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Cache version token. Bumping it invalidates every old partition on
    /// the next activation.
    ///
    /// Set via WAYFARE_VERSION environment variable.
    #[serde(default = "default_version")]
    pub version: String,

    /// Path to SQLite cache database.
    ///
    /// Set via WAYFARE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Origin the gateway fronts. Intercepted request paths are resolved
    /// against this base.
    ///
    /// Set via WAYFARE_UPSTREAM_ORIGIN environment variable.
    #[serde(default = "default_upstream_origin")]
    pub upstream_origin: String,

    /// User-Agent string for upstream HTTP requests.
    ///
    /// Set via WAYFARE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via WAYFARE_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum bytes to fetch per upstream request.
    ///
    /// Set via WAYFARE_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Entry cap for the image partition (FIFO eviction past it).
    ///
    /// Set via WAYFARE_IMAGE_CACHE_CAP environment variable.
    #[serde(default = "default_image_cache_cap")]
    pub image_cache_cap: usize,

    /// Entry cap the periodic sweep trims the dynamic partition to.
    ///
    /// Set via WAYFARE_DYNAMIC_CACHE_CAP environment variable.
    #[serde(default = "default_dynamic_cache_cap")]
    pub dynamic_cache_cap: usize,

    /// Minutes between periodic dynamic-partition sweeps.
    ///
    /// Set via WAYFARE_SWEEP_INTERVAL_MINS environment variable.
    #[serde(default = "default_sweep_interval_mins")]
    pub sweep_interval_mins: u64,

    /// Pages pre-warmed into the static partition at install, and treated
    /// as critical by the classifier.
    #[serde(default = "default_critical_assets")]
    pub critical_assets: Vec<String>,

    /// Static assets pre-warmed into the static partition at install.
    #[serde(default = "default_static_assets")]
    pub static_assets: Vec<String>,

    /// Fonts pre-warmed into the font partition at install.
    #[serde(default = "default_font_assets")]
    pub font_assets: Vec<String>,

    /// Hostname substrings that classify a request as an API call.
    #[serde(default = "default_api_hosts")]
    pub api_hosts: Vec<String>,

    /// Listen host for the gateway HTTP surface.
    #[serde(default = "default_listen_host")]
    pub listen_host: String,

    /// Listen port for the gateway HTTP surface.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
}

fn default_version() -> String {
    "v2.0.0".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./wayfare-cache.sqlite")
}

fn default_upstream_origin() -> String {
    "http://127.0.0.1:3000".into()
}

fn default_user_agent() -> String {
    "wayfare/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_image_cache_cap() -> usize {
    100
}

fn default_dynamic_cache_cap() -> usize {
    200
}

fn default_sweep_interval_mins() -> u64 {
    30
}

fn default_critical_assets() -> Vec<String> {
    [
        "/",
        "/travel-packages",
        "/car-rental-home",
        "/car-listing",
        "/admin/login",
        "/manifest.json",
        "/favicon.png",
    ]
    .map(String::from)
    .to_vec()
}

fn default_static_assets() -> Vec<String> {
    [
        "/assets/css/bootstrap.min.css",
        "/assets/css/fontawesome-all.min.css",
        "/assets/css/animate.css",
        "/assets/css/nice-select.css",
        "/assets/css/meanmenu.css",
        "/assets/css/swiper-bundle.min.css",
        "/assets/js/bootstrap.bundle.min.js",
        "/assets/js/swiper-bundle.min.js",
        "/assets/js/wow.min.js",
        "/assets/js/main.js",
    ]
    .map(String::from)
    .to_vec()
}

fn default_font_assets() -> Vec<String> {
    [
        "/assets/fonts/fa-solid-900.woff2",
        "/assets/fonts/fa-regular-400.woff2",
        "/assets/fonts/fa-brands-400.woff2",
        "/assets/fonts/fa-light-300.woff2",
    ]
    .map(String::from)
    .to_vec()
}

fn default_api_hosts() -> Vec<String> {
    ["supabase", "api."].map(String::from).to_vec()
}

fn default_listen_host() -> String {
    "127.0.0.1".into()
}

fn default_listen_port() -> u16 {
    8787
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            db_path: default_db_path(),
            upstream_origin: default_upstream_origin(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
            image_cache_cap: default_image_cache_cap(),
            dynamic_cache_cap: default_dynamic_cache_cap(),
            sweep_interval_mins: default_sweep_interval_mins(),
            critical_assets: default_critical_assets(),
            static_assets: default_static_assets(),
            font_assets: default_font_assets(),
            api_hosts: default_api_hosts(),
            listen_host: default_listen_host(),
            listen_port: default_listen_port(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Sweep interval as Duration.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_mins * 60)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `WAYFARE_`
    /// 2. TOML file from `WAYFARE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("WAYFARE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("WAYFARE_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
