//! wayfare gateway entry point.
//!
//! Boots the offline asset cache gateway in front of the configured
//! upstream origin: opens the cache, pre-warms and activates the current
//! policy version, starts the periodic sweep, and serves the HTTP surface.

use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use wayfare_client::{ClientConfig, HttpClient};
use wayfare_core::{AppConfig, CacheDb};

mod control;
mod gateway;
mod lifecycle;
mod notify;
mod routes;
mod sweep;
mod sync;
#[cfg(test)]
mod test_support;

use gateway::Gateway;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(version = %config.version, upstream = %config.upstream_origin, "starting wayfare gateway");

    let cache = CacheDb::open(&config.db_path).await?;

    let client = HttpClient::new(ClientConfig {
        user_agent: config.user_agent.clone(),
        max_bytes: config.max_bytes,
        timeout: config.timeout(),
        ..Default::default()
    })?;

    let gateway = Gateway::new(cache.clone(), Arc::new(client), config.clone())?;

    lifecycle::install(&gateway).await;
    lifecycle::activate(&gateway).await?;

    let _sweeper = sweep::spawn(
        cache,
        gateway.partitions().dynamic.clone(),
        config.dynamic_cache_cap as u64,
        config.sweep_interval(),
    );

    let app = routes::create_router(gateway);

    let addr = format!("{}:{}", config.listen_host, config.listen_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "wayfare gateway listening");

    axum::serve(listener, app).await?;

    Ok(())
}
