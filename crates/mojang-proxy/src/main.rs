//! Mojang Proxy - caching front for the Mojang account API
//!
//! Resolves usernames and UUIDs into profiles with short-lived caching of
//! each upstream call, and renders avatar heads from skin textures.

mod config;
mod error;
mod server;
mod types;

use crate::config::Config;
use crate::error::Result;
use crate::server::{start_server, ServerState, SharedState};
use mojang_api::{
    CachedFetcher, Clock, Endpoints, HttpUpstream, ProfileResolver, SystemClock, TtlCache,
};
use skin_avatar::{AvatarCompositor, TextureClient};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let env_filter = EnvFilter::from_default_env().add_directive("mojang_proxy=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    };

    info!("Starting Mojang Proxy...");

    let config = Config::from_env();
    info!("Port: {}", config.port);
    info!("Mojang API: {}", config.mojang_api_url);
    info!("Session server: {}", config.mojang_session_url);
    info!("Textures: {}", config.textures_url);
    info!("Cache capacity: {} entries", config.cache_max_entries);
    info!("Upstream timeout: {} seconds", config.http_timeout_secs);

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let cache = Arc::new(TtlCache::new(config.cache_max_entries, clock.clone()));
    let upstream = Arc::new(HttpUpstream::with_timeout(config.http_timeout()));
    let fetcher = CachedFetcher::new(upstream, cache);

    let endpoints = Endpoints {
        api_url: config.mojang_api_url.clone(),
        session_url: config.mojang_session_url.clone(),
    };
    let resolver = ProfileResolver::new(fetcher, endpoints, clock);

    let textures = Arc::new(TextureClient::with_base_url(
        &config.textures_url,
        config.http_timeout(),
    ));

    // Create shared state
    let state: SharedState = Arc::new(ServerState::new(
        resolver,
        AvatarCompositor::new(),
        textures,
    ));

    // Start HTTP server (blocking)
    start_server(state, config.port).await?;

    Ok(())
}
