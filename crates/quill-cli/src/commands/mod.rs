pub mod account;
pub mod config;
pub mod federation;
pub mod group;

use anyhow::{Context, Result};
use quill_application::{Session, SessionConfig, StoreConfig};
use quill_infrastructure::{QuillConfig, ReqwestApiClient};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub fn load_config(path: Option<&Path>) -> Result<QuillConfig> {
    let config = match path {
        Some(path) => QuillConfig::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?
            .with_env(),
        None => QuillConfig::load().context("Failed to load config")?,
    };
    Ok(config)
}

/// Builds a session talking to the configured instance.
pub fn session(config: &QuillConfig) -> Result<Session> {
    let client = ReqwestApiClient::from_config(config)?;
    tracing::debug!(base_url = client.base_url(), "session started");
    Ok(Session::new(Arc::new(client), session_config(config)))
}

pub fn store_config(config: &QuillConfig) -> StoreConfig {
    StoreConfig {
        stale_after: config.cache.stale_after_secs.map(Duration::from_secs),
        guard_stale_fetches: config.cache.guard_stale_fetches,
    }
}

pub fn session_config(config: &QuillConfig) -> SessionConfig {
    SessionConfig {
        store: store_config(config),
        features: config.features.clone(),
        me: config.session.me.clone(),
    }
}

pub fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
