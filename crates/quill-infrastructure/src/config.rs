//! Configuration loading.
//!
//! `QuillConfig` is read from `~/.config/quill/config.toml` (or an explicit
//! path). A missing file yields the defaults; every section and field is
//! optional.
//!
//! ```toml
//! log_level = "debug"
//!
//! [instance]
//! base_url = "https://mastodon.example"
//! access_token = "..."
//! timeout_secs = 30
//!
//! [cache]
//! stale_after_secs = 300
//! guard_stale_fetches = false
//!
//! [features]
//! groups = true
//!
//! [session]
//! me = "109"
//! ```

use quill_core::{Features, QuillError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::paths::QuillPaths;

pub const ENV_BASE_URL: &str = "QUILL_BASE_URL";
pub const ENV_ACCESS_TOKEN: &str = "QUILL_ACCESS_TOKEN";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceConfig {
    /// Instance root, e.g. `https://mastodon.example`.
    pub base_url: Option<String>,
    pub access_token: Option<String>,
    /// Request timeout; `0` disables it.
    pub timeout_secs: u64,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            access_token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Unset keeps entries fresh until invalidated.
    pub stale_after_secs: Option<u64>,
    pub guard_stale_fetches: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    /// Id of the signed-in account.
    pub me: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuillConfig {
    pub instance: InstanceConfig,
    pub cache: CacheConfig,
    pub features: Features,
    pub session: SessionSection,
    pub log_level: String,
}

impl Default for QuillConfig {
    fn default() -> Self {
        Self {
            instance: InstanceConfig::default(),
            cache: CacheConfig::default(),
            features: Features::default(),
            session: SessionSection::default(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl QuillConfig {
    /// Loads the default config file and applies environment overrides.
    pub fn load() -> Result<Self> {
        let path = QuillPaths::config_file().map_err(|e| QuillError::config(e.to_string()))?;
        Ok(Self::load_from(&path)?.with_env())
    }

    /// Loads `path`, falling back to defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config = Self::parse(&content)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Applies `QUILL_BASE_URL` and `QUILL_ACCESS_TOKEN` from the process
    /// environment.
    pub fn with_env(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Applies overrides resolved through `lookup`. Empty values are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |name: &str| lookup(name).filter(|value| !value.is_empty());
        if let Some(base_url) = lookup(ENV_BASE_URL) {
            self.instance.base_url = Some(base_url);
        }
        if let Some(token) = lookup(ENV_ACCESS_TOKEN) {
            self.instance.access_token = Some(token);
        }
        self
    }

    /// The configured instance root.
    ///
    /// # Errors
    ///
    /// Returns `QuillError::Config` if no base URL is set.
    pub fn base_url(&self) -> Result<&str> {
        self.instance
            .base_url
            .as_deref()
            .ok_or_else(|| QuillError::config(format!("instance.base_url is not set (or set {ENV_BASE_URL})")))
    }

    /// Per-request timeout, or `None` when `timeout_secs` is 0.
    pub fn timeout(&self) -> Option<Duration> {
        match self.instance.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = QuillConfig::load_from(&dir.path().join("config.toml")).unwrap();

        assert_eq!(config, QuillConfig::default());
        assert_eq!(config.log_level, "info");
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.cache, CacheConfig::default());
    }

    #[test]
    fn test_load_full_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
log_level = "debug"

[instance]
base_url = "https://mastodon.example"
access_token = "secret"
timeout_secs = 5

[cache]
stale_after_secs = 300
guard_stale_fetches = true

[features]
groups = true
blockers_visible = true

[session]
me = "109"
"#,
        )
        .unwrap();

        let config = QuillConfig::load_from(&path).unwrap();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.base_url().unwrap(), "https://mastodon.example");
        assert_eq!(config.instance.access_token.as_deref(), Some("secret"));
        assert_eq!(config.timeout(), Some(Duration::from_secs(5)));
        assert!(config.features.groups);
        assert!(config.features.relationships);
        assert_eq!(config.session.me.as_deref(), Some("109"));
        assert_eq!(config.cache.stale_after_secs, Some(300));
        assert!(config.cache.guard_stale_fetches);
    }

    #[test]
    fn test_zero_timeout_disables_it() {
        let config = QuillConfig::parse("[instance]\ntimeout_secs = 0\n").unwrap();
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = QuillConfig::parse("[cache]\nguard_stale_fetches = true\n").unwrap();

        assert!(config.cache.guard_stale_fetches);
        assert_eq!(config.cache.stale_after_secs, None);
        assert_eq!(config.instance, InstanceConfig::default());
        assert_eq!(config.features, Features::default());
    }

    #[test]
    fn test_invalid_toml_is_a_serialization_error() {
        let err = QuillConfig::parse("[instance\nbase_url = 1").unwrap_err();
        assert!(matches!(err, QuillError::Serialization { ref format, .. } if format == "TOML"));
    }

    #[test]
    fn test_overrides_replace_file_values() {
        let config = QuillConfig::parse("[instance]\nbase_url = \"https://a.example\"\n").unwrap();
        let env = HashMap::from([
            (ENV_BASE_URL, "https://b.example".to_string()),
            (ENV_ACCESS_TOKEN, "token".to_string()),
        ]);

        let config = config.with_overrides(|name| env.get(name).cloned());

        assert_eq!(config.base_url().unwrap(), "https://b.example");
        assert_eq!(config.instance.access_token.as_deref(), Some("token"));
    }

    #[test]
    fn test_empty_override_is_ignored() {
        let config = QuillConfig::parse("[instance]\nbase_url = \"https://a.example\"\n")
            .unwrap()
            .with_overrides(|_| Some(String::new()));

        assert_eq!(config.base_url().unwrap(), "https://a.example");
        assert_eq!(config.instance.access_token, None);
    }

    #[test]
    fn test_missing_base_url_is_a_config_error() {
        let err = QuillConfig::default().base_url().unwrap_err();
        assert!(matches!(err, QuillError::Config(_)));
    }
}
