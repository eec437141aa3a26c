use std::env;
use std::time::Duration;

/// Service configuration parsed from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub mojang_api_url: String,
    pub mojang_session_url: String,
    pub textures_url: String,
    pub cache_max_entries: u64,
    pub http_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            mojang_api_url: "https://api.mojang.com".to_string(),
            mojang_session_url: "https://sessionserver.mojang.com".to_string(),
            textures_url: "http://textures.minecraft.net/texture".to_string(),
            cache_max_entries: 10_000,
            http_timeout_secs: 10,
        }
    }
}

impl Config {
    /// Parse configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let port = lookup("PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);

        let url = |key: &str, default: String| {
            lookup(key)
                .map(|u| u.trim_end_matches('/').to_string())
                .filter(|u| !u.is_empty())
                .unwrap_or(default)
        };

        let mojang_api_url = url("MOJANG_API_URL", defaults.mojang_api_url);
        let mojang_session_url = url("MOJANG_SESSION_URL", defaults.mojang_session_url);
        let textures_url = url("TEXTURES_URL", defaults.textures_url);

        let cache_max_entries = lookup("CACHE_MAX_ENTRIES")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.cache_max_entries);

        let http_timeout_secs = lookup("HTTP_TIMEOUT_SECS")
            .and_then(|s| s.parse().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(defaults.http_timeout_secs);

        Self {
            port,
            mojang_api_url,
            mojang_session_url,
            textures_url,
            cache_max_entries,
            http_timeout_secs,
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
