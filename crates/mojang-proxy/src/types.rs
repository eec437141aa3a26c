//! Request and response types for the proxy endpoints

use mojang_api::CacheStats;
use serde::{Deserialize, Serialize};

/// Query string of the username route
#[derive(Debug, Default, Deserialize)]
pub struct AtQuery {
    /// Unix seconds, kept as text so a bad value gets a JSON error
    pub at: Option<String>,
}

impl AtQuery {
    pub fn timestamp(&self) -> Option<Result<i64, String>> {
        self.at.as_deref().map(|at| {
            at.trim()
                .parse::<i64>()
                .map_err(|_| format!("Invalid at timestamp: {at}"))
        })
    }
}

/// Body of `POST /avatar`
#[derive(Debug, Deserialize)]
pub struct AvatarRequest {
    /// Texture id, or a full texture URL
    pub texture: String,
    pub size: f64,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
    pub cache: CacheStats,
}
