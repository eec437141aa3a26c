//! Texture fetching

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::error::{AvatarError, Result};

const DEFAULT_BASE_URL: &str = "http://textures.minecraft.net/texture";

/// Somewhere skin textures can be loaded from by id
#[async_trait]
pub trait TextureSource: Send + Sync {
    async fn fetch_texture(&self, texture_id: &str) -> Result<Vec<u8>>;
}

/// HTTP client for the Minecraft texture host
pub struct TextureClient {
    client: Client,
    base_url: String,
}

impl TextureClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, Duration::from_secs(10))
    }

    pub fn with_base_url(base_url: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl Default for TextureClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextureSource for TextureClient {
    async fn fetch_texture(&self, texture_id: &str) -> Result<Vec<u8>> {
        let url = format!("{}/{}", self.base_url, urlencoding::encode(texture_id));
        debug!(url = %url, "Fetching texture");

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            warn!(status = %response.status(), url = %url, "Failed to fetch texture");
            return Err(AvatarError::Status(response.status().as_u16()));
        }

        let data = response.bytes().await?.to_vec();
        debug!(size = data.len(), "Fetched texture");
        Ok(data)
    }
}

/// The texture id is the last path segment of a texture URL
pub fn texture_id_from_url(url: &str) -> Option<&str> {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|id| !id.is_empty() && !id.contains(':'))
}
