use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::uuid::Uuid;

/// Arm width of a player skin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkinModel {
    Classic,
    Slim,
}

/// One entry of a player's name history
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NameChange {
    pub name: String,
    /// `None` for the name the account was created with
    pub changed_at: Option<DateTime<Utc>>,
}

/// A resolved Minecraft profile
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub uuid: Uuid,
    pub uuid_dashed: String,
    pub name: String,
    pub name_history: Vec<NameChange>,
    pub skin_url: Option<String>,
    pub skin_model: SkinModel,
    pub cape_url: Option<String>,
    pub cached_at: DateTime<Utc>,
}

/// Session server profile
#[derive(Debug, Clone, Deserialize)]
pub struct SessionProfile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub properties: Vec<ProfileProperty>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileProperty {
    pub name: String,
    pub value: String,
    pub signature: Option<String>,
}

/// Decoded `textures` property of a session profile
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextureBundle {
    /// Milliseconds since the epoch
    pub timestamp: Option<i64>,
    pub profile_id: Option<String>,
    pub profile_name: Option<String>,
    #[serde(default)]
    pub textures: HashMap<String, Texture>,
}

impl TextureBundle {
    pub fn skin(&self) -> Option<&Texture> {
        self.textures.get("SKIN")
    }

    pub fn cape(&self) -> Option<&Texture> {
        self.textures.get("CAPE")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Texture {
    pub url: String,
    pub metadata: Option<TextureMetadata>,
}

impl Texture {
    pub fn model(&self) -> SkinModel {
        match self.metadata.as_ref().and_then(|m| m.model.as_deref()) {
            Some("slim") => SkinModel::Slim,
            _ => SkinModel::Classic,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextureMetadata {
    pub model: Option<String>,
}

/// Username to UUID lookup response
#[derive(Debug, Deserialize)]
pub(crate) struct UuidLookupResponse {
    pub(crate) id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NameHistoryEntry {
    pub(crate) name: String,
    /// Seconds since the epoch
    pub(crate) changed_to_at: Option<i64>,
}
