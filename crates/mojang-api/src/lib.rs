//! Mojang Account API Client
//!
//! Resolves Minecraft usernames and UUIDs into profiles (current name,
//! name history, skin and cape URLs) through a chain of upstream calls.
//! Every upstream response is cached under its request URL with a
//! per-endpoint freshness window.

mod cache;
mod clock;
mod error;
mod fetcher;
mod resolver;
mod skin;
mod types;
mod uuid;

#[cfg(test)]
mod testing;

pub use cache::{CacheEntry, CacheStats, TtlCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{NetworkError, ResolveError, Result, Stage, ValidationError};
pub use fetcher::{
    CachedFetcher, FetchResult, HttpUpstream, Upstream, UpstreamResponse, PROFILE_TTL,
    UUID_TTL,
};
pub use resolver::{Endpoints, ProfileResolver, ResolveState};
pub use skin::{select_default, SkinVariant};
pub use types::{
    NameChange, Profile, ProfileProperty, SessionProfile, SkinModel, Texture, TextureBundle,
    TextureMetadata,
};
pub use uuid::{validate, Uuid};
