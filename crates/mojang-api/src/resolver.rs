use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::cache::CacheStats;
use crate::clock::Clock;
use crate::error::{ResolveError, Result, Stage};
use crate::fetcher::{CachedFetcher, FetchResult, PROFILE_TTL, UUID_TTL};
use crate::skin::select_default;
use crate::types::{
    NameChange, NameHistoryEntry, Profile, SessionProfile, TextureBundle, UuidLookupResponse,
};
use crate::uuid::{validate, Uuid};

const DEFAULT_API_URL: &str = "https://api.mojang.com";
const DEFAULT_SESSION_URL: &str = "https://sessionserver.mojang.com";

/// Base URLs of the upstream Mojang hosts
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// Username lookups and name histories
    pub api_url: String,
    /// Session profiles
    pub session_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            session_url: DEFAULT_SESSION_URL.to_string(),
        }
    }
}

impl Endpoints {
    fn uuid_url(&self, username: &str, at: Option<i64>) -> String {
        let mut url = format!(
            "{}/users/profiles/minecraft/{}",
            self.api_url,
            urlencoding::encode(username)
        );
        if let Some(at) = at {
            url.push_str(&format!("?at={at}"));
        }
        url
    }

    fn profile_url(&self, uuid: &Uuid) -> String {
        format!("{}/session/minecraft/profile/{}", self.session_url, uuid)
    }

    fn history_url(&self, uuid: &Uuid) -> String {
        format!("{}/user/profiles/{}/names", self.api_url, uuid)
    }
}

/// Where a profile resolution currently stands.
///
/// Each state carries everything the next stage needs, so a failed
/// resolution can be retried from the stage that failed by handing the
/// last good state back to [`ProfileResolver::run`].
#[derive(Debug, Clone)]
pub enum ResolveState {
    ResolvingName {
        username: String,
        at: Option<i64>,
    },
    ResolvingUuid {
        raw: String,
    },
    FetchingProfile {
        uuid: Uuid,
    },
    ParsingTextures {
        uuid: Uuid,
        session: SessionProfile,
    },
    FetchingHistory {
        uuid: Uuid,
        session: SessionProfile,
        textures: TextureBundle,
    },
    Done(Profile),
}

impl ResolveState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ResolvingName { .. } => "resolving-name",
            Self::ResolvingUuid { .. } => "resolving-uuid",
            Self::FetchingProfile { .. } => "fetching-profile",
            Self::ParsingTextures { .. } => "parsing-textures",
            Self::FetchingHistory { .. } => "fetching-history",
            Self::Done(_) => "done",
        }
    }
}

/// Resolves usernames and UUIDs into profiles.
///
/// Stages run strictly in order: username -> UUID -> session profile ->
/// textures -> name history. There is no retry loop here; a caller that
/// wants one reruns from the failed stage.
pub struct ProfileResolver {
    fetcher: CachedFetcher,
    endpoints: Endpoints,
    clock: Arc<dyn Clock>,
}

impl ProfileResolver {
    pub fn new(fetcher: CachedFetcher, endpoints: Endpoints, clock: Arc<dyn Clock>) -> Self {
        Self {
            fetcher,
            endpoints,
            clock,
        }
    }

    /// Resolve a username, optionally as it was at a unix time
    pub async fn resolve_by_username(&self, username: &str, at: Option<i64>) -> Result<Profile> {
        self.run(ResolveState::ResolvingName {
            username: username.to_string(),
            at,
        })
        .await
    }

    /// Resolve a dashed or undashed UUID
    pub async fn resolve_by_uuid(&self, raw: &str) -> Result<Profile> {
        self.run(ResolveState::ResolvingUuid {
            raw: raw.to_string(),
        })
        .await
    }

    /// Resolve something that is either a UUID or a username
    pub async fn resolve(&self, id: &str) -> Result<Profile> {
        if validate(id).is_ok() {
            self.resolve_by_uuid(id).await
        } else {
            self.resolve_by_username(id, None).await
        }
    }

    /// Drive the state machine from `state` until it is done or errors
    pub async fn run(&self, mut state: ResolveState) -> Result<Profile> {
        loop {
            state = match state {
                ResolveState::Done(profile) => return Ok(profile),
                other => self.step(other).await?,
            };
            debug!(state = state.name(), "Profile resolution advanced");
        }
    }

    /// Run a single stage
    pub async fn step(&self, state: ResolveState) -> Result<ResolveState> {
        match state {
            ResolveState::ResolvingName { username, at } => {
                let url = self.endpoints.uuid_url(&username, at);
                let result = self.fetch(Stage::UuidLookup, &url, UUID_TTL).await?;
                let id = result
                    .body
                    .as_deref()
                    .and_then(|body| UuidLookupResponse::deserialize(body).ok())
                    .and_then(|lookup| lookup.id);

                match id {
                    Some(raw) => Ok(ResolveState::ResolvingUuid { raw }),
                    None => Err(ResolveError::upstream(
                        Stage::UuidLookup,
                        result.status,
                        "Could not fetch uuid",
                    )),
                }
            }
            ResolveState::ResolvingUuid { raw } => {
                let uuid = validate(&raw)?;
                Ok(ResolveState::FetchingProfile { uuid })
            }
            ResolveState::FetchingProfile { uuid } => {
                let url = self.endpoints.profile_url(&uuid);
                let result = self.fetch(Stage::Profile, &url, PROFILE_TTL).await?;
                let Some(body) = result.body.as_deref() else {
                    return Err(ResolveError::upstream(
                        Stage::Profile,
                        result.status,
                        "Could not fetch session",
                    ));
                };
                let session = SessionProfile::deserialize(body).map_err(|_| {
                    ResolveError::upstream(Stage::Profile, 500, "Could not parse session")
                })?;

                Ok(ResolveState::ParsingTextures { uuid, session })
            }
            ResolveState::ParsingTextures { uuid, session } => {
                let textures = parse_textures(&session)?;
                Ok(ResolveState::FetchingHistory {
                    uuid,
                    session,
                    textures,
                })
            }
            ResolveState::FetchingHistory {
                uuid,
                session,
                textures,
            } => {
                let url = self.endpoints.history_url(&uuid);
                let result = self.fetch(Stage::History, &url, UUID_TTL).await?;
                let Some(body) = result.body.as_deref() else {
                    return Err(ResolveError::upstream(
                        Stage::History,
                        result.status,
                        "Could not fetch name history",
                    ));
                };
                let history = Vec::<NameHistoryEntry>::deserialize(body).map_err(|_| {
                    ResolveError::upstream(Stage::History, 500, "Could not parse name history")
                })?;

                Ok(ResolveState::Done(
                    self.assemble(uuid, session, textures, history),
                ))
            }
            done @ ResolveState::Done(_) => Ok(done),
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.fetcher.cache_stats()
    }

    async fn fetch(&self, stage: Stage, url: &str, ttl: Duration) -> Result<FetchResult> {
        self.fetcher
            .fetch(url, ttl)
            .await
            .map_err(|source| ResolveError::UpstreamTransport { stage, source })
    }

    fn assemble(
        &self,
        uuid: Uuid,
        session: SessionProfile,
        textures: TextureBundle,
        history: Vec<NameHistoryEntry>,
    ) -> Profile {
        let skin = textures.skin();
        let skin_model = skin
            .map(|s| s.model())
            .unwrap_or_else(|| select_default(&uuid).model());

        let name_history = history
            .into_iter()
            .map(|entry| NameChange {
                name: entry.name,
                changed_at: entry
                    .changed_to_at
                    .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0)),
            })
            .collect();

        let cached_at = textures
            .timestamp
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .unwrap_or_else(|| self.clock.now());

        Profile {
            uuid_dashed: uuid.dashed(),
            uuid,
            name: session.name,
            name_history,
            skin_url: skin.map(|s| s.url.clone()),
            skin_model,
            cape_url: textures.cape().map(|c| c.url.clone()),
            cached_at,
        }
    }
}

/// Decode the base64 `textures` property of a session profile
fn parse_textures(session: &SessionProfile) -> Result<TextureBundle> {
    let property = session
        .properties
        .iter()
        .find(|p| p.name == "textures")
        .ok_or_else(|| ResolveError::TextureParse("no textures property".to_string()))?;

    let decoded = STANDARD
        .decode(property.value.as_bytes())
        .map_err(|e| ResolveError::TextureParse(e.to_string()))?;

    serde_json::from_slice::<TextureBundle>(&decoded)
        .map_err(|e| ResolveError::TextureParse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::TtlCache;
    use crate::clock::ManualClock;
    use crate::testing::StubUpstream;
    use crate::types::SkinModel;
    use serde_json::{json, Value};

    const API: &str = "https://api.mojang.com";
    const SESSION: &str = "https://sessionserver.mojang.com";
    const NOTCH: &str = "069a79f444e94726a5befca90e38aaf5";
    const SKIN_URL: &str =
        "http://textures.minecraft.net/texture/292009a4925b58f02c77dadc3ecef07ea4c7472f64e0fdc32ce5522489362680";

    fn textures_property(textures: Value) -> String {
        STANDARD.encode(serde_json::to_vec(&textures).unwrap())
    }

    fn session_body(uuid: &str, name: &str, textures: Value) -> Value {
        json!({
            "id": uuid,
            "name": name,
            "properties": [
                {"name": "textures", "value": textures_property(textures)}
            ]
        })
    }

    fn notch_upstream() -> StubUpstream {
        StubUpstream::new()
            .with_json(
                &format!("{API}/users/profiles/minecraft/Notch"),
                json!({"id": NOTCH, "name": "Notch"}),
            )
            .with_json(
                &format!("{SESSION}/session/minecraft/profile/{NOTCH}"),
                session_body(
                    NOTCH,
                    "Notch",
                    json!({
                        "timestamp": 1529958590000i64,
                        "profileId": NOTCH,
                        "profileName": "Notch",
                        "textures": {
                            "SKIN": {"url": SKIN_URL},
                            "CAPE": {"url": "http://textures.minecraft.net/texture/cape"}
                        }
                    }),
                ),
            )
            .with_json(
                &format!("{API}/user/profiles/{NOTCH}/names"),
                json!([{"name": "Notch"}]),
            )
    }

    fn resolver(upstream: Arc<StubUpstream>) -> (ProfileResolver, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let cache = Arc::new(TtlCache::new(100, clock.clone()));
        let fetcher = CachedFetcher::new(upstream, cache);
        let resolver = ProfileResolver::new(fetcher, Endpoints::default(), clock.clone());
        (resolver, clock)
    }

    #[tokio::test]
    async fn test_resolve_by_username() {
        let (resolver, _clock) = resolver(Arc::new(notch_upstream()));

        let profile = resolver.resolve_by_username("Notch", None).await.unwrap();

        assert_eq!(profile.name, "Notch");
        assert_eq!(profile.uuid.as_str(), NOTCH);
        assert_eq!(profile.uuid_dashed, "069a79f4-44e9-4726-a5be-fca90e38aaf5");
        assert!(!profile.name_history.is_empty());
        assert_eq!(profile.name_history[0].changed_at, None);
        assert_eq!(profile.skin_url.as_deref(), Some(SKIN_URL));
        assert_eq!(profile.skin_model, SkinModel::Classic);
        assert!(profile.cape_url.is_some());
        assert_eq!(profile.cached_at.timestamp(), 1529958590);
    }

    #[tokio::test]
    async fn test_username_not_found() {
        let upstream = StubUpstream::new().with_status(
            &format!("{API}/users/profiles/minecraft/doesnotexist"),
            404,
        );
        let (resolver, _clock) = resolver(Arc::new(upstream));

        let err = resolver
            .resolve_by_username("doesnotexist", None)
            .await
            .unwrap_err();

        assert_eq!(err.stage(), Stage::UuidLookup);
        assert_eq!(err.status(), 404);
        assert_eq!(err.message(), "Could not fetch uuid");
    }

    #[tokio::test]
    async fn test_lookup_without_id_fails() {
        let upstream = StubUpstream::new().with_json(
            &format!("{API}/users/profiles/minecraft/Ghost"),
            json!({"name": "Ghost"}),
        );
        let (resolver, _clock) = resolver(Arc::new(upstream));

        let err = resolver.resolve_by_username("Ghost", None).await.unwrap_err();
        assert_eq!(err.stage(), Stage::UuidLookup);
        assert_eq!(err.status(), 200);
    }

    #[tokio::test]
    async fn test_at_is_passed_to_lookup() {
        let upstream = Arc::new(notch_upstream().with_json(
            &format!("{API}/users/profiles/minecraft/Notch?at=1262304000"),
            json!({"id": NOTCH, "name": "Notch"}),
        ));
        let (resolver, _clock) = resolver(upstream.clone());

        resolver
            .resolve_by_username("Notch", Some(1262304000))
            .await
            .unwrap();

        assert_eq!(
            upstream.calls(&format!("{API}/users/profiles/minecraft/Notch?at=1262304000")),
            1
        );
        assert_eq!(
            upstream.calls(&format!("{API}/users/profiles/minecraft/Notch")),
            0
        );
    }

    #[tokio::test]
    async fn test_invalid_uuid() {
        let upstream = Arc::new(StubUpstream::new());
        let (resolver, _clock) = resolver(upstream.clone());

        let err = resolver.resolve_by_uuid("not-a-uuid").await.unwrap_err();

        assert_eq!(err.stage(), Stage::Format);
        assert_eq!(err.status(), 400);
        assert!(err.message().contains("not-a-uuid"));
        assert_eq!(upstream.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_dashed_uuid_uses_undashed_urls() {
        let upstream = Arc::new(notch_upstream());
        let (resolver, _clock) = resolver(upstream.clone());

        let profile = resolver
            .resolve_by_uuid("069a79f4-44e9-4726-a5be-fca90e38aaf5")
            .await
            .unwrap();

        assert_eq!(profile.uuid.as_str(), NOTCH);
        assert_eq!(
            upstream.calls(&format!("{SESSION}/session/minecraft/profile/{NOTCH}")),
            1
        );
    }

    #[tokio::test]
    async fn test_session_not_found() {
        let upstream = StubUpstream::new().with_status(
            &format!("{SESSION}/session/minecraft/profile/{NOTCH}"),
            204,
        );
        let (resolver, _clock) = resolver(Arc::new(upstream));

        let err = resolver.resolve_by_uuid(NOTCH).await.unwrap_err();
        assert_eq!(err.stage(), Stage::Profile);
        assert_eq!(err.status(), 204);
        assert_eq!(err.message(), "Could not fetch session");
    }

    #[tokio::test]
    async fn test_missing_textures_property() {
        let upstream = StubUpstream::new().with_json(
            &format!("{SESSION}/session/minecraft/profile/{NOTCH}"),
            json!({"id": NOTCH, "name": "Notch", "properties": []}),
        );
        let (resolver, _clock) = resolver(Arc::new(upstream));

        let err = resolver.resolve_by_uuid(NOTCH).await.unwrap_err();
        assert_eq!(err.stage(), Stage::Textures);
        assert_eq!(err.status(), 500);
    }

    #[tokio::test]
    async fn test_malformed_textures_property() {
        let upstream = StubUpstream::new().with_json(
            &format!("{SESSION}/session/minecraft/profile/{NOTCH}"),
            json!({
                "id": NOTCH,
                "name": "Notch",
                "properties": [{"name": "textures", "value": "%%% not base64 %%%"}]
            }),
        );
        let (resolver, _clock) = resolver(Arc::new(upstream));

        let err = resolver.resolve_by_uuid(NOTCH).await.unwrap_err();
        assert!(matches!(err, ResolveError::TextureParse(_)));
    }

    #[tokio::test]
    async fn test_history_failure_is_reported() {
        let upstream = StubUpstream::new()
            .with_json(
                &format!("{SESSION}/session/minecraft/profile/{NOTCH}"),
                session_body(NOTCH, "Notch", json!({"textures": {}})),
            )
            .with_status(&format!("{API}/user/profiles/{NOTCH}/names"), 429);
        let (resolver, _clock) = resolver(Arc::new(upstream));

        let err = resolver.resolve_by_uuid(NOTCH).await.unwrap_err();
        assert_eq!(err.stage(), Stage::History);
        assert_eq!(err.status(), 429);
        assert_eq!(err.message(), "Could not fetch name history");
    }

    #[tokio::test]
    async fn test_transport_failure() {
        let upstream = StubUpstream::new()
            .with_failure(&format!("{SESSION}/session/minecraft/profile/{NOTCH}"));
        let (resolver, _clock) = resolver(Arc::new(upstream));

        let err = resolver.resolve_by_uuid(NOTCH).await.unwrap_err();
        assert_eq!(err.stage(), Stage::Profile);
        assert_eq!(err.status(), 502);
        assert_eq!(err.message(), "Upstream unavailable");
    }

    #[tokio::test]
    async fn test_name_history_timestamps() {
        let upstream = StubUpstream::new()
            .with_json(
                &format!("{SESSION}/session/minecraft/profile/{NOTCH}"),
                session_body(NOTCH, "Jeb", json!({"textures": {}})),
            )
            .with_json(
                &format!("{API}/user/profiles/{NOTCH}/names"),
                json!([{"name": "Notch"}, {"name": "Jeb", "changedToAt": 1423059891}]),
            );
        let (resolver, _clock) = resolver(Arc::new(upstream));

        let profile = resolver.resolve_by_uuid(NOTCH).await.unwrap();

        assert_eq!(profile.name_history.len(), 2);
        assert_eq!(profile.name_history[0].changed_at, None);
        assert_eq!(
            profile.name_history[1].changed_at.unwrap().timestamp(),
            1423059891
        );
    }

    #[tokio::test]
    async fn test_no_skin_uses_default_model() {
        // odd parity UUID selects Alex, which is slim
        let alex_parity = "853c80ef3c3749fdaa49938b674adae6";
        let upstream = StubUpstream::new()
            .with_json(
                &format!("{SESSION}/session/minecraft/profile/{alex_parity}"),
                session_body(alex_parity, "jeb_", json!({"textures": {}})),
            )
            .with_json(
                &format!("{API}/user/profiles/{alex_parity}/names"),
                json!([{"name": "jeb_"}]),
            );
        let (resolver, clock) = resolver(Arc::new(upstream));

        let profile = resolver.resolve_by_uuid(alex_parity).await.unwrap();

        assert_eq!(profile.skin_url, None);
        assert_eq!(profile.cape_url, None);
        assert_eq!(profile.skin_model, SkinModel::Slim);
        // no texture timestamp, so the resolver's clock is used
        assert_eq!(profile.cached_at, clock.now());
    }

    #[tokio::test]
    async fn test_uuid_case_does_not_change_identity() {
        let jeb = "853c80ef3c3749fdaa49938b674adae6";
        let upstream = Arc::new(
            StubUpstream::new()
                .with_json(
                    &format!("{SESSION}/session/minecraft/profile/{jeb}"),
                    session_body(jeb, "jeb_", json!({"textures": {}})),
                )
                .with_json(
                    &format!("{API}/user/profiles/{jeb}/names"),
                    json!([{"name": "jeb_"}]),
                ),
        );
        let (resolver, _clock) = resolver(upstream.clone());

        let lower = resolver.resolve_by_uuid(jeb).await.unwrap();
        let upper = resolver
            .resolve_by_uuid("853C80EF-3C37-49FD-AA49-938B674ADAE6")
            .await
            .unwrap();

        assert_eq!(upper.uuid, lower.uuid);
        assert_eq!(upper.uuid.as_str(), jeb);
        assert_eq!(upper.uuid_dashed, "853c80ef-3c37-49fd-aa49-938b674adae6");
        assert_eq!(upper.skin_model, SkinModel::Slim);
        assert_eq!(upper.skin_model, lower.skin_model);
        // the second lookup is served from cache
        assert_eq!(upstream.total_calls(), 2);
    }

    #[tokio::test]
    async fn test_repeated_resolution_hits_cache() {
        let upstream = Arc::new(notch_upstream());
        let (resolver, clock) = resolver(upstream.clone());

        resolver.resolve_by_username("Notch", None).await.unwrap();
        clock.advance(chrono::Duration::seconds(30));
        resolver.resolve_by_username("Notch", None).await.unwrap();
        assert_eq!(upstream.total_calls(), 3);

        // session profiles go stale after a minute, names after an hour
        clock.advance(chrono::Duration::seconds(31));
        resolver.resolve_by_username("Notch", None).await.unwrap();
        assert_eq!(
            upstream.calls(&format!("{SESSION}/session/minecraft/profile/{NOTCH}")),
            2
        );
        assert_eq!(
            upstream.calls(&format!("{API}/users/profiles/minecraft/Notch")),
            1
        );
    }

    #[tokio::test]
    async fn test_resolve_dispatches_on_shape() {
        let upstream = Arc::new(notch_upstream());
        let (resolver, _clock) = resolver(upstream.clone());

        resolver.resolve(NOTCH).await.unwrap();
        assert_eq!(
            upstream.calls(&format!("{API}/users/profiles/minecraft/Notch")),
            0
        );

        resolver.resolve("Notch").await.unwrap();
        assert_eq!(
            upstream.calls(&format!("{API}/users/profiles/minecraft/Notch")),
            1
        );
    }

    #[tokio::test]
    async fn test_run_from_intermediate_state() {
        let upstream = Arc::new(notch_upstream());
        let (resolver, _clock) = resolver(upstream.clone());

        let uuid = validate(NOTCH).unwrap();
        let profile = resolver
            .run(ResolveState::FetchingProfile { uuid })
            .await
            .unwrap();

        assert_eq!(profile.name, "Notch");
        assert_eq!(upstream.total_calls(), 2);
    }

    #[tokio::test]
    async fn test_step_advances_one_stage() {
        let (resolver, _clock) = resolver(Arc::new(notch_upstream()));

        let next = resolver
            .step(ResolveState::ResolvingName {
                username: "Notch".to_string(),
                at: None,
            })
            .await
            .unwrap();

        assert_eq!(next.name(), "resolving-uuid");
        let ResolveState::ResolvingUuid { raw } = next else {
            panic!("expected ResolvingUuid");
        };
        assert_eq!(raw, NOTCH);
    }
}
