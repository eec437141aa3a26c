//! HTTP server for profile and avatar endpoints
//!
//! Provides /health, /minecraft/username/{username}, /minecraft/uuid/{uuid},
//! /minecraft/user/{id}, /minecraft/avatar/{id}/{size} and POST /avatar.

use crate::error::AppError;
use crate::types::{AtQuery, AvatarRequest, HealthResponse};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use mojang_api::{Profile, ProfileResolver};
use skin_avatar::{
    clamp_size, texture_id_from_url, Avatar, AvatarCompositor, AvatarStatus, TextureSource,
    MIN_SIZE,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

const PROFILE_CACHE_CONTROL: &str = "public, max-age=60";
const AVATAR_CACHE_CONTROL: &str = "public, max-age=86400";

/// Shared state for the HTTP server
pub struct ServerState {
    pub resolver: ProfileResolver,
    pub compositor: AvatarCompositor,
    pub textures: Arc<dyn TextureSource>,
    pub started_at: DateTime<Utc>,
}

impl ServerState {
    pub fn new(
        resolver: ProfileResolver,
        compositor: AvatarCompositor,
        textures: Arc<dyn TextureSource>,
    ) -> Self {
        Self {
            resolver,
            compositor,
            textures,
            started_at: Utc::now(),
        }
    }
}

pub type SharedState = Arc<ServerState>;

/// Create the HTTP router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/minecraft/username/{username}", get(get_by_username))
        .route("/minecraft/uuid/{uuid}", get(get_by_uuid))
        .route("/minecraft/user/{id}", get(get_user))
        .route("/minecraft/avatar/{id}/{size}", get(get_avatar))
        .route("/avatar", post(post_avatar))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(state: SharedState, port: u16) -> std::io::Result<()> {
    let router = create_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await
}

/// Health check endpoint
async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let uptime_secs = (Utc::now() - state.started_at).num_seconds().max(0) as u64;

    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs,
        cache: state.resolver.cache_stats(),
    })
}

/// Resolve a profile by current (or historical, with `?at=`) username
async fn get_by_username(
    State(state): State<SharedState>,
    Path(username): Path<String>,
    Query(query): Query<AtQuery>,
) -> Result<Response, AppError> {
    let at = query.timestamp().transpose().map_err(AppError::BadRequest)?;
    let profile = state.resolver.resolve_by_username(&username, at).await?;
    Ok(profile_response(profile))
}

/// Resolve a profile by UUID, dashed or not
async fn get_by_uuid(
    State(state): State<SharedState>,
    Path(uuid): Path<String>,
) -> Result<Response, AppError> {
    let profile = state.resolver.resolve_by_uuid(&uuid).await?;
    Ok(profile_response(profile))
}

/// Resolve a profile from either a UUID or a username
async fn get_user(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let profile = state.resolver.resolve(&id).await?;
    Ok(profile_response(profile))
}

/// Render the avatar of a user's current skin
async fn get_avatar(
    State(state): State<SharedState>,
    Path((id, size)): Path<(String, String)>,
) -> Response {
    let size = size.parse::<f64>().unwrap_or(f64::NAN);

    let texture_id = match state.resolver.resolve(&id).await {
        Ok(profile) => profile
            .skin_url
            .as_deref()
            .and_then(texture_id_from_url)
            .map(str::to_string),
        Err(e) => {
            warn!(id = %id, stage = %e.stage(), error = %e, "Could not resolve avatar owner");
            None
        }
    };

    let avatar = match texture_id {
        Some(texture_id) => {
            state
                .compositor
                .render(state.textures.as_ref(), &texture_id, size)
                .await
        }
        None => state.compositor.fallback(clamp_size(size)),
    };

    png_response(avatar)
}

/// Render an avatar from a texture id. Any body that is not
/// `{texture, size}` gets the default head at the minimum size.
async fn post_avatar(State(state): State<SharedState>, body: Bytes) -> Response {
    let request = match serde_json::from_slice::<AvatarRequest>(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "Malformed avatar request");
            return png_response(state.compositor.fallback(MIN_SIZE));
        }
    };

    let texture_id = texture_id_from_url(&request.texture).unwrap_or(request.texture.as_str());
    let avatar = state
        .compositor
        .render(state.textures.as_ref(), texture_id, request.size)
        .await;

    png_response(avatar)
}

fn profile_response(profile: Profile) -> Response {
    (
        [(header::CACHE_CONTROL, PROFILE_CACHE_CONTROL)],
        Json(profile),
    )
        .into_response()
}

fn png_response(avatar: Avatar) -> Response {
    let status =
        StatusCode::from_u16(avatar.status.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = (status, [(header::CONTENT_TYPE, "image/png")], avatar.png).into_response();

    if avatar.status == AvatarStatus::Rendered {
        response.headers_mut().insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static(AVATAR_CACHE_CONTROL),
        );
    }
    response
}
