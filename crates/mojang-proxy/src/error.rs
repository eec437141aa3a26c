//! Error types for the Mojang proxy

use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mojang_api::{ResolveError, Stage};
use serde_json::json;

/// Request error rendered as a `{status, message}` envelope
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Resolve(ResolveError),
}

impl AppError {
    /// HTTP status of the envelope. Upstream answers below 400 (Mojang
    /// replies 204 for unknown names) still mean nothing was found.
    pub fn status(&self) -> StatusCode {
        let code = match self {
            AppError::BadRequest(_) => 400,
            AppError::Resolve(e) => e.status(),
        };
        match code {
            0..=399 => StatusCode::NOT_FOUND,
            _ => StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }

    pub fn message(&self) -> String {
        match self {
            AppError::BadRequest(msg) => msg.clone(),
            AppError::Resolve(e) => e.message(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            AppError::Resolve(e @ ResolveError::UpstreamTransport { .. }) => {
                tracing::error!(stage = %e.stage(), error = %e, "Upstream request failed");
            }
            AppError::Resolve(e) if e.stage() == Stage::Textures => {
                tracing::error!(error = %e, "Texture property unusable");
            }
            AppError::Resolve(e) => {
                tracing::debug!(stage = %e.stage(), error = %e, "Resolution failed");
            }
            AppError::BadRequest(msg) => {
                tracing::debug!(error = %msg, "Bad request");
            }
        }

        let body = json!({
            "status": status.as_u16(),
            "message": self.message(),
        });
        (status, axum::Json(body)).into_response()
    }
}

impl From<ResolveError> for AppError {
    fn from(e: ResolveError) -> Self {
        AppError::Resolve(e)
    }
}

/// Startup failures returned from `main`
#[derive(Debug)]
pub enum ProxyError {
    Config(String),
    Io(Box<std::io::Error>),
}

impl fmt::Display for ProxyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyError::Config(msg) => write!(f, "Configuration error: {}", msg),
            ProxyError::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for ProxyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProxyError::Io(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ProxyError {
    fn from(err: std::io::Error) -> Self {
        ProxyError::Io(Box::new(err))
    }
}

impl From<tracing_subscriber::filter::ParseError> for ProxyError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        ProxyError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ProxyError>;
