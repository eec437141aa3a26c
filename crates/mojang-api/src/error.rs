//! Error types for the Mojang API client

use std::fmt;

/// Input that is neither a dashed nor an undashed version-4 UUID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub input: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid UUID format: {}", self.input)
    }
}

impl std::error::Error for ValidationError {}

/// Failure to get any response out of an upstream endpoint
#[derive(Debug)]
pub enum NetworkError {
    /// DNS, connect, TLS or timeout failure
    Transport(reqwest::Error),
    /// A 200 response whose body was not JSON
    Decode(String),
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "Upstream transport error: {e}"),
            Self::Decode(msg) => write!(f, "Upstream body error: {msg}"),
        }
    }
}

impl std::error::Error for NetworkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport(e) => Some(e),
            Self::Decode(_) => None,
        }
    }
}

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err)
        }
    }
}

/// Resolution stage a profile lookup failed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Format,
    UuidLookup,
    Profile,
    Textures,
    History,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Format => "format",
            Self::UuidLookup => "uuid-lookup",
            Self::Profile => "profile",
            Self::Textures => "textures",
            Self::History => "history",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal failure of a profile resolution.
///
/// Every variant maps onto a stage, an HTTP status and a user-facing
/// message, see [`ResolveError::stage`], [`ResolveError::status`] and
/// [`ResolveError::message`].
#[derive(Debug)]
pub enum ResolveError {
    /// The UUID given by the caller is malformed
    Validation(ValidationError),
    /// An upstream lookup answered with something other than a usable 200
    UpstreamNotFound {
        stage: Stage,
        status: u16,
        message: String,
    },
    /// An upstream lookup could not be completed at all
    UpstreamTransport { stage: Stage, source: NetworkError },
    /// The session profile has no decodable textures property
    TextureParse(String),
}

impl ResolveError {
    pub(crate) fn upstream(stage: Stage, status: u16, message: &str) -> Self {
        Self::UpstreamNotFound {
            stage,
            status,
            message: message.to_string(),
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            Self::Validation(_) => Stage::Format,
            Self::UpstreamNotFound { stage, .. } => *stage,
            Self::UpstreamTransport { stage, .. } => *stage,
            Self::TextureParse(_) => Stage::Textures,
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::UpstreamNotFound { status, .. } => *status,
            Self::UpstreamTransport { .. } => 502,
            Self::TextureParse(_) => 500,
        }
    }

    /// Message safe to show to callers; transport details stay in the logs
    pub fn message(&self) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::UpstreamNotFound { message, .. } => message.clone(),
            Self::UpstreamTransport { .. } => "Upstream unavailable".to_string(),
            Self::TextureParse(_) => "Could not parse textures".to_string(),
        }
    }
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(e) => write!(f, "{e}"),
            Self::UpstreamNotFound {
                stage,
                status,
                message,
            } => write!(f, "{message} ({stage}, status {status})"),
            Self::UpstreamTransport { stage, source } => write!(f, "{stage}: {source}"),
            Self::TextureParse(msg) => write!(f, "Could not parse textures: {msg}"),
        }
    }
}

impl std::error::Error for ResolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Validation(e) => Some(e),
            Self::UpstreamTransport { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ValidationError> for ResolveError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

pub type Result<T> = std::result::Result<T, ResolveError>;
