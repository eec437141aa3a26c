//! Error types for avatar rendering

use std::fmt;

/// Reasons a texture could not be turned into an avatar.
///
/// These never reach HTTP callers; they select the fallback image and end
/// up in the logs.
#[derive(Debug)]
pub enum AvatarError {
    /// The texture host could not be reached
    Http(reqwest::Error),
    /// The texture host answered with a non-success status
    Status(u16),
    /// The bytes are not a decodable image, or encoding failed
    Image(image::ImageError),
    /// The sheet is too small to contain the face and hat regions
    TextureTooSmall { width: u32, height: u32 },
    /// The bundled default could not be decoded at startup
    FallbackUnavailable,
}

impl fmt::Display for AvatarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "Texture HTTP error: {e}"),
            Self::Status(status) => write!(f, "Texture host returned status {status}"),
            Self::Image(e) => write!(f, "Image error: {e}"),
            Self::TextureTooSmall { width, height } => {
                write!(f, "Texture too small: {width}x{height}")
            }
            Self::FallbackUnavailable => write!(f, "Fallback image unavailable"),
        }
    }
}

impl std::error::Error for AvatarError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http(e) => Some(e),
            Self::Image(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AvatarError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err)
    }
}

impl From<image::ImageError> for AvatarError {
    fn from(err: image::ImageError) -> Self {
        Self::Image(err)
    }
}

pub type Result<T> = std::result::Result<T, AvatarError>;
