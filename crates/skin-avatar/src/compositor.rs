//! Face + hat compositing and nearest-neighbour scaling

use std::io::Cursor;

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, RgbaImage};
use tracing::{debug, error, warn};

use crate::error::{AvatarError, Result};
use crate::texture::TextureSource;

pub const MIN_SIZE: u32 = 8;
pub const MAX_SIZE: u32 = 512;

/// Side of the face and hat regions on a skin sheet
const REGION: u32 = 8;
const FACE_OFFSET: (u32, u32) = (8, 8);
const HAT_OFFSET: (u32, u32) = (40, 8);

/// Default 8x8 head served when a texture cannot be used
static DEFAULT_HEAD: &[u8] = include_bytes!("../assets/steve.png");

/// How an avatar came to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvatarStatus {
    /// Rendered from the requested texture
    Rendered,
    /// The default head, scaled to the requested size
    Fallback,
    /// The default head as bundled, unscaled
    Unresized,
}

impl AvatarStatus {
    /// HTTP status that accompanies the image
    pub fn code(&self) -> u16 {
        match self {
            Self::Rendered => 200,
            Self::Fallback => 404,
            Self::Unresized => 500,
        }
    }
}

/// A PNG ready to send
#[derive(Debug, Clone)]
pub struct Avatar {
    pub png: Vec<u8>,
    pub status: AvatarStatus,
}

/// Round a requested size up and clamp it to [`MIN_SIZE`, `MAX_SIZE`]
pub fn clamp_size(size: f64) -> u32 {
    if size.is_nan() {
        return MIN_SIZE;
    }
    size.ceil().clamp(MIN_SIZE as f64, MAX_SIZE as f64) as u32
}

/// Renders helm avatars, holding the decoded default head for fallbacks
pub struct AvatarCompositor {
    default_png: &'static [u8],
    default_head: Option<RgbaImage>,
}

impl AvatarCompositor {
    pub fn new() -> Self {
        Self::with_default(DEFAULT_HEAD)
    }

    /// Use a different default head. It is decoded once, here.
    pub fn with_default(png: &'static [u8]) -> Self {
        let default_head = match image::load_from_memory(png) {
            Ok(img) => Some(img.to_rgba8()),
            Err(e) => {
                error!(error = %e, "Failed to decode default head");
                None
            }
        };

        Self {
            default_png: png,
            default_head,
        }
    }

    /// Render an avatar from raw skin texture bytes
    pub fn composite(&self, texture: &[u8], size: f64) -> Avatar {
        let size = clamp_size(size);
        match render_helm(texture, size) {
            Ok(png) => Avatar {
                png,
                status: AvatarStatus::Rendered,
            },
            Err(e) => {
                warn!(error = %e, size, "Could not render texture, using default head");
                self.fallback(size)
            }
        }
    }

    /// Fetch a texture by id and render it
    pub async fn render<S>(&self, source: &S, texture_id: &str, size: f64) -> Avatar
    where
        S: TextureSource + ?Sized,
    {
        match source.fetch_texture(texture_id).await {
            Ok(texture) => self.composite(&texture, size),
            Err(e) => {
                warn!(texture_id, error = %e, "Could not fetch texture, using default head");
                self.fallback(clamp_size(size))
            }
        }
    }

    /// The default head at `size`, or as bundled if scaling it fails
    pub fn fallback(&self, size: u32) -> Avatar {
        let size = size.clamp(MIN_SIZE, MAX_SIZE);
        let scaled = self
            .default_head
            .as_ref()
            .ok_or(AvatarError::FallbackUnavailable)
            .and_then(|head| encode_png(&scale_nearest(head, size)));

        match scaled {
            Ok(png) => Avatar {
                png,
                status: AvatarStatus::Fallback,
            },
            Err(e) => {
                error!(error = %e, size, "Could not scale default head");
                Avatar {
                    png: self.default_png.to_vec(),
                    status: AvatarStatus::Unresized,
                }
            }
        }
    }
}

impl Default for AvatarCompositor {
    fn default() -> Self {
        Self::new()
    }
}

fn render_helm(texture: &[u8], size: u32) -> Result<Vec<u8>> {
    let sheet = image::load_from_memory(texture)?.to_rgba8();
    let helm = extract_helm(&sheet)?;
    debug!(size, "Rendered helm");
    encode_png(&scale_nearest(&helm, size))
}

/// Cut the face out of a skin sheet and alpha-composite the hat over it
pub fn extract_helm(sheet: &RgbaImage) -> Result<RgbaImage> {
    let (width, height) = sheet.dimensions();
    if width < HAT_OFFSET.0 + REGION || height < HAT_OFFSET.1 + REGION {
        return Err(AvatarError::TextureTooSmall { width, height });
    }

    let hat = imageops::crop_imm(sheet, HAT_OFFSET.0, HAT_OFFSET.1, REGION, REGION).to_image();
    let mut face =
        imageops::crop_imm(sheet, FACE_OFFSET.0, FACE_OFFSET.1, REGION, REGION).to_image();
    imageops::overlay(&mut face, &hat, 0, 0);
    Ok(face)
}

/// Nearest-neighbour resize sampled at pixel centres, so no colours blend
fn scale_nearest(img: &RgbaImage, size: u32) -> RgbaImage {
    imageops::resize(img, size, size, FilterType::Nearest)
}

fn encode_png(img: &RgbaImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    DynamicImage::ImageRgba8(img.clone()).write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)?;
    Ok(buffer)
}
