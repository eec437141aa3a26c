//! Skin Avatar Renderer
//!
//! Cuts the face and hat layers out of a Minecraft skin sheet, stacks them
//! into the classic "helm" head, and scales it with nearest-neighbour
//! sampling. Rendering never fails: any problem with the texture degrades
//! to a bundled default head.

mod compositor;
mod error;
mod texture;

pub use compositor::{
    clamp_size, extract_helm, Avatar, AvatarCompositor, AvatarStatus, MAX_SIZE, MIN_SIZE,
};
pub use error::{AvatarError, Result};
pub use texture::{texture_id_from_url, TextureClient, TextureSource};
