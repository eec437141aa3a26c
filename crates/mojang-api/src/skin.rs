//! Default skin selection for accounts without a custom skin

use crate::types::SkinModel;
use crate::uuid::Uuid;

/// The two built-in skins a client falls back to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkinVariant {
    Steve,
    Alex,
}

impl SkinVariant {
    /// UUID of the account whose skin is this default
    pub fn uuid(&self) -> &'static str {
        match self {
            Self::Steve => "8667ba71b85a4004af54457a9734eed7",
            Self::Alex => "6ab4317889fd490597f60f67d9d76fd9",
        }
    }

    pub fn model(&self) -> SkinModel {
        match self {
            Self::Steve => SkinModel::Classic,
            Self::Alex => SkinModel::Slim,
        }
    }
}

/// Pick the default skin for a UUID.
///
/// XORs the hex digits at offsets 7, 15, 23 and 31 of the undashed form:
/// an even result is Steve, an odd one Alex. [`Uuid`] is always lowercase,
/// so the digit mapping only has to handle `0-9a-f`.
pub fn select_default(uuid: &Uuid) -> SkinVariant {
    let hex = uuid.as_str().as_bytes();
    let sum = hex_value(hex[7]) ^ hex_value(hex[15]) ^ hex_value(hex[23]) ^ hex_value(hex[31]);
    if sum % 2 == 0 {
        SkinVariant::Steve
    } else {
        SkinVariant::Alex
    }
}

/// Hex digit to integer without validation
fn hex_value(c: u8) -> u32 {
    let c = c as u32;
    if c >= 97 {
        c.wrapping_sub(87)
    } else {
        c.wrapping_sub(48)
    }
}
