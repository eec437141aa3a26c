//! Version-4 UUID validation and normalization

use std::fmt;

use regex::Regex;
use serde::{Serialize, Serializer};

use crate::error::ValidationError;

lazy_static::lazy_static! {
    static ref DASHED: Regex = Regex::new(
        r"(?i)^[a-f\d]{8}-[a-f\d]{4}-4[a-f\d]{3}-[89ab][a-f\d]{3}-[a-f\d]{12}$"
    )
    .unwrap();
    static ref UNDASHED: Regex = Regex::new(
        r"(?i)^[a-f\d]{8}[a-f\d]{4}4[a-f\d]{3}[89ab][a-f\d]{3}[a-f\d]{12}$"
    )
    .unwrap();
}

/// A validated UUID in its undashed, lowercase 32 hex character form
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Uuid(String);

impl Uuid {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The canonical 8-4-4-4-12 rendering
    pub fn dashed(&self) -> String {
        let s = &self.0;
        format!(
            "{}-{}-{}-{}-{}",
            &s[0..8],
            &s[8..12],
            &s[12..16],
            &s[16..20],
            &s[20..32]
        )
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Uuid {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Validate a dashed or undashed UUIDv4 and return its undashed lowercase
/// form, so every spelling of an account maps to one cache key
pub fn validate(input: &str) -> std::result::Result<Uuid, ValidationError> {
    if UNDASHED.is_match(input) {
        return Ok(Uuid(input.to_ascii_lowercase()));
    }
    if DASHED.is_match(input) {
        return Ok(Uuid(input.split('-').collect::<String>().to_ascii_lowercase()));
    }
    Err(ValidationError {
        input: input.to_string(),
    })
}
