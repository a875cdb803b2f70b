//! Identifiers for claim records
//!
//! Claim identifiers are opaque strings assigned by the processing backend
//! (for example `CLM-2024-001`). The client only generates one itself when the
//! backend response does not carry an identifier.

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::CoreError;

/// Prefix used for client-generated claim identifiers
pub const CLAIM_KEY_PREFIX: &str = "CLM";

/// Unique key of a claim in the result store
///
/// Serializes as a bare string so it can be used directly as a JSON object key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimKey(String);

impl ClaimKey {
    /// Creates a key from a backend- or user-supplied identifier
    ///
    /// Surrounding whitespace is trimmed; a blank identifier is rejected.
    pub fn new(value: impl Into<String>) -> Result<Self, CoreError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(CoreError::validation("claim identifier must not be blank"));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Generates a fresh client-side identifier
    ///
    /// The suffix is taken from the random tail of a v7 UUID (48 random bits),
    /// so two clients generating keys in the same millisecond do not collide.
    pub fn generate() -> Self {
        let uuid = Uuid::now_v7().simple().to_string();
        let suffix = uuid[uuid.len() - 12..].to_uppercase();
        Self(format!("{}-{}-{}", CLAIM_KEY_PREFIX, Utc::now().year(), suffix))
    }

    /// Returns the key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the key, returning the inner string
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ClaimKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl FromStr for ClaimKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for ClaimKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ClaimKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}
