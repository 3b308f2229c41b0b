use std::fmt;

use chrono::Utc;
use rand::Rng;
use rand::distr::Alphanumeric;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::StorageError;

const MAX_PATH_LEN: usize = 512;
const RANDOM_SUFFIX_LEN: usize = 8;

/// A validated object key inside a bucket.
///
/// Keys are relative, `/`-separated and restricted to `[a-zA-Z0-9/_.-]`, which
/// keeps them safe both as filesystem paths and as URL path segments.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ObjectPath(String);

impl ObjectPath {
    /// Validate an existing key.
    pub fn parse(path: &str) -> Result<Self, StorageError> {
        let invalid = |msg: &str| StorageError::InvalidPath(format!("{msg}: {path:?}"));

        if path.is_empty() {
            return Err(invalid("path cannot be empty"));
        }
        if path.len() > MAX_PATH_LEN {
            return Err(invalid("path exceeds maximum length"));
        }
        if path.starts_with('/') || path.ends_with('/') {
            return Err(invalid("path must not start or end with '/'"));
        }
        for segment in path.split('/') {
            if segment.is_empty() {
                return Err(invalid("path must not contain empty segments"));
            }
            if segment.starts_with('.') {
                return Err(invalid("path segments must not start with '.'"));
            }
        }
        if !path
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '-' | '_' | '.'))
        {
            return Err(invalid("path contains invalid characters"));
        }

        Ok(Self(path.to_string()))
    }

    /// Fresh key for an original product image:
    /// `{owner_id}/original/{timestamp}-{rand}.{ext}`.
    pub fn product_original(owner_id: Uuid, extension: &str) -> Result<Self, StorageError> {
        Self::parse(&format!(
            "{owner_id}/original/{}.{}",
            unique_stem(),
            normalize_extension(extension)?
        ))
    }

    /// Fresh key for a user avatar: `{owner_id}/avatar-{timestamp}-{rand}.{ext}`.
    pub fn avatar(owner_id: Uuid, extension: &str) -> Result<Self, StorageError> {
        Self::parse(&format!(
            "{owner_id}/avatar-{}.{}",
            unique_stem(),
            normalize_extension(extension)?
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The file extension, if any.
    pub fn extension(&self) -> Option<&str> {
        let file = self.0.rsplit('/').next()?;
        file.rsplit_once('.').map(|(_, ext)| ext)
    }
}

/// Millisecond timestamp plus a random suffix. A collision between two fresh
/// keys means the clock or the random source misbehaved.
fn unique_stem() -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(RANDOM_SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!("{}-{suffix}", Utc::now().timestamp_millis())
}

fn normalize_extension(extension: &str) -> Result<String, StorageError> {
    let ext = extension.trim().trim_start_matches('.').to_ascii_lowercase();
    if ext.is_empty() || ext.len() > 8 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(StorageError::InvalidPath(format!(
            "invalid file extension: {extension:?}"
        )));
    }
    Ok(ext)
}

impl fmt::Debug for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectPath({})", self.0)
    }
}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ObjectPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for ObjectPath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ObjectPath {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
