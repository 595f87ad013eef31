// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Blob storage for persisted engine settings.

use thiserror::Error;

/// Where persisted settings live.
///
/// Keys are flat names such as `stabilizer` or `stabilizer.fast`; see
/// [`check_key`]. Values are opaque bytes.
pub trait ConfigStore {
    /// The blob under `key`, or [`ConfigError::NotFound`].
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError>;
    /// Replaces the blob under `key`.
    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
    /// Every stored key, sorted.
    fn keys(&self) -> Result<Vec<String>, ConfigError>;
}

/// Failure reading, writing or interpreting persisted settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Nothing is stored under the key.
    #[error("no config stored under {0:?}")]
    NotFound(String),
    /// A key or profile name outside the accepted alphabet.
    #[error("{0:?} is not a usable config key")]
    InvalidKey(String),
    /// The backing storage failed.
    #[error("config {key:?}: {source}")]
    Io {
        /// Key being read or written.
        key: String,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },
    /// The stored blob is not the JSON expected.
    #[error("config {key:?} is malformed: {source}")]
    Malformed {
        /// Key whose blob failed to parse or render.
        key: String,
        /// Parser failure.
        #[source]
        source: serde_json::Error,
    },
    /// A value was read or offered but is out of range.
    #[error("invalid config {key:?}: {reason}")]
    Invalid {
        /// Key the value belongs to.
        key: String,
        /// What is wrong with it.
        reason: String,
    },
    /// A store-specific failure with no better variant.
    #[error("config store: {0}")]
    Backend(String),
}

/// Accepts keys of ASCII letters, digits, `-`, `_` and interior `.`.
///
/// # Errors
/// [`ConfigError::InvalidKey`] for anything else, including keys that could
/// name a path outside a store's root.
pub fn check_key(key: &str) -> Result<(), ConfigError> {
    let charset = key
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'));
    if key.is_empty() || !charset || key.starts_with('.') || key.ends_with('.') || key.contains("..") {
        return Err(ConfigError::InvalidKey(key.to_owned()));
    }
    Ok(())
}
