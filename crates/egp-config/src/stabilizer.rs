// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Persisted [`StabilizerConfig`] and its named profiles.
//!
//! The base configuration lives under [`STABILIZER_CONFIG_KEY`]. A profile
//! `name` lives under `stabilizer.<name>` and stores only the fields it
//! changes; loading it layers those fields over the base.

use egp_graph::StabilizerConfig;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::store::{ConfigError, ConfigStore};

/// Key the base stabilizer configuration is stored under.
pub const STABILIZER_CONFIG_KEY: &str = "stabilizer";

/// Loads and stores [`StabilizerConfig`] through a [`ConfigStore`].
///
/// Every value is range-checked on the way in and on the way out.
#[derive(Clone, Debug)]
pub struct StabilizerConfigService<S> {
    store: S,
}

impl<S> StabilizerConfigService<S> {
    /// A service over `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Gives the store back.
    pub fn into_inner(self) -> S {
        self.store
    }
}

impl<S: ConfigStore> StabilizerConfigService<S> {
    /// The base configuration; defaults when nothing (or an empty blob) is
    /// stored. Missing fields take their defaults.
    ///
    /// # Errors
    /// [`ConfigError::Malformed`] for non-JSON blobs,
    /// [`ConfigError::Invalid`] for out-of-range values, or a store error.
    pub fn load(&self) -> Result<StabilizerConfig, ConfigError> {
        let Some(fields) = self.fields(STABILIZER_CONFIG_KEY)? else {
            debug!("no stored stabilizer config; using defaults");
            return Ok(StabilizerConfig::default());
        };
        decode(STABILIZER_CONFIG_KEY, fields)
    }

    /// Replaces the base configuration.
    ///
    /// # Errors
    /// [`ConfigError::Invalid`] for out-of-range values, or a store error.
    pub fn save(&self, config: &StabilizerConfig) -> Result<(), ConfigError> {
        self.put(STABILIZER_CONFIG_KEY, config)
    }

    /// The base configuration with profile `name` layered over it.
    ///
    /// # Errors
    /// [`ConfigError::NotFound`] when the profile does not exist,
    /// [`ConfigError::InvalidKey`] for a bad name, or any [`Self::load`]
    /// error.
    pub fn load_profile(&self, name: &str) -> Result<StabilizerConfig, ConfigError> {
        let key = profile_key(name)?;
        let overrides = self
            .fields(&key)?
            .ok_or_else(|| ConfigError::NotFound(key.clone()))?;
        let mut fields = match to_value(&key, &self.load()?)? {
            Value::Object(fields) => fields,
            _ => Map::new(),
        };
        fields.extend(overrides);
        let config = decode(&key, fields)?;
        info!(profile = name, seed = config.seed, "stabilizer profile loaded");
        Ok(config)
    }

    /// Stores `config` as profile `name`, keeping only the fields that
    /// differ from the base.
    ///
    /// # Errors
    /// [`ConfigError::InvalidKey`] for a bad name, [`ConfigError::Invalid`]
    /// for out-of-range values, or a store error.
    pub fn save_profile(&self, name: &str, config: &StabilizerConfig) -> Result<(), ConfigError> {
        let key = profile_key(name)?;
        check(&key, config)?;
        let base = to_value(STABILIZER_CONFIG_KEY, &self.load()?)?;
        let Value::Object(mut fields) = to_value(&key, config)? else {
            return Err(ConfigError::Invalid {
                key,
                reason: "not an object".into(),
            });
        };
        fields.retain(|field, value| base.get(field) != Some(value));
        self.write(&key, &Value::Object(fields))
    }

    /// Names of the stored profiles, sorted.
    ///
    /// # Errors
    /// Any store error.
    pub fn profiles(&self) -> Result<Vec<String>, ConfigError> {
        Ok(self
            .store
            .keys()?
            .into_iter()
            .filter_map(|key| {
                key.strip_prefix(STABILIZER_CONFIG_KEY)
                    .and_then(|rest| rest.strip_prefix('.'))
                    .map(str::to_owned)
            })
            .collect())
    }

    /// The JSON object stored under `key`, `None` when absent or empty.
    fn fields(&self, key: &str) -> Result<Option<Map<String, Value>>, ConfigError> {
        let bytes = match self.store.load_raw(key) {
            Ok(bytes) if bytes.is_empty() => return Ok(None),
            Ok(bytes) => bytes,
            Err(ConfigError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| malformed(key, source))
    }

    fn put(&self, key: &str, config: &StabilizerConfig) -> Result<(), ConfigError> {
        check(key, config)?;
        self.write(key, &to_value(key, config)?)
    }

    fn write(&self, key: &str, value: &Value) -> Result<(), ConfigError> {
        let data = serde_json::to_vec_pretty(value).map_err(|source| malformed(key, source))?;
        self.store.save_raw(key, &data)
    }
}

fn profile_key(name: &str) -> Result<String, ConfigError> {
    // Dots would make `stabilizer.<name>` ambiguous.
    let usable = !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_'));
    if !usable {
        return Err(ConfigError::InvalidKey(name.to_owned()));
    }
    Ok(format!("{STABILIZER_CONFIG_KEY}.{name}"))
}

fn decode(key: &str, fields: Map<String, Value>) -> Result<StabilizerConfig, ConfigError> {
    let config: StabilizerConfig =
        serde_json::from_value(Value::Object(fields)).map_err(|source| malformed(key, source))?;
    check(key, &config)?;
    Ok(config)
}

fn to_value(key: &str, config: &StabilizerConfig) -> Result<Value, ConfigError> {
    serde_json::to_value(config).map_err(|source| malformed(key, source))
}

fn check(key: &str, config: &StabilizerConfig) -> Result<(), ConfigError> {
    config.check().map_err(|reason| ConfigError::Invalid {
        key: key.to_owned(),
        reason,
    })
}

fn malformed(key: &str, source: serde_json::Error) -> ConfigError {
    ConfigError::Malformed {
        key: key.to_owned(),
        source,
    }
}
