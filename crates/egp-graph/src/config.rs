// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Stabilizer tuning.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tuning knobs for [`crate::Stabilizer`].
///
/// Every field has a default, so a partial JSON object deserialises.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilizerConfig {
    /// Repair attempts allowed across one top-level stabilization, including
    /// nested fetal graphs.
    pub sse_limit: usize,
    /// Most destinations a reused source may feed.
    pub max_fan_out: usize,
    /// Widest gene-pool search scope, in tiers.
    pub max_search_scope: u8,
    /// Most ranked candidates kept before the random pick.
    pub candidate_limit: usize,
    /// Gene-pool query timeout.
    pub external_timeout_ms: u64,
    /// Seed for the stabilizer's [`crate::Prng`].
    pub seed: u64,
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            sse_limit: 100,
            max_fan_out: 16,
            max_search_scope: 3,
            candidate_limit: 16,
            external_timeout_ms: 2000,
            seed: 0,
        }
    }
}

impl StabilizerConfig {
    /// Gene-pool timeout as a duration.
    pub fn external_timeout(&self) -> Duration {
        Duration::from_millis(self.external_timeout_ms)
    }

    /// Describes the first out-of-range field, if any.
    pub fn check(&self) -> Result<(), String> {
        if self.max_fan_out == 0 {
            return Err("max_fan_out must be at least 1".into());
        }
        if self.max_search_scope == 0 {
            return Err("max_search_scope must be at least 1".into());
        }
        if self.candidate_limit == 0 {
            return Err("candidate_limit must be at least 1".into());
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_takes_defaults() {
        let cfg: StabilizerConfig = serde_json::from_str(r#"{"sse_limit": 5, "seed": 9}"#).unwrap();
        assert_eq!(cfg.sse_limit, 5);
        assert_eq!(cfg.seed, 9);
        assert_eq!(cfg.max_fan_out, 16);
        assert_eq!(cfg.external_timeout(), Duration::from_secs(2));
        assert!(cfg.check().is_ok());
    }

    #[test]
    fn zero_limits_are_out_of_range() {
        let cfg = StabilizerConfig {
            candidate_limit: 0,
            ..StabilizerConfig::default()
        };
        assert!(cfg.check().is_err());
    }
}
