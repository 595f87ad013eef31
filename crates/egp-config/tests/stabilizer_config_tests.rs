// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(clippy::unwrap_used)]
//! Stabilizer configuration and profiles through the config service.

use egp_config::{ConfigError, StabilizerConfigService, STABILIZER_CONFIG_KEY};
use egp_dry_tests::InMemoryConfigStore;
use egp_graph::StabilizerConfig;

fn service(store: &InMemoryConfigStore) -> StabilizerConfigService<InMemoryConfigStore> {
    StabilizerConfigService::new(store.clone())
}

#[test]
fn missing_config_loads_defaults_without_saving() {
    let store = InMemoryConfigStore::new();
    assert_eq!(service(&store).load().unwrap(), StabilizerConfig::default());
    assert_eq!(store.save_count(), 0);
}

#[test]
fn saved_config_round_trips() {
    let store = InMemoryConfigStore::new();
    let config = StabilizerConfig {
        sse_limit: 7,
        seed: 42,
        ..StabilizerConfig::default()
    };
    service(&store).save(&config).unwrap();
    assert_eq!(store.stored_keys(), vec![STABILIZER_CONFIG_KEY]);
    assert_eq!(service(&store).load().unwrap(), config);
}

#[test]
fn partial_blob_fills_defaults() {
    let store = InMemoryConfigStore::with_blob(STABILIZER_CONFIG_KEY, br#"{"seed": 3}"#);
    let config = service(&store).load().unwrap();
    assert_eq!(config.seed, 3);
    assert_eq!(config.sse_limit, StabilizerConfig::default().sse_limit);
}

#[test]
fn out_of_range_values_are_rejected_both_ways() {
    let store = InMemoryConfigStore::with_blob(STABILIZER_CONFIG_KEY, br#"{"max_fan_out": 0}"#);
    assert!(matches!(
        service(&store).load(),
        Err(ConfigError::Invalid { key, .. }) if key == STABILIZER_CONFIG_KEY
    ));

    let bad = StabilizerConfig {
        candidate_limit: 0,
        ..StabilizerConfig::default()
    };
    assert!(matches!(service(&store).save(&bad), Err(ConfigError::Invalid { .. })));
    assert!(matches!(
        service(&store).save_profile("wide", &bad),
        Err(ConfigError::Invalid { key, .. }) if key == "stabilizer.wide"
    ));
    assert_eq!(store.save_count(), 0);
}

#[test]
fn store_failures_propagate() {
    let store = InMemoryConfigStore::new();
    store.set_fail_on_load(true);
    assert!(matches!(service(&store).load(), Err(ConfigError::Backend(_))));
}

#[test]
fn malformed_blobs_name_their_key() {
    let store = InMemoryConfigStore::with_blob(STABILIZER_CONFIG_KEY, b"{not json");
    assert!(matches!(
        service(&store).load(),
        Err(ConfigError::Malformed { key, .. }) if key == STABILIZER_CONFIG_KEY
    ));
    // Valid JSON that is not an object is just as unusable.
    let store = InMemoryConfigStore::with_blob(STABILIZER_CONFIG_KEY, b"[100]");
    assert!(matches!(service(&store).load(), Err(ConfigError::Malformed { .. })));
}

#[test]
fn profiles_store_only_their_differences() {
    let store = InMemoryConfigStore::new();
    let svc = service(&store);
    let base = StabilizerConfig {
        seed: 5,
        ..StabilizerConfig::default()
    };
    svc.save(&base).unwrap();
    let fast = StabilizerConfig {
        sse_limit: 10,
        ..base.clone()
    };
    svc.save_profile("fast", &fast).unwrap();

    let blob = store.peek("stabilizer.fast").unwrap();
    let stored: serde_json::Value = serde_json::from_slice(&blob).unwrap();
    assert_eq!(stored, serde_json::json!({ "sse_limit": 10 }));
    assert_eq!(svc.load_profile("fast").unwrap(), fast);
    assert_eq!(svc.profiles().unwrap(), vec!["fast"]);
}

#[test]
fn profiles_follow_later_base_changes() {
    let store = InMemoryConfigStore::with_blob("stabilizer.deep", br#"{"sse_limit": 500}"#);
    let svc = service(&store);
    svc.save(&StabilizerConfig {
        seed: 9,
        ..StabilizerConfig::default()
    })
    .unwrap();

    let deep = svc.load_profile("deep").unwrap();
    assert_eq!(deep.sse_limit, 500);
    assert_eq!(deep.seed, 9);
    assert_eq!(svc.load().unwrap().sse_limit, 100);
}

#[test]
fn unknown_and_badly_named_profiles() {
    let store = InMemoryConfigStore::new();
    let svc = service(&store);
    assert!(matches!(
        svc.load_profile("absent"),
        Err(ConfigError::NotFound(key)) if key == "stabilizer.absent"
    ));
    assert!(matches!(svc.load_profile("a.b"), Err(ConfigError::InvalidKey(_))));
    assert!(svc.profiles().unwrap().is_empty());
}
