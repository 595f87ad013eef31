// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for the connection graph engine.
//!
//! Fixture builders panic on malformed input: they exist to keep tests
//! short, and a panic there is a broken test, not a runtime condition.
//!
//! # Modules
//!
//! - [`config`] - In-memory config store fake for testing without filesystem
//! - [`types`] - The canonical test type registry
//! - [`gcs`] - Codon, placeholder and wired-graph builders
//! - [`pools`] - Gene pools that time out or record their queries
#![forbid(unsafe_code)]
#![allow(clippy::expect_used, clippy::panic, clippy::missing_panics_doc)]

pub mod config;
pub mod gcs;
pub mod pools;
pub mod types;

pub use config::InMemoryConfigStore;
pub use gcs::{codon, empty, ept, iface, wire_greedily};
pub use pools::{RecordingPool, TimeoutPool};
pub use types::fixture_registry;
