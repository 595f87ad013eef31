// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Persisted settings for the connection graph engine.
//!
//! [`StabilizerConfigService`] reads and writes [`egp_graph::StabilizerConfig`]
//! and its named profiles over any [`ConfigStore`]. [`FsConfigStore`] keeps
//! each key as a JSON file under the platform config directory.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]

mod fs;
mod stabilizer;
mod store;

/// Filesystem adapter.
pub use fs::FsConfigStore;
/// Typed stabilizer configuration access.
pub use stabilizer::{StabilizerConfigService, STABILIZER_CONFIG_KEY};
/// Storage port.
pub use store::{check_key, ConfigError, ConfigStore};
