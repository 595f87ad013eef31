// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Connection graphs for genetic codes.
//!
//! A genetic code (GC) is a typed wiring diagram: an input row `I`, an output
//! row `O`, up to two embedded sub-GCs in rows `A` and `B`, and for branching
//! and looping graph types a handful of control rows. [`ConnectionGraph`]
//! holds the rows and the destination → source connections; [`GraphType`]
//! says which rows and which row pairs are legal.
//!
//! Evolution inserts one GC into another ([`insertion`]) and leaves some
//! destinations unconnected; the [`Stabilizer`] repairs them until the
//! result validates. Finished codes are frozen into shared, immutable
//! [`GcRef`]s identified by a BLAKE3 [`GcDigest`].
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
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::unreadable_literal,
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions,
    clippy::cast_possible_truncation,
    clippy::cast_lossless,
    clippy::redundant_pub_crate,
    clippy::missing_panics_doc,
    clippy::use_self
)]

mod arena;
mod config;
mod endpoint;
mod error;
mod gc;
mod gene_pool;
mod graph;
mod graph_type;
pub mod insertion;
mod interface;
mod json;
mod rng;
mod row;
mod stabilize;
mod validate;

/// Content-addressed intern table.
pub use arena::GcArena;
/// Stabilizer tuning.
pub use config::StabilizerConfig;
/// End point identity.
pub use endpoint::{EndPoint, EndPointRef};
/// Engine errors.
pub use error::GraphError;
/// Genetic codes and freezing.
pub use gc::{Freeze, FrozenGc, GcDigest, GcRef, GeneticCode};
/// The gene pool port and its in-memory adapter.
pub use gene_pool::{
    Candidate, CandidateQuery, GenePool, GenePoolError, MatchMode, MemoryGenePool,
};
/// Rows and the connection relation.
pub use graph::{ConnectionGraph, RowInterfaces};
/// Graph types and their tables.
pub use graph_type::{ConnectivityTable, GraphType, RowPresence};
/// Insertion operations.
pub use insertion::{Above, InsertOp, Insertion};
/// Interfaces.
pub use interface::{Interface, MAX_INTERFACE_ELEMENTS};
/// Deterministic randomness.
pub use rng::Prng;
/// Row identifiers.
pub use row::{EndPointClass, Row};
/// SSE repair.
pub use stabilize::Stabilizer;
/// Validation outcomes.
pub use validate::{Validity, Violation};
