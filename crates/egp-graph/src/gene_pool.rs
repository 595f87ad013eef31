// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The gene pool port: where the stabilizer looks for insertable graphs.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use egp_types::{Ept, TypeRegistry};
use thiserror::Error;

use crate::arena::GcArena;
use crate::gc::{GcDigest, GcRef};
use crate::graph_type::GraphType;

/// How a candidate's outputs must relate to the wanted type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum MatchMode {
    /// Some output has exactly the wanted type.
    Exact,
    /// Some output can feed the wanted type.
    Compatible,
}

/// A request for graphs that can supply one unconnected destination.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct CandidateQuery {
    /// Type of the destination to be fed.
    pub output: Ept,
    /// How outputs are matched against `output`.
    pub mode: MatchMode,
    /// Search this many tiers outward (at least 1).
    pub scope: u8,
    /// Give up after this long.
    pub timeout: Duration,
}

/// Summary of one graph the pool can supply.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Candidate {
    /// Digest to [`GenePool::fetch`] it by.
    pub digest: GcDigest,
    /// Its graph type.
    pub graph_type: GraphType,
    /// How often the pool has seen it; more is better.
    pub abundance: u64,
    /// Tier distance it was found at; less is better.
    pub proximity: u8,
}

/// Gene-pool failures.
#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum GenePoolError {
    /// The query did not finish in time. Treated as "no candidates".
    #[error("gene pool query timed out after {0:?}")]
    Timeout(Duration),
    /// Nothing with this digest is held.
    #[error("gene pool has no code {0}")]
    NotFound(GcDigest),
    /// The backing store failed.
    #[error("gene pool unavailable: {0}")]
    Unavailable(String),
}

/// Source of graphs for external insertion.
///
/// Implementations must return candidates in a deterministic order for a
/// given query and pool state, or stabilization stops being reproducible.
pub trait GenePool {
    /// Graphs exposing an output that matches `query`.
    ///
    /// # Errors
    /// [`GenePoolError::Timeout`] when `query.timeout` elapses; other variants
    /// for backend failures.
    fn find_insertion_candidates(
        &self,
        query: &CandidateQuery,
    ) -> Result<Vec<Candidate>, GenePoolError>;

    /// Loads a candidate.
    ///
    /// # Errors
    /// [`GenePoolError::NotFound`] for unknown digests.
    fn fetch(&self, digest: &GcDigest) -> Result<GcRef, GenePoolError>;
}

#[derive(Clone, Copy, Debug)]
struct PoolEntry {
    tier: u8,
    abundance: u64,
}

/// In-process gene pool over a [`GcArena`].
///
/// Each code sits in a tier (1 is nearest); a query with scope `n` sees
/// tiers `1..=n`. Adding a code again raises its abundance.
#[derive(Debug)]
pub struct MemoryGenePool {
    registry: Arc<TypeRegistry>,
    arena: GcArena,
    entries: RwLock<BTreeMap<GcDigest, PoolEntry>>,
}

impl MemoryGenePool {
    /// An empty pool matching types against `registry`.
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self {
            registry,
            arena: GcArena::new(),
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    /// Adds a frozen code at `tier` (clamped to at least 1), returning the
    /// interned handle.
    pub fn add(&self, gc: GcRef, tier: u8) -> GcRef {
        let gc = self.arena.intern(gc);
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let entry = entries.entry(gc.digest()).or_insert(PoolEntry {
            tier: tier.max(1),
            abundance: 0,
        });
        entry.tier = entry.tier.min(tier.max(1));
        entry.abundance += 1;
        gc
    }

    /// Number of distinct codes held.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// `true` when the pool holds nothing.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The backing arena.
    pub fn arena(&self) -> &GcArena {
        &self.arena
    }

    fn exposes(&self, gc: &GcRef, query: &CandidateQuery) -> bool {
        gc.outputs().iter().any(|out| match query.mode {
            MatchMode::Exact => *out == query.output,
            MatchMode::Compatible => self.registry.is_compatible(out, &query.output),
        })
    }
}

impl GenePool for MemoryGenePool {
    fn find_insertion_candidates(
        &self,
        query: &CandidateQuery,
    ) -> Result<Vec<Candidate>, GenePoolError> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        Ok(entries
            .iter()
            .filter(|(_, entry)| entry.tier <= query.scope)
            .filter_map(|(digest, entry)| {
                let gc = self.arena.get(digest)?;
                self.exposes(&gc, query).then_some(Candidate {
                    digest: *digest,
                    graph_type: gc.graph_type(),
                    abundance: entry.abundance,
                    proximity: entry.tier,
                })
            })
            .collect())
    }

    fn fetch(&self, digest: &GcDigest) -> Result<GcRef, GenePoolError> {
        self.arena
            .get(digest)
            .ok_or(GenePoolError::NotFound(*digest))
    }
}
