// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Content-addressed intern table for frozen genetic codes.

use std::sync::{Arc, RwLock};

use rustc_hash::FxHashMap;

use crate::gc::{Freeze, GcDigest, GcRef, GeneticCode};

/// Interns frozen genetic codes by digest so structurally identical codes
/// share one allocation.
///
/// Lookups take a read lock; interning and collection take the write lock.
/// The arena holds one strong reference per entry, so
/// [`GcArena::collect_garbage`] can drop exactly the entries nothing else
/// references. Collection is advisory: callers decide when to run it.
#[derive(Debug, Default)]
pub struct GcArena {
    entries: RwLock<FxHashMap<GcDigest, GcRef>>,
}

impl GcArena {
    /// An empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the interned code with `gc`'s digest, inserting `gc` if none.
    pub fn intern(&self, gc: GcRef) -> GcRef {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        Arc::clone(entries.entry(gc.digest()).or_insert(gc))
    }

    /// Freezes and interns a working genetic code.
    pub fn freeze(&self, gc: GeneticCode) -> GcRef {
        self.intern(gc.freeze())
    }

    /// The code with this digest, if interned.
    pub fn get(&self, digest: &GcDigest) -> Option<GcRef> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(digest)
            .cloned()
    }

    /// `true` when a code with this digest is interned.
    pub fn contains(&self, digest: &GcDigest) -> bool {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(digest)
    }

    /// Number of interned codes.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// `true` when nothing is interned.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Interned digests in ascending order.
    pub fn digests(&self) -> Vec<GcDigest> {
        let mut digests: Vec<GcDigest> = self
            .entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .copied()
            .collect();
        digests.sort_unstable();
        digests
    }

    /// Drops every entry referenced only by the arena, repeating until sub-GCs
    /// released by dropped parents are collected too. Returns how many
    /// entries were dropped.
    pub fn collect_garbage(&self) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        loop {
            let len = entries.len();
            entries.retain(|_, gc| Arc::strong_count(gc) > 1);
            if entries.len() == len {
                break;
            }
        }
        before - entries.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::graph::ConnectionGraph;
    use crate::graph_type::GraphType;
    use crate::interface::Interface;
    use crate::row::Row;
    use egp_types::{Ept, TypeUid};

    fn leaf(xuid: u16) -> GeneticCode {
        let ept = Ept::scalar(TypeUid::new(0, None, xuid).unwrap()).unwrap();
        GeneticCode::empty(Interface::from_epts([ept]).unwrap(), Interface::new())
    }

    #[test]
    fn identical_codes_share_one_entry() {
        let arena = GcArena::new();
        let a = arena.freeze(leaf(1));
        let b = arena.freeze(leaf(1));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(arena.len(), 1);
        assert_eq!(arena.get(&a.digest()).map(|gc| gc.digest()), Some(a.digest()));
    }

    #[test]
    fn collection_follows_released_sub_gcs() {
        let arena = GcArena::new();
        let child = arena.freeze(leaf(2));
        let mut parent = GeneticCode::new(ConnectionGraph::new(GraphType::Standard));
        parent.set_sub_gc(Row::A, Arc::clone(&child));
        let parent = arena.freeze(parent);
        let kept = arena.freeze(leaf(3));
        drop(child);
        assert_eq!(arena.collect_garbage(), 0);
        drop(parent);
        assert_eq!(arena.collect_garbage(), 2);
        assert_eq!(arena.digests(), vec![kept.digest()]);
    }
}
