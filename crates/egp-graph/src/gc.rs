// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Genetic codes: a connection graph plus the sub-GCs in rows A and B.
//!
//! A [`GeneticCode`] is the mutable working form. [`Freeze::freeze`] puts its
//! interfaces into canonical order, computes its structural digest and wraps
//! it in an `Arc`; frozen codes are never mutated again. Every structural
//! change thaws a copy.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use egp_types::TypeRegistry;

use crate::graph::{ConnectionGraph, RowInterfaces};
use crate::graph_type::GraphType;
use crate::interface::Interface;
use crate::row::{EndPointClass, Row};
use crate::validate::{Validity, Violation};

/// Domain prefix for genetic code digests.
const GC_DIGEST_DOMAIN: &[u8] = b"gc:";

static NO_ENDPOINTS: Interface = Interface::new();

/// BLAKE3 structural digest of a frozen genetic code.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct GcDigest(pub [u8; 32]);

impl GcDigest {
    /// View the digest as bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for GcDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Shared handle to a frozen genetic code.
pub type GcRef = Arc<FrozenGc>;

/// A connection graph and the sub-GCs occupying its A and B rows.
#[derive(Clone, Debug)]
pub struct GeneticCode {
    graph: ConnectionGraph,
    gca: Option<GcRef>,
    gcb: Option<GcRef>,
}

impl GeneticCode {
    /// A genetic code with no sub-GCs.
    pub fn new(graph: ConnectionGraph) -> Self {
        Self {
            graph,
            gca: None,
            gcb: None,
        }
    }

    /// A genetic code with the given sub-GCs.
    pub fn with_sub_gcs(graph: ConnectionGraph, gca: Option<GcRef>, gcb: Option<GcRef>) -> Self {
        Self { graph, gca, gcb }
    }

    /// An `Empty` placeholder with the given interface, used to seed wraps.
    pub fn empty(inputs: Interface, outputs: Interface) -> Self {
        let mut graph = ConnectionGraph::new(GraphType::Empty);
        graph.set_row(Row::I, RowInterfaces::new(Interface::new(), inputs));
        graph.set_row(Row::O, RowInterfaces::new(outputs, Interface::new()));
        Self::new(graph)
    }

    /// The connection graph.
    pub fn graph(&self) -> &ConnectionGraph {
        &self.graph
    }

    /// Mutable access to the connection graph.
    pub fn graph_mut(&mut self) -> &mut ConnectionGraph {
        &mut self.graph
    }

    /// Shorthand for the graph's type.
    pub fn graph_type(&self) -> GraphType {
        self.graph.graph_type()
    }

    /// The input interface (row I sources).
    pub fn inputs(&self) -> &Interface {
        self.graph
            .interface(Row::I, EndPointClass::Src)
            .unwrap_or(&NO_ENDPOINTS)
    }

    /// The output interface (row O destinations).
    pub fn outputs(&self) -> &Interface {
        self.graph
            .interface(Row::O, EndPointClass::Dst)
            .unwrap_or(&NO_ENDPOINTS)
    }

    /// The sub-GC in row A or B.
    pub fn sub_gc(&self, row: Row) -> Option<&GcRef> {
        match row {
            Row::A => self.gca.as_ref(),
            Row::B => self.gcb.as_ref(),
            _ => None,
        }
    }

    /// Places `gc` in row A or B, replacing both sides of the row with a
    /// mirror of its interface. Connections touching the row are dropped.
    pub fn set_sub_gc(&mut self, row: Row, gc: GcRef) {
        self.graph.set_row(row, mirror(&gc));
        self.attach_sub_gc(row, Some(gc));
    }

    /// Sets the sub-GC slot without touching the row.
    pub(crate) fn attach_sub_gc(&mut self, row: Row, gc: Option<GcRef>) {
        match row {
            Row::A => self.gca = gc,
            Row::B => self.gcb = gc,
            _ => {}
        }
    }

    /// Checks the graph, plus that rows A and B mirror their sub-GCs.
    pub fn validate(&self, registry: &TypeRegistry) -> Validity {
        self.graph
            .check_rows()
            .and_then(|()| self.check_sub_gcs())
            .and_then(|()| self.graph.check_wiring(registry))
            .into()
    }

    fn check_sub_gcs(&self) -> Result<(), Violation> {
        for row in [Row::A, Row::B] {
            match (self.graph.row(row), self.sub_gc(row)) {
                (None, None) => {}
                // A codon's A row describes its own body, not a sub-GC.
                (Some(_), None) if self.graph_type() == GraphType::Primitive => {}
                (Some(_), None) => return Err(Violation::MissingSubGraph(row)),
                (None, Some(_)) => return Err(Violation::SubGraphMismatch(row)),
                (Some(ifaces), Some(gc)) => {
                    if &ifaces.dst != gc.inputs() || &ifaces.src != gc.outputs() {
                        return Err(Violation::SubGraphMismatch(row));
                    }
                }
            }
        }
        Ok(())
    }

    fn compute_digest(&self) -> GcDigest {
        let mut hasher = blake3::Hasher::new();
        hasher.update(GC_DIGEST_DOMAIN);
        hasher.update(self.graph_type().name().as_bytes());
        hasher.update(&[0]);
        for (row, ifaces) in self.graph.rows() {
            hasher.update(&[row.tag()]);
            for iface in [&ifaces.dst, &ifaces.src] {
                hasher.update(&(iface.len() as u64).to_le_bytes());
                for ept in iface {
                    hasher.update(&(ept.len() as u64).to_le_bytes());
                    for uid in ept.flat() {
                        hasher.update(&uid.raw().to_le_bytes());
                    }
                }
            }
        }
        hasher.update(&(self.graph.connection_count() as u64).to_le_bytes());
        for (dst, src) in self.graph.connections() {
            hasher.update(&[dst.row.tag()]);
            hasher.update(&(dst.index as u64).to_le_bytes());
            hasher.update(&[src.row.tag()]);
            hasher.update(&(src.index as u64).to_le_bytes());
        }
        for sub in [&self.gca, &self.gcb] {
            match sub {
                Some(gc) => {
                    hasher.update(&[1]);
                    hasher.update(gc.digest().as_bytes());
                }
                None => {
                    hasher.update(&[0]);
                }
            }
        }
        GcDigest(*hasher.finalize().as_bytes())
    }
}

/// Row sides mirroring a sub-GC's interface.
pub(crate) fn mirror(gc: &GeneticCode) -> RowInterfaces {
    RowInterfaces::new(gc.inputs().clone(), gc.outputs().clone())
}

/// An immutable genetic code and its digest.
#[derive(Debug)]
pub struct FrozenGc {
    gc: GeneticCode,
    digest: GcDigest,
}

impl FrozenGc {
    /// Structural digest.
    pub fn digest(&self) -> GcDigest {
        self.digest
    }

    /// A mutable copy.
    pub fn thaw(&self) -> GeneticCode {
        self.gc.clone()
    }
}

impl Deref for FrozenGc {
    type Target = GeneticCode;

    fn deref(&self) -> &GeneticCode {
        &self.gc
    }
}

impl PartialEq for FrozenGc {
    fn eq(&self, other: &Self) -> bool {
        self.digest == other.digest
    }
}

impl Eq for FrozenGc {}

/// Conversion into a shared, immutable genetic code.
pub trait Freeze {
    /// Canonicalises, digests and freezes. Freezing a [`GcRef`] returns it
    /// unchanged.
    fn freeze(self) -> GcRef;
}

impl Freeze for GeneticCode {
    fn freeze(mut self) -> GcRef {
        self.graph.reorder();
        let digest = self.compute_digest();
        Arc::new(FrozenGc { gc: self, digest })
    }
}

impl Freeze for GcRef {
    fn freeze(self) -> GcRef {
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use egp_types::{Ept, TypeUid};

    fn scalar(xuid: u16) -> Ept {
        Ept::scalar(TypeUid::new(0, None, xuid).unwrap()).unwrap()
    }

    #[test]
    fn freezing_twice_is_a_no_op() {
        let gc = GeneticCode::empty(
            Interface::from_epts([scalar(2), scalar(1)]).unwrap(),
            Interface::from_epts([scalar(1)]).unwrap(),
        )
        .freeze();
        let again = Arc::clone(&gc).freeze();
        assert!(Arc::ptr_eq(&gc, &again));
        assert_eq!(gc.digest(), again.digest());
        assert!(gc.inputs().is_canonical());
    }

    #[test]
    fn digest_depends_on_structure_not_identity() {
        let a = GeneticCode::empty(Interface::from_epts([scalar(1)]).unwrap(), Interface::new());
        let b = a.clone();
        let c = GeneticCode::empty(Interface::new(), Interface::from_epts([scalar(1)]).unwrap());
        let (a, b, c) = (a.freeze(), b.freeze(), c.freeze());
        assert_eq!(a.digest(), b.digest());
        assert_ne!(a.digest(), c.digest());
        assert_eq!(a.digest().to_string().len(), 64);
    }

    #[test]
    fn thawed_copies_leave_the_original_untouched() {
        let frozen = GeneticCode::empty(Interface::from_epts([scalar(1)]).unwrap(), Interface::new())
            .freeze();
        let mut thawed = frozen.thaw();
        thawed
            .graph_mut()
            .push_endpoint(Row::I, EndPointClass::Src, scalar(4))
            .unwrap();
        assert_eq!(frozen.inputs().len(), 1);
        assert_ne!(thawed.freeze().digest(), frozen.digest());
    }
}
