// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Genetic code builders.

use egp_graph::{
    ConnectionGraph, EndPointClass, EndPointRef, Freeze, GcRef, GeneticCode, GraphType,
    Interface, Row, RowInterfaces,
};
use egp_types::{Ept, TypeRegistry};

/// Parses a nominal type such as `list[int]`.
pub fn ept(registry: &TypeRegistry, nominal: &str) -> Ept {
    registry
        .parse(nominal)
        .unwrap_or_else(|e| panic!("fixture type {nominal:?}: {e}"))
}

/// An interface of nominal types, in the order given.
pub fn iface(registry: &TypeRegistry, nominals: &[&str]) -> Interface {
    Interface::from_epts(nominals.iter().map(|n| ept(registry, n))).expect("fixture interface fits")
}

/// A frozen codon (`Primitive`) with the given interface and no wiring.
pub fn codon(registry: &TypeRegistry, inputs: &[&str], outputs: &[&str]) -> GcRef {
    let mut graph = ConnectionGraph::new(GraphType::Primitive);
    graph.set_row(
        Row::I,
        RowInterfaces::new(Interface::new(), iface(registry, inputs)),
    );
    graph.set_row(
        Row::O,
        RowInterfaces::new(iface(registry, outputs), Interface::new()),
    );
    GeneticCode::new(graph).freeze()
}

/// A frozen `Empty` placeholder with the given interface.
pub fn empty(registry: &TypeRegistry, inputs: &[&str], outputs: &[&str]) -> GcRef {
    GeneticCode::empty(iface(registry, inputs), iface(registry, outputs)).freeze()
}

/// Connects every unconnected destination to the first legal, compatible
/// source in canonical order. Deterministic and random-free, for building
/// known-good graphs.
pub fn wire_greedily(gc: &mut GeneticCode, registry: &TypeRegistry) {
    let legal = gc.graph_type().connectivity();
    for dst in gc.graph().unconnected() {
        let graph = gc.graph();
        let dst_ept = graph
            .ept(dst.row, EndPointClass::Dst, dst.index)
            .expect("unconnected end points exist")
            .clone();
        let src = legal.legal_sources(dst.row).iter().find_map(|&row| {
            let len = graph.interface(row, EndPointClass::Src).map_or(0, Interface::len);
            (0..len).map(|i| EndPointRef::new(row, i)).find(|src| {
                graph
                    .source_ept(registry, *src)
                    .is_some_and(|s| registry.is_compatible(&s, &dst_ept))
            })
        });
        if let Some(src) = src {
            gc.graph_mut().connect(src, dst).expect("both ends exist");
        }
    }
}
