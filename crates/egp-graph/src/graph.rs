// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The connection graph: typed rows plus the destination → source relation.

use std::collections::BTreeMap;

use egp_types::Ept;

use crate::endpoint::{EndPoint, EndPointRef};
use crate::error::GraphError;
use crate::graph_type::GraphType;
use crate::interface::Interface;
use crate::row::{EndPointClass, Row};

/// Both sides of one row.
#[derive(Clone, Default, PartialEq, Eq, Hash, Debug)]
pub struct RowInterfaces {
    /// Consuming side.
    pub dst: Interface,
    /// Providing side.
    pub src: Interface,
}

impl RowInterfaces {
    /// Builds a row from its two sides.
    pub fn new(dst: Interface, src: Interface) -> Self {
        Self { dst, src }
    }

    /// The side of the given class.
    pub fn side(&self, class: EndPointClass) -> &Interface {
        match class {
            EndPointClass::Src => &self.src,
            EndPointClass::Dst => &self.dst,
        }
    }

    fn side_mut(&mut self, class: EndPointClass) -> &mut Interface {
        match class {
            EndPointClass::Src => &mut self.src,
            EndPointClass::Dst => &mut self.dst,
        }
    }
}

/// Rows tagged with a [`GraphType`] and the connections between them.
///
/// Connections map each destination to at most one source, so "one
/// reference per destination" holds by construction. A source may feed any
/// number of destinations. Endpoint identity lives in the row interfaces;
/// connection state lives only here, and every index shift produced by
/// inserting, removing or reordering end points is applied to it.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct ConnectionGraph {
    graph_type: GraphType,
    rows: BTreeMap<Row, RowInterfaces>,
    connections: BTreeMap<EndPointRef, EndPointRef>,
}

impl ConnectionGraph {
    /// A graph of the given type with no rows.
    pub fn new(graph_type: GraphType) -> Self {
        Self {
            graph_type,
            rows: BTreeMap::new(),
            connections: BTreeMap::new(),
        }
    }

    /// The graph type.
    pub fn graph_type(&self) -> GraphType {
        self.graph_type
    }

    /// `true` when `row` is present.
    pub fn has_row(&self, row: Row) -> bool {
        self.rows.contains_key(&row)
    }

    /// Both sides of `row`, if present.
    pub fn row(&self, row: Row) -> Option<&RowInterfaces> {
        self.rows.get(&row)
    }

    /// Present rows in canonical order.
    pub fn rows(&self) -> impl Iterator<Item = (Row, &RowInterfaces)> {
        self.rows.iter().map(|(row, ifaces)| (*row, ifaces))
    }

    /// Marks `row` present, with empty sides if it was absent.
    pub fn add_row(&mut self, row: Row) {
        self.rows.entry(row).or_default();
    }

    /// Replaces both sides of `row`. Connections into or out of the row are
    /// dropped.
    pub fn set_row(&mut self, row: Row, ifaces: RowInterfaces) {
        self.connections.retain(|dst, src| dst.row != row && src.row != row);
        self.rows.insert(row, ifaces);
    }

    /// Removes `row` and every connection touching it.
    pub fn remove_row(&mut self, row: Row) -> Option<RowInterfaces> {
        self.connections.retain(|dst, src| dst.row != row && src.row != row);
        self.rows.remove(&row)
    }

    /// One side of `row`, if the row is present.
    pub fn interface(&self, row: Row, class: EndPointClass) -> Option<&Interface> {
        self.rows.get(&row).map(|r| r.side(class))
    }

    /// Type of one end point.
    pub fn ept(&self, row: Row, class: EndPointClass, index: usize) -> Option<&Ept> {
        self.interface(row, class).and_then(|iface| iface.get(index))
    }

    /// Every end point of one class in canonical (row, index) order.
    pub fn endpoints(&self, class: EndPointClass) -> impl Iterator<Item = EndPoint<'_>> {
        self.rows.iter().flat_map(move |(row, ifaces)| {
            ifaces
                .side(class)
                .iter()
                .enumerate()
                .map(move |(index, ept)| EndPoint {
                    row: *row,
                    index,
                    class,
                    ept,
                })
        })
    }

    fn side_mut(&mut self, row: Row, class: EndPointClass) -> &mut Interface {
        self.rows.entry(row).or_default().side_mut(class)
    }

    /// Appends an end point to `row` (adding the row if needed), returning its
    /// index. No existing reference moves.
    ///
    /// # Errors
    /// [`GraphError::InterfaceOverflow`].
    pub fn push_endpoint(
        &mut self,
        row: Row,
        class: EndPointClass,
        ept: Ept,
    ) -> Result<usize, GraphError> {
        self.side_mut(row, class).push(ept)
    }

    /// Inserts an end point in canonical position (after equal types),
    /// shifting the references of later end points.
    ///
    /// # Errors
    /// [`GraphError::InterfaceOverflow`].
    pub fn insert_endpoint(
        &mut self,
        row: Row,
        class: EndPointClass,
        ept: Ept,
    ) -> Result<usize, GraphError> {
        let index = self.side_mut(row, class).insert_endpoint(ept)?;
        self.remap(row, class, |i| Some(if i >= index { i + 1 } else { i }));
        Ok(index)
    }

    /// Removes an end point and every connection it takes part in, shifting
    /// the references of later end points down.
    ///
    /// # Errors
    /// [`GraphError::EndpointOutOfRange`].
    pub fn remove_endpoint(
        &mut self,
        row: Row,
        class: EndPointClass,
        index: usize,
    ) -> Result<Ept, GraphError> {
        let ept = self.side_mut(row, class).remove_endpoint(index)?;
        self.remap(row, class, |i| match i.cmp(&index) {
            std::cmp::Ordering::Less => Some(i),
            std::cmp::Ordering::Equal => None,
            std::cmp::Ordering::Greater => Some(i - 1),
        });
        Ok(ept)
    }

    /// Stable-sorts one side into canonical order, remapping connections.
    /// Returns the `old → new` index permutation.
    pub fn reorder_side(&mut self, row: Row, class: EndPointClass) -> Vec<usize> {
        let Some(ifaces) = self.rows.get_mut(&row) else {
            return Vec::new();
        };
        let perm = ifaces.side_mut(class).reorder();
        self.remap(row, class, |i| perm.get(i).copied());
        perm
    }

    /// Puts every interface into canonical order.
    pub fn reorder(&mut self) {
        let rows: Vec<Row> = self.rows.keys().copied().collect();
        for row in rows {
            for class in [EndPointClass::Dst, EndPointClass::Src] {
                if !self.rows[&row].side(class).is_canonical() {
                    self.reorder_side(row, class);
                }
            }
        }
    }

    /// Rewrites every reference to `(row, class)` through `f`; `None` drops
    /// the connection.
    fn remap(&mut self, row: Row, class: EndPointClass, f: impl Fn(usize) -> Option<usize>) {
        let apply = |r: EndPointRef| -> Option<EndPointRef> {
            if r.row == row {
                f(r.index).map(|index| EndPointRef::new(row, index))
            } else {
                Some(r)
            }
        };
        let old = std::mem::take(&mut self.connections);
        self.connections = old
            .into_iter()
            .filter_map(|(dst, src)| match class {
                EndPointClass::Dst => apply(dst).map(|dst| (dst, src)),
                EndPointClass::Src => apply(src).map(|src| (dst, src)),
            })
            .collect();
    }

    /// Connects `src` to `dst`, returning the source `dst` was previously
    /// connected to.
    ///
    /// Only existence is checked here; legality and type compatibility are
    /// the validator's concern.
    ///
    /// # Errors
    /// [`GraphError::EndpointOutOfRange`] when either end point is missing.
    pub fn connect(
        &mut self,
        src: EndPointRef,
        dst: EndPointRef,
    ) -> Result<Option<EndPointRef>, GraphError> {
        self.check_exists(src, EndPointClass::Src)?;
        self.check_exists(dst, EndPointClass::Dst)?;
        Ok(self.connections.insert(dst, src))
    }

    fn check_exists(&self, r: EndPointRef, class: EndPointClass) -> Result<(), GraphError> {
        let len = self.interface(r.row, class).map_or(0, Interface::len);
        if r.index < len {
            Ok(())
        } else {
            Err(GraphError::EndpointOutOfRange {
                index: r.index,
                len,
            })
        }
    }

    /// Inserts a connection without checking either end exists. Used by the
    /// JSON reader, which validates afterwards.
    pub(crate) fn connect_unchecked(&mut self, src: EndPointRef, dst: EndPointRef) {
        self.connections.insert(dst, src);
    }

    /// Removes the connection into `dst`.
    pub fn disconnect(&mut self, dst: EndPointRef) -> Option<EndPointRef> {
        self.connections.remove(&dst)
    }

    /// Keeps only the connections for which `keep(dst, src)` holds.
    pub fn retain_connections(&mut self, mut keep: impl FnMut(EndPointRef, EndPointRef) -> bool) {
        self.connections.retain(|dst, src| keep(*dst, *src));
    }

    /// Source feeding `dst`.
    pub fn source_of(&self, dst: EndPointRef) -> Option<EndPointRef> {
        self.connections.get(&dst).copied()
    }

    /// Every `(dst, src)` connection in canonical destination order.
    pub fn connections(&self) -> impl Iterator<Item = (EndPointRef, EndPointRef)> + '_ {
        self.connections.iter().map(|(dst, src)| (*dst, *src))
    }

    /// Number of connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Destinations fed by `src`, in canonical order.
    pub fn consumers(&self, src: EndPointRef) -> impl Iterator<Item = EndPointRef> + '_ {
        self.connections
            .iter()
            .filter(move |(_, s)| **s == src)
            .map(|(dst, _)| *dst)
    }

    /// Number of destinations `src` feeds.
    pub fn fan_out(&self, src: EndPointRef) -> usize {
        self.connections.values().filter(|s| **s == src).count()
    }

    /// Destination end points without a source, in canonical order.
    pub fn unconnected(&self) -> Vec<EndPointRef> {
        self.endpoints(EndPointClass::Dst)
            .map(|ep| ep.reference())
            .filter(|dst| !self.connections.contains_key(dst))
            .collect()
    }

    /// Source end points that feed nothing, in canonical order.
    pub fn unused_sources(&self) -> Vec<EndPointRef> {
        self.endpoints(EndPointClass::Src)
            .map(|ep| ep.reference())
            .filter(|src| !self.connections.values().any(|s| s == src))
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use egp_types::TypeUid;

    fn scalar(xuid: u16) -> Ept {
        Ept::scalar(TypeUid::new(0, None, xuid).unwrap()).unwrap()
    }

    fn r(row: Row, index: usize) -> EndPointRef {
        EndPointRef::new(row, index)
    }

    fn sample() -> ConnectionGraph {
        let mut g = ConnectionGraph::new(GraphType::Standard);
        for x in [1, 3, 5] {
            g.push_endpoint(Row::I, EndPointClass::Src, scalar(x)).unwrap();
            g.push_endpoint(Row::O, EndPointClass::Dst, scalar(x)).unwrap();
        }
        for i in 0..3 {
            g.connect(r(Row::I, i), r(Row::O, i)).unwrap();
        }
        g
    }

    #[test]
    fn insertion_shifts_later_references() {
        let mut g = sample();
        let at = g.insert_endpoint(Row::I, EndPointClass::Src, scalar(2)).unwrap();
        assert_eq!(at, 1);
        assert_eq!(g.source_of(r(Row::O, 0)), Some(r(Row::I, 0)));
        assert_eq!(g.source_of(r(Row::O, 1)), Some(r(Row::I, 2)));
        assert_eq!(g.source_of(r(Row::O, 2)), Some(r(Row::I, 3)));
        assert_eq!(g.unused_sources(), vec![r(Row::I, 1)]);
    }

    #[test]
    fn removal_drops_and_shifts() {
        let mut g = sample();
        g.remove_endpoint(Row::O, EndPointClass::Dst, 0).unwrap();
        assert_eq!(g.connection_count(), 2);
        assert_eq!(g.source_of(r(Row::O, 0)), Some(r(Row::I, 1)));
        assert_eq!(g.unused_sources(), vec![r(Row::I, 0)]);
    }

    #[test]
    fn reorder_keeps_connections_attached() {
        let mut g = ConnectionGraph::new(GraphType::Standard);
        g.push_endpoint(Row::I, EndPointClass::Src, scalar(9)).unwrap();
        g.push_endpoint(Row::I, EndPointClass::Src, scalar(1)).unwrap();
        g.push_endpoint(Row::O, EndPointClass::Dst, scalar(9)).unwrap();
        g.connect(r(Row::I, 0), r(Row::O, 0)).unwrap();
        g.reorder();
        assert_eq!(g.ept(Row::I, EndPointClass::Src, 1), Some(&scalar(9)));
        assert_eq!(g.source_of(r(Row::O, 0)), Some(r(Row::I, 1)));
    }

    #[test]
    fn connect_replaces_and_checks_existence() {
        let mut g = sample();
        assert_eq!(
            g.connect(r(Row::I, 2), r(Row::O, 0)).unwrap(),
            Some(r(Row::I, 0))
        );
        assert_eq!(g.fan_out(r(Row::I, 2)), 2);
        assert!(g.connect(r(Row::I, 7), r(Row::O, 0)).is_err());
        assert!(g.connect(r(Row::A, 0), r(Row::O, 0)).is_err());
        assert_eq!(g.disconnect(r(Row::O, 1)), Some(r(Row::I, 1)));
        assert_eq!(g.unconnected(), vec![r(Row::O, 1)]);
    }
}
