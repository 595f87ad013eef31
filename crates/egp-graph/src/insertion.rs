// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Inserting one genetic code into another.
//!
//! None of these operations mutate their operands and none invent
//! connections beyond identity pass-throughs: whatever is left unconnected
//! becomes a steady-state exception for the stabilizer to repair.

use std::fmt;

use egp_types::{Ept, TypeRegistry};
use tracing::info;

use crate::endpoint::EndPointRef;
use crate::error::GraphError;
use crate::gc::{Freeze, GcRef, GeneticCode};
use crate::graph::{ConnectionGraph, RowInterfaces};
use crate::graph_type::GraphType;
use crate::interface::Interface;
use crate::row::{EndPointClass, Row};
use crate::validate::Violation;

/// Where restructuring places the inserted code.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Above {
    /// Between the graph inputs and sub-GC A.
    A,
    /// Between the graph's feeders of sub-GC B and sub-GC B.
    B,
    /// Between sub-GC B and the graph outputs.
    O,
}

impl Above {
    /// Row whose unconnected destination calls for this placement.
    pub fn for_row(row: Row) -> Option<Self> {
        match row {
            Row::A => Some(Self::A),
            Row::B => Some(Self::B),
            Row::O => Some(Self::O),
            _ => None,
        }
    }

    /// Row of the target graph replaced by the fetal graph.
    pub fn replaced_row(self) -> Row {
        match self {
            Self::A => Row::A,
            Self::B | Self::O => Row::B,
        }
    }
}

/// An insertion operation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum InsertOp {
    /// Insert code runs first, then the target.
    Stack,
    /// Target runs first, then the insert code.
    InverseStack,
    /// An `Empty` target's interface wraps a `Standard` insert code.
    Wrap,
    /// The insert code is spliced into a `Standard` target.
    Restructure(Above),
}

impl InsertOp {
    fn name(self) -> &'static str {
        match self {
            Self::Stack => "stack",
            Self::InverseStack => "inverse stack",
            Self::Wrap => "wrap",
            Self::Restructure(Above::A) => "restructure above A",
            Self::Restructure(Above::B) => "restructure above B",
            Self::Restructure(Above::O) => "restructure above O",
        }
    }
}

impl fmt::Display for InsertOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A fetal graph waiting to be grafted into row `row` of its resultant.
#[derive(Clone, Debug)]
pub struct Fetal {
    /// Row of the resultant graph the fetal graph will occupy.
    pub row: Row,
    /// The fetal graph.
    pub fgc: GeneticCode,
}

/// Result of an insertion: the resultant graph and, for restructuring, the
/// fetal graph its replaced row awaits.
#[derive(Clone, Debug)]
pub struct Insertion {
    /// The resultant graph.
    pub rgc: GeneticCode,
    /// Pending fetal graph.
    pub fetal: Option<Fetal>,
}

impl Insertion {
    /// Freezes the fetal graph (if any), grafts it and freezes the
    /// resultant, without any stabilization.
    ///
    /// # Errors
    /// [`GraphError::RowPresenceViolation`] if the fetal graph no longer
    /// matches its row.
    pub fn assemble(self) -> Result<GcRef, GraphError> {
        let mut rgc = self.rgc;
        if let Some(Fetal { row, fgc }) = self.fetal {
            graft(&mut rgc, row, fgc.freeze())?;
        }
        Ok(rgc.freeze())
    }
}

fn reject(op: InsertOp, role: &'static str, graph_type: GraphType) -> GraphError {
    GraphError::IncompatibleGraphType {
        operation: op.name(),
        role,
        graph_type,
    }
}

/// Runs `op` with `tgc` as the target and `igc` as the code inserted.
/// `registry` resolves the types of wildcard sources feeding a displaced row.
///
/// # Errors
/// [`GraphError::IncompatibleGraphType`] when either graph type may not take
/// part; [`GraphError::MissingSubGraph`] when restructuring a target without
/// the sub-GC being displaced.
pub fn insert(
    registry: &TypeRegistry,
    op: InsertOp,
    tgc: &GcRef,
    igc: &GcRef,
) -> Result<Insertion, GraphError> {
    let insertion = match op {
        InsertOp::Stack => Insertion {
            rgc: stack(tgc, igc)?,
            fetal: None,
        },
        InsertOp::InverseStack => Insertion {
            rgc: inverse_stack(tgc, igc)?,
            fetal: None,
        },
        InsertOp::Wrap => Insertion {
            rgc: wrap(tgc, igc)?,
            fetal: None,
        },
        InsertOp::Restructure(above) => restructure(registry, tgc, igc, above)?,
    };
    info!(
        operation = op.name(),
        target = %tgc.digest(),
        insert = %igc.digest(),
        unconnected = insertion.rgc.graph().unconnected().len(),
        "inserted"
    );
    Ok(insertion)
}

/// `igc` feeds `tgc`: A = IGC, B = TGC. The target's inputs are left
/// unconnected.
///
/// # Errors
/// [`GraphError::IncompatibleGraphType`] for `Empty` operands.
pub fn stack(tgc: &GcRef, igc: &GcRef) -> Result<GeneticCode, GraphError> {
    check_sequenceable(InsertOp::Stack, tgc, igc)?;
    sequence(igc, tgc)
}

/// `tgc` feeds `igc`: A = TGC, B = IGC. The insert code's inputs are left
/// unconnected.
///
/// # Errors
/// [`GraphError::IncompatibleGraphType`] for `Empty` operands.
pub fn inverse_stack(tgc: &GcRef, igc: &GcRef) -> Result<GeneticCode, GraphError> {
    check_sequenceable(InsertOp::InverseStack, tgc, igc)?;
    sequence(tgc, igc)
}

fn check_sequenceable(op: InsertOp, tgc: &GcRef, igc: &GcRef) -> Result<(), GraphError> {
    if tgc.graph_type() == GraphType::Empty {
        return Err(reject(op, "target", GraphType::Empty));
    }
    if igc.graph_type() == GraphType::Empty {
        return Err(reject(op, "insert", GraphType::Empty));
    }
    Ok(())
}

/// A `Standard` graph running `first` (A) then `second` (B), exposing
/// `first`'s inputs and `second`'s outputs.
fn sequence(first: &GcRef, second: &GcRef) -> Result<GeneticCode, GraphError> {
    let mut graph = ConnectionGraph::new(GraphType::Standard);
    graph.set_row(
        Row::I,
        RowInterfaces::new(Interface::new(), first.inputs().clone()),
    );
    graph.set_row(
        Row::O,
        RowInterfaces::new(second.outputs().clone(), Interface::new()),
    );
    let mut rgc = GeneticCode::new(graph);
    rgc.set_sub_gc(Row::A, GcRef::clone(first));
    rgc.set_sub_gc(Row::B, GcRef::clone(second));
    let graph = rgc.graph_mut();
    for k in 0..first.inputs().len() {
        graph.connect(EndPointRef::new(Row::I, k), EndPointRef::new(Row::A, k))?;
    }
    for k in 0..second.outputs().len() {
        graph.connect(EndPointRef::new(Row::B, k), EndPointRef::new(Row::O, k))?;
    }
    Ok(rgc)
}

/// Gives `igc` the interface of the `Empty` `tgc`.
///
/// Sub-GCs and every connection not touching I or O are kept; connections
/// that read the old inputs or fed the old outputs are dropped.
///
/// # Errors
/// [`GraphError::IncompatibleGraphType`] unless `tgc` is `Empty` and `igc`
/// is `Standard`.
pub fn wrap(tgc: &GcRef, igc: &GcRef) -> Result<GeneticCode, GraphError> {
    if tgc.graph_type() != GraphType::Empty {
        return Err(reject(InsertOp::Wrap, "target", tgc.graph_type()));
    }
    if igc.graph_type() != GraphType::Standard {
        return Err(reject(InsertOp::Wrap, "insert", igc.graph_type()));
    }
    let mut rgc = igc.thaw();
    let graph = rgc.graph_mut();
    graph.set_row(
        Row::I,
        RowInterfaces::new(Interface::new(), tgc.inputs().clone()),
    );
    graph.set_row(
        Row::O,
        RowInterfaces::new(tgc.outputs().clone(), Interface::new()),
    );
    Ok(rgc)
}

/// Splices `igc` into the `Standard` `tgc` at `above`.
///
/// The displaced sub-GC and `igc` become the two halves of a fetal graph
/// (FGC) whose inputs are the distinct sources that fed the displaced row,
/// typed as they resolve against `registry` and wired through exactly as
/// before, and whose outputs are the displaced
/// sub-GC's outputs followed by `igc`'s. `igc`'s inputs are left
/// unconnected inside the FGC. The resultant keeps every consumer of the
/// displaced row and gains `igc`'s outputs as new, unused sources.
///
/// # Errors
/// [`GraphError::IncompatibleGraphType`] unless `tgc` is `Standard` and
/// `igc` is not `Empty`; [`GraphError::MissingSubGraph`] if the row to
/// displace has no sub-GC.
pub fn restructure(
    registry: &TypeRegistry,
    tgc: &GeneticCode,
    igc: &GcRef,
    above: Above,
) -> Result<Insertion, GraphError> {
    let op = InsertOp::Restructure(above);
    if tgc.graph_type() != GraphType::Standard {
        return Err(reject(op, "target", tgc.graph_type()));
    }
    if igc.graph_type() == GraphType::Empty {
        return Err(reject(op, "insert", GraphType::Empty));
    }
    let row = above.replaced_row();
    let displaced = tgc.sub_gc(row).ok_or(GraphError::MissingSubGraph(row))?;
    let (fgc_a, fgc_b, displaced_at, igc_at) = match above {
        Above::A | Above::B => (igc, displaced, Row::B, Row::A),
        Above::O => (displaced, igc, Row::A, Row::B),
    };

    let graph = tgc.graph();
    let feeders = feeders(registry, graph, row)?;

    let mut outputs = displaced.outputs().clone();
    for ept in igc.outputs() {
        outputs.push(ept.clone())?;
    }
    let feeder_iface = Interface::from_epts(feeders.iter().map(|(ept, _)| ept.clone()))?;

    let mut fgraph = ConnectionGraph::new(GraphType::Standard);
    fgraph.set_row(
        Row::I,
        RowInterfaces::new(Interface::new(), feeder_iface.clone()),
    );
    fgraph.set_row(Row::O, RowInterfaces::new(outputs.clone(), Interface::new()));
    let mut fgc = GeneticCode::new(fgraph);
    fgc.set_sub_gc(Row::A, GcRef::clone(fgc_a));
    fgc.set_sub_gc(Row::B, GcRef::clone(fgc_b));
    let fg = fgc.graph_mut();
    for k in 0..displaced.inputs().len() {
        if let Some(src) = graph.source_of(EndPointRef::new(row, k)) {
            let j = feeder_index(&feeders, src)?;
            fg.connect(EndPointRef::new(Row::I, j), EndPointRef::new(displaced_at, k))?;
        }
    }
    let n = displaced.outputs().len();
    for k in 0..n {
        fg.connect(EndPointRef::new(displaced_at, k), EndPointRef::new(Row::O, k))?;
    }
    for m in 0..igc.outputs().len() {
        fg.connect(EndPointRef::new(igc_at, m), EndPointRef::new(Row::O, n + m))?;
    }

    let mut rgc = tgc.clone();
    let consumers: Vec<(EndPointRef, EndPointRef)> = graph
        .connections()
        .filter(|(_, src)| src.row == row)
        .collect();
    let rg = rgc.graph_mut();
    rg.set_row(row, RowInterfaces::new(feeder_iface, outputs));
    for (dst, src) in consumers {
        rg.connect(src, dst)?;
    }
    for (j, (_, src)) in feeders.iter().enumerate() {
        rg.connect(*src, EndPointRef::new(row, j))?;
    }
    rgc.attach_sub_gc(row, None);

    Ok(Insertion {
        rgc,
        fetal: Some(Fetal { row, fgc }),
    })
}

/// Distinct sources feeding `row`'s destinations, with the types they
/// deliver, in canonical type order (stable in first-use order). Output
/// wildcards are resolved; a fetal input is never a wildcard.
fn feeders(
    registry: &TypeRegistry,
    graph: &ConnectionGraph,
    row: Row,
) -> Result<Vec<(Ept, EndPointRef)>, GraphError> {
    let mut feeders: Vec<(Ept, EndPointRef)> = Vec::new();
    for (dst, src) in graph.connections().filter(|(dst, _)| dst.row == row) {
        if feeders.iter().any(|(_, s)| *s == src) {
            continue;
        }
        let ept = graph
            .source_ept(registry, src)
            .ok_or_else(|| Violation::DanglingEndpoint { dst, src }.into_error())?;
        feeders.push((ept, src));
    }
    feeders.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(feeders)
}

fn feeder_index(feeders: &[(Ept, EndPointRef)], src: EndPointRef) -> Result<usize, GraphError> {
    feeders
        .iter()
        .position(|(_, s)| *s == src)
        .ok_or(GraphError::EndpointOutOfRange {
            index: src.index,
            len: feeders.len(),
        })
}

/// Installs a frozen fetal graph in `row` of `rgc`.
///
/// Inputs the fetal graph gained while being stabilized are inserted into
/// the row as new, unconnected destinations; the row's sources are put in
/// the fetal graph's canonical output order.
///
/// # Errors
/// [`GraphError::RowPresenceViolation`] when the fetal graph dropped inputs
/// or its outputs differ from the row's.
pub fn graft(rgc: &mut GeneticCode, row: Row, fgc: GcRef) -> Result<(), GraphError> {
    let graph = rgc.graph_mut();
    let mut existing: Vec<Ept> = graph
        .interface(row, EndPointClass::Dst)
        .map(|iface| iface.epts().to_vec())
        .unwrap_or_default();
    for ept in fgc.inputs() {
        if let Some(pos) = existing.iter().position(|e| e == ept) {
            existing.swap_remove(pos);
        } else {
            graph.insert_endpoint(row, EndPointClass::Dst, ept.clone())?;
        }
    }
    graph.reorder_side(row, EndPointClass::Src);
    let matches = graph.row(row).is_some_and(|ifaces| {
        &ifaces.dst == fgc.inputs() && &ifaces.src == fgc.outputs()
    });
    if !existing.is_empty() || !matches {
        return Err(Violation::SubGraphMismatch(row).into_error());
    }
    rgc.attach_sub_gc(row, Some(fgc));
    Ok(())
}
