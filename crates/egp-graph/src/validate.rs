// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Structural legality of connection graphs.
//!
//! Checks run in a fixed order and the first failure is reported:
//!
//! 1. row sides and row presence, in canonical row order;
//! 2. each connection, in canonical destination order: dangling end points,
//!    illegal row pairs, incompatible types;
//! 3. fixed-instance bindings per destination row;
//! 4. completeness: the first unconnected destination.
//!
//! Completeness comes last so that [`Violation::Incomplete`] can drive the
//! stabilizer: a graph whose only fault is an unconnected destination is
//! otherwise sound.

use egp_types::{Ept, TypeRegistry};
use thiserror::Error;

use crate::endpoint::EndPointRef;
use crate::error::GraphError;
use crate::graph::ConnectionGraph;
use crate::graph_type::RowPresence;
use crate::row::{EndPointClass, Row};

/// How deep wildcard resolution follows sub-GC inputs back through the graph.
const MAX_RESOLVE_DEPTH: usize = 8;

/// The first legality failure found in a graph.
#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum Violation {
    /// End points on a side the row does not have.
    #[error("row {row} has no {class} side")]
    RowSide {
        /// Offending row.
        row: Row,
        /// Side that should be empty.
        class: EndPointClass,
    },
    /// A row's presence breaks the graph type's rule for it.
    #[error("row {row} is {rule}")]
    RowPresence {
        /// Offending row.
        row: Row,
        /// The rule broken.
        rule: RowPresence,
    },
    /// Symmetric rows differ in presence or destination types.
    #[error("row {row} is not symmetric with {partner}")]
    SymmetricMismatch {
        /// Offending row.
        row: Row,
        /// Its partner.
        partner: Row,
    },
    /// A connection names an end point that does not exist.
    #[error("connection {src} -> {dst} is dangling")]
    DanglingEndpoint {
        /// Destination end.
        dst: EndPointRef,
        /// Source end.
        src: EndPointRef,
    },
    /// The row pair is not in the graph type's connectivity table.
    #[error("connection {src} -> {dst} is not permitted")]
    IllegalPair {
        /// Destination end.
        dst: EndPointRef,
        /// Source end.
        src: EndPointRef,
    },
    /// The source type cannot feed the destination type.
    #[error("connection {src} -> {dst} joins incompatible types")]
    IncompatibleEpt {
        /// Destination end.
        dst: EndPointRef,
        /// Source end.
        src: EndPointRef,
    },
    /// Two destinations sharing a fixed-instance index bind different types.
    #[error("row {row} binds fixed instance {instance} to different types")]
    FixedInstanceConflict {
        /// Destination row.
        row: Row,
        /// The fixed-instance index.
        instance: u8,
    },
    /// Row A or B is present without its sub-GC.
    #[error("row {0} has no sub-GC")]
    MissingSubGraph(Row),
    /// Row A or B does not mirror its sub-GC's interfaces.
    #[error("row {0} does not match its sub-GC's interface")]
    SubGraphMismatch(Row),
    /// A destination end point has no source.
    #[error("{row}[{index}] is unconnected")]
    Incomplete {
        /// Destination row.
        row: Row,
        /// Index within the row.
        index: usize,
        /// The only legal source row, when there is exactly one.
        required_source: Option<Row>,
    },
}

impl Violation {
    /// Wraps the violation in the error of its category.
    pub fn into_error(self) -> GraphError {
        match self {
            Self::RowSide { .. }
            | Self::RowPresence { .. }
            | Self::SymmetricMismatch { .. }
            | Self::MissingSubGraph(_)
            | Self::SubGraphMismatch(_) => GraphError::RowPresenceViolation(self),
            Self::Incomplete { .. } => GraphError::IncompleteGraph(self),
            _ => GraphError::ConnectivityViolation(self),
        }
    }
}

/// Outcome of validation.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Validity {
    /// Every rule holds.
    Valid,
    /// The first rule found broken.
    Invalid(Violation),
}

impl Validity {
    /// `true` for [`Validity::Valid`].
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Converts to a `Result`, mapping the violation to its error category.
    ///
    /// # Errors
    /// The [`GraphError`] for the violation.
    pub fn into_result(self) -> Result<(), GraphError> {
        match self {
            Self::Valid => Ok(()),
            Self::Invalid(v) => Err(v.into_error()),
        }
    }
}

impl From<Result<(), Violation>> for Validity {
    fn from(result: Result<(), Violation>) -> Self {
        match result {
            Ok(()) => Self::Valid,
            Err(v) => Self::Invalid(v),
        }
    }
}

impl ConnectionGraph {
    /// Checks the graph against its type's tables.
    pub fn validate(&self, registry: &TypeRegistry) -> Validity {
        self.check(registry).into()
    }

    fn check(&self, registry: &TypeRegistry) -> Result<(), Violation> {
        self.check_rows()?;
        self.check_wiring(registry)
    }

    /// Connection legality, fixed-instance bindings and completeness.
    pub(crate) fn check_wiring(&self, registry: &TypeRegistry) -> Result<(), Violation> {
        self.check_connections(registry)?;
        self.check_fixed_instances(registry)?;
        self.check_complete()
    }

    pub(crate) fn check_rows(&self) -> Result<(), Violation> {
        for (row, ifaces) in self.rows() {
            for class in [EndPointClass::Dst, EndPointClass::Src] {
                if !row.has_side(class) && !ifaces.side(class).is_empty() {
                    return Err(Violation::RowSide { row, class });
                }
            }
        }
        let graph_type = self.graph_type();
        for row in Row::ALL {
            let rule = graph_type.presence(row);
            let present = self.has_row(row);
            let ok = match rule {
                RowPresence::Required => present,
                RowPresence::Forbidden => !present,
                RowPresence::Optional => true,
                RowPresence::AtLeastOneOf(set) => set.iter().any(|r| self.has_row(*r)),
                RowPresence::Symmetric { partner, required } => {
                    if present != self.has_row(partner)
                        || (present
                            && self.interface(row, EndPointClass::Dst)
                                != self.interface(partner, EndPointClass::Dst))
                    {
                        return Err(Violation::SymmetricMismatch { row, partner });
                    }
                    present || !required
                }
            };
            if !ok {
                return Err(Violation::RowPresence { row, rule });
            }
        }
        Ok(())
    }

    fn check_connections(&self, registry: &TypeRegistry) -> Result<(), Violation> {
        let table = self.graph_type().connectivity();
        for (dst, src) in self.connections() {
            let (Some(dst_ept), Some(src_ept)) = (
                self.ept(dst.row, EndPointClass::Dst, dst.index),
                self.source_ept(registry, src),
            ) else {
                return Err(Violation::DanglingEndpoint { dst, src });
            };
            if !table.is_legal(src.row, dst.row) {
                return Err(Violation::IllegalPair { dst, src });
            }
            if !registry.is_compatible(&src_ept, dst_ept) {
                return Err(Violation::IncompatibleEpt { dst, src });
            }
        }
        Ok(())
    }

    fn check_fixed_instances(&self, registry: &TypeRegistry) -> Result<(), Violation> {
        for (row, ifaces) in self.rows() {
            let mut bound: Vec<(u8, Ept)> = Vec::new();
            for (index, dst_ept) in ifaces.dst.iter().enumerate() {
                let Some(src_ept) = self
                    .source_of(EndPointRef::new(row, index))
                    .and_then(|src| self.source_ept(registry, src))
                else {
                    continue;
                };
                if let Some(instance) = bind_fixed(&src_ept, dst_ept, &mut bound) {
                    return Err(Violation::FixedInstanceConflict { row, instance });
                }
            }
        }
        Ok(())
    }

    fn check_complete(&self) -> Result<(), Violation> {
        if self.graph_type().is_wiring_exempt() {
            return Ok(());
        }
        match self.unconnected().first() {
            Some(dst) => Err(Violation::Incomplete {
                row: dst.row,
                index: dst.index,
                required_source: self.graph_type().connectivity().required_source(dst.row),
            }),
            None => Ok(()),
        }
    }

    /// `true` when feeding `dst` from a source of type `src_ept` keeps the
    /// fixed-instance bindings of `dst`'s row consistent.
    pub(crate) fn admits_fixed(&self, registry: &TypeRegistry, dst: EndPointRef, src_ept: &Ept) -> bool {
        let Some(ifaces) = self.row(dst.row) else {
            return false;
        };
        let mut bound: Vec<(u8, Ept)> = Vec::new();
        for (index, other) in ifaces.dst.iter().enumerate() {
            if index == dst.index {
                continue;
            }
            if let Some(ept) = self
                .source_of(EndPointRef::new(dst.row, index))
                .and_then(|src| self.source_ept(registry, src))
            {
                // An existing conflict is the validator's to report.
                let _ = bind_fixed(&ept, other, &mut bound);
            }
        }
        ifaces
            .dst
            .get(dst.index)
            .is_some_and(|dst_ept| bind_fixed(src_ept, dst_ept, &mut bound).is_none())
    }

    /// Type a source end point delivers, with sub-GC output wildcards
    /// resolved against whatever feeds that sub-GC.
    ///
    /// Falls back to the declared type when resolution is not possible;
    /// `None` when the end point does not exist.
    pub fn source_ept(&self, registry: &TypeRegistry, src: EndPointRef) -> Option<Ept> {
        self.resolve_source(registry, src, 0)
    }

    fn resolve_source(&self, registry: &TypeRegistry, src: EndPointRef, depth: usize) -> Option<Ept> {
        let declared = self.ept(src.row, EndPointClass::Src, src.index)?;
        if !declared.has_wildcard() || !src.row.is_sub_gc() || depth >= MAX_RESOLVE_DEPTH {
            return Some(declared.clone());
        }
        let inputs: Vec<Ept> = self
            .interface(src.row, EndPointClass::Dst)?
            .iter()
            .enumerate()
            .map(|(index, ept)| {
                self.source_of(EndPointRef::new(src.row, index))
                    .and_then(|s| self.resolve_source(registry, s, depth + 1))
                    .unwrap_or_else(|| ept.clone())
            })
            .collect();
        Some(
            registry
                .resolve_wildcards(declared, &inputs)
                .unwrap_or_else(|_| declared.clone()),
        )
    }
}

/// Records the bindings a connection makes for fixed-instance types in `dst`,
/// returning the first index bound to two different types.
fn bind_fixed(src: &Ept, dst: &Ept, bound: &mut Vec<(u8, Ept)>) -> Option<u8> {
    if let Some(instance) = dst.head().fixed_instance() {
        return match bound.iter().find(|(i, _)| *i == instance) {
            Some((_, ept)) if ept != src => Some(instance),
            Some(_) => None,
            None => {
                bound.push((instance, src.clone()));
                None
            }
        };
    }
    let (src_args, dst_args) = (src.args(), dst.args());
    if src_args.len() != dst_args.len() {
        return None;
    }
    src_args
        .iter()
        .zip(&dst_args)
        .find_map(|(s, d)| bind_fixed(s, d, bound))
}
