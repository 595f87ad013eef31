// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Errors raised by the connection graph engine.

use egp_types::TypeError;
use thiserror::Error;

use crate::gene_pool::GenePoolError;
use crate::graph_type::GraphType;
use crate::row::Row;
use crate::validate::Violation;

/// Errors emitted while building, validating, inserting or stabilizing
/// connection graphs.
///
/// Only [`GraphError::StabilizationFailed`] is an expected outcome of normal
/// evolution; every other variant means the inputs were inconsistent.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Type registry or codec failure.
    #[error(transparent)]
    Type(#[from] TypeError),
    /// An interface would exceed its flattened element limit.
    #[error("interface overflow: {elements} elements (max 256)")]
    InterfaceOverflow {
        /// Element count the operation would have produced.
        elements: usize,
    },
    /// An end point index is past the end of its interface.
    #[error("end point index {index} out of range (len {len})")]
    EndpointOutOfRange {
        /// Requested index.
        index: usize,
        /// Interface length.
        len: usize,
    },
    /// Row presence or row-side rules are broken.
    #[error("row presence violation: {0}")]
    RowPresenceViolation(Violation),
    /// A connection is dangling, illegal or joins incompatible types.
    #[error("connectivity violation: {0}")]
    ConnectivityViolation(Violation),
    /// A destination end point is unconnected.
    #[error("incomplete graph: {0}")]
    IncompleteGraph(Violation),
    /// The graph types cannot take part in the requested operation.
    #[error("{operation}: {role} graph of type {graph_type} is not permitted")]
    IncompatibleGraphType {
        /// Operation attempted.
        operation: &'static str,
        /// Which operand was rejected.
        role: &'static str,
        /// Its graph type.
        graph_type: GraphType,
    },
    /// The operation needs a sub-GC the graph does not have.
    #[error("missing sub-graph in row {0}")]
    MissingSubGraph(Row),
    /// The budget ran out with destinations still unconnected.
    #[error("stabilization failed: {remaining} unconnected end points after {attempts} attempts")]
    StabilizationFailed {
        /// Unconnected destination end points left.
        remaining: usize,
        /// Repair attempts made.
        attempts: usize,
    },
    /// Unknown row letter.
    #[error("unknown row: {0:?}")]
    UnknownRow(String),
    /// Unknown graph type name.
    #[error("unknown graph type: {0:?}")]
    UnknownGraphType(String),
    /// The JSON form is well-formed JSON but not a consistent graph.
    #[error("malformed graph json: {0}")]
    MalformedJson(String),
    /// JSON syntax or shape error.
    #[error("graph json: {0}")]
    Json(#[from] serde_json::Error),
    /// The gene pool failed for a reason other than a timeout.
    #[error("gene pool: {0}")]
    GenePool(#[from] GenePoolError),
}
