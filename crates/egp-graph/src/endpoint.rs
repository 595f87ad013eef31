// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! End point identity.

use std::fmt;

use egp_types::Ept;
use serde::{Deserialize, Serialize};

use crate::row::{EndPointClass, Row};

/// Position of an end point within one side of a row.
///
/// Which side is implied by context: the keys of the connection relation are
/// destinations and its values are sources.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct EndPointRef {
    /// Owning row.
    pub row: Row,
    /// Index within the row side's interface.
    pub index: usize,
}

impl EndPointRef {
    /// Shorthand constructor.
    pub const fn new(row: Row, index: usize) -> Self {
        Self { row, index }
    }
}

impl fmt::Display for EndPointRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.row, self.index)
    }
}

/// Borrowed view of one end point of a graph.
///
/// Identity only; which end points it is connected to is held by the owning
/// [`crate::ConnectionGraph`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct EndPoint<'g> {
    /// Owning row.
    pub row: Row,
    /// Index within the row side.
    pub index: usize,
    /// Side of the row.
    pub class: EndPointClass,
    /// End point type.
    pub ept: &'g Ept,
}

impl EndPoint<'_> {
    /// Position of this end point.
    pub fn reference(&self) -> EndPointRef {
        EndPointRef::new(self.row, self.index)
    }
}
