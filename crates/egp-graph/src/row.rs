// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Row identifiers and end point classes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GraphError;

/// Which side of a row an end point sits on.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum EndPointClass {
    /// Provides a value.
    Src,
    /// Consumes a value.
    Dst,
}

impl fmt::Display for EndPointClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Src => "src",
            Self::Dst => "dst",
        })
    }
}

/// A named interface slot of a connection graph.
///
/// Declaration order is the canonical row order used for validation,
/// hashing and JSON output.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Row {
    /// Graph inputs.
    I,
    /// If-condition.
    F,
    /// Loop iterable (dst) and per-iteration element (src).
    L,
    /// Initial (dst) and current (src) loop state.
    S,
    /// Next loop state.
    T,
    /// Initial (dst) and current (src) while-condition.
    W,
    /// Next while-condition.
    X,
    /// Sub-GC A: its inputs (dst) and outputs (src).
    A,
    /// Sub-GC B: its inputs (dst) and outputs (src).
    B,
    /// Graph outputs.
    O,
    /// Alternate outputs.
    P,
    /// Unconnected sources; exists only in the JSON form.
    U,
}

impl Row {
    /// Every row in canonical order.
    pub const ALL: [Self; 12] = [
        Self::I,
        Self::F,
        Self::L,
        Self::S,
        Self::T,
        Self::W,
        Self::X,
        Self::A,
        Self::B,
        Self::O,
        Self::P,
        Self::U,
    ];

    /// `true` when the row has a side of the given class.
    pub fn has_side(self, class: EndPointClass) -> bool {
        match class {
            EndPointClass::Src => self.has_src(),
            EndPointClass::Dst => self.has_dst(),
        }
    }

    /// `true` for rows that provide values.
    pub fn has_src(self) -> bool {
        matches!(
            self,
            Self::I | Self::L | Self::S | Self::W | Self::A | Self::B
        )
    }

    /// `true` for rows that consume values.
    pub fn has_dst(self) -> bool {
        !matches!(self, Self::I)
    }

    /// `true` for the rows that hold a sub-GC.
    pub fn is_sub_gc(self) -> bool {
        matches!(self, Self::A | Self::B)
    }

    /// Single-letter name.
    pub fn as_char(self) -> char {
        match self {
            Self::I => 'I',
            Self::F => 'F',
            Self::L => 'L',
            Self::S => 'S',
            Self::T => 'T',
            Self::W => 'W',
            Self::X => 'X',
            Self::A => 'A',
            Self::B => 'B',
            Self::O => 'O',
            Self::P => 'P',
            Self::U => 'U',
        }
    }

    pub(crate) fn tag(self) -> u8 {
        self.as_char() as u8
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for Row {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::ALL
                .into_iter()
                .find(|row| row.as_char() == c)
                .ok_or_else(|| GraphError::UnknownRow(s.to_owned())),
            _ => Err(GraphError::UnknownRow(s.to_owned())),
        }
    }
}
