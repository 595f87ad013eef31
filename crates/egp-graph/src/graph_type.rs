// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Graph types and their row-presence and connectivity tables.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GraphError;
use crate::row::Row;

/// The structural kind of a connection graph.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum GraphType {
    /// Opaque terminal (a codon); no sub-GCs.
    Primitive,
    /// Interface-only placeholder, used as a wrap target.
    Empty,
    /// Two sub-GCs in sequence.
    Standard,
    /// Runs A when F holds, otherwise passes P through.
    IfThen,
    /// Runs A when F holds, otherwise B.
    IfThenElse,
    /// Runs A once per element of L, threading state S to T.
    ForLoop,
    /// Runs A while W holds, computing the next condition X.
    WhileLoop,
}

/// A row's presence rule within one graph type.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RowPresence {
    /// Must be present.
    Required,
    /// Must be absent.
    Forbidden,
    /// May be present.
    Optional,
    /// At least one row of the set must be present.
    AtLeastOneOf(&'static [Row]),
    /// Present exactly when `partner` is, with identical Dst types.
    Symmetric {
        /// The paired row.
        partner: Row,
        /// Whether the pair must be present.
        required: bool,
    },
}

impl fmt::Display for RowPresence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => f.write_str("required"),
            Self::Forbidden => f.write_str("forbidden"),
            Self::Optional => f.write_str("optional"),
            Self::AtLeastOneOf(rows) => {
                f.write_str("at least one of ")?;
                for row in *rows {
                    write!(f, "{row}")?;
                }
                Ok(())
            }
            Self::Symmetric { partner, required } => {
                let req = if *required { "required, " } else { "" };
                write!(f, "{req}symmetric with {partner}")
            }
        }
    }
}

const IO: RowPresence = RowPresence::AtLeastOneOf(&[Row::I, Row::O]);
const O_SYM: RowPresence = RowPresence::Symmetric {
    partner: Row::P,
    required: false,
};
const P_SYM: RowPresence = RowPresence::Symmetric {
    partner: Row::O,
    required: false,
};

/// Legal `source → destination` row pairs of one graph type.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ConnectivityTable {
    legal: &'static [(Row, &'static [Row])],
}

impl ConnectivityTable {
    /// Source rows that may feed `dst`; empty when `dst` accepts nothing.
    pub fn legal_sources(&self, dst: Row) -> &'static [Row] {
        match self.legal.iter().find(|(row, _)| *row == dst) {
            Some((_, srcs)) => srcs,
            None => &[],
        }
    }

    /// `true` when `src → dst` is permitted.
    pub fn is_legal(&self, src: Row, dst: Row) -> bool {
        self.legal_sources(dst).contains(&src)
    }

    /// Every `(dst, legal sources)` entry in canonical row order.
    pub fn entries(&self) -> impl Iterator<Item = (Row, &'static [Row])> + '_ {
        self.legal.iter().copied()
    }

    /// Pairs `(src, dst)` that every complete graph must carry: a destination
    /// row whose only legal source is a single row must be fed from it.
    pub fn required_pairs(&self) -> Vec<(Row, Row)> {
        self.legal
            .iter()
            .filter_map(|(dst, srcs)| match srcs {
                [only] => Some((*only, *dst)),
                _ => None,
            })
            .collect()
    }

    /// The single row `dst` must be fed from, if there is exactly one.
    pub fn required_source(&self, dst: Row) -> Option<Row> {
        match self.legal_sources(dst) {
            [only] => Some(*only),
            _ => None,
        }
    }
}

impl GraphType {
    /// Every graph type.
    pub const ALL: [Self; 7] = [
        Self::Primitive,
        Self::Empty,
        Self::Standard,
        Self::IfThen,
        Self::IfThenElse,
        Self::ForLoop,
        Self::WhileLoop,
    ];

    /// Presence rule for `row`.
    pub fn presence(self, row: Row) -> RowPresence {
        use RowPresence::{Forbidden, Optional, Required};
        match (self, row) {
            (_, Row::U) => Forbidden,
            (Self::Primitive | Self::Empty | Self::Standard, Row::I | Row::O) => IO,
            (Self::Primitive, Row::A) => Optional,
            (Self::Standard, Row::A | Row::B) => Required,
            (Self::Primitive | Self::Empty | Self::Standard, _) => Forbidden,
            (_, Row::O) => O_SYM,
            (_, Row::P) => P_SYM,
            (_, Row::I | Row::A) => Required,
            (Self::IfThen | Self::IfThenElse, Row::F) => Required,
            (Self::IfThenElse, Row::B) => Required,
            (Self::ForLoop, Row::L) => Required,
            (Self::ForLoop, Row::S) => RowPresence::Symmetric {
                partner: Row::T,
                required: false,
            },
            (Self::ForLoop, Row::T) => RowPresence::Symmetric {
                partner: Row::S,
                required: false,
            },
            (Self::WhileLoop, Row::W) => RowPresence::Symmetric {
                partner: Row::X,
                required: true,
            },
            (Self::WhileLoop, Row::X) => RowPresence::Symmetric {
                partner: Row::W,
                required: true,
            },
            _ => Forbidden,
        }
    }

    /// Legal connections.
    pub fn connectivity(self) -> ConnectivityTable {
        use Row::{A, B, F, I, L, O, P, S, T, W, X};
        let legal: &'static [(Row, &'static [Row])] = match self {
            Self::Primitive => &[(A, &[I]), (O, &[I, A])],
            Self::Empty => &[],
            Self::Standard => &[(A, &[I]), (B, &[I, A]), (O, &[I, A, B])],
            Self::IfThen => &[(F, &[I]), (A, &[I]), (O, &[I, A]), (P, &[I])],
            Self::IfThenElse => &[(F, &[I]), (A, &[I]), (B, &[I]), (O, &[I, A]), (P, &[I, B])],
            Self::ForLoop => &[
                (L, &[I]),
                (S, &[I]),
                (T, &[A]),
                (A, &[I, L, S]),
                (O, &[I, A]),
                (P, &[I, S]),
            ],
            Self::WhileLoop => &[(W, &[I]), (X, &[A]), (A, &[I, W]), (O, &[I, A]), (P, &[I])],
        };
        ConnectivityTable { legal }
    }

    /// `true` for the branching and looping types.
    pub fn is_conditional(self) -> bool {
        matches!(
            self,
            Self::IfThen | Self::IfThenElse | Self::ForLoop | Self::WhileLoop
        )
    }

    /// `true` when unconnected destinations are acceptable. Codons and
    /// placeholders are opaque and carry no internal wiring obligations.
    pub fn is_wiring_exempt(self) -> bool {
        matches!(self, Self::Primitive | Self::Empty)
    }

    /// Name used by the JSON form.
    pub fn name(self) -> &'static str {
        match self {
            Self::Primitive => "Primitive",
            Self::Empty => "Empty",
            Self::Standard => "Standard",
            Self::IfThen => "IfThen",
            Self::IfThenElse => "IfThenElse",
            Self::ForLoop => "ForLoop",
            Self::WhileLoop => "WhileLoop",
        }
    }
}

impl fmt::Display for GraphType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GraphType {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| GraphError::UnknownGraphType(s.to_owned()))
    }
}
