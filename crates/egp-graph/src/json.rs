// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! JSON form of a connection graph.
//!
//! ```json
//! {"graph_type": "Standard",
//!  "rows": {"A": [["I", 0, [3]]],
//!           "O": [["A", 0, [3]], [null, null, [5]]],
//!           "U": [["I", 1, [5]]]}}
//! ```
//!
//! Each destination row lists its end points in index order as
//! `[src_row, src_index, ept]`, with `null`s when unconnected. Source end
//! points are not listed directly: each takes the type of its first consumer,
//! and row `U` lists, in (row, index) order, every source that type would not
//! describe (unconnected sources, or sources whose first consumer has a
//! different type). A row that is present but lists nothing appears as `[]`.

use std::collections::BTreeMap;

use egp_types::{Ept, TypeRegistry, TypeUid};
use serde::{Deserialize, Serialize};

use crate::endpoint::EndPointRef;
use crate::error::GraphError;
use crate::graph::ConnectionGraph;
use crate::row::{EndPointClass, Row};

type EndPointJson = (Option<String>, Option<usize>, Vec<TypeUid>);

#[derive(Serialize, Deserialize)]
struct GraphJson {
    graph_type: String,
    rows: BTreeMap<String, Vec<EndPointJson>>,
}

fn malformed(msg: impl Into<String>) -> GraphError {
    GraphError::MalformedJson(msg.into())
}

impl ConnectionGraph {
    /// Serialises the graph.
    ///
    /// # Errors
    /// [`GraphError::Json`] if serialisation fails.
    pub fn to_json(&self) -> Result<String, GraphError> {
        let mut rows: BTreeMap<String, Vec<EndPointJson>> = BTreeMap::new();
        for (row, ifaces) in self.rows() {
            let entries = ifaces
                .dst
                .iter()
                .enumerate()
                .map(|(index, ept)| {
                    let src = self.source_of(EndPointRef::new(row, index));
                    (
                        src.map(|s| s.row.to_string()),
                        src.map(|s| s.index),
                        ept.flat().to_vec(),
                    )
                })
                .collect();
            rows.insert(row.to_string(), entries);
        }
        let unlisted: Vec<EndPointJson> = self
            .endpoints(EndPointClass::Src)
            .filter(|ep| self.first_consumer_ept(ep.reference()) != Some(ep.ept))
            .map(|ep| {
                (
                    Some(ep.row.to_string()),
                    Some(ep.index),
                    ep.ept.flat().to_vec(),
                )
            })
            .collect();
        if !unlisted.is_empty() {
            rows.insert(Row::U.to_string(), unlisted);
        }
        let json = GraphJson {
            graph_type: self.graph_type().name().to_owned(),
            rows,
        };
        Ok(serde_json::to_string(&json)?)
    }

    fn first_consumer_ept(&self, src: EndPointRef) -> Option<&Ept> {
        self.consumers(src)
            .next()
            .and_then(|dst| self.ept(dst.row, EndPointClass::Dst, dst.index))
    }

    /// Reads a graph, decoding every type against `registry`.
    ///
    /// The result is structurally consistent (every referenced source exists)
    /// but not validated against its graph type.
    ///
    /// # Errors
    /// [`GraphError::Json`], [`GraphError::UnknownGraphType`],
    /// [`GraphError::UnknownRow`], [`GraphError::Type`] for undecodable
    /// types, or [`GraphError::MalformedJson`] when source indices are not
    /// contiguous or their types cannot be recovered.
    pub fn from_json(json: &str, registry: &TypeRegistry) -> Result<Self, GraphError> {
        let parsed: GraphJson = serde_json::from_str(json)?;
        let mut graph = Self::new(parsed.graph_type.parse()?);
        let mut listed: BTreeMap<EndPointRef, Ept> = BTreeMap::new();
        let mut implied: BTreeMap<EndPointRef, Vec<Ept>> = BTreeMap::new();

        for (key, entries) in parsed.rows {
            let row: Row = key.parse()?;
            if row == Row::U {
                for (src_row, src_index, uids) in entries {
                    let src = source_ref(src_row, src_index)?
                        .ok_or_else(|| malformed("row U entries must name a source"))?;
                    listed.insert(src, registry.decode(&uids)?);
                }
                continue;
            }
            graph.add_row(row);
            for (index, (src_row, src_index, uids)) in entries.into_iter().enumerate() {
                let ept = registry.decode(&uids)?;
                graph.push_endpoint(row, EndPointClass::Dst, ept.clone())?;
                if let Some(src) = source_ref(src_row, src_index)? {
                    graph.connect_unchecked(src, EndPointRef::new(row, index));
                    implied.entry(src).or_default().push(ept);
                }
            }
        }

        let mut sources: BTreeMap<EndPointRef, Ept> = BTreeMap::new();
        for (src, epts) in implied {
            if let Some(ept) = listed.remove(&src) {
                sources.insert(src, ept);
            } else if epts.windows(2).all(|w| w[0] == w[1]) {
                sources.insert(src, epts.into_iter().next().ok_or_else(|| malformed("empty"))?);
            } else {
                return Err(malformed(format!("type of source {src} is ambiguous")));
            }
        }
        sources.extend(listed);

        let mut expected = EndPointRef::new(Row::I, 0);
        for (src, ept) in sources {
            if src.row != expected.row {
                expected = EndPointRef::new(src.row, 0);
            }
            if src != expected {
                return Err(malformed(format!(
                    "source indices of row {} are not contiguous at {}",
                    src.row, src.index
                )));
            }
            graph.push_endpoint(src.row, EndPointClass::Src, ept)?;
            expected.index += 1;
        }
        Ok(graph)
    }
}

fn source_ref(row: Option<String>, index: Option<usize>) -> Result<Option<EndPointRef>, GraphError> {
    match (row, index) {
        (Some(row), Some(index)) => Ok(Some(EndPointRef::new(row.parse()?, index))),
        (None, None) => Ok(None),
        _ => Err(malformed("source row and index must both be set or both null")),
    }
}
