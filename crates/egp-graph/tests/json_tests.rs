// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(clippy::unwrap_used, clippy::expect_used)]
//! JSON form of connection graphs.

use egp_dry_tests::{codon, ept, fixture_registry, wire_greedily};
use egp_graph::insertion::stack;
use egp_graph::{ConnectionGraph, EndPointClass, EndPointRef, GraphError, GraphType, Row};
use serde_json::{json, Value};

fn wired(reg: &egp_types::TypeRegistry) -> ConnectionGraph {
    let a = codon(reg, &["str"], &["int"]);
    let b = codon(reg, &["int"], &["str"]);
    let mut gc = stack(&b, &a).unwrap();
    wire_greedily(&mut gc, reg);
    gc.graph().clone()
}

#[test]
fn fully_consumed_sources_need_no_u_row() {
    let reg = fixture_registry();
    let graph = wired(&reg);
    let value: Value = serde_json::from_str(&graph.to_json().unwrap()).unwrap();
    assert_eq!(
        value,
        json!({
            "graph_type": "Standard",
            "rows": {
                "A": [["I", 0, [5]]],
                "B": [["A", 0, [3]]],
                "I": [],
                "O": [["B", 0, [5]]],
            }
        })
    );
    assert_eq!(ConnectionGraph::from_json(&graph.to_json().unwrap(), &reg).unwrap(), graph);
}

#[test]
fn u_row_lists_unused_and_retyped_sources_in_order() {
    let reg = fixture_registry();
    let mut graph = wired(&reg);
    graph.push_endpoint(Row::I, EndPointClass::Src, ept(&reg, "list[int]")).unwrap();
    graph.push_endpoint(Row::I, EndPointClass::Src, ept(&reg, "int")).unwrap();
    graph.push_endpoint(Row::O, EndPointClass::Dst, ept(&reg, "Number")).unwrap();
    graph
        .connect(EndPointRef::new(Row::I, 2), EndPointRef::new(Row::O, 1))
        .unwrap();

    let value: Value = serde_json::from_str(&graph.to_json().unwrap()).unwrap();
    assert_eq!(
        value["rows"]["U"],
        json!([["I", 1, [268435463, 3]], ["I", 2, [3]]])
    );
    assert_eq!(value["rows"]["O"][1], json!(["I", 2, [2]]));
    assert_eq!(ConnectionGraph::from_json(&graph.to_json().unwrap(), &reg).unwrap(), graph);
}

#[test]
fn unconnected_destinations_are_null() {
    let reg = fixture_registry();
    let mut graph = wired(&reg);
    graph.disconnect(EndPointRef::new(Row::B, 0));
    let value: Value = serde_json::from_str(&graph.to_json().unwrap()).unwrap();
    assert_eq!(value["rows"]["B"], json!([[null, null, [3]]]));
    // A[0] lost its only consumer.
    assert_eq!(value["rows"]["U"], json!([["A", 0, [3]]]));
    let back = ConnectionGraph::from_json(&graph.to_json().unwrap(), &reg).unwrap();
    assert_eq!(back.unconnected(), vec![EndPointRef::new(Row::B, 0)]);
    assert_eq!(back, graph);
}

#[test]
fn gaps_in_source_indices_are_malformed() {
    let reg = fixture_registry();
    let text = json!({
        "graph_type": "Primitive",
        "rows": {"I": [], "O": [["I", 1, [3]]]}
    })
    .to_string();
    assert!(matches!(
        ConnectionGraph::from_json(&text, &reg),
        Err(GraphError::MalformedJson(_))
    ));
}

#[test]
fn conflicting_consumer_types_are_ambiguous() {
    let reg = fixture_registry();
    let text = json!({
        "graph_type": "Primitive",
        "rows": {"I": [], "O": [["I", 0, [3]], ["I", 0, [4]]]}
    })
    .to_string();
    assert!(matches!(
        ConnectionGraph::from_json(&text, &reg),
        Err(GraphError::MalformedJson(_))
    ));

    let listed = json!({
        "graph_type": "Primitive",
        "rows": {"I": [], "O": [["I", 0, [2]], ["I", 0, [2]]], "U": [["I", 0, [3]]]}
    })
    .to_string();
    let graph = ConnectionGraph::from_json(&listed, &reg).unwrap();
    assert_eq!(graph.ept(Row::I, EndPointClass::Src, 0), Some(&ept(&reg, "int")));
    assert_eq!(graph.fan_out(EndPointRef::new(Row::I, 0)), 2);
}

#[test]
fn unknown_names_are_rejected() {
    let reg = fixture_registry();
    let bad_type = json!({"graph_type": "Conditional", "rows": {}}).to_string();
    assert!(matches!(
        ConnectionGraph::from_json(&bad_type, &reg),
        Err(GraphError::UnknownGraphType(_))
    ));
    let bad_row = json!({"graph_type": "Standard", "rows": {"Q": []}}).to_string();
    assert!(matches!(
        ConnectionGraph::from_json(&bad_row, &reg),
        Err(GraphError::UnknownRow(_))
    ));
    let bad_uid = json!({"graph_type": "Standard", "rows": {"O": [[null, null, [99]]]}}).to_string();
    assert!(matches!(
        ConnectionGraph::from_json(&bad_uid, &reg),
        Err(GraphError::Type(_))
    ));
    assert_eq!(
        ConnectionGraph::from_json(&json!({"graph_type": "Empty", "rows": {}}).to_string(), &reg)
            .unwrap()
            .graph_type(),
        GraphType::Empty
    );
}
