// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Stack, inverse stack, wrap and restructure.

use egp_dry_tests::{codon, empty, fixture_registry, iface, wire_greedily};
use egp_graph::insertion::{insert, inverse_stack, restructure, stack, wrap};
use egp_graph::{
    Above, EndPointClass, EndPointRef, Freeze, GcRef, GraphError, GraphType, InsertOp, Row,
};
use egp_types::TypeRegistry;

fn ep(row: Row, index: usize) -> EndPointRef {
    EndPointRef::new(row, index)
}

/// `str → A(str → int) → B(int → str) → str`, fully wired.
fn pipeline(reg: &TypeRegistry) -> GcRef {
    let a = codon(reg, &["str"], &["int"]);
    let b = codon(reg, &["int"], &["str"]);
    let mut gc = stack(&b, &a).unwrap();
    wire_greedily(&mut gc, reg);
    assert!(gc.validate(reg).is_valid());
    gc.freeze()
}

#[test]
fn stack_runs_the_insert_first() {
    let reg = fixture_registry();
    let tgc = codon(&reg, &["int"], &["str"]);
    let igc = codon(&reg, &["float", "bool"], &["int"]);
    let rgc = stack(&tgc, &igc).unwrap();

    assert_eq!(rgc.graph_type(), GraphType::Standard);
    assert_eq!(rgc.sub_gc(Row::A), Some(&igc));
    assert_eq!(rgc.sub_gc(Row::B), Some(&tgc));
    assert_eq!(rgc.inputs(), igc.inputs());
    assert_eq!(rgc.outputs(), tgc.outputs());
    assert_eq!(rgc.graph().source_of(ep(Row::A, 1)), Some(ep(Row::I, 1)));
    assert_eq!(rgc.graph().source_of(ep(Row::O, 0)), Some(ep(Row::B, 0)));
    assert_eq!(rgc.graph().unconnected(), vec![ep(Row::B, 0)]);
}

#[test]
fn inverse_stack_runs_the_target_first() {
    let reg = fixture_registry();
    let tgc = codon(&reg, &["int"], &["str"]);
    let igc = codon(&reg, &["str", "str"], &["bool"]);
    let rgc = inverse_stack(&tgc, &igc).unwrap();
    assert_eq!(rgc.sub_gc(Row::A), Some(&tgc));
    assert_eq!(rgc.sub_gc(Row::B), Some(&igc));
    assert_eq!(rgc.inputs(), tgc.inputs());
    assert_eq!(rgc.outputs(), igc.outputs());
    assert_eq!(rgc.graph().unconnected(), vec![ep(Row::B, 0), ep(Row::B, 1)]);
}

#[test]
fn placeholders_cannot_be_stacked() {
    let reg = fixture_registry();
    let placeholder = empty(&reg, &["int"], &["int"]);
    let real = codon(&reg, &["int"], &["int"]);
    assert!(matches!(
        stack(&placeholder, &real),
        Err(GraphError::IncompatibleGraphType { role: "target", .. })
    ));
    assert!(matches!(
        inverse_stack(&real, &placeholder),
        Err(GraphError::IncompatibleGraphType { role: "insert", .. })
    ));
}

#[test]
fn wrap_adopts_the_placeholder_interface_and_keeps_inner_wiring() {
    let reg = fixture_registry();
    let igc = pipeline(&reg);
    let tgc = empty(&reg, &["float"], &["bool"]);
    let rgc = wrap(&tgc, &igc).unwrap();

    assert_eq!(rgc.inputs(), &iface(&reg, &["float"]));
    assert_eq!(rgc.outputs(), &iface(&reg, &["bool"]));
    assert_eq!(rgc.sub_gc(Row::A), igc.sub_gc(Row::A));
    assert_eq!(rgc.graph().source_of(ep(Row::B, 0)), Some(ep(Row::A, 0)));
    assert_eq!(rgc.graph().unconnected(), vec![ep(Row::A, 0), ep(Row::O, 0)]);
}

#[test]
fn wrap_needs_a_placeholder_target_and_standard_insert() {
    let reg = fixture_registry();
    let standard = pipeline(&reg);
    let placeholder = empty(&reg, &["int"], &["int"]);
    let primitive = codon(&reg, &["int"], &["int"]);
    assert!(matches!(
        wrap(&standard, &standard),
        Err(GraphError::IncompatibleGraphType { role: "target", graph_type: GraphType::Standard, .. })
    ));
    assert!(matches!(
        wrap(&placeholder, &primitive),
        Err(GraphError::IncompatibleGraphType { role: "insert", graph_type: GraphType::Primitive, .. })
    ));
}

#[test]
fn restructure_above_b_builds_a_fetal_graph() {
    let reg = fixture_registry();
    let tgc = pipeline(&reg);
    let igc = codon(&reg, &["int"], &["float"]);
    let insertion = restructure(&reg, &tgc, &igc, Above::B).unwrap();

    let fetal = insertion.fetal.as_ref().unwrap();
    assert_eq!(fetal.row, Row::B);
    assert_eq!(fetal.fgc.sub_gc(Row::A), Some(&igc));
    assert_eq!(fetal.fgc.sub_gc(Row::B), tgc.sub_gc(Row::B));
    // The displaced row's single feeder (A[0], int) becomes the fetal input.
    assert_eq!(fetal.fgc.inputs(), &iface(&reg, &["int"]));
    assert_eq!(fetal.fgc.outputs(), &iface(&reg, &["str", "float"]));
    assert_eq!(fetal.fgc.graph().source_of(ep(Row::B, 0)), Some(ep(Row::I, 0)));
    assert_eq!(fetal.fgc.graph().unconnected(), vec![ep(Row::A, 0)]);

    assert!(insertion.rgc.sub_gc(Row::B).is_none());
    assert_eq!(insertion.rgc.graph().source_of(ep(Row::B, 0)), Some(ep(Row::A, 0)));
    assert_eq!(insertion.rgc.graph().source_of(ep(Row::O, 0)), Some(ep(Row::B, 0)));
}

#[test]
fn assembling_a_restructure_grafts_in_canonical_order() {
    let reg = fixture_registry();
    let tgc = pipeline(&reg);
    let igc = codon(&reg, &["int"], &["float"]);
    let gc = insert(&reg, InsertOp::Restructure(Above::B), &tgc, &igc)
        .unwrap()
        .assemble()
        .unwrap();

    let fgc = gc.sub_gc(Row::B).unwrap();
    assert_eq!(fgc.graph_type(), GraphType::Standard);
    assert_eq!(fgc.outputs(), &iface(&reg, &["float", "str"]));
    // The new float output is an unused source; O still reads str.
    assert_eq!(gc.graph().source_of(ep(Row::O, 0)), Some(ep(Row::B, 1)));
    assert_eq!(gc.graph().unused_sources(), vec![ep(Row::B, 0)]);
    assert_eq!(
        gc.graph().ept(Row::B, EndPointClass::Src, 1),
        Some(&iface(&reg, &["str"]).epts()[0])
    );
    // The inserted code's input is the fetal graph's business.
    assert!(gc.validate(&reg).is_valid());
    assert_eq!(fgc.graph().unconnected(), vec![ep(Row::A, 0)]);
}

#[test]
fn restructure_above_o_puts_the_insert_last() {
    let reg = fixture_registry();
    let tgc = pipeline(&reg);
    let igc = codon(&reg, &["str"], &["bool"]);
    let insertion = restructure(&reg, &tgc, &igc, Above::O).unwrap();
    let fetal = insertion.fetal.unwrap();
    assert_eq!(fetal.row, Row::B);
    assert_eq!(fetal.fgc.sub_gc(Row::A), tgc.sub_gc(Row::B));
    assert_eq!(fetal.fgc.sub_gc(Row::B), Some(&igc));
    assert_eq!(fetal.fgc.graph().source_of(ep(Row::O, 1)), Some(ep(Row::B, 0)));
}

#[test]
fn fetal_inputs_take_the_resolved_type_of_wildcard_feeders() {
    let reg = fixture_registry();
    // A echoes its input type; B reads it as int.
    let a = codon(&reg, &["int"], &["Input0"]);
    let b = codon(&reg, &["int"], &["str"]);
    let mut tgc = stack(&b, &a).unwrap();
    wire_greedily(&mut tgc, &reg);
    assert!(tgc.graph().unconnected().is_empty());
    let tgc = tgc.freeze();

    let igc = codon(&reg, &["bool"], &["float"]);
    let insertion = restructure(&reg, &tgc, &igc, Above::B).unwrap();
    let fetal = insertion.fetal.unwrap();
    assert_eq!(fetal.fgc.inputs(), &iface(&reg, &["int"]));
    assert!(fetal.fgc.inputs().iter().all(|ept| !ept.has_wildcard()));
    assert_eq!(
        insertion.rgc.graph().interface(Row::B, EndPointClass::Dst),
        Some(&iface(&reg, &["int"]))
    );
}

#[test]
fn restructure_needs_a_standard_target() {
    let reg = fixture_registry();
    let primitive = codon(&reg, &["int"], &["int"]);
    let err = restructure(&reg, &primitive, &primitive, Above::A).unwrap_err();
    assert!(matches!(
        err,
        GraphError::IncompatibleGraphType { role: "target", graph_type: GraphType::Primitive, .. }
    ));
}
