// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The canonical test type registry.
//!
//! ```text
//! object ─┬─ Number ─┬─ int
//!         │          └─ float
//!         ├─ str
//!         ├─ bool
//!         ├─ list[T]
//!         ├─ dict[K, V]
//!         └─ object1          (fixed instance 1)
//! Input0                      (wildcard: input 0)
//! Element0                    (wildcard: first argument of input 0)
//! ```

use egp_types::TypeRegistry;

/// Type compiler output for the fixture hierarchy.
pub const FIXTURE_TYPES_JSON: &str = r#"[
    {"name": "object", "uid": 1, "kind": "abstract"},
    {"name": "Number", "uid": 2, "kind": "abstract", "parents": ["object"]},
    {"name": "int", "uid": 3, "kind": "concrete", "parents": ["Number"]},
    {"name": "float", "uid": 4, "kind": "concrete", "parents": ["Number"]},
    {"name": "str", "uid": 5, "kind": "concrete", "parents": ["object"]},
    {"name": "bool", "uid": 6, "kind": "concrete", "parents": ["object"]},
    {"name": "list", "uid": 268435463, "kind": "concrete", "parents": ["object"]},
    {"name": "dict", "uid": 536870920, "kind": "concrete", "parents": ["object"]},
    {"name": "object1", "uid": 16777225, "kind": "abstract", "parents": ["object"]},
    {"name": "Input0", "uid": 134217728, "kind": "abstract"},
    {"name": "Element0", "uid": 134217729, "kind": "abstract"}
]"#;

/// Builds the fixture registry.
pub fn fixture_registry() -> TypeRegistry {
    TypeRegistry::from_json(FIXTURE_TYPES_JSON).expect("fixture types are well-formed")
}
