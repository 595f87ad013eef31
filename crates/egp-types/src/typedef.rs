// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Type definitions held by the registry.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::uid::{TypeUid, WildcardOrigin};

/// Classification of a type in the hierarchy.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    /// Has instances; may appear on either end of a connection.
    Concrete,
    /// A family of concrete types; matches any descendant.
    Abstract,
    /// Describes types themselves (used by meta-codons).
    Meta,
}

/// Immutable registry entry for one end point type.
///
/// `template_type_count`, `wildcard_origin` and `fixed_instance` are always
/// the values packed into `uid`; [`TypeDef::new`] derives them so they cannot
/// disagree.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TypeDef {
    /// Bit-packed identifier.
    pub uid: TypeUid,
    /// Globally unique name, at most 128 characters.
    pub name: String,
    /// Number of nested EPTs needed to parameterise the type.
    pub template_type_count: u8,
    /// Concrete, abstract or meta.
    pub kind: TypeKind,
    /// Direct supertypes.
    pub parents: BTreeSet<TypeUid>,
    /// Direct subtypes, filled in by the registry as children register.
    pub children: BTreeSet<TypeUid>,
    /// Set for output wildcards.
    pub wildcard_origin: Option<WildcardOrigin>,
    /// Set for `object1`..`object7` style fixed-instance types.
    pub fixed_instance: Option<u8>,
}

impl TypeDef {
    /// Creates a definition whose packed attributes are taken from `uid`.
    pub fn new(uid: TypeUid, name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            uid,
            name: name.into(),
            template_type_count: uid.template_type_count(),
            kind,
            parents: BTreeSet::new(),
            children: BTreeSet::new(),
            wildcard_origin: uid.wildcard_origin(),
            fixed_instance: uid.fixed_instance(),
        }
    }

    /// Adds a direct parent.
    pub fn with_parent(mut self, parent: TypeUid) -> Self {
        self.parents.insert(parent);
        self
    }

    /// `true` for abstract types.
    pub fn is_abstract(&self) -> bool {
        self.kind == TypeKind::Abstract
    }
}
