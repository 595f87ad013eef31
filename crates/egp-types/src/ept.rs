// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! End point types and their flat encoding.
//!
//! An [`Ept`] is stored in its canonical flat form: the pre-order walk of the
//! type tree, one [`TypeUid`] per node. Every head's `TT` field says how many
//! nested EPTs follow it, so the flat form is self-delimiting and the tree can
//! be recovered from it without a registry.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::uid::TypeUid;

/// A fully parameterised end point type.
///
/// Equality is equality of the flattened UID sequences. Ordering is by
/// flattened length first, so scalar types sort before containers, then
/// lexicographically by UID.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "Vec<TypeUid>", into = "Vec<TypeUid>")]
pub struct Ept {
    flat: Box<[TypeUid]>,
}

impl Ept {
    /// A type with no template arguments.
    ///
    /// # Errors
    /// [`TypeError::MalformedEpt`] when `head` requires template arguments.
    pub fn scalar(head: TypeUid) -> Result<Self, TypeError> {
        Self::new(head, [])
    }

    /// Builds `head[args...]`.
    ///
    /// # Errors
    /// [`TypeError::MalformedEpt`] when the number of arguments differs from
    /// the head's template-type count.
    pub fn new(head: TypeUid, args: impl IntoIterator<Item = Ept>) -> Result<Self, TypeError> {
        let mut flat = vec![head];
        let mut count = 0usize;
        for arg in args {
            flat.extend_from_slice(&arg.flat);
            count += 1;
        }
        if count != usize::from(head.template_type_count()) {
            return Err(TypeError::MalformedEpt(format!(
                "{head} takes {} template types, got {count}",
                head.template_type_count()
            )));
        }
        Ok(Self {
            flat: flat.into_boxed_slice(),
        })
    }

    /// Rebuilds an EPT from its flat form, checking arity only.
    ///
    /// Use [`crate::TypeRegistry::decode`] when the UIDs must also be known
    /// to a registry.
    ///
    /// # Errors
    /// [`TypeError::MalformedEpt`] when the sequence is empty, truncated or has
    /// trailing elements.
    pub fn from_flat(uids: &[TypeUid]) -> Result<Self, TypeError> {
        match subtree_end(uids, 0) {
            Some(end) if end == uids.len() => Ok(Self {
                flat: uids.into(),
            }),
            Some(end) => Err(TypeError::MalformedEpt(format!(
                "{} trailing uids after a complete type",
                uids.len() - end
            ))),
            None => Err(TypeError::MalformedEpt(format!(
                "sequence of {} uids ends inside a template",
                uids.len()
            ))),
        }
    }

    /// The outermost type.
    pub fn head(&self) -> TypeUid {
        self.flat[0]
    }

    /// Flattened pre-order UID sequence.
    pub fn flat(&self) -> &[TypeUid] {
        &self.flat
    }

    /// Number of elements in the flattened sequence.
    pub fn len(&self) -> usize {
        self.flat.len()
    }

    /// Always `false`: an EPT has at least its head.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// `true` when the EPT has no template arguments.
    pub fn is_scalar(&self) -> bool {
        self.flat.len() == 1
    }

    /// The template arguments, in declaration order.
    pub fn args(&self) -> Vec<Ept> {
        split_args(&self.flat)
            .into_iter()
            .map(|slice| Self {
                flat: slice.into(),
            })
            .collect()
    }

    /// `true` when any element of the EPT is an output wildcard.
    pub fn has_wildcard(&self) -> bool {
        self.flat.iter().any(|uid| uid.is_wildcard())
    }
}

/// Flattens an EPT into its UID sequence.
pub fn encode(ept: &Ept) -> Vec<TypeUid> {
    ept.flat.to_vec()
}

/// Flattens a whole interface (a sequence of EPTs) into one UID stream.
pub fn encode_sequence<'a>(epts: impl IntoIterator<Item = &'a Ept>) -> Vec<TypeUid> {
    epts.into_iter()
        .flat_map(|ept| ept.flat.iter().copied())
        .collect()
}

/// Index one past the subtree rooted at `start`, or `None` if truncated.
pub(crate) fn subtree_end(flat: &[TypeUid], start: usize) -> Option<usize> {
    let mut pending = 1usize;
    let mut i = start;
    while pending > 0 {
        let uid = flat.get(i)?;
        pending = pending - 1 + usize::from(uid.template_type_count());
        i += 1;
    }
    Some(i)
}

/// Splits a well-formed flat EPT into the flat forms of its arguments.
pub(crate) fn split_args(flat: &[TypeUid]) -> Vec<&[TypeUid]> {
    let mut args = Vec::with_capacity(usize::from(flat[0].template_type_count()));
    let mut start = 1;
    while start < flat.len() {
        let end = subtree_end(flat, start).unwrap_or(flat.len());
        args.push(&flat[start..end]);
        start = end;
    }
    args
}

impl Ord for Ept {
    fn cmp(&self, other: &Self) -> Ordering {
        self.flat
            .len()
            .cmp(&other.flat.len())
            .then_with(|| self.flat.cmp(&other.flat))
    }
}

impl PartialOrd for Ept {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl TryFrom<Vec<TypeUid>> for Ept {
    type Error = TypeError;

    fn try_from(uids: Vec<TypeUid>) -> Result<Self, Self::Error> {
        Self::from_flat(&uids)
    }
}

impl From<Ept> for Vec<TypeUid> {
    fn from(ept: Ept) -> Self {
        ept.flat.into_vec()
    }
}
