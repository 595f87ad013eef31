// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Errors raised by the type registry and the EPT codec.

use thiserror::Error;

use crate::uid::TypeUid;

/// Errors emitted while registering, resolving, encoding or decoding types.
///
/// Every variant indicates corrupt input or an invalid registry; callers are
/// expected to surface them rather than work around them.
#[derive(Debug, Error)]
pub enum TypeError {
    /// The UID is not present in the registry.
    #[error("unknown type uid: {0}")]
    UnknownTypeUid(TypeUid),
    /// No type with this name is registered.
    #[error("unknown type name: {0:?}")]
    UnknownTypeName(String),
    /// Nesting arity does not match the template-type counts of the heads.
    #[error("malformed end point type: {0}")]
    MalformedEpt(String),
    /// A raw UID has bits set in a reserved field.
    #[error("reserved uid bits set in {0:#010x}")]
    ReservedBits(i32),
    /// A UID field value does not fit its bit width.
    #[error("uid field {field} out of range: {value}")]
    FieldOutOfRange {
        /// Name of the offending field.
        field: &'static str,
        /// Rejected value.
        value: u32,
    },
    /// A type with this name is already registered.
    #[error("duplicate type name: {0:?}")]
    DuplicateName(String),
    /// A type with this UID is already registered.
    #[error("duplicate type uid: {0}")]
    DuplicateUid(TypeUid),
    /// Type names are limited to 128 characters.
    #[error("type name too long ({0} chars, max 128)")]
    NameTooLong(usize),
    /// A declared attribute disagrees with the bits packed into the UID.
    #[error("type {name:?}: declared {field} disagrees with its uid")]
    UidFieldMismatch {
        /// Type being registered.
        name: String,
        /// Attribute that disagrees.
        field: &'static str,
    },
    /// A parent must be registered before its children.
    #[error("type {name:?}: unknown parent {parent}")]
    UnknownParent {
        /// Type being registered.
        name: String,
        /// Missing parent (name or uid rendering).
        parent: String,
    },
    /// The nominal form (e.g. `list[int]`) could not be parsed.
    #[error("nominal type parse error at {position}: {message}")]
    Nominal {
        /// Byte offset into the input.
        position: usize,
        /// What was expected.
        message: String,
    },
    /// A wildcard output type refers to an input that does not exist.
    #[error("wildcard unresolved: input {position} depth {depth}")]
    WildcardUnresolved {
        /// Input position named by the wildcard.
        position: u8,
        /// Nesting depth named by the wildcard.
        depth: u8,
    },
    /// Type definition JSON could not be read.
    #[error("type definition json: {0}")]
    Json(#[from] serde_json::Error),
}
