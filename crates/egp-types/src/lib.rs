// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! End point types for the connection graph engine.
//!
//! Every end point of a connection graph carries an [`Ept`]: a possibly nested
//! type such as `list[int]`, stored as the pre-order walk of 32-bit
//! [`TypeUid`]s. The [`TypeRegistry`] holds the type hierarchy and answers the
//! one question the graph layer asks of it: may a value of this type feed that
//! end point ([`TypeRegistry::is_compatible`]).
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::unreadable_literal,
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::missing_panics_doc,
    clippy::indexing_slicing
)]

mod ept;
mod error;
mod nominal;
mod registry;
mod typedef;
mod uid;

/// Flat encoding of end point types.
pub use ept::{encode, encode_sequence, Ept};
/// Registry and codec errors.
pub use error::TypeError;
/// The type hierarchy.
pub use registry::{TypeRegistry, MAX_TYPE_NAME_LEN};
/// Registry entries.
pub use typedef::{TypeDef, TypeKind};
/// Bit-packed identifiers.
pub use uid::{TypeUid, WildcardOrigin, MAX_FIXED_INSTANCE, MAX_TEMPLATE_TYPES};
