// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Bit layout of 32-bit end point type UIDs.
//!
//! ```text
//!  31 | 30..28 | 27 | 26..24 | 23..16   | 15..0
//!  0  |   TT   | IO |   FX   | reserved | XUID
//! ```
//!
//! - `TT`: number of template types (nested EPTs) the type takes, 0..=7.
//! - `IO`: output-wildcard flag. When set, XUID is `position << 8 | depth`
//!   naming the input the output type resolves from.
//! - `FX`: fixed-instance index, 0 for none, 1..=7 for `object1`..`object7`.
//! - `XUID`: the type id proper.
//!
//! Bit 31 and bits 16..=23 are reserved and must be zero, so every valid UID
//! is a non-negative `i32` on the wire.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

const TT_SHIFT: u32 = 28;
const TT_MASK: u32 = 0x7;
const IO_BIT: u32 = 1 << 27;
const FX_SHIFT: u32 = 24;
const FX_MASK: u32 = 0x7;
const XUID_MASK: u32 = 0xFFFF;
const RESERVED_MASK: u32 = 0x8000_0000 | 0x00FF_0000;

/// Largest template-type count a UID can carry.
pub const MAX_TEMPLATE_TYPES: u8 = 7;

/// Largest fixed-instance index a UID can carry.
pub const MAX_FIXED_INSTANCE: u8 = 7;

/// Bit-packed 32-bit end point type identifier.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct TypeUid(i32);

/// Identifies which input, and how deep inside it, an output wildcard
/// resolves from.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct WildcardOrigin {
    /// Index of the input end point in the owning interface.
    pub position: u8,
    /// How many times to descend through the first template argument.
    pub depth: u8,
}

impl TypeUid {
    /// Builds a plain (non-wildcard) UID.
    ///
    /// # Errors
    /// [`TypeError::FieldOutOfRange`] when `template_type_count` exceeds 7 or
    /// `fixed_instance` is outside 1..=7.
    pub fn new(
        template_type_count: u8,
        fixed_instance: Option<u8>,
        xuid: u16,
    ) -> Result<Self, TypeError> {
        let bits = pack_common(template_type_count, fixed_instance)? | u32::from(xuid);
        Ok(Self(bits as i32))
    }

    /// Builds an output-wildcard UID resolving from `origin`.
    ///
    /// # Errors
    /// [`TypeError::FieldOutOfRange`] when `template_type_count` exceeds 7.
    pub fn wildcard(template_type_count: u8, origin: WildcardOrigin) -> Result<Self, TypeError> {
        let xuid = (u32::from(origin.position) << 8) | u32::from(origin.depth);
        let bits = pack_common(template_type_count, None)? | IO_BIT | xuid;
        Ok(Self(bits as i32))
    }

    /// Validates a raw wire value.
    ///
    /// # Errors
    /// [`TypeError::ReservedBits`] when bit 31 or bits 16..=23 are set.
    pub fn from_raw(raw: i32) -> Result<Self, TypeError> {
        if (raw as u32) & RESERVED_MASK != 0 {
            return Err(TypeError::ReservedBits(raw));
        }
        let uid = Self(raw);
        if uid.is_wildcard() && uid.fixed_instance().is_some() {
            return Err(TypeError::MalformedEpt(format!(
                "uid {uid} is both wildcard and fixed-instance"
            )));
        }
        Ok(uid)
    }

    /// Raw wire value.
    pub fn raw(self) -> i32 {
        self.0
    }

    fn bits(self) -> u32 {
        self.0 as u32
    }

    /// Number of nested EPTs this type requires (`TT`).
    pub fn template_type_count(self) -> u8 {
        // Masked to three bits.
        ((self.bits() >> TT_SHIFT) & TT_MASK) as u8
    }

    /// `true` when the `IO` flag is set.
    pub fn is_wildcard(self) -> bool {
        self.bits() & IO_BIT != 0
    }

    /// Fixed-instance index (`FX`), `None` when zero.
    pub fn fixed_instance(self) -> Option<u8> {
        match ((self.bits() >> FX_SHIFT) & FX_MASK) as u8 {
            0 => None,
            fx => Some(fx),
        }
    }

    /// The 16-bit XUID field.
    pub fn xuid(self) -> u16 {
        (self.bits() & XUID_MASK) as u16
    }

    /// Decodes the XUID as a wildcard origin when `IO` is set.
    pub fn wildcard_origin(self) -> Option<WildcardOrigin> {
        if !self.is_wildcard() {
            return None;
        }
        let xuid = self.xuid();
        Some(WildcardOrigin {
            position: (xuid >> 8) as u8,
            depth: (xuid & 0xFF) as u8,
        })
    }
}

fn pack_common(template_type_count: u8, fixed_instance: Option<u8>) -> Result<u32, TypeError> {
    if template_type_count > MAX_TEMPLATE_TYPES {
        return Err(TypeError::FieldOutOfRange {
            field: "template_type_count",
            value: u32::from(template_type_count),
        });
    }
    let fx = match fixed_instance {
        None => 0,
        Some(fx) if (1..=MAX_FIXED_INSTANCE).contains(&fx) => fx,
        Some(fx) => {
            return Err(TypeError::FieldOutOfRange {
                field: "fixed_instance",
                value: u32::from(fx),
            })
        }
    };
    Ok((u32::from(template_type_count) << TT_SHIFT) | (u32::from(fx) << FX_SHIFT))
}

impl TryFrom<i32> for TypeUid {
    type Error = TypeError;

    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        Self::from_raw(raw)
    }
}

impl From<TypeUid> for i32 {
    fn from(uid: TypeUid) -> Self {
        uid.0
    }
}

impl fmt::Display for TypeUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.bits())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn fields_round_trip_through_packing() {
        let uid = TypeUid::new(2, Some(3), 0xBEEF).unwrap();
        assert_eq!(uid.template_type_count(), 2);
        assert_eq!(uid.fixed_instance(), Some(3));
        assert_eq!(uid.xuid(), 0xBEEF);
        assert!(!uid.is_wildcard());
        assert!(uid.raw() >= 0);
    }

    #[test]
    fn wildcard_origin_is_packed_into_xuid() {
        let origin = WildcardOrigin {
            position: 4,
            depth: 1,
        };
        let uid = TypeUid::wildcard(0, origin).unwrap();
        assert!(uid.is_wildcard());
        assert_eq!(uid.wildcard_origin(), Some(origin));
        assert_eq!(uid.fixed_instance(), None);
    }

    #[test]
    fn reserved_bits_are_rejected() {
        assert!(matches!(
            TypeUid::from_raw(-1),
            Err(TypeError::ReservedBits(-1))
        ));
        assert!(matches!(
            TypeUid::from_raw(0x0001_0000),
            Err(TypeError::ReservedBits(_))
        ));
    }

    #[test]
    fn out_of_range_fields_are_rejected() {
        assert!(TypeUid::new(8, None, 1).is_err());
        assert!(TypeUid::new(0, Some(0), 1).is_err());
        assert!(TypeUid::new(0, Some(8), 1).is_err());
    }

    #[test]
    fn serde_uses_plain_integers() {
        let uid = TypeUid::new(1, None, 7).unwrap();
        let json = serde_json::to_string(&uid).unwrap();
        assert_eq!(json, uid.raw().to_string());
        let back: TypeUid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, uid);
        assert!(serde_json::from_str::<TypeUid>("-5").is_err());
    }
}
