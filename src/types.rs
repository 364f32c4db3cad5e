//! The coarse value-type model used to drive reference-counting and
//! integer-request decisions in the downstream code generator.
//!
//! This is deliberately not a real type system: no unification, no
//! generics, no subtyping lattice beyond "two different tags both widen to
//! `any`". See for the full contract.

use serde::{Deserialize, Serialize};

/// The closed set of coarse value-type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::IntoStaticStr)]
#[strum(serialize_all = "camelCase")]
pub enum TypeTag {
    Any,
    Boolean,
    Number,
    Int,
    List,
    Map,
    Fiber,
    String,
    StaticString,
    Box,
    Tag,
    TagLiteral,
    /// "Not yet assigned". Must never be observed by code generation on a live path.
    Undefined,
}

impl TypeTag {
    /// `rcCandidate` is true exactly for `list, map, fiber, string, box, any`.
    #[must_use]
    pub fn is_rc_candidate(self) -> bool {
        matches!(
            self,
            Self::List | Self::Map | Self::Fiber | Self::String | Self::Box | Self::Any
        )
    }
}

/// Tag-specific payload data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypePayload {
    None,
    /// Numeric literals that fit in signed 32-bit may be requested as integers
    /// by operator consumers; cleared on storage into a local (`Type::to_local_type`).
    Number { can_request_integer: bool },
    /// Which user-defined tag (enum) type this value belongs to.
    Tag { tag_id: u8 },
}

/// A coarse value type: a [`TypeTag`] plus its rc-candidate flag and payload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Type {
    pub tag: TypeTag,
    pub rc_candidate: bool,
    pub payload: TypePayload,
}

impl Type {
    fn plain(tag: TypeTag) -> Self {
        Self {
            tag,
            rc_candidate: tag.is_rc_candidate(),
            payload: TypePayload::None,
        }
    }

    #[must_use]
    pub fn any() -> Self {
        Self::plain(TypeTag::Any)
    }
    #[must_use]
    pub fn undefined() -> Self {
        Self::plain(TypeTag::Undefined)
    }
    #[must_use]
    pub fn boolean() -> Self {
        Self::plain(TypeTag::Boolean)
    }
    #[must_use]
    pub fn number() -> Self {
        Self {
            tag: TypeTag::Number,
            rc_candidate: false,
            payload: TypePayload::Number {
                can_request_integer: false,
            },
        }
    }
    /// A numeric literal whose value is exactly representable as a signed
    /// 32-bit integer: may be demanded as `i32` by an integer-sensitive
    /// operator context (`<`, bitwise ops), but is not a distinct tag.
    #[must_use]
    pub fn number_or_request_integer() -> Self {
        Self {
            tag: TypeTag::Number,
            rc_candidate: false,
            payload: TypePayload::Number {
                can_request_integer: true,
            },
        }
    }
    #[must_use]
    pub fn int() -> Self {
        Self::plain(TypeTag::Int)
    }
    #[must_use]
    pub fn list() -> Self {
        Self::plain(TypeTag::List)
    }
    #[must_use]
    pub fn map() -> Self {
        Self::plain(TypeTag::Map)
    }
    #[must_use]
    pub fn fiber() -> Self {
        Self::plain(TypeTag::Fiber)
    }
    #[must_use]
    pub fn string() -> Self {
        Self::plain(TypeTag::String)
    }
    #[must_use]
    pub fn static_string() -> Self {
        Self::plain(TypeTag::StaticString)
    }
    #[must_use]
    pub fn boxed() -> Self {
        Self::plain(TypeTag::Box)
    }
    #[must_use]
    pub fn tag(tag_id: u8) -> Self {
        Self {
            tag: TypeTag::Tag,
            rc_candidate: false,
            payload: TypePayload::Tag { tag_id },
        }
    }
    #[must_use]
    pub fn tag_literal() -> Self {
        Self::plain(TypeTag::TagLiteral)
    }

    /// True iff this type is the `NumberOrRequestInteger` form.
    #[must_use]
    pub fn can_request_integer(&self) -> bool {
        matches!(
            self.payload,
            TypePayload::Number {
                can_request_integer: true
            }
        )
    }

    /// Lowers `NumberOrRequestInteger` to plain `number`. Storage into a
    /// local always goes through this.
    #[must_use]
    pub fn to_local_type(&self) -> Self {
        if self.can_request_integer() {
            Self::number()
        } else {
            *self
        }
    }

    /// Logical `and`/`or` return the common tag of both sides, or `any` if they differ.
    /// Numeric payload/rc-candidate nuance is not preserved across the merge.
    #[must_use]
    pub fn common_or_any(a: &Self, b: &Self) -> Self {
        if a.tag == b.tag { Self::plain(a.tag) } else { Self::any() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rc_candidate_matches_invariant_set() {
        for tag in [TypeTag::List, TypeTag::Map, TypeTag::Fiber, TypeTag::String, TypeTag::Box, TypeTag::Any] {
            assert!(tag.is_rc_candidate(), "{tag:?} should be rc-candidate");
        }
        for tag in [
            TypeTag::Boolean,
            TypeTag::Number,
            TypeTag::Int,
            TypeTag::StaticString,
            TypeTag::Tag,
            TypeTag::TagLiteral,
            TypeTag::Undefined,
        ] {
            assert!(!tag.is_rc_candidate(), "{tag:?} should not be rc-candidate");
        }
    }

    #[test]
    fn to_local_type_clears_request_integer() {
        let requested = Type::number_or_request_integer();
        assert!(requested.can_request_integer());
        let stored = requested.to_local_type();
        assert!(!stored.can_request_integer());
        assert_eq!(stored.tag, TypeTag::Number);
    }

    #[test]
    fn common_or_any_widens_on_mismatch() {
        let merged = Type::common_or_any(&Type::string(), &Type::number());
        assert_eq!(merged.tag, TypeTag::Any);
        let same = Type::common_or_any(&Type::string(), &Type::string());
        assert_eq!(same.tag, TypeTag::String);
    }
}
