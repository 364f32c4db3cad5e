//! Source locations.
//!
//! The analyzer never reads source text itself — spans are opaque byte
//! ranges handed to us by the (external) parser and threaded through purely
//! so diagnostics can point at something. A chunk id travels alongside the
//! byte range so errors from different files don't collide; we borrow
//! `text-size`'s range type instead of hand-rolling one.

use text_size::TextRange;

use crate::ids::ChunkId;

/// A byte range within one chunk's source text, for diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Span {
    pub chunk: ChunkId,
    pub range: TextRange,
}

impl Span {
    #[must_use]
    pub fn new(chunk: ChunkId, range: TextRange) -> Self {
        Self { chunk, range }
    }

    /// A span with no useful location, for synthetic nodes the analyzer itself introduces
    /// (e.g. the implicit `self` parameter pushed for a method).
    #[must_use]
    pub fn synthetic(chunk: ChunkId) -> Self {
        Self {
            chunk,
            range: TextRange::empty(0.into()),
        }
    }
}
