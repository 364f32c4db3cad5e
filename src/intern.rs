//! Identifier interning.
//!
//! A small set of well-known names gets stable ids reserved up front,
//! everything else is interned on first sight into a flat table keyed by
//! an `ahash` map for O(1) reverse lookup.
//!
//! A [`NameId`] may be backed either by an owned copy of the
//! source bytes or by a borrowed `'static` string. This distinction lives in
//! the interner's storage (`NameEntry`), not in the id itself: well-known
//! names borrow a leaked `'static str`, everything parsed out of user
//! source is owned.

use ahash::AHashMap;

pub use crate::ids::NameId;

#[derive(Debug, Clone)]
enum NameEntry {
    /// A name known at compile time of this crate (builtin type names, `self`, ...).
    Static(&'static str),
    /// A name copied out of a chunk's source text.
    Owned(Box<str>),
}

impl NameEntry {
    fn as_str(&self) -> &str {
        match self {
            Self::Static(s) => s,
            Self::Owned(s) => s,
        }
    }
}

/// Well-known names reserved at interner construction so every chunk agrees
/// on their `NameId` without a hashmap lookup, scoped down to the names
/// this analyzer itself branches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter, strum::IntoStaticStr)]
#[strum(serialize_all = "camelCase")]
pub enum WellKnownName {
    #[strum(serialize = "self")]
    SelfParam,
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
    Undefined,
}

/// Interns identifier strings and yields stable [`NameId`]s.
///
/// Owns no AST: this is purely a string table, shared by every chunk in a
/// [`crate::chunk::Compilation`].
#[derive(Debug, Default)]
pub struct NameInterner {
    entries: Vec<NameEntry>,
    by_str: AHashMap<Box<str>, NameId>,
}

impl NameInterner {
    /// Builds an interner with all [`WellKnownName`]s pre-registered, in
    /// enum-declaration order, so their ids are deterministic across runs.
    #[must_use]
    pub fn new() -> Self {
        use strum::IntoEnumIterator;

        let mut interner = Self {
            entries: Vec::new(),
            by_str: AHashMap::new(),
        };
        for name in WellKnownName::iter() {
            let s: &'static str = name.into();
            interner.intern_static(s);
        }
        interner
    }

    /// Interns a `'static` string, borrowing it rather than copying.
    pub fn intern_static(&mut self, s: &'static str) -> NameId {
        if let Some(&id) = self.by_str.get(s) {
            return id;
        }
        let id = NameId::new(self.entries.len());
        self.entries.push(NameEntry::Static(s));
        self.by_str.insert(s.into(), id);
        id
    }

    /// Interns a string slice, copying it into owned storage if new.
    ///
    /// This is the path taken for every identifier read out of chunk source
    /// text: the parser's source buffer is transient, so the interner must
    /// own a copy to outlive it.
    pub fn intern(&mut self, s: &str) -> NameId {
        if let Some(&id) = self.by_str.get(s) {
            return id;
        }
        let id = NameId::new(self.entries.len());
        self.entries.push(NameEntry::Owned(s.into()));
        self.by_str.insert(s.into(), id);
        id
    }

    /// Looks up the id of a well-known name. Always present (registered by [`Self::new`]).
    #[must_use]
    pub fn well_known(&self, name: WellKnownName) -> NameId {
        let s: &'static str = name.into();
        *self
            .by_str
            .get(s)
            .expect("well-known names are pre-registered by NameInterner::new")
    }

    /// Returns the text backing a `NameId`.
    ///
    /// # Panics
    /// Panics if `id` was not produced by this interner.
    #[must_use]
    pub fn get_str(&self, id: NameId) -> &str {
        self.entries[id.index()].as_str()
    }

    /// Returns the `NameId` for a string if it has already been interned.
    #[must_use]
    pub fn lookup(&self, s: &str) -> Option<NameId> {
        self.by_str.get(s).copied()
    }

    /// Number of distinct names interned so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_idempotent() {
        let mut interner = NameInterner::new();
        let a = interner.intern("foo");
        let b = interner.intern("foo");
        assert_eq!(a, b);
        assert_eq!(interner.get_str(a), "foo");
    }

    #[test]
    fn well_known_names_are_stable_across_fresh_interners() {
        let i1 = NameInterner::new();
        let i2 = NameInterner::new();
        assert_eq!(
            i1.well_known(WellKnownName::Any),
            i2.well_known(WellKnownName::Any)
        );
    }

    #[test]
    fn distinct_strings_get_distinct_ids() {
        let mut interner = NameInterner::new();
        let a = interner.intern("a");
        let b = interner.intern("b");
        assert_ne!(a, b);
    }
}
