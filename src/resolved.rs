//! Process-wide resolved-symbol tables.
//!
//! `ResolvedSym` is a tagged union over {func, variable, object, module,
//! builtinType}; the func variant either names a single overload or
//! declares itself overloaded and delegates to the overload map. This
//! module is the one place that union lives.

use ahash::AHashMap;

use crate::ids::{ChunkId, ModuleId, NameId, NoneSentinel, NodeId, ResolvedFuncSigId, ResolvedFuncSymId, ResolvedSymId};
use crate::types::Type;

/// How a `func`-variant [`ResolvedSym`] names its overload(s).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuncBinding {
    /// Exactly one overload exists; this is its id.
    Single(ResolvedFuncSymId),
    /// More than one overload exists; disambiguate via `ResolvedFuncSymTable`
    /// keyed by `(ResolvedSymId, ResolvedFuncSigId)`.
    Overloaded,
}

/// The tagged union a resolved symbol can be. Do not encode overload sets by
/// subclassing — `Func`'s `FuncBinding` is the only branch point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedSymVariant {
    Func { binding: FuncBinding },
    Variable,
    Object,
    Module { module_id: ModuleId },
    BuiltinType,
}

/// A process-wide, canonicalized symbol identity shared across chunks.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedSym {
    pub parent: ResolvedSymId,
    pub name: NameId,
    pub variant: ResolvedSymVariant,
    pub exported: bool,
}

/// One function overload.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedFuncSym {
    /// `ChunkId::NONE` for natives (no owning chunk).
    pub chunk: ChunkId,
    /// `NodeId::NONE` for natives (no AST decl).
    pub decl: NodeId,
    pub r_func_sig: ResolvedFuncSigId,
    pub return_type: Type,
    pub has_static_initializer: bool,
}

/// An interned tuple of resolved param/return syms. `is_typed` is true iff
/// any element differs from the builtin `any` sym; untyped func-sig
/// interning is idempotent by arity, since every element is the same
/// builtin `any` sym.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedFuncSig {
    pub elements: Vec<ResolvedSymId>,
}

/// Global table of [`ResolvedSym`]s, keyed by `(parent, name)`.
#[derive(Debug, Default)]
pub struct ResolvedSymTable {
    syms: Vec<ResolvedSym>,
    by_key: AHashMap<(ResolvedSymId, NameId), ResolvedSymId>,
}

impl ResolvedSymTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn lookup(&self, parent: ResolvedSymId, name: NameId) -> Option<ResolvedSymId> {
        self.by_key.get(&(parent, name)).copied()
    }

    #[must_use]
    pub fn get(&self, id: ResolvedSymId) -> &ResolvedSym {
        &self.syms[id.index()]
    }

    pub fn get_mut(&mut self, id: ResolvedSymId) -> &mut ResolvedSym {
        &mut self.syms[id.index()]
    }

    /// Inserts a brand-new resolved sym. Panics (in debug) if `(parent,
    /// name)` is already bound — callers are expected to `lookup` first.
    pub fn insert(&mut self, sym: ResolvedSym) -> ResolvedSymId {
        let key = (sym.parent, sym.name);
        debug_assert!(!self.by_key.contains_key(&key), "resolved sym already exists for this key");
        let id = ResolvedSymId::new(self.syms.len());
        self.by_key.insert(key, id);
        self.syms.push(sym);
        id
    }

    /// Inserts a resolved sym without registering it under `(parent, name)`.
    /// Used for synthetic, internal-only roots (e.g. each chunk's per-module
    /// resolved root) that are never looked up by key and would otherwise
    /// collide with unrelated syms sharing the same placeholder name.
    pub fn insert_unkeyed(&mut self, sym: ResolvedSym) -> ResolvedSymId {
        let id = ResolvedSymId::new(self.syms.len());
        self.syms.push(sym);
        id
    }

    /// Finds the existing `(parent, name)` sym, or inserts `sym` fresh.
    pub fn get_or_insert_with(&mut self, parent: ResolvedSymId, name: NameId, make: impl FnOnce() -> ResolvedSym) -> ResolvedSymId {
        if let Some(id) = self.lookup(parent, name) {
            return id;
        }
        self.insert(make())
    }
}

/// Global table of function overloads, keyed by `(ResolvedSymId, ResolvedFuncSigId)`.
#[derive(Debug, Default)]
pub struct ResolvedFuncSymTable {
    entries: Vec<ResolvedFuncSym>,
    by_key: AHashMap<(ResolvedSymId, ResolvedFuncSigId), ResolvedFuncSymId>,
}

impl ResolvedFuncSymTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn lookup(&self, owner: ResolvedSymId, sig: ResolvedFuncSigId) -> Option<ResolvedFuncSymId> {
        self.by_key.get(&(owner, sig)).copied()
    }

    #[must_use]
    pub fn get(&self, id: ResolvedFuncSymId) -> &ResolvedFuncSym {
        &self.entries[id.index()]
    }

    pub fn get_mut(&mut self, id: ResolvedFuncSymId) -> &mut ResolvedFuncSym {
        &mut self.entries[id.index()]
    }

    /// Registers a new overload entry under `(owner, sig)`. Returns the
    /// existing id unchanged if one is already registered there (duplicate
    /// overload registration is a no-op at this layer; callers detect the
    /// "overload collision" error themselves before calling this when the
    /// *declarations* differ, per ).
    pub fn get_or_insert(
        &mut self,
        owner: ResolvedSymId,
        sig: ResolvedFuncSigId,
        make: impl FnOnce() -> ResolvedFuncSym,
    ) -> ResolvedFuncSymId {
        if let Some(id) = self.lookup(owner, sig) {
            return id;
        }
        let id = ResolvedFuncSymId::new(self.entries.len());
        self.entries.push(make());
        self.by_key.insert((owner, sig), id);
        id
    }

    /// Number of overloads registered under `owner` across all sigs.
    #[must_use]
    pub fn overload_count(&self, owner: ResolvedSymId) -> usize {
        self.by_key.keys().filter(|(o, _)| *o == owner).count()
    }
}

/// Global interner for [`ResolvedFuncSig`]s.
#[derive(Debug, Default)]
pub struct ResolvedFuncSigTable {
    sigs: Vec<ResolvedFuncSig>,
    by_sig: AHashMap<Vec<ResolvedSymId>, ResolvedFuncSigId>,
    is_typed: Vec<bool>,
}

impl ResolvedFuncSigTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns `elements`, computing `is_typed` against `any_sym` (the
    /// resolved sym for the builtin `any` type). Idempotent by content, so
    /// two untyped sigs of the same arity collapse to one id.
    pub fn intern(&mut self, elements: Vec<ResolvedSymId>, any_sym: ResolvedSymId) -> ResolvedFuncSigId {
        if let Some(&id) = self.by_sig.get(&elements) {
            return id;
        }
        let is_typed = elements.iter().any(|&e| e != any_sym);
        let id = ResolvedFuncSigId::new(self.sigs.len());
        self.by_sig.insert(elements.clone(), id);
        self.sigs.push(ResolvedFuncSig { elements });
        self.is_typed.push(is_typed);
        id
    }

    #[must_use]
    pub fn get(&self, id: ResolvedFuncSigId) -> &ResolvedFuncSig {
        &self.sigs[id.index()]
    }

    #[must_use]
    pub fn is_typed(&self, id: ResolvedFuncSigId) -> bool {
        self.is_typed[id.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untyped_sigs_of_same_arity_collapse() {
        let mut table = ResolvedFuncSigTable::new();
        let any_sym = ResolvedSymId::new(0);
        let a = table.intern(vec![any_sym, any_sym], any_sym);
        let b = table.intern(vec![any_sym, any_sym], any_sym);
        assert_eq!(a, b);
        assert!(!table.is_typed(a));
    }

    #[test]
    fn typed_sig_differs_from_untyped() {
        let mut table = ResolvedFuncSigTable::new();
        let any_sym = ResolvedSymId::new(0);
        let int_sym = ResolvedSymId::new(1);
        let untyped = table.intern(vec![any_sym, any_sym], any_sym);
        let typed = table.intern(vec![int_sym, any_sym], any_sym);
        assert_ne!(untyped, typed);
        assert!(table.is_typed(typed));
    }

    #[test]
    fn overload_matcher_sentinel_matches_count() {
        let mut syms = ResolvedFuncSymTable::new();
        let owner = ResolvedSymId::new(0);
        let sig1 = ResolvedFuncSigId::new(1);
        let sig2 = ResolvedFuncSigId::new(2);
        syms.get_or_insert(owner, sig1, || ResolvedFuncSym {
            chunk: ChunkId::NONE,
            decl: NodeId::NONE,
            r_func_sig: sig1,
            return_type: Type::any(),
            has_static_initializer: false,
        });
        assert_eq!(syms.overload_count(owner), 1);
        syms.get_or_insert(owner, sig2, || ResolvedFuncSym {
            chunk: ChunkId::NONE,
            decl: NodeId::NONE,
            r_func_sig: sig2,
            return_type: Type::any(),
            has_static_initializer: false,
        });
        assert_eq!(syms.overload_count(owner), 2);
    }
}
