//! Per-chunk local symbol table and local function-signature interning.
//!
//! A [`Sym`] is created eagerly whenever a name is referenced; resolving it
//! into a process-wide [`crate::resolved::ResolvedSym`] happens lazily and
//! only for syms that end up `used`.

use ahash::AHashMap;

use crate::ids::{FuncSigId, NameId, NoneSentinel, ResolvedSymId, SymId};

/// A local symbol: a name reference recorded for one chunk.
///
/// `func_sig == FuncSigId::NONE` marks a variable/module reference;
/// otherwise this sym denotes a function with that local signature.
#[derive(Debug, Clone)]
pub struct Sym {
    pub parent: SymId,
    pub name: NameId,
    pub func_sig: FuncSigId,
    /// Filled by resolution; stays `NONE` if never resolved.
    pub r_sym_id: ResolvedSymId,
    /// True iff referenced by a reachable expression. Only `used` syms are resolved.
    pub used: bool,
}

impl Sym {
    #[must_use]
    pub fn is_func(&self) -> bool {
        !self.func_sig.is_none()
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        !self.r_sym_id.is_none()
    }
}

/// A local function signature: local `SymId`s of each parameter, with the
/// last element being the return type sym. Interned per chunk.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FuncSig(pub Vec<SymId>);

impl FuncSig {
    #[must_use]
    pub fn arity(&self) -> usize {
        self.0.len().saturating_sub(1)
    }
}

/// Interns [`FuncSig`]s for one chunk, and tracks each sig's resolved
/// back-link once it becomes known.
#[derive(Debug, Default)]
pub struct FuncSigTable {
    sigs: Vec<FuncSig>,
    by_sig: AHashMap<FuncSig, FuncSigId>,
    resolved: Vec<crate::ids::ResolvedFuncSigId>,
}

impl FuncSigTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns a local func sig, returning its id. Interning is idempotent:
    /// two calls with syms of identical content return the same id.
    pub fn intern(&mut self, sig: Vec<SymId>) -> FuncSigId {
        let sig = FuncSig(sig);
        if let Some(&id) = self.by_sig.get(&sig) {
            return id;
        }
        let id = FuncSigId::new(self.sigs.len());
        self.by_sig.insert(sig.clone(), id);
        self.sigs.push(sig);
        self.resolved.push(crate::ids::ResolvedFuncSigId::NONE);
        id
    }

    #[must_use]
    pub fn get(&self, id: FuncSigId) -> &FuncSig {
        &self.sigs[id.index()]
    }

    #[must_use]
    pub fn resolved_of(&self, id: FuncSigId) -> crate::ids::ResolvedFuncSigId {
        self.resolved[id.index()]
    }

    pub fn set_resolved(&mut self, id: FuncSigId, resolved: crate::ids::ResolvedFuncSigId) {
        self.resolved[id.index()] = resolved;
    }
}

/// Key identifying a local sym: `(parent, name, func_sig)`, with
/// `SymId::NONE`/`FuncSigId::NONE` standing in for "no parent"/"not a function".
type SymKey = (SymId, NameId, FuncSigId);

/// Per-chunk table of local [`Sym`]s, keyed by `(parent, name, func_sig)`.
#[derive(Debug, Default)]
pub struct SymTable {
    syms: Vec<Sym>,
    by_key: AHashMap<SymKey, SymId>,
}

impl SymTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new sym unconditionally (used for root-scoped static-var
    /// decls, which always create a fresh sym; the uniqueness check there
    /// is against the parent's resolved scope, not this table).
    pub fn create(&mut self, parent: SymId, name: NameId, func_sig: FuncSigId) -> SymId {
        let id = SymId::new(self.syms.len());
        self.syms.push(Sym {
            parent,
            name,
            func_sig,
            r_sym_id: ResolvedSymId::NONE,
            used: false,
        });
        self.by_key.insert((parent, name, func_sig), id);
        id
    }

    /// Finds or creates a sym for `(parent, name, func_sig)` ("create/touch"
    /// in terminology), marking it used.
    pub fn get_or_create(&mut self, parent: SymId, name: NameId, func_sig: FuncSigId) -> SymId {
        let key = (parent, name, func_sig);
        if let Some(&id) = self.by_key.get(&key) {
            self.syms[id.index()].used = true;
            return id;
        }
        let id = self.create(parent, name, func_sig);
        self.syms[id.index()].used = true;
        id
    }

    /// Looks up an existing sym without creating one.
    #[must_use]
    pub fn lookup(&self, parent: SymId, name: NameId, func_sig: FuncSigId) -> Option<SymId> {
        self.by_key.get(&(parent, name, func_sig)).copied()
    }

    #[must_use]
    pub fn get(&self, id: SymId) -> &Sym {
        &self.syms[id.index()]
    }

    pub fn mark_used(&mut self, id: SymId) {
        self.syms[id.index()].used = true;
    }

    pub fn set_resolved(&mut self, id: SymId, resolved: ResolvedSymId) {
        self.syms[id.index()].r_sym_id = resolved;
    }

    /// Iterates all syms in creation order, for end-of-analysis validation
    /// ("every used sym with a resolved-or-absent parent is resolved" — ).
    pub fn iter(&self) -> impl Iterator<Item = (SymId, &Sym)> {
        self.syms
            .iter()
            .enumerate()
            .map(|(i, s)| (SymId::new(i), s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_or_create_is_idempotent_by_key() {
        let mut syms = SymTable::new();
        let name = NameId::new(3);
        let a = syms.get_or_create(SymId::NONE, name, FuncSigId::NONE);
        let b = syms.get_or_create(SymId::NONE, name, FuncSigId::NONE);
        assert_eq!(a, b);
        assert!(syms.get(a).used);
    }

    #[test]
    fn different_func_sigs_are_distinct_syms() {
        let mut syms = SymTable::new();
        let name = NameId::new(3);
        let a = syms.get_or_create(SymId::NONE, name, FuncSigId::new(0));
        let b = syms.get_or_create(SymId::NONE, name, FuncSigId::new(1));
        assert_ne!(a, b);
    }

    #[test]
    fn func_sig_interning_is_idempotent() {
        let mut table = FuncSigTable::new();
        let a = table.intern(vec![SymId::new(1), SymId::new(2)]);
        let b = table.intern(vec![SymId::new(1), SymId::new(2)]);
        assert_eq!(a, b);
        assert_eq!(table.get(a).arity(), 1);
    }
}
