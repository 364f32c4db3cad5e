//! Static-initializer dependency tracking.
//!
//! `InitializerSym` records, for each resolved sym with a static initializer
//! expression, which other resolved syms that initializer reads — so the
//! code generator can emit initializers in dependency order. //! defines the storage (a flat `u32` buffer sliced per-sym) but leaves
//! consuming it to the code generator; `topo_order` is a [SUPPLEMENT]: a
//! pure ordering utility over that buffer a downstream consumer may ignore.

use ahash::AHashMap;

use crate::ids::ResolvedSymId;

/// Dependency edges for every sym with a static initializer, stored as one
/// flat buffer sliced by `(start, end)` per sym rather than a `Vec<Vec<_>>`
/// per-sym, matching storage shape exactly.
#[derive(Debug, Default)]
pub struct InitializerSymDeps {
    buffer: Vec<ResolvedSymId>,
    slices: AHashMap<ResolvedSymId, (u32, u32)>,
}

impl InitializerSymDeps {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `owner`'s initializer reads `deps`, in the order read.
    /// Calling this more than once for the same `owner` appends a disjoint
    /// slice; it does not merge with an earlier one.
    pub fn record(&mut self, owner: ResolvedSymId, deps: &[ResolvedSymId]) {
        let start = u32::try_from(self.buffer.len()).expect("dependency buffer overflowed u32");
        self.buffer.extend_from_slice(deps);
        let end = u32::try_from(self.buffer.len()).expect("dependency buffer overflowed u32");
        self.slices.insert(owner, (start, end));
    }

    #[must_use]
    pub fn deps_of(&self, owner: ResolvedSymId) -> &[ResolvedSymId] {
        match self.slices.get(&owner) {
            Some(&(start, end)) => &self.buffer[start as usize..end as usize],
            None => &[],
        }
    }

    #[must_use]
    pub fn owners(&self) -> impl Iterator<Item = ResolvedSymId> + '_ {
        self.slices.keys().copied()
    }
}

/// A dependency cycle detected by [`topo_order`], reported as the sym whose
/// visit re-entered an in-progress ancestor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleDetected(pub ResolvedSymId);

/// Topologically sorts the syms recorded in `deps` (initializer-reads-first
/// order), or returns the first sym found to participate in a cycle.
///
/// `InitializerSym` is an output table for the code generator to consume
/// however it likes; this is a candidate ordering a generator can use
/// directly, not a step the analyzer itself requires to produce correct
/// output.
pub fn topo_order(deps: &InitializerSymDeps) -> Result<Vec<ResolvedSymId>, CycleDetected> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum State {
        Unvisited,
        InProgress,
        Done,
    }

    let mut state: AHashMap<ResolvedSymId, State> = AHashMap::new();
    let mut order = Vec::new();

    fn visit(
        sym: ResolvedSymId,
        deps: &InitializerSymDeps,
        state: &mut AHashMap<ResolvedSymId, State>,
        order: &mut Vec<ResolvedSymId>,
    ) -> Result<(), CycleDetected> {
        match state.get(&sym).copied().unwrap_or(State::Unvisited) {
            State::Done => return Ok(()),
            State::InProgress => return Err(CycleDetected(sym)),
            State::Unvisited => {}
        }
        state.insert(sym, State::InProgress);
        for &dep in deps.deps_of(sym) {
            visit(dep, deps, state, order)?;
        }
        state.insert(sym, State::Done);
        order.push(sym);
        Ok(())
    }

    let mut owners: Vec<ResolvedSymId> = deps.owners().collect();
    owners.sort_by_key(ResolvedSymId::index);
    for owner in owners {
        visit(owner, deps, &mut state, &mut order)?;
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn independent_syms_preserve_discovery_order() {
        let mut deps = InitializerSymDeps::new();
        let a = ResolvedSymId::new(0);
        let b = ResolvedSymId::new(1);
        deps.record(a, &[]);
        deps.record(b, &[]);
        let order = topo_order(&deps).unwrap();
        assert_eq!(order, vec![a, b]);
    }

    #[test]
    fn dependency_is_ordered_before_dependent() {
        let mut deps = InitializerSymDeps::new();
        let a = ResolvedSymId::new(0);
        let b = ResolvedSymId::new(1);
        deps.record(a, &[b]);
        deps.record(b, &[]);
        let order = topo_order(&deps).unwrap();
        let pos_a = order.iter().position(|&s| s == a).unwrap();
        let pos_b = order.iter().position(|&s| s == b).unwrap();
        assert!(pos_b < pos_a);
    }

    #[test]
    fn cycle_is_detected() {
        let mut deps = InitializerSymDeps::new();
        let a = ResolvedSymId::new(0);
        let b = ResolvedSymId::new(1);
        deps.record(a, &[b]);
        deps.record(b, &[a]);
        assert!(topo_order(&deps).is_err());
    }
}
