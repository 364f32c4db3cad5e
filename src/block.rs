//! Lexical block/sub-block scope analysis and per-variable metadata.
//!
//! This is the block/sub-block stack and local-var table scope analyzer.
//! Blocks and sub-blocks are
//! never freed once created — like `Sym`/`ResolvedSym`, they are part of
//! this pass's *output* (consumed by the downstream code generator), so
//! they live in flat arenas indexed by id for the lifetime of the chunk.

use ahash::AHashMap;

use crate::ids::{BlockId, LocalVarId, NameId, NoneSentinel, NodeId, SubBlockId, SymId};
use crate::types::Type;

/// How a name is being written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignStrategy {
    Assign,
    CaptureAssign,
    StaticAssign,
}

/// Per-variable metadata the downstream code generator needs.
#[derive(Debug, Clone)]
pub struct LocalVar {
    pub vtype: Type,
    pub is_param: bool,
    pub is_captured: bool,
    pub is_boxed: bool,
    pub is_static_alias: bool,
    pub has_capture_or_static_modifier: bool,
    /// Monotonic: once true, stays true.
    pub lifetime_rc_candidate: bool,
    pub gen_initializer: bool,
    pub gen_is_defined: bool,
    /// Reserved for the downstream code generator; opaque here.
    pub local_slot: Option<u32>,
    /// Set iff `is_static_alias`.
    pub static_alias_sym: SymId,
    /// Which sub-block first declared this var as a plain local, for the
    /// "was V created in this sub-block" test in `assign_local`.
    declared_in_sub_block: SubBlockId,
    /// Parent-scope local this one was captured from, if `is_captured`.
    pub captured_from: LocalVarId,
}

impl LocalVar {
    fn new(declared_in_sub_block: SubBlockId) -> Self {
        Self {
            vtype: Type::undefined(),
            is_param: false,
            is_captured: false,
            is_boxed: false,
            is_static_alias: false,
            has_capture_or_static_modifier: false,
            lifetime_rc_candidate: false,
            gen_initializer: false,
            gen_is_defined: false,
            local_slot: None,
            static_alias_sym: SymId::NONE,
            declared_in_sub_block,
            captured_from: LocalVarId::NONE,
        }
    }

    /// Exactly one of {plain, captured, static-alias} holds.
    #[must_use]
    pub fn is_plain_local(&self) -> bool {
        !self.is_captured && !self.is_static_alias
    }
}

/// Per-chunk table of [`LocalVar`]s.
#[derive(Debug, Default)]
pub struct LocalVarTable {
    vars: Vec<LocalVar>,
}

impl LocalVarTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, declared_in_sub_block: SubBlockId) -> LocalVarId {
        let id = LocalVarId::new(self.vars.len());
        self.vars.push(LocalVar::new(declared_in_sub_block));
        id
    }

    #[must_use]
    pub fn get(&self, id: LocalVarId) -> &LocalVar {
        &self.vars[id.index()]
    }

    pub fn get_mut(&mut self, id: LocalVarId) -> &mut LocalVar {
        &mut self.vars[id.index()]
    }
}

/// A function scope, including the chunk's top-level (module) block.
#[derive(Debug)]
pub struct Block {
    pub params: Vec<LocalVarId>,
    pub locals: Vec<LocalVarId>,
    /// Transient name->var map, live only while this block is on the active stack.
    name_to_var: AHashMap<NameId, LocalVarId>,
    pub first_sub_block_id: SubBlockId,
    pub sub_block_depth: usize,
    /// `None` for the chunk's top-level block.
    pub func_decl_id: Option<NodeId>,
    pub ret_type: Type,
    pub has_ret_type: bool,
    pub infer_ret_type: bool,
    pub is_static_func_block: bool,
    current_sub_block: SubBlockId,
}

impl Block {
    #[must_use]
    pub fn name_to_var(&self, name: NameId) -> Option<LocalVarId> {
        self.name_to_var.get(&name).copied()
    }

    #[must_use]
    pub fn current_sub_block(&self) -> SubBlockId {
        self.current_sub_block
    }
}

/// A lexical sub-scope within a [`Block`] (if/else arm, loop body, match arm).
#[derive(Debug)]
pub struct SubBlock {
    pub assigned_var_start: usize,
    /// Snapshot of each var's type on first assignment within this sub-block.
    prev_var_types: AHashMap<LocalVarId, Type>,
    /// Pre-iter type snapshot for loop-head initializers; populated only for iter sub-blocks.
    pub iter_var_begin_types: Vec<(LocalVarId, Type)>,
    pub prev_sub_block_id: SubBlockId,
    pub owning_block: BlockId,
    pub is_iter: bool,
}

impl SubBlock {
    #[must_use]
    pub fn prev_var_types(&self) -> &AHashMap<LocalVarId, Type> {
        &self.prev_var_types
    }
}

/// The stack-of-blocks-of-sub-blocks scope analyzer for one chunk, plus the
/// process-wide-within-one-chunk assigned-var stack the merge algebra reads
/// and writes.
#[derive(Debug, Default)]
pub struct BlockStack {
    blocks: Vec<Block>,
    sub_blocks: Vec<SubBlock>,
    active: Vec<BlockId>,
    assigned_var_stack: Vec<LocalVarId>,
}

impl BlockStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get_block(&self, id: BlockId) -> &Block {
        &self.blocks[id.index()]
    }

    #[must_use]
    pub fn get_sub_block(&self, id: SubBlockId) -> &SubBlock {
        &self.sub_blocks[id.index()]
    }

    /// Currently open block (top of the active stack). Panics if no block is open.
    #[must_use]
    pub fn current_block_id(&self) -> BlockId {
        *self.active.last().expect("no block is currently open")
    }

    #[must_use]
    pub fn current_sub_block_id(&self) -> SubBlockId {
        self.get_block(self.current_block_id()).current_sub_block()
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.active.len()
    }

    /// Block one level up from the current one (for the `read`/parent-capture
    /// lookup in ), if any.
    #[must_use]
    pub fn parent_block_id(&self) -> Option<BlockId> {
        if self.active.len() >= 2 {
            Some(self.active[self.active.len() - 2])
        } else {
            None
        }
    }

    /// The block open at `depth` levels from the bottom of the active stack
    /// (0 = chunk top-level block), for walking ancestor scopes during
    /// `capture`/`static` lookup.
    #[must_use]
    pub fn nth_active_block(&self, depth: usize) -> BlockId {
        self.active[depth]
    }

    /// Allocates a new `Block`, pushes it, and opens its first sub-block.
    pub fn push_block(&mut self, func_decl_id: Option<NodeId>, is_static_func_block: bool) -> BlockId {
        let id = BlockId::new(self.blocks.len());
        self.blocks.push(Block {
            params: Vec::new(),
            locals: Vec::new(),
            name_to_var: AHashMap::new(),
            first_sub_block_id: SubBlockId::new(self.sub_blocks.len()),
            sub_block_depth: 0,
            func_decl_id,
            ret_type: Type::undefined(),
            has_ret_type: false,
            infer_ret_type: func_decl_id.is_some(),
            is_static_func_block,
            current_sub_block: SubBlockId::NONE,
        });
        self.active.push(id);
        self.push_sub_block_kind(false);
        id
    }

    /// Declares a var in the current block's transient name map (used for
    /// params and for freshly-assigned locals; see ).
    pub fn bind_name(&mut self, block: BlockId, name: NameId, var: LocalVarId) {
        self.blocks[block.index()].name_to_var.insert(name, var);
    }

    pub fn add_param(&mut self, block: BlockId, var: LocalVarId) {
        self.blocks[block.index()].params.push(var);
    }

    pub fn add_local(&mut self, block: BlockId, var: LocalVarId) {
        self.blocks[block.index()].locals.push(var);
    }

    fn push_sub_block_kind(&mut self, is_iter: bool) -> SubBlockId {
        let block_id = self.current_block_id();
        let prev = self.blocks[block_id.index()].current_sub_block;
        let id = SubBlockId::new(self.sub_blocks.len());
        self.sub_blocks.push(SubBlock {
            assigned_var_start: self.assigned_var_stack.len(),
            prev_var_types: AHashMap::new(),
            iter_var_begin_types: Vec::new(),
            prev_sub_block_id: prev,
            owning_block: block_id,
            is_iter,
        });
        let block = &mut self.blocks[block_id.index()];
        block.sub_block_depth += 1;
        block.current_sub_block = id;
        id
    }

    /// Pushes a plain sub-scope (if/else arm, match arm body, ...).
    pub fn push_sub_block(&mut self) -> SubBlockId {
        self.push_sub_block_kind(false)
    }

    /// Opens an iter sub-block for a loop body.
    pub fn push_iter_sub_block(&mut self) -> SubBlockId {
        self.push_sub_block_kind(true)
    }

    /// "Assign to local". Returns the merged type now stored on `var`.
    pub fn assign_local(
        &mut self,
        locals: &mut LocalVarTable,
        var: LocalVarId,
        rhs_type: Type,
        strategy: AssignStrategy,
    ) {
        let sub_block_id = self.current_sub_block_id();
        {
            let v = locals.get_mut(var);
            if v.is_captured && !v.is_boxed {
                v.is_boxed = true;
            }
            if strategy == AssignStrategy::CaptureAssign {
                v.has_capture_or_static_modifier = true;
            }
            if strategy == AssignStrategy::StaticAssign {
                v.has_capture_or_static_modifier = true;
            }
        }
        let sub_block = &mut self.sub_blocks[sub_block_id.index()];
        let created_here = {
            let v = locals.get(var);
            v.declared_in_sub_block == sub_block_id
        };
        if !created_here && !sub_block.prev_var_types.contains_key(&var) {
            sub_block.prev_var_types.insert(var, locals.get(var).vtype);
        }
        let v = locals.get_mut(var);
        v.vtype = rhs_type.to_local_type();
        if rhs_type.rc_candidate {
            v.lifetime_rc_candidate = true;
        }
        self.assigned_var_stack.push(var);
    }

    /// Ends the current sub-block, merging types into the parent per
    /// `is_iter` additionally records `iterVarBeginTypes`
    /// before the regular merge runs. Returns the number of vars widened to
    /// `any` by this merge (for tracing).
    pub fn end_current_sub_block(&mut self, locals: &mut LocalVarTable) -> usize {
        let sub_block_id = self.current_sub_block_id();
        self.end_sub_block(locals, sub_block_id)
    }

    fn end_sub_block(&mut self, locals: &mut LocalVarTable, sub_block_id: SubBlockId) -> usize {
        let (start, is_iter, block_id) = {
            let sb = &self.sub_blocks[sub_block_id.index()];
            (sb.assigned_var_start, sb.is_iter, sb.owning_block)
        };
        let touched: Vec<LocalVarId> = self.assigned_var_stack[start..].to_vec();
        self.assigned_var_stack.truncate(start);

        if is_iter {
            let mut begin_types = Vec::with_capacity(touched.len());
            for &var in &touched {
                let sb = &self.sub_blocks[sub_block_id.index()];
                let entry = if let Some(prev) = sb.prev_var_types.get(&var) {
                    if *prev != locals.get(var).vtype {
                        (var, Type::any())
                    } else {
                        (var, locals.get(var).vtype)
                    }
                } else {
                    (var, locals.get(var).vtype)
                };
                begin_types.push(entry);
            }
            self.sub_blocks[sub_block_id.index()].iter_var_begin_types = begin_types;
        }

        let sub_block_depth = self.blocks[block_id.index()].sub_block_depth;
        let mut widened = 0;
        if sub_block_depth > 1 {
            let prev_sub_block_id = self.sub_blocks[sub_block_id.index()].prev_sub_block_id;
            for &var in &touched {
                let sb = &self.sub_blocks[sub_block_id.index()];
                match sb.prev_var_types.get(&var).copied() {
                    Some(prev_type) => {
                        let current = locals.get(var).vtype;
                        if current != prev_type {
                            locals.get_mut(var).vtype = Type::any();
                            locals.get_mut(var).lifetime_rc_candidate = true;
                            widened += 1;
                            let parent_has_it = self.sub_blocks[prev_sub_block_id.index()]
                                .prev_var_types
                                .contains_key(&var);
                            if !parent_has_it {
                                self.assigned_var_stack.push(var);
                            }
                        }
                    }
                    None => {
                        self.assigned_var_stack.push(var);
                    }
                }
            }
        }

        self.sub_blocks[sub_block_id.index()].prev_var_types = AHashMap::new();
        let block = &mut self.blocks[block_id.index()];
        block.current_sub_block = self.sub_blocks[sub_block_id.index()].prev_sub_block_id;
        block.sub_block_depth -= 1;
        widened
    }

    /// Records one `return expr`'s type into the current block's inferred
    /// return type: the first return sets `ret_type` and
    /// `has_ret_type`; a later return whose tag differs widens `ret_type` to
    /// `any`. No-op on a block that isn't inferring a return type (the
    /// chunk's own top-level block, where `return` is a different thing
    /// entirely and not tracked here).
    pub fn record_return(&mut self, ty: Type) {
        let block_id = self.current_block_id();
        let block = &mut self.blocks[block_id.index()];
        if !block.infer_ret_type {
            return;
        }
        if !block.has_ret_type {
            block.ret_type = ty;
            block.has_ret_type = true;
        } else if block.ret_type.tag != ty.tag {
            block.ret_type = Type::any();
        }
    }

    /// Closes the outstanding top-level sub-block, clears the block's
    /// transient name map, and pops the block stack.
    pub fn end_block(&mut self, locals: &mut LocalVarTable) -> BlockId {
        let block_id = self.current_block_id();
        self.end_current_sub_block(locals);
        self.blocks[block_id.index()].name_to_var.clear();
        self.active.pop();
        block_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_merged_type_widens_to_any() {
        let mut locals = LocalVarTable::new();
        let mut blocks = BlockStack::new();
        let block = blocks.push_block(None, false);
        let x = locals.create(blocks.current_sub_block_id());
        blocks.add_local(block, x);
        blocks.assign_local(&mut locals, x, Type::number(), AssignStrategy::Assign);

        blocks.push_sub_block();
        blocks.assign_local(&mut locals, x, Type::string(), AssignStrategy::Assign);
        let widened = blocks.end_current_sub_block(&mut locals);

        assert_eq!(widened, 1);
        assert_eq!(locals.get(x).vtype.tag, crate::types::TypeTag::Any);
        assert!(locals.get(x).lifetime_rc_candidate);
    }

    #[test]
    fn unchanged_type_in_branch_does_not_widen() {
        let mut locals = LocalVarTable::new();
        let mut blocks = BlockStack::new();
        let block = blocks.push_block(None, false);
        let x = locals.create(blocks.current_sub_block_id());
        blocks.add_local(block, x);
        blocks.assign_local(&mut locals, x, Type::number(), AssignStrategy::Assign);

        blocks.push_sub_block();
        blocks.assign_local(&mut locals, x, Type::number(), AssignStrategy::Assign);
        let widened = blocks.end_current_sub_block(&mut locals);

        assert_eq!(widened, 0);
        assert_eq!(locals.get(x).vtype.tag, crate::types::TypeTag::Number);
    }

    #[test]
    fn iter_sub_block_records_begin_types() {
        let mut locals = LocalVarTable::new();
        let mut blocks = BlockStack::new();
        let block = blocks.push_block(None, false);
        let x = locals.create(blocks.current_sub_block_id());
        blocks.add_local(block, x);
        blocks.assign_local(&mut locals, x, Type::number(), AssignStrategy::Assign);

        let iter_id = blocks.push_iter_sub_block();
        blocks.assign_local(&mut locals, x, Type::string(), AssignStrategy::Assign);
        blocks.end_current_sub_block(&mut locals);

        let recorded = &blocks.get_sub_block(iter_id).iter_var_begin_types;
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].0, x);
        assert_eq!(recorded[0].1.tag, crate::types::TypeTag::Any);
    }
}
