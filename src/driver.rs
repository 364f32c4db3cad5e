//! `SemaDriver` — statement and expression traversal.
//!
//! Drives one chunk's AST at a time: a prescan pass registers every
//! top-level declaration as a [`crate::resolved::ResolvedSym`] so forward
//! references within (and across) chunks resolve without a second full
//! pass, then a traversal pass walks bodies, threading the `Block`/`SubBlock`
//! merge algebra and the lazy name-resolution rules through every statement
//! and expression form.

use std::borrow::Cow;
use std::path::PathBuf;

use crate::ast::*;
use crate::block::AssignStrategy;
use crate::chunk::{Chunk, Compilation};
use crate::diagnostics::{SemaError, SemaErrorKind, SemaResult};
use crate::ids::{ChunkId, FuncSigId, LocalVarId, ModuleId, NameId, NodeId, NoneSentinel, ResolvedFuncSigId, ResolvedSymId, SymId};
use crate::intern::WellKnownName;
use crate::module::{ImportSpec, ModuleEntry, SymRef};
use crate::resolved::{FuncBinding, ResolvedFuncSig, ResolvedFuncSym, ResolvedSym, ResolvedSymVariant};
use crate::span::Span;
use crate::tracer::SemaTracer;
use crate::types::Type;
use crate::vm_iface::VmCollaborator;

/// How a name is being referenced at a use-site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LookupStrategy {
    Read,
    Assign,
    CaptureAssign,
    StaticAssign,
}

/// Drives semantic analysis of one [`Compilation`]'s chunks.
pub struct SemaDriver<'a, Tr: SemaTracer, Vm: VmCollaborator> {
    pub compilation: &'a mut Compilation,
    pub tracer: &'a mut Tr,
    pub vm: &'a mut Vm,
}

impl<'a, Tr: SemaTracer, Vm: VmCollaborator> SemaDriver<'a, Tr, Vm> {
    pub fn new(compilation: &'a mut Compilation, tracer: &'a mut Tr, vm: &'a mut Vm) -> Self {
        Self { compilation, tracer, vm }
    }

    /// Allocates a chunk for `uri` and registers it as the module at `module_id`
    /// (the entry chunk allocates its own fresh module; imported chunks pass
    /// the `mod_id` their [`crate::module::ImportTask`] already reserved).
    pub fn begin_chunk(&mut self, uri: PathBuf, module_id: Option<ModuleId>) -> ChunkId {
        let chunk_id = self.compilation.add_chunk(uri);
        let module_id = module_id.unwrap_or_else(|| self.compilation.modules.new_entry_module());
        self.compilation.chunk_mut(chunk_id).module_id = module_id;
        chunk_id
    }

    /// Pops the next pending import task, if any (FIFO order).
    pub fn take_pending_import(&mut self) -> Option<crate::module::ImportTask> {
        self.compilation.modules.pop_pending()
    }

    /// Full analysis of one chunk's statement list: prescan, then traversal.
    pub fn analyze_chunk(&mut self, chunk_id: ChunkId, span: Span, stmts: &mut [StmtLoc]) -> SemaResult<()> {
        self.compilation.limit_tracker.enter_chunk(&self.compilation.limits, span)?;
        self.tracer.on_chunk_started(chunk_id);

        let module_resolved_root = self.module_resolved_root(chunk_id);
        self.prescan(chunk_id, module_resolved_root, stmts)?;

        let func_decl = None;
        let is_static = false;
        let block = self.compilation.chunk_mut(chunk_id).blocks.push_block(func_decl, is_static);
        for s in stmts.iter_mut() {
            self.stmt(chunk_id, s)?;
        }
        let chunk = self.compilation.chunk_mut(chunk_id);
        chunk.blocks.end_block(&mut chunk.locals);
        let _ = block;

        self.tracer.on_chunk_finished(chunk_id);
        Ok(())
    }

    fn module_resolved_root(&mut self, chunk_id: ChunkId) -> ResolvedSymId {
        let module_id = self.compilation.chunk(chunk_id).module_id;
        self.module_root(module_id)
    }

    /// Chunk-agnostic form of [`Self::module_resolved_root`]: lazily creates
    /// (and caches on the `Module` itself) the resolved sym every member of
    /// `module_id` hangs off of, whether or not that module has a chunk of
    /// its own to prescan (a builtin module never does).
    fn module_root(&mut self, module_id: ModuleId) -> ResolvedSymId {
        let module = self.compilation.modules.get(module_id);
        if !module.resolved_root_sym_id.is_none() {
            return module.resolved_root_sym_id;
        }
        // Not keyed by `(parent, name)`: every module needs its own private
        // root id, and reusing a well-known placeholder name here
        // would otherwise collide across chunks/modules in the shared
        // `(parent, name)` index (see `insert_unkeyed`).
        let any_name = self.compilation.interner.well_known(WellKnownName::Any);
        let root = self.compilation.resolved_syms.insert_unkeyed(ResolvedSym {
            parent: ResolvedSymId::NONE,
            name: any_name,
            variant: ResolvedSymVariant::Module { module_id },
            exported: true,
        });
        self.compilation.modules.get_mut(module_id).resolved_root_sym_id = root;
        root
    }

    /// Publishes a just-registered exported top-level declaration into its
    /// chunk's module entry map, so a future cross-chunk reference that
    /// falls through to [`Self::resolve_module_entry`] (currently only
    /// exercised for builtin modules, since a user chunk's direct
    /// `resolved_syms` registration already satisfies ordinary imports) sees
    /// it too.
    fn publish_module_entry(&mut self, chunk_id: ChunkId, name: NameId, sig: ResolvedFuncSigId, entry: ModuleEntry) {
        let module_id = self.compilation.chunk(chunk_id).module_id;
        self.compilation.modules.get_mut(module_id).insert(name, sig, entry);
    }

    /// Converts one of a module's [`ModuleEntry`] records into a
    /// `ResolvedSym`/`ResolvedFuncSym`, the first time `name` is referenced
    /// across a module boundary and a direct `resolved_syms` lookup under
    /// the module's root misses. A user chunk's own declarations are almost
    /// always found directly (prescan registers them before anything could
    /// import the chunk); this is what lets a **builtin** module — which has
    /// no chunk of its own to prescan — resolve at all.
    fn resolve_module_entry(&mut self, module_id: ModuleId, name: NameId, span: Span) -> SemaResult<ResolvedSymId> {
        let module_root = self.module_root(module_id);
        if let Some(found) = self.compilation.resolved_syms.lookup(module_root, name) {
            return Ok(found);
        }

        let entries: Vec<(ResolvedFuncSigId, ModuleEntry)> = self
            .compilation
            .modules
            .get(module_id)
            .entries_for(name)
            .map(|(sig, entry)| (sig, entry.clone()))
            .collect();
        if entries.is_empty() {
            return Err(self.missing_symbol_err(name, span, false));
        }

        let mut owner = None;
        for (sig, entry) in entries {
            owner = Some(match entry {
                ModuleEntry::SymToOneFunc { .. } | ModuleEntry::SymToManyFuncs { .. } => continue,
                ModuleEntry::Variable => {
                    let id = self.compilation.resolved_syms.insert(ResolvedSym {
                        parent: module_root,
                        name,
                        variant: ResolvedSymVariant::Variable,
                        exported: true,
                    });
                    let vm_sym = self.vm.ensure_var_sym(ChunkId::NONE, NodeId::NONE, name);
                    self.vm.retain(vm_sym);
                    id
                }
                ModuleEntry::UserVar { .. } => self.compilation.resolved_syms.insert(ResolvedSym {
                    parent: module_root,
                    name,
                    variant: ResolvedSymVariant::Variable,
                    exported: true,
                }),
                ModuleEntry::Object | ModuleEntry::UserObject { .. } => self.compilation.resolved_syms.insert(ResolvedSym {
                    parent: module_root,
                    name,
                    variant: ResolvedSymVariant::Object,
                    exported: true,
                }),
                ModuleEntry::NativeFunc1 => {
                    let (id, _) = self.register_func_overload_with_sig(module_root, name, ChunkId::NONE, NodeId::NONE, sig, true, span)?;
                    id
                }
                ModuleEntry::UserFunc { chunk, decl, .. } => {
                    let (id, _) = self.register_func_overload_with_sig(module_root, name, chunk, decl, sig, true, span)?;
                    id
                }
            });
        }

        owner.ok_or_else(|| self.missing_symbol_err(name, span, false))
    }

    // ---- Prescan: register every top-level declaration up front ----

    fn prescan(&mut self, chunk_id: ChunkId, root: ResolvedSymId, stmts: &mut [StmtLoc]) -> SemaResult<()> {
        for s in stmts.iter_mut() {
            self.prescan_stmt(chunk_id, root, s, false)?;
        }
        Ok(())
    }

    fn prescan_stmt(&mut self, chunk_id: ChunkId, root: ResolvedSymId, s: &mut StmtLoc, exported_by_default: bool) -> SemaResult<()> {
        match &mut s.stmt {
            Stmt::Export(inner) => self.prescan_stmt(chunk_id, root, inner, true),
            Stmt::FuncDecl(def) => self.prescan_func(chunk_id, root, def, exported_by_default, s.span),
            Stmt::FuncDeclWithInitializer { decl, .. } => self.prescan_func(chunk_id, root, decl, exported_by_default, s.span),
            Stmt::ObjectDecl(def) => self.prescan_object(chunk_id, root, def, exported_by_default, s.span),
            Stmt::TagTypeDecl(def) => self.prescan_tag(chunk_id, root, def, exported_by_default, s.span),
            Stmt::VarDecl { name, .. } => self.prescan_var(chunk_id, root, name, exported_by_default, s.span),
            _ => Ok(()),
        }
    }

    fn prescan_var(&mut self, chunk_id: ChunkId, root: ResolvedSymId, name: &Ident, exported: bool, span: Span) -> SemaResult<()> {
        if self.compilation.resolved_syms.lookup(root, name.name).is_some() {
            return Err(self.dup_top_level(name.name, span));
        }
        let decl = name.id;
        self.compilation.resolved_syms.insert(ResolvedSym {
            parent: root,
            name: name.name,
            variant: ResolvedSymVariant::Variable,
            exported,
        });
        if exported {
            self.publish_module_entry(chunk_id, name.name, ResolvedFuncSigId::NONE, ModuleEntry::UserVar { chunk: chunk_id, decl });
        }
        let vm_sym = self.vm.ensure_var_sym(chunk_id, decl, name.name);
        self.vm.retain(vm_sym);
        self.compilation.runtime_syms.insert((chunk_id, decl), vm_sym);
        Ok(())
    }

    fn prescan_func(&mut self, chunk_id: ChunkId, root: ResolvedSymId, def: &mut FuncDef, exported: bool, span: Span) -> SemaResult<()> {
        let (_, sig) = self.register_func_overload(root, def.name.name, chunk_id, def.id, def.params.len(), exported, span)?;
        if exported {
            self.publish_module_entry(
                chunk_id,
                def.name.name,
                sig,
                ModuleEntry::UserFunc {
                    chunk: chunk_id,
                    decl: def.id,
                    sig,
                },
            );
        }
        let vm_sym = self.vm.ensure_func_sym(chunk_id, def.id, def.name.name);
        self.vm.retain(vm_sym);
        self.compilation.runtime_syms.insert((chunk_id, def.id), vm_sym);
        Ok(())
    }

    /// Registers one overload of `name` under `owner_parent` (a module root
    /// for plain function decls, an object's resolved sym for object static
    /// functions): interns the untyped-by-arity resolved func sig, rejects a
    /// byte-for-byte duplicate overload, and keeps the owning `ResolvedSym`'s
    /// `FuncBinding` in sync (`Single` while there's exactly one overload,
    /// `Overloaded` from the second on).
    fn register_func_overload(
        &mut self,
        owner_parent: ResolvedSymId,
        name: NameId,
        chunk_id: ChunkId,
        decl: NodeId,
        arity: usize,
        exported: bool,
        span: Span,
    ) -> SemaResult<(ResolvedSymId, ResolvedFuncSigId)> {
        let sig = self.untyped_resolved_func_sig(arity);
        let owner = self.register_func_overload_with_sig(owner_parent, name, chunk_id, decl, sig, exported, span)?;
        Ok((owner, sig))
    }

    /// Registers one overload of `name` under `owner_parent` at an
    /// already-resolved `sig` (a module-entry conversion already knows its
    /// sig; an arity-based declaration computes one via
    /// `untyped_resolved_func_sig` first and delegates here through
    /// [`Self::register_func_overload`]): rejects a byte-for-byte duplicate
    /// overload, and keeps the owning `ResolvedSym`'s `FuncBinding` in sync
    /// (`Single` while there's exactly one overload, `Overloaded` from the
    /// second on).
    fn register_func_overload_with_sig(
        &mut self,
        owner_parent: ResolvedSymId,
        name: NameId,
        chunk_id: ChunkId,
        decl: NodeId,
        sig: ResolvedFuncSigId,
        exported: bool,
        span: Span,
    ) -> SemaResult<(ResolvedSymId, ResolvedFuncSigId)> {
        let existing = self.compilation.resolved_syms.lookup(owner_parent, name);
        let owner = match existing {
            Some(id) => {
                if !matches!(self.compilation.resolved_syms.get(id).variant, ResolvedSymVariant::Func { .. }) {
                    return Err(self.dup_top_level(name, span));
                }
                id
            }
            None => self.compilation.resolved_syms.insert(ResolvedSym {
                parent: owner_parent,
                name,
                variant: ResolvedSymVariant::Func {
                    binding: FuncBinding::Overloaded,
                },
                exported,
            }),
        };
        if self.compilation.resolved_func_syms.lookup(owner, sig).is_some() {
            return Err(SemaError::new(
                SemaErrorKind::OverloadCollision {
                    name: Cow::Owned(self.compilation.interner.get_str(name).to_string()),
                },
                span,
            ));
        }
        let func_sym_id = self.compilation.resolved_func_syms.get_or_insert(owner, sig, || ResolvedFuncSym {
            chunk: chunk_id,
            decl,
            r_func_sig: sig,
            return_type: Type::any(),
            has_static_initializer: false,
        });
        if self.compilation.resolved_func_syms.overload_count(owner) == 1 {
            self.compilation.resolved_syms.get_mut(owner).variant = ResolvedSymVariant::Func {
                binding: FuncBinding::Single(func_sym_id),
            };
        } else {
            self.compilation.resolved_syms.get_mut(owner).variant = ResolvedSymVariant::Func {
                binding: FuncBinding::Overloaded,
            };
        }
        Ok((owner, sig))
    }

    fn prescan_object(&mut self, chunk_id: ChunkId, root: ResolvedSymId, def: &ObjectDef, exported: bool, span: Span) -> SemaResult<()> {
        if self.compilation.resolved_syms.lookup(root, def.name.name).is_some() {
            return Err(SemaError::new(
                SemaErrorKind::DuplicateObjectType {
                    name: Cow::Owned(self.compilation.interner.get_str(def.name.name).to_string()),
                },
                span,
            ));
        }
        self.compilation.resolved_syms.insert(ResolvedSym {
            parent: root,
            name: def.name.name,
            variant: ResolvedSymVariant::Object,
            exported,
        });
        if exported {
            self.publish_module_entry(chunk_id, def.name.name, ResolvedFuncSigId::NONE, ModuleEntry::UserObject { chunk: chunk_id, decl: def.id });
        }
        let object_type = self.vm.ensure_object_type(chunk_id, def.id, def.name.name);
        for field in &def.fields {
            let field_sym = self.vm.ensure_field_sym(object_type, field.name.name);
            self.vm.add_field_sym(object_type, field_sym);
        }
        for member in &def.members {
            let field_sym = self.vm.ensure_field_sym(object_type, member.func.name.name);
            self.vm.add_field_sym(object_type, field_sym);
            let method_sym = self.vm.ensure_func_sym(chunk_id, member.func.id, member.func.name.name);
            self.vm.retain(method_sym);
            self.compilation.runtime_syms.insert((chunk_id, member.func.id), method_sym);
        }
        Ok(())
    }

    fn prescan_tag(&mut self, chunk_id: ChunkId, root: ResolvedSymId, def: &TagTypeDef, exported: bool, span: Span) -> SemaResult<()> {
        if self.compilation.resolved_syms.lookup(root, def.name.name).is_some() {
            return Err(self.dup_top_level(def.name.name, span));
        }
        self.compilation.resolved_syms.insert(ResolvedSym {
            parent: root,
            name: def.name.name,
            variant: ResolvedSymVariant::BuiltinType,
            exported,
        });
        let tag_type = self.vm.ensure_tag_type(chunk_id, def.name.id, def.name.name);
        for (ordinal, member) in def.members.iter().enumerate() {
            let sym = self.vm.ensure_tag_lit_sym(tag_type, member.name);
            self.vm.set_tag_lit_sym(sym, ordinal as u32);
        }
        Ok(())
    }

    /// Interns the untyped-by-arity resolved func sig (every element the
    /// builtin `any`), the one every overload of a given arity shares.
    fn untyped_resolved_func_sig(&mut self, arity: usize) -> ResolvedFuncSigId {
        let any_sym = self.compilation.any_sym;
        let elements: Vec<ResolvedSymId> = std::iter::repeat(any_sym).take(arity + 1).collect();
        self.compilation.resolved_func_sigs.intern(elements, any_sym)
    }

    /// Computes the final return [`Type`] for a just-analyzed function body:
    /// the declared type if present, else the block's inferred `ret_type` if
    /// any `return expr` was seen, else `any` (falling off the end of the
    /// body with no tag to infer from).
    fn finalize_return_type(&mut self, chunk_id: ChunkId, block: crate::ids::BlockId, declared_return_sym: Option<ResolvedSymId>) -> Type {
        if let Some(declared) = declared_return_sym {
            return self
                .compilation
                .builtin_type_values
                .get(&declared)
                .copied()
                .unwrap_or_else(Type::boxed);
        }
        let b = self.compilation.chunk(chunk_id).blocks.get_block(block);
        if b.has_ret_type {
            b.ret_type
        } else {
            Type::any()
        }
    }

    fn dup_top_level(&mut self, name: NameId, span: Span) -> SemaError {
        SemaError::new(
            SemaErrorKind::DuplicateTopLevelSym {
                name: Cow::Owned(self.compilation.interner.get_str(name).to_string()),
            },
            span,
        )
    }

    // ---- Statement traversal ----

    fn stmt(&mut self, chunk_id: ChunkId, s: &mut StmtLoc) -> SemaResult<()> {
        let span = s.span;
        match &mut s.stmt {
            Stmt::Pass | Stmt::Break | Stmt::Continue | Stmt::ReturnNoExpr | Stmt::AtStmt => Ok(()),
            Stmt::ExprStmt(e) => self.expr(chunk_id, e).map(|_| ()),
            Stmt::Return(e) => {
                let ty = self.expr(chunk_id, e)?;
                self.compilation.chunk_mut(chunk_id).blocks.record_return(ty.to_local_type());
                Ok(())
            }
            Stmt::OpAssign { target, rhs, .. } => self.assign_stmt(chunk_id, target, rhs, span),
            Stmt::Assign { target, rhs } => self.assign_stmt(chunk_id, target, rhs, span),
            Stmt::VarDecl { name, rhs } => self.static_var_decl(chunk_id, name, rhs, span),
            Stmt::CaptureDecl { name, rhs } => self.modifier_decl(chunk_id, name, rhs.as_mut(), LookupStrategy::CaptureAssign, span),
            Stmt::StaticDecl { name, rhs } => self.modifier_decl(chunk_id, name, rhs.as_mut(), LookupStrategy::StaticAssign, span),
            Stmt::TypeAliasDecl { name, rhs } => self.type_alias_decl(chunk_id, name, rhs, span),
            Stmt::TagTypeDecl(_) => Ok(()),
            Stmt::ObjectDecl(def) => self.object_decl(chunk_id, def),
            Stmt::FuncDecl(def) => self.func_body(chunk_id, def, None),
            Stmt::FuncDeclWithInitializer { decl, initializer } => self.func_body(chunk_id, decl, Some(initializer)),
            Stmt::If(if_stmt) => self.if_stmt(chunk_id, if_stmt),
            Stmt::WhileCond { cond, body } => {
                self.expr(chunk_id, cond)?;
                self.loop_body(chunk_id, body)
            }
            Stmt::WhileInf { body } => self.loop_body(chunk_id, body),
            Stmt::ForOpt { binding, iterable, body } => {
                self.expr(chunk_id, iterable)?;
                let bindings = binding.as_mut().into_iter().map(|b| (b, Type::any(), false)).collect();
                self.for_loop_body(chunk_id, bindings, body)
            }
            Stmt::ForIter { value, key, iterable, body } => {
                self.expr(chunk_id, iterable)?;
                let mut bindings = vec![(value, Type::any(), true)];
                if let Some(k) = key {
                    bindings.push((k, Type::any(), true));
                }
                self.for_loop_body(chunk_id, bindings, body)
            }
            Stmt::ForRange { each, start, end, body } => {
                self.expr(chunk_id, start)?;
                self.expr(chunk_id, end)?;
                self.for_loop_body(chunk_id, vec![(each, Type::number(), false)], body)
            }
            Stmt::MatchStmt(m) => self.match_stmt(chunk_id, m),
            Stmt::Import(stmt) => self.import_stmt(chunk_id, stmt, span),
            Stmt::Export(inner) => self.stmt(chunk_id, inner),
        }
    }

    fn if_stmt(&mut self, chunk_id: ChunkId, s: &mut IfStmt) -> SemaResult<()> {
        self.expr(chunk_id, &mut s.first.cond)?;
        self.branch_body(chunk_id, &mut s.first.body)?;
        for branch in &mut s.else_ifs {
            self.expr(chunk_id, &mut branch.cond)?;
            self.branch_body(chunk_id, &mut branch.body)?;
        }
        if let Some(else_body) = &mut s.else_body {
            self.branch_body(chunk_id, else_body)?;
        }
        Ok(())
    }

    fn branch_body(&mut self, chunk_id: ChunkId, body: &mut [StmtLoc]) -> SemaResult<()> {
        self.compilation.chunk_mut(chunk_id).blocks.push_sub_block();
        for s in body.iter_mut() {
            self.stmt(chunk_id, s)?;
        }
        let chunk = self.compilation.chunk_mut(chunk_id);
        let widened = chunk.blocks.end_current_sub_block(&mut chunk.locals);
        self.tracer.on_sub_block_closed(widened);
        Ok(())
    }

    fn loop_body(&mut self, chunk_id: ChunkId, body: &mut [StmtLoc]) -> SemaResult<()> {
        let span = Span::synthetic(chunk_id);
        self.compilation.limit_tracker.enter_block_depth(&self.compilation.limits, span)?;
        self.compilation.chunk_mut(chunk_id).blocks.push_iter_sub_block();
        for s in body.iter_mut() {
            self.stmt(chunk_id, s)?;
        }
        let chunk = self.compilation.chunk_mut(chunk_id);
        let widened = chunk.blocks.end_current_sub_block(&mut chunk.locals);
        self.compilation.limit_tracker.leave_block_depth();
        self.tracer.on_sub_block_closed(widened);
        Ok(())
    }

    /// Binds each loop variable as a fresh local of its own kind: a
    /// for-range `each` is numeric, a for-iter value/key is marked
    /// `gen_initializer` (the codegen needs a synthesized initializer for
    /// it), and a for-opt binding is untyped and plain.
    fn for_loop_body(&mut self, chunk_id: ChunkId, bindings: Vec<(&mut Ident, Type, bool)>, body: &mut [StmtLoc]) -> SemaResult<()> {
        let span = Span::synthetic(chunk_id);
        self.compilation.limit_tracker.enter_block_depth(&self.compilation.limits, span)?;
        self.compilation.chunk_mut(chunk_id).blocks.push_iter_sub_block();
        for (binding, vtype, gen_initializer) in bindings {
            let chunk = self.compilation.chunk_mut(chunk_id);
            let sub_block = chunk.blocks.current_sub_block_id();
            let block = chunk.blocks.current_block_id();
            let var = chunk.locals.create(sub_block);
            if gen_initializer {
                chunk.locals.get_mut(var).gen_initializer = true;
            }
            chunk.blocks.bind_name(block, binding.name, var);
            chunk.blocks.add_local(block, var);
            binding.resolution = NameResolution::Local(var);
            chunk.blocks.assign_local(&mut chunk.locals, var, vtype, AssignStrategy::Assign);
        }
        for s in body.iter_mut() {
            self.stmt(chunk_id, s)?;
        }
        let chunk = self.compilation.chunk_mut(chunk_id);
        let widened = chunk.blocks.end_current_sub_block(&mut chunk.locals);
        self.compilation.limit_tracker.leave_block_depth();
        self.tracer.on_sub_block_closed(widened);
        Ok(())
    }

    fn match_stmt(&mut self, chunk_id: ChunkId, m: &mut MatchNode) -> SemaResult<()> {
        self.expr(chunk_id, &mut m.scrutinee)?;
        for case in &mut m.cases {
            for cond in case.conditions.iter_mut().flatten() {
                self.expr(chunk_id, cond)?;
            }
            self.branch_body(chunk_id, &mut case.body)?;
        }
        Ok(())
    }

    fn assign_stmt(&mut self, chunk_id: ChunkId, target: &mut AssignTarget, rhs: &mut ExprLoc, span: Span) -> SemaResult<()> {
        let rhs_type = self.expr(chunk_id, rhs)?;
        match target {
            AssignTarget::Ident(ident) => {
                self.bind_name_use(chunk_id, ident, LookupStrategy::Assign, rhs_type, span)?;
                Ok(())
            }
            AssignTarget::Access { left, .. } | AssignTarget::Index { left, .. } => {
                self.expr(chunk_id, left)?;
                if let AssignTarget::Index { index, .. } = target {
                    self.expr(chunk_id, index)?;
                }
                Ok(())
            }
        }
    }

    fn static_var_decl(&mut self, chunk_id: ChunkId, name: &Ident, rhs: &mut ExprLoc, span: Span) -> SemaResult<()> {
        let root = self.module_resolved_root(chunk_id);
        let owner = self
            .compilation
            .resolved_syms
            .lookup(root, name.name)
            .expect("prescan registers every top-level var decl");
        let chunk = self.compilation.chunk_mut(chunk_id);
        chunk.cur_sema_sym_var = owner;
        chunk.cur_sema_deps.clear();
        let result = self.expr(chunk_id, rhs);
        let chunk = self.compilation.chunk_mut(chunk_id);
        chunk.cur_sema_sym_var = ResolvedSymId::NONE;
        let deps = std::mem::take(&mut chunk.cur_sema_deps);
        let rhs_type = result.map_err(|e| {
            if e.is_can_not_use_local() {
                SemaError::new(e.kind, span)
            } else {
                e
            }
        })?;
        self.compilation.deps.record(owner, &deps);
        if let Some(&runtime_sym) = self.compilation.runtime_syms.get(&(chunk_id, name.id)) {
            self.vm.set_var_sym(runtime_sym, rhs_type.rc_candidate);
        }
        Ok(())
    }

    fn modifier_decl(
        &mut self,
        chunk_id: ChunkId,
        name: &mut Ident,
        rhs: Option<&mut ExprLoc>,
        strategy: LookupStrategy,
        span: Span,
    ) -> SemaResult<()> {
        let rhs_type = match rhs {
            Some(e) => self.expr(chunk_id, e)?,
            None => Type::undefined(),
        };
        self.bind_name_use(chunk_id, name, strategy, rhs_type, span)?;
        Ok(())
    }

    fn type_alias_decl(&mut self, chunk_id: ChunkId, name: &Ident, rhs: &mut ExprLoc, span: Span) -> SemaResult<()> {
        let target_name = match &rhs.expr {
            Expr::Ident(i) => i.name,
            _ => return Err(SemaError::new(SemaErrorKind::UnsupportedTypeAliasRhs, span)),
        };
        let root = self.module_resolved_root(chunk_id);
        let Some(target) = self.resolve_type_name(chunk_id, target_name) else {
            return Err(SemaError::new(
                SemaErrorKind::UnresolvedAliasTarget {
                    name: Cow::Owned(self.compilation.interner.get_str(target_name).to_string()),
                },
                span,
            ));
        };
        if self.compilation.resolved_syms.lookup(root, name.name).is_some() {
            return Err(self.dup_top_level(name.name, span));
        }
        let variant = self.compilation.resolved_syms.get(target).variant;
        self.compilation.resolved_syms.insert(ResolvedSym {
            parent: root,
            name: name.name,
            variant,
            exported: false,
        });
        if let Expr::Ident(i) = &mut rhs.expr {
            let sym = self.sym_alias_for(chunk_id, target);
            i.resolution = NameResolution::Sym(sym);
        }
        Ok(())
    }

    // ---- Function declarations ----

    fn func_body(&mut self, chunk_id: ChunkId, def: &mut FuncDef, initializer: Option<&mut ExprLoc>) -> SemaResult<()> {
        if let Some(init) = initializer {
            let root = self.module_resolved_root(chunk_id);
            let owner = self
                .compilation
                .resolved_syms
                .lookup(root, def.name.name)
                .expect("prescan registers every top-level func decl");
            let chunk = self.compilation.chunk_mut(chunk_id);
            chunk.cur_sema_sym_var = owner;
            chunk.cur_sema_deps.clear();
            let result = self.expr(chunk_id, init);
            let chunk = self.compilation.chunk_mut(chunk_id);
            chunk.cur_sema_sym_var = ResolvedSymId::NONE;
            let deps = std::mem::take(&mut chunk.cur_sema_deps);
            result.map_err(|e| if e.is_can_not_use_local() { SemaError::new(e.kind, def.span) } else { e })?;
            self.compilation.deps.record(owner, &deps);

            // : a func decl with an initializer marks its
            // resolved overload so the code generator knows to run the
            // initializer before the function becomes callable. Rebuild the
            // same untyped-by-arity sig `prescan_func` registered this decl
            // under, rather than assuming `FuncBinding::Single`.
            let sig = self.untyped_resolved_func_sig(def.params.len());
            if let Some(func_sym_id) = self.compilation.resolved_func_syms.lookup(owner, sig) {
                self.compilation.resolved_func_syms.get_mut(func_sym_id).has_static_initializer = true;
            }
        }

        let is_static = true;
        let chunk = self.compilation.chunk_mut(chunk_id);
        let block = chunk.blocks.push_block(Some(def.id), is_static);
        def.sema_block_id = Some(block);

        let mut local_sig = Vec::with_capacity(def.params.len() + 1);
        for param in &def.params {
            local_sig.push(self.push_func_param(chunk_id, block, param, def.span)?);
        }
        let return_sym = if let Some(declared) = &def.declared_return_type {
            self.resolve_type_name(chunk_id, declared.name).unwrap_or(self.compilation.any_sym)
        } else {
            self.compilation.any_sym
        };
        let return_sym_local = {
            let chunk = self.compilation.chunk_mut(chunk_id);
            let sym = chunk.syms.get_or_create(SymId::NONE, NameId::NONE, FuncSigId::NONE);
            chunk.syms.set_resolved(sym, return_sym);
            sym
        };
        local_sig.push(return_sym_local);
        let sig_id = self.compilation.chunk_mut(chunk_id).func_sigs.intern(local_sig);
        def.sema_func_sig_id = sig_id;

        for s in def.body.iter_mut() {
            self.stmt(chunk_id, s)?;
        }

        let declared_return_sym = def.declared_return_type.is_some().then_some(return_sym);
        let final_return_type = self.finalize_return_type(chunk_id, block, declared_return_sym);
        let chunk = self.compilation.chunk_mut(chunk_id);
        chunk.blocks.end_block(&mut chunk.locals);

        let root = self.module_resolved_root(chunk_id);
        if let Some(owner) = self.compilation.resolved_syms.lookup(root, def.name.name) {
            let sig = self.untyped_resolved_func_sig(def.params.len());
            if let Some(func_sym_id) = self.compilation.resolved_func_syms.lookup(owner, sig) {
                self.compilation.resolved_func_syms.get_mut(func_sym_id).return_type = final_return_type;
                let has_static_initializer = self.compilation.resolved_func_syms.get(func_sym_id).has_static_initializer;
                if let Some(&runtime_sym) = self.compilation.runtime_syms.get(&(chunk_id, def.id)) {
                    self.vm.set_func_sym(runtime_sym, has_static_initializer);
                }
            }
        }
        Ok(())
    }

    /// Resolves a declared type name: this chunk's own module root first,
    /// then the builtin-type-name table — so a param
    /// declared `x: int` resolves even though `int` is never registered
    /// under any module's root.
    fn resolve_type_name(&mut self, chunk_id: ChunkId, name: NameId) -> Option<ResolvedSymId> {
        let root = self.module_resolved_root(chunk_id);
        self.compilation
            .resolved_syms
            .lookup(root, name)
            .or_else(|| self.compilation.builtin_types.get(&name).copied())
    }

    /// Pushes one declared param as a local in `block`, plus a parallel
    /// chunk-local sym (parent `SymId::NONE`, pre-resolved to the param's
    /// declared type) used as this param's slot in the enclosing func sig.
    fn push_func_param(&mut self, chunk_id: ChunkId, block: crate::ids::BlockId, param: &Param, span: Span) -> SemaResult<SymId> {
        let param_sym = if let Some(declared) = &param.declared_type {
            match self.resolve_type_name(chunk_id, declared.name) {
                Some(id) => id,
                None => {
                    return Err(SemaError::new(
                        SemaErrorKind::UnresolvedParamType {
                            param: Cow::Owned(self.compilation.interner.get_str(declared.name).to_string()),
                        },
                        span,
                    ))
                }
            }
        } else {
            self.compilation.any_sym
        };
        let chunk = self.compilation.chunk_mut(chunk_id);
        let sub_block = chunk.blocks.current_sub_block_id();
        let var = chunk.locals.create(sub_block);
        chunk.locals.get_mut(var).is_param = true;
        chunk.blocks.add_param(block, var);
        chunk.blocks.bind_name(block, param.name.name, var);
        let sym = chunk.syms.get_or_create(SymId::NONE, param.name.name, FuncSigId::NONE);
        chunk.syms.set_resolved(sym, param_sym);
        Ok(sym)
    }

    /// Pushes the synthetic `self: any` local a method body sees in place of
    /// its source-level `self` parameter.
    fn push_synthetic_self_param(&mut self, chunk_id: ChunkId, block: crate::ids::BlockId) {
        let self_name = self.compilation.interner.well_known(WellKnownName::SelfParam);
        let chunk = self.compilation.chunk_mut(chunk_id);
        let sub_block = chunk.blocks.current_sub_block_id();
        let var = chunk.locals.create(sub_block);
        chunk.locals.get_mut(var).is_param = true;
        chunk.blocks.add_param(block, var);
        chunk.blocks.bind_name(block, self_name, var);
    }

    // ---- Object declarations ----

    /// Analyzes every member of an object decl. The object's
    /// own resolved sym already exists (registered by `prescan_object`);
    /// static-function members additionally get a child resolved sym here,
    /// once their body has been analyzed and their arity is known.
    fn object_decl(&mut self, chunk_id: ChunkId, def: &mut ObjectDef) -> SemaResult<()> {
        let root = self.module_resolved_root(chunk_id);
        let object_sym = self
            .compilation
            .resolved_syms
            .lookup(root, def.name.name)
            .expect("prescan registers every top-level object decl");
        for member in &mut def.members {
            self.object_member(chunk_id, object_sym, member)?;
        }
        Ok(())
    }

    fn object_member(&mut self, chunk_id: ChunkId, object_sym: ResolvedSymId, member: &mut ObjectMember) -> SemaResult<()> {
        let def = &mut member.func;
        let self_name = self.compilation.interner.well_known(WellKnownName::SelfParam);
        let is_method = def.params.first().is_some_and(|p| p.name.name == self_name);

        let block = self.compilation.chunk_mut(chunk_id).blocks.push_block(Some(def.id), true);
        def.sema_block_id = Some(block);

        if is_method {
            for param in &def.params[1..] {
                self.push_func_param(chunk_id, block, param, def.span)?;
            }
            self.push_synthetic_self_param(chunk_id, block);
        } else {
            for param in &def.params {
                self.push_func_param(chunk_id, block, param, def.span)?;
            }
        }

        for s in def.body.iter_mut() {
            self.stmt(chunk_id, s)?;
        }

        let declared_return_sym = match &def.declared_return_type {
            Some(declared) => self.resolve_type_name(chunk_id, declared.name),
            None => None,
        };
        let final_return_type = self.finalize_return_type(chunk_id, block, declared_return_sym);
        let chunk = self.compilation.chunk_mut(chunk_id);
        chunk.blocks.end_block(&mut chunk.locals);

        if !is_method {
            let (_, sig) = self.register_func_overload(object_sym, def.name.name, chunk_id, def.id, def.params.len(), true, def.span)?;
            let any_sym = self.compilation.any_sym;
            let local_elements: Vec<SymId> = (0..=def.params.len())
                .map(|_| self.sym_alias_for(chunk_id, any_sym))
                .collect();
            let func_sig = self.compilation.chunk_mut(chunk_id).func_sigs.intern(local_elements);
            self.compilation.chunk_mut(chunk_id).func_sigs.set_resolved(func_sig, sig);
            def.sema_func_sig_id = func_sig;
            if let Some(func_sym_id) = self.compilation.resolved_func_syms.lookup(object_sym, sig) {
                self.compilation.resolved_func_syms.get_mut(func_sym_id).return_type = final_return_type;
            }
        }
        if let Some(&runtime_sym) = self.compilation.runtime_syms.get(&(chunk_id, def.id)) {
            self.vm.set_func_sym(runtime_sym, false);
        }
        Ok(())
    }

    // ---- Imports ----

    fn import_stmt(&mut self, chunk_id: ChunkId, stmt: &ImportStmt, span: Span) -> SemaResult<()> {
        let importing_uri = self.compilation.chunk(chunk_id).uri.clone();
        let fs = crate::module::RealFilesystem;
        let builtins = self.compilation.builtin_loaders.clone();
        let resolved = crate::module::resolve_spec_temp(&stmt.spec, &importing_uri, &builtins, &fs, span)?;
        let (abs_spec, is_builtin) = match &resolved {
            ImportSpec::Builtin(name) => (name.clone(), true),
            ImportSpec::Url(url) => (url.clone(), false),
            ImportSpec::Path(_) => (resolved.canonical_key(), false),
        };
        let node_id = stmt.binding_name.id;
        let (mod_id, was_new) = self.compilation.modules.get_or_load(abs_spec, is_builtin, chunk_id, node_id);
        self.tracer.on_module_requested(mod_id, was_new);

        let chunk = self.compilation.chunk_mut(chunk_id);
        if stmt.import_all {
            // : "copies each key of the target module's sym map
            // into the current chunk's symRef[name]". The target module's
            // member set isn't known yet (it's still a pending `ImportTask`
            // the first time this runs), so `wildcard_imports` defers the
            // per-name copy to `resolve_sym_owner`, which consults it once
            // the module has actually finished loading.
            chunk.wildcard_imports.push(mod_id);
        } else {
            chunk.sym_refs.insert(stmt.binding_name.name, SymRef::Module(mod_id));
        }
        Ok(())
    }

    // ---- Expressions ----

    fn expr(&mut self, chunk_id: ChunkId, e: &mut ExprLoc) -> SemaResult<Type> {
        let span = e.span;
        match &mut e.expr {
            Expr::Literal(lit) => Ok(self.literal_type(lit)),
            Expr::StringTemplate(parts) => {
                for p in parts.iter_mut() {
                    self.expr(chunk_id, p)?;
                }
                Ok(Type::string())
            }
            Expr::TagInit { .. } => Ok(Type::tag_literal()),
            Expr::Binary { lhs, rhs, .. } => {
                self.expr(chunk_id, lhs)?;
                self.expr(chunk_id, rhs)?;
                Ok(Type::number())
            }
            Expr::Compare { lhs, rhs, can_request_integer_operands, .. } => {
                let lt = self.expr(chunk_id, lhs)?;
                let rt = self.expr(chunk_id, rhs)?;
                *can_request_integer_operands = lt.can_request_integer() && rt.can_request_integer();
                Ok(Type::boolean())
            }
            Expr::Logical { lhs, rhs, .. } => {
                let lt = self.expr(chunk_id, lhs)?;
                let rt = self.expr(chunk_id, rhs)?;
                Ok(Type::common_or_any(&lt, &rt))
            }
            Expr::Unary { operand, .. } => self.expr(chunk_id, operand),
            Expr::Ident(ident) => self.read_ident(chunk_id, ident, span),
            Expr::Call { callee, args, has_named_args } => {
                if *has_named_args {
                    return Err(SemaError::new(SemaErrorKind::UnsupportedNamedArgs, span));
                }
                let callee_ty = self.call_callee(chunk_id, callee, args.len(), span)?;
                for a in args.iter_mut() {
                    self.expr(chunk_id, a)?;
                }
                Ok(callee_ty)
            }
            Expr::Access { left, name, resolution } => {
                let (r, ty) = self.access_expr(chunk_id, left, name.name, FuncSigId::NONE, span)?;
                *resolution = r;
                Ok(ty)
            }
            Expr::Index { left, index } => {
                self.expr(chunk_id, left)?;
                self.expr(chunk_id, index)?;
                Ok(Type::any())
            }
            Expr::ObjectInit { type_name, fields, resolution } => {
                let root = self.module_resolved_root(chunk_id);
                match self.compilation.resolved_syms.lookup(root, type_name.name) {
                    Some(id) => *resolution = NameResolution::Sym(self.sym_alias_for(chunk_id, id)),
                    None => {
                        return Err(SemaError::new(
                            SemaErrorKind::MissingSymbol {
                                name: Cow::Owned(self.compilation.interner.get_str(type_name.name).to_string()),
                            },
                            span,
                        ))
                    }
                }
                for (_, value) in fields.iter_mut() {
                    self.expr(chunk_id, value)?;
                }
                Ok(Type::boxed())
            }
            Expr::Lambda(lambda) => self.lambda(chunk_id, lambda),
            Expr::Coyield => Ok(Type::any()),
            Expr::Coresume(inner) | Expr::Try(inner) | Expr::Compt(inner) => self.expr(chunk_id, inner),
            Expr::IfExpr { cond, then, else_ } => {
                self.expr(chunk_id, cond)?;
                let t = self.expr(chunk_id, then)?;
                let e = self.expr(chunk_id, else_)?;
                Ok(Type::common_or_any(&t, &e))
            }
            Expr::MatchExpr(m) => {
                self.expr(chunk_id, &mut m.scrutinee)?;
                let mut merged: Option<Type> = None;
                for case in &mut m.cases {
                    for cond in case.conditions.iter_mut().flatten() {
                        self.expr(chunk_id, cond)?;
                    }
                    for s in case.body.iter_mut() {
                        self.stmt(chunk_id, s)?;
                    }
                    merged = Some(match merged {
                        None => Type::any(),
                        Some(prev) => Type::common_or_any(&prev, &Type::any()),
                    });
                }
                Ok(merged.unwrap_or_else(Type::any))
            }
        }
    }

    fn literal_type(&self, lit: &Literal) -> Type {
        match lit {
            Literal::Boolean(_) => Type::boolean(),
            Literal::StringLit => Type::static_string(),
            Literal::Number(NumericLiteral::Decimal { is_integer_valued, .. }) => {
                if *is_integer_valued {
                    Type::number_or_request_integer()
                } else {
                    Type::number()
                }
            }
            Literal::Number(NumericLiteral::Radix { value }) => {
                if *value <= i32::MAX as u64 {
                    Type::number_or_request_integer()
                } else {
                    Type::number()
                }
            }
        }
    }

    /// Three callee shapes: a bare identifier, an
    /// access-expression (method-style call), or any other expression
    /// (lambda result, call result, ...), which is only valid if its runtime
    /// value happens to be callable — a fact this crate cannot check statically.
    fn call_callee(&mut self, chunk_id: ChunkId, callee: &mut ExprLoc, arity: usize, span: Span) -> SemaResult<Type> {
        match &mut callee.expr {
            Expr::Ident(ident) => {
                // If the name already resolves to a local, this is a
                // function-*value* call — the callee doesn't get a func-sig
                // keyed sym.
                if let Some(var) = self.resolve_name_in_scope(chunk_id, ident.name, LookupStrategy::Read, Type::any(), span)? {
                    ident.resolution = NameResolution::Local(var);
                    return Ok(self.compilation.chunk(chunk_id).locals.get(var).vtype);
                }
                let func_sig = self.untyped_local_func_sig(chunk_id, arity);
                let chunk = self.compilation.chunk_mut(chunk_id);
                let sym = chunk.syms.get_or_create(chunk.root_sym, ident.name, func_sig);
                ident.resolution = NameResolution::Sym(sym);
                let resolved = self.resolve_sym(chunk_id, sym, span)?;
                self.tracer.on_sym_resolved(sym, resolved);
                Ok(self.type_of_resolved(resolved))
            }
            Expr::Access { left, name, resolution } => {
                let func_sig = self.untyped_local_func_sig(chunk_id, arity);
                let (r, ty) = self.access_expr(chunk_id, left, name.name, func_sig, span)?;
                *resolution = r;
                Ok(ty)
            }
            _ => self.expr(chunk_id, callee),
        }
    }

    /// Interns a local func sig of the given arity where every element
    /// (params and return) is the builtin `any` type ("intern
    /// an untyped func-sig of the call's arity").
    fn untyped_local_func_sig(&mut self, chunk_id: ChunkId, arity: usize) -> FuncSigId {
        let any_sym = self.compilation.any_sym;
        let mut elements = Vec::with_capacity(arity + 1);
        for _ in 0..=arity {
            elements.push(self.sym_alias_for(chunk_id, any_sym));
        }
        self.compilation.chunk_mut(chunk_id).func_sigs.intern(elements)
    }

    /// Shared logic for `a.b` in both value and call position (plain member
    /// access and method-style calls): analyzes the left side, and if it
    /// ends at a sym (an identifier or nested access that itself resolved to
    /// a sym), creates/touches a child sym `(leftSym, name, func_sig)`.
    /// Otherwise the access is left unresolved — once a prefix fails to be a
    /// sym, every position after it is not sym-bound either.
    fn access_expr(
        &mut self,
        chunk_id: ChunkId,
        left: &mut ExprLoc,
        name: NameId,
        func_sig: FuncSigId,
        span: Span,
    ) -> SemaResult<(NameResolution, Type)> {
        self.expr(chunk_id, left)?;
        let left_sym = match &left.expr {
            Expr::Ident(i) => match i.resolution {
                NameResolution::Sym(s) => Some(s),
                _ => None,
            },
            Expr::Access { resolution, .. } => match resolution {
                NameResolution::Sym(s) => Some(*s),
                _ => None,
            },
            _ => None,
        };
        match left_sym {
            Some(left_sym) => {
                let chunk = self.compilation.chunk_mut(chunk_id);
                let sym = chunk.syms.get_or_create(left_sym, name, func_sig);
                let resolved = self.resolve_sym(chunk_id, sym, span)?;
                self.tracer.on_sym_resolved(sym, resolved);
                Ok((NameResolution::Sym(sym), self.type_of_resolved(resolved)))
            }
            None => Ok((NameResolution::Unresolved, Type::any())),
        }
    }

    fn lambda(&mut self, chunk_id: ChunkId, lambda: &mut LambdaDef) -> SemaResult<Type> {
        let chunk = self.compilation.chunk_mut(chunk_id);
        let block = chunk.blocks.push_block(Some(lambda.id), false);
        lambda.sema_block_id = Some(block);
        for param in &lambda.params {
            let chunk = self.compilation.chunk_mut(chunk_id);
            let sub_block = chunk.blocks.current_sub_block_id();
            let var = chunk.locals.create(sub_block);
            chunk.locals.get_mut(var).is_param = true;
            chunk.blocks.add_param(block, var);
            chunk.blocks.bind_name(block, param.name, var);
        }
        let any_sym = self.compilation.any_sym;
        let elements: Vec<ResolvedSymId> = std::iter::repeat(any_sym).take(lambda.params.len() + 1).collect();
        lambda.sema_resolved_func_sig = Some(self.compilation.resolved_func_sigs.intern(elements, any_sym));

        match &mut lambda.body {
            LambdaBody::Expr(e) => {
                self.expr(chunk_id, e)?;
            }
            LambdaBody::Block(body) => {
                for s in body.iter_mut() {
                    self.stmt(chunk_id, s)?;
                }
            }
        }
        let chunk = self.compilation.chunk_mut(chunk_id);
        chunk.blocks.end_block(&mut chunk.locals);
        Ok(Type::boxed())
    }

    // ---- Name resolution ----

    fn read_ident(&mut self, chunk_id: ChunkId, ident: &mut Ident, span: Span) -> SemaResult<Type> {
        self.bind_name_use(chunk_id, ident, LookupStrategy::Read, Type::any(), span)
    }

    fn bind_name_use(
        &mut self,
        chunk_id: ChunkId,
        ident: &mut Ident,
        strategy: LookupStrategy,
        rhs_type: Type,
        span: Span,
    ) -> SemaResult<Type> {
        if let Some(var) = self.resolve_name_in_scope(chunk_id, ident.name, strategy, rhs_type, span)? {
            ident.resolution = NameResolution::Local(var);
            let ty = self.compilation.chunk(chunk_id).locals.get(var).vtype;
            return Ok(ty);
        }

        let chunk = self.compilation.chunk_mut(chunk_id);
        let sym = chunk.syms.get_or_create(chunk.root_sym, ident.name, FuncSigId::NONE);
        ident.resolution = NameResolution::Sym(sym);
        let resolved = self.resolve_sym(chunk_id, sym, span)?;
        self.tracer.on_sym_resolved(sym, resolved);
        Ok(self.type_of_resolved(resolved))
    }

    fn type_of_resolved(&self, resolved: ResolvedSymId) -> Type {
        match self.compilation.resolved_syms.get(resolved).variant {
            ResolvedSymVariant::Variable => Type::any(),
            ResolvedSymVariant::Object | ResolvedSymVariant::BuiltinType => Type::boxed(),
            ResolvedSymVariant::Module { .. } => Type::any(),
            ResolvedSymVariant::Func { .. } => Type::any(),
        }
    }

    /// Materializes a chunk-local `Sym` that forwards to an already-resolved
    /// process-wide sym (used when an expression needs a `SymId` handle to
    /// something already known to be resolved, e.g. `ObjectInit`'s type name).
    fn sym_alias_for(&mut self, chunk_id: ChunkId, resolved: ResolvedSymId) -> SymId {
        let name = self.compilation.resolved_syms.get(resolved).name;
        let chunk = self.compilation.chunk_mut(chunk_id);
        let sym = chunk.syms.get_or_create(chunk.root_sym, name, FuncSigId::NONE);
        chunk.syms.set_resolved(sym, resolved);
        sym
    }

    /// Whether `name` already resolves at the top level without creating a
    /// local: an import redirect, a declared static var/func/object/tag, a
    /// builtin type name, or a wildcard-imported member ("No,
    /// assign" row: "At top-level block, if a root sym with this name
    /// already exists, bind as static alias").
    fn root_sym_already_exists(&mut self, chunk_id: ChunkId, name: NameId) -> bool {
        if self.compilation.chunk(chunk_id).sym_refs.get(name).is_some() {
            return true;
        }
        let root = self.module_resolved_root(chunk_id);
        if self.compilation.resolved_syms.lookup(root, name).is_some() {
            return true;
        }
        if self.compilation.builtin_types.contains_key(&name) {
            return true;
        }
        let wildcard_imports = self.compilation.chunk(chunk_id).wildcard_imports.clone();
        wildcard_imports.into_iter().any(|mod_id| {
            let module_root = self.compilation.modules.get(mod_id).resolved_root_sym_id;
            self.compilation.resolved_syms.lookup(module_root, name).is_some()
        })
    }

    /// The `LocalVar` half of name lookup: current block, then (for reads
    /// and `captureAssign`) the immediate parent block's `capture`/`static`
    /// vars only — a plain outer local is invisible to a nested function,
    /// matching this language's no-implicit-closure design. Returns `None`
    /// when the name is not a local at all, so the caller falls through to
    /// top-level `Sym` resolution.
    fn resolve_name_in_scope(
        &mut self,
        chunk_id: ChunkId,
        name: NameId,
        strategy: LookupStrategy,
        rhs_type: Type,
        span: Span,
    ) -> SemaResult<Option<LocalVarId>> {
        if strategy == LookupStrategy::StaticAssign {
            return self.resolve_static_assign(chunk_id, name, rhs_type, span);
        }

        /// What a single scope-chain walk settled on, computed inside the
        /// chunk-only borrow below; diagnostics referencing `self.compilation`
        /// are built afterward once that borrow has ended.
        enum Outcome {
            Found(LocalVarId),
            NotLocal,
            NeedsModifier,
            CaptureFromStatic,
            CanNotUseLocal,
            /// `captureAssign` found no parent local to capture at all
            /// ("No, captureAssign" row: "If no parent
            /// local, error").
            NoParentToCapture,
        }

        // Computed up front (strategy == Assign only) since it needs its own
        // `&mut self.compilation` borrow, disjoint from the chunk borrow below.
        let assign_root_exists = strategy == LookupStrategy::Assign
            && self.compilation.chunk(chunk_id).blocks.depth() == 1
            && self.root_sym_already_exists(chunk_id, name);

        let outcome = {
            let chunk = self.compilation.chunk_mut(chunk_id);
            let current_block = chunk.blocks.current_block_id();
            if let Some(var) = chunk.blocks.get_block(current_block).name_to_var(name) {
                // : reading a plain local from inside a static
                // var/func initializer (always evaluated at block depth 1,
                // before the initializer's own function block is pushed) is
                // rejected rather than resolved.
                if strategy == LookupStrategy::Read && chunk.in_static_initializer() && chunk.blocks.depth() == 1 {
                    Outcome::CanNotUseLocal
                } else {
                    let kind_ok = {
                        let v = chunk.locals.get(var);
                        match strategy {
                            LookupStrategy::Read => true,
                            LookupStrategy::Assign => {
                                if v.is_static_alias {
                                    v.has_capture_or_static_modifier || chunk.blocks.depth() == 1
                                } else if v.is_captured {
                                    v.has_capture_or_static_modifier
                                } else {
                                    true
                                }
                            }
                            LookupStrategy::CaptureAssign => v.is_captured,
                            LookupStrategy::StaticAssign => unreachable!("handled above"),
                        }
                    };
                    if !kind_ok {
                        Outcome::NeedsModifier
                    } else {
                        match strategy {
                            LookupStrategy::Read => {}
                            LookupStrategy::Assign => {
                                chunk.blocks.assign_local(&mut chunk.locals, var, rhs_type, AssignStrategy::Assign);
                            }
                            LookupStrategy::CaptureAssign => {
                                chunk.blocks.assign_local(&mut chunk.locals, var, rhs_type, AssignStrategy::CaptureAssign);
                            }
                            LookupStrategy::StaticAssign => unreachable!("handled above"),
                        }
                        Outcome::Found(var)
                    }
                }
            } else if strategy == LookupStrategy::Assign {
                // "No, assign": a brand-new name at this point
                // always becomes a fresh plain local — an assignment never
                // implicitly reaches into an enclosing scope.
                if assign_root_exists {
                    Outcome::NotLocal
                } else {
                    let sub_block = chunk.blocks.current_sub_block_id();
                    let nested = chunk.blocks.get_block(current_block).sub_block_depth > 1;
                    let var = chunk.locals.create(sub_block);
                    if nested {
                        chunk.locals.get_mut(var).gen_initializer = true;
                    }
                    chunk.blocks.bind_name(current_block, name, var);
                    chunk.blocks.add_local(current_block, var);
                    chunk.blocks.assign_local(&mut chunk.locals, var, rhs_type, AssignStrategy::Assign);
                    Outcome::Found(var)
                }
            } else if strategy == LookupStrategy::CaptureAssign {
                if chunk.blocks.get_block(current_block).is_static_func_block {
                    Outcome::CaptureFromStatic
                } else {
                    match chunk.blocks.parent_block_id().and_then(|p| chunk.blocks.get_block(p).name_to_var(name)) {
                        None => Outcome::NoParentToCapture,
                        Some(outer_var) => {
                            let outer = chunk.locals.get(outer_var);
                            let outer_is_static_alias = outer.is_static_alias;
                            let outer_static_sym = outer.static_alias_sym;
                            let sub_block = chunk.blocks.current_sub_block_id();
                            let alias = chunk.locals.create(sub_block);
                            if outer_is_static_alias {
                                chunk.locals.get_mut(alias).is_static_alias = true;
                                chunk.locals.get_mut(alias).static_alias_sym = outer_static_sym;
                            } else {
                                chunk.locals.get_mut(alias).is_captured = true;
                                chunk.locals.get_mut(alias).is_boxed = true;
                                chunk.locals.get_mut(alias).captured_from = outer_var;
                            }
                            chunk.blocks.bind_name(current_block, name, alias);
                            chunk.blocks.add_local(current_block, alias);
                            chunk.blocks.assign_local(&mut chunk.locals, alias, rhs_type, AssignStrategy::CaptureAssign);
                            Outcome::Found(alias)
                        }
                    }
                }
            } else {
                // Read, not found in this block: the search is restricted
                // to the immediate parent block only.
                match chunk.blocks.parent_block_id().and_then(|p| chunk.blocks.get_block(p).name_to_var(name)) {
                    None => Outcome::NotLocal,
                    Some(outer_var) => {
                        let outer_has_modifier = chunk.locals.get(outer_var).has_capture_or_static_modifier;
                        if !outer_has_modifier {
                            Outcome::NotLocal
                        } else if chunk.blocks.get_block(current_block).is_static_func_block {
                            Outcome::CaptureFromStatic
                        } else {
                            let outer = chunk.locals.get(outer_var);
                            let outer_is_static_alias = outer.is_static_alias;
                            let outer_static_sym = outer.static_alias_sym;
                            let sub_block = chunk.blocks.current_sub_block_id();
                            let alias = chunk.locals.create(sub_block);
                            if outer_is_static_alias {
                                chunk.locals.get_mut(alias).is_static_alias = true;
                                chunk.locals.get_mut(alias).static_alias_sym = outer_static_sym;
                            } else {
                                chunk.locals.get_mut(alias).is_captured = true;
                                chunk.locals.get_mut(alias).is_boxed = true;
                                chunk.locals.get_mut(alias).captured_from = outer_var;
                                chunk.blocks.add_param(current_block, alias);
                            }
                            chunk.blocks.bind_name(current_block, name, alias);
                            chunk.blocks.add_local(current_block, alias);
                            Outcome::Found(alias)
                        }
                    }
                }
            }
        };

        match outcome {
            Outcome::Found(var) => Ok(Some(var)),
            Outcome::NotLocal => Ok(None),
            Outcome::NoParentToCapture => Err(SemaError::new(
                SemaErrorKind::AssignWithoutModifier {
                    name: Cow::Owned(self.compilation.interner.get_str(name).to_string()),
                },
                span,
            )),
            Outcome::NeedsModifier => Err(SemaError::new(
                SemaErrorKind::AssignWithoutModifier {
                    name: Cow::Owned(self.compilation.interner.get_str(name).to_string()),
                },
                span,
            )),
            Outcome::CaptureFromStatic => Err(SemaError::new(
                SemaErrorKind::CaptureFromStaticFunction {
                    local: Cow::Owned(self.compilation.interner.get_str(name).to_string()),
                },
                span,
            )),
            Outcome::CanNotUseLocal => {
                let owner = self.compilation.chunk(chunk_id).cur_sema_sym_var;
                let enclosing_name = self.compilation.resolved_syms.get(owner).name;
                Err(SemaError::new(
                    SemaErrorKind::CanNotUseLocal {
                        local: Cow::Owned(self.compilation.interner.get_str(name).to_string()),
                        enclosing_sym: Cow::Owned(self.compilation.interner.get_str(enclosing_name).to_string()),
                    },
                    span,
                ))
            }
        }
    }

    /// `static x = ...`/plain reassignment of an already-`static` name: backed
    /// by a module-level `ResolvedSym` rather than a parent-scope `LocalVar`.
    fn resolve_static_assign(&mut self, chunk_id: ChunkId, name: NameId, rhs_type: Type, span: Span) -> SemaResult<Option<LocalVarId>> {
        let existing = {
            let chunk = self.compilation.chunk_mut(chunk_id);
            let current_block = chunk.blocks.current_block_id();
            chunk.blocks.get_block(current_block).name_to_var(name)
        };
        if let Some(var) = existing {
            // "Yes, non-alias / staticAssign": a name already
            // bound to a plain local or capture in this block can't be
            // turned into a static alias by a later `static` re-assignment.
            if !self.compilation.chunk(chunk_id).locals.get(var).is_static_alias {
                return Err(SemaError::new(
                    SemaErrorKind::AssignWithoutModifier {
                        name: Cow::Owned(self.compilation.interner.get_str(name).to_string()),
                    },
                    span,
                ));
            }
            let chunk = self.compilation.chunk_mut(chunk_id);
            chunk.blocks.assign_local(&mut chunk.locals, var, rhs_type, AssignStrategy::StaticAssign);
            return Ok(Some(var));
        }

        let root = self.module_resolved_root(chunk_id);
        let static_sym = self.compilation.resolved_syms.get_or_insert_with(root, name, || ResolvedSym {
            parent: root,
            name,
            variant: ResolvedSymVariant::Variable,
            exported: false,
        });

        let chunk = self.compilation.chunk_mut(chunk_id);
        let current_block = chunk.blocks.current_block_id();
        let sub_block = chunk.blocks.current_sub_block_id();
        let var = chunk.locals.create(sub_block);
        chunk.locals.get_mut(var).has_capture_or_static_modifier = true;
        chunk.locals.get_mut(var).is_static_alias = true;
        chunk.locals.get_mut(var).static_alias_sym = static_sym;
        chunk.blocks.bind_name(current_block, name, var);
        chunk.blocks.add_local(current_block, var);
        chunk.blocks.assign_local(&mut chunk.locals, var, rhs_type, AssignStrategy::StaticAssign);
        Ok(Some(var))
    }

    /// Lazily resolves a chunk-local `Sym` into a process-wide `ResolvedSym`,
    /// caching the result on the `Sym` itself. Splits the
    /// owner lookup (`resolve_sym_owner`) from function-overload matching
    /// (`apply_func_overload`) because a `SymRef::Sym` alias's own `func_sig`
    /// must be ignored when following the alias (only the referencing sym's
    /// `func_sig` determines which overload is meant).
    fn resolve_sym(&mut self, chunk_id: ChunkId, sym: SymId, span: Span) -> SemaResult<ResolvedSymId> {
        let existing = self.compilation.chunk(chunk_id).syms.get(sym).r_sym_id;
        if !existing.is_none() {
            return Ok(existing);
        }
        let func_sig = self.compilation.chunk(chunk_id).syms.get(sym).func_sig;
        let owner = self.resolve_sym_owner(chunk_id, sym, span)?;
        let resolved = self.apply_func_overload(chunk_id, owner, func_sig, sym, span)?;
        let chunk = self.compilation.chunk_mut(chunk_id);
        chunk.syms.set_resolved(sym, resolved);
        if chunk.in_static_initializer() {
            chunk.cur_sema_deps.push(resolved);
        }
        Ok(resolved)
    }

    /// Finds the `ResolvedSymId` a local `Sym` names, ignoring any
    /// function-overload disambiguation (that's `apply_func_overload`'s job,
    /// applied once by `resolve_sym` after this returns).
    ///
    /// A sym whose `parent` is this chunk's own root is a top-level
    /// reference: it goes through any `SymRef` redirect installed by an
    /// import, then this chunk's own module root, then the builtin-type
    /// fallback. Any other parent is itself a sym
    /// (e.g. the left side of an access-expression or an object type), so
    /// the parent is resolved first and `name` is looked up scoped to it,
    /// enforcing export-visibility when crossing out of the current module.
    fn resolve_sym_owner(&mut self, chunk_id: ChunkId, sym: SymId, span: Span) -> SemaResult<ResolvedSymId> {
        let (parent, name) = {
            let s = self.compilation.chunk(chunk_id).syms.get(sym);
            (s.parent, s.name)
        };
        let chunk_root = self.compilation.chunk(chunk_id).root_sym;

        if !parent.is_none() && parent != chunk_root {
            let parent_resolved = self.resolve_sym(chunk_id, parent, span)?;
            let module_root = self.module_resolved_root(chunk_id);
            return match self.compilation.resolved_syms.lookup(parent_resolved, name) {
                Some(found) => {
                    let exported = self.compilation.resolved_syms.get(found).exported;
                    if parent_resolved != module_root && !exported {
                        Err(self.missing_symbol_err(name, span, true))
                    } else {
                        Ok(found)
                    }
                }
                None => match self.compilation.resolved_syms.get(parent_resolved).variant {
                    ResolvedSymVariant::Module { module_id } => self.resolve_module_entry(module_id, name, span),
                    _ => Err(self.missing_symbol_err(name, span, false)),
                },
            };
        }

        if let Some(symref) = self.compilation.chunk(chunk_id).sym_refs.get(name) {
            return match symref {
                SymRef::Module(mod_id) => Ok(self.compilation.modules.get(mod_id).resolved_root_sym_id),
                SymRef::ModuleMember(mod_id) => {
                    let module_root = self.compilation.modules.get(mod_id).resolved_root_sym_id;
                    match self.compilation.resolved_syms.lookup(module_root, name) {
                        Some(found) if self.compilation.resolved_syms.get(found).exported => Ok(found),
                        Some(_) => Err(self.missing_symbol_err(name, span, true)),
                        None => self.resolve_module_entry(mod_id, name, span),
                    }
                }
                SymRef::Sym(other) => self.resolve_sym_owner(chunk_id, other, span),
            };
        }

        let root = self.module_resolved_root(chunk_id);
        if let Some(resolved) = self.compilation.resolved_syms.lookup(root, name) {
            return Ok(resolved);
        }
        if let Some(&builtin) = self.compilation.builtin_types.get(&name) {
            return Ok(builtin);
        }
        let wildcard_imports = self.compilation.chunk(chunk_id).wildcard_imports.clone();
        for mod_id in wildcard_imports {
            let module_root = self.compilation.modules.get(mod_id).resolved_root_sym_id;
            match self.compilation.resolved_syms.lookup(module_root, name) {
                Some(found) if self.compilation.resolved_syms.get(found).exported => return Ok(found),
                Some(_) => return Err(self.missing_symbol_err(name, span, true)),
                None => {
                    if let Ok(found) = self.resolve_module_entry(mod_id, name, span) {
                        return Ok(found);
                    }
                }
            }
        }

        Err(self.missing_symbol_err(name, span, false))
    }

    /// Resolves a chunk-local func sig into its process-wide counterpart,
    /// memoized on the local `FuncSigId`. Every element sym here is already
    /// resolved by construction (params/return syms are `set_resolved`
    /// directly in `func_body`/`untyped_local_func_sig`), so this never
    /// recurses through `resolve_sym_owner`'s general path.
    fn resolve_local_func_sig(&mut self, chunk_id: ChunkId, func_sig: FuncSigId, span: Span) -> SemaResult<ResolvedFuncSigId> {
        let existing = self.compilation.chunk(chunk_id).func_sigs.resolved_of(func_sig);
        if !existing.is_none() {
            return Ok(existing);
        }
        let elements = self.compilation.chunk(chunk_id).func_sigs.get(func_sig).0.clone();
        let mut resolved_elements = Vec::with_capacity(elements.len());
        for elem_sym in elements {
            resolved_elements.push(self.resolve_sym(chunk_id, elem_sym, span)?);
        }
        let any_sym = self.compilation.any_sym;
        let resolved = self.compilation.resolved_func_sigs.intern(resolved_elements, any_sym);
        self.compilation.chunk_mut(chunk_id).func_sigs.set_resolved(func_sig, resolved);
        Ok(resolved)
    }

    /// Applies overload matcher once a sym's owner is known:
    /// a non-func reference to an overloaded func sym is ambiguous; a func
    /// reference (non-`NONE` `func_sig`) must land on an exact
    /// `(owner, resolvedFuncSig)` entry.
    fn apply_func_overload(
        &mut self,
        chunk_id: ChunkId,
        owner: ResolvedSymId,
        func_sig: FuncSigId,
        sym: SymId,
        span: Span,
    ) -> SemaResult<ResolvedSymId> {
        let ResolvedSymVariant::Func { binding } = self.compilation.resolved_syms.get(owner).variant else {
            return Ok(owner);
        };
        let name = self.compilation.chunk(chunk_id).syms.get(sym).name;
        if func_sig.is_none() {
            return if matches!(binding, FuncBinding::Overloaded) {
                Err(SemaError::new(
                    SemaErrorKind::AmbiguousSym {
                        name: Cow::Owned(self.compilation.interner.get_str(name).to_string()),
                    },
                    span,
                ))
            } else {
                Ok(owner)
            };
        }
        let r_sig = self.resolve_local_func_sig(chunk_id, func_sig, span)?;
        match self.compilation.resolved_func_syms.lookup(owner, r_sig) {
            Some(_) => Ok(owner),
            None => Err(SemaError::new(
                SemaErrorKind::MissingSymbol {
                    name: Cow::Owned(self.compilation.interner.get_str(name).to_string()),
                },
                span,
            )),
        }
    }

    fn missing_symbol_err(&mut self, name: NameId, span: Span, not_exported: bool) -> SemaError {
        let text = Cow::Owned(self.compilation.interner.get_str(name).to_string());
        if not_exported {
            SemaError::new(SemaErrorKind::NotExported { name: text }, span)
        } else {
            SemaError::new(SemaErrorKind::MissingSymbol { name: text }, span)
        }
    }
}
