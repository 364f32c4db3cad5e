//! Per-chunk analysis state, and the process-wide [`Compilation`] that owns
//! every chunk plus the tables shared across all of them.
//!
//! One struct bundles everything scoped to a single translation unit, held
//! inside a second struct owning the tables that outlive any one of them.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::block::{BlockStack, LocalVarTable};
use crate::deps::InitializerSymDeps;
use crate::ids::{ChunkId, ModuleId, NameId, NoneSentinel, ResolvedSymId, SymId};
use crate::intern::NameInterner;
use crate::limits::{AnalysisLimits, LimitTracker};
use crate::module::{ModuleRegistry, SymRefTable};
use crate::resolved::{ResolvedFuncSigTable, ResolvedFuncSymTable, ResolvedSymTable};
use crate::sym::{FuncSigTable, SymTable};
use crate::types::Type;

/// Maps a builtin type name to the coarse [`Type`] a declared-return-type
/// annotation of that name implies.
/// Not meaningful for `self`, which is never a return-type annotation.
fn type_for_well_known(name: crate::intern::WellKnownName) -> Type {
    use crate::intern::WellKnownName as W;
    match name {
        W::SelfParam | W::Any => Type::any(),
        W::Boolean => Type::boolean(),
        W::Number => Type::number(),
        W::Int => Type::int(),
        W::List => Type::list(),
        W::Map => Type::map(),
        W::Fiber => Type::fiber(),
        W::String => Type::string(),
        W::StaticString => Type::static_string(),
        W::Box => Type::boxed(),
        W::Tag => Type::boxed(),
        W::TagLiteral => Type::tag_literal(),
        W::Undefined => Type::undefined(),
    }
}

/// Everything scoped to one parsed source file.
pub struct Chunk {
    pub id: ChunkId,
    /// Filesystem path or URL this chunk was loaded from; used to resolve
    /// relative imports it issues.
    pub uri: PathBuf,
    pub syms: SymTable,
    pub func_sigs: FuncSigTable,
    pub blocks: BlockStack,
    pub locals: LocalVarTable,
    pub sym_refs: SymRefTable,
    /// Modules brought in with `import *`: since the target
    /// module's final member set isn't known until it finishes analysis
    /// (possibly after this chunk's own traversal has already referenced
    /// one of its names), this chunk records *which modules* to consult
    /// rather than eagerly copying each member name into `sym_refs`.
    pub wildcard_imports: Vec<ModuleId>,
    /// This chunk's own top-level `Sym`, parent of every top-level name reference.
    pub root_sym: SymId,
    /// This chunk's module entry in the process-wide registry, once created.
    pub module_id: ModuleId,
    /// The resolved sym currently being initialized, if statement traversal
    /// is inside a static var/func initializer expression; `NONE` otherwise.
    /// Threaded through expression traversal so a local-var reference inside
    /// an initializer can be rejected with `CanNotUseLocal`.
    pub cur_sema_sym_var: ResolvedSymId,
    /// Every resolved sym read while `cur_sema_sym_var` is set, in read
    /// order, for `InitializerSymDeps::record` once the initializer
    /// expression finishes analysis.
    pub cur_sema_deps: Vec<ResolvedSymId>,
}

impl Chunk {
    #[must_use]
    pub fn new(id: ChunkId, uri: PathBuf) -> Self {
        let mut syms = SymTable::new();
        let root_sym = syms.create(SymId::NONE, NameId::NONE, crate::ids::FuncSigId::NONE);
        Self {
            id,
            uri,
            syms,
            func_sigs: FuncSigTable::new(),
            blocks: BlockStack::new(),
            locals: LocalVarTable::new(),
            sym_refs: SymRefTable::new(),
            wildcard_imports: Vec::new(),
            root_sym,
            module_id: ModuleId::NONE,
            cur_sema_sym_var: ResolvedSymId::NONE,
            cur_sema_deps: Vec::new(),
        }
    }

    #[must_use]
    pub fn in_static_initializer(&self) -> bool {
        !self.cur_sema_sym_var.is_none()
    }
}

/// Owns every process-wide table plus the chunk arena. One `Compilation`
/// corresponds to one run of the analyzer over one entry chunk and whatever
/// it transitively imports: arena-style teardown per run, not
/// process-static.
pub struct Compilation {
    pub interner: NameInterner,
    pub resolved_syms: ResolvedSymTable,
    pub resolved_func_syms: ResolvedFuncSymTable,
    pub resolved_func_sigs: ResolvedFuncSigTable,
    pub modules: ModuleRegistry,
    pub deps: InitializerSymDeps,
    pub limits: AnalysisLimits,
    pub limit_tracker: LimitTracker,
    pub builtin_loaders: HashSet<String>,
    chunks: Vec<Chunk>,
    /// `ResolvedSymId` of the builtin `any` type, used throughout sig interning.
    pub any_sym: ResolvedSymId,
    /// Every builtin type name's singleton resolved sym (step
    /// 2: "if the name is a builtin type name, bind to the singleton
    /// builtin-type resolved sym"), keyed by its interned name.
    pub builtin_types: ahash::AHashMap<NameId, ResolvedSymId>,
    /// The coarse [`Type`] each builtin-type resolved sym denotes when used
    /// as a declared return-type annotation. Object types
    /// (not present here) always mean `Type::boxed()`.
    pub builtin_type_values: ahash::AHashMap<ResolvedSymId, Type>,
    /// The [`crate::vm_iface::RuntimeSymId`] the prescan pass obtained for
    /// each top-level var/func decl and object member, keyed by the AST node
    /// that declared it, so the traversal pass can later call
    /// `VmCollaborator::set_var_sym`/`set_func_sym` once that decl's final
    /// type is known.
    pub runtime_syms: ahash::AHashMap<(ChunkId, crate::ids::NodeId), crate::vm_iface::RuntimeSymId>,
}

impl Compilation {
    #[must_use]
    pub fn new(limits: AnalysisLimits, builtin_loaders: HashSet<String>) -> Self {
        use strum::IntoEnumIterator;

        let mut resolved_syms = ResolvedSymTable::new();
        let interner = NameInterner::new();
        let mut builtin_types = ahash::AHashMap::new();
        let mut builtin_type_values = ahash::AHashMap::new();
        for well_known in crate::intern::WellKnownName::iter() {
            if matches!(well_known, crate::intern::WellKnownName::SelfParam) {
                continue;
            }
            let name = interner.well_known(well_known);
            let id = resolved_syms.insert(crate::resolved::ResolvedSym {
                parent: ResolvedSymId::NONE,
                name,
                variant: crate::resolved::ResolvedSymVariant::BuiltinType,
                exported: true,
            });
            builtin_types.insert(name, id);
            builtin_type_values.insert(id, type_for_well_known(well_known));
        }
        let any_name = interner.well_known(crate::intern::WellKnownName::Any);
        let any_sym = builtin_types[&any_name];
        Self {
            interner,
            resolved_syms,
            resolved_func_syms: ResolvedFuncSymTable::new(),
            resolved_func_sigs: ResolvedFuncSigTable::new(),
            modules: ModuleRegistry::new(),
            deps: InitializerSymDeps::new(),
            limits,
            limit_tracker: LimitTracker::new(),
            builtin_loaders,
            chunks: Vec::new(),
            any_sym,
            builtin_type_values,
            runtime_syms: ahash::AHashMap::new(),
        }
    }

    /// Allocates a new chunk and returns its id.
    pub fn add_chunk(&mut self, uri: PathBuf) -> ChunkId {
        let id = ChunkId::new(self.chunks.len());
        self.chunks.push(Chunk::new(id, uri));
        id
    }

    #[must_use]
    pub fn chunk(&self, id: ChunkId) -> &Chunk {
        &self.chunks[id.index()]
    }

    pub fn chunk_mut(&mut self, id: ChunkId) -> &mut Chunk {
        &mut self.chunks[id.index()]
    }

    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }
}
