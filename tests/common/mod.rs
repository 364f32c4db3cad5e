//! Shared scaffolding for the integration tests in this directory.
//!
//! The analyzer never parses source text itself (whole premise is
//! that a parser hands it a tree); these tests stand in for that parser,
//! building just enough of an AST by hand to drive [`SemaDriver`] the way a
//! real front end would.

#![allow(dead_code)]

use std::collections::HashSet;
use std::path::PathBuf;

use chunksema::ast::*;
use chunksema::chunk::Compilation;
use chunksema::diagnostics::SemaResult;
use chunksema::driver::SemaDriver;
use chunksema::ids::{ChunkId, FuncSigId, ModuleId, NameId, NoneSentinel, NodeId};
use chunksema::limits::AnalysisLimits;
use chunksema::module::ImportTask;
use chunksema::span::Span;
use chunksema::tracer::RecordingTracer;
use chunksema::vm_iface::NullVmCollaborator;

/// Monotonic node-id source, standing in for the parser's own allocator.
#[derive(Default)]
pub struct NodeIds(u32);

impl NodeIds {
    pub fn next(&mut self) -> NodeId {
        let id = NodeId::new(self.0 as usize);
        self.0 += 1;
        id
    }
}

pub struct Harness {
    pub compilation: Compilation,
    pub tracer: RecordingTracer,
    pub vm: NullVmCollaborator,
    pub ids: NodeIds,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_builtins(HashSet::new())
    }

    pub fn with_builtins(builtin_loaders: HashSet<String>) -> Self {
        Self {
            compilation: Compilation::new(AnalysisLimits::unlimited(), builtin_loaders),
            tracer: RecordingTracer::new(),
            vm: NullVmCollaborator::new(),
            ids: NodeIds::default(),
        }
    }

    fn driver(&mut self) -> SemaDriver<'_, RecordingTracer, NullVmCollaborator> {
        SemaDriver::new(&mut self.compilation, &mut self.tracer, &mut self.vm)
    }

    /// Allocates a chunk at `uri` (an entry module, unless `module_id` pins
    /// it to an already-reserved one) without analyzing it yet.
    pub fn begin_chunk(&mut self, uri: &str, module_id: Option<ModuleId>) -> ChunkId {
        self.driver().begin_chunk(PathBuf::from(uri), module_id)
    }

    pub fn analyze_chunk(&mut self, chunk_id: ChunkId, stmts: &mut [StmtLoc]) -> SemaResult<()> {
        let span = Span::synthetic(chunk_id);
        self.driver().analyze_chunk(chunk_id, span, stmts)
    }

    /// Convenience for the common case: begin a fresh entry chunk and
    /// analyze it in one call.
    pub fn analyze(&mut self, uri: &str, stmts: &mut [StmtLoc]) -> (ChunkId, SemaResult<()>) {
        let chunk_id = self.begin_chunk(uri, None);
        let result = self.analyze_chunk(chunk_id, stmts);
        (chunk_id, result)
    }

    pub fn take_pending_import(&mut self) -> Option<ImportTask> {
        self.driver().take_pending_import()
    }

    pub fn intern(&mut self, name: &str) -> NameId {
        self.compilation.interner.intern(name)
    }

    pub fn ident(&mut self, chunk: ChunkId, name: &str) -> Ident {
        let id = self.ids.next();
        let name_id = self.intern(name);
        Ident::new(id, Span::synthetic(chunk), name_id)
    }

    pub fn expr(&mut self, chunk: ChunkId, expr: Expr) -> ExprLoc {
        ExprLoc {
            id: self.ids.next(),
            span: Span::synthetic(chunk),
            expr,
        }
    }

    pub fn stmt(&mut self, chunk: ChunkId, stmt: Stmt) -> StmtLoc {
        StmtLoc {
            id: self.ids.next(),
            span: Span::synthetic(chunk),
            stmt,
        }
    }

    pub fn ident_expr(&mut self, chunk: ChunkId, name: &str) -> ExprLoc {
        let ident = self.ident(chunk, name);
        self.expr(chunk, Expr::Ident(ident))
    }

    pub fn bool_lit(&mut self, chunk: ChunkId, value: bool) -> ExprLoc {
        self.expr(chunk, Expr::Literal(Literal::Boolean(value)))
    }

    pub fn int_lit(&mut self, chunk: ChunkId, value: f64) -> ExprLoc {
        self.expr(
            chunk,
            Expr::Literal(Literal::Number(NumericLiteral::Decimal {
                value,
                is_integer_valued: true,
            })),
        )
    }

    pub fn assign(&mut self, chunk: ChunkId, name: &str, rhs: ExprLoc) -> StmtLoc {
        let ident = self.ident(chunk, name);
        self.stmt(chunk, Stmt::Assign { target: AssignTarget::Ident(ident), rhs })
    }

    pub fn param(&mut self, chunk: ChunkId, name: &str) -> Param {
        Param { name: self.ident(chunk, name), declared_type: None }
    }

    /// A `func name(params...): body` declaration, private to its own chunk
    /// unless wrapped with [`Harness::exported`] (see `Stmt::Export` and
    /// `SemaDriver::prescan_stmt`).
    pub fn func_decl(&mut self, chunk: ChunkId, name: &str, params: &[&str], body: Vec<StmtLoc>) -> StmtLoc {
        let span = Span::synthetic(chunk);
        let def_id = self.ids.next();
        let name_ident = self.ident(chunk, name);
        let params = params.iter().map(|p| self.param(chunk, p)).collect();
        let def = FuncDef {
            id: def_id,
            span,
            name: name_ident,
            params,
            declared_return_type: None,
            body,
            sema_block_id: None,
            sema_func_sig_id: FuncSigId::NONE,
        };
        StmtLoc { id: self.ids.next(), span, stmt: Stmt::FuncDecl(def) }
    }

    /// Wraps a declaration statement in `export`, so it becomes visible to
    /// other chunks through a module's resolved root (see
    /// `SemaDriver::prescan_stmt`'s `Stmt::Export` arm).
    pub fn exported(&mut self, chunk: ChunkId, decl: StmtLoc) -> StmtLoc {
        self.stmt(chunk, Stmt::Export(Box::new(decl)))
    }

    pub fn call(&mut self, chunk: ChunkId, callee: ExprLoc, args: Vec<ExprLoc>) -> ExprLoc {
        self.expr(
            chunk,
            Expr::Call {
                callee: Box::new(callee),
                args: args.into(),
                has_named_args: false,
            },
        )
    }

    pub fn access(&mut self, chunk: ChunkId, left: ExprLoc, name: &str) -> ExprLoc {
        let name_ident = self.ident(chunk, name);
        self.expr(
            chunk,
            Expr::Access {
                left: Box::new(left),
                name: name_ident,
                resolution: NameResolution::Unresolved,
            },
        )
    }

    pub fn import_stmt(&mut self, chunk: ChunkId, binding: &str, spec: &str) -> StmtLoc {
        let binding_name = self.ident(chunk, binding);
        self.stmt(
            chunk,
            Stmt::Import(ImportStmt {
                binding_name,
                spec: spec.to_string(),
                import_all: false,
            }),
        )
    }
}
