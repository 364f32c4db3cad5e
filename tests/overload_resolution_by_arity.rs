//! Cross-module overload resolution by arity: a module `M`
//! exports two overloads of `foo`, and calling `M.foo(x)` vs. `M.foo(x, y)`
//! must resolve to the *same* resolved sym with two different resolved func
//! sigs.
//!
//! Module `M` is registered as a builtin loader so its spec string
//! (`"m"`) canonicalizes without touching the filesystem (`resolve_spec_temp`
//! checks `builtin_loaders` before ever considering a path), and `M`'s chunk
//! is analyzed before the importing chunk so the forward reference resolves
//! on first use — this crate resolves a sym the moment it's referenced
//! rather than deferring to a second pass.

mod common;

use std::collections::HashSet;

use chunksema::ast::{Expr, NameResolution, Stmt};
use chunksema::resolved::{FuncBinding, ResolvedSymVariant};
use common::Harness;

#[test]
fn same_owner_different_sig_per_arity() {
    let mut builtins = HashSet::new();
    builtins.insert("m".to_string());
    let mut h = Harness::with_builtins(builtins);

    // Reserve M's module id and analyze its chunk first.
    let importer_chunk = h.begin_chunk("importer.cys", None);
    let (mod_id, _) = h.compilation.modules.get_or_load("m".to_string(), true, importer_chunk, chunksema::ids::NodeId::new(0));

    let m_chunk = h.begin_chunk("m.cys", Some(mod_id));
    let foo_one = h.int_lit(m_chunk, 1.0);
    let foo_one_body = h.stmt(m_chunk, Stmt::Return(foo_one));
    let foo_one_decl = h.func_decl(m_chunk, "foo", &["a"], vec![foo_one_body]);
    let foo_one_decl = h.exported(m_chunk, foo_one_decl);

    let foo_two = h.int_lit(m_chunk, 2.0);
    let foo_two_body = h.stmt(m_chunk, Stmt::Return(foo_two));
    let foo_two_decl = h.func_decl(m_chunk, "foo", &["a", "b"], vec![foo_two_body]);
    let foo_two_decl = h.exported(m_chunk, foo_two_decl);

    let mut m_stmts = vec![foo_one_decl, foo_two_decl];
    h.analyze_chunk(m_chunk, &mut m_stmts).expect("module M analyzes cleanly");

    // Now analyze the importer, which calls both overloads through `M.foo`.
    let import = h.import_stmt(importer_chunk, "M", "m");

    let m_ref_one = h.ident_expr(importer_chunk, "M");
    let m_foo_one = h.access(importer_chunk, m_ref_one, "foo");
    let arg_x = h.int_lit(importer_chunk, 0.0);
    let call_one = h.call(importer_chunk, m_foo_one, vec![arg_x]);
    let call_one = h.stmt(importer_chunk, Stmt::ExprStmt(call_one));

    let m_ref_two = h.ident_expr(importer_chunk, "M");
    let m_foo_two = h.access(importer_chunk, m_ref_two, "foo");
    let arg_x2 = h.int_lit(importer_chunk, 0.0);
    let arg_y2 = h.int_lit(importer_chunk, 0.0);
    let call_two = h.call(importer_chunk, m_foo_two, vec![arg_x2, arg_y2]);
    let call_two = h.stmt(importer_chunk, Stmt::ExprStmt(call_two));

    let mut importer_stmts = vec![import, call_one, call_two];
    h.analyze_chunk(importer_chunk, &mut importer_stmts)
        .expect("calling both overloads through the module binding analyzes cleanly");

    let Stmt::ExprStmt(call_one_loc) = &importer_stmts[1].stmt else { panic!("expected ExprStmt") };
    let Expr::Call { callee: callee_one, .. } = &call_one_loc.expr else { panic!("expected Call") };
    let Expr::Access { resolution: res_one, .. } = &callee_one.expr else { panic!("expected Access") };
    let NameResolution::Sym(sym_one) = res_one else { panic!("expected a resolved sym") };

    let Stmt::ExprStmt(call_two_loc) = &importer_stmts[2].stmt else { panic!("expected ExprStmt") };
    let Expr::Call { callee: callee_two, .. } = &call_two_loc.expr else { panic!("expected Call") };
    let Expr::Access { resolution: res_two, .. } = &callee_two.expr else { panic!("expected Access") };
    let NameResolution::Sym(sym_two) = res_two else { panic!("expected a resolved sym") };

    let r_sym_one = h.compilation.chunk(importer_chunk).syms.get(*sym_one).r_sym_id;
    let r_sym_two = h.compilation.chunk(importer_chunk).syms.get(*sym_two).r_sym_id;
    assert_eq!(r_sym_one, r_sym_two, "both arities must share the same resolved sym (`foo`)");

    let ResolvedSymVariant::Func { binding } = h.compilation.resolved_syms.get(r_sym_one).variant else {
        panic!("`foo` must resolve to a func variant");
    };
    assert!(matches!(binding, FuncBinding::Overloaded), "two overloads must report Overloaded, not Single");
    assert_eq!(h.compilation.resolved_func_syms.overload_count(r_sym_one), 2);
}
