//! A top-level static variable's initializer can not reference a plain local:
//! `cur_sema_sym_var` is set for the duration of the initializer expression,
//! and reading an already-bound local while it's set is rejected rather than
//! resolved.

mod common;

use chunksema::ast::Stmt;
use chunksema::SemaErrorKind;
use common::Harness;

#[test]
fn static_var_initializer_can_not_reference_a_local() {
    let mut h = Harness::new();
    let chunk = h.begin_chunk("entry.cys", None);

    let zero = h.int_lit(chunk, 0.0);
    let assign_a = h.assign(chunk, "a", zero);

    let a_ref = h.ident_expr(chunk, "a");
    let b_name = h.ident(chunk, "b");
    let var_decl = h.stmt(chunk, Stmt::VarDecl { name: b_name, rhs: a_ref });

    let result = h.analyze_chunk(chunk, &mut [assign_a, var_decl]);

    let err = result.expect_err("initializer referencing a local must be rejected");
    assert!(matches!(err.kind, SemaErrorKind::CanNotUseLocal { .. }), "got {:?}", err.kind);
}

#[test]
fn static_var_initializer_accepts_a_literal() {
    let mut h = Harness::new();
    let chunk = h.begin_chunk("entry.cys", None);

    let five = h.int_lit(chunk, 5.0);
    let b_name = h.ident(chunk, "b");
    let var_decl = h.stmt(chunk, Stmt::VarDecl { name: b_name, rhs: five });

    let result = h.analyze_chunk(chunk, &mut [var_decl]);
    result.expect("a literal initializer never touches cur_sema_sym_var's local check");
}
