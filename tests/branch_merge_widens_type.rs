//! A variable reassigned to a different type inside one branch of an `if`
//! widens to `any` once the branch closes (sub-block merge
//! algebra), and picking up a second type makes it a reference-counting
//! candidate.

mod common;

use chunksema::ast::{AssignTarget, Expr, IfBranch, IfStmt, Literal, NameResolution, Stmt};
use chunksema::TypeTag;
use common::Harness;

#[test]
fn branch_reassignment_widens_to_any_and_becomes_rc_candidate() {
    let mut h = Harness::new();
    let chunk = h.begin_chunk("entry.cys", None);

    let one = h.int_lit(chunk, 1.0);
    let assign_x_int = h.assign(chunk, "x", one);

    let string_val = h.expr(chunk, Expr::Literal(Literal::StringLit));
    let assign_x_string = h.assign(chunk, "x", string_val);

    let cond = h.bool_lit(chunk, true);
    let if_stmt = h.stmt(
        chunk,
        Stmt::If(IfStmt {
            first: IfBranch { cond, body: vec![assign_x_string] },
            else_ifs: vec![],
            else_body: None,
        }),
    );

    let mut stmts = vec![assign_x_int, if_stmt];
    h.analyze_chunk(chunk, &mut stmts).expect("branch reassignment is not an error");

    let Stmt::Assign { target: AssignTarget::Ident(ident), .. } = &stmts[0].stmt else {
        panic!("expected the first statement to still be an Assign");
    };
    let NameResolution::Local(var) = ident.resolution else {
        panic!("`x` must resolve to a local, got {:?}", ident.resolution);
    };

    let local = h.compilation.chunk(chunk).locals.get(var);
    assert_eq!(local.vtype.tag, TypeTag::Any, "merging int and string must widen to any");
    assert!(local.lifetime_rc_candidate, "a var that held two distinct types is an rc candidate");
}

#[test]
fn unchanged_type_in_branch_does_not_widen() {
    let mut h = Harness::new();
    let chunk = h.begin_chunk("entry.cys", None);

    let one = h.int_lit(chunk, 1.0);
    let assign_x_int = h.assign(chunk, "x", one);

    let two = h.int_lit(chunk, 2.0);
    let assign_x_int_again = h.assign(chunk, "x", two);

    let cond = h.bool_lit(chunk, true);
    let if_stmt = h.stmt(
        chunk,
        Stmt::If(IfStmt {
            first: IfBranch { cond, body: vec![assign_x_int_again] },
            else_ifs: vec![],
            else_body: None,
        }),
    );

    let mut stmts = vec![assign_x_int, if_stmt];
    h.analyze_chunk(chunk, &mut stmts).expect("reassigning the same type is not an error");

    let Stmt::Assign { target: AssignTarget::Ident(ident), .. } = &stmts[0].stmt else {
        panic!("expected the first statement to still be an Assign");
    };
    let NameResolution::Local(var) = ident.resolution else {
        panic!("`x` must resolve to a local, got {:?}", ident.resolution);
    };

    let local = h.compilation.chunk(chunk).locals.get(var);
    assert_ne!(local.vtype.tag, TypeTag::Any, "reassigning with the same tag must not widen");
}
