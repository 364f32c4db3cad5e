//! `<`/`<=`/... comparisons record whether both operands are integers (or
//! untyped literals that could be), so the code generator can request an
//! integer-specialized comparison opcode.

mod common;

use chunksema::ast::{CmpOperator, Expr, Literal, NumericLiteral};
use common::Harness;

#[test]
fn comparing_two_integer_literals_sets_can_request_integer_operands() {
    let mut h = Harness::new();
    let chunk = h.begin_chunk("entry.cys", None);

    let one = h.int_lit(chunk, 1.0);
    let two = h.int_lit(chunk, 2.0);
    let cmp = h.expr(
        chunk,
        Expr::Compare {
            op: CmpOperator::Lt,
            lhs: Box::new(one),
            rhs: Box::new(two),
            can_request_integer_operands: false,
        },
    );
    let stmt = h.stmt(chunk, chunksema::ast::Stmt::ExprStmt(cmp));

    let mut stmts = vec![stmt];
    h.analyze_chunk(chunk, &mut stmts).expect("comparing two int literals analyzes cleanly");

    let chunksema::ast::Stmt::ExprStmt(expr_loc) = &stmts[0].stmt else {
        panic!("expected an ExprStmt");
    };
    let Expr::Compare { can_request_integer_operands, .. } = &expr_loc.expr else {
        panic!("expected a Compare expression");
    };
    assert!(*can_request_integer_operands);
}

#[test]
fn comparing_a_float_literal_clears_can_request_integer_operands() {
    let mut h = Harness::new();
    let chunk = h.begin_chunk("entry.cys", None);

    let one = h.int_lit(chunk, 1.0);
    let half = h.expr(
        chunk,
        Expr::Literal(Literal::Number(NumericLiteral::Decimal { value: 0.5, is_integer_valued: false })),
    );
    let cmp = h.expr(
        chunk,
        Expr::Compare {
            op: CmpOperator::Lt,
            lhs: Box::new(one),
            rhs: Box::new(half),
            can_request_integer_operands: true,
        },
    );
    let stmt = h.stmt(chunk, chunksema::ast::Stmt::ExprStmt(cmp));

    let mut stmts = vec![stmt];
    h.analyze_chunk(chunk, &mut stmts).expect("comparing an int and a float analyzes cleanly");

    let chunksema::ast::Stmt::ExprStmt(expr_loc) = &stmts[0].stmt else {
        panic!("expected an ExprStmt");
    };
    let Expr::Compare { can_request_integer_operands, .. } = &expr_loc.expr else {
        panic!("expected a Compare expression");
    };
    assert!(!*can_request_integer_operands);
}
