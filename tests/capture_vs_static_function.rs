//! `capture x` pulls a name from the immediately enclosing block into the
//! current one. Inside a lambda this
//! creates a boxed, parent-linked local; inside a `static` function block
//! (every plain `func` declaration, ) it's a hard error — only a
//! lambda can close over an enclosing scope.

mod common;

use chunksema::ast::{Expr, LambdaBody, LambdaDef, Stmt};
use chunksema::SemaErrorKind;
use common::Harness;

#[test]
fn lambda_can_capture_an_enclosing_local() {
    let mut h = Harness::new();
    let chunk = h.begin_chunk("entry.cys", None);

    let one = h.int_lit(chunk, 1.0);
    let assign_x = h.assign(chunk, "x", one);

    let capture_x_name = h.ident(chunk, "x");
    let capture_x = h.stmt(chunk, Stmt::CaptureDecl { name: capture_x_name, rhs: None });

    let lambda_id = h.ids.next();
    let lambda = h.expr(
        chunk,
        Expr::Lambda(Box::new(LambdaDef {
            id: lambda_id,
            span: chunksema::span::Span::synthetic(chunk),
            params: vec![],
            body: LambdaBody::Block(vec![capture_x]),
            sema_block_id: None,
            sema_resolved_func_sig: None,
        })),
    );
    let lambda_stmt = h.stmt(chunk, Stmt::ExprStmt(lambda));

    let mut stmts = vec![assign_x, lambda_stmt];
    h.analyze_chunk(chunk, &mut stmts).expect("a lambda capturing an enclosing local must succeed");
}

#[test]
fn static_function_can_not_capture_an_enclosing_local() {
    let mut h = Harness::new();
    let chunk = h.begin_chunk("entry.cys", None);

    let one = h.int_lit(chunk, 1.0);
    let assign_x = h.assign(chunk, "x", one);

    let capture_x_name = h.ident(chunk, "x");
    let capture_x = h.stmt(chunk, Stmt::CaptureDecl { name: capture_x_name, rhs: None });

    let func_decl = h.func_decl(chunk, "f", &[], vec![capture_x]);

    let mut stmts = vec![assign_x, func_decl];
    let result = h.analyze_chunk(chunk, &mut stmts);

    let err = result.expect_err("a static function must not be able to capture an enclosing local");
    assert!(matches!(err.kind, SemaErrorKind::CaptureFromStaticFunction { .. }), "got {:?}", err.kind);
}
