// return_adder.rs
//! Callback contract of the return-adder collaborator.
//!
//! The real return adder lives with the bytecode generator and rewrites
//! method bodies so every exit path ends in an explicit return. The checker
//! only needs its listener contract: one callback per *synthesized* return
//! expression, i.e. per tail position that is not already an explicit return
//! statement. Explicit returns flow through the normal statement visit and
//! are not reported here. Tail positions with no value (loops, empty blocks)
//! become `return null` in the rewrite, which every listener ignores, so they
//! produce no callback at all.

use quill_ast::{Expr, Stmt, StmtKind};

/// Walk a method or closure body and invoke `listener` for each tail
/// expression a synthesized return would wrap.
pub fn visit_method_body<'a>(body: &'a Stmt, listener: &mut dyn FnMut(&'a Expr)) {
    visit_tail(body, listener);
}

fn visit_tail<'a>(stmt: &'a Stmt, listener: &mut dyn FnMut(&'a Expr)) {
    match &stmt.kind {
        StmtKind::Expr(expr) => listener(expr),
        StmtKind::Block(stmts) => {
            if let Some(last) = stmts.last() {
                visit_tail(last, listener);
            }
        }
        StmtKind::If {
            then_block,
            else_block,
            ..
        } => {
            visit_tail(then_block, listener);
            if let Some(else_block) = else_block {
                visit_tail(else_block, listener);
            }
        }
        // Already explicit; the adder leaves it alone.
        StmtKind::Return(_) => {}
        // No value in tail position: the rewrite inserts `return null`.
        StmtKind::While { .. } | StmtKind::ForEach { .. } | StmtKind::Empty => {}
    }
}
