// checker/closures.rs
//
// The closure analyzer: shared-variable collection, metadata snapshotting
// around the closure visit, return-type inference, and the deferred second
// pass that validates calls through closure-shared variables against the LUB
// of everything ever assigned to them.

use quill_ast::{ClosureExpr, Expr, ExprKind, NodeId, NodeMetadata, Stmt, StmtKind, VarId};
use quill_types::{
    lowest_upper_bound, method_parameters_string, type_display, wrap_type, ClassId, GenericsArg,
    TypeId,
};

use super::{SecondPassCall, TypeChecker};
use crate::errors::SemanticError;
use crate::return_adder;

impl<'a> TypeChecker<'a> {
    /// Visit a closure literal.
    ///
    /// Shared variables have their metadata snapshotted before the body is
    /// walked and restored afterwards, so inferences made inside the closure
    /// scope do not leak into the enclosing method. Every type assigned to a
    /// shared variable is still recorded for the second pass.
    pub(crate) fn visit_closure(&mut self, expr: &'a Expr, closure: &'a ClosureExpr) {
        let shared = self.collect_closure_shared_vars(&closure.body);
        let snapshots: Vec<(NodeId, NodeMetadata)> = shared
            .iter()
            .map(|&var| {
                let node = self.vars.get(var).decl_node;
                (node, self.meta.snapshot(node))
            })
            .collect();

        let old_closure = self.closure_expression.replace(expr.id);
        let old_returns = std::mem::take(&mut self.closure_return_types);

        self.visit_stmt(&closure.body);

        // Synthesized trailing returns, delivered through the return-adder
        // contract. The enclosing method is cleared so closure returns are
        // not checked against its declared return type.
        let mut tails: Vec<&'a Expr> = Vec::new();
        return_adder::visit_method_body(&closure.body, &mut |e| tails.push(e));
        for tail in tails {
            if tail.is_null_constant() {
                continue;
            }
            let saved_method = self.method_node.take();
            let _ = self.check_return_type(tail);
            let ty = self.get_type(tail);
            self.closure_return_types.push(ty);
            self.method_node = saved_method;
        }

        let return_types = std::mem::replace(&mut self.closure_return_types, old_returns);
        let inferred_return = if return_types.is_empty() {
            TypeId::OBJECT
        } else {
            lowest_upper_bound(self.arena, &return_types)
        };
        self.meta.put_inferred_return_type(expr.id, inferred_return);
        self.closure_expression = old_closure;

        let closure_type = self.arena.parameterized(
            ClassId::CLOSURE,
            [GenericsArg::of(wrap_type(inferred_return))],
        );
        self.store_type(expr.id, closure_type);

        for (node, snapshot) in snapshots {
            self.meta.restore(node, snapshot);
        }
    }

    /// Free closure-shared variables referenced anywhere inside a closure
    /// body, nested closures included.
    pub(crate) fn collect_closure_shared_vars(&self, body: &Stmt) -> Vec<VarId> {
        let mut out = Vec::new();
        collect_stmt(self, body, &mut out);
        out
    }

    /// Deferred validation of calls whose receiver is a closure-shared
    /// variable. Runs strictly after the class visit, in insertion order.
    /// For each such call, when the variable was assigned two or more
    /// distinct types, the resolved target must still exist (uniquely) on
    /// the LUB of all assigned types.
    pub fn perform_second_pass(&mut self) {
        let deferred: Vec<SecondPassCall> = self.second_pass.values().cloned().collect();
        for entry in deferred {
            let Some(types) = self.closure_shared_assignments.get(&entry.receiver) else {
                continue;
            };
            if types.len() < 2 {
                continue;
            }
            let types = types.clone();
            let joined = lowest_upper_bound(self.arena, &types);
            let Some(target) = self.meta.direct_method_call_target(entry.call_node) else {
                continue;
            };
            let target_def = self.arena.method(target).clone();
            let params: Vec<TypeId> = target_def.params.iter().map(|p| p.ty).collect();
            let found = self.find_method(joined, &target_def.name, &params);
            if found.len() != 1 {
                self.add_static_type_error(
                    SemanticError::ClosureSharedVariableOnLub {
                        variable: self.vars.get(entry.receiver).name.clone(),
                        signature: method_parameters_string(self.arena, &target_def.name, &params),
                        lub: type_display(self.arena, joined),
                        span: entry.span.into(),
                    },
                    entry.span,
                );
            }
        }
    }
}

fn collect_stmt(checker: &TypeChecker<'_>, stmt: &Stmt, out: &mut Vec<VarId>) {
    match &stmt.kind {
        StmtKind::Block(stmts) => {
            for s in stmts {
                collect_stmt(checker, s, out);
            }
        }
        StmtKind::Expr(e) => collect_expr(checker, e, out),
        StmtKind::If {
            condition,
            then_block,
            else_block,
        } => {
            collect_expr(checker, condition, out);
            collect_stmt(checker, then_block, out);
            if let Some(else_block) = else_block {
                collect_stmt(checker, else_block, out);
            }
        }
        StmtKind::While { condition, body } => {
            collect_expr(checker, condition, out);
            collect_stmt(checker, body, out);
        }
        StmtKind::ForEach {
            collection, body, ..
        } => {
            collect_expr(checker, collection, out);
            collect_stmt(checker, body, out);
        }
        StmtKind::Return(value) => {
            if let Some(e) = value {
                collect_expr(checker, e, out);
            }
        }
        StmtKind::Empty => {}
    }
}

fn collect_expr(checker: &TypeChecker<'_>, expr: &Expr, out: &mut Vec<VarId>) {
    match &expr.kind {
        ExprKind::Variable(vref) => {
            if let quill_ast::Binding::Var(var) = vref.binding
                && checker.vars.get(var).closure_shared
                && !out.contains(&var)
            {
                out.push(var);
            }
        }
        ExprKind::Property(p) => collect_expr(checker, &p.object, out),
        ExprKind::Binary(b) => {
            collect_expr(checker, &b.left, out);
            collect_expr(checker, &b.right, out);
        }
        ExprKind::Ternary(t) => {
            collect_expr(checker, &t.condition, out);
            collect_expr(checker, &t.if_true, out);
            collect_expr(checker, &t.if_false, out);
        }
        ExprKind::Unary { operand, .. } => collect_expr(checker, operand, out),
        ExprKind::MethodCall(c) => {
            collect_expr(checker, &c.object, out);
            for a in &c.args {
                collect_expr(checker, a, out);
            }
        }
        ExprKind::ConstructorCall(c) => {
            for a in &c.args {
                collect_expr(checker, a, out);
            }
        }
        ExprKind::Closure(c) => collect_stmt(checker, &c.body, out),
        ExprKind::Cast(c) => collect_expr(checker, &c.expr, out),
        ExprKind::ListLiteral(elements) | ExprKind::Tuple(elements) => {
            for e in elements {
                collect_expr(checker, e, out);
            }
        }
        ExprKind::MapLiteral(entries) => {
            for entry in entries {
                collect_expr(checker, &entry.key, out);
                collect_expr(checker, &entry.value, out);
            }
        }
        ExprKind::Range(r) => {
            collect_expr(checker, &r.from, out);
            collect_expr(checker, &r.to, out);
        }
        ExprKind::Const(_) | ExprKind::ClassLiteral(_) | ExprKind::Empty => {}
    }
}
