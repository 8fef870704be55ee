// checker/stmt.rs
//
// Statement traversal. Conditionals and loops own the flow-sensitive
// bookkeeping: a refinement frame around the if/true branch, and an
// assignment tracker around the whole construct whose join is written back
// on exit.

use quill_ast::{Expr, Stmt, StmtKind, VarId};
use quill_types::{
    check_compatible_assignment_types, implements_interface_or_is_subclass_of,
    parameterize_supertype, ClassId, TypeDesc, TypeId,
};

use super::TypeChecker;
use crate::errors::SemanticError;

impl<'a> TypeChecker<'a> {
    pub(crate) fn visit_stmt(&mut self, stmt: &'a Stmt) {
        match &stmt.kind {
            StmtKind::Block(stmts) => {
                for s in stmts {
                    self.visit_stmt(s);
                }
            }
            StmtKind::Expr(expr) => self.visit_expr(expr),
            StmtKind::If {
                condition,
                then_block,
                else_block,
            } => {
                let old_tracker = self.push_assignment_tracking();
                // The refinement frame covers the condition and the then
                // branch only; the else branch sees no instanceof facts.
                self.push_temporary_type_info();
                self.visit_expr(condition);
                self.visit_stmt(then_block);
                self.pop_temporary_type_info();
                if let Some(else_block) = else_block {
                    self.visit_stmt(else_block);
                }
                self.pop_assignment_tracking(old_tracker);
            }
            StmtKind::While { condition, body } => {
                let old_tracker = self.push_assignment_tracking();
                self.visit_expr(condition);
                self.visit_stmt(body);
                self.pop_assignment_tracking(old_tracker);
            }
            StmtKind::ForEach {
                variable,
                collection,
                body,
            } => self.visit_for_each(stmt, *variable, collection, body),
            StmtKind::Return(value) => {
                if let Some(expr) = value {
                    self.visit_expr(expr);
                    let _ = self.check_return_type(expr);
                    if self.closure_expression.is_some() && !expr.is_null_constant() {
                        let ty = self.get_type(expr);
                        self.closure_return_types.push(ty);
                    }
                }
            }
            StmtKind::Empty => {}
        }
    }

    fn visit_for_each(
        &mut self,
        stmt: &'a Stmt,
        variable: VarId,
        collection: &'a Expr,
        body: &'a Stmt,
    ) {
        let old_tracker = self.push_assignment_tracking();
        self.visit_expr(collection);
        let collection_type = self.get_type(collection);
        let component = self.for_each_component_type(collection_type);
        self.for_loop_variable_types.insert(variable, component);

        let declared = self.vars.get(variable).declared_type;
        if !check_compatible_assignment_types(self.arena, declared, component, false) {
            self.add_static_type_error(
                SemanticError::LoopElementIncompatible {
                    element: self.type_display(declared),
                    collection: self.type_display(collection_type),
                    span: stmt.span.into(),
                },
                stmt.span,
            );
        }

        self.visit_stmt(body);
        self.for_loop_variable_types.remove(&variable);
        self.pop_assignment_tracking(old_tracker);
    }

    /// Element type of a for-each collection: array component, the
    /// Iterable parameterization, Character for strings, Object otherwise.
    fn for_each_component_type(&mut self, collection_type: TypeId) -> TypeId {
        if let Some(component) = self.arena.component_type(collection_type) {
            return component;
        }
        if implements_interface_or_is_subclass_of(self.arena, collection_type, TypeId::ITERABLE) {
            if let Some(view) =
                parameterize_supertype(self.arena, collection_type, ClassId::ITERABLE)
            {
                let element = self.arena.generics_of(view).first().cloned();
                if let Some(element) = element
                    && !element.placeholder
                    && !matches!(self.arena.desc(element.ty), TypeDesc::Placeholder { .. })
                {
                    return element.ty;
                }
            }
            return TypeId::OBJECT;
        }
        if collection_type == TypeId::STRING {
            return TypeId::CHARACTER;
        }
        TypeId::OBJECT
    }
}
