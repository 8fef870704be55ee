// checker/binary.rs
//
// Binary operations: assignment orchestration, instanceof refinement and the
// operator result-type tables. The promotion rules are a fixed table for the
// primitive tower; everything the tables don't cover falls back to an
// operator method lookup on the left operand.

use quill_ast::{BinOp, BinaryExpr, Binding, Expr, ExprKind};
use quill_types::{
    group_operation_result_type, implements_interface_or_is_subclass_of, is_big_int_category,
    is_double, is_float, is_floating_category, is_int_category, is_long_category,
    is_number_category, is_number_type, unwrap_type, wrap_type, TypeId,
};

use super::TypeChecker;

impl<'a> TypeChecker<'a> {
    pub(crate) fn visit_binary(&mut self, expr: &'a Expr, bin: &'a BinaryExpr) {
        self.visit_expr(&bin.left);
        self.visit_expr(&bin.right);

        let left_type = self.get_type(&bin.left);
        let mut right_type = self.get_type(&bin.right);
        // A literal null on the right takes the left type; primitive lefts
        // keep the mismatch so the assignment check reports it.
        if bin.right.is_null_constant() && !self.arena.is_primitive(left_type) {
            right_type = left_type;
        }

        let result_type = self
            .get_result_type(left_type, bin.op, right_type, bin, expr)
            .unwrap_or(left_type);

        let is_empty_declaration =
            bin.is_declaration && matches!(bin.right.kind, ExprKind::Empty);
        if !is_empty_declaration {
            self.store_type(expr.id, result_type);
        }

        if !is_empty_declaration && bin.op.is_assignment() {
            if let ExprKind::ConstructorCall(ctor) = &bin.right.kind
                && ctor.diamond
            {
                self.infer_diamond_type(&bin.right, left_type);
            }

            self.type_check_assignment(expr, &bin.left, left_type, &bin.right, right_type);

            // Inside a conditional or loop, keep track of the assignment for
            // the join on exit.
            if let ExprKind::Variable(vref) = &bin.left.kind
                && let Binding::Var(var) = vref.binding
            {
                let seed = self.meta.inferred_type(self.vars.get(var).decl_node);
                if let Some(tracker) = self.assignment_tracker.as_mut() {
                    let types = tracker.entry(var).or_insert_with(|| match seed {
                        Some(existing) => vec![existing],
                        None => Vec::new(),
                    });
                    types.push(result_type);
                }
            }

            self.store_expr_type(&bin.left, result_type);

            // A closure on the right leaves its formal parameters on the
            // left so later calls through the variable can be checked.
            if let ExprKind::Variable(vref) = &bin.left.kind
                && let ExprKind::Closure(closure) = &bin.right.kind
            {
                self.meta
                    .put_closure_arguments(bin.left.id, closure.params.clone());
                if let Binding::Var(var) = vref.binding {
                    let decl_node = self.vars.get(var).decl_node;
                    self.meta
                        .put_closure_arguments(decl_node, closure.params.clone());
                }
            }
        } else if bin.op == BinOp::InstanceOf {
            self.push_instanceof_type_info(&bin.left, &bin.right);
        }
    }

    /// Record `left instanceof Right` in the innermost refinement frame.
    pub(crate) fn push_instanceof_type_info(&mut self, left: &Expr, right: &Expr) {
        let refined = match &right.kind {
            ExprKind::ClassLiteral(ty) => *ty,
            _ => self.get_type(right),
        };
        let key = self.temporary_key(left);
        if let Some(frame) = self.temporary_if_branch_type_info.last_mut() {
            frame.entry(key).or_default().push(refined);
        }
    }

    /// Result type of a binary operation, `None` when nothing applies (the
    /// caller falls back to the left type).
    fn get_result_type(
        &mut self,
        left: TypeId,
        op: BinOp,
        right: TypeId,
        bin: &BinaryExpr,
        expr: &Expr,
    ) -> Option<TypeId> {
        let left_redirect = self.arena.redirect(left);
        let right_redirect = self.arena.redirect(right);

        if op.is_assignment() {
            return Some(self.assignment_result_type(left, right, left_redirect, right_redirect, bin));
        }
        if op.is_bool_intrinsic() {
            return Some(TypeId::BOOLEAN);
        }
        if op == BinOp::Index {
            if left == TypeId::STRING {
                return Some(TypeId::STRING);
            }
            return Some(self.infer_component_type(left));
        }
        if op == BinOp::FindRegex {
            // Always succeeds; the result is a Matcher.
            return Some(TypeId::MATCHER);
        }

        // Fixed tables for the primitive tower.
        if is_number_type(self.arena, left_redirect) && is_number_type(self.arena, right_redirect) {
            if op.is_group_operation() {
                if is_int_category(left_redirect) && is_int_category(right_redirect) {
                    return Some(TypeId::INT);
                }
                if is_long_category(left_redirect) && is_long_category(right_redirect) {
                    return Some(TypeId::LONG);
                }
                if is_float(left_redirect) && is_float(right_redirect) {
                    return Some(TypeId::FLOAT);
                }
                if is_double(left_redirect) && is_double(right_redirect) {
                    return Some(TypeId::DOUBLE);
                }
            } else if op == BinOp::Power {
                return Some(TypeId::NUMBER);
            } else if op.is_bit_operation() {
                if is_int_category(left_redirect) && is_int_category(right_redirect) {
                    return Some(TypeId::INT);
                }
                if is_long_category(left_redirect) && is_long_category(right_redirect) {
                    return Some(TypeId::BOXED_LONG);
                }
                if is_big_int_category(left_redirect) && is_big_int_category(right_redirect) {
                    return Some(TypeId::BIG_INTEGER);
                }
            } else if op.is_compare_to_boolean() || op == BinOp::Equal {
                return Some(TypeId::BOOLEAN);
            }
        }

        if op.is_shift()
            && is_number_category(self.arena, left_redirect)
            && is_long_category(unwrap_type(right_redirect))
        {
            return Some(left_redirect);
        }

        // Division result depends on the operand categories: floating
        // operands produce a Double, big decimals stay exact, and plain
        // integral division produces a BigDecimal.
        if op == BinOp::Divide {
            if is_floating_category(left_redirect) || is_floating_category(right_redirect) {
                return Some(TypeId::BOXED_DOUBLE);
            }
            if left_redirect == TypeId::BIG_DECIMAL || right_redirect == TypeId::BIG_DECIMAL {
                return Some(TypeId::BIG_DECIMAL);
            }
            if is_number_category(self.arena, left_redirect)
                && is_number_category(self.arena, right_redirect)
            {
                return Some(TypeId::BIG_DECIMAL);
            }
        } else if op.is_group_operation()
            && is_number_category(self.arena, wrap_type(left_redirect))
            && is_number_category(self.arena, wrap_type(right_redirect))
        {
            return Some(group_operation_result_type(left_redirect, right_redirect));
        }

        // No table applies: resolve the operator method on the left operand.
        let name = op.method_name()?;
        let method = self.find_method_or_fail(expr.span, left_redirect, name, &[right_redirect])?;
        if op.is_compare_to_boolean() {
            return Some(TypeId::BOOLEAN);
        }
        if op == BinOp::CompareTo {
            return Some(TypeId::INT);
        }
        Some(self.method_return_type(method))
    }

    /// Inference of the left side's new type after an assignment. This is
    /// about inference only; compatibility checking is separate.
    fn assignment_result_type(
        &mut self,
        left: TypeId,
        right: TypeId,
        left_redirect: TypeId,
        right_redirect: TypeId,
        bin: &BinaryExpr,
    ) -> TypeId {
        if self.arena.is_array(left_redirect) && !self.arena.is_array(right_redirect) {
            return left_redirect;
        }
        let left_is_collection =
            implements_interface_or_is_subclass_of(self.arena, left_redirect, TypeId::COLLECTION);
        let right_is_collection =
            implements_interface_or_is_subclass_of(self.arena, right_redirect, TypeId::COLLECTION);
        if left_is_collection && right_is_collection {
            // An empty list literal carries no inference; prefer the left
            // type in that single case.
            if let ExprKind::ListLiteral(elements) = &bin.right.kind
                && elements.is_empty()
            {
                return left;
            }
            return right;
        }
        if right_is_collection
            && implements_interface_or_is_subclass_of(self.arena, right_redirect, left_redirect)
        {
            return right;
        }
        if let ExprKind::Variable(vref) = &bin.left.kind
            && let Binding::Var(var) = vref.binding
        {
            let initial = self.arena.redirect(self.vars.get(var).declared_type);
            // Anything can be assigned to these, so the declared type wins
            // for inference purposes.
            if initial == TypeId::STRING
                || initial == TypeId::CLASS
                || initial == TypeId::BOXED_BOOLEAN
                || self.arena.is_primitive(initial)
                || initial == TypeId::BIG_DECIMAL
                || initial == TypeId::BIG_INTEGER
            {
                return initial;
            }
        }
        right
    }
}
