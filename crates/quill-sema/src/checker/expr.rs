// checker/expr.rs
//
// Expression dispatch and the simple expression forms: variables, literals,
// ternaries, unaries and casts. Binary operations, calls, properties and
// closures live in their own modules.

use quill_ast::{Binding, ConstValue, Expr, ExprKind, UnaryOp, VarRef};
use quill_types::{
    is_assignable_to, is_big_dec_category, is_big_int_category, is_floating_category,
    is_number_category, lowest_upper_bound, lowest_upper_bound_pair, unwrap_type, wrap_type,
    GenericsArg, ClassId, TypeId,
};

use super::TypeChecker;
use crate::errors::SemanticError;

impl<'a> TypeChecker<'a> {
    pub(crate) fn visit_expr(&mut self, expr: &'a Expr) {
        match &expr.kind {
            ExprKind::Const(value) => {
                let ty = Self::const_type(value);
                self.store_type(expr.id, ty);
            }
            ExprKind::Variable(vref) => self.visit_variable(expr, vref),
            ExprKind::Property(prop) => self.visit_property(expr, prop),
            ExprKind::Binary(bin) => self.visit_binary(expr, bin),
            ExprKind::Ternary(ternary) => self.visit_ternary(expr, ternary),
            ExprKind::Unary { op, operand } => self.visit_unary(expr, *op, operand),
            ExprKind::MethodCall(call) => self.visit_method_call(expr, call),
            ExprKind::ConstructorCall(call) => self.visit_constructor_call(expr, call),
            ExprKind::Closure(closure) => self.visit_closure(expr, closure),
            ExprKind::Cast(cast) => self.visit_cast(expr, cast),
            ExprKind::ListLiteral(elements) => {
                for element in elements {
                    self.visit_expr(element);
                }
                let ty = self.infer_list_expression_type(elements);
                self.store_type(expr.id, ty);
            }
            ExprKind::MapLiteral(entries) => {
                for entry in entries {
                    self.visit_expr(&entry.key);
                    self.visit_expr(&entry.value);
                }
                let ty = self.infer_map_expression_type(entries);
                self.store_type(expr.id, ty);
            }
            ExprKind::Range(range) => {
                self.visit_expr(&range.from);
                self.visit_expr(&range.to);
                let from = self.get_type(&range.from);
                let to = self.get_type(&range.to);
                let element = wrap_type(lowest_upper_bound_pair(self.arena, from, to));
                let ty = self
                    .arena
                    .parameterized(ClassId::RANGE, [GenericsArg::of(element)]);
                self.store_type(expr.id, ty);
            }
            ExprKind::Tuple(elements) => {
                for element in elements {
                    self.visit_expr(element);
                }
                self.store_type(expr.id, TypeId::OBJECT);
            }
            ExprKind::ClassLiteral(ty) => {
                let ty = *ty;
                self.store_type(expr.id, ty);
            }
            ExprKind::Empty => self.store_type(expr.id, TypeId::OBJECT),
        }
    }

    /// Variable references. Bound variables already carry their types; the
    /// dynamic ones are searched through the with-receivers, then the
    /// plugin, and reported undeclared when both fail.
    fn visit_variable(&mut self, expr: &Expr, vref: &VarRef) {
        match vref.binding {
            Binding::This => {
                let ty = self.arena.raw(self.class_node);
                self.store_type(expr.id, ty);
            }
            Binding::Super => {
                let ty = self.superclass_type();
                self.store_type(expr.id, ty);
            }
            Binding::Var(_) => {
                if self.meta.inferred_type(expr.id).is_none() {
                    let ty = self.get_type(expr);
                    self.meta.put_inferred_type(expr.id, ty);
                }
            }
            Binding::Dynamic => {
                for i in 0..self.with_receivers.len() {
                    let receiver = self.with_receivers[i];
                    if let Some(prop) = self.arena.find_property(receiver, &vref.name) {
                        let ty = prop.ty;
                        self.store_type(expr.id, ty);
                        return;
                    }
                    if let Some(field) = self.find_field(receiver, &vref.name) {
                        self.store_type(expr.id, field);
                        return;
                    }
                }
                if let Some(plugin) = self.plugin()
                    && let Some(ty) = plugin.resolve_dynamic_variable_type(self.arena, &vref.name)
                {
                    self.store_type(expr.id, ty);
                    return;
                }
                self.add_static_type_error(
                    SemanticError::UndeclaredVariable {
                        name: vref.name.clone(),
                        span: expr.span.into(),
                    },
                    expr.span,
                );
                self.store_type(expr.id, TypeId::OBJECT);
            }
        }
    }

    /// Field lookup along the superclass chain.
    pub(crate) fn find_field(&self, receiver: TypeId, name: &str) -> Option<TypeId> {
        let mut current = Some(receiver);
        while let Some(ty) = current {
            let class = self.arena.class_of(ty)?;
            if let Some(field) = self.arena.field_declared(class, name) {
                return Some(field.ty);
            }
            current = self.arena.class_def(class).superclass;
        }
        None
    }

    /// Ternaries refine the true branch with the condition's instanceof
    /// checks and join the branch types on exit.
    fn visit_ternary(&mut self, expr: &'a Expr, ternary: &'a quill_ast::TernaryExpr) {
        let old_tracker = self.push_assignment_tracking();
        self.push_temporary_type_info();
        self.visit_expr(&ternary.condition);
        self.visit_expr(&ternary.if_true);
        self.pop_temporary_type_info();
        self.visit_expr(&ternary.if_false);
        let type_of_true = self.get_type(&ternary.if_true);
        let type_of_false = self.get_type(&ternary.if_false);
        let joined = lowest_upper_bound_pair(self.arena, type_of_true, type_of_false);
        self.store_type(expr.id, joined);
        self.pop_assignment_tracking(old_tracker);
    }

    fn visit_unary(&mut self, expr: &'a Expr, op: UnaryOp, operand: &'a Expr) {
        self.visit_expr(operand);
        let ty = self.get_type(operand);
        let ty_re = self.arena.redirect(ty);
        let category = unwrap_type(ty_re);
        let result = match op {
            UnaryOp::BitwiseNegate => {
                if is_big_int_category(category) {
                    // Any integral number; the wrapper is preserved.
                    ty
                } else if ty_re == TypeId::STRING || ty_re == TypeId::GSTRING {
                    TypeId::PATTERN
                } else if ty_re == TypeId::ARRAY_LIST {
                    TypeId::ARRAY_LIST
                } else {
                    self.unary_method_result(expr, ty, op)
                }
            }
            UnaryOp::Minus | UnaryOp::Plus => {
                if is_big_dec_category(category) || is_floating_category(category) {
                    ty
                } else if ty_re == TypeId::ARRAY_LIST {
                    TypeId::ARRAY_LIST
                } else {
                    self.unary_method_result(expr, ty, op)
                }
            }
        };
        self.store_type(expr.id, result);
    }

    fn unary_method_result(&mut self, expr: &Expr, receiver: TypeId, op: UnaryOp) -> TypeId {
        match self.find_method_or_fail(expr.span, receiver, op.method_name(), &[]) {
            Some(method) => self.method_return_type(method),
            None => receiver,
        }
    }

    /// Casts: `as`-coercion is always allowed; a plain cast must be one of
    /// the convertible shapes.
    fn visit_cast(&mut self, expr: &'a Expr, cast: &'a quill_ast::CastExpr) {
        self.visit_expr(&cast.expr);
        if !cast.coerce {
            let target = cast.ty;
            let source = &cast.expr;
            let source_is_null = source.is_null_constant();
            let source_type = self.get_type(source);
            let one_char_string = source_type == TypeId::STRING
                && source.constant_text().is_some_and(|s| s.chars().count() == 1);
            let char_cast = target == TypeId::CHAR && one_char_string;
            let character_cast = target == TypeId::CHARACTER
                && (source_is_null || one_char_string);
            let numeric_cast = is_number_category(self.arena, wrap_type(target))
                && is_number_category(self.arena, wrap_type(source_type));
            let null_to_reference = source_is_null && !self.arena.is_primitive(target);
            if !char_cast
                && !character_cast
                && !numeric_cast
                && !null_to_reference
                && !is_assignable_to(self.arena, source_type, target)
            {
                self.add_static_type_error(
                    SemanticError::InconvertibleCast {
                        from: self.type_display(source_type),
                        to: self.type_display(target),
                        span: expr.span.into(),
                    },
                    expr.span,
                );
            }
        }
        self.store_type(expr.id, cast.ty);
    }

    /// List literals infer their element parameterization as the wrapped LUB
    /// of the element types. An empty literal stays the raw list type.
    pub(crate) fn infer_list_expression_type(&mut self, elements: &[Expr]) -> TypeId {
        if elements.is_empty() {
            return TypeId::LIST;
        }
        let types: Vec<TypeId> = elements.iter().map(|e| self.get_type(e)).collect();
        let joined = lowest_upper_bound(self.arena, &types);
        let element = wrap_type(joined);
        self.arena
            .parameterized(ClassId::LIST, [GenericsArg::of(element)])
    }

    /// Map literals parameterize over the wrapped key/value LUBs, but only
    /// when at least one of them is more specific than Object.
    pub(crate) fn infer_map_expression_type(
        &mut self,
        entries: &[quill_ast::MapEntry],
    ) -> TypeId {
        if entries.is_empty() {
            return TypeId::MAP;
        }
        let key_types: Vec<TypeId> = entries.iter().map(|e| self.get_type(&e.key)).collect();
        let value_types: Vec<TypeId> = entries.iter().map(|e| self.get_type(&e.value)).collect();
        let key = wrap_type(lowest_upper_bound(self.arena, &key_types));
        let value = wrap_type(lowest_upper_bound(self.arena, &value_types));
        if key.is_object() && value.is_object() {
            return TypeId::MAP;
        }
        self.arena.parameterized(
            ClassId::MAP,
            [GenericsArg::of(key), GenericsArg::of(value)],
        )
    }

    /// Element type of a container: array component, single generic
    /// argument, Object otherwise.
    pub(crate) fn infer_component_type(&mut self, container: TypeId) -> TypeId {
        if let Some(component) = self.arena.component_type(container) {
            return component;
        }
        let generics = self.arena.generics_of(container);
        if generics.len() == 1 {
            return generics[0].ty;
        }
        TypeId::OBJECT
    }

    /// Rendering of a constant for map-style constructor keys.
    pub(crate) fn const_text(value: &ConstValue) -> String {
        match value {
            ConstValue::Str(s) | ConstValue::GStr(s) => s.clone(),
            ConstValue::Int(v) | ConstValue::Long(v) => v.to_string(),
            ConstValue::BigInt(s) | ConstValue::Decimal(s) => s.clone(),
            ConstValue::Float(v) | ConstValue::Double(v) => v.to_string(),
            ConstValue::Bool(v) => v.to_string(),
            ConstValue::Null => "null".to_string(),
        }
    }
}
