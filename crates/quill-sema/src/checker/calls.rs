// checker/calls.rs
//
// Method and constructor call checking: receiver-chain resolution (with
// receivers, the static receiver, instanceof candidates), with-call and
// spread-call handling, closure calls and second-pass registration.

use quill_ast::{
    Binding, ConstructorCallExpr, Expr, ExprKind, MethodCallExpr, VarId,
};
use quill_types::{
    implements_interface_or_is_subclass_of, is_assignable_to, method_parameters_string,
    types_list_display, wrap_type, ClassId, GenericsArg, MethodDef, MethodId, TypeId,
};

use super::{SecondPassCall, TypeChecker};
use crate::errors::SemanticError;

impl<'a> TypeChecker<'a> {
    /// Argument types for resolution; a literal null argument becomes the
    /// unknown-parameter marker so it matches any reference parameter.
    pub(crate) fn argument_types(&mut self, args: &[Expr]) -> Vec<TypeId> {
        args.iter()
            .map(|arg| {
                if arg.is_null_constant() {
                    TypeId::UNKNOWN_PARAMETER
                } else {
                    self.get_type(arg)
                }
            })
            .collect()
    }

    pub(crate) fn visit_constructor_call(&mut self, expr: &'a Expr, call: &'a ConstructorCallExpr) {
        for arg in &call.args {
            self.visit_expr(arg);
        }
        let receiver = call.ty;
        let args = self.argument_types(&call.args);
        if let Some(target) = self.find_method_or_fail(expr.span, receiver, MethodDef::CTOR_NAME, &args)
        {
            self.store_target_method(expr.id, target);
        }
        self.store_type(expr.id, receiver);
    }

    pub(crate) fn visit_method_call(&mut self, expr: &'a Expr, call: &'a MethodCallExpr) {
        let object = &call.object;
        self.visit_expr(object);

        // A spread call type-checks against the component type and produces
        // a list of the component call's results.
        if call.spread_safe {
            let receiver_type = self.get_type(object);
            if !implements_interface_or_is_subclass_of(self.arena, receiver_type, TypeId::COLLECTION)
            {
                self.add_static_type_error(
                    SemanticError::SpreadOnNonCollection {
                        span: expr.span.into(),
                    },
                    expr.span,
                );
                self.store_type(expr.id, TypeId::OBJECT);
                return;
            }
            let component = self.infer_component_type(receiver_type);
            for arg in &call.args {
                self.visit_expr(arg);
            }
            let args = self.argument_types(&call.args);
            let sub_return = self
                .resolve_and_store_call(expr, call, component, &args, false)
                .unwrap_or(TypeId::OBJECT);
            let element = wrap_type(sub_return);
            let list_of = self
                .arena
                .parameterized(ClassId::LIST, [GenericsArg::of(element)]);
            self.store_type(expr.id, list_of);
            return;
        }

        let remember_it = self.last_implicit_it_type;
        let is_with_call = call.method == "with"
            && call.args.len() == 1
            && matches!(call.args[0].kind, ExprKind::Closure(_));
        let receiver = self.get_type(object);

        if !is_with_call {
            // Ordinary calls visit their arguments before resolution.
            for arg in &call.args {
                self.visit_expr(arg);
            }
        } else {
            self.with_receivers.insert(0, receiver);
            self.last_implicit_it_type = Some(receiver);
            self.check_with_call_parameter(&call.args[0], receiver);
            // The closure argument is visited with the receiver in scope.
            self.visit_expr(&call.args[0]);
        }

        let args = self.argument_types(&call.args);
        let _ = self.resolve_and_store_call(expr, call, receiver, &args, true);

        if is_with_call {
            self.last_implicit_it_type = remember_it;
            self.with_receivers.remove(0);
        }
    }

    /// An explicitly-typed single closure parameter of a with-call must
    /// accept the receiver; more than one parameter is an error.
    fn check_with_call_parameter(&mut self, closure_arg: &Expr, receiver: TypeId) {
        let ExprKind::Closure(closure) = &closure_arg.kind else {
            return;
        };
        if closure.params.len() > 1 {
            self.add_static_type_error(
                SemanticError::WithParameterCount {
                    span: closure_arg.span.into(),
                },
                closure_arg.span,
            );
        } else if closure.params.len() == 1 {
            let declared = self.vars.get(closure.params[0]).declared_type;
            // An untyped parameter (origin Object) accepts anything.
            if !declared.is_object() {
                let declared_redirect = self.arena.redirect(declared);
                if !is_assignable_to(self.arena, receiver, declared_redirect) {
                    self.add_static_type_error(
                        SemanticError::WithParameterType {
                            expected: self.type_display(receiver),
                            found: self.type_display(declared_redirect),
                            span: closure_arg.span.into(),
                        },
                        closure_arg.span,
                    );
                }
            }
        }
    }

    /// Receiver-chain resolution and call-site annotation. Returns the
    /// call's result type when resolution succeeded. `full_call` disables
    /// the closure-call and second-pass handling for synthetic spread
    /// subcalls.
    fn resolve_and_store_call(
        &mut self,
        expr: &'a Expr,
        call: &'a MethodCallExpr,
        receiver: TypeId,
        args: &[TypeId],
        full_call: bool,
    ) -> Option<TypeId> {
        let object = &call.object;
        let name = &call.method;

        // Candidate receivers, in order: with receivers, the static
        // receiver, the class type for class literals, then any candidates
        // refined by instanceof in the enclosing branch.
        let mut receivers: Vec<TypeId> = Vec::new();
        receivers.extend(self.with_receivers.iter().copied());
        receivers.push(receiver);
        if matches!(object.kind, ExprKind::ClassLiteral(_)) {
            receivers.push(TypeId::CLASS);
        }
        receivers.extend(self.temporary_types_for(object));

        let mut found: Vec<MethodId> = Vec::new();
        let mut chosen_receiver = receiver;
        for current in receivers {
            found = self.find_method(current, name, args);
            if !found.is_empty() {
                self.type_check_methods_with_generics(current, args, &found, expr);
                chosen_receiver = current;
                break;
            }
        }

        if found.is_empty() {
            self.add_static_type_error(
                SemanticError::UnknownMethod {
                    receiver: self.type_display(receiver),
                    signature: method_parameters_string(self.arena, name, args),
                    span: expr.span.into(),
                },
                expr.span,
            );
            self.store_type(expr.id, TypeId::OBJECT);
            return None;
        }

        if full_call && self.is_closure_call(name, object) {
            let result = self.check_closure_call(expr, object, args);
            self.store_type(expr.id, result);
            return Some(result);
        }

        if found.len() > 1 {
            self.add_static_type_error(
                SemanticError::AmbiguousMethod {
                    candidates: self.method_list_display(&found),
                    span: expr.span.into(),
                },
                expr.span,
            );
            self.store_type(expr.id, TypeId::OBJECT);
            return None;
        }

        let target = found[0];
        // Visit the callee body first so its inferred return type is
        // available; recursion is bounded by the visited set.
        let declaring = self.arena.method(target).declaring_class;
        let old_class = self.class_node;
        self.class_node = declaring;
        self.visit_method(target);
        self.class_node = old_class;

        let mut return_type = self.method_return_type(target);
        if self.arena.uses_generics(return_type) || self.arena.contains_placeholder(return_type) {
            return_type = self.infer_return_type_generics(chosen_receiver, target, &call.args);
        }
        self.store_type(expr.id, return_type);
        self.store_target_method(expr.id, target);

        if full_call
            && let ExprKind::Variable(vref) = &object.kind
            && let Binding::Var(var) = vref.binding
            && self.vars.get(var).closure_shared
        {
            self.second_pass.insert(
                expr.id,
                SecondPassCall {
                    call_node: expr.id,
                    receiver: var,
                    span: expr.span,
                },
            );
        }

        Some(return_type)
    }

    /// `c.call(...)` where `c` holds a closure.
    fn is_closure_call(&mut self, name: &str, object: &Expr) -> bool {
        if name != "call" {
            return false;
        }
        if matches!(object.kind, ExprKind::Closure(_)) {
            return true;
        }
        let ty = self.get_type(object);
        self.arena.class_of(ty) == Some(ClassId::CLOSURE)
    }

    /// Check a closure call against the recorded formal parameters and take
    /// the result type from the recorded inferred return type.
    fn check_closure_call(&mut self, expr: &'a Expr, object: &'a Expr, args: &[TypeId]) -> TypeId {
        match &object.kind {
            ExprKind::Variable(vref) => {
                if let Binding::Var(var) = vref.binding {
                    let decl_node = self.vars.get(var).decl_node;
                    if let Some(params) = self.meta.closure_arguments(decl_node).map(<[VarId]>::to_vec)
                    {
                        self.type_check_closure_call(expr, args, &params);
                    }
                    if let Some(inferred_return) = self.meta.inferred_return_type(decl_node) {
                        return wrap_type(inferred_return);
                    }
                }
                TypeId::OBJECT
            }
            ExprKind::Closure(closure) => {
                let params = closure.params.clone();
                self.type_check_closure_call(expr, args, &params);
                match self.meta.inferred_return_type(object.id) {
                    Some(inferred_return) => wrap_type(inferred_return),
                    None => TypeId::OBJECT,
                }
            }
            _ => TypeId::OBJECT,
        }
    }

    pub(crate) fn type_check_closure_call(
        &mut self,
        call_expr: &Expr,
        args: &[TypeId],
        params: &[VarId],
    ) {
        let param_types: Vec<TypeId> = params
            .iter()
            .map(|&p| self.vars.get(p).declared_type)
            .collect();
        if self.all_parameters_and_arguments_match(&param_types, args) < 0
            && self.last_arg_matches_varg(&param_types, args) < 0
        {
            self.add_static_type_error(
                SemanticError::ClosureArgumentsMismatch {
                    params: types_list_display(self.arena, &param_types),
                    args: types_list_display(self.arena, args),
                    span: call_expr.span.into(),
                },
                call_expr.span,
            );
        }
    }

    /// Candidate list rendering for ambiguity errors.
    pub(crate) fn method_list_display(&self, methods: &[MethodId]) -> String {
        let rendered: Vec<String> = methods
            .iter()
            .map(|&m| {
                let def = self.arena.method(m);
                let params: Vec<TypeId> = def.params.iter().map(|p| p.ty).collect();
                format!(
                    "{}#{}",
                    self.arena.class_def(def.declaring_class).name,
                    method_parameters_string(self.arena, &def.name, &params)
                )
            })
            .collect();
        format!("[{}]", rendered.join(", "))
    }
}
