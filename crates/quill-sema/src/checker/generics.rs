// checker/generics.rs
//
// The generics engine: return-type reconstruction from argument types, and
// the post-selection constraint check against the receiver's
// parameterization.

use rustc_hash::FxHashMap;

use quill_ast::Expr;
use quill_types::{
    align_generic_types, extract_placeholders, implements_interface_or_is_subclass_of,
    method_parameters_string, parameterize_supertype, substitute, types_list_display, wrap_type,
    GenericsArg, MethodId, TypeDesc, TypeId,
};

use super::TypeChecker;
use crate::errors::SemanticError;

impl<'a> TypeChecker<'a> {
    /// Reconstruct a parameterized return type from the call's receiver and
    /// argument types.
    ///
    /// Bindings are collected receiver-first, then refined positionally from
    /// the arguments: for each generic parameter, the actual argument type
    /// is walked up to the formal's raw type, parameterized there, and its
    /// bindings extracted. A vararg tail contributes its component type.
    pub(crate) fn infer_return_type_generics(
        &mut self,
        receiver: TypeId,
        method: MethodId,
        arg_exprs: &'a [Expr],
    ) -> TypeId {
        let return_type = self.arena.method(method).return_type;
        if !self.arena.contains_placeholder(return_type)
            && !matches!(self.arena.desc(return_type), TypeDesc::Placeholder { .. })
        {
            return return_type;
        }

        let mut resolved: FxHashMap<String, GenericsArg> = FxHashMap::default();
        extract_placeholders(self.arena, receiver, &mut resolved);
        extract_placeholders(self.arena, return_type, &mut resolved);

        let params: Vec<TypeId> = self
            .arena
            .method(method)
            .params
            .iter()
            .map(|p| p.ty)
            .collect();
        let is_vargs = self.arena.method_is_vararg(method);
        let param_count = params.len();
        for (i, mut param_type) in params.into_iter().enumerate() {
            let last = i + 1 == param_count;
            if !self.arena.contains_placeholder(param_type)
                && let Some(component) = self.arena.component_type(param_type)
            {
                param_type = component;
            }
            if !self.arena.contains_placeholder(param_type) {
                continue;
            }
            let Some(arg_expr) = arg_exprs.get(i) else {
                continue;
            };
            let mut actual = self.get_type(arg_expr);
            if is_vargs
                && last
                && let Some(component) = self.arena.component_type(actual)
            {
                actual = component;
            }
            let actual = wrap_type(actual);
            self.bind_param_placeholders(param_type, actual, &mut resolved);
        }

        substitute(self.arena, return_type, &resolved)
    }

    /// Match one formal parameter's placeholders against an actual argument
    /// type, inserting bindings into `resolved`.
    fn bind_param_placeholders(
        &mut self,
        param_type: TypeId,
        actual: TypeId,
        resolved: &mut FxHashMap<String, GenericsArg>,
    ) {
        match self.arena.desc(param_type).clone() {
            // A bare placeholder binds directly to the actual type.
            TypeDesc::Placeholder { name } => {
                resolved.insert(name, GenericsArg::of(actual));
            }
            TypeDesc::Array { elem } => {
                let actual_component = self.arena.component_type(actual).unwrap_or(actual);
                self.bind_param_placeholders(elem, actual_component, resolved);
            }
            TypeDesc::Class { class, args } => {
                // Walk the actual up to the formal's raw class, then map the
                // declared names through the formal's aliases.
                let Some(view) = parameterize_supertype(self.arena, actual, class) else {
                    return;
                };
                let mut actual_bindings: FxHashMap<String, GenericsArg> = FxHashMap::default();
                extract_placeholders(self.arena, view, &mut actual_bindings);
                let declared = self.arena.class_def(class).generic_params.clone();
                for (decl, alias) in declared.iter().zip(args.iter()) {
                    if alias.placeholder
                        && let (Some(alias_name), Some(decl_name)) = (&alias.name, &decl.name)
                        && let Some(bound) = actual_bindings.get(decl_name)
                    {
                        resolved.insert(alias_name.clone(), bound.clone());
                    }
                }
            }
        }
    }

    /// Post-selection constraint check: every generic parameter of each
    /// candidate must accept the wrapped argument type. When every candidate
    /// fails, the call is reported — with the resolved signature when there
    /// was exactly one failure, generically otherwise.
    pub(crate) fn type_check_methods_with_generics(
        &mut self,
        receiver: TypeId,
        args: &[TypeId],
        candidates: &[MethodId],
        location: &Expr,
    ) {
        if !self.arena.uses_generics(receiver) {
            return;
        }
        let Some(receiver_class) = self.arena.class_of(receiver) else {
            return;
        };
        let redirect_generics = self.arena.class_def(receiver_class).generic_params.clone();
        let receiver_args = self.arena.generics_of(receiver).to_vec();

        let mut failure = 0usize;
        let mut failed: Option<(MethodId, Vec<TypeId>)> = None;
        for &method in candidates {
            let declaring = self.arena.method(method).declaring_class;
            let declaring_raw = self.arena.raw(declaring);
            if !implements_interface_or_is_subclass_of(self.arena, receiver, declaring_raw)
                || self.arena.class_def(declaring).generic_params.is_empty()
            {
                continue;
            }
            let params: Vec<TypeId> = self
                .arena
                .method(method)
                .params
                .iter()
                .map(|p| p.ty)
                .collect();
            let mut method_failed = false;
            let mut failed_param_types: Vec<TypeId> = Vec::new();
            for (arg_num, param_type) in params.iter().enumerate() {
                let Some(&arg) = args.get(arg_num) else {
                    continue;
                };
                // The checked value: the parameter itself, or the component
                // of a generic-component array.
                let (alignment, actual) = match self.arena.desc(*param_type).clone() {
                    TypeDesc::Placeholder { name } => (
                        vec![GenericsArg::placeholder(name, *param_type)],
                        arg,
                    ),
                    TypeDesc::Class { args: pargs, .. } if !pargs.is_empty() => {
                        (pargs.to_vec(), arg)
                    }
                    TypeDesc::Array { elem } => match self.arena.desc(elem).clone() {
                        TypeDesc::Placeholder { name } => (
                            vec![GenericsArg::placeholder(name, elem)],
                            self.arena.component_type(arg).unwrap_or(arg),
                        ),
                        _ => continue,
                    },
                    _ => continue,
                };
                let aligned =
                    align_generic_types(&redirect_generics, &receiver_args, &alignment);
                if aligned.len() != 1 {
                    continue;
                }
                let node_type = wrap_type(aligned[0].ty);
                let actual = wrap_type(actual);
                // Null arguments are checked nowhere; the language passes
                // them freely.
                if actual.is_unknown_parameter() {
                    continue;
                }
                if actual != node_type
                    && !implements_interface_or_is_subclass_of(self.arena, actual, node_type)
                {
                    method_failed = true;
                    failed_param_types.push(node_type);
                }
            }
            if method_failed {
                failure += 1;
                failed = Some((method, failed_param_types));
            }
        }

        if failure > 0 && failure == candidates.len() {
            if let (1, Some((method, param_types))) = (failure, failed) {
                let name = self.arena.method(method).name.clone();
                let signature = format!(
                    "{}#{}",
                    self.type_display(receiver),
                    method_parameters_string(self.arena, &name, &param_types)
                );
                self.add_static_type_error(
                    SemanticError::GenericsCallArguments {
                        signature,
                        args: types_list_display(self.arena, args),
                        span: location.span.into(),
                    },
                    location.span,
                );
            } else {
                self.add_static_type_error(
                    SemanticError::NoMatchingGenericMethod {
                        args: types_list_display(self.arena, args),
                        span: location.span.into(),
                    },
                    location.span,
                );
            }
        }
    }
}
