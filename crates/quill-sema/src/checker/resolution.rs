// checker/resolution.rs
//
// Method and constructor resolution: candidate discovery (declared methods,
// synthesized accessors and default constructors, the extension registry,
// the GString-to-String retry, the plugin), then best-match selection with
// vararg folding and auto-boxing.

use rustc_hash::FxHashMap;

use quill_ast::Span;
use quill_types::{
    extract_placeholders, method_parameters_string, substitute, unwrap_type, wrap_type, MethodDef,
    MethodId, TypeDesc, TypeId,
};

use super::TypeChecker;
use crate::errors::SemanticError;

impl<'a> TypeChecker<'a> {
    /// Resolve expecting exactly one match; emits the not-found or ambiguity
    /// error otherwise.
    pub(crate) fn find_method_or_fail(
        &mut self,
        span: Span,
        receiver: TypeId,
        name: &str,
        args: &[TypeId],
    ) -> Option<MethodId> {
        let methods = self.find_method(receiver, name, args);
        if methods.is_empty() {
            self.add_static_type_error(
                SemanticError::UnknownMethod {
                    receiver: self.type_display(receiver),
                    signature: method_parameters_string(self.arena, name, args),
                    span: span.into(),
                },
                span,
            );
            None
        } else if methods.len() == 1 {
            Some(methods[0])
        } else {
            self.add_static_type_error(
                SemanticError::AmbiguousMethod {
                    candidates: self.method_list_display(&methods),
                    span: span.into(),
                },
                span,
            );
            None
        }
    }

    /// The resolver used everywhere a call is type-checked. Returns every
    /// candidate at the minimum distance; an empty result means not found,
    /// more than one means ambiguous.
    #[tracing::instrument(skip(self, args), fields(method = name))]
    pub(crate) fn find_method(
        &mut self,
        receiver: TypeId,
        name: &str,
        args: &[TypeId],
    ) -> Vec<MethodId> {
        // Primitive receivers box before lookup.
        let receiver = if self.arena.is_primitive(receiver) {
            wrap_type(receiver)
        } else {
            receiver
        };

        let methods: Vec<MethodId>;
        if name == MethodDef::CTOR_NAME {
            methods = self.arena.constructors_of(receiver);
            if methods.is_empty() {
                // No declared constructor: a public nullary one exists
                // implicitly.
                if args.is_empty()
                    && let Some(class) = self.arena.class_of(receiver)
                {
                    let synthesized = self.arena.add_detached_method(MethodDef {
                        synthetic: true,
                        ..MethodDef::new(class, MethodDef::CTOR_NAME, vec![], receiver)
                    });
                    return vec![synthesized];
                }
                return Vec::new();
            }
        } else {
            methods = self.arena.methods_named(receiver, name);
            if methods.is_empty() && args.is_empty() {
                // A zero-arg getter-style name may be a property access.
                if let Some(property_name) = accessor_property_name(name)
                    && let Some(property) = self.arena.find_property(receiver, &property_name)
                {
                    let return_type = property.ty;
                    if let Some(class) = self.arena.class_of(receiver) {
                        let synthesized = self.arena.add_detached_method(MethodDef {
                            synthetic: true,
                            ..MethodDef::new(class, name, vec![], return_type)
                        });
                        return vec![synthesized];
                    }
                }
            }
        }

        let chosen = self.choose_best_method(receiver, &methods, args);
        if !chosen.is_empty() {
            return chosen;
        }

        // Extension-method registry.
        let extension_candidates = self.extensions.find(self.arena, receiver, name);
        let chosen = self.choose_best_method(receiver, &extension_candidates, args);
        if !chosen.is_empty() {
            tracing::trace!(method = name, "resolved through the extension registry");
            return chosen;
        }

        if receiver == TypeId::GSTRING {
            return self.find_method(TypeId::STRING, name, args);
        }

        if let Some(plugin) = self.plugin()
            && let Some(found) = plugin.find_method(self.arena, receiver, name, args)
            && !found.is_empty()
        {
            tracing::trace!(method = name, "resolved through the plugin");
            return found;
        }

        Vec::new()
    }

    /// Best-match selection: keep every candidate at the minimum distance.
    pub(crate) fn choose_best_method(
        &mut self,
        receiver: TypeId,
        methods: &[MethodId],
        args: &[TypeId],
    ) -> Vec<MethodId> {
        if methods.is_empty() {
            return Vec::new();
        }
        let mut best: Vec<MethodId> = Vec::new();
        let mut best_dist = i32::MAX;
        for &method in methods {
            let params = self.parameterize_arguments(receiver, method);
            let is_vargs = params
                .last()
                .is_some_and(|&p| self.arena.is_array(p));
            if params.len() == args.len() {
                let all_match = self.all_parameters_and_arguments_match(&params, args);
                let mut last_arg_match = if is_vargs {
                    self.last_arg_matches_varg(&params, args)
                } else {
                    -1
                };
                if last_arg_match >= 0 {
                    // Exact matches are preferred over vararg folds.
                    last_arg_match += 1;
                }
                let mut dist = if all_match >= 0 {
                    all_match.max(last_arg_match)
                } else {
                    last_arg_match
                };
                if dist >= 0 && !self.declared_on_receiver(receiver, method) {
                    dist += 1;
                }
                if dist >= 0 && dist < best_dist {
                    best.clear();
                    best.push(method);
                    best_dist = dist;
                } else if dist >= 0 && dist == best_dist {
                    best.push(method);
                }
            } else if is_vargs {
                if params.len() == args.len() + 1 {
                    // Vararg slot left out entirely.
                    if best_dist > 1 {
                        best.clear();
                        best.push(method);
                        best_dist = 1;
                    }
                } else if params.len() < args.len() {
                    // Several arguments folded into the vararg array.
                    let mut dist = self.excess_arguments_match_vargs(&params, args);
                    if dist >= 0 {
                        if !self.declared_on_receiver(receiver, method) {
                            dist += 1;
                        }
                        dist += 1;
                        if dist < best_dist {
                            best.clear();
                            best.push(method);
                            best_dist = dist;
                        } else if dist == best_dist {
                            best.push(method);
                        }
                    }
                }
            }
        }
        best
    }

    fn declared_on_receiver(&self, receiver: TypeId, method: MethodId) -> bool {
        self.arena.class_of(receiver) == Some(self.arena.method(method).declaring_class)
    }

    /// Substitute the receiver's generic bindings into a method's parameter
    /// types, producing what the call site compares against.
    pub(crate) fn parameterize_arguments(
        &mut self,
        receiver: TypeId,
        method: MethodId,
    ) -> Vec<TypeId> {
        let param_types: Vec<TypeId> = self
            .arena
            .method(method)
            .params
            .iter()
            .map(|p| p.ty)
            .collect();
        let mut bindings = FxHashMap::default();
        extract_placeholders(self.arena, receiver, &mut bindings);
        if bindings.is_empty() {
            return param_types;
        }
        param_types
            .into_iter()
            .map(|ty| substitute(self.arena, ty, &bindings))
            .collect()
    }

    /// Arities equal and every parameter assignable from its argument.
    /// Returns the summed widening distance, or -1 on mismatch.
    pub(crate) fn all_parameters_and_arguments_match(
        &self,
        params: &[TypeId],
        args: &[TypeId],
    ) -> i32 {
        if params.len() != args.len() {
            return -1;
        }
        let mut dist = 0;
        for (&param, &arg) in params.iter().zip(args.iter()) {
            match self.type_distance(arg, param) {
                Some(d) => dist += d as i32,
                None => return -1,
            }
        }
        dist
    }

    /// Last parameter is varargs: the head must match positionally and the
    /// final argument must match the vararg element type.
    pub(crate) fn last_arg_matches_varg(&self, params: &[TypeId], args: &[TypeId]) -> i32 {
        let Some((&last, head)) = params.split_last() else {
            return -1;
        };
        if args.len() != params.len() {
            return -1;
        }
        let Some(component) = self.arena.component_type(last) else {
            return -1;
        };
        let head_dist = self.all_parameters_and_arguments_match(head, &args[..head.len()]);
        if head_dist < 0 {
            return -1;
        }
        match self.type_distance(args[args.len() - 1], component) {
            Some(d) => head_dist + d as i32,
            None => -1,
        }
    }

    /// More arguments than parameters: every excess argument must match the
    /// vararg element type.
    pub(crate) fn excess_arguments_match_vargs(&self, params: &[TypeId], args: &[TypeId]) -> i32 {
        let Some((&last, head)) = params.split_last() else {
            return -1;
        };
        if args.len() <= head.len() {
            return -1;
        }
        let Some(component) = self.arena.component_type(last) else {
            return -1;
        };
        let mut dist = self.all_parameters_and_arguments_match(head, &args[..head.len()]);
        if dist < 0 {
            return -1;
        }
        for &arg in &args[head.len()..] {
            match self.type_distance(arg, component) {
                Some(d) => dist += d as i32,
                None => return -1,
            }
        }
        dist
    }

    /// Widening distance from an argument to a parameter: 0 for identity,
    /// 1 per boxing step, the rank difference for numeric widening, the
    /// hierarchy depth for reference widening. `None` when the argument
    /// cannot be passed at all.
    pub(crate) fn type_distance(&self, arg: TypeId, param: TypeId) -> Option<u32> {
        if arg == param {
            return Some(0);
        }
        if arg.is_unknown_parameter() {
            // A literal null matches any reference parameter.
            return if self.arena.is_primitive(param) {
                None
            } else {
                Some(0)
            };
        }
        // Placeholders behave like Object until substitution.
        let param_is_object = param.is_object()
            || matches!(self.arena.desc(param), TypeDesc::Placeholder { .. });
        if param_is_object {
            return Some(self.depth_to_object(arg));
        }
        if wrap_type(arg) == param || wrap_type(param) == arg {
            return Some(1);
        }
        if let (Some(arg_rank), Some(param_rank)) = (numeric_rank(arg), numeric_rank(param)) {
            return if arg_rank <= param_rank {
                Some((param_rank - arg_rank).max(1) as u32)
            } else {
                None
            };
        }
        if arg == TypeId::GSTRING && param == TypeId::STRING {
            return Some(1);
        }
        // Anything converts to a String parameter; the distance keeps exact
        // and subtype matches preferred. Generic parameters substituted to
        // String rely on this so the constraint check can report them.
        if param == TypeId::STRING {
            return Some(self.depth_to_object(arg) + 1);
        }
        if let (Some(arg_component), Some(param_component)) = (
            self.arena.component_type(arg),
            self.arena.component_type(param),
        ) {
            return self.type_distance(arg_component, param_component);
        }
        self.subtype_distance(arg, param)
    }

    /// Steps along the superclass chain (interfaces count one extra step).
    fn subtype_distance(&self, arg: TypeId, param: TypeId) -> Option<u32> {
        let target = self.arena.class_of(param)?;
        // Boxed forms participate in the walk so primitive arguments match
        // reference parameters up their wrapper's hierarchy.
        let mut frontier = vec![(wrap_type(arg), 0u32)];
        let mut seen = Vec::new();
        let mut best: Option<u32> = None;
        while let Some((ty, depth)) = frontier.pop() {
            let Some(class) = self.arena.class_of(ty) else {
                continue;
            };
            if class == target {
                best = Some(best.map_or(depth, |b: u32| b.min(depth)));
                continue;
            }
            if seen.contains(&class) {
                continue;
            }
            seen.push(class);
            let def = self.arena.class_def(class);
            if let Some(sup) = def.superclass {
                frontier.push((sup, depth + 1));
            }
            for &iface in &def.interfaces {
                frontier.push((iface, depth + 1));
            }
        }
        best
    }

    fn depth_to_object(&self, arg: TypeId) -> u32 {
        let mut depth = 0;
        let mut current = Some(wrap_type(arg));
        while let Some(ty) = current {
            if ty.is_object() {
                break;
            }
            depth += 1;
            current = self.arena.superclass_of(ty);
        }
        depth
    }
}

fn numeric_rank(id: TypeId) -> Option<i32> {
    match unwrap_type(id) {
        TypeId::BYTE => Some(1),
        TypeId::CHAR | TypeId::SHORT => Some(2),
        TypeId::INT => Some(3),
        TypeId::LONG => Some(4),
        TypeId::BIG_INTEGER => Some(5),
        TypeId::FLOAT => Some(6),
        TypeId::DOUBLE => Some(7),
        TypeId::BIG_DECIMAL => Some(8),
        _ => None,
    }
}

/// Property name behind a zero-arg accessor name, if the name has the
/// accessor shape: `getFoo` / `isFoo` -> `foo`.
fn accessor_property_name(name: &str) -> Option<String> {
    let suffix = name
        .strip_prefix("get")
        .or_else(|| name.strip_prefix("is"))?;
    let mut chars = suffix.chars();
    let first = chars.next()?;
    Some(first.to_lowercase().collect::<String>() + chars.as_str())
}

#[cfg(test)]
mod tests {
    use super::accessor_property_name;

    #[test]
    fn accessor_names_decapitalize() {
        assert_eq!(accessor_property_name("getName"), Some("name".to_string()));
        assert_eq!(accessor_property_name("isEmpty"), Some("empty".to_string()));
        assert_eq!(accessor_property_name("size"), None);
        assert_eq!(accessor_property_name("get"), None);
    }
}
