// checker/assign.rs
//
// The assignment checker: left/right compatibility, tuple destructuring, the
// structural literal forms (a list or map literal standing in for a
// constructor call), array component checks and the generic-argument check.

use quill_ast::{BinOp, Binding, Expr, ExprKind};
use quill_types::{
    check_compatible_assignment_types, check_possible_loss_of_precision, generics_compatible_with,
    implements_interface_or_is_subclass_of, is_assignable_to, is_number_type,
    method_parameters_string, GenericsArg, MethodDef, TypeId,
};

use super::TypeChecker;
use crate::errors::SemanticError;

impl<'a> TypeChecker<'a> {
    pub(crate) fn type_check_assignment(
        &mut self,
        assignment: &'a Expr,
        left: &'a Expr,
        left_type: TypeId,
        right: &'a Expr,
        right_type: TypeId,
    ) {
        if let ExprKind::Tuple(targets) = &left.kind {
            self.check_tuple_assignment(targets, right);
            return;
        }

        // For index expressions, properties and with-resolved dynamic
        // variables, the inferred type is the authority; otherwise the
        // declared type of the left expression is.
        let left_redirect = match &left.kind {
            ExprKind::Binary(b) if b.op == BinOp::Index => left_type,
            ExprKind::Property(_) => left_type,
            ExprKind::Variable(vref) => match vref.binding {
                Binding::Dynamic => left_type,
                Binding::Var(var) => {
                    let origin = self.vars.get(var).declared_type;
                    if self.arena.is_primitive(origin) {
                        left_type
                    } else {
                        self.arena.redirect(origin)
                    }
                }
                _ => self.arena.redirect(left_type),
            },
            _ => self.arena.redirect(left_type),
        };

        // List and map literals are always castable on assignment; the
        // structural constructor checks below take over for them.
        let rhs_literal = matches!(
            right.kind,
            ExprKind::ListLiteral(_) | ExprKind::MapLiteral(_)
        );
        let compatible = rhs_literal
            || check_compatible_assignment_types(
                self.arena,
                left_redirect,
                right_type,
                right.is_null_constant(),
            );
        if !compatible {
            if left_redirect.is_readonly_property()
                && let ExprKind::Property(prop) = &left.kind
            {
                self.add_static_type_error(
                    SemanticError::ReadOnlyProperty {
                        property: prop.property.clone(),
                        span: left.span.into(),
                    },
                    left.span,
                );
            } else {
                self.add_static_type_error(
                    SemanticError::AssignmentIncompatible {
                        right: self.type_display(right_type),
                        left: self.type_display(left_type),
                        span: assignment.span.into(),
                    },
                    assignment.span,
                );
            }
            return;
        }

        // A closure on the right hands its inferred return type to the left.
        if let ExprKind::Closure(_) = &right.kind
            && let Some(inferred_return) = self.meta.inferred_return_type(right.id)
        {
            self.meta.put_inferred_return_type(left.id, inferred_return);
            if let ExprKind::Variable(vref) = &left.kind
                && let Binding::Var(var) = vref.binding
            {
                let decl_node = self.vars.get(var).decl_node;
                self.meta.put_inferred_return_type(decl_node, inferred_return);
            }
        }

        let mut possible_loss = false;
        if is_number_type(self.arena, left_redirect) && is_number_type(self.arena, right_type) {
            possible_loss = check_possible_loss_of_precision(left_redirect, right_type);
            if possible_loss {
                self.add_static_type_error(
                    SemanticError::PrecisionLoss {
                        from: self.type_display(right_type),
                        to: self.type_display(left_redirect),
                        span: right.span.into(),
                    },
                    right.span,
                );
            }
        }

        // Arrays check componentwise, including every element of a list
        // literal on the right.
        if !possible_loss
            && let Some(left_component) = self.arena.component_type(left_type)
        {
            if let Some(right_component) = self.arena.component_type(right_type) {
                if !check_compatible_assignment_types(
                    self.arena,
                    left_component,
                    right_component,
                    false,
                ) {
                    self.add_static_type_error(
                        SemanticError::ArrayAssignmentIncompatible {
                            value: self.type_display(right_component),
                            array: self.type_display(left_type),
                            span: assignment.span.into(),
                        },
                        assignment.span,
                    );
                }
            } else if let ExprKind::ListLiteral(elements) = &right.kind {
                for element in elements {
                    let element_type = self.get_type(element);
                    let element_redirect = self.arena.redirect(element_type);
                    if !check_compatible_assignment_types(
                        self.arena,
                        left_component,
                        element_redirect,
                        element.is_null_constant(),
                    ) {
                        self.add_static_type_error(
                            SemanticError::ArrayAssignmentIncompatible {
                                value: self.type_display(element_redirect),
                                array: self.type_display(left_type),
                                span: assignment.span.into(),
                            },
                            assignment.span,
                        );
                    }
                }
            }
        }

        // A list literal assigned to a non-list is a constructor call in
        // disguise; a list value assigned to an unrelated non-list is an
        // error. Array targets were already handled componentwise above.
        if !self.arena.is_array(left_type)
            && !implements_interface_or_is_subclass_of(self.arena, left_redirect, TypeId::LIST)
        {
            if let ExprKind::ListLiteral(elements) = &right.kind {
                let args = self.argument_types(elements);
                self.check_constructor_style_literal(left_redirect, &args, assignment.span);
            } else if !implements_interface_or_is_subclass_of(self.arena, right_type, left_redirect)
                && implements_interface_or_is_subclass_of(self.arena, right_type, TypeId::LIST)
            {
                self.add_static_type_error(
                    SemanticError::AssignmentIncompatible {
                        right: self.type_display(right_type),
                        left: self.type_display(left_type),
                        span: assignment.span.into(),
                    },
                    assignment.span,
                );
            }
        }

        // A map literal assigned to a non-map is a named-argument
        // constructor call; each key must be a constant naming a property.
        if !implements_interface_or_is_subclass_of(self.arena, left_redirect, TypeId::MAP)
            && let ExprKind::MapLiteral(entries) = &right.kind
        {
            let dynamic_target = matches!(
                &left.kind,
                ExprKind::Variable(vref) if match vref.binding {
                    Binding::Var(var) => self.vars.get(var).is_dynamic_typed(),
                    Binding::Dynamic => true,
                    _ => false,
                }
            );
            if !dynamic_target {
                self.check_constructor_style_literal(left_redirect, &[right_type], assignment.span);
                for entry in entries {
                    let ExprKind::Const(key) = &entry.key.kind else {
                        self.add_static_type_error(
                            SemanticError::DynamicMapKey {
                                span: entry.key.span.into(),
                            },
                            entry.key.span,
                        );
                        continue;
                    };
                    let property = Self::const_text(key);
                    match self.arena.find_property(left_redirect, &property) {
                        None => {
                            self.add_static_type_error(
                                SemanticError::UnknownProperty {
                                    property,
                                    class_name: self.type_display(left_redirect),
                                    span: left.span.into(),
                                },
                                left.span,
                            );
                        }
                        Some(prop) => {
                            let property_type = prop.ty;
                            let value_type = self.get_type(&entry.value);
                            if !is_assignable_to(self.arena, value_type, property_type) {
                                self.add_static_type_error(
                                    SemanticError::PropertyAssignmentIncompatible {
                                        value: self.type_display(value_type),
                                        field: self.type_display(property_type),
                                        span: entry.value.span.into(),
                                    },
                                    entry.value.span,
                                );
                            }
                        }
                    }
                }
            }
        }

        // Last, the generic-argument check against the wildcarded left.
        if self.arena.uses_generics(left_type) && !self.arena.is_enum(left_type) {
            if !generics_compatible_with(self.arena, left_type, right_type) {
                self.add_static_type_error(
                    SemanticError::GenericsIncompatible {
                        right: self.type_display(right_type),
                        left: self.type_display(left_type),
                        span: assignment.span.into(),
                    },
                    assignment.span,
                );
            }
        }
    }

    /// Multiple assignment: the right side must be a list literal of at
    /// least the target arity, checked elementwise.
    fn check_tuple_assignment(&mut self, targets: &[Expr], right: &'a Expr) {
        let ExprKind::ListLiteral(elements) = &right.kind else {
            self.add_static_type_error(
                SemanticError::MultipleAssignmentWithoutList {
                    span: right.span.into(),
                },
                right.span,
            );
            return;
        };
        if elements.len() < targets.len() {
            self.add_static_type_error(
                SemanticError::TupleArityMismatch {
                    expected: targets.len(),
                    found: elements.len(),
                    span: right.span.into(),
                },
                right.span,
            );
            return;
        }
        for (target, element) in targets.iter().zip(elements.iter()) {
            let element_type = self.get_type(element);
            let target_type = self.get_type(target);
            if !is_assignable_to(self.arena, element_type, target_type) {
                self.add_static_type_error(
                    SemanticError::AssignmentIncompatible {
                        right: self.type_display(element_type),
                        left: self.type_display(target_type),
                        span: right.span.into(),
                    },
                    right.span,
                );
                // One report per tuple keeps the error list readable.
                break;
            }
        }
    }

    /// Validate a constructor-style literal: the target must have a
    /// constructor matching the collected argument types. Object and dynamic
    /// targets succeed trivially.
    pub(crate) fn check_constructor_style_literal(
        &mut self,
        node: TypeId,
        args: &[TypeId],
        span: quill_ast::Span,
    ) {
        if node.is_object() {
            return;
        }
        let constructors = self.arena.constructors_of(node);
        if constructors.is_empty() && args.is_empty() {
            return;
        }
        let found = self.find_method(node, MethodDef::CTOR_NAME, args);
        if found.is_empty() {
            self.add_static_type_error(
                SemanticError::UnknownConstructor {
                    type_name: self.type_display(node),
                    signature: method_parameters_string(self.arena, MethodDef::CTOR_NAME, args),
                    span: span.into(),
                },
                span,
            );
        }
    }

    /// Diamond constructor inference: an argumentless diamond call adopts
    /// the wrapped generic arguments of the assignment target; a non-empty
    /// one adopts the parameterization of its first argument.
    pub(crate) fn infer_diamond_type(&mut self, ctor_expr: &'a Expr, left_type: TypeId) {
        let ExprKind::ConstructorCall(ctor) = &ctor_expr.kind else {
            return;
        };
        let Some(class) = self.arena.class_of(ctor.ty) else {
            return;
        };
        let source = if ctor.args.is_empty() {
            left_type
        } else {
            let first = self.get_type(&ctor.args[0]);
            if !self.arena.uses_generics(first) {
                return;
            }
            first
        };
        let args: Vec<GenericsArg> = self
            .arena
            .generics_of(source)
            .to_vec()
            .into_iter()
            .map(|g| GenericsArg {
                ty: quill_types::wrap_type(g.ty),
                ..g
            })
            .collect();
        if args.is_empty() {
            return;
        }
        let inferred = self.arena.parameterized(class, args);
        // Overwrite the raw type stored during the visit; the diamond has no
        // inference of its own to preserve.
        self.meta.put_inferred_type(ctor_expr.id, inferred);
    }
}
