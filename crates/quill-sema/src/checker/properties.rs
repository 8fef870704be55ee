// checker/properties.rs
//
// Property and attribute access: the receiver-candidate search (receiver,
// class type, instanceof refinements, the implicit `it`), the read-only
// accessor detection, and the dynamic map/list property sugar.

use quill_ast::{Expr, ExprKind, PropertyExpr};
use quill_types::{implements_interface_or_is_subclass_of, ClassId, TypeId};

use super::TypeChecker;
use crate::errors::SemanticError;

impl<'a> TypeChecker<'a> {
    pub(crate) fn visit_property(&mut self, expr: &'a Expr, prop: &'a PropertyExpr) {
        self.visit_expr(&prop.object);

        if prop.spread_safe {
            self.visit_spread_property(expr, prop);
            return;
        }

        let object_type = self.get_type(&prop.object);
        // Enum constants type as the enum itself.
        if self.arena.is_enum(object_type) {
            self.store_type(expr.id, object_type);
            return;
        }

        if self.exists_property(expr, prop, true).is_none() {
            let reported = self.find_current_instanceof_class(&prop.object, object_type);
            self.add_static_type_error(
                SemanticError::UnknownProperty {
                    property: prop.property.clone(),
                    class_name: self.type_display(reported),
                    span: expr.span.into(),
                },
                expr.span,
            );
            // Best-effort fallback so downstream checks keep producing
            // useful diagnostics.
            self.store_type(expr.id, TypeId::OBJECT);
        }
    }

    /// `list*.p` yields the raw list type with no element inference;
    /// `map*.key` / `map*.value` yield lists of the map's parameterization,
    /// and any other map spread property is an error.
    fn visit_spread_property(&mut self, expr: &'a Expr, prop: &'a PropertyExpr) {
        let object_type = self.get_type(&prop.object);
        if implements_interface_or_is_subclass_of(self.arena, object_type, TypeId::LIST) {
            self.store_type(expr.id, TypeId::LIST);
            return;
        }
        if implements_interface_or_is_subclass_of(self.arena, object_type, TypeId::MAP) {
            let generics = self.arena.generics_of(object_type).to_vec();
            let result = match prop.property.as_str() {
                "key" if generics.len() == 2 => {
                    let key = generics[0].clone();
                    self.arena.parameterized(ClassId::LIST, [key])
                }
                "value" if generics.len() == 2 => {
                    let value = generics[1].clone();
                    self.arena.parameterized(ClassId::LIST, [value])
                }
                "key" | "value" => TypeId::LIST,
                _ => {
                    self.add_static_type_error(
                        SemanticError::SpreadMapProperty {
                            span: expr.span.into(),
                        },
                        expr.span,
                    );
                    TypeId::LIST
                }
            };
            self.store_type(expr.id, result);
            return;
        }
        // Any other receiver behaves like a plain property access.
        if self.exists_property(expr, prop, true).is_none() {
            self.add_static_type_error(
                SemanticError::UnknownProperty {
                    property: prop.property.clone(),
                    class_name: self.type_display(object_type),
                    span: expr.span.into(),
                },
                expr.span,
            );
            self.store_type(expr.id, TypeId::OBJECT);
        }
    }

    /// Search the receiver and every refined candidate for the property,
    /// storing the found type on success.
    ///
    /// The search per candidate walks the superclass chain looking at
    /// properties, then fields (unless this is an attribute access, which
    /// stops at the receiver class), then getter-shaped methods (flagged as
    /// read-only), then the plugin. Maps and lists short-circuit: property
    /// access on them always succeeds with the object type.
    pub(crate) fn exists_property(
        &mut self,
        expr: &'a Expr,
        prop: &'a PropertyExpr,
        check_for_read_only: bool,
    ) -> Option<TypeId> {
        let object = &prop.object;
        let receiver_type = self.get_type(object);

        // Arrays expose exactly one property.
        if self.arena.is_array(receiver_type) && prop.property == "length" {
            self.store_type(expr.id, TypeId::INT);
            return Some(TypeId::INT);
        }

        let mut tests: Vec<TypeId> = vec![receiver_type];
        if matches!(object.kind, ExprKind::ClassLiteral(_)) {
            tests.push(TypeId::CLASS);
        }
        tests.extend(self.temporary_types_for(object));
        if let Some(it_type) = self.last_implicit_it_type
            && matches!(&object.kind, ExprKind::Variable(vref) if vref.name == "it")
        {
            tests.push(it_type);
        }

        let is_attribute = prop.attribute;
        for test in tests {
            let is_map_or_list =
                implements_interface_or_is_subclass_of(self.arena, test, TypeId::MAP)
                    || implements_interface_or_is_subclass_of(self.arena, test, TypeId::LIST);
            if is_map_or_list {
                // Dynamic map/list property sugar always succeeds.
                self.store_type(expr.id, TypeId::OBJECT);
                return Some(TypeId::OBJECT);
            }

            let mut current = Some(test);
            while let Some(ty) = current {
                let ty = self.arena.redirect(ty);
                let Some(class) = self.arena.class_of(ty) else {
                    break;
                };
                if let Some(found) = self.arena.property_declared(class, &prop.property) {
                    let found = found.ty;
                    self.store_type(expr.id, found);
                    return Some(found);
                }
                if !is_attribute
                    && let Some(field) = self.arena.field_declared(class, &prop.property)
                {
                    let found = field.ty;
                    self.store_type(expr.id, found);
                    return Some(found);
                }
                // Attribute access stops at the receiver class.
                current = if is_attribute {
                    None
                } else {
                    self.arena.class_def(class).superclass
                };
            }

            if check_for_read_only {
                let mut current = Some(test);
                while let Some(ty) = current {
                    let ty = self.arena.redirect(ty);
                    let Some(class) = self.arena.class_of(ty) else {
                        break;
                    };
                    if self.has_readonly_accessor(class, &prop.property) {
                        self.store_type(expr.id, TypeId::READONLY_PROPERTY);
                        return Some(TypeId::READONLY_PROPERTY);
                    }
                    if let Some(plugin) = self.plugin()
                        && let Some(found) =
                            plugin.resolve_property(self.arena, ty, &prop.property)
                    {
                        self.store_type(expr.id, found);
                        return Some(found);
                    }
                    current = if is_attribute {
                        None
                    } else {
                        self.arena.class_def(class).superclass
                    };
                }
            }
        }
        None
    }

    /// A zero-parameter non-void `getFoo`/`isFoo` declared on the class.
    fn has_readonly_accessor(&self, class: ClassId, property: &str) -> bool {
        let capitalized = capitalize(property);
        let getter = format!("get{capitalized}");
        let boolean_getter = format!("is{capitalized}");
        self.arena.class_def(class).methods.iter().any(|&m| {
            let def = self.arena.method(m);
            (def.name == getter || def.name == boolean_getter)
                && def.return_type != TypeId::VOID
                && def.params.is_empty()
        })
    }

    /// Receiver class reported when a property or method is missing: the
    /// single refined candidate when instanceof narrowed the receiver to
    /// exactly one type, the static type otherwise.
    pub(crate) fn find_current_instanceof_class(
        &mut self,
        object: &Expr,
        fallback: TypeId,
    ) -> TypeId {
        let candidates = self.temporary_types_for(object);
        if candidates.len() == 1 {
            return candidates[0];
        }
        fallback
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::capitalize;

    #[test]
    fn capitalizes_the_first_letter_only() {
        assert_eq!(capitalize("name"), "Name");
        assert_eq!(capitalize(""), "");
        assert_eq!(capitalize("x"), "X");
    }
}
