// compatibility.rs
//
// Assignability and assignment compatibility. These are the type-level rules
// only; the structural assignment forms (list/map literals standing in for
// constructor calls) are the checker's business.

use crate::arena::TypeArena;
use crate::generics::parameterize_supertype;
use crate::numeric::{is_number_type, unwrap_type, wrap_type};
use crate::type_id::TypeId;

/// Raw-class-level subtype test: same class, a superclass walk, or an
/// implemented interface anywhere in the hierarchy. Generic arguments are
/// ignored here.
pub fn implements_interface_or_is_subclass_of(
    arena: &TypeArena,
    ty: TypeId,
    target: TypeId,
) -> bool {
    if ty == target {
        return true;
    }
    if let (Some(a), Some(b)) = (arena.component_type(ty), arena.component_type(target)) {
        return implements_interface_or_is_subclass_of(arena, a, b);
    }
    if target.is_object() {
        return !arena.is_primitive(ty);
    }
    let Some(target_class) = arena.class_of(target) else {
        return false;
    };
    let mut seen = Vec::new();
    let mut stack = vec![ty];
    while let Some(current) = stack.pop() {
        let Some(class) = arena.class_of(current) else {
            continue;
        };
        if class == target_class {
            return true;
        }
        if seen.contains(&class) {
            continue;
        }
        seen.push(class);
        let def = arena.class_def(class);
        if let Some(sup) = def.superclass {
            stack.push(sup);
        }
        stack.extend(def.interfaces.iter().copied());
    }
    false
}

/// Widening rank comparison for the numeric tower, wrapper-insensitive.
fn numeric_widens_to(from: TypeId, to: TypeId) -> bool {
    fn rank(id: TypeId) -> Option<u8> {
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
    matches!((rank(from), rank(to)), (Some(f), Some(t)) if f <= t)
}

/// Whether a value of type `ty` can be used where `to` is expected, under the
/// language's cast-free conversions: identity, boxing, numeric widening,
/// GString-to-String, array covariance and subtyping.
pub fn is_assignable_to(arena: &TypeArena, ty: TypeId, to: TypeId) -> bool {
    if ty == to {
        return true;
    }
    if to.is_object() {
        return true;
    }
    if ty.is_unknown_parameter() {
        return !arena.is_primitive(to);
    }
    if wrap_type(ty) == to || ty == wrap_type(to) {
        return true;
    }
    if is_number_type(arena, ty) && is_number_type(arena, to) {
        return numeric_widens_to(ty, to);
    }
    if ty == TypeId::GSTRING && to == TypeId::STRING {
        return true;
    }
    if let (Some(a), Some(b)) = (arena.component_type(ty), arena.component_type(to)) {
        return is_assignable_to(arena, a, b);
    }
    implements_interface_or_is_subclass_of(arena, ty, to)
}

/// Assignment compatibility for `left = right`.
///
/// Everything a cast-free conversion can do is allowed, plus the permissive
/// rules of the source language: any number assigns to any number (a possible
/// precision loss is reported separately), and null assigns to any reference
/// type. `rhs_null_constant` flags a literal null on the right-hand side.
pub fn check_compatible_assignment_types(
    arena: &TypeArena,
    left: TypeId,
    right: TypeId,
    rhs_null_constant: bool,
) -> bool {
    if left.is_object() || arena.class_of(left) == Some(crate::type_id::ClassId::OBJECT) {
        return true;
    }
    if rhs_null_constant || right.is_unknown_parameter() {
        return !arena.is_primitive(left);
    }
    if is_number_type(arena, left) && is_number_type(arena, right) {
        return true;
    }
    if let (Some(l), Some(r)) = (arena.component_type(left), arena.component_type(right)) {
        return check_compatible_assignment_types(arena, l, r, false);
    }
    is_assignable_to(arena, right, left)
}

/// Generic-argument compatibility of `right` against the wildcarded form of
/// `left` (which must be a parameterized reference). A raw right side is
/// accepted unchecked; a parameterized right side must bind each of the
/// left's arguments to an assignable type.
pub fn generics_compatible_with(arena: &mut TypeArena, left: TypeId, right: TypeId) -> bool {
    let Some(left_class) = arena.class_of(left) else {
        return true;
    };
    let left_args = arena.generics_of(left).to_vec();
    let Some(right_view) = parameterize_supertype(arena, right, left_class) else {
        return true;
    };
    let right_args = arena.generics_of(right_view).to_vec();
    if right_args.is_empty() {
        return true;
    }
    if right_args.len() != left_args.len() {
        return false;
    }
    left_args.iter().zip(right_args.iter()).all(|(la, ra)| {
        la.placeholder || la.wildcard || ra.placeholder || is_assignable_to(arena, ra.ty, la.ty)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defs::GenericsArg;
    use crate::type_id::ClassId;

    #[test]
    fn subclass_walk_crosses_interfaces() {
        let arena = TypeArena::new();
        assert!(implements_interface_or_is_subclass_of(
            &arena,
            TypeId::ARRAY_LIST,
            TypeId::ITERABLE
        ));
        assert!(implements_interface_or_is_subclass_of(
            &arena,
            TypeId::INTEGER,
            TypeId::NUMBER
        ));
        assert!(!implements_interface_or_is_subclass_of(
            &arena,
            TypeId::STRING,
            TypeId::NUMBER
        ));
    }

    #[test]
    fn null_assigns_to_references_only() {
        let arena = TypeArena::new();
        assert!(is_assignable_to(&arena, TypeId::UNKNOWN_PARAMETER, TypeId::STRING));
        assert!(!is_assignable_to(&arena, TypeId::UNKNOWN_PARAMETER, TypeId::INT));
    }

    #[test]
    fn numbers_are_mutually_assignment_compatible() {
        let arena = TypeArena::new();
        assert!(check_compatible_assignment_types(
            &arena,
            TypeId::INTEGER,
            TypeId::BOXED_LONG,
            false
        ));
        assert!(!check_compatible_assignment_types(
            &arena,
            TypeId::STRING,
            TypeId::INTEGER,
            false
        ));
    }

    #[test]
    fn wildcard_generics_accept_derived_arguments_only() {
        let mut arena = TypeArena::new();
        let list_string = arena.parameterized(ClassId::LIST, [GenericsArg::of(TypeId::STRING)]);
        let list_object = arena.parameterized(ClassId::LIST, [GenericsArg::of(TypeId::OBJECT)]);
        assert!(!generics_compatible_with(&mut arena, list_string, list_object));
        assert!(generics_compatible_with(&mut arena, list_object, list_string));
        assert!(generics_compatible_with(&mut arena, list_string, TypeId::LIST));
    }
}
