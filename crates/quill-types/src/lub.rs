// lub.rs
//
// Lowest upper bound: the most specific common ancestor of a set of types.

use crate::arena::TypeArena;
use crate::compatibility::implements_interface_or_is_subclass_of;
use crate::defs::GenericsArg;
use crate::numeric::{group_operation_result_type, is_number_category};
use crate::type_id::{ClassId, TypeId};

/// LUB of a list of types. An empty list joins to Object.
pub fn lowest_upper_bound(arena: &mut TypeArena, types: &[TypeId]) -> TypeId {
    let mut iter = types.iter().copied();
    let Some(first) = iter.next() else {
        return TypeId::OBJECT;
    };
    iter.fold(first, |acc, ty| lowest_upper_bound_pair(arena, acc, ty))
}

/// LUB of two types.
pub fn lowest_upper_bound_pair(arena: &mut TypeArena, a: TypeId, b: TypeId) -> TypeId {
    if a == b {
        return a;
    }
    // The null marker joins to the other side.
    if a.is_unknown_parameter() {
        return b;
    }
    if b.is_unknown_parameter() {
        return a;
    }
    if a.is_object() || b.is_object() {
        return TypeId::OBJECT;
    }
    if is_number_category(arena, a) && is_number_category(arena, b) {
        return group_operation_result_type(a, b);
    }
    if let (Some(ca), Some(cb)) = (arena.component_type(a), arena.component_type(b)) {
        let elem = lowest_upper_bound_pair(arena, ca, cb);
        return arena.array(elem);
    }
    // Same raw class with different parameterizations joins argumentwise.
    if let (Some(class_a), Some(class_b)) = (arena.class_of(a), arena.class_of(b))
        && class_a == class_b
    {
        return join_same_class(arena, class_a, a, b);
    }
    if implements_interface_or_is_subclass_of(arena, a, b) {
        return b;
    }
    if implements_interface_or_is_subclass_of(arena, b, a) {
        return a;
    }
    common_superclass(arena, a, b)
}

fn join_same_class(arena: &mut TypeArena, class: ClassId, a: TypeId, b: TypeId) -> TypeId {
    let args_a = arena.generics_of(a).to_vec();
    let args_b = arena.generics_of(b).to_vec();
    if args_a.len() != args_b.len() || args_a.is_empty() {
        return arena.raw(class);
    }
    let joined: Vec<GenericsArg> = args_a
        .iter()
        .zip(args_b.iter())
        .map(|(x, y)| GenericsArg::of(lowest_upper_bound_pair(arena, x.ty, y.ty)))
        .collect();
    arena.parameterized(class, joined)
}

fn common_superclass(arena: &mut TypeArena, a: TypeId, b: TypeId) -> TypeId {
    let mut ancestors = Vec::new();
    let mut current = Some(a);
    while let Some(ty) = current {
        if let Some(class) = arena.class_of(ty) {
            ancestors.push(class);
        }
        current = arena.superclass_of(ty);
    }
    let mut current = arena.superclass_of(b);
    while let Some(ty) = current {
        if let Some(class) = arena.class_of(ty)
            && ancestors.contains(&class)
        {
            return arena.raw(class);
        }
        current = arena.superclass_of(ty);
    }
    TypeId::OBJECT
}
