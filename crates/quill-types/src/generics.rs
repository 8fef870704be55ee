// generics.rs
//
// Placeholder extraction, alignment and substitution. These are the raw
// operations the checker's generics engine builds on; none of them report
// errors, they only compute.

use rustc_hash::FxHashMap;

use crate::arena::TypeArena;
use crate::defs::{GenericsArg, GenericsArgs, TypeDesc};
use crate::type_id::{ClassId, TypeId};

/// Collect declared-placeholder-name -> bound-argument pairs from a type
/// tree. First binding wins, matching the resolution order of the engine
/// (receiver bindings are collected before signature bindings).
pub fn extract_placeholders(
    arena: &TypeArena,
    ty: TypeId,
    map: &mut FxHashMap<String, GenericsArg>,
) {
    match arena.desc(ty) {
        TypeDesc::Array { elem } => extract_placeholders(arena, *elem, map),
        TypeDesc::Placeholder { .. } => {}
        TypeDesc::Class { class, args } => {
            if args.is_empty() {
                return;
            }
            let args = args.clone();
            let params = arena.class_def(*class).generic_params.clone();
            for (param, arg) in params.iter().zip(args.iter()) {
                if let Some(name) = &param.name
                    && !map.contains_key(name)
                {
                    map.insert(name.clone(), arg.clone());
                }
            }
            for arg in &args {
                extract_placeholders(arena, arg.ty, map);
            }
        }
    }
}

/// Substitute placeholders by name throughout a type tree.
pub fn substitute(
    arena: &mut TypeArena,
    ty: TypeId,
    bindings: &FxHashMap<String, GenericsArg>,
) -> TypeId {
    match arena.desc(ty).clone() {
        TypeDesc::Placeholder { name } => bindings.get(&name).map(|b| b.ty).unwrap_or(ty),
        TypeDesc::Array { elem } => {
            let elem = substitute(arena, elem, bindings);
            arena.array(elem)
        }
        TypeDesc::Class { class, args } => {
            if args.is_empty() {
                return ty;
            }
            let new_args: GenericsArgs = args
                .iter()
                .map(|a| {
                    if (a.placeholder || a.wildcard)
                        && let Some(name) = &a.name
                        && let Some(bound) = bindings.get(name)
                    {
                        bound.clone()
                    } else {
                        GenericsArg {
                            ty: substitute(arena, a.ty, bindings),
                            ..a.clone()
                        }
                    }
                })
                .collect();
            arena.parameterized(class, new_args)
        }
    }
}

/// Align a parameter's in-signature generics against a receiver's bound
/// arguments. `redirect_generics` are the receiver class's declared
/// placeholders, `receiver_args` the bound arguments at the call site (may be
/// the placeholders themselves for a raw receiver), and `alignment` the
/// generics appearing on the parameter type.
pub fn align_generic_types(
    redirect_generics: &[GenericsArg],
    receiver_args: &[GenericsArg],
    alignment: &[GenericsArg],
) -> Vec<GenericsArg> {
    let receiver_args = if receiver_args.is_empty() {
        redirect_generics
    } else {
        receiver_args
    };
    alignment
        .iter()
        .map(|a| {
            if a.placeholder || a.wildcard {
                if let Some(name) = &a.name
                    && let Some(idx) = redirect_generics
                        .iter()
                        .position(|d| d.name.as_deref() == Some(name))
                    && let Some(bound) = receiver_args.get(idx)
                {
                    return bound.clone();
                }
            }
            a.clone()
        })
        .collect()
}

/// View `actual` as a (possibly parameterized) reference of `target`,
/// following the superclass/interface chain and substituting generic
/// arguments along the way. Returns `None` when `actual` is not derived from
/// `target`.
pub fn parameterize_supertype(
    arena: &mut TypeArena,
    actual: TypeId,
    target: ClassId,
) -> Option<TypeId> {
    let class = arena.class_of(actual)?;
    if class == target {
        return Some(actual);
    }
    let def = arena.class_def(class).clone();
    let args = arena.generics_of(actual).to_vec();
    let mut bindings = FxHashMap::default();
    for (i, param) in def.generic_params.iter().enumerate() {
        if let Some(name) = &param.name {
            let bound = args.get(i).cloned().unwrap_or_else(|| param.clone());
            bindings.insert(name.clone(), bound);
        }
    }
    let supers = def
        .superclass
        .into_iter()
        .chain(def.interfaces.iter().copied());
    for sup in supers {
        let sup = substitute(arena, sup, &bindings);
        if let Some(found) = parameterize_supertype(arena, sup, target) {
            return Some(found);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_receiver_bindings() {
        let mut arena = TypeArena::new();
        let list_string = arena.parameterized(ClassId::LIST, [GenericsArg::of(TypeId::STRING)]);
        let mut map = FxHashMap::default();
        extract_placeholders(&arena, list_string, &mut map);
        assert_eq!(map.get("E").map(|g| g.ty), Some(TypeId::STRING));
    }

    #[test]
    fn parameterizes_interface_through_the_hierarchy() {
        let mut arena = TypeArena::new();
        let array_list_int =
            arena.parameterized(ClassId::ARRAY_LIST, [GenericsArg::of(TypeId::INTEGER)]);
        let view = parameterize_supertype(&mut arena, array_list_int, ClassId::ITERABLE).unwrap();
        assert_eq!(arena.class_of(view), Some(ClassId::ITERABLE));
        assert_eq!(arena.generics_of(view)[0].ty, TypeId::INTEGER);
    }

    #[test]
    fn alignment_resolves_placeholders_positionally() {
        let mut arena = TypeArena::new();
        let e = arena.placeholder("E");
        let decl = vec![GenericsArg::placeholder("E", e)];
        let bound = vec![GenericsArg::of(TypeId::STRING)];
        let aligned = align_generic_types(&decl, &bound, &[GenericsArg::placeholder("E", e)]);
        assert_eq!(aligned[0].ty, TypeId::STRING);
    }
}
