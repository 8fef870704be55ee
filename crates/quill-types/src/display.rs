// display.rs
//
// Rendering of types and signatures for diagnostics. The output format is
// part of the stable error-message interface, so changes here are breaking.

use crate::arena::TypeArena;
use crate::defs::TypeDesc;
use crate::type_id::TypeId;

/// Short display form: `Integer`, `List<String>`, `int[]`, `E`.
pub fn type_display(arena: &TypeArena, ty: TypeId) -> String {
    match arena.desc(ty) {
        TypeDesc::Placeholder { name } => name.clone(),
        TypeDesc::Array { elem } => format!("{}[]", type_display(arena, *elem)),
        TypeDesc::Class { class, args } => {
            let name = &arena.class_def(*class).name;
            if args.is_empty() {
                return name.clone();
            }
            let rendered: Vec<String> = args
                .iter()
                .map(|a| {
                    if a.wildcard {
                        match &a.name {
                            Some(n) => format!("? extends {n}"),
                            None => "?".to_string(),
                        }
                    } else if a.placeholder {
                        a.name.clone().unwrap_or_else(|| type_display(arena, a.ty))
                    } else {
                        type_display(arena, a.ty)
                    }
                })
                .collect();
            format!("{}<{}>", name, rendered.join(", "))
        }
    }
}

/// `name(TypeA, TypeB)` as it appears in resolution errors.
pub fn method_parameters_string(arena: &TypeArena, name: &str, args: &[TypeId]) -> String {
    let rendered: Vec<String> = args.iter().map(|&a| type_display(arena, a)).collect();
    format!("{}({})", name, rendered.join(", "))
}

/// `[TypeA, TypeB]` as it appears in argument-list errors.
pub fn types_list_display(arena: &TypeArena, args: &[TypeId]) -> String {
    let rendered: Vec<String> = args.iter().map(|&a| type_display(arena, a)).collect();
    format!("[{}]", rendered.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defs::GenericsArg;
    use crate::type_id::ClassId;

    #[test]
    fn displays_generics_and_arrays() {
        let mut arena = TypeArena::new();
        let list_string = arena.parameterized(ClassId::LIST, [GenericsArg::of(TypeId::STRING)]);
        assert_eq!(type_display(&arena, list_string), "List<String>");
        let ints = arena.array(TypeId::INT);
        assert_eq!(type_display(&arena, ints), "int[]");
        assert_eq!(
            method_parameters_string(&arena, "plus", &[TypeId::INTEGER, TypeId::STRING]),
            "plus(Integer, String)"
        );
    }
}
