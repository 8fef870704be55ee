// numeric.rs
//
// Numeric categories, the wrapper tables and the widening/precision model.
// The category predicates follow the promotion rules of the language: the
// "int category" covers every type an int-typed operation accepts, and so on
// up the tower through long, BigInteger and BigDecimal.

use crate::arena::TypeArena;
use crate::compatibility::implements_interface_or_is_subclass_of;
use crate::type_id::TypeId;

/// Boxed companion of a primitive; identity for everything else.
pub fn wrap_type(id: TypeId) -> TypeId {
    match id {
        TypeId::BOOLEAN => TypeId::BOXED_BOOLEAN,
        TypeId::CHAR => TypeId::CHARACTER,
        TypeId::BYTE => TypeId::BOXED_BYTE,
        TypeId::SHORT => TypeId::BOXED_SHORT,
        TypeId::INT => TypeId::INTEGER,
        TypeId::LONG => TypeId::BOXED_LONG,
        TypeId::FLOAT => TypeId::BOXED_FLOAT,
        TypeId::DOUBLE => TypeId::BOXED_DOUBLE,
        TypeId::VOID => TypeId::BOXED_VOID,
        other => other,
    }
}

/// Primitive companion of a boxed type; identity for everything else.
pub fn unwrap_type(id: TypeId) -> TypeId {
    match id {
        TypeId::BOXED_BOOLEAN => TypeId::BOOLEAN,
        TypeId::CHARACTER => TypeId::CHAR,
        TypeId::BOXED_BYTE => TypeId::BYTE,
        TypeId::BOXED_SHORT => TypeId::SHORT,
        TypeId::INTEGER => TypeId::INT,
        TypeId::BOXED_LONG => TypeId::LONG,
        TypeId::BOXED_FLOAT => TypeId::FLOAT,
        TypeId::BOXED_DOUBLE => TypeId::DOUBLE,
        TypeId::BOXED_VOID => TypeId::VOID,
        other => other,
    }
}

/// byte, char, short and int.
pub fn is_int_category(id: TypeId) -> bool {
    matches!(
        id,
        TypeId::BYTE | TypeId::CHAR | TypeId::SHORT | TypeId::INT
    )
}

/// The int category plus long.
pub fn is_long_category(id: TypeId) -> bool {
    id == TypeId::LONG || is_int_category(id)
}

/// The long category plus BigInteger.
pub fn is_big_int_category(id: TypeId) -> bool {
    id == TypeId::BIG_INTEGER || is_long_category(id)
}

/// The BigInteger category plus BigDecimal.
pub fn is_big_dec_category(id: TypeId) -> bool {
    id == TypeId::BIG_DECIMAL || is_big_int_category(id)
}

pub fn is_float(id: TypeId) -> bool {
    id == TypeId::FLOAT
}

pub fn is_double(id: TypeId) -> bool {
    id == TypeId::DOUBLE
}

/// Floating-point types, primitive or boxed.
pub fn is_floating_category(id: TypeId) -> bool {
    matches!(
        id,
        TypeId::FLOAT | TypeId::DOUBLE | TypeId::BOXED_FLOAT | TypeId::BOXED_DOUBLE
    )
}

/// Anything the numeric promotion tables apply to: the primitive tower or a
/// Number subclass.
pub fn is_number_category(arena: &TypeArena, id: TypeId) -> bool {
    is_big_dec_category(id) || implements_interface_or_is_subclass_of(arena, id, TypeId::NUMBER)
}

/// Primitive numeric types and their boxed companions, plus the Number tower.
pub fn is_number_type(arena: &TypeArena, id: TypeId) -> bool {
    match id {
        TypeId::BYTE | TypeId::SHORT | TypeId::INT | TypeId::LONG | TypeId::FLOAT
        | TypeId::DOUBLE => true,
        _ => implements_interface_or_is_subclass_of(arena, id, TypeId::NUMBER),
    }
}

/// Result type for the additive/multiplicative group when at least one side
/// is outside the primitive fast path. Walks the widening lattice from the
/// big-number types down to char, preserving the boxed/primitive distinction
/// of the operands.
pub fn group_operation_result_type(a: TypeId, b: TypeId) -> TypeId {
    if is_big_int_category(a) && is_big_int_category(b) {
        return TypeId::BIG_INTEGER;
    }
    if is_big_dec_category(a) && is_big_dec_category(b) {
        return TypeId::BIG_DECIMAL;
    }
    if a == TypeId::BIG_DECIMAL || b == TypeId::BIG_DECIMAL {
        return TypeId::BIG_DECIMAL;
    }
    if a == TypeId::BIG_INTEGER || b == TypeId::BIG_INTEGER {
        if is_big_int_category(a) && is_big_int_category(b) {
            return TypeId::BIG_INTEGER;
        }
        return TypeId::BIG_DECIMAL;
    }
    for ty in [
        TypeId::DOUBLE,
        TypeId::BOXED_DOUBLE,
        TypeId::FLOAT,
        TypeId::BOXED_FLOAT,
        TypeId::LONG,
        TypeId::BOXED_LONG,
        TypeId::INT,
        TypeId::INTEGER,
        TypeId::SHORT,
        TypeId::BOXED_SHORT,
        TypeId::BYTE,
        TypeId::BOXED_BYTE,
        TypeId::CHAR,
        TypeId::CHARACTER,
    ] {
        if a == ty || b == ty {
            return ty;
        }
    }
    TypeId::NUMBER
}

/// Widening rank of a numeric type, wrapper-insensitive. A higher rank holds
/// values a lower rank cannot represent.
fn precision_rank(id: TypeId) -> Option<u8> {
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

/// True when assigning `right` into `left` may silently narrow the value.
pub fn check_possible_loss_of_precision(left: TypeId, right: TypeId) -> bool {
    match (precision_rank(left), precision_rank(right)) {
        (Some(l), Some(r)) => r > l,
        _ => false,
    }
}
