// quill-types: the type lattice consumed by the static type checker.
//
// Everything a checker needs to reason about Quill types lives here: the
// interned type arena (class definitions and concrete types behind small
// integer handles), numeric categories and widening, assignability, lowest
// upper bounds, generics alignment, and the extension-method registry.

mod arena;
mod compatibility;
mod defs;
mod display;
mod extensions;
mod generics;
mod lub;
mod numeric;
mod type_id;

pub use arena::TypeArena;
pub use compatibility::{
    check_compatible_assignment_types, generics_compatible_with, implements_interface_or_is_subclass_of,
    is_assignable_to,
};
pub use defs::{ClassDef, FieldDef, GenericsArg, GenericsArgs, MethodDef, ParamDef, PropertyDef, TypeDesc};
pub use display::{method_parameters_string, type_display, types_list_display};
pub use extensions::ExtensionRegistry;
pub use generics::{align_generic_types, extract_placeholders, parameterize_supertype, substitute};
pub use lub::{lowest_upper_bound, lowest_upper_bound_pair};
pub use numeric::{
    check_possible_loss_of_precision, group_operation_result_type, is_big_dec_category,
    is_big_int_category, is_double, is_float, is_floating_category, is_int_category,
    is_long_category, is_number_category, is_number_type, unwrap_type, wrap_type,
};
pub use type_id::{ClassId, MethodId, TypeId};
