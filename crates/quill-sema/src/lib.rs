// quill-sema: the static type-checking core of the Quill compiler.
//
// Quill dispatches dynamically at runtime; this crate is the compile-time
// half of its optional static mode. The [`TypeChecker`] walks the resolved
// tree of one class, computes an inferred type for every expression,
// resolves call sites to concrete methods (overloads, varargs, auto-boxing,
// extension methods, plugins), refines types through instanceof checks, and
// annotates nodes for the bytecode generator. See [`TypeChecker::visit_class`]
// and [`TypeChecker::perform_second_pass`] for the entry points.

mod checker;
mod errors;
mod plugin;
pub mod return_adder;

pub use checker::TypeChecker;
pub use errors::{SemanticError, TypeError, STATIC_TYPE_PREFIX};
pub use plugin::{TypeCheckerPlugin, TypeCheckerPluginFactory};

#[cfg(test)]
mod tests;
