// plugin.rs
//! Capability interface extending the type checker's resolution.
//!
//! The host may provide a plugin per class; the checker consults it at fixed
//! fallback points, after its own strategies have failed. Returning `None`
//! from any hook defers to the next strategy and is never an error.

use quill_types::{ClassId, MethodId, TypeArena, TypeId};

/// Resolution hooks a host can contribute.
pub trait TypeCheckerPlugin {
    /// Type of an undeclared (dynamic) variable, or `None` to defer.
    fn resolve_dynamic_variable_type(&self, arena: &mut TypeArena, name: &str) -> Option<TypeId> {
        let _ = (arena, name);
        None
    }

    /// Type of a property on the receiver, or `None` to defer.
    fn resolve_property(
        &self,
        arena: &mut TypeArena,
        receiver: TypeId,
        name: &str,
    ) -> Option<TypeId> {
        let _ = (arena, receiver, name);
        None
    }

    /// Candidate methods for a call, or `None`/empty to defer.
    fn find_method(
        &self,
        arena: &mut TypeArena,
        receiver: TypeId,
        name: &str,
        args: &[TypeId],
    ) -> Option<Vec<MethodId>> {
        let _ = (arena, receiver, name, args);
        None
    }
}

/// Hands out the plugin applicable to a class, if any.
pub trait TypeCheckerPluginFactory {
    fn plugin_for(&self, class: ClassId) -> Option<&dyn TypeCheckerPlugin>;
}
