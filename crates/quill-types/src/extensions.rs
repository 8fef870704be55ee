// extensions.rs
//
// Extension-method registry: statically-registered pseudo-methods attached to
// existing receiver types by external registration (the runtime's default
// method set, loaded by the compilation driver).

use rustc_hash::FxHashMap;

use crate::arena::TypeArena;
use crate::type_id::{ClassId, MethodId, TypeId};

/// Registry of extension methods keyed by receiver class and name.
///
/// Lookup walks the receiver's hierarchy so an extension registered on
/// `Collection` is found on `ArrayList` receivers too.
#[derive(Default, Debug)]
pub struct ExtensionRegistry {
    methods: FxHashMap<(ClassId, String), Vec<MethodId>>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an extension method to a receiver class.
    pub fn register(&mut self, receiver: ClassId, name: impl Into<String>, method: MethodId) {
        self.methods
            .entry((receiver, name.into()))
            .or_default()
            .push(method);
    }

    /// All extension methods with the given name applicable to the receiver,
    /// nearest registration first.
    pub fn find(&self, arena: &TypeArena, receiver: TypeId, name: &str) -> Vec<MethodId> {
        let mut out = Vec::new();
        let mut seen = Vec::new();
        let mut stack = vec![receiver];
        while let Some(ty) = stack.pop() {
            let Some(class) = arena.class_of(ty) else {
                continue;
            };
            if seen.contains(&class) {
                continue;
            }
            seen.push(class);
            if let Some(found) = self.methods.get(&(class, name.to_string())) {
                out.extend(found.iter().copied());
            }
            let def = arena.class_def(class);
            if let Some(sup) = def.superclass {
                stack.push(sup);
            }
            stack.extend(def.interfaces.iter().copied());
        }
        out
    }
}
