// arena.rs
//
// TypeArena: per-compilation type storage with interning, the well-known
// class universe, and compound type builders.

use rustc_hash::FxHashMap;

use crate::defs::{
    ClassDef, FieldDef, GenericsArg, GenericsArgs, MethodDef, ParamDef, PropertyDef, TypeDesc,
};
use crate::type_id::{ClassId, MethodId, TypeId};

/// Per-compilation type arena with automatic interning/deduplication.
///
/// Class definitions, concrete type references and method definitions all
/// live here and are referenced by small integer handles. The checker and the
/// class-file loader share one arena per compilation unit; the arena is not
/// thread-safe and is not meant to be shared across threads.
pub struct TypeArena {
    classes: Vec<ClassDef>,
    types: Vec<TypeDesc>,
    intern: FxHashMap<TypeDesc, TypeId>,
    methods: Vec<MethodDef>,
}

impl std::fmt::Debug for TypeArena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeArena")
            .field("classes", &self.classes.len())
            .field("types", &self.types.len())
            .field("methods", &self.methods.len())
            .finish_non_exhaustive()
    }
}

impl TypeArena {
    /// Create an arena with the well-known universe pre-registered.
    ///
    /// The reserved `TypeId`/`ClassId` constants are guaranteed to point at
    /// the corresponding entries; the debug asserts below verify the indices
    /// stay in sync with the constants.
    pub fn new() -> Self {
        let mut arena = Self {
            classes: Vec::new(),
            types: Vec::new(),
            intern: FxHashMap::default(),
            methods: Vec::new(),
        };

        let class = |arena: &mut Self, def: ClassDef, expect: ClassId| {
            let id = arena.register_class(def);
            debug_assert_eq!(id, expect);
        };

        let object = ClassDef {
            superclass: None,
            ..ClassDef::new("Object")
        };
        class(&mut arena, object, ClassId::OBJECT);

        let primitive = |name: &str| ClassDef {
            primitive: true,
            superclass: None,
            ..ClassDef::new(name)
        };
        class(&mut arena, primitive("boolean"), ClassId::BOOLEAN);
        class(&mut arena, primitive("char"), ClassId::CHAR);
        class(&mut arena, primitive("byte"), ClassId::BYTE);
        class(&mut arena, primitive("short"), ClassId::SHORT);
        class(&mut arena, primitive("int"), ClassId::INT);
        class(&mut arena, primitive("long"), ClassId::LONG);
        class(&mut arena, primitive("float"), ClassId::FLOAT);
        class(&mut arena, primitive("double"), ClassId::DOUBLE);
        class(&mut arena, primitive("void"), ClassId::VOID);

        class(&mut arena, ClassDef::new("Boolean"), ClassId::BOXED_BOOLEAN);
        class(&mut arena, ClassDef::new("Character"), ClassId::CHARACTER);
        // The numeric wrappers extend Number; Number itself is registered
        // later, so the superclass is patched in below.
        class(&mut arena, ClassDef::new("Byte"), ClassId::BOXED_BYTE);
        class(&mut arena, ClassDef::new("Short"), ClassId::BOXED_SHORT);
        class(&mut arena, ClassDef::new("Integer"), ClassId::INTEGER);
        class(&mut arena, ClassDef::new("Long"), ClassId::BOXED_LONG);
        class(&mut arena, ClassDef::new("Float"), ClassId::BOXED_FLOAT);
        class(&mut arena, ClassDef::new("Double"), ClassId::BOXED_DOUBLE);
        class(&mut arena, ClassDef::new("Void"), ClassId::BOXED_VOID);

        class(&mut arena, ClassDef::new("Number"), ClassId::NUMBER);
        class(&mut arena, ClassDef::new("BigInteger"), ClassId::BIG_INTEGER);
        class(&mut arena, ClassDef::new("BigDecimal"), ClassId::BIG_DECIMAL);
        class(&mut arena, ClassDef::new("String"), ClassId::STRING);
        class(&mut arena, ClassDef::new("GString"), ClassId::GSTRING);

        class(&mut arena, ClassDef::interface("Comparable"), ClassId::COMPARABLE);
        class(&mut arena, ClassDef::interface("Iterable"), ClassId::ITERABLE);
        class(&mut arena, ClassDef::interface("Collection"), ClassId::COLLECTION);
        class(&mut arena, ClassDef::interface("List"), ClassId::LIST);
        class(&mut arena, ClassDef::new("ArrayList"), ClassId::ARRAY_LIST);
        class(&mut arena, ClassDef::interface("Map"), ClassId::MAP);
        class(&mut arena, ClassDef::interface("Range"), ClassId::RANGE);

        class(&mut arena, ClassDef::new("Closure"), ClassId::CLOSURE);
        class(&mut arena, ClassDef::new("Pattern"), ClassId::PATTERN);
        class(&mut arena, ClassDef::new("Matcher"), ClassId::MATCHER);
        class(&mut arena, ClassDef::new("Class"), ClassId::CLASS);

        class(&mut arena, ClassDef::new("<readonly>"), ClassId::READONLY_PROPERTY);
        class(
            &mut arena,
            ClassDef::new("<unknown parameter type>"),
            ClassId::UNKNOWN_PARAMETER,
        );

        // Intern the raw reference of every reserved class, in class order,
        // so the TypeId constants line up with the ClassId constants.
        for idx in 0..arena.classes.len() as u32 {
            let tid = arena.raw(ClassId::from_raw(idx));
            debug_assert_eq!(tid.index(), idx);
        }

        arena.wire_well_known_hierarchy();
        arena
    }

    /// Hierarchy, generics and members of the pre-registered universe.
    fn wire_well_known_hierarchy(&mut self) {
        let number = TypeId::NUMBER;
        let comparable = TypeId::COMPARABLE;

        for id in [
            ClassId::BOXED_BYTE,
            ClassId::BOXED_SHORT,
            ClassId::INTEGER,
            ClassId::BOXED_LONG,
            ClassId::BOXED_FLOAT,
            ClassId::BOXED_DOUBLE,
            ClassId::BIG_INTEGER,
            ClassId::BIG_DECIMAL,
        ] {
            let def = self.class_def_mut(id);
            def.superclass = Some(number);
            def.interfaces.push(comparable);
        }
        for id in [
            ClassId::BOXED_BOOLEAN,
            ClassId::CHARACTER,
            ClassId::STRING,
        ] {
            self.class_def_mut(id).interfaces.push(comparable);
        }

        // Generic placeholders for the collection types.
        let elem = self.placeholder("E");
        let key = self.placeholder("K");
        let value = self.placeholder("V");
        let elem_param = GenericsArg::placeholder("E", elem);
        let key_param = GenericsArg::placeholder("K", key);
        let value_param = GenericsArg::placeholder("V", value);

        self.class_def_mut(ClassId::ITERABLE).generic_params = vec![elem_param.clone()];
        self.class_def_mut(ClassId::COLLECTION).generic_params = vec![elem_param.clone()];
        self.class_def_mut(ClassId::LIST).generic_params = vec![elem_param.clone()];
        self.class_def_mut(ClassId::ARRAY_LIST).generic_params = vec![elem_param.clone()];
        self.class_def_mut(ClassId::RANGE).generic_params = vec![elem_param.clone()];
        self.class_def_mut(ClassId::MAP).generic_params = vec![key_param, value_param];
        self.class_def_mut(ClassId::CLOSURE).generic_params =
            vec![GenericsArg::placeholder("V", value)];

        let iterable_e = self.parameterized(ClassId::ITERABLE, [elem_param.clone()]);
        let collection_e = self.parameterized(ClassId::COLLECTION, [elem_param.clone()]);
        let list_e = self.parameterized(ClassId::LIST, [elem_param.clone()]);
        self.class_def_mut(ClassId::COLLECTION).interfaces = vec![iterable_e];
        self.class_def_mut(ClassId::LIST).interfaces = vec![collection_e];
        self.class_def_mut(ClassId::ARRAY_LIST).interfaces = vec![list_e];
        self.class_def_mut(ClassId::RANGE).interfaces = vec![list_e];

        // Closure#call(Object...): the one method the checker relies on from
        // the runtime support types.
        let object_varargs = self.array(TypeId::OBJECT);
        self.add_method(MethodDef::new(
            ClassId::CLOSURE,
            "call",
            vec![ParamDef::new("args", object_varargs)],
            TypeId::OBJECT,
        ));
    }

    // ========================================================================
    // Classes and members
    // ========================================================================

    /// Register a class definition, returning its handle.
    pub fn register_class(&mut self, def: ClassDef) -> ClassId {
        let id = ClassId::from_raw(self.classes.len() as u32);
        self.classes.push(def);
        id
    }

    pub fn class_def(&self, id: ClassId) -> &ClassDef {
        &self.classes[id.index() as usize]
    }

    pub fn class_def_mut(&mut self, id: ClassId) -> &mut ClassDef {
        &mut self.classes[id.index() as usize]
    }

    /// Register a method and wire it into its declaring class. Methods named
    /// `<init>` land in the constructor list.
    pub fn add_method(&mut self, def: MethodDef) -> MethodId {
        let id = MethodId::from_raw(self.methods.len() as u32);
        let class = def.declaring_class;
        let ctor = def.is_constructor();
        self.methods.push(def);
        let class_def = self.class_def_mut(class);
        if ctor {
            class_def.constructors.push(id);
        } else {
            class_def.methods.push(id);
        }
        id
    }

    /// Register a method without attaching it to its declaring class's member
    /// lists. Extension methods and resolver-synthesized methods use this: they
    /// carry a declaring class for diagnostics but are not declared members.
    pub fn add_detached_method(&mut self, def: MethodDef) -> MethodId {
        let id = MethodId::from_raw(self.methods.len() as u32);
        self.methods.push(def);
        id
    }

    pub fn method(&self, id: MethodId) -> &MethodDef {
        &self.methods[id.index() as usize]
    }

    /// True when the method's last parameter is an array, making it eligible
    /// for vararg folding.
    pub fn method_is_vararg(&self, id: MethodId) -> bool {
        self.method(id)
            .params
            .last()
            .is_some_and(|p| matches!(self.desc(p.ty), TypeDesc::Array { .. }))
    }

    pub fn add_property(&mut self, class: ClassId, name: impl Into<String>, ty: TypeId) {
        self.class_def_mut(class)
            .properties
            .push(PropertyDef { name: name.into(), ty });
    }

    pub fn add_field(&mut self, class: ClassId, name: impl Into<String>, ty: TypeId) {
        self.class_def_mut(class)
            .fields
            .push(FieldDef { name: name.into(), ty });
    }

    // ========================================================================
    // Type references
    // ========================================================================

    fn intern(&mut self, desc: TypeDesc) -> TypeId {
        if let Some(&id) = self.intern.get(&desc) {
            return id;
        }
        let id = TypeId::from_raw(self.types.len() as u32);
        self.types.push(desc.clone());
        self.intern.insert(desc, id);
        id
    }

    pub fn desc(&self, id: TypeId) -> &TypeDesc {
        &self.types[id.index() as usize]
    }

    /// The raw (unparameterized) reference of a class.
    pub fn raw(&mut self, class: ClassId) -> TypeId {
        self.intern(TypeDesc::Class {
            class,
            args: GenericsArgs::new(),
        })
    }

    /// A parameterized class reference.
    pub fn parameterized(
        &mut self,
        class: ClassId,
        args: impl IntoIterator<Item = GenericsArg>,
    ) -> TypeId {
        let args: GenericsArgs = args.into_iter().collect();
        if args.is_empty() {
            return self.raw(class);
        }
        self.intern(TypeDesc::Class { class, args })
    }

    pub fn array(&mut self, elem: TypeId) -> TypeId {
        self.intern(TypeDesc::Array { elem })
    }

    pub fn placeholder(&mut self, name: impl Into<String>) -> TypeId {
        self.intern(TypeDesc::Placeholder { name: name.into() })
    }

    /// Canonical resolved form: parameterized references redirect to their raw
    /// class, everything else to itself.
    pub fn redirect(&mut self, id: TypeId) -> TypeId {
        match self.desc(id) {
            TypeDesc::Class { class, args } if !args.is_empty() => {
                let class = *class;
                self.raw(class)
            }
            _ => id,
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn class_of(&self, id: TypeId) -> Option<ClassId> {
        match self.desc(id) {
            TypeDesc::Class { class, .. } => Some(*class),
            _ => None,
        }
    }

    pub fn is_primitive(&self, id: TypeId) -> bool {
        self.class_of(id)
            .is_some_and(|c| self.class_def(c).primitive)
    }

    pub fn is_interface(&self, id: TypeId) -> bool {
        self.class_of(id)
            .is_some_and(|c| self.class_def(c).is_interface)
    }

    pub fn is_enum(&self, id: TypeId) -> bool {
        self.class_of(id).is_some_and(|c| self.class_def(c).is_enum)
    }

    pub fn is_array(&self, id: TypeId) -> bool {
        matches!(self.desc(id), TypeDesc::Array { .. })
    }

    /// Component type of an array reference.
    pub fn component_type(&self, id: TypeId) -> Option<TypeId> {
        match self.desc(id) {
            TypeDesc::Array { elem } => Some(*elem),
            _ => None,
        }
    }

    /// Bound generic arguments of a class reference (empty for raw types).
    pub fn generics_of(&self, id: TypeId) -> &[GenericsArg] {
        match self.desc(id) {
            TypeDesc::Class { args, .. } => args,
            _ => &[],
        }
    }

    /// A reference "uses generics" when it carries bound arguments.
    pub fn uses_generics(&self, id: TypeId) -> bool {
        !self.generics_of(id).is_empty()
    }

    /// True when the type tree contains a placeholder or wildcard anywhere.
    pub fn contains_placeholder(&self, id: TypeId) -> bool {
        match self.desc(id) {
            TypeDesc::Placeholder { .. } => true,
            TypeDesc::Array { elem } => self.contains_placeholder(*elem),
            TypeDesc::Class { args, .. } => args
                .iter()
                .any(|a| a.placeholder || a.wildcard || self.contains_placeholder(a.ty)),
        }
    }

    /// Superclass reference of a type: declared superclass for classes,
    /// Object for arrays and placeholders, none at the root.
    pub fn superclass_of(&self, id: TypeId) -> Option<TypeId> {
        match self.desc(id) {
            TypeDesc::Class { class, .. } => self.class_def(*class).superclass,
            TypeDesc::Array { .. } | TypeDesc::Placeholder { .. } => Some(TypeId::OBJECT),
        }
    }

    /// All methods with the given name visible on the receiver, own class
    /// first, then superclasses, then interfaces.
    pub fn methods_named(&self, receiver: TypeId, name: &str) -> Vec<MethodId> {
        let mut out = Vec::new();
        let mut seen = Vec::new();
        let mut stack = vec![receiver];
        while let Some(ty) = stack.pop() {
            let Some(class) = self.class_of(ty) else { continue };
            if seen.contains(&class) {
                continue;
            }
            seen.push(class);
            let def = self.class_def(class);
            for &m in &def.methods {
                if self.method(m).name == name {
                    out.push(m);
                }
            }
            if let Some(sup) = def.superclass {
                stack.push(sup);
            }
            for &iface in &def.interfaces {
                stack.push(iface);
            }
        }
        out
    }

    /// Declared constructors of the receiver class (no inheritance).
    pub fn constructors_of(&self, receiver: TypeId) -> Vec<MethodId> {
        self.class_of(receiver)
            .map(|c| self.class_def(c).constructors.clone())
            .unwrap_or_default()
    }

    /// A property declared directly on the class.
    pub fn property_declared(&self, class: ClassId, name: &str) -> Option<&PropertyDef> {
        self.class_def(class).properties.iter().find(|p| p.name == name)
    }

    /// A field declared directly on the class.
    pub fn field_declared(&self, class: ClassId, name: &str) -> Option<&FieldDef> {
        self.class_def(class).fields.iter().find(|f| f.name == name)
    }

    /// Property lookup along the superclass chain.
    pub fn find_property(&self, receiver: TypeId, name: &str) -> Option<&PropertyDef> {
        let mut current = Some(receiver);
        while let Some(ty) = current {
            let class = self.class_of(ty)?;
            if let Some(p) = self.property_declared(class, name) {
                return Some(p);
            }
            current = self.class_def(class).superclass;
        }
        None
    }
}

impl Default for TypeArena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_constants_line_up() {
        let mut arena = TypeArena::new();
        assert_eq!(arena.raw(ClassId::OBJECT), TypeId::OBJECT);
        assert_eq!(arena.raw(ClassId::INTEGER), TypeId::INTEGER);
        assert_eq!(arena.raw(ClassId::UNKNOWN_PARAMETER), TypeId::UNKNOWN_PARAMETER);
        assert_eq!(arena.class_def(ClassId::INT).name, "int");
        assert!(arena.class_def(ClassId::INT).primitive);
        assert!(arena.class_def(ClassId::LIST).is_interface);
    }

    #[test]
    fn interning_deduplicates() {
        let mut arena = TypeArena::new();
        let a = arena.array(TypeId::STRING);
        let b = arena.array(TypeId::STRING);
        assert_eq!(a, b);
        let p = arena.parameterized(ClassId::LIST, [GenericsArg::of(TypeId::STRING)]);
        let q = arena.parameterized(ClassId::LIST, [GenericsArg::of(TypeId::STRING)]);
        assert_eq!(p, q);
        assert_ne!(p, arena.raw(ClassId::LIST));
    }

    #[test]
    fn redirect_of_parameterized_is_raw() {
        let mut arena = TypeArena::new();
        let p = arena.parameterized(ClassId::LIST, [GenericsArg::of(TypeId::STRING)]);
        assert_eq!(arena.redirect(p), TypeId::LIST);
        assert_eq!(arena.redirect(TypeId::LIST), TypeId::LIST);
    }

    #[test]
    fn closure_has_call_method() {
        let arena = TypeArena::new();
        let methods = arena.methods_named(TypeId::CLOSURE, "call");
        assert_eq!(methods.len(), 1);
        assert!(arena.method_is_vararg(methods[0]));
    }

    #[test]
    fn methods_named_walks_hierarchy() {
        let mut arena = TypeArena::new();
        let base = arena.register_class(ClassDef::new("Base"));
        let base_ty = arena.raw(base);
        let derived = arena.register_class(ClassDef {
            superclass: Some(base_ty),
            ..ClassDef::new("Derived")
        });
        let derived_ty = arena.raw(derived);
        arena.add_method(MethodDef::new(base, "greet", vec![], TypeId::STRING));
        assert_eq!(arena.methods_named(derived_ty, "greet").len(), 1);
    }
}
