// defs.rs
//
// Class, member and type descriptors stored in the arena.

use smallvec::SmallVec;

use crate::type_id::{ClassId, MethodId, TypeId};

/// Generic argument lists are short; two covers List<E> and Map<K, V>.
pub type GenericsArgs = SmallVec<[GenericsArg; 2]>;

/// A generic argument or placeholder declaration.
///
/// On a class definition, `generic_params` entries are placeholder
/// declarations (`placeholder = true`, `name = Some`). On a concrete type
/// reference, entries are the bound arguments; a bound argument may itself be
/// a placeholder when the reference appears inside a generic signature.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct GenericsArg {
    pub ty: TypeId,
    pub name: Option<String>,
    pub placeholder: bool,
    pub wildcard: bool,
}

impl GenericsArg {
    /// A plain bound argument.
    pub fn of(ty: TypeId) -> Self {
        Self {
            ty,
            name: None,
            placeholder: false,
            wildcard: false,
        }
    }

    /// A named placeholder (declaration site or in-signature use).
    pub fn placeholder(name: impl Into<String>, ty: TypeId) -> Self {
        Self {
            ty,
            name: Some(name.into()),
            placeholder: true,
            wildcard: false,
        }
    }
}

/// Interned shape of a concrete type reference.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum TypeDesc {
    /// A class reference; empty `args` means the raw (unparameterized) form,
    /// which is also the `redirect()` target of every parameterization.
    Class { class: ClassId, args: GenericsArgs },
    /// An array with a component type. Covariant at the descriptor level;
    /// assignment compatibility is checked componentwise by the checker.
    Array { elem: TypeId },
    /// A named generic placeholder awaiting substitution.
    Placeholder { name: String },
}

/// A class definition: the canonical descriptor of a Quill type.
#[derive(Clone, Debug)]
pub struct ClassDef {
    pub name: String,
    pub primitive: bool,
    pub is_interface: bool,
    pub is_enum: bool,
    /// Superclass reference, possibly parameterized. `None` only for the root
    /// and for primitives.
    pub superclass: Option<TypeId>,
    /// Implemented interface references, possibly parameterized.
    pub interfaces: Vec<TypeId>,
    /// Declared generic placeholders, e.g. `E` on `List<E>`.
    pub generic_params: Vec<GenericsArg>,
    pub properties: Vec<PropertyDef>,
    pub fields: Vec<FieldDef>,
    pub methods: Vec<MethodId>,
    pub constructors: Vec<MethodId>,
}

impl ClassDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primitive: false,
            is_interface: false,
            is_enum: false,
            superclass: Some(TypeId::OBJECT),
            interfaces: Vec::new(),
            generic_params: Vec::new(),
            properties: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
        }
    }

    pub fn interface(name: impl Into<String>) -> Self {
        let mut def = Self::new(name);
        def.is_interface = true;
        def
    }
}

/// A property: accessible through the language's property syntax.
#[derive(Clone, Debug)]
pub struct PropertyDef {
    pub name: String,
    pub ty: TypeId,
}

/// A plain field, visible to attribute access.
#[derive(Clone, Debug)]
pub struct FieldDef {
    pub name: String,
    pub ty: TypeId,
}

/// A method parameter.
#[derive(Clone, Debug)]
pub struct ParamDef {
    pub name: String,
    pub ty: TypeId,
}

impl ParamDef {
    pub fn new(name: impl Into<String>, ty: TypeId) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// A method definition. Constructors are methods named `<init>`.
#[derive(Clone, Debug)]
pub struct MethodDef {
    pub name: String,
    pub declaring_class: ClassId,
    pub params: Vec<ParamDef>,
    pub return_type: TypeId,
    pub is_static: bool,
    /// True for methods the resolver interned on demand (default constructor,
    /// property accessor).
    pub synthetic: bool,
}

impl MethodDef {
    pub fn new(
        declaring_class: ClassId,
        name: impl Into<String>,
        params: Vec<ParamDef>,
        return_type: TypeId,
    ) -> Self {
        Self {
            name: name.into(),
            declaring_class,
            params,
            return_type,
            is_static: false,
            synthetic: false,
        }
    }

    pub const CTOR_NAME: &'static str = "<init>";

    pub fn is_constructor(&self) -> bool {
        self.name == Self::CTOR_NAME
    }
}
