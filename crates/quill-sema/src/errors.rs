// errors.rs
//! Static type-checking errors (E3xxx).
//!
//! The message bodies are a stable interface consumed by tooling and tests;
//! do not reword them. The historical "loose of precision" spelling is kept
//! deliberately.

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

use quill_ast::Span;

/// Prefix applied when rendering an error to the user.
pub const STATIC_TYPE_PREFIX: &str = "[Static type checking] - ";

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum SemanticError {
    #[error("The variable [{name}] is undeclared.")]
    #[diagnostic(code(E3001))]
    UndeclaredVariable {
        name: String,
        #[label("not declared in any enclosing scope")]
        span: SourceSpan,
    },

    #[error("No such property: {property} for class: {class_name}")]
    #[diagnostic(code(E3002))]
    UnknownProperty {
        property: String,
        class_name: String,
        #[label("property not found")]
        span: SourceSpan,
    },

    #[error("Cannot find matching method {receiver}#{signature}")]
    #[diagnostic(code(E3003))]
    UnknownMethod {
        receiver: String,
        signature: String,
        #[label("no applicable method")]
        span: SourceSpan,
    },

    #[error("Reference to method is ambiguous. Cannot choose between {candidates}")]
    #[diagnostic(code(E3004))]
    AmbiguousMethod {
        candidates: String,
        #[label("ambiguous call")]
        span: SourceSpan,
    },

    #[error("Cannot assign value of type {right} to variable of type {left}")]
    #[diagnostic(code(E3005))]
    AssignmentIncompatible {
        right: String,
        left: String,
        #[label("incompatible assignment")]
        span: SourceSpan,
    },

    #[error("Cannot set read-only property: {property}")]
    #[diagnostic(code(E3006))]
    ReadOnlyProperty {
        property: String,
        #[label("read-only")]
        span: SourceSpan,
    },

    #[error("Incompatible generic argument types. Cannot assign {right} to: {left}")]
    #[diagnostic(code(E3007))]
    GenericsIncompatible {
        right: String,
        left: String,
        #[label("generic arguments differ")]
        span: SourceSpan,
    },

    #[error("Possible loose of precision from {from} to {to}")]
    #[diagnostic(code(E3008))]
    PrecisionLoss {
        from: String,
        to: String,
        #[label("narrowing assignment")]
        span: SourceSpan,
    },

    #[error("Inconvertible types: cannot cast {from} to {to}")]
    #[diagnostic(code(E3009))]
    InconvertibleCast {
        from: String,
        to: String,
        #[label("invalid cast")]
        span: SourceSpan,
    },

    #[error("Incorrect number of values. Expected:{expected} Was:{found}")]
    #[diagnostic(code(E3010))]
    TupleArityMismatch {
        expected: usize,
        found: usize,
        #[label("arity mismatch")]
        span: SourceSpan,
    },

    #[error(
        "Multiple assignments without list expressions on the right hand side are unsupported in static type checking mode"
    )]
    #[diagnostic(code(E3011))]
    MultipleAssignmentWithoutList {
        #[label("right-hand side is not a list expression")]
        span: SourceSpan,
    },

    #[error("Dynamic keys in map-style constructors are unsupported in static type checking")]
    #[diagnostic(code(E3012))]
    DynamicMapKey {
        #[label("key is not a constant")]
        span: SourceSpan,
    },

    #[error("No matching constructor found: {type_name}{signature}")]
    #[diagnostic(code(E3013))]
    UnknownConstructor {
        type_name: String,
        signature: String,
        #[label("no matching constructor")]
        span: SourceSpan,
    },

    #[error("Spread operator can only be used on collection types")]
    #[diagnostic(code(E3014))]
    SpreadOnNonCollection {
        #[label("receiver is not a collection")]
        span: SourceSpan,
    },

    #[error("Spread operator on map only allows one of [key,value]")]
    #[diagnostic(code(E3015))]
    SpreadMapProperty {
        #[label("unsupported map spread property")]
        span: SourceSpan,
    },

    #[error("Unexpected number of parameters for a with call")]
    #[diagnostic(code(E3016))]
    WithParameterCount {
        #[label("a with closure takes at most one parameter")]
        span: SourceSpan,
    },

    #[error("Expected parameter type: {expected} but was: {found}")]
    #[diagnostic(code(E3017))]
    WithParameterType {
        expected: String,
        found: String,
        #[label("parameter type differs from the receiver")]
        span: SourceSpan,
    },

    #[error("Closure argument types: {params} do not match with parameter types: {args}")]
    #[diagnostic(code(E3018))]
    ClosureArgumentsMismatch {
        params: String,
        args: String,
        #[label("closure called with incompatible arguments")]
        span: SourceSpan,
    },

    #[error("Cannot return value of type {found} on method returning type {expected}")]
    #[diagnostic(code(E3019))]
    ReturnTypeMismatch {
        found: String,
        expected: String,
        #[label("incompatible return value")]
        span: SourceSpan,
    },

    #[error("Cannot loop with element of type {element} with collection of type {collection}")]
    #[diagnostic(code(E3020))]
    LoopElementIncompatible {
        element: String,
        collection: String,
        #[label("loop variable cannot hold the element type")]
        span: SourceSpan,
    },

    #[error("Cannot assign value of type {value} into array of type {array}")]
    #[diagnostic(code(E3021))]
    ArrayAssignmentIncompatible {
        value: String,
        array: String,
        #[label("component type mismatch")]
        span: SourceSpan,
    },

    #[error("Cannot assign value of type {value} to field of type {field}")]
    #[diagnostic(code(E3022))]
    PropertyAssignmentIncompatible {
        value: String,
        field: String,
        #[label("incompatible named-argument value")]
        span: SourceSpan,
    },

    #[error("Cannot call {signature} with arguments {args}")]
    #[diagnostic(code(E3023))]
    GenericsCallArguments {
        signature: String,
        args: String,
        #[label("arguments violate the generic parameterization")]
        span: SourceSpan,
    },

    #[error("No matching method found for arguments {args}")]
    #[diagnostic(code(E3024))]
    NoMatchingGenericMethod {
        args: String,
        #[label("no candidate accepts these arguments")]
        span: SourceSpan,
    },

    #[error(
        "A closure shared variable [{variable}] has been assigned with various types and the method [{signature}] does not exist in the lowest upper bound of those types: [{lub}]. In general, this is a bad practice (variable reuse) because the compiler cannot determine safely what is the type of the variable at the moment of the call in a multithreaded context."
    )]
    #[diagnostic(code(E3025))]
    ClosureSharedVariableOnLub {
        variable: String,
        signature: String,
        lub: String,
        #[label("method missing on the joined type")]
        span: SourceSpan,
    },
}

/// An error with the source position it was discovered at.
#[derive(Debug, Clone)]
pub struct TypeError {
    pub error: SemanticError,
    pub span: Span,
}

impl TypeError {
    pub fn new(error: SemanticError, span: Span) -> Self {
        Self { error, span }
    }
}

impl std::fmt::Display for TypeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{STATIC_TYPE_PREFIX}{}", self.error)
    }
}
