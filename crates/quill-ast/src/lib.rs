// quill-ast: the resolved syntax tree of a single Quill class, plus the
// metadata side store the static type checker writes its results through.

mod ast;
mod builder;
mod meta;
mod span;
mod vars;

pub use ast::*;
pub use builder::AstBuilder;
pub use meta::{Metadata, NodeMetadata, TypeMarker};
pub use span::Span;
pub use vars::{VarId, VarInfo, VarKind, VarTable};
