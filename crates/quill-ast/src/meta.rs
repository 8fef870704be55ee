// meta.rs
//
// The typed metadata side store. Inference results attach to NodeIds through
// a closed set of markers; downstream passes (bytecode emission) read the
// same records. The tree itself is never mutated.

use rustc_hash::FxHashMap;

use crate::ast::NodeId;
use crate::vars::VarId;
use quill_types::{MethodId, TypeId};

/// The closed marker enumeration. Every annotation the checker produces is
/// one of these; there is no open-ended metadata channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeMarker {
    /// The type computed for this node.
    InferredType,
    /// Widened LUB of all values assigned to a declared variable.
    DeclarationInferredType,
    /// For method and closure nodes, the LUB of their return types.
    InferredReturnType,
    /// For variables holding a closure, the closure's formal parameters.
    ClosureArguments,
    /// The resolved concrete callee of a call site.
    DirectMethodCallTarget,
}

/// Per-node marker record: one slot per marker.
#[derive(Debug, Clone, Default)]
pub struct NodeMetadata {
    pub inferred_type: Option<TypeId>,
    pub declaration_inferred_type: Option<TypeId>,
    pub inferred_return_type: Option<TypeId>,
    pub closure_arguments: Option<Vec<VarId>>,
    pub direct_method_call_target: Option<MethodId>,
}

impl NodeMetadata {
    pub fn is_empty(&self) -> bool {
        self.inferred_type.is_none()
            && self.declaration_inferred_type.is_none()
            && self.inferred_return_type.is_none()
            && self.closure_arguments.is_none()
            && self.direct_method_call_target.is_none()
    }
}

/// Metadata for all nodes of one class visit.
#[derive(Debug, Default)]
pub struct Metadata {
    nodes: FxHashMap<NodeId, NodeMetadata>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, node: NodeId) -> Option<&NodeMetadata> {
        self.nodes.get(&node)
    }

    fn entry(&mut self, node: NodeId) -> &mut NodeMetadata {
        self.nodes.entry(node).or_default()
    }

    pub fn inferred_type(&self, node: NodeId) -> Option<TypeId> {
        self.nodes.get(&node).and_then(|m| m.inferred_type)
    }

    /// Store an inferred type, returning the previous value if any.
    pub fn put_inferred_type(&mut self, node: NodeId, ty: TypeId) -> Option<TypeId> {
        self.entry(node).inferred_type.replace(ty)
    }

    pub fn declaration_inferred_type(&self, node: NodeId) -> Option<TypeId> {
        self.nodes
            .get(&node)
            .and_then(|m| m.declaration_inferred_type)
    }

    pub fn put_declaration_inferred_type(&mut self, node: NodeId, ty: TypeId) {
        self.entry(node).declaration_inferred_type = Some(ty);
    }

    pub fn inferred_return_type(&self, node: NodeId) -> Option<TypeId> {
        self.nodes.get(&node).and_then(|m| m.inferred_return_type)
    }

    pub fn put_inferred_return_type(&mut self, node: NodeId, ty: TypeId) {
        self.entry(node).inferred_return_type = Some(ty);
    }

    pub fn closure_arguments(&self, node: NodeId) -> Option<&[VarId]> {
        self.nodes
            .get(&node)
            .and_then(|m| m.closure_arguments.as_deref())
    }

    pub fn put_closure_arguments(&mut self, node: NodeId, params: Vec<VarId>) {
        self.entry(node).closure_arguments = Some(params);
    }

    pub fn direct_method_call_target(&self, node: NodeId) -> Option<MethodId> {
        self.nodes
            .get(&node)
            .and_then(|m| m.direct_method_call_target)
    }

    pub fn put_direct_method_call_target(&mut self, node: NodeId, method: MethodId) {
        self.entry(node).direct_method_call_target = Some(method);
    }

    /// Snapshot a node's full marker record (used by the closure analyzer).
    pub fn snapshot(&self, node: NodeId) -> NodeMetadata {
        self.nodes.get(&node).cloned().unwrap_or_default()
    }

    /// Replace a node's full marker record with a snapshot.
    pub fn restore(&mut self, node: NodeId, snapshot: NodeMetadata) {
        if snapshot.is_empty() {
            self.nodes.remove(&node);
        } else {
            self.nodes.insert(node, snapshot);
        }
    }
}
