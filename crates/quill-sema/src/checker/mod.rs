// checker/mod.rs
//
// The static type-checking visitor. One instance checks one class on one
// thread; state below is the inference context of that single visit.

mod assign;
mod binary;
mod calls;
mod closures;
mod expr;
mod generics;
mod properties;
mod resolution;
mod stmt;

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};

use quill_ast::{
    Binding, ClassDecl, ConstValue, Expr, ExprKind, Metadata, MethodDecl, NodeId, Span, VarId,
    VarTable,
};
use quill_types::{
    check_compatible_assignment_types, lowest_upper_bound_pair, type_display, ClassId,
    ExtensionRegistry, MethodId, TypeArena, TypeId,
};

use crate::errors::{SemanticError, TypeError};
use crate::plugin::{TypeCheckerPlugin, TypeCheckerPluginFactory};
use crate::return_adder;

/// Key under which instanceof-refined candidate types are stored. Variable
/// references key by binding identity, everything else by a textual
/// rendering of the expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum TempoKey {
    Var(VarId),
    Text(String),
}

/// A call site deferred to the second pass because its receiver is a
/// closure-shared variable.
#[derive(Debug, Clone)]
pub(crate) struct SecondPassCall {
    pub(crate) call_node: NodeId,
    pub(crate) receiver: VarId,
    pub(crate) span: Span,
}

/// The static type-checking visitor.
///
/// Walks the resolved tree of a single class, computes an inferred type for
/// every expression, resolves call sites to concrete methods and records the
/// results through the metadata store. Errors accumulate; traversal never
/// aborts.
pub struct TypeChecker<'a> {
    pub(crate) arena: &'a mut TypeArena,
    pub(crate) extensions: &'a ExtensionRegistry,
    pub(crate) vars: &'a VarTable,
    pub(crate) plugin_factory: Option<&'a dyn TypeCheckerPluginFactory>,

    pub(crate) class_node: ClassId,
    pub(crate) method_node: Option<MethodId>,
    methods_to_be_visited: FxHashSet<MethodId>,
    pub(crate) already_visited: FxHashSet<MethodId>,

    // Closure return-type inference.
    pub(crate) closure_expression: Option<NodeId>,
    pub(crate) closure_return_types: Vec<TypeId>,

    // Implicit receivers introduced by with-style blocks; innermost first.
    pub(crate) with_receivers: Vec<TypeId>,
    pub(crate) last_implicit_it_type: Option<TypeId>,

    // Flow-sensitive state. The temporary frames hold instanceof-refined
    // candidate types for the enclosing if/ternary branch; the assignment
    // tracker collects every type assigned inside the current conditional or
    // loop construct so the join can be computed on exit.
    pub(crate) temporary_if_branch_type_info: Vec<FxHashMap<TempoKey, Vec<TypeId>>>,
    pub(crate) assignment_tracker: Option<FxHashMap<VarId, Vec<TypeId>>>,
    pub(crate) for_loop_variable_types: FxHashMap<VarId, TypeId>,

    // Closure-shared variable analysis.
    pub(crate) closure_shared_assignments: FxHashMap<VarId, Vec<TypeId>>,
    pub(crate) second_pass: IndexMap<NodeId, SecondPassCall>,

    // Method bodies of the class under check, for resolver recursion.
    pub(crate) method_decls: FxHashMap<MethodId, &'a MethodDecl>,
    pub(crate) method_nodes: FxHashMap<MethodId, NodeId>,

    pub(crate) meta: Metadata,
    pub(crate) errors: Vec<TypeError>,
}

impl<'a> TypeChecker<'a> {
    pub fn new(
        arena: &'a mut TypeArena,
        extensions: &'a ExtensionRegistry,
        vars: &'a VarTable,
        class_node: ClassId,
        plugin_factory: Option<&'a dyn TypeCheckerPluginFactory>,
    ) -> Self {
        Self {
            arena,
            extensions,
            vars,
            plugin_factory,
            class_node,
            method_node: None,
            methods_to_be_visited: FxHashSet::default(),
            already_visited: FxHashSet::default(),
            closure_expression: None,
            closure_return_types: Vec::new(),
            with_receivers: Vec::new(),
            last_implicit_it_type: None,
            // The base frame lives for the whole visit; branch frames are
            // pushed and popped around it.
            temporary_if_branch_type_info: vec![FxHashMap::default()],
            assignment_tracker: None,
            for_loop_variable_types: FxHashMap::default(),
            closure_shared_assignments: FxHashMap::default(),
            second_pass: IndexMap::new(),
            method_decls: FxHashMap::default(),
            method_nodes: FxHashMap::default(),
            meta: Metadata::new(),
            errors: Vec::new(),
        }
    }

    /// Restrict checking to the given methods. An empty set checks all.
    pub fn set_methods_to_be_visited(&mut self, methods: FxHashSet<MethodId>) {
        self.methods_to_be_visited = methods;
    }

    pub fn errors(&self) -> &[TypeError] {
        &self.errors
    }

    pub fn metadata(&self) -> &Metadata {
        &self.meta
    }

    pub fn into_results(self) -> (Metadata, Vec<TypeError>) {
        (self.meta, self.errors)
    }

    /// Primary entry point: walk the whole class. [`perform_second_pass`]
    /// must run afterwards to finalize closure-shared variables.
    ///
    /// [`perform_second_pass`]: TypeChecker::perform_second_pass
    #[tracing::instrument(skip_all, fields(class = %self.arena.class_def(self.class_node).name))]
    pub fn visit_class(&mut self, class: &'a ClassDecl) {
        let old_class = self.class_node;
        self.class_node = class.id;
        for method in &class.methods {
            self.method_decls.insert(method.id, method);
            self.method_nodes.insert(method.id, method.node);
        }
        for method in &class.methods {
            self.visit_method(method.id);
        }
        self.class_node = old_class;
    }

    /// Visit one method body. Guarded against re-entry: resolver recursion
    /// into callees and repeated calls both hit the visited set.
    pub(crate) fn visit_method(&mut self, method: MethodId) {
        if self.already_visited.contains(&method) {
            return;
        }
        self.already_visited.insert(method);
        if !self.methods_to_be_visited.is_empty() && !self.methods_to_be_visited.contains(&method)
        {
            return;
        }
        // Methods of other classes have no body here; their declared
        // signature is all the resolver needs.
        let Some(decl) = self.method_decls.get(&method).copied() else {
            return;
        };
        let old_method = self.method_node.replace(method);
        let is_constructor = self.arena.method(method).is_constructor();
        self.visit_stmt(&decl.body);
        if !is_constructor {
            let mut tails: Vec<&'a Expr> = Vec::new();
            return_adder::visit_method_body(&decl.body, &mut |e| tails.push(e));
            for tail in tails {
                self.on_return_added(decl.node, tail);
            }
        }
        self.method_node = old_method;
    }

    /// Return-adder listener for methods: fold each synthesized return into
    /// the method's inferred return type, excluding literal nulls.
    fn on_return_added(&mut self, method_node: NodeId, expr: &Expr) {
        if expr.is_null_constant() {
            return;
        }
        let return_type = self.check_return_type(expr);
        let inferred = match self.meta.inferred_return_type(method_node) {
            Some(previous) => lowest_upper_bound_pair(self.arena, return_type, previous),
            None => return_type,
        };
        self.meta.put_inferred_return_type(method_node, inferred);
    }

    /// Check a return value against the enclosing method's declared return
    /// type and hand back the value's type.
    pub(crate) fn check_return_type(&mut self, expr: &Expr) -> TypeId {
        let ty = self.get_type(expr);
        if let Some(method) = self.method_node {
            let declared = self.arena.method(method).return_type;
            if declared != TypeId::VOID
                && ty != TypeId::VOID
                && ty != TypeId::BOXED_VOID
                && !check_compatible_assignment_types(
                    self.arena,
                    declared,
                    ty,
                    expr.is_null_constant(),
                )
            {
                self.add_static_type_error(
                    SemanticError::ReturnTypeMismatch {
                        found: self.type_display(ty),
                        expected: self.type_display(declared),
                        span: expr.span.into(),
                    },
                    expr.span,
                );
            }
        }
        ty
    }

    // ====================================================================
    // Diagnostics and metadata plumbing
    // ====================================================================

    /// Record an error at a source position. Errors on generated nodes
    /// (no position) are silently dropped.
    pub(crate) fn add_static_type_error(&mut self, error: SemanticError, span: Span) {
        if span.has_position() {
            self.errors.push(TypeError::new(error, span));
        }
    }

    pub(crate) fn type_display(&self, ty: TypeId) -> String {
        type_display(self.arena, ty)
    }

    /// Store an inferred type on a node. When an earlier inference is
    /// overwritten, the declaration channel records the LUB of old and new,
    /// preserving the widened view for the declaration site.
    pub(crate) fn store_type(&mut self, node: NodeId, ty: TypeId) {
        if let Some(old) = self.meta.put_inferred_type(node, ty) {
            if old != ty {
                let base = self.meta.declaration_inferred_type(node).unwrap_or(old);
                let widened = lowest_upper_bound_pair(self.arena, base, ty);
                self.meta.put_declaration_inferred_type(node, widened);
            }
        }
    }

    /// Store a type on a variable's declaration site, recording the
    /// assignment for closure-shared variables.
    pub(crate) fn store_var_type(&mut self, var: VarId, ty: TypeId) {
        let info = self.vars.get(var);
        let decl_node = info.decl_node;
        let shared = info.closure_shared;
        self.store_type(decl_node, ty);
        if shared {
            self.closure_shared_assignments.entry(var).or_default().push(ty);
        }
    }

    /// Store a type on an expression, writing through variable references to
    /// their declaration site the way the metadata channel requires.
    pub(crate) fn store_expr_type(&mut self, expr: &Expr, ty: TypeId) {
        self.store_type(expr.id, ty);
        if let ExprKind::Variable(vref) = &expr.kind
            && let Binding::Var(var) = vref.binding
        {
            self.store_var_type(var, ty);
        }
    }

    /// The inferred type of an expression: stored metadata first, then the
    /// static fallbacks (declaration metadata, loop-variable inference,
    /// origin types, literal types).
    pub(crate) fn get_type(&mut self, expr: &Expr) -> TypeId {
        if let Some(ty) = self.meta.inferred_type(expr.id) {
            return ty;
        }
        match &expr.kind {
            ExprKind::Variable(vref) => match vref.binding {
                Binding::This => self.arena.raw(self.class_node),
                Binding::Super => self.superclass_type(),
                Binding::Var(var) => {
                    let info = self.vars.get(var);
                    if let Some(ty) = self.meta.inferred_type(info.decl_node) {
                        return ty;
                    }
                    if let Some(&ty) = self.for_loop_variable_types.get(&var) {
                        return ty;
                    }
                    info.declared_type
                }
                Binding::Dynamic => TypeId::OBJECT,
            },
            ExprKind::Const(value) => Self::const_type(value),
            ExprKind::ClassLiteral(ty) => *ty,
            ExprKind::Closure(_) => TypeId::CLOSURE,
            _ => TypeId::OBJECT,
        }
    }

    /// Static type of a literal constant. Numeric literals are boxed, the
    /// way the runtime materializes them.
    pub(crate) fn const_type(value: &ConstValue) -> TypeId {
        match value {
            ConstValue::Int(_) => TypeId::INTEGER,
            ConstValue::Long(_) => TypeId::BOXED_LONG,
            ConstValue::BigInt(_) => TypeId::BIG_INTEGER,
            ConstValue::Decimal(_) => TypeId::BIG_DECIMAL,
            ConstValue::Float(_) => TypeId::BOXED_FLOAT,
            ConstValue::Double(_) => TypeId::BOXED_DOUBLE,
            ConstValue::Bool(_) => TypeId::BOXED_BOOLEAN,
            ConstValue::Str(_) => TypeId::STRING,
            ConstValue::GStr(_) => TypeId::GSTRING,
            ConstValue::Null => TypeId::OBJECT,
        }
    }

    pub(crate) fn superclass_type(&mut self) -> TypeId {
        self.arena
            .class_def(self.class_node)
            .superclass
            .unwrap_or(TypeId::OBJECT)
    }

    /// Return type of a resolved method, preferring the inferred return type
    /// when the callee's body has been visited.
    pub(crate) fn method_return_type(&self, method: MethodId) -> TypeId {
        if let Some(&node) = self.method_nodes.get(&method)
            && let Some(inferred) = self.meta.inferred_return_type(node)
        {
            return inferred;
        }
        self.arena.method(method).return_type
    }

    pub(crate) fn store_target_method(&mut self, node: NodeId, method: MethodId) {
        self.meta.put_direct_method_call_target(node, method);
    }

    pub(crate) fn plugin(&self) -> Option<&'a dyn TypeCheckerPlugin> {
        self.plugin_factory
            .and_then(|factory| factory.plugin_for(self.class_node))
    }

    // ====================================================================
    // Flow-sensitive context
    // ====================================================================

    pub(crate) fn push_temporary_type_info(&mut self) {
        self.temporary_if_branch_type_info.push(FxHashMap::default());
    }

    pub(crate) fn pop_temporary_type_info(&mut self) {
        self.temporary_if_branch_type_info.pop();
    }

    /// Candidate types refined by instanceof for the given expression in the
    /// innermost live frame.
    pub(crate) fn temporary_types_for(&mut self, expr: &Expr) -> Vec<TypeId> {
        let key = self.temporary_key(expr);
        self.temporary_if_branch_type_info
            .last()
            .and_then(|frame| frame.get(&key))
            .cloned()
            .unwrap_or_default()
    }

    /// Key derivation: variable identity for bound references, source text
    /// rendering otherwise.
    pub(crate) fn temporary_key(&self, expr: &Expr) -> TempoKey {
        match &expr.kind {
            ExprKind::Variable(vref) => match vref.binding {
                Binding::Var(var) => TempoKey::Var(var),
                _ => TempoKey::Text(vref.name.clone()),
            },
            _ => TempoKey::Text(self.expr_text(expr)),
        }
    }

    /// Stable textual rendering used for non-variable refinement keys.
    pub(crate) fn expr_text(&self, expr: &Expr) -> String {
        match &expr.kind {
            ExprKind::Variable(vref) => vref.name.clone(),
            ExprKind::Property(p) => format!("{}.{}", self.expr_text(&p.object), p.property),
            ExprKind::MethodCall(c) => format!("{}.{}()", self.expr_text(&c.object), c.method),
            ExprKind::Const(v) => match v {
                ConstValue::Str(s) | ConstValue::GStr(s) => s.clone(),
                other => format!("{other:?}"),
            },
            _ => format!("expr@{}", expr.id),
        }
    }

    /// Start tracking assignments for a conditional or loop construct,
    /// returning the outer tracker for restoration.
    pub(crate) fn push_assignment_tracking(
        &mut self,
    ) -> Option<FxHashMap<VarId, Vec<TypeId>>> {
        std::mem::replace(&mut self.assignment_tracker, Some(FxHashMap::default()))
    }

    /// Join every tracked variable's assigned types and write the LUB back
    /// through the metadata channel, then restore the outer tracker.
    pub(crate) fn pop_assignment_tracking(
        &mut self,
        old: Option<FxHashMap<VarId, Vec<TypeId>>>,
    ) {
        if let Some(tracker) = self.assignment_tracker.take() {
            for (var, types) in tracker {
                let joined = quill_types::lowest_upper_bound(self.arena, &types);
                self.store_var_type(var, joined);
            }
        }
        self.assignment_tracker = old;
    }
}
