// builder.rs
//
// Assembly helpers for resolved trees. The parser and name resolver live in
// other repositories, so hosts (and this repository's tests) construct trees
// through this builder: it hands out node ids, spans and variable bindings in
// one place.

use crate::ast::*;
use crate::span::Span;
use crate::vars::{VarId, VarInfo, VarKind, VarTable};
use quill_types::{ClassId, MethodId, TypeId};

/// Builds expressions, statements and declarations with fresh node ids.
#[derive(Default)]
pub struct AstBuilder {
    next_node: u32,
    next_offset: usize,
    pub vars: VarTable,
}

impl AstBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&mut self) -> NodeId {
        let id = NodeId::new(self.next_node);
        self.next_node += 1;
        id
    }

    fn span(&mut self) -> Span {
        let start = self.next_offset;
        self.next_offset += 1;
        Span::new(start, start + 1, 1, start as u32 + 1)
    }

    fn expr(&mut self, kind: ExprKind) -> Expr {
        Expr {
            id: self.node(),
            span: self.span(),
            kind,
        }
    }

    fn stmt(&mut self, kind: StmtKind) -> Stmt {
        Stmt {
            id: self.node(),
            span: self.span(),
            kind,
        }
    }

    // ====================================================================
    // Variables
    // ====================================================================

    pub fn local(&mut self, name: impl Into<String>, ty: TypeId) -> VarId {
        let decl_node = self.node();
        self.vars.define(VarInfo {
            name: name.into(),
            declared_type: ty,
            kind: VarKind::Local {
                dynamic_typed: false,
            },
            closure_shared: false,
            decl_node,
        })
    }

    /// A `def` local: dynamic-typed, origin type Object.
    pub fn dynamic_local(&mut self, name: impl Into<String>) -> VarId {
        let decl_node = self.node();
        self.vars.define(VarInfo {
            name: name.into(),
            declared_type: TypeId::OBJECT,
            kind: VarKind::Local { dynamic_typed: true },
            closure_shared: false,
            decl_node,
        })
    }

    pub fn param(&mut self, name: impl Into<String>, ty: TypeId) -> VarId {
        let decl_node = self.node();
        self.vars.define(VarInfo {
            name: name.into(),
            declared_type: ty,
            kind: VarKind::Param,
            closure_shared: false,
            decl_node,
        })
    }

    pub fn mark_closure_shared(&mut self, var: VarId) {
        self.vars.get_mut(var).closure_shared = true;
    }

    // ====================================================================
    // Expressions
    // ====================================================================

    pub fn int(&mut self, v: i64) -> Expr {
        self.expr(ExprKind::Const(ConstValue::Int(v)))
    }

    pub fn long(&mut self, v: i64) -> Expr {
        self.expr(ExprKind::Const(ConstValue::Long(v)))
    }

    pub fn decimal(&mut self, text: impl Into<String>) -> Expr {
        self.expr(ExprKind::Const(ConstValue::Decimal(text.into())))
    }

    pub fn double(&mut self, v: f64) -> Expr {
        self.expr(ExprKind::Const(ConstValue::Double(v)))
    }

    pub fn float(&mut self, v: f64) -> Expr {
        self.expr(ExprKind::Const(ConstValue::Float(v)))
    }

    pub fn bool_lit(&mut self, v: bool) -> Expr {
        self.expr(ExprKind::Const(ConstValue::Bool(v)))
    }

    pub fn string(&mut self, s: impl Into<String>) -> Expr {
        self.expr(ExprKind::Const(ConstValue::Str(s.into())))
    }

    pub fn gstring(&mut self, s: impl Into<String>) -> Expr {
        self.expr(ExprKind::Const(ConstValue::GStr(s.into())))
    }

    pub fn null(&mut self) -> Expr {
        self.expr(ExprKind::Const(ConstValue::Null))
    }

    pub fn var_ref(&mut self, var: VarId) -> Expr {
        let name = self.vars.get(var).name.clone();
        self.expr(ExprKind::Variable(VarRef {
            name,
            binding: Binding::Var(var),
        }))
    }

    pub fn dynamic_ref(&mut self, name: impl Into<String>) -> Expr {
        self.expr(ExprKind::Variable(VarRef {
            name: name.into(),
            binding: Binding::Dynamic,
        }))
    }

    pub fn this_ref(&mut self) -> Expr {
        self.expr(ExprKind::Variable(VarRef {
            name: "this".into(),
            binding: Binding::This,
        }))
    }

    pub fn super_ref(&mut self) -> Expr {
        self.expr(ExprKind::Variable(VarRef {
            name: "super".into(),
            binding: Binding::Super,
        }))
    }

    pub fn property(&mut self, object: Expr, name: impl Into<String>) -> Expr {
        self.expr(ExprKind::Property(PropertyExpr {
            object: Box::new(object),
            property: name.into(),
            attribute: false,
            spread_safe: false,
        }))
    }

    pub fn attribute(&mut self, object: Expr, name: impl Into<String>) -> Expr {
        self.expr(ExprKind::Property(PropertyExpr {
            object: Box::new(object),
            property: name.into(),
            attribute: true,
            spread_safe: false,
        }))
    }

    pub fn spread_property(&mut self, object: Expr, name: impl Into<String>) -> Expr {
        self.expr(ExprKind::Property(PropertyExpr {
            object: Box::new(object),
            property: name.into(),
            attribute: false,
            spread_safe: true,
        }))
    }

    pub fn binary(&mut self, op: BinOp, left: Expr, right: Expr) -> Expr {
        self.expr(ExprKind::Binary(BinaryExpr {
            op,
            left: Box::new(left),
            right: Box::new(right),
            is_declaration: false,
        }))
    }

    pub fn assign(&mut self, left: Expr, right: Expr) -> Expr {
        self.binary(BinOp::Assign, left, right)
    }

    /// Declaration-site assignment (`def x = init` / `String s = init`).
    pub fn declare(&mut self, var: VarId, init: Option<Expr>) -> Expr {
        let left = self.var_ref(var);
        let right = init.unwrap_or_else(|| self.expr(ExprKind::Empty));
        self.expr(ExprKind::Binary(BinaryExpr {
            op: BinOp::Assign,
            left: Box::new(left),
            right: Box::new(right),
            is_declaration: true,
        }))
    }

    pub fn instance_of(&mut self, value: Expr, ty: TypeId) -> Expr {
        let class_lit = self.class_literal(ty);
        self.binary(BinOp::InstanceOf, value, class_lit)
    }

    pub fn ternary(&mut self, condition: Expr, if_true: Expr, if_false: Expr) -> Expr {
        self.expr(ExprKind::Ternary(TernaryExpr {
            condition: Box::new(condition),
            if_true: Box::new(if_true),
            if_false: Box::new(if_false),
        }))
    }

    pub fn unary(&mut self, op: UnaryOp, operand: Expr) -> Expr {
        self.expr(ExprKind::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    pub fn call(&mut self, object: Expr, method: impl Into<String>, args: Vec<Expr>) -> Expr {
        self.expr(ExprKind::MethodCall(MethodCallExpr {
            object: Box::new(object),
            method: method.into(),
            args,
            spread_safe: false,
        }))
    }

    pub fn spread_call(&mut self, object: Expr, method: impl Into<String>, args: Vec<Expr>) -> Expr {
        self.expr(ExprKind::MethodCall(MethodCallExpr {
            object: Box::new(object),
            method: method.into(),
            args,
            spread_safe: true,
        }))
    }

    pub fn ctor_call(&mut self, ty: TypeId, args: Vec<Expr>) -> Expr {
        self.expr(ExprKind::ConstructorCall(ConstructorCallExpr {
            ty,
            args,
            diamond: false,
        }))
    }

    pub fn diamond_ctor_call(&mut self, ty: TypeId, args: Vec<Expr>) -> Expr {
        self.expr(ExprKind::ConstructorCall(ConstructorCallExpr {
            ty,
            args,
            diamond: true,
        }))
    }

    pub fn closure(&mut self, params: Vec<VarId>, body: Stmt) -> Expr {
        self.expr(ExprKind::Closure(ClosureExpr {
            params,
            body: Box::new(body),
        }))
    }

    pub fn cast(&mut self, ty: TypeId, inner: Expr, coerce: bool) -> Expr {
        self.expr(ExprKind::Cast(CastExpr {
            ty,
            expr: Box::new(inner),
            coerce,
        }))
    }

    pub fn list(&mut self, elements: Vec<Expr>) -> Expr {
        self.expr(ExprKind::ListLiteral(elements))
    }

    pub fn map(&mut self, entries: Vec<(Expr, Expr)>) -> Expr {
        let entries = entries
            .into_iter()
            .map(|(key, value)| MapEntry { key, value })
            .collect();
        self.expr(ExprKind::MapLiteral(entries))
    }

    pub fn range(&mut self, from: Expr, to: Expr) -> Expr {
        self.expr(ExprKind::Range(RangeExpr {
            from: Box::new(from),
            to: Box::new(to),
            inclusive: true,
        }))
    }

    pub fn tuple(&mut self, elements: Vec<Expr>) -> Expr {
        self.expr(ExprKind::Tuple(elements))
    }

    pub fn class_literal(&mut self, ty: TypeId) -> Expr {
        self.expr(ExprKind::ClassLiteral(ty))
    }

    pub fn empty_expr(&mut self) -> Expr {
        self.expr(ExprKind::Empty)
    }

    // ====================================================================
    // Statements
    // ====================================================================

    pub fn block(&mut self, stmts: Vec<Stmt>) -> Stmt {
        self.stmt(StmtKind::Block(stmts))
    }

    pub fn expr_stmt(&mut self, expr: Expr) -> Stmt {
        self.stmt(StmtKind::Expr(expr))
    }

    pub fn if_else(&mut self, condition: Expr, then_block: Stmt, else_block: Option<Stmt>) -> Stmt {
        self.stmt(StmtKind::If {
            condition,
            then_block: Box::new(then_block),
            else_block: else_block.map(Box::new),
        })
    }

    pub fn while_stmt(&mut self, condition: Expr, body: Stmt) -> Stmt {
        self.stmt(StmtKind::While {
            condition,
            body: Box::new(body),
        })
    }

    pub fn for_each(&mut self, variable: VarId, collection: Expr, body: Stmt) -> Stmt {
        self.stmt(StmtKind::ForEach {
            variable,
            collection,
            body: Box::new(body),
        })
    }

    pub fn ret(&mut self, value: Option<Expr>) -> Stmt {
        self.stmt(StmtKind::Return(value))
    }

    pub fn empty_stmt(&mut self) -> Stmt {
        self.stmt(StmtKind::Empty)
    }

    // ====================================================================
    // Declarations
    // ====================================================================

    pub fn method_decl(&mut self, id: MethodId, params: Vec<VarId>, body: Stmt) -> MethodDecl {
        MethodDecl {
            id,
            node: self.node(),
            span: self.span(),
            params,
            body,
        }
    }

    pub fn class_decl(&mut self, id: ClassId, methods: Vec<MethodDecl>) -> ClassDecl {
        ClassDecl {
            id,
            node: self.node(),
            span: self.span(),
            methods,
        }
    }
}
