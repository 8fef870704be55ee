use rustc_hash::FxHashSet;

use quill_ast::{
    AstBuilder, BinOp, Expr, Metadata, MethodDecl, Span, Stmt, UnaryOp, VarId,
};
use quill_types::{
    ClassDef, ClassId, ExtensionRegistry, GenericsArg, MethodDef, MethodId, ParamDef, TypeArena,
    TypeId,
};

use crate::{
    SemanticError, TypeChecker, TypeCheckerPlugin, TypeCheckerPluginFactory, TypeError,
};

/// One class under check, with its arena, extension registry and builder.
struct Fixture {
    arena: TypeArena,
    extensions: ExtensionRegistry,
    b: AstBuilder,
    class: ClassId,
}

impl Fixture {
    fn new() -> Self {
        let mut arena = TypeArena::new();
        let class = arena.register_class(ClassDef::new("Main"));
        Self {
            arena,
            extensions: ExtensionRegistry::new(),
            b: AstBuilder::new(),
            class,
        }
    }

    fn list_of(&mut self, elem: TypeId) -> TypeId {
        self.arena
            .parameterized(ClassId::LIST, [GenericsArg::of(elem)])
    }

    fn map_of(&mut self, key: TypeId, value: TypeId) -> TypeId {
        self.arena.parameterized(
            ClassId::MAP,
            [GenericsArg::of(key), GenericsArg::of(value)],
        )
    }

    fn method(
        &mut self,
        name: &str,
        return_type: TypeId,
        params: Vec<VarId>,
        body: Stmt,
    ) -> MethodDecl {
        let defs: Vec<ParamDef> = params
            .iter()
            .map(|&p| {
                let var = self.b.vars.get(p);
                ParamDef::new(var.name.clone(), var.declared_type)
            })
            .collect();
        let id = self
            .arena
            .add_method(MethodDef::new(self.class, name, defs, return_type));
        self.b.method_decl(id, params, body)
    }

    fn run_class(&mut self, methods: Vec<MethodDecl>) -> (Metadata, Vec<TypeError>) {
        let class_decl = self.b.class_decl(self.class, methods);
        let mut checker = TypeChecker::new(
            &mut self.arena,
            &self.extensions,
            &self.b.vars,
            self.class,
            None,
        );
        checker.visit_class(&class_decl);
        checker.perform_second_pass();
        checker.into_results()
    }

    fn check(&mut self, body: Stmt) -> (Metadata, Vec<TypeError>) {
        let method = self.method("run", TypeId::VOID, vec![], body);
        self.run_class(vec![method])
    }

    fn check_expr(&mut self, expr: Expr) -> (Metadata, Vec<TypeError>) {
        let stmt = self.b.expr_stmt(expr);
        let body = self.b.block(vec![stmt]);
        self.check(body)
    }
}

fn assert_no_errors(errors: &[TypeError]) {
    assert!(errors.is_empty(), "unexpected errors: {errors:?}");
}

// ========================================================================
// End-to-end scenarios
// ========================================================================

#[test]
fn branch_join_widens_to_object() {
    // def x; if (c) x = 1 else x = 's'; x
    let mut f = Fixture::new();
    let x = f.b.dynamic_local("x");
    let decl = f.b.declare(x, None);
    let decl_stmt = f.b.expr_stmt(decl);
    let xref = f.b.var_ref(x);
    let one = f.b.int(1);
    let then_assign = f.b.assign(xref, one);
    let then_stmt = f.b.expr_stmt(then_assign);
    let then_block = f.b.block(vec![then_stmt]);
    let xref = f.b.var_ref(x);
    let s = f.b.string("s");
    let else_assign = f.b.assign(xref, s);
    let else_stmt = f.b.expr_stmt(else_assign);
    let else_block = f.b.block(vec![else_stmt]);
    let cond = f.b.bool_lit(true);
    let if_stmt = f.b.if_else(cond, then_block, Some(else_block));
    let final_ref = f.b.var_ref(x);
    let final_id = final_ref.id;
    let final_stmt = f.b.expr_stmt(final_ref);
    let body = f.b.block(vec![decl_stmt, if_stmt, final_stmt]);

    let decl_node = f.b.vars.get(x).decl_node;
    let (meta, errors) = f.check(body);
    assert_no_errors(&errors);
    assert_eq!(meta.inferred_type(decl_node), Some(TypeId::OBJECT));
    assert_eq!(meta.declaration_inferred_type(decl_node), Some(TypeId::OBJECT));
    assert_eq!(meta.inferred_type(final_id), Some(TypeId::OBJECT));
}

#[test]
fn narrowing_literal_assignment_reports_precision_loss() {
    // Integer a = 1L
    let mut f = Fixture::new();
    let a = f.b.local("a", TypeId::INTEGER);
    let one_l = f.b.long(1);
    let decl = f.b.declare(a, Some(one_l));
    let (_, errors) = f.check_expr(decl);
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        &errors[0].error,
        SemanticError::PrecisionLoss { from, to, .. } if from == "Long" && to == "Integer"
    ));
    assert_eq!(
        errors[0].to_string(),
        "[Static type checking] - Possible loose of precision from Long to Integer"
    );
}

#[test]
fn instanceof_refinement_resolves_subclass_method() {
    // void run(A a) { if (a instanceof B) a.bMethod() }
    let mut f = Fixture::new();
    let class_a = f.arena.register_class(ClassDef::new("A"));
    let a_ty = f.arena.raw(class_a);
    let class_b = f.arena.register_class(ClassDef {
        superclass: Some(a_ty),
        ..ClassDef::new("B")
    });
    let b_ty = f.arena.raw(class_b);
    let b_method = f
        .arena
        .add_method(MethodDef::new(class_b, "bMethod", vec![], TypeId::STRING));

    let a = f.b.param("a", a_ty);
    let aref = f.b.var_ref(a);
    let check = f.b.instance_of(aref, b_ty);
    let aref = f.b.var_ref(a);
    let call = f.b.call(aref, "bMethod", vec![]);
    let call_id = call.id;
    let call_stmt = f.b.expr_stmt(call);
    let then_block = f.b.block(vec![call_stmt]);
    let if_stmt = f.b.if_else(check, then_block, None);
    let body = f.b.block(vec![if_stmt]);

    let method = f.method("run", TypeId::VOID, vec![a], body);
    let (meta, errors) = f.run_class(vec![method]);
    assert_no_errors(&errors);
    assert_eq!(meta.direct_method_call_target(call_id), Some(b_method));
    assert_eq!(meta.inferred_type(call_id), Some(TypeId::STRING));
}

#[test]
fn heterogeneous_list_literal_is_incompatible_with_typed_list() {
    // List<String> xs = [1, 'a']
    let mut f = Fixture::new();
    let list_string = f.list_of(TypeId::STRING);
    let xs = f.b.local("xs", list_string);
    let one = f.b.int(1);
    let a = f.b.string("a");
    let literal = f.b.list(vec![one, a]);
    let decl = f.b.declare(xs, Some(literal));
    let (_, errors) = f.check_expr(decl);
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        &errors[0].error,
        SemanticError::GenericsIncompatible { right, left, .. }
            if right == "List<Object>" && left == "List<String>"
    ));
}

#[test]
fn closure_call_result_type_flows_into_assignment() {
    // def c = { int x -> x + 1 }; String s = c(2)
    let mut f = Fixture::new();
    let c = f.b.dynamic_local("c");
    let x = f.b.param("x", TypeId::INT);
    let xref = f.b.var_ref(x);
    let one = f.b.int(1);
    let plus = f.b.binary(BinOp::Plus, xref, one);
    let tail = f.b.expr_stmt(plus);
    let closure_body = f.b.block(vec![tail]);
    let closure = f.b.closure(vec![x], closure_body);
    let c_decl = f.b.declare(c, Some(closure));
    let c_stmt = f.b.expr_stmt(c_decl);

    let s = f.b.local("s", TypeId::STRING);
    let cref = f.b.var_ref(c);
    let two = f.b.int(2);
    let call = f.b.call(cref, "call", vec![two]);
    let s_decl = f.b.declare(s, Some(call));
    let s_stmt = f.b.expr_stmt(s_decl);
    let body = f.b.block(vec![c_stmt, s_stmt]);

    let (_, errors) = f.check(body);
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        &errors[0].error,
        SemanticError::AssignmentIncompatible { right, left, .. }
            if right == "Integer" && left == "String"
    ));
}

#[test]
fn closure_shared_variable_fails_second_pass_on_lub() {
    // def v = 1; def cl = { v = 'x' }; cl(); v.intValue()
    let mut f = Fixture::new();
    f.arena
        .add_method(MethodDef::new(ClassId::INTEGER, "intValue", vec![], TypeId::INT));

    let v = f.b.dynamic_local("v");
    f.b.mark_closure_shared(v);
    let cl = f.b.dynamic_local("cl");

    let one = f.b.int(1);
    let v_decl = f.b.declare(v, Some(one));
    let v_stmt = f.b.expr_stmt(v_decl);

    let vref = f.b.var_ref(v);
    let x = f.b.string("x");
    let inner_assign = f.b.assign(vref, x);
    let inner_stmt = f.b.expr_stmt(inner_assign);
    let closure_body = f.b.block(vec![inner_stmt]);
    let closure = f.b.closure(vec![], closure_body);
    let cl_decl = f.b.declare(cl, Some(closure));
    let cl_stmt = f.b.expr_stmt(cl_decl);

    let clref = f.b.var_ref(cl);
    let cl_call = f.b.call(clref, "call", vec![]);
    let cl_call_stmt = f.b.expr_stmt(cl_call);

    let vref = f.b.var_ref(v);
    let int_value_call = f.b.call(vref, "intValue", vec![]);
    let int_value_stmt = f.b.expr_stmt(int_value_call);

    let body = f.b.block(vec![v_stmt, cl_stmt, cl_call_stmt, int_value_stmt]);
    let (_, errors) = f.check(body);
    assert_eq!(errors.len(), 1, "errors: {errors:?}");
    assert!(matches!(
        &errors[0].error,
        SemanticError::ClosureSharedVariableOnLub { variable, lub, .. }
            if variable == "v" && lub == "Object"
    ));
}

// ========================================================================
// Expression typing
// ========================================================================

#[test]
fn undeclared_variable_is_reported() {
    let mut f = Fixture::new();
    let foo = f.b.dynamic_ref("foo");
    let (_, errors) = f.check_expr(foo);
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].to_string(),
        "[Static type checking] - The variable [foo] is undeclared."
    );
}

#[test]
fn errors_without_source_position_are_dropped() {
    let mut f = Fixture::new();
    let mut foo = f.b.dynamic_ref("foo");
    foo.span = Span::default();
    let (_, errors) = f.check_expr(foo);
    assert_no_errors(&errors);
}

#[test]
fn numeric_promotion_follows_the_fixed_tables() {
    let cases: Vec<(BinOp, TypeId, TypeId, TypeId)> = vec![
        (BinOp::Plus, TypeId::INT, TypeId::INT, TypeId::INT),
        (BinOp::Plus, TypeId::INT, TypeId::LONG, TypeId::LONG),
        (BinOp::Plus, TypeId::FLOAT, TypeId::FLOAT, TypeId::FLOAT),
        (BinOp::Plus, TypeId::DOUBLE, TypeId::DOUBLE, TypeId::DOUBLE),
        (BinOp::Minus, TypeId::INT, TypeId::BIG_INTEGER, TypeId::BIG_INTEGER),
        (BinOp::Multiply, TypeId::INT, TypeId::BIG_DECIMAL, TypeId::BIG_DECIMAL),
        (BinOp::Power, TypeId::INT, TypeId::INT, TypeId::NUMBER),
        (BinOp::BitAnd, TypeId::INT, TypeId::INT, TypeId::INT),
        (BinOp::BitOr, TypeId::LONG, TypeId::LONG, TypeId::BOXED_LONG),
        (BinOp::LeftShift, TypeId::INT, TypeId::INT, TypeId::INT),
        (BinOp::Less, TypeId::INT, TypeId::INT, TypeId::BOOLEAN),
        (BinOp::Equal, TypeId::INT, TypeId::INT, TypeId::BOOLEAN),
        (BinOp::Divide, TypeId::DOUBLE, TypeId::INT, TypeId::BOXED_DOUBLE),
        (BinOp::Divide, TypeId::INT, TypeId::INT, TypeId::BIG_DECIMAL),
        (BinOp::Divide, TypeId::BIG_DECIMAL, TypeId::INT, TypeId::BIG_DECIMAL),
    ];
    for (op, left_ty, right_ty, expected) in cases {
        let mut f = Fixture::new();
        let l = f.b.param("l", left_ty);
        let r = f.b.param("r", right_ty);
        let lref = f.b.var_ref(l);
        let rref = f.b.var_ref(r);
        let bin = f.b.binary(op, lref, rref);
        let bin_id = bin.id;
        let stmt = f.b.expr_stmt(bin);
        let body = f.b.block(vec![stmt]);
        let method = f.method("run", TypeId::VOID, vec![l, r], body);
        let (meta, errors) = f.run_class(vec![method]);
        assert_no_errors(&errors);
        assert_eq!(
            meta.inferred_type(bin_id),
            Some(expected),
            "{op:?} on {left_ty:?}/{right_ty:?}"
        );
    }
}

#[test]
fn boxed_integer_literals_promote_through_the_lattice() {
    let mut f = Fixture::new();
    let one = f.b.int(1);
    let two = f.b.int(2);
    let plus = f.b.binary(BinOp::Plus, one, two);
    let plus_id = plus.id;
    let (meta, errors) = f.check_expr(plus);
    assert_no_errors(&errors);
    assert_eq!(meta.inferred_type(plus_id), Some(TypeId::INTEGER));
}

#[test]
fn regex_find_yields_matcher_and_match_yields_boolean() {
    let mut f = Fixture::new();
    let s = f.b.string("abc");
    let p = f.b.string("a.c");
    let find = f.b.binary(BinOp::FindRegex, s, p);
    let find_id = find.id;
    let (meta, errors) = f.check_expr(find);
    assert_no_errors(&errors);
    assert_eq!(meta.inferred_type(find_id), Some(TypeId::MATCHER));

    let mut f = Fixture::new();
    let s = f.b.string("abc");
    let p = f.b.string("a.c");
    let matches = f.b.binary(BinOp::MatchRegex, s, p);
    let matches_id = matches.id;
    let (meta, errors) = f.check_expr(matches);
    assert_no_errors(&errors);
    assert_eq!(meta.inferred_type(matches_id), Some(TypeId::BOOLEAN));
}

#[test]
fn indexing_strings_and_typed_lists() {
    let mut f = Fixture::new();
    let s = f.b.string("abc");
    let zero = f.b.int(0);
    let index = f.b.binary(BinOp::Index, s, zero);
    let index_id = index.id;
    let (meta, errors) = f.check_expr(index);
    assert_no_errors(&errors);
    assert_eq!(meta.inferred_type(index_id), Some(TypeId::STRING));

    let mut f = Fixture::new();
    let list_string = f.list_of(TypeId::STRING);
    let xs = f.b.local("xs", list_string);
    let xref = f.b.var_ref(xs);
    let zero = f.b.int(0);
    let index = f.b.binary(BinOp::Index, xref, zero);
    let index_id = index.id;
    let (meta, errors) = f.check_expr(index);
    assert_no_errors(&errors);
    assert_eq!(meta.inferred_type(index_id), Some(TypeId::STRING));
}

#[test]
fn unary_operators_preserve_the_wrapper() {
    let mut f = Fixture::new();
    let one = f.b.int(1);
    let neg = f.b.unary(UnaryOp::Minus, one);
    let neg_id = neg.id;
    let (meta, errors) = f.check_expr(neg);
    assert_no_errors(&errors);
    assert_eq!(meta.inferred_type(neg_id), Some(TypeId::INTEGER));

    let mut f = Fixture::new();
    let s = f.b.string("a+");
    let pattern = f.b.unary(UnaryOp::BitwiseNegate, s);
    let pattern_id = pattern.id;
    let (meta, errors) = f.check_expr(pattern);
    assert_no_errors(&errors);
    assert_eq!(meta.inferred_type(pattern_id), Some(TypeId::PATTERN));
}

#[test]
fn list_literal_parameterization_is_the_wrapped_lub() {
    let mut f = Fixture::new();
    let one = f.b.int(1);
    let two = f.b.int(2);
    let three = f.b.int(3);
    let list = f.b.list(vec![one, two, three]);
    let list_id = list.id;
    let (meta, errors) = f.check_expr(list);
    assert_no_errors(&errors);
    let expected = f.list_of(TypeId::INTEGER);
    assert_eq!(meta.inferred_type(list_id), Some(expected));
}

#[test]
fn map_and_range_literals_parameterize() {
    let mut f = Fixture::new();
    let k = f.b.string("a");
    let v = f.b.int(1);
    let map = f.b.map(vec![(k, v)]);
    let map_id = map.id;
    let (meta, errors) = f.check_expr(map);
    assert_no_errors(&errors);
    let expected = f.map_of(TypeId::STRING, TypeId::INTEGER);
    assert_eq!(meta.inferred_type(map_id), Some(expected));

    let mut f = Fixture::new();
    let from = f.b.int(1);
    let to = f.b.int(5);
    let range = f.b.range(from, to);
    let range_id = range.id;
    let (meta, errors) = f.check_expr(range);
    assert_no_errors(&errors);
    let expected = f
        .arena
        .parameterized(ClassId::RANGE, [GenericsArg::of(TypeId::INTEGER)]);
    assert_eq!(meta.inferred_type(range_id), Some(expected));
}

#[test]
fn ternary_type_is_the_branch_lub() {
    let mut f = Fixture::new();
    let cond = f.b.bool_lit(true);
    let one = f.b.int(1);
    let s = f.b.string("s");
    let ternary = f.b.ternary(cond, one, s);
    let ternary_id = ternary.id;
    let (meta, errors) = f.check_expr(ternary);
    assert_no_errors(&errors);
    assert_eq!(meta.inferred_type(ternary_id), Some(TypeId::OBJECT));
}

#[test]
fn cast_rules() {
    // (char) 'c' on a one-character string literal
    let mut f = Fixture::new();
    let c = f.b.string("c");
    let cast = f.b.cast(TypeId::CHAR, c, false);
    let (_, errors) = f.check_expr(cast);
    assert_no_errors(&errors);

    // numeric casts are always allowed
    let mut f = Fixture::new();
    let l = f.b.long(1);
    let cast = f.b.cast(TypeId::INT, l, false);
    let (_, errors) = f.check_expr(cast);
    assert_no_errors(&errors);

    // null casts to any reference type
    let mut f = Fixture::new();
    let null = f.b.null();
    let cast = f.b.cast(TypeId::STRING, null, false);
    let (_, errors) = f.check_expr(cast);
    assert_no_errors(&errors);

    // coercion is permitted unconditionally
    let mut f = Fixture::new();
    let one = f.b.int(1);
    let cast = f.b.cast(TypeId::CLOSURE, one, true);
    let (_, errors) = f.check_expr(cast);
    assert_no_errors(&errors);

    // a plain inconvertible cast is an error
    let mut f = Fixture::new();
    let one = f.b.int(1);
    let cast = f.b.cast(TypeId::CLOSURE, one, false);
    let cast_id = cast.id;
    let (meta, errors) = f.check_expr(cast);
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        &errors[0].error,
        SemanticError::InconvertibleCast { from, to, .. }
            if from == "Integer" && to == "Closure"
    ));
    assert_eq!(meta.inferred_type(cast_id), Some(TypeId::CLOSURE));
}

// ========================================================================
// Properties
// ========================================================================

#[test]
fn array_length_is_int() {
    let mut f = Fixture::new();
    let ints = f.arena.array(TypeId::INT);
    let arr = f.b.local("arr", ints);
    let aref = f.b.var_ref(arr);
    let length = f.b.property(aref, "length");
    let length_id = length.id;
    let (meta, errors) = f.check_expr(length);
    assert_no_errors(&errors);
    assert_eq!(meta.inferred_type(length_id), Some(TypeId::INT));
}

#[test]
fn unknown_property_reports_the_receiver_class() {
    let mut f = Fixture::new();
    let s = f.b.local("s", TypeId::STRING);
    let sref = f.b.var_ref(s);
    let missing = f.b.property(sref, "foo");
    let missing_id = missing.id;
    let (meta, errors) = f.check_expr(missing);
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].to_string(),
        "[Static type checking] - No such property: foo for class: String"
    );
    // Best-effort fallback keeps downstream checks alive.
    assert_eq!(meta.inferred_type(missing_id), Some(TypeId::OBJECT));
}

#[test]
fn map_and_list_property_access_always_succeeds() {
    let mut f = Fixture::new();
    let map_ty = f.map_of(TypeId::STRING, TypeId::INTEGER);
    let m = f.b.local("m", map_ty);
    let mref = f.b.var_ref(m);
    let anything = f.b.property(mref, "anything");
    let anything_id = anything.id;
    let (meta, errors) = f.check_expr(anything);
    assert_no_errors(&errors);
    assert_eq!(meta.inferred_type(anything_id), Some(TypeId::OBJECT));
}

#[test]
fn readonly_property_assignment_is_rejected() {
    let mut f = Fixture::new();
    let person = f.arena.register_class(ClassDef::new("Person"));
    f.arena
        .add_method(MethodDef::new(person, "getName", vec![], TypeId::STRING));
    let person_ty = f.arena.raw(person);
    let p = f.b.local("p", person_ty);
    let pref = f.b.var_ref(p);
    let name = f.b.property(pref, "name");
    let value = f.b.string("x");
    let assign = f.b.assign(name, value);
    let (_, errors) = f.check_expr(assign);
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].to_string(),
        "[Static type checking] - Cannot set read-only property: name"
    );
}

#[test]
fn getter_shaped_call_resolves_as_property_access() {
    let mut f = Fixture::new();
    let person = f.arena.register_class(ClassDef::new("Person"));
    f.arena.add_property(person, "name", TypeId::STRING);
    let person_ty = f.arena.raw(person);
    let p = f.b.local("p", person_ty);
    let pref = f.b.var_ref(p);
    let call = f.b.call(pref, "getName", vec![]);
    let call_id = call.id;
    let (meta, errors) = f.check_expr(call);
    assert_no_errors(&errors);
    assert_eq!(meta.inferred_type(call_id), Some(TypeId::STRING));
}

#[test]
fn spread_property_on_maps_is_restricted_to_key_and_value() {
    let mut f = Fixture::new();
    let map_ty = f.map_of(TypeId::STRING, TypeId::INTEGER);
    let m = f.b.local("m", map_ty);
    let mref = f.b.var_ref(m);
    let keys = f.b.spread_property(mref, "key");
    let keys_id = keys.id;
    let (meta, errors) = f.check_expr(keys);
    assert_no_errors(&errors);
    let expected = f.list_of(TypeId::STRING);
    assert_eq!(meta.inferred_type(keys_id), Some(expected));

    let mut f = Fixture::new();
    let map_ty = f.map_of(TypeId::STRING, TypeId::INTEGER);
    let m = f.b.local("m", map_ty);
    let mref = f.b.var_ref(m);
    let other = f.b.spread_property(mref, "entries");
    let (_, errors) = f.check_expr(other);
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        &errors[0].error,
        SemanticError::SpreadMapProperty { .. }
    ));
}

#[test]
fn spread_property_on_lists_keeps_the_raw_list_type() {
    // Element properties of a list spread are deliberately not inferred.
    let mut f = Fixture::new();
    let list_string = f.list_of(TypeId::STRING);
    let xs = f.b.local("xs", list_string);
    let xref = f.b.var_ref(xs);
    let spread = f.b.spread_property(xref, "bytes");
    let spread_id = spread.id;
    let (meta, errors) = f.check_expr(spread);
    assert_no_errors(&errors);
    assert_eq!(meta.inferred_type(spread_id), Some(TypeId::LIST));
}

// ========================================================================
// Assignment checking
// ========================================================================

#[test]
fn tuple_destructuring_checks_arity_and_element_types() {
    let mut f = Fixture::new();
    let a = f.b.local("a", TypeId::INTEGER);
    let s = f.b.local("s", TypeId::STRING);
    let aref = f.b.var_ref(a);
    let sref = f.b.var_ref(s);
    let tuple = f.b.tuple(vec![aref, sref]);
    let one = f.b.int(1);
    let x = f.b.string("x");
    let list = f.b.list(vec![one, x]);
    let assign = f.b.assign(tuple, list);
    let (_, errors) = f.check_expr(assign);
    assert_no_errors(&errors);

    let mut f = Fixture::new();
    let a = f.b.local("a", TypeId::INTEGER);
    let s = f.b.local("s", TypeId::STRING);
    let aref = f.b.var_ref(a);
    let sref = f.b.var_ref(s);
    let tuple = f.b.tuple(vec![aref, sref]);
    let one = f.b.int(1);
    let list = f.b.list(vec![one]);
    let assign = f.b.assign(tuple, list);
    let (_, errors) = f.check_expr(assign);
    assert!(matches!(
        &errors[0].error,
        SemanticError::TupleArityMismatch {
            expected: 2,
            found: 1,
            ..
        }
    ));

    let mut f = Fixture::new();
    let a = f.b.local("a", TypeId::INTEGER);
    let aref = f.b.var_ref(a);
    let tuple = f.b.tuple(vec![aref]);
    let one = f.b.int(1);
    let assign = f.b.assign(tuple, one);
    let (_, errors) = f.check_expr(assign);
    assert!(matches!(
        &errors[0].error,
        SemanticError::MultipleAssignmentWithoutList { .. }
    ));
}

#[test]
fn array_assignment_checks_component_types() {
    let mut f = Fixture::new();
    let strings = f.arena.array(TypeId::STRING);
    let arr = f.b.local("arr", strings);
    let a = f.b.string("a");
    let one = f.b.int(1);
    let literal = f.b.list(vec![a, one]);
    let decl = f.b.declare(arr, Some(literal));
    let (_, errors) = f.check_expr(decl);
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        &errors[0].error,
        SemanticError::ArrayAssignmentIncompatible { value, array, .. }
            if value == "Integer" && array == "String[]"
    ));
}

#[test]
fn list_literal_as_constructor_call() {
    // Dim d = [100, 200] requires a matching constructor.
    let mut f = Fixture::new();
    let dim = f.arena.register_class(ClassDef::new("Dim"));
    let dim_ty = f.arena.raw(dim);
    f.arena.add_method(MethodDef::new(
        dim,
        MethodDef::CTOR_NAME,
        vec![
            ParamDef::new("w", TypeId::INT),
            ParamDef::new("h", TypeId::INT),
        ],
        dim_ty,
    ));
    let d = f.b.local("d", dim_ty);
    let w = f.b.int(100);
    let h = f.b.int(200);
    let literal = f.b.list(vec![w, h]);
    let decl = f.b.declare(d, Some(literal));
    let (_, errors) = f.check_expr(decl);
    assert_no_errors(&errors);

    let mut f2 = Fixture::new();
    let dim = f2.arena.register_class(ClassDef::new("Dim"));
    let dim_ty = f2.arena.raw(dim);
    f2.arena.add_method(MethodDef::new(
        dim,
        MethodDef::CTOR_NAME,
        vec![
            ParamDef::new("w", TypeId::INT),
            ParamDef::new("h", TypeId::INT),
        ],
        dim_ty,
    ));
    let d = f2.b.local("d", dim_ty);
    let w = f2.b.int(100);
    let literal = f2.b.list(vec![w]);
    let decl = f2.b.declare(d, Some(literal));
    let (_, errors) = f2.check_expr(decl);
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        &errors[0].error,
        SemanticError::UnknownConstructor { type_name, .. } if type_name == "Dim"
    ));
}

#[test]
fn map_literal_as_named_argument_constructor() {
    fn pt_fixture() -> (Fixture, TypeId) {
        let mut f = Fixture::new();
        let pt = f.arena.register_class(ClassDef::new("Pt"));
        let pt_ty = f.arena.raw(pt);
        f.arena.add_property(pt, "x", TypeId::INT);
        f.arena.add_property(pt, "y", TypeId::INT);
        f.arena.add_method(MethodDef::new(
            pt,
            MethodDef::CTOR_NAME,
            vec![ParamDef::new("values", TypeId::MAP)],
            pt_ty,
        ));
        (f, pt_ty)
    }

    // Pt p = [x: 1, y: 2]
    let (mut f, pt_ty) = pt_fixture();
    let p = f.b.local("p", pt_ty);
    let kx = f.b.string("x");
    let vx = f.b.int(1);
    let ky = f.b.string("y");
    let vy = f.b.int(2);
    let literal = f.b.map(vec![(kx, vx), (ky, vy)]);
    let decl = f.b.declare(p, Some(literal));
    let (_, errors) = f.check_expr(decl);
    assert_no_errors(&errors);

    // Unknown key
    let (mut f, pt_ty) = pt_fixture();
    let p = f.b.local("p", pt_ty);
    let kz = f.b.string("z");
    let vz = f.b.int(1);
    let literal = f.b.map(vec![(kz, vz)]);
    let decl = f.b.declare(p, Some(literal));
    let (_, errors) = f.check_expr(decl);
    assert!(matches!(
        &errors[0].error,
        SemanticError::UnknownProperty { property, .. } if property == "z"
    ));

    // Non-constant key
    let (mut f, pt_ty) = pt_fixture();
    let p = f.b.local("p", pt_ty);
    let key_var = f.b.local("k", TypeId::STRING);
    let kref = f.b.var_ref(key_var);
    let v = f.b.int(1);
    let literal = f.b.map(vec![(kref, v)]);
    let decl = f.b.declare(p, Some(literal));
    let (_, errors) = f.check_expr(decl);
    assert!(matches!(
        &errors[0].error,
        SemanticError::DynamicMapKey { .. }
    ));

    // Value incompatible with the property type
    let (mut f, pt_ty) = pt_fixture();
    let p = f.b.local("p", pt_ty);
    let kx = f.b.string("x");
    let vx = f.b.string("oops");
    let literal = f.b.map(vec![(kx, vx)]);
    let decl = f.b.declare(p, Some(literal));
    let (_, errors) = f.check_expr(decl);
    assert!(matches!(
        &errors[0].error,
        SemanticError::PropertyAssignmentIncompatible { value, field, .. }
            if value == "String" && field == "int"
    ));
}

#[test]
fn empty_list_literal_keeps_the_declared_type() {
    let mut f = Fixture::new();
    let list_string = f.list_of(TypeId::STRING);
    let xs = f.b.local("xs", list_string);
    let literal = f.b.list(vec![]);
    let decl = f.b.declare(xs, Some(literal));
    let decl_id = decl.id;
    let (meta, errors) = f.check_expr(decl);
    assert_no_errors(&errors);
    assert_eq!(meta.inferred_type(decl_id), Some(list_string));
}

#[test]
fn diamond_constructor_adopts_the_target_parameterization() {
    let mut f = Fixture::new();
    let list_string = f.list_of(TypeId::STRING);
    let xs = f.b.local("xs", list_string);
    let ctor = f.b.diamond_ctor_call(TypeId::ARRAY_LIST, vec![]);
    let ctor_id = ctor.id;
    let decl = f.b.declare(xs, Some(ctor));
    let (meta, errors) = f.check_expr(decl);
    assert_no_errors(&errors);
    let expected = f
        .arena
        .parameterized(ClassId::ARRAY_LIST, [GenericsArg::of(TypeId::STRING)]);
    assert_eq!(meta.inferred_type(ctor_id), Some(expected));
}

// ========================================================================
// Method resolution
// ========================================================================

/// Registers `sum(int)` and `sum(int, int[])` on a receiver class.
fn overload_fixture() -> (Fixture, VarId, MethodId, MethodId) {
    let mut f = Fixture::new();
    let util = f.arena.register_class(ClassDef::new("Util"));
    let util_ty = f.arena.raw(util);
    let exact = f.arena.add_method(MethodDef::new(
        util,
        "sum",
        vec![ParamDef::new("x", TypeId::INT)],
        TypeId::INT,
    ));
    let ints = f.arena.array(TypeId::INT);
    let vararg = f.arena.add_method(MethodDef::new(
        util,
        "sum",
        vec![ParamDef::new("x", TypeId::INT), ParamDef::new("rest", ints)],
        TypeId::INT,
    ));
    let u = f.b.local("u", util_ty);
    (f, u, exact, vararg)
}

#[test]
fn exact_match_is_preferred_over_vararg_fold() {
    let (mut f, u, exact, _) = overload_fixture();
    let x = f.b.param("x", TypeId::INT);
    let uref = f.b.var_ref(u);
    let xref = f.b.var_ref(x);
    let call = f.b.call(uref, "sum", vec![xref]);
    let call_id = call.id;
    let stmt = f.b.expr_stmt(call);
    let body = f.b.block(vec![stmt]);
    let method = f.method("run", TypeId::VOID, vec![x], body);
    let (meta, errors) = f.run_class(vec![method]);
    assert_no_errors(&errors);
    assert_eq!(meta.direct_method_call_target(call_id), Some(exact));
}

#[test]
fn excess_arguments_fold_into_the_vararg() {
    let (mut f, u, _, vararg) = overload_fixture();
    let x = f.b.param("x", TypeId::INT);
    let uref = f.b.var_ref(u);
    let a1 = f.b.var_ref(x);
    let a2 = f.b.var_ref(x);
    let a3 = f.b.var_ref(x);
    let call = f.b.call(uref, "sum", vec![a1, a2, a3]);
    let call_id = call.id;
    let stmt = f.b.expr_stmt(call);
    let body = f.b.block(vec![stmt]);
    let method = f.method("run", TypeId::VOID, vec![x], body);
    let (meta, errors) = f.run_class(vec![method]);
    assert_no_errors(&errors);
    assert_eq!(meta.direct_method_call_target(call_id), Some(vararg));
}

#[test]
fn equally_distant_overloads_are_ambiguous() {
    let mut f = Fixture::new();
    let amb = f.arena.register_class(ClassDef::new("Amb"));
    let amb_ty = f.arena.raw(amb);
    f.arena.add_method(MethodDef::new(
        amb,
        "f",
        vec![ParamDef::new("n", TypeId::NUMBER)],
        TypeId::INT,
    ));
    f.arena.add_method(MethodDef::new(
        amb,
        "f",
        vec![ParamDef::new("c", TypeId::COMPARABLE)],
        TypeId::INT,
    ));
    let a = f.b.local("a", amb_ty);
    let aref = f.b.var_ref(a);
    let one = f.b.int(1);
    let call = f.b.call(aref, "f", vec![one]);
    let (_, errors) = f.check_expr(call);
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        &errors[0].error,
        SemanticError::AmbiguousMethod { .. }
    ));
}

#[test]
fn unknown_method_reports_receiver_and_signature() {
    let mut f = Fixture::new();
    let s = f.b.local("s", TypeId::STRING);
    let sref = f.b.var_ref(s);
    let one = f.b.int(1);
    let call = f.b.call(sref, "frobnicate", vec![one]);
    let (_, errors) = f.check_expr(call);
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].to_string(),
        "[Static type checking] - Cannot find matching method String#frobnicate(Integer)"
    );
}

#[test]
fn extension_methods_resolve_after_declared_methods() {
    let mut f = Fixture::new();
    let each = f.arena.add_detached_method(MethodDef::new(
        ClassId::COLLECTION,
        "each",
        vec![ParamDef::new("action", TypeId::CLOSURE)],
        TypeId::OBJECT,
    ));
    f.extensions.register(ClassId::COLLECTION, "each", each);

    let list_string = f.list_of(TypeId::STRING);
    let xs = f.b.local("xs", list_string);
    let xref = f.b.var_ref(xs);
    let body = f.b.block(vec![]);
    let action = f.b.closure(vec![], body);
    let call = f.b.call(xref, "each", vec![action]);
    let call_id = call.id;
    let (meta, errors) = f.check_expr(call);
    assert_no_errors(&errors);
    assert_eq!(meta.direct_method_call_target(call_id), Some(each));
}

#[test]
fn gstring_receivers_retry_with_string() {
    let mut f = Fixture::new();
    let upper = f.arena.add_method(MethodDef::new(
        ClassId::STRING,
        "toUpperCase",
        vec![],
        TypeId::STRING,
    ));
    let g = f.b.gstring("hi ${name}");
    let call = f.b.call(g, "toUpperCase", vec![]);
    let call_id = call.id;
    let (meta, errors) = f.check_expr(call);
    assert_no_errors(&errors);
    assert_eq!(meta.direct_method_call_target(call_id), Some(upper));
    assert_eq!(meta.inferred_type(call_id), Some(TypeId::STRING));
}

#[test]
fn generic_receiver_rejects_argument_outside_its_parameterization() {
    // List<String> xs; xs.add(1)
    let mut f = Fixture::new();
    let e = f.arena.placeholder("E");
    f.arena.add_method(MethodDef::new(
        ClassId::LIST,
        "add",
        vec![ParamDef::new("e", e)],
        TypeId::BOOLEAN,
    ));
    let list_string = f.list_of(TypeId::STRING);
    let xs = f.b.local("xs", list_string);
    let xref = f.b.var_ref(xs);
    let one = f.b.int(1);
    let call = f.b.call(xref, "add", vec![one]);
    let (_, errors) = f.check_expr(call);
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        &errors[0].error,
        SemanticError::GenericsCallArguments { signature, args, .. }
            if signature == "List<String>#add(String)" && args == "[Integer]"
    ));
}

#[test]
fn generic_return_type_reconstructs_from_the_receiver() {
    // List<String> xs; xs.get(0) -> String
    let mut f = Fixture::new();
    let e = f.arena.placeholder("E");
    f.arena.add_method(MethodDef::new(
        ClassId::LIST,
        "get",
        vec![ParamDef::new("index", TypeId::INT)],
        e,
    ));
    let list_string = f.list_of(TypeId::STRING);
    let xs = f.b.local("xs", list_string);
    let xref = f.b.var_ref(xs);
    let zero = f.b.int(0);
    let call = f.b.call(xref, "get", vec![zero]);
    let call_id = call.id;
    let (meta, errors) = f.check_expr(call);
    assert_no_errors(&errors);
    assert_eq!(meta.inferred_type(call_id), Some(TypeId::STRING));
}

#[test]
fn generic_return_type_reconstructs_from_arguments() {
    // static-style: first(List<E>) -> E called with List<String>
    let mut f = Fixture::new();
    let e = f.arena.placeholder("E");
    let list_e = f
        .arena
        .parameterized(ClassId::LIST, [GenericsArg::placeholder("E", e)]);
    let helper = f.arena.register_class(ClassDef::new("Helper"));
    let helper_ty = f.arena.raw(helper);
    f.arena.add_method(MethodDef::new(
        helper,
        "first",
        vec![ParamDef::new("xs", list_e)],
        e,
    ));
    let h = f.b.local("h", helper_ty);
    let list_string = f.list_of(TypeId::STRING);
    let xs = f.b.local("xs", list_string);
    let href = f.b.var_ref(h);
    let xsref = f.b.var_ref(xs);
    let call = f.b.call(href, "first", vec![xsref]);
    let call_id = call.id;
    let (meta, errors) = f.check_expr(call);
    assert_no_errors(&errors);
    assert_eq!(meta.inferred_type(call_id), Some(TypeId::STRING));
}

#[test]
fn constructor_calls_resolve_and_annotate() {
    let mut f = Fixture::new();
    let dim = f.arena.register_class(ClassDef::new("Dim"));
    let dim_ty = f.arena.raw(dim);
    let ctor = f.arena.add_method(MethodDef::new(
        dim,
        MethodDef::CTOR_NAME,
        vec![ParamDef::new("w", TypeId::INT)],
        dim_ty,
    ));
    let w = f.b.int(10);
    let new_dim = f.b.ctor_call(dim_ty, vec![w]);
    let new_id = new_dim.id;
    let (meta, errors) = f.check_expr(new_dim);
    assert_no_errors(&errors);
    assert_eq!(meta.direct_method_call_target(new_id), Some(ctor));
    assert_eq!(meta.inferred_type(new_id), Some(dim_ty));

    // A class without declared constructors gets the implicit nullary one.
    let mut f = Fixture::new();
    let empty = f.arena.register_class(ClassDef::new("Empty"));
    let empty_ty = f.arena.raw(empty);
    let new_empty = f.b.ctor_call(empty_ty, vec![]);
    let (_, errors) = f.check_expr(new_empty);
    assert_no_errors(&errors);
}

// ========================================================================
// Calls: with, spread, closures
// ========================================================================

fn register_with_extension(f: &mut Fixture) {
    let with = f.arena.add_detached_method(MethodDef::new(
        ClassId::OBJECT,
        "with",
        vec![ParamDef::new("body", TypeId::CLOSURE)],
        TypeId::OBJECT,
    ));
    f.extensions.register(ClassId::OBJECT, "with", with);
}

#[test]
fn with_call_resolves_dynamic_members_against_the_receiver() {
    let mut f = Fixture::new();
    register_with_extension(&mut f);
    let dim = f.arena.register_class(ClassDef::new("Dim"));
    f.arena.add_property(dim, "width", TypeId::INT);
    let dim_ty = f.arena.raw(dim);

    let d = f.b.local("d", dim_ty);
    let width = f.b.dynamic_ref("width");
    let width_id = width.id;
    let width_stmt = f.b.expr_stmt(width);
    let closure_body = f.b.block(vec![width_stmt]);
    let closure = f.b.closure(vec![], closure_body);
    let dref = f.b.var_ref(d);
    let call = f.b.call(dref, "with", vec![closure]);
    let (meta, errors) = f.check_expr(call);
    assert_no_errors(&errors);
    assert_eq!(meta.inferred_type(width_id), Some(TypeId::INT));
}

#[test]
fn with_call_parameter_checks() {
    // Two parameters: error.
    let mut f = Fixture::new();
    register_with_extension(&mut f);
    let d = f.b.local("d", TypeId::STRING);
    let p1 = f.b.param("a", TypeId::OBJECT);
    let p2 = f.b.param("b", TypeId::OBJECT);
    let closure_body = f.b.block(vec![]);
    let closure = f.b.closure(vec![p1, p2], closure_body);
    let dref = f.b.var_ref(d);
    let call = f.b.call(dref, "with", vec![closure]);
    let (_, errors) = f.check_expr(call);
    assert!(errors
        .iter()
        .any(|e| matches!(e.error, SemanticError::WithParameterCount { .. })));

    // One explicitly-typed parameter that cannot hold the receiver: error.
    let mut f = Fixture::new();
    register_with_extension(&mut f);
    let d = f.b.local("d", TypeId::STRING);
    let p = f.b.param("it", TypeId::INTEGER);
    let closure_body = f.b.block(vec![]);
    let closure = f.b.closure(vec![p], closure_body);
    let dref = f.b.var_ref(d);
    let call = f.b.call(dref, "with", vec![closure]);
    let (_, errors) = f.check_expr(call);
    assert!(errors
        .iter()
        .any(|e| matches!(&e.error, SemanticError::WithParameterType { expected, found, .. }
            if expected == "String" && found == "Integer")));
}

#[test]
fn spread_call_produces_a_list_of_the_component_result() {
    let mut f = Fixture::new();
    f.arena.add_method(MethodDef::new(
        ClassId::STRING,
        "toUpperCase",
        vec![],
        TypeId::STRING,
    ));
    let list_string = f.list_of(TypeId::STRING);
    let xs = f.b.local("xs", list_string);
    let xref = f.b.var_ref(xs);
    let call = f.b.spread_call(xref, "toUpperCase", vec![]);
    let call_id = call.id;
    let (meta, errors) = f.check_expr(call);
    assert_no_errors(&errors);
    let expected = f.list_of(TypeId::STRING);
    assert_eq!(meta.inferred_type(call_id), Some(expected));
}

#[test]
fn spread_call_on_non_collection_is_an_error() {
    let mut f = Fixture::new();
    let s = f.b.local("s", TypeId::STRING);
    let sref = f.b.var_ref(s);
    let call = f.b.spread_call(sref, "toUpperCase", vec![]);
    let (_, errors) = f.check_expr(call);
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        &errors[0].error,
        SemanticError::SpreadOnNonCollection { .. }
    ));
}

#[test]
fn closure_call_arguments_are_checked_against_recorded_parameters() {
    let mut f = Fixture::new();
    let c = f.b.dynamic_local("c");
    let x = f.b.param("x", TypeId::INT);
    let xref = f.b.var_ref(x);
    let tail = f.b.expr_stmt(xref);
    let closure_body = f.b.block(vec![tail]);
    let closure = f.b.closure(vec![x], closure_body);
    let decl = f.b.declare(c, Some(closure));
    let decl_stmt = f.b.expr_stmt(decl);
    let cref = f.b.var_ref(c);
    let bad = f.b.string("nope");
    let call = f.b.call(cref, "call", vec![bad]);
    let call_stmt = f.b.expr_stmt(call);
    let body = f.b.block(vec![decl_stmt, call_stmt]);
    let (_, errors) = f.check(body);
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        &errors[0].error,
        SemanticError::ClosureArgumentsMismatch { params, args, .. }
            if params == "[int]" && args == "[String]"
    ));
}

#[test]
fn empty_closure_returns_object() {
    let mut f = Fixture::new();
    let body = f.b.block(vec![]);
    let closure = f.b.closure(vec![], body);
    let closure_id = closure.id;
    let (meta, errors) = f.check_expr(closure);
    assert_no_errors(&errors);
    assert_eq!(meta.inferred_return_type(closure_id), Some(TypeId::OBJECT));
    let expected = f
        .arena
        .parameterized(ClassId::CLOSURE, [GenericsArg::of(TypeId::OBJECT)]);
    assert_eq!(meta.inferred_type(closure_id), Some(expected));
}

#[test]
fn closure_inferences_do_not_leak_to_the_enclosing_scope() {
    // def v = 1; def cl = { v = 'x' }; after the closure, v is still Integer.
    let mut f = Fixture::new();
    let v = f.b.dynamic_local("v");
    f.b.mark_closure_shared(v);
    let one = f.b.int(1);
    let v_decl = f.b.declare(v, Some(one));
    let v_stmt = f.b.expr_stmt(v_decl);
    let vref = f.b.var_ref(v);
    let x = f.b.string("x");
    let inner = f.b.assign(vref, x);
    let inner_stmt = f.b.expr_stmt(inner);
    let closure_body = f.b.block(vec![inner_stmt]);
    let closure = f.b.closure(vec![], closure_body);
    let closure_stmt = f.b.expr_stmt(closure);
    let body = f.b.block(vec![v_stmt, closure_stmt]);

    let decl_node = f.b.vars.get(v).decl_node;
    let (meta, errors) = f.check(body);
    assert_no_errors(&errors);
    assert_eq!(meta.inferred_type(decl_node), Some(TypeId::INTEGER));
}

#[test]
fn single_typed_closure_shared_variable_passes_the_second_pass() {
    let mut f = Fixture::new();
    f.arena
        .add_method(MethodDef::new(ClassId::INTEGER, "intValue", vec![], TypeId::INT));
    let v = f.b.dynamic_local("v");
    f.b.mark_closure_shared(v);
    let one = f.b.int(1);
    let v_decl = f.b.declare(v, Some(one));
    let v_stmt = f.b.expr_stmt(v_decl);
    let vref = f.b.var_ref(v);
    let tail = f.b.expr_stmt(vref);
    let closure_body = f.b.block(vec![tail]);
    let closure = f.b.closure(vec![], closure_body);
    let closure_stmt = f.b.expr_stmt(closure);
    let vref = f.b.var_ref(v);
    let call = f.b.call(vref, "intValue", vec![]);
    let call_stmt = f.b.expr_stmt(call);
    let body = f.b.block(vec![v_stmt, closure_stmt, call_stmt]);
    let (_, errors) = f.check(body);
    assert_no_errors(&errors);
}

// ========================================================================
// Statements
// ========================================================================

#[test]
fn for_each_infers_the_element_type() {
    // for (x in List<String>) { x }  with a dynamic loop variable
    let mut f = Fixture::new();
    let list_string = f.list_of(TypeId::STRING);
    let xs = f.b.local("xs", list_string);
    let x = f.b.param("x", TypeId::OBJECT);
    let xref = f.b.var_ref(x);
    let xref_id = xref.id;
    let body_stmt = f.b.expr_stmt(xref);
    let loop_body = f.b.block(vec![body_stmt]);
    let collection = f.b.var_ref(xs);
    let for_stmt = f.b.for_each(x, collection, loop_body);
    let body = f.b.block(vec![for_stmt]);
    let (meta, errors) = f.check(body);
    assert_no_errors(&errors);
    assert_eq!(meta.inferred_type(xref_id), Some(TypeId::STRING));
}

#[test]
fn for_each_over_a_string_iterates_characters() {
    let mut f = Fixture::new();
    let s = f.b.local("s", TypeId::STRING);
    let c = f.b.param("c", TypeId::CHARACTER);
    let loop_body = f.b.block(vec![]);
    let collection = f.b.var_ref(s);
    let for_stmt = f.b.for_each(c, collection, loop_body);
    let body = f.b.block(vec![for_stmt]);
    let (_, errors) = f.check(body);
    assert_no_errors(&errors);
}

#[test]
fn for_each_with_an_incompatible_loop_variable_is_an_error() {
    let mut f = Fixture::new();
    let list_string = f.list_of(TypeId::STRING);
    let xs = f.b.local("xs", list_string);
    let n = f.b.param("n", TypeId::INTEGER);
    let loop_body = f.b.block(vec![]);
    let collection = f.b.var_ref(xs);
    let for_stmt = f.b.for_each(n, collection, loop_body);
    let body = f.b.block(vec![for_stmt]);
    let (_, errors) = f.check(body);
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        &errors[0].error,
        SemanticError::LoopElementIncompatible { element, collection, .. }
            if element == "Integer" && collection == "List<String>"
    ));
}

#[test]
fn incompatible_return_value_is_reported() {
    let mut f = Fixture::new();
    let one = f.b.int(1);
    let ret = f.b.ret(Some(one));
    let body = f.b.block(vec![ret]);
    let method = f.method("run", TypeId::STRING, vec![], body);
    let (_, errors) = f.run_class(vec![method]);
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        &errors[0].error,
        SemanticError::ReturnTypeMismatch { found, expected, .. }
            if found == "Integer" && expected == "String"
    ));
}

#[test]
fn while_loop_assignments_join_on_exit() {
    let mut f = Fixture::new();
    let x = f.b.dynamic_local("x");
    let decl = f.b.declare(x, None);
    let decl_stmt = f.b.expr_stmt(decl);
    let xref = f.b.var_ref(x);
    let s = f.b.string("s");
    let assign = f.b.assign(xref, s);
    let assign_stmt = f.b.expr_stmt(assign);
    let loop_body = f.b.block(vec![assign_stmt]);
    let cond = f.b.bool_lit(true);
    let while_stmt = f.b.while_stmt(cond, loop_body);
    let body = f.b.block(vec![decl_stmt, while_stmt]);
    let decl_node = f.b.vars.get(x).decl_node;
    let (meta, errors) = f.check(body);
    assert_no_errors(&errors);
    assert_eq!(meta.inferred_type(decl_node), Some(TypeId::STRING));
}

// ========================================================================
// Driver behavior
// ========================================================================

#[test]
fn callee_bodies_are_visited_for_inferred_return_types() {
    // helper() has no declared return type; its body returns 1.
    let mut f = Fixture::new();
    let one = f.b.int(1);
    let tail = f.b.expr_stmt(one);
    let helper_body = f.b.block(vec![tail]);
    let helper = f.method("helper", TypeId::OBJECT, vec![], helper_body);
    let helper_node = helper.node;

    let this_ref = f.b.this_ref();
    let call = f.b.call(this_ref, "helper", vec![]);
    let call_id = call.id;
    let call_stmt = f.b.expr_stmt(call);
    let run_body = f.b.block(vec![call_stmt]);
    let run = f.method("run", TypeId::VOID, vec![], run_body);

    let (meta, errors) = f.run_class(vec![run, helper]);
    assert_no_errors(&errors);
    assert_eq!(meta.inferred_return_type(helper_node), Some(TypeId::INTEGER));
    assert_eq!(meta.inferred_type(call_id), Some(TypeId::INTEGER));
}

#[test]
fn recursive_methods_do_not_loop() {
    let mut f = Fixture::new();
    let this_ref = f.b.this_ref();
    let call = f.b.call(this_ref, "run", vec![]);
    let call_stmt = f.b.expr_stmt(call);
    let body = f.b.block(vec![call_stmt]);
    let run = f.method("run", TypeId::VOID, vec![], body);
    let (_, errors) = f.run_class(vec![run]);
    assert_no_errors(&errors);
}

#[test]
fn methods_to_be_visited_gates_checking() {
    let mut f = Fixture::new();
    let bad = f.b.dynamic_ref("nope");
    let bad_stmt = f.b.expr_stmt(bad);
    let helper_body = f.b.block(vec![bad_stmt]);
    let helper = f.method("helper", TypeId::VOID, vec![], helper_body);

    let noop = f.b.empty_stmt();
    let run_body = f.b.block(vec![noop]);
    let run = f.method("run", TypeId::VOID, vec![], run_body);
    let run_id = run.id;

    let class_decl = f.b.class_decl(f.class, vec![run, helper]);
    let mut checker = TypeChecker::new(
        &mut f.arena,
        &f.extensions,
        &f.b.vars,
        f.class,
        None,
    );
    let mut filter = FxHashSet::default();
    filter.insert(run_id);
    checker.set_methods_to_be_visited(filter);
    checker.visit_class(&class_decl);
    checker.perform_second_pass();
    let (_, errors) = checker.into_results();
    assert_no_errors(&errors);
}

// ========================================================================
// Plugin fallbacks
// ========================================================================

struct MagicPlugin {
    magic: MethodId,
}

impl TypeCheckerPlugin for MagicPlugin {
    fn resolve_dynamic_variable_type(
        &self,
        _arena: &mut TypeArena,
        name: &str,
    ) -> Option<TypeId> {
        (name == "conf").then_some(TypeId::STRING)
    }

    fn resolve_property(
        &self,
        _arena: &mut TypeArena,
        _receiver: TypeId,
        name: &str,
    ) -> Option<TypeId> {
        (name == "injected").then_some(TypeId::INTEGER)
    }

    fn find_method(
        &self,
        _arena: &mut TypeArena,
        _receiver: TypeId,
        name: &str,
        _args: &[TypeId],
    ) -> Option<Vec<MethodId>> {
        (name == "magic").then(|| vec![self.magic])
    }
}

struct MagicFactory {
    plugin: MagicPlugin,
}

impl TypeCheckerPluginFactory for MagicFactory {
    fn plugin_for(&self, _class: ClassId) -> Option<&dyn TypeCheckerPlugin> {
        Some(&self.plugin)
    }
}

#[test]
fn plugin_resolves_what_the_checker_cannot() {
    let mut f = Fixture::new();
    let magic = f.arena.add_detached_method(MethodDef::new(
        ClassId::OBJECT,
        "magic",
        vec![],
        TypeId::INT,
    ));
    let factory = MagicFactory {
        plugin: MagicPlugin { magic },
    };

    let o = f.b.local("o", TypeId::OBJECT);
    let oref = f.b.var_ref(o);
    let call = f.b.call(oref, "magic", vec![]);
    let call_id = call.id;
    let call_stmt = f.b.expr_stmt(call);
    let conf = f.b.dynamic_ref("conf");
    let conf_id = conf.id;
    let conf_stmt = f.b.expr_stmt(conf);
    let body = f.b.block(vec![call_stmt, conf_stmt]);

    let method = f.method("run", TypeId::VOID, vec![], body);
    let class_decl = f.b.class_decl(f.class, vec![method]);
    let mut checker = TypeChecker::new(
        &mut f.arena,
        &f.extensions,
        &f.b.vars,
        f.class,
        Some(&factory),
    );
    checker.visit_class(&class_decl);
    checker.perform_second_pass();
    let (meta, errors) = checker.into_results();
    assert_no_errors(&errors);
    assert_eq!(meta.inferred_type(call_id), Some(TypeId::INT));
    assert_eq!(meta.inferred_type(conf_id), Some(TypeId::STRING));
}
