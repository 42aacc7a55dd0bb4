//! Integration tests for the compile-time rewrites.

use std::sync::Arc;

use xylo_core::{IndexKind, MemData, Node, NodeId, NodeKind, NodeSeq};
use xylo_query::{
    CompileContext, Expr, ExprKind, IndexInfo, NumRange, Optimizer, PosRange, StrRange,
};

fn text_node(id: u64) -> Node {
    Node::new(NodeId::new(id), NodeKind::Text)
}

fn cc() -> CompileContext {
    CompileContext::new(Arc::new(MemData::new()))
}

fn optimize(expr: Expr) -> Expr {
    Optimizer::new().optimize(expr, &mut cc()).unwrap()
}

#[test]
fn equal_positions_merge_into_one() {
    let expr = Expr::and(vec![Expr::pos(PosRange::exact(2)), Expr::pos(PosRange::exact(2))]);
    assert_eq!(optimize(expr), Expr::pos(PosRange::exact(2)));
}

#[test]
fn disjoint_positions_fold_to_false() {
    let expr = Expr::and(vec![Expr::pos(PosRange::exact(2)), Expr::pos(PosRange::exact(3))]);
    assert!(optimize(expr).is_false());
}

#[test]
fn overlapping_ranges_merge() {
    let expr = Expr::and(vec![
        Expr::cmp_num(NumRange::new(1.0, 10.0)),
        Expr::cmp_num(NumRange::new(5.0, 20.0)),
    ]);
    assert_eq!(optimize(expr), Expr::cmp_num(NumRange::new(5.0, 10.0)));
}

#[test]
fn disjoint_ranges_stay_separate() {
    // Engine policy: disjoint adjacent ranges are kept as two
    // predicates, the conjunction is not folded to a constant.
    let expr = Expr::and(vec![
        Expr::cmp_num(NumRange::new(1.0, 2.0)),
        Expr::cmp_num(NumRange::new(5.0, 6.0)),
    ]);
    let optimized = optimize(expr);
    match &optimized.kind {
        ExprKind::And(ops) => {
            assert_eq!(ops.len(), 2);
            assert_eq!(ops[0], Expr::cmp_num(NumRange::new(1.0, 2.0)));
            assert_eq!(ops[1], Expr::cmp_num(NumRange::new(5.0, 6.0)));
        }
        other => panic!("expected a conjunction, got {other:?}"),
    }
}

#[test]
fn string_ranges_merge() {
    let expr = Expr::and(vec![
        Expr::cmp_str(StrRange::new("a", true, "m", true)),
        Expr::cmp_str(StrRange::new("c", true, "z", true)),
    ]);
    assert_eq!(optimize(expr), Expr::cmp_str(StrRange::new("c", true, "m", true)));
}

#[test]
fn false_operand_collapses_conjunction() {
    let expr = Expr::and(vec![
        Expr::boolean(false),
        // Unoptimizable garbage after the constant must not matter.
        Expr::var("x"),
    ]);
    assert!(optimize(expr).is_false());
}

#[test]
fn true_operands_are_dropped() {
    let expr = Expr::and(vec![Expr::boolean(true), Expr::pos(PosRange::exact(1))]);
    assert_eq!(optimize(expr), Expr::pos(PosRange::exact(1)));
}

#[test]
fn empty_conjunction_is_true() {
    assert!(optimize(Expr::and(vec![Expr::boolean(true)])).is_true());
    assert!(optimize(Expr::and(Vec::new())).is_true());
}

#[test]
fn empty_disjunction_is_false() {
    assert!(optimize(Expr::or(vec![Expr::boolean(false)])).is_false());
}

#[test]
fn true_operand_collapses_disjunction() {
    let expr = Expr::or(vec![Expr::boolean(true), Expr::var("x")]);
    assert!(optimize(expr).is_true());
}

#[test]
fn de_morgan_on_all_negated_conjunction() {
    let expr = Expr::and(vec![Expr::not(Expr::var("a")), Expr::not(Expr::var("b"))]);
    let optimized = optimize(expr);
    let expected = Expr::not(Expr::or(vec![Expr::var("a"), Expr::var("b")]));
    assert_eq!(optimized, expected);
}

#[test]
fn de_morgan_on_all_negated_disjunction() {
    let expr = Expr::or(vec![Expr::not(Expr::var("a")), Expr::not(Expr::var("b"))]);
    let expected = Expr::not(Expr::and(vec![Expr::var("a"), Expr::var("b")]));
    assert_eq!(optimize(expr), expected);
}

#[test]
fn double_negation_is_eliminated() {
    let expr = Expr::not(Expr::not(Expr::pos(PosRange::exact(1))));
    assert_eq!(optimize(expr), Expr::pos(PosRange::exact(1)));
}

#[test]
fn negated_constant_folds() {
    assert!(optimize(Expr::not(Expr::boolean(true))).is_false());
    assert!(optimize(Expr::not(Expr::boolean(false))).is_true());
}

#[test]
fn optimization_is_idempotent() {
    let exprs = vec![
        Expr::and(vec![Expr::pos(PosRange::exact(2)), Expr::pos(PosRange::new(1, 5))]),
        Expr::and(vec![
            Expr::cmp_num(NumRange::new(1.0, 2.0)),
            Expr::cmp_num(NumRange::new(5.0, 6.0)),
        ]),
        Expr::or(vec![Expr::not(Expr::var("a")), Expr::not(Expr::var("b"))]),
        Expr::intersect(vec![Expr::var("a"), Expr::var("b")]),
        Expr::not(Expr::not(Expr::var("x"))),
    ];
    for expr in exprs {
        let once = optimize(expr);
        let twice = optimize(once.clone());
        assert_eq!(once, twice);
    }
}

#[test]
fn intersect_with_empty_operand_folds() {
    let seq = NodeSeq::from_nodes(vec![text_node(1)]);
    let expr = Expr::intersect(vec![Expr::nodes(seq), Expr::empty()]);
    assert_eq!(optimize(expr).kind, ExprKind::Empty);
}

#[test]
fn union_drops_empty_operands() {
    let seq = NodeSeq::from_nodes(vec![text_node(1)]);
    let expr = Expr::union(vec![Expr::empty(), Expr::nodes(seq.clone()), Expr::empty()]);
    match optimize(expr).kind {
        ExprKind::Union(ops) => assert_eq!(ops, vec![Expr::nodes(seq)]),
        other => panic!("expected a union, got {other:?}"),
    }
}

#[test]
fn except_with_empty_first_operand_folds() {
    let seq = NodeSeq::from_nodes(vec![text_node(1)]);
    let expr = Expr::except(vec![Expr::empty(), Expr::nodes(seq)]);
    assert_eq!(optimize(expr).kind, ExprKind::Empty);
}

fn indexed_data() -> Arc<MemData> {
    let mut data = MemData::new();
    let mut id = 0;
    // 50 nodes in [0, 50), 5 in [100, 105), 20 in [200, 220).
    for base in [(0.0, 50), (100.0, 5), (200.0, 20)] {
        for i in 0..base.1 {
            id += 1;
            data.insert(IndexKind::Text, base.0 + f64::from(i), text_node(id));
        }
    }
    Arc::new(data)
}

#[test]
fn index_probe_orders_by_cost_and_reports_maximum() {
    let data = indexed_data();
    let expr = Expr::and(vec![
        Expr::cmp_num(NumRange::indexed(IndexKind::Text, 0.0, 49.0)),
        Expr::cmp_num(NumRange::indexed(IndexKind::Text, 100.0, 104.0)),
        Expr::cmp_num(NumRange::indexed(IndexKind::Text, 200.0, 219.0)),
    ]);

    let mut ii = IndexInfo::new(data);
    assert!(expr.index_accessible(&mut ii).unwrap());
    assert_eq!(ii.costs, 50);

    let replacement = ii.replacement.unwrap();
    match replacement.kind {
        ExprKind::Intersect(ops) => {
            let mins: Vec<f64> = ops
                .iter()
                .map(|op| match &op.kind {
                    ExprKind::RangeAccess(access) => access.token().min,
                    other => panic!("expected an accessor, got {other:?}"),
                })
                .collect();
            // Cheapest scan first: costs 5, 20, 50.
            assert_eq!(mins, vec![100.0, 200.0, 0.0]);
        }
        other => panic!("expected an intersection, got {other:?}"),
    }
}

#[test]
fn accessible_conjunction_rewrites_to_intersection() {
    let data = indexed_data();
    let expr = Expr::and(vec![
        Expr::cmp_num(NumRange::indexed(IndexKind::Text, 0.0, 49.0)),
        Expr::cmp_num(NumRange::indexed(IndexKind::Text, 200.0, 219.0)),
    ]);
    let mut cc = CompileContext::new(data);
    let optimized = Optimizer::new().optimize(expr, &mut cc).unwrap();
    assert!(matches!(optimized.kind, ExprKind::Intersect(_)));
}

#[test]
fn provably_empty_lookup_folds_to_empty() {
    let data = indexed_data();
    let expr = Expr::and(vec![
        Expr::cmp_num(NumRange::indexed(IndexKind::Text, 0.0, 49.0)),
        // Nothing is indexed in this range.
        Expr::cmp_num(NumRange::indexed(IndexKind::Text, 500.0, 600.0)),
    ]);
    let mut cc = CompileContext::new(data);
    let optimized = Optimizer::new().optimize(expr, &mut cc).unwrap();
    assert_eq!(optimized.kind, ExprKind::Empty);
}

#[test]
fn inaccessible_operand_aborts_the_group_rewrite() {
    let data = indexed_data();
    let expr = Expr::and(vec![
        Expr::cmp_num(NumRange::indexed(IndexKind::Text, 0.0, 49.0)),
        Expr::var("x"),
    ]);
    let mut ii = IndexInfo::new(data.clone());
    assert!(!expr.index_accessible(&mut ii).unwrap());

    let mut cc = CompileContext::new(data);
    let optimized = Optimizer::new().optimize(expr, &mut cc).unwrap();
    assert!(matches!(optimized.kind, ExprKind::And(_)));
}

fn string_indexed_data() -> Arc<MemData> {
    let mut data = MemData::new();
    // 3 attribute values under "a..", 1 under "m..".
    data.insert_str(IndexKind::Attribute, "alpha", text_node(1));
    data.insert_str(IndexKind::Attribute, "apex", text_node(2));
    data.insert_str(IndexKind::Attribute, "axis", text_node(3));
    data.insert_str(IndexKind::Attribute, "mid", text_node(4));
    for i in 0..10u32 {
        data.insert(IndexKind::Text, f64::from(i), text_node(100 + u64::from(i)));
    }
    Arc::new(data)
}

#[test]
fn string_predicate_rewrites_to_a_string_accessor() {
    let data = string_indexed_data();
    let expr = Expr::cmp_str(StrRange::indexed(IndexKind::Attribute, "a", true, "b", false));

    let mut ii = IndexInfo::new(data);
    assert!(expr.index_accessible(&mut ii).unwrap());
    assert_eq!(ii.costs, 3);
    let replacement = ii.replacement.unwrap();
    match replacement.kind {
        ExprKind::StringAccess(access) => assert_eq!(access.token().min, "a"),
        other => panic!("expected a string accessor, got {other:?}"),
    }
}

#[test]
fn mixed_numeric_and_string_conjunction_rewrites_to_intersection() {
    let data = string_indexed_data();
    let expr = Expr::and(vec![
        Expr::cmp_num(NumRange::indexed(IndexKind::Text, 0.0, 9.0)),
        Expr::cmp_str(StrRange::indexed(IndexKind::Attribute, "m", true, "n", false)),
    ]);
    let mut cc = CompileContext::new(data);
    let optimized = Optimizer::new().optimize(expr, &mut cc).unwrap();
    match optimized.kind {
        ExprKind::Intersect(ops) => {
            // Cheapest scan first: 1 string hit before 10 numeric hits.
            assert!(matches!(ops[0].kind, ExprKind::StringAccess(_)));
            assert!(matches!(ops[1].kind, ExprKind::RangeAccess(_)));
        }
        other => panic!("expected an intersection, got {other:?}"),
    }
}

#[test]
fn provably_empty_string_lookup_folds_to_empty() {
    let data = string_indexed_data();
    let expr = Expr::and(vec![
        Expr::cmp_str(StrRange::indexed(IndexKind::Attribute, "a", true, "b", false)),
        // Nothing is indexed in this range.
        Expr::cmp_str(StrRange::indexed(IndexKind::Attribute, "q", true, "r", false)),
    ]);
    let mut cc = CompileContext::new(data);
    let optimized = Optimizer::new().optimize(expr, &mut cc).unwrap();
    assert_eq!(optimized.kind, ExprKind::Empty);
}
