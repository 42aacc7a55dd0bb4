//! Integration tests for expression evaluation.

use std::collections::BTreeSet;
use std::sync::Arc;

use proptest::prelude::*;
use xylo_core::{
    Data, IndexKind, MemData, Node, NodeId, NodeKind, NodeSeq, NumericRange, StringRange,
};
use xylo_query::{
    CancellationToken, Expr, Focus, FtMatch, FtUnion, NumRange, PosRange, QueryContext, QueryError,
    RangeAccess, StringRangeAccess, Value,
};

fn node(id: u64) -> Node {
    Node::new(NodeId::new(id), NodeKind::Element)
}

fn seq(ids: &[u64]) -> NodeSeq {
    NodeSeq::from_nodes(ids.iter().map(|&id| node(id)).collect())
}

fn qc() -> QueryContext {
    QueryContext::new(Arc::new(MemData::new()))
}

fn eval_ids(expr: &Expr, qc: &QueryContext) -> Vec<u64> {
    match expr.evaluate(qc).unwrap() {
        Value::Nodes(nodes) => nodes.iter().map(|n| n.id.as_u64()).collect(),
        Value::Empty => Vec::new(),
        other => panic!("expected nodes, got {other:?}"),
    }
}

#[test]
fn intersect_of_three_operands() {
    let expr = Expr::intersect(vec![
        Expr::nodes(seq(&[1, 3, 5, 7])),
        Expr::nodes(seq(&[3, 5, 7, 9])),
        Expr::nodes(seq(&[5, 9, 11])),
    ]);
    assert_eq!(eval_ids(&expr, &qc()), vec![5]);
}

#[test]
fn intersect_single_operand_is_identity() {
    let expr = Expr::intersect(vec![Expr::nodes(seq(&[5, 1, 3]))]);
    assert_eq!(eval_ids(&expr, &qc()), vec![1, 3, 5]);
}

#[test]
fn intersect_with_empty_is_empty() {
    let expr = Expr::intersect(vec![Expr::nodes(seq(&[1, 2])), Expr::nodes(NodeSeq::new())]);
    assert_eq!(eval_ids(&expr, &qc()), Vec::<u64>::new());
}

#[test]
fn union_merges_and_dedups() {
    let expr = Expr::union(vec![
        Expr::nodes(seq(&[1, 3, 5])),
        Expr::nodes(seq(&[2, 3, 6])),
        Expr::nodes(seq(&[5, 6])),
    ]);
    assert_eq!(eval_ids(&expr, &qc()), vec![1, 2, 3, 5, 6]);
}

#[test]
fn except_removes_identities() {
    let expr = Expr::except(vec![
        Expr::nodes(seq(&[1, 2, 3, 4, 5])),
        Expr::nodes(seq(&[2, 4])),
        Expr::nodes(seq(&[5, 9])),
    ]);
    assert_eq!(eval_ids(&expr, &qc()), vec![1, 3]);
}

/// Forces the bulk algorithm: a variable operand gives no static
/// ordering guarantee.
#[test]
fn bulk_and_streaming_intersection_agree() {
    let a = seq(&[1, 4, 6, 8, 10]);
    let b = seq(&[2, 4, 8, 10, 12]);

    let streaming = Expr::intersect(vec![Expr::nodes(a.clone()), Expr::nodes(b.clone())]);
    let bulk = Expr::intersect(vec![Expr::nodes(a), Expr::var("b")]);

    let context = qc().with_binding("b", Value::Nodes(b));
    assert_eq!(eval_ids(&streaming, &context), vec![4, 8, 10]);
    assert_eq!(eval_ids(&bulk, &context), vec![4, 8, 10]);
}

#[test]
fn conjunction_short_circuits_before_side_effects() {
    // The unbound variable would raise an error if it were evaluated.
    let expr = Expr::and(vec![Expr::boolean(false), Expr::var("never")]);
    assert_eq!(expr.evaluate(&qc()).unwrap(), Value::bool(false));
}

#[test]
fn disjunction_short_circuits_on_first_true() {
    let expr = Expr::or(vec![Expr::boolean(true), Expr::var("never")]);
    assert!(expr.evaluate(&qc()).unwrap().ebv().unwrap());
}

#[test]
fn scored_conjunction_averages_operand_scores() {
    let context = qc()
        .with_scoring(true)
        .with_binding("a", Value::Bool { value: true, score: Some(0.4) })
        .with_binding("b", Value::Bool { value: true, score: Some(0.8) });
    let expr = Expr::and(vec![Expr::var("a"), Expr::var("b")]);
    let value = expr.evaluate(&context).unwrap();
    assert!(value.ebv().unwrap());
    assert!((value.score().unwrap() - 0.6).abs() < 1e-9);
}

#[test]
fn scored_conjunction_counts_unscored_operands_as_zero() {
    let context = qc()
        .with_scoring(true)
        .with_binding("a", Value::Bool { value: true, score: Some(0.8) });
    let expr = Expr::and(vec![Expr::var("a"), Expr::boolean(true)]);
    let value = expr.evaluate(&context).unwrap();
    assert!(value.ebv().unwrap());
    assert!((value.score().unwrap() - 0.4).abs() < 1e-9);
}

#[test]
fn failed_scored_conjunction_is_unscored() {
    let context = qc()
        .with_scoring(true)
        .with_binding("a", Value::Bool { value: true, score: Some(0.4) })
        .with_binding("b", Value::Bool { value: false, score: Some(0.8) });
    let expr = Expr::and(vec![Expr::var("a"), Expr::var("b")]);
    assert_eq!(expr.evaluate(&context).unwrap(), Value::bool(false));
}

#[test]
fn scored_disjunction_keeps_the_succeeding_score() {
    let context = qc()
        .with_scoring(true)
        .with_binding("a", Value::Bool { value: false, score: Some(0.9) })
        .with_binding("b", Value::Bool { value: true, score: Some(0.3) });
    let expr = Expr::or(vec![Expr::var("a"), Expr::var("b")]);
    assert_eq!(expr.evaluate(&context).unwrap(), Value::Bool { value: true, score: Some(0.3) });
}

#[test]
fn positional_predicate_reads_the_focus() {
    let expr = Expr::pos(PosRange::new(2, 4));
    let hit = qc().with_focus(Focus::at(3));
    let miss = qc().with_focus(Focus::at(5));
    assert!(expr.evaluate(&hit).unwrap().ebv().unwrap());
    assert!(!expr.evaluate(&miss).unwrap().ebv().unwrap());
}

#[test]
fn numeric_comparison_reads_the_focus_value() {
    let expr = Expr::cmp_num(NumRange::new(1.0, 10.0));
    let hit = qc().with_focus(Focus::at(1).with_number(5.0));
    let miss = qc().with_focus(Focus::at(1).with_number(11.0));
    let untyped = qc().with_focus(Focus::at(1));
    assert!(expr.evaluate(&hit).unwrap().ebv().unwrap());
    assert!(!expr.evaluate(&miss).unwrap().ebv().unwrap());
    assert!(!expr.evaluate(&untyped).unwrap().ebv().unwrap());
}

#[test]
fn predicates_without_focus_are_an_error() {
    let expr = Expr::pos(PosRange::exact(1));
    assert!(matches!(expr.evaluate(&qc()), Err(QueryError::Type { .. })));
}

#[test]
fn range_access_materializes_in_document_order() {
    let mut data = MemData::new();
    data.insert(IndexKind::Text, 3.0, Node::new(NodeId::new(9), NodeKind::Text));
    data.insert(IndexKind::Text, 1.0, Node::new(NodeId::new(4), NodeKind::Text));
    data.insert(IndexKind::Text, 2.0, Node::new(NodeId::new(7), NodeKind::Text));
    let access = RangeAccess::new(NumericRange::new(IndexKind::Text, 0.0, 10.0));
    let context = QueryContext::new(Arc::new(data));

    let streamed: Vec<u64> = access.iter(&context).map(|n| n.id.as_u64()).collect();
    assert_eq!(streamed, vec![4, 7, 9]);
    assert_eq!(eval_ids(&Expr::range_access(access), &context), vec![4, 7, 9]);
}

#[test]
fn string_access_materializes_in_document_order() {
    let mut data = MemData::new();
    data.insert_str(IndexKind::Attribute, "cherry", Node::new(NodeId::new(8), NodeKind::Attribute));
    data.insert_str(IndexKind::Attribute, "apple", Node::new(NodeId::new(3), NodeKind::Attribute));
    data.insert_str(IndexKind::Attribute, "zebra", Node::new(NodeId::new(1), NodeKind::Attribute));
    let token = StringRange::new(IndexKind::Attribute, "a".into(), true, "m".into(), false);
    let access = StringRangeAccess::new(token);
    let context = QueryContext::new(Arc::new(data));

    assert_eq!(eval_ids(&Expr::string_access(access), &context), vec![3, 8]);
}

/// A store whose index scan requests cancellation after a fixed number
/// of yielded nodes, as an external caller would from another thread.
struct CancellingData {
    token: CancellationToken,
    after: u64,
    total: u64,
}

impl Data for CancellingData {
    fn lookup_cost(&self, _range: &NumericRange) -> usize {
        usize::try_from(self.total).unwrap_or(usize::MAX)
    }

    fn iter<'a>(&'a self, _range: &NumericRange) -> Box<dyn Iterator<Item = Node> + 'a> {
        let token = self.token.clone();
        let after = self.after;
        Box::new((0..self.total).map(move |i| {
            if i == after {
                token.cancel();
            }
            Node::new(NodeId::new(i + 1), NodeKind::Text)
        }))
    }

    fn string_lookup_cost(&self, _range: &StringRange) -> usize {
        0
    }

    fn string_iter<'a>(&'a self, _range: &StringRange) -> Box<dyn Iterator<Item = Node> + 'a> {
        Box::new(std::iter::empty())
    }

    fn len(&self) -> usize {
        usize::try_from(self.total).unwrap_or(usize::MAX)
    }
}

#[test]
fn cancellation_interrupts_a_long_intersection() {
    let token = CancellationToken::new();
    let data = CancellingData { token: token.clone(), after: 10, total: 10_000 };
    let context = QueryContext::new(Arc::new(data)).with_token(token);

    let expr = Expr::intersect(vec![
        Expr::range_access(RangeAccess::new(NumericRange::new(IndexKind::Text, 0.0, 1.0e9))),
        Expr::nodes(seq(&[1, 2, 3])),
    ]);
    assert_eq!(expr.evaluate(&context), Err(QueryError::Interrupted));
}

#[test]
fn cancellation_interrupts_a_long_union() {
    let token = CancellationToken::new();
    let data = CancellingData { token: token.clone(), after: 10, total: 10_000 };
    let context = QueryContext::new(Arc::new(data)).with_token(token);

    let expr = Expr::union(vec![
        Expr::range_access(RangeAccess::new(NumericRange::new(IndexKind::Text, 0.0, 1.0e9))),
        Expr::nodes(seq(&[1, 2, 3])),
    ]);
    assert_eq!(expr.evaluate(&context), Err(QueryError::Interrupted));
}

#[test]
fn ft_union_merges_minimum_position_subset() {
    let matches_a = vec![
        FtMatch::new(node(1), vec![1, 3], 0.2),
        FtMatch::new(node(5), vec![2], 0.5),
    ];
    let matches_b = vec![
        FtMatch::new(node(1), vec![2], 0.9),
        FtMatch::new(node(3), vec![1], 0.4),
    ];
    let ft = FtUnion::new(false, vec![Expr::ft_matches(matches_a), Expr::ft_matches(matches_b)]);
    let merged = ft.matches(&qc()).unwrap();

    assert_eq!(merged.len(), 3);
    assert_eq!(merged[0].node.id.as_u64(), 1);
    assert_eq!(merged[0].positions, vec![1, 2, 3]);
    assert!((merged[0].score - 0.9).abs() < 1e-9);
    assert!(!merged[0].not);
    assert_eq!(merged[1].node.id.as_u64(), 3);
    assert_eq!(merged[2].node.id.as_u64(), 5);
}

#[test]
fn ft_union_positive_merge_clears_negation() {
    let ft = FtUnion::new(
        false,
        vec![
            Expr::ft_matches(vec![FtMatch::negated(node(2))]),
            Expr::ft_matches(vec![FtMatch::new(node(2), vec![4], 0.7)]),
        ],
    );
    let merged = ft.matches(&qc()).unwrap();
    assert_eq!(merged.len(), 1);
    assert!(!merged[0].not);
    assert_eq!(merged[0].positions, vec![4]);
}

#[test]
fn ft_union_empty_merge_follows_the_combinator_flag() {
    let source = || Expr::ft_matches(vec![FtMatch::negated(node(2))]);
    let positive = FtUnion::new(false, vec![source()]);
    assert!(!positive.matches(&qc()).unwrap()[0].not);

    let negated = FtUnion::new(true, vec![source()]);
    assert!(negated.matches(&qc()).unwrap()[0].not);
}

#[test]
fn ft_union_scored_matches_keep_positive_nodes_only() {
    let ft = FtUnion::new(
        false,
        vec![
            Expr::ft_matches(vec![
                FtMatch::new(node(1), vec![1], 0.8),
                FtMatch::new(node(4), vec![2], 0.3),
            ]),
            Expr::ft_matches(vec![FtMatch::negated(node(2))]),
        ],
    );
    let negated = FtUnion::new(true, vec![Expr::ft_matches(vec![FtMatch::negated(node(2))])]);

    let scored = ft.scored_matches(&qc()).unwrap();
    let ids: Vec<u64> = scored.iter().map(|s| s.id().as_u64()).collect();
    // Node 2 carries no positions; in a non-negated union it still
    // counts as positive, in a negated one it is dropped.
    assert_eq!(ids, vec![1, 2, 4]);
    assert!((scored[0].score - 0.8).abs() < 1e-9);
    assert!(negated.scored_matches(&qc()).unwrap().is_empty());
}

#[test]
fn ft_union_evaluates_operands_into_a_match_stream() {
    let ft = FtUnion::new(
        false,
        vec![
            Expr::ft_matches(vec![FtMatch::new(node(3), vec![1], 0.5)]),
            Expr::ft_matches(vec![FtMatch::new(node(1), vec![2], 0.2)]),
        ],
    );
    let expr = Expr::ft_union(ft);
    let nodes = expr.evaluate(&qc()).unwrap().into_nodes().unwrap();
    let ids: Vec<u64> = nodes.iter().map(|n| n.id.as_u64()).collect();
    assert_eq!(ids, vec![1, 3]);
}

#[test]
fn nested_ft_unions_feed_the_outer_merge() {
    let inner = FtUnion::new(
        false,
        vec![Expr::ft_matches(vec![FtMatch::new(node(2), vec![1], 0.6)])],
    );
    let outer = FtUnion::new(
        false,
        vec![
            Expr::ft_union(inner),
            Expr::ft_matches(vec![FtMatch::new(node(2), vec![3], 0.2)]),
        ],
    );
    let merged = outer.matches(&qc()).unwrap();
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].positions, vec![1, 3]);
    assert!((merged[0].score - 0.6).abs() < 1e-9);
}

#[test]
fn ft_union_rejects_non_match_operands() {
    let ft = FtUnion::new(false, vec![Expr::nodes(seq(&[1, 2]))]);
    assert!(matches!(ft.matches(&qc()), Err(QueryError::Type { .. })));
}

fn ids_to_set(ids: &[u64]) -> BTreeSet<u64> {
    ids.iter().copied().collect()
}

proptest! {
    #[test]
    fn intersection_matches_set_semantics(
        a in proptest::collection::vec(1u64..200, 0..60),
        b in proptest::collection::vec(1u64..200, 0..60),
        c in proptest::collection::vec(1u64..200, 0..60),
    ) {
        let expected: Vec<u64> = ids_to_set(&a)
            .intersection(&ids_to_set(&b))
            .copied()
            .collect::<BTreeSet<_>>()
            .intersection(&ids_to_set(&c))
            .copied()
            .collect();

        let streaming = Expr::intersect(vec![
            Expr::nodes(seq(&a)),
            Expr::nodes(seq(&b)),
            Expr::nodes(seq(&c)),
        ]);
        let bulk = Expr::intersect(vec![
            Expr::nodes(seq(&a)),
            Expr::var("b"),
            Expr::nodes(seq(&c)),
        ]);
        let context = qc().with_binding("b", Value::Nodes(seq(&b)));

        prop_assert_eq!(eval_ids(&streaming, &context), expected.clone());
        prop_assert_eq!(eval_ids(&bulk, &context), expected);
    }

    #[test]
    fn union_matches_set_semantics(
        a in proptest::collection::vec(1u64..200, 0..60),
        b in proptest::collection::vec(1u64..200, 0..60),
    ) {
        let expected: Vec<u64> =
            ids_to_set(&a).union(&ids_to_set(&b)).copied().collect();
        let expr = Expr::union(vec![Expr::nodes(seq(&a)), Expr::nodes(seq(&b))]);
        prop_assert_eq!(eval_ids(&expr, &qc()), expected);
    }
}
