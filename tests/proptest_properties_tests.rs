//! Property-based tests for the graph, reifier and substitution engines
//!
//! These tests use proptest to generate random inputs and verify that:
//! 1. Unification toward or from a missing node never changes a graph
//! 2. Graph validation fails exactly when some edge dangles
//! 3. Reification finds every ordered selection of matching occurrences
//! 4. Symbol removal is idempotent
//! 5. Intermediate stage numbering is one past the largest stage used

use proptest::prelude::*;
use viewcheck::command::remove_symbols;
use viewcheck::expr::{mk_and, mk_int_eq, Symbolic};
use viewcheck::graph::{to_graph, unify, Edge, Subgraph};
use viewcheck::reifier::reify;
use viewcheck::subst::next_intermediate_stage;
use viewcheck::view::{Func, GFunc, Multiset};
use viewcheck::{BoolExpr, Expr, IntExpr, MarkedVar, TypedVar, Var, ViewDef};

// =============================================================================
// STRATEGY GENERATORS
// =============================================================================

/// Node names n0..n5; subgraphs only declare some of them
fn node_name() -> impl Strategy<Value = String> {
    (0usize..6).prop_map(|i| format!("n{}", i))
}

fn node_view() -> impl Strategy<Value = Multiset<GFunc<Var>>> {
    prop::collection::vec(prop_oneof![Just("A"), Just("B")], 0..3).prop_map(|names| {
        names
            .into_iter()
            .map(|n| GFunc {
                guard: BoolExpr::True,
                item: Func::new(n, vec![]),
            })
            .collect()
    })
}

/// Subgraphs whose edges may name undeclared nodes
fn subgraph() -> impl Strategy<Value = Subgraph> {
    (
        prop::collection::btree_map(node_name(), node_view(), 0..5),
        prop::collection::vec((node_name(), node_name()), 0..6),
    )
        .prop_map(|(nodes, ends)| {
            let edges = ends
                .into_iter()
                .enumerate()
                .map(|(i, (src, dest))| {
                    (
                        format!("e{}", i),
                        Edge {
                            src,
                            dest,
                            cmd: vec![],
                        },
                    )
                })
                .collect();
            Subgraph { nodes, edges }
        })
}

/// A subgraph with two distinct declared nodes picked from it
fn subgraph_with_pair() -> impl Strategy<Value = (Subgraph, String, String)> {
    subgraph()
        .prop_filter("needs two nodes", |g| g.nodes.len() >= 2)
        .prop_flat_map(|g| {
            let n = g.nodes.len();
            (Just(g), 0..n, 1..n)
        })
        .prop_map(|(g, i, offset)| {
            let keys: Vec<String> = g.nodes.keys().cloned().collect();
            let s = keys[i].clone();
            let t = keys[(i + offset) % keys.len()].clone();
            (g, s, t)
        })
}

fn marked_var() -> impl Strategy<Value = MarkedVar> {
    let name = prop_oneof![Just("x"), Just("y"), Just("z")].prop_map(String::from);
    prop_oneof![
        name.clone().prop_map(MarkedVar::Before),
        name.clone().prop_map(MarkedVar::After),
        (0u64..8, name).prop_map(|(n, v)| MarkedVar::Intermediate(n, v)),
    ]
}

fn int_leaf() -> impl Strategy<Value = IntExpr<MarkedVar>> {
    prop_oneof![
        (-10i64..10).prop_map(IntExpr::Const),
        marked_var().prop_map(IntExpr::Var),
        marked_var().prop_map(|v| IntExpr::Sym(Symbolic {
            name: "f".into(),
            params: vec![Expr::Int(IntExpr::Var(v))],
        })),
    ]
}

fn bool_expr() -> impl Strategy<Value = BoolExpr<MarkedVar>> {
    let leaf = prop_oneof![
        Just(BoolExpr::True),
        marked_var().prop_map(BoolExpr::Var),
        (int_leaf(), int_leaf()).prop_map(|(a, b)| mk_int_eq(a, b)),
    ];
    leaf.prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(mk_and),
            prop::collection::vec(inner.clone(), 0..4).prop_map(BoolExpr::Or),
            (inner.clone(), inner.clone())
                .prop_map(|(a, b)| BoolExpr::Implies(Box::new(a), Box::new(b))),
            inner.prop_map(|a| BoolExpr::Not(Box::new(a))),
        ]
    })
}

fn max_stage(e: &BoolExpr<MarkedVar>) -> Option<u64> {
    let mut max = None;
    e.for_each_var(&mut |v| {
        if let MarkedVar::Intermediate(n, _) = v {
            max = Some(max.map_or(*n, |m: u64| m.max(*n)));
        }
    });
    max
}

// =============================================================================
// GRAPH PROPERTIES
// =============================================================================

proptest! {
    #[test]
    fn prop_unify_with_missing_node_is_identity(g in subgraph(), present in node_name()) {
        let missing = "absent";
        prop_assert_eq!(unify(&g, &present, missing), g.clone());
        prop_assert_eq!(unify(&g, missing, &present), g.clone());
        prop_assert_eq!(unify(&g, &present, &present), g);
    }

    #[test]
    fn prop_to_graph_fails_iff_dangling(g in subgraph()) {
        let dangles = g.edges.values().any(|e| {
            !g.nodes.contains_key(&e.src) || !g.nodes.contains_key(&e.dest)
        });
        match to_graph("g", &g) {
            None => prop_assert!(dangles),
            Some(graph) => {
                prop_assert!(!dangles);
                prop_assert_eq!(graph.contents(), &g);
                prop_assert_eq!(graph.name(), "g");
            }
        }
    }

    #[test]
    fn prop_unify_removes_target((g, s, t) in subgraph_with_pair()) {
        let u = unify(&g, &s, &t);
        prop_assert_eq!(u.nodes.len(), g.nodes.len() - 1);
        prop_assert!(!u.nodes.contains_key(&t));
        prop_assert_eq!(&u.nodes[&s], &g.nodes[&t]);
        prop_assert_eq!(u.edges.len(), g.edges.len());
        prop_assert!(u.edges.values().all(|e| e.src != t && e.dest != t));
        for (name, e) in &g.edges {
            let retarget = |n: &String| if *n == t { s.clone() } else { n.clone() };
            prop_assert_eq!(&u.edges[name].src, &retarget(&e.src));
            prop_assert_eq!(&u.edges[name].dest, &retarget(&e.dest));
        }
        // Unifying never introduces dangling edges
        prop_assert_eq!(to_graph("g", &g).is_some(), to_graph("g", &u).is_some());
    }
}

// =============================================================================
// REIFIER PROPERTIES
// =============================================================================

proptest! {
    #[test]
    fn prop_reify_counts_ordered_selections(a in 0usize..5, b in 0usize..5) {
        let mut held = Multiset::new();
        for i in 0..a {
            held.insert(GFunc {
                guard: BoolExpr::Var(format!("g{}", i)),
                item: Func::new("A", vec![]),
            });
        }
        held.insert_n(
            GFunc {
                guard: BoolExpr::True,
                item: Func::new("B", vec![]),
            },
            b,
        );

        let single = ViewDef::Func(Func::<TypedVar>::new("A", vec![]));
        let pair = ViewDef::join_all(vec![single.clone(), single.clone()]);
        let mixed = ViewDef::join_all(vec![
            single.clone(),
            ViewDef::Func(Func::<TypedVar>::new("B", vec![])),
        ]);

        prop_assert_eq!(reify(&held, &[single.clone()]).len(), a);
        prop_assert_eq!(reify(&held, &[pair]).len(), a * a.saturating_sub(1));
        prop_assert_eq!(reify(&held, &[mixed]).len(), a * b);
        prop_assert_eq!(reify(&held, &[ViewDef::Unit]).len(), 1);
        prop_assert!(reify(&Multiset::<GFunc<Var>>::new(), &[single]).is_empty());
    }
}

// =============================================================================
// EXPRESSION PROPERTIES
// =============================================================================

proptest! {
    #[test]
    fn prop_remove_symbols_idempotent(e in bool_expr()) {
        let once = remove_symbols(&e);
        prop_assert_eq!(remove_symbols(&once), once);
    }

    #[test]
    fn prop_next_stage_is_one_past_max(e in bool_expr()) {
        let expected = max_stage(&e).map_or(0, |m| m + 1);
        prop_assert_eq!(next_intermediate_stage(&e), expected);
    }
}
