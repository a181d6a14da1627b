//! # View reification
//!
//! Finds every way the guarded view instances held at a program point
//! satisfy the declared definition patterns.
//!
//! For each pattern, the first unmatched component is tried against every
//! unconsumed held occurrence with the same name and arity; the search then
//! continues on the remaining components with that occurrence consumed.
//! A complete match yields a [`ReView`] whose guard is the conjunction of the
//! consumed guards and whose item lists the consumed instances in pattern
//! order. Matches are kept with multiplicity.
//!
//! ```text
//! held {A(x), A(y)}   pattern A(a) * A(b)   →  [A(x), A(y)], [A(y), A(x)]
//! ```

use crate::expr::mk_and;
use crate::view::{DFunc, GFunc, Multiset, ReView, ViewDef, ViewSet};

/// Match `held` against every pattern in `defs`
pub fn reify<V: Clone + Ord>(held: &Multiset<GFunc<V>>, defs: &[ViewDef]) -> ViewSet<V> {
    let pool: Vec<&GFunc<V>> = held.iter().collect();
    let mut out = Multiset::new();
    for def in defs {
        let pattern = def.components();
        let mut search = Search {
            pool: &pool,
            used: vec![false; pool.len()],
            chosen: Vec::with_capacity(pattern.len()),
        };
        search.run(&pattern, &mut out);
    }
    tracing::trace!(
        "reified {} held instances against {} patterns: {} matches",
        held.len(),
        defs.len(),
        out.len()
    );
    out
}

struct Search<'p, 'a, V> {
    pool: &'p [&'a GFunc<V>],
    used: Vec<bool>,
    chosen: Vec<&'a GFunc<V>>,
}

impl<'p, 'a, V: Clone + Ord> Search<'p, 'a, V> {
    fn run(&mut self, pattern: &[&DFunc], out: &mut ViewSet<V>) {
        let Some((first, rest)) = pattern.split_first() else {
            out.insert(ReView {
                guard: mk_and(self.chosen.iter().map(|g| g.guard.clone())),
                item: self.chosen.iter().map(|g| g.item.clone()).collect(),
            });
            return;
        };

        for i in 0..self.pool.len() {
            let candidate = self.pool[i];
            if self.used[i] || !first.same_shape(&candidate.item) {
                continue;
            }
            self.used[i] = true;
            self.chosen.push(candidate);
            self.run(rest, out);
            self.chosen.pop();
            self.used[i] = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{bvar, ivar, BoolExpr, Expr, TypedVar, Var};
    use crate::view::Func;

    fn held(name: &str, arg: &str, guard: BoolExpr<Var>) -> GFunc<Var> {
        GFunc {
            guard,
            item: Func::new(name, vec![Expr::Int(ivar(arg))]),
        }
    }

    fn pattern(names: &[&str]) -> ViewDef {
        ViewDef::join_all(
            names
                .iter()
                .map(|n| ViewDef::Func(Func::new(*n, vec![TypedVar::int("p")]))),
        )
    }

    #[test]
    fn test_single_component_matches_each_occurrence() {
        let h: Multiset<_> = vec![
            held("holdTick", "t", BoolExpr::True),
            held("holdTick", "u", BoolExpr::True),
        ]
        .into_iter()
        .collect();
        let vs = reify(&h, &[pattern(&["holdTick"])]);
        assert_eq!(vs.len(), 2);
    }

    #[test]
    fn test_duplicate_occurrences_counted() {
        let mut h = Multiset::new();
        h.insert_n(held("holdTick", "t", BoolExpr::True), 2);
        let vs = reify(&h, &[pattern(&["holdTick"])]);
        assert_eq!(vs.len(), 2);
        assert_eq!(vs.distinct_len(), 1);

        let pair = reify(&h, &[pattern(&["holdTick", "holdTick"])]);
        assert_eq!(pair.len(), 2);
    }

    #[test]
    fn test_join_pattern_conjoins_guards_in_pattern_order() {
        let h: Multiset<_> = vec![
            held("holdLock", "x", bvar("a")),
            held("holdTick", "t", bvar("b")),
        ]
        .into_iter()
        .collect();
        let vs = reify(&h, &[pattern(&["holdTick", "holdLock"])]);
        assert_eq!(vs.len(), 1);
        let rv = vs.iter().next().unwrap();
        assert_eq!(rv.guard, BoolExpr::And(vec![bvar("b"), bvar("a")]));
        assert_eq!(rv.item[0].name, "holdTick");
        assert_eq!(rv.item[1].name, "holdLock");
    }

    #[test]
    fn test_empty_held_yields_nothing() {
        let h: Multiset<GFunc<Var>> = Multiset::new();
        assert!(reify(&h, &[pattern(&["holdTick"])]).is_empty());
    }

    #[test]
    fn test_unit_pattern_matches_once() {
        let h = Multiset::singleton(held("holdTick", "t", BoolExpr::True));
        let vs = reify(&h, &[ViewDef::Unit]);
        assert_eq!(vs.len(), 1);
        let rv = vs.iter().next().unwrap();
        assert!(rv.guard.is_true());
        assert!(rv.item.is_empty());
    }

    #[test]
    fn test_arity_must_agree() {
        let h = Multiset::singleton(GFunc {
            guard: BoolExpr::True,
            item: Func::<Expr<Var>>::new("holdTick", vec![]),
        });
        assert!(reify(&h, &[pattern(&["holdTick"])]).is_empty());
    }
}
