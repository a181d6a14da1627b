//! # Built-in solver
//!
//! A self-contained checker that needs no external tools. It decides a
//! formula only when constant folding and variable elimination reduce it to
//! a literal:
//!
//! - every top-level conjunct `x == e` with `x` absent from `e` is solved
//!   for `x`, which is then substituted away (one variable per round)
//! - `x` and `!x` conjuncts bind Boolean variables to literals
//! - the result is folded again after each round
//!
//! Both steps preserve satisfiability, so a formula folding to `false` is
//! unsatisfiable and one folding to `true` is satisfiable. Anything else is
//! reported as unknown.

use super::{Solver, Verdict};
use crate::error::Result;
use crate::expr::{mk_and, mk_not, simplify, BoolExpr, Expr, IntExpr, MarkedVar};
use crate::subst::{sub_bool, FnMapper};

/// Constant-propagating solver over marked Boolean expressions
#[derive(Debug, Clone, Default)]
pub struct BuiltinSolver {
    _private: (),
}

impl BuiltinSolver {
    /// Create a built-in solver
    pub fn new() -> Self {
        Self::default()
    }
}

impl Solver for BuiltinSolver {
    type Term = BoolExpr<MarkedVar>;

    fn name(&self) -> &str {
        "builtin"
    }

    fn translate(&self, e: &BoolExpr<MarkedVar>) -> Result<Self::Term> {
        Ok(e.clone())
    }

    fn conjoin(&self, parts: Vec<Self::Term>) -> Self::Term {
        mk_and(parts)
    }

    fn negate(&self, t: Self::Term) -> Self::Term {
        mk_not(t)
    }

    fn check(&self, t: &Self::Term) -> Result<Verdict> {
        Ok(match eliminate(t) {
            BoolExpr::True => Verdict::Sat,
            BoolExpr::False => Verdict::Unsat,
            _ => Verdict::unknown("not decided by constant propagation"),
        })
    }
}

/// A variable solved for an expression
enum Binding {
    Int(MarkedVar, IntExpr<MarkedVar>),
    Bool(MarkedVar, BoolExpr<MarkedVar>),
}

/// Fold, then eliminate solved variables until none are left
pub fn eliminate(e: &BoolExpr<MarkedVar>) -> BoolExpr<MarkedVar> {
    let mut cur = simplify(e);
    while let Some(binding) = find_binding(&cur) {
        cur = simplify(&apply(&binding, &cur));
    }
    cur
}

fn conjuncts(e: &BoolExpr<MarkedVar>) -> &[BoolExpr<MarkedVar>] {
    match e {
        BoolExpr::And(xs) => xs,
        other => std::slice::from_ref(other),
    }
}

fn find_binding(e: &BoolExpr<MarkedVar>) -> Option<Binding> {
    conjuncts(e).iter().find_map(|c| match c {
        BoolExpr::Var(x) => Some(Binding::Bool(x.clone(), BoolExpr::True)),
        BoolExpr::Not(inner) => match inner.as_ref() {
            BoolExpr::Var(x) => Some(Binding::Bool(x.clone(), BoolExpr::False)),
            _ => None,
        },
        BoolExpr::Eq(l, r) => solve_eq(l, r).or_else(|| solve_eq(r, l)),
        _ => None,
    })
}

fn solve_eq(lhs: &Expr<MarkedVar>, rhs: &Expr<MarkedVar>) -> Option<Binding> {
    if rhs.mentions_symbolic() {
        return None;
    }
    let (x, binding) = match (lhs, rhs) {
        (Expr::Int(IntExpr::Var(x)), Expr::Int(e)) => (x, Binding::Int(x.clone(), e.clone())),
        (Expr::Bool(BoolExpr::Var(x)), Expr::Bool(e)) => (x, Binding::Bool(x.clone(), e.clone())),
        _ => return None,
    };
    let mut occurs = false;
    rhs.for_each_var(&mut |v: &MarkedVar| occurs |= v == x);
    (!occurs).then_some(binding)
}

fn apply(binding: &Binding, e: &BoolExpr<MarkedVar>) -> BoolExpr<MarkedVar> {
    let mut mapper = FnMapper {
        int: |v: &MarkedVar| match binding {
            Binding::Int(x, val) if x == v => val.clone(),
            _ => IntExpr::Var(v.clone()),
        },
        bool: |v: &MarkedVar| match binding {
            Binding::Bool(x, val) if x == v => val.clone(),
            _ => BoolExpr::Var(v.clone()),
        },
    };
    sub_bool(&mut mapper, e)
}
