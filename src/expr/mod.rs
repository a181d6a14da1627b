//! # Expression Model
//!
//! Two-sort (integer / Boolean) expression trees generic over the variable
//! representation `V`. Plain program text uses `Expr<Var>`; proof terms use
//! `Expr<MarkedVar>` so one variable can appear in several program states.
//!
//! A [`Symbolic`] leaf stands for a relation whose meaning the semantic
//! layer could not resolve. It carries the relation name and its
//! parameters, which substitution still rewrites.
//!
//! ## Smart constructors
//!
//! The `mk_*` functions fold constants and flatten associative operators:
//!
//! ```text
//! mk_and([true, a, (and b c)])  =>  (and a b c)
//! mk_or([a, true])              =>  true
//! mk_implies(a, true)           =>  true
//! ```

pub mod simplify;
pub mod var;

pub use simplify::simplify;
pub use var::{MarkedVar, Type, TypedVar, Var, VarMap};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque relation application used where semantics has no closed form
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Symbolic<V> {
    /// Relation name
    pub name: String,
    /// Parameters, in order
    pub params: Vec<Expr<V>>,
}

/// Integer-sorted expression
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IntExpr<V> {
    /// Integer literal
    Const(i64),
    /// Integer variable
    Var(V),
    /// Integer-valued symbolic relation
    Sym(Symbolic<V>),
    /// n-ary sum
    Add(Vec<IntExpr<V>>),
    /// n-ary left-associated difference
    Sub(Vec<IntExpr<V>>),
    /// n-ary product
    Mul(Vec<IntExpr<V>>),
    /// Euclidean integer division, as SMT-LIB `div`: the remainder is never
    /// negative
    Div(Box<IntExpr<V>>, Box<IntExpr<V>>),
}

/// Boolean-sorted expression
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BoolExpr<V> {
    /// Truth
    True,
    /// Falsity
    False,
    /// Boolean variable
    Var(V),
    /// Boolean-valued symbolic relation
    Sym(Symbolic<V>),
    /// n-ary conjunction
    And(Vec<BoolExpr<V>>),
    /// n-ary disjunction
    Or(Vec<BoolExpr<V>>),
    /// Implication `lhs => rhs`
    Implies(Box<BoolExpr<V>>, Box<BoolExpr<V>>),
    /// Equality of two expressions of the same sort
    Eq(Box<Expr<V>>, Box<Expr<V>>),
    /// `lhs > rhs`
    Gt(Box<IntExpr<V>>, Box<IntExpr<V>>),
    /// `lhs >= rhs`
    Ge(Box<IntExpr<V>>, Box<IntExpr<V>>),
    /// `lhs <= rhs`
    Le(Box<IntExpr<V>>, Box<IntExpr<V>>),
    /// `lhs < rhs`
    Lt(Box<IntExpr<V>>, Box<IntExpr<V>>),
    /// Negation
    Not(Box<BoolExpr<V>>),
}

/// An expression of either sort
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Expr<V> {
    /// Integer-sorted
    Int(IntExpr<V>),
    /// Boolean-sorted
    Bool(BoolExpr<V>),
}

impl<V> Expr<V> {
    /// Sort of this expression
    pub fn ty(&self) -> Type {
        match self {
            Expr::Int(_) => Type::Int,
            Expr::Bool(_) => Type::Bool,
        }
    }

    /// True if this expression is a bare symbolic leaf
    pub fn is_symbolic(&self) -> bool {
        matches!(self, Expr::Int(IntExpr::Sym(_)) | Expr::Bool(BoolExpr::Sym(_)))
    }

    /// Visit every variable leaf, including those inside symbolic parameters
    pub fn for_each_var(&self, f: &mut impl FnMut(&V)) {
        match self {
            Expr::Int(e) => e.for_each_var(f),
            Expr::Bool(e) => e.for_each_var(f),
        }
    }

    /// True if any symbolic leaf occurs anywhere in the expression
    pub fn mentions_symbolic(&self) -> bool {
        match self {
            Expr::Int(e) => e.mentions_symbolic(),
            Expr::Bool(e) => e.mentions_symbolic(),
        }
    }
}

impl<V> Symbolic<V> {
    fn for_each_var(&self, f: &mut impl FnMut(&V)) {
        for p in &self.params {
            p.for_each_var(f);
        }
    }
}

impl<V> IntExpr<V> {
    /// Visit every variable leaf
    pub fn for_each_var(&self, f: &mut impl FnMut(&V)) {
        match self {
            IntExpr::Const(_) => {}
            IntExpr::Var(v) => f(v),
            IntExpr::Sym(s) => s.for_each_var(f),
            IntExpr::Add(xs) | IntExpr::Sub(xs) | IntExpr::Mul(xs) => {
                for x in xs {
                    x.for_each_var(f);
                }
            }
            IntExpr::Div(l, r) => {
                l.for_each_var(f);
                r.for_each_var(f);
            }
        }
    }

    /// True if any symbolic leaf occurs
    pub fn mentions_symbolic(&self) -> bool {
        match self {
            IntExpr::Const(_) | IntExpr::Var(_) => false,
            IntExpr::Sym(_) => true,
            IntExpr::Add(xs) | IntExpr::Sub(xs) | IntExpr::Mul(xs) => {
                xs.iter().any(IntExpr::mentions_symbolic)
            }
            IntExpr::Div(l, r) => l.mentions_symbolic() || r.mentions_symbolic(),
        }
    }
}

impl<V> BoolExpr<V> {
    /// Visit every variable leaf
    pub fn for_each_var(&self, f: &mut impl FnMut(&V)) {
        match self {
            BoolExpr::True | BoolExpr::False => {}
            BoolExpr::Var(v) => f(v),
            BoolExpr::Sym(s) => s.for_each_var(f),
            BoolExpr::And(xs) | BoolExpr::Or(xs) => {
                for x in xs {
                    x.for_each_var(f);
                }
            }
            BoolExpr::Implies(l, r) => {
                l.for_each_var(f);
                r.for_each_var(f);
            }
            BoolExpr::Eq(l, r) => {
                l.for_each_var(f);
                r.for_each_var(f);
            }
            BoolExpr::Gt(l, r) | BoolExpr::Ge(l, r) | BoolExpr::Le(l, r) | BoolExpr::Lt(l, r) => {
                l.for_each_var(f);
                r.for_each_var(f);
            }
            BoolExpr::Not(x) => x.for_each_var(f),
        }
    }

    /// True if any symbolic leaf occurs
    pub fn mentions_symbolic(&self) -> bool {
        match self {
            BoolExpr::True | BoolExpr::False | BoolExpr::Var(_) => false,
            BoolExpr::Sym(_) => true,
            BoolExpr::And(xs) | BoolExpr::Or(xs) => xs.iter().any(BoolExpr::mentions_symbolic),
            BoolExpr::Implies(l, r) => l.mentions_symbolic() || r.mentions_symbolic(),
            BoolExpr::Eq(l, r) => l.mentions_symbolic() || r.mentions_symbolic(),
            BoolExpr::Gt(l, r) | BoolExpr::Ge(l, r) | BoolExpr::Le(l, r) | BoolExpr::Lt(l, r) => {
                l.mentions_symbolic() || r.mentions_symbolic()
            }
            BoolExpr::Not(x) => x.mentions_symbolic(),
        }
    }

    /// True if this is literally `True`
    pub fn is_true(&self) -> bool {
        matches!(self, BoolExpr::True)
    }

    /// True if this is literally `False`
    pub fn is_false(&self) -> bool {
        matches!(self, BoolExpr::False)
    }
}

// ---------------------------------------------------------------------------
// Smart constructors
// ---------------------------------------------------------------------------

/// Conjunction, flattening nested `And`s and folding constants
pub fn mk_and<V>(conjuncts: impl IntoIterator<Item = BoolExpr<V>>) -> BoolExpr<V> {
    let mut flat = Vec::new();
    for c in conjuncts {
        match c {
            BoolExpr::True => {}
            BoolExpr::False => return BoolExpr::False,
            BoolExpr::And(inner) => flat.extend(inner),
            other => flat.push(other),
        }
    }
    match flat.len() {
        0 => BoolExpr::True,
        1 => flat.remove(0),
        _ => BoolExpr::And(flat),
    }
}

/// Disjunction, flattening nested `Or`s and folding constants
pub fn mk_or<V>(disjuncts: impl IntoIterator<Item = BoolExpr<V>>) -> BoolExpr<V> {
    let mut flat = Vec::new();
    for d in disjuncts {
        match d {
            BoolExpr::False => {}
            BoolExpr::True => return BoolExpr::True,
            BoolExpr::Or(inner) => flat.extend(inner),
            other => flat.push(other),
        }
    }
    match flat.len() {
        0 => BoolExpr::False,
        1 => flat.remove(0),
        _ => BoolExpr::Or(flat),
    }
}

/// Negation, removing double negations and folding constants
pub fn mk_not<V>(e: BoolExpr<V>) -> BoolExpr<V> {
    match e {
        BoolExpr::True => BoolExpr::False,
        BoolExpr::False => BoolExpr::True,
        BoolExpr::Not(inner) => *inner,
        other => BoolExpr::Not(Box::new(other)),
    }
}

/// Implication, folding constant antecedents and consequents
pub fn mk_implies<V>(lhs: BoolExpr<V>, rhs: BoolExpr<V>) -> BoolExpr<V> {
    match (lhs, rhs) {
        (BoolExpr::False, _) | (_, BoolExpr::True) => BoolExpr::True,
        (BoolExpr::True, rhs) => rhs,
        (lhs, BoolExpr::False) => mk_not(lhs),
        (lhs, rhs) => BoolExpr::Implies(Box::new(lhs), Box::new(rhs)),
    }
}

/// Equality between two expressions
pub fn mk_eq<V>(lhs: Expr<V>, rhs: Expr<V>) -> BoolExpr<V> {
    BoolExpr::Eq(Box::new(lhs), Box::new(rhs))
}

/// Integer equality
pub fn mk_int_eq<V>(lhs: IntExpr<V>, rhs: IntExpr<V>) -> BoolExpr<V> {
    mk_eq(Expr::Int(lhs), Expr::Int(rhs))
}

/// `lhs < rhs`
pub fn mk_lt<V>(lhs: IntExpr<V>, rhs: IntExpr<V>) -> BoolExpr<V> {
    BoolExpr::Lt(Box::new(lhs), Box::new(rhs))
}

/// `lhs > rhs`
pub fn mk_gt<V>(lhs: IntExpr<V>, rhs: IntExpr<V>) -> BoolExpr<V> {
    BoolExpr::Gt(Box::new(lhs), Box::new(rhs))
}

/// `lhs <= rhs`
pub fn mk_le<V>(lhs: IntExpr<V>, rhs: IntExpr<V>) -> BoolExpr<V> {
    BoolExpr::Le(Box::new(lhs), Box::new(rhs))
}

/// `lhs >= rhs`
pub fn mk_ge<V>(lhs: IntExpr<V>, rhs: IntExpr<V>) -> BoolExpr<V> {
    BoolExpr::Ge(Box::new(lhs), Box::new(rhs))
}

/// Sum
pub fn mk_add<V>(terms: impl IntoIterator<Item = IntExpr<V>>) -> IntExpr<V> {
    IntExpr::Add(terms.into_iter().collect())
}

/// Left-associated difference
pub fn mk_sub<V>(terms: impl IntoIterator<Item = IntExpr<V>>) -> IntExpr<V> {
    IntExpr::Sub(terms.into_iter().collect())
}

/// Product
pub fn mk_mul<V>(terms: impl IntoIterator<Item = IntExpr<V>>) -> IntExpr<V> {
    IntExpr::Mul(terms.into_iter().collect())
}

/// Integer variable leaf
pub fn ivar<V>(v: impl Into<V>) -> IntExpr<V> {
    IntExpr::Var(v.into())
}

/// Boolean variable leaf
pub fn bvar<V>(v: impl Into<V>) -> BoolExpr<V> {
    BoolExpr::Var(v.into())
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

fn write_nary<T: fmt::Display>(f: &mut fmt::Formatter<'_>, op: &str, xs: &[T]) -> fmt::Result {
    write!(f, "(")?;
    for (i, x) in xs.iter().enumerate() {
        if i > 0 {
            write!(f, " {} ", op)?;
        }
        write!(f, "{}", x)?;
    }
    write!(f, ")")
}

impl<V: fmt::Display> fmt::Display for Symbolic<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{{{}}}(", self.name)?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", p)?;
        }
        write!(f, ")")
    }
}

impl<V: fmt::Display> fmt::Display for IntExpr<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntExpr::Const(n) => write!(f, "{}", n),
            IntExpr::Var(v) => write!(f, "{}", v),
            IntExpr::Sym(s) => write!(f, "{}", s),
            IntExpr::Add(xs) => write_nary(f, "+", xs),
            IntExpr::Sub(xs) => write_nary(f, "-", xs),
            IntExpr::Mul(xs) => write_nary(f, "*", xs),
            IntExpr::Div(l, r) => write!(f, "({} / {})", l, r),
        }
    }
}

impl<V: fmt::Display> fmt::Display for BoolExpr<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoolExpr::True => write!(f, "true"),
            BoolExpr::False => write!(f, "false"),
            BoolExpr::Var(v) => write!(f, "{}", v),
            BoolExpr::Sym(s) => write!(f, "{}", s),
            BoolExpr::And(xs) => write_nary(f, "&&", xs),
            BoolExpr::Or(xs) => write_nary(f, "||", xs),
            BoolExpr::Implies(l, r) => write!(f, "({} => {})", l, r),
            BoolExpr::Eq(l, r) => write!(f, "({} == {})", l, r),
            BoolExpr::Gt(l, r) => write!(f, "({} > {})", l, r),
            BoolExpr::Ge(l, r) => write!(f, "({} >= {})", l, r),
            BoolExpr::Le(l, r) => write!(f, "({} <= {})", l, r),
            BoolExpr::Lt(l, r) => write!(f, "({} < {})", l, r),
            BoolExpr::Not(x) => write!(f, "!{}", x),
        }
    }
}

impl<V: fmt::Display> fmt::Display for Expr<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Int(e) => write!(f, "{}", e),
            Expr::Bool(e) => write!(f, "{}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type E = BoolExpr<Var>;

    #[test]
    fn test_mk_and_flattens_and_folds() {
        let a: E = bvar("a");
        let b: E = bvar("b");
        let c: E = bvar("c");
        let nested = mk_and(vec![BoolExpr::True, a.clone(), BoolExpr::And(vec![b.clone(), c.clone()])]);
        assert_eq!(nested, BoolExpr::And(vec![a.clone(), b, c]));
        assert_eq!(mk_and(vec![a.clone(), BoolExpr::False]), BoolExpr::False);
        assert_eq!(mk_and(Vec::<E>::new()), BoolExpr::True);
        assert_eq!(mk_and(vec![a.clone()]), a);
    }

    #[test]
    fn test_mk_or_and_not() {
        let a: E = bvar("a");
        assert_eq!(mk_or(vec![a.clone(), BoolExpr::True]), BoolExpr::True);
        assert_eq!(mk_or(Vec::<E>::new()), BoolExpr::False);
        assert_eq!(mk_not(mk_not(a.clone())), a);
    }

    #[test]
    fn test_mk_implies_folding() {
        let a: E = bvar("a");
        let b: E = bvar("b");
        assert_eq!(mk_implies(a.clone(), BoolExpr::True), BoolExpr::True);
        assert_eq!(mk_implies(BoolExpr::True, b.clone()), b);
        assert_eq!(mk_implies(a.clone(), BoolExpr::False), mk_not(a));
    }

    #[test]
    fn test_display() {
        let e: E = mk_int_eq(ivar("serving"), mk_add(vec![ivar("t"), IntExpr::Const(1)]));
        assert_eq!(e.to_string(), "(serving == (t + 1))");
    }

    #[test]
    fn test_mentions_symbolic() {
        let sym = IntExpr::Sym(Symbolic {
            name: "rand".into(),
            params: vec![],
        });
        let e: E = mk_int_eq(ivar("x"), sym);
        assert!(e.mentions_symbolic());
        assert!(!mk_int_eq::<Var>(ivar("x"), IntExpr::Const(0)).mentions_symbolic());
    }
}
