//! Constant folding over expression trees.
//!
//! Folds literal arithmetic, literal comparisons and Boolean connectives,
//! and decides equalities between syntactically identical sides. Anything
//! involving unknown variables is left in place.

use super::{mk_and, mk_implies, mk_not, mk_or, BoolExpr, Expr, IntExpr, Symbolic};

/// Fold constants in a Boolean expression
pub fn simplify<V: Clone + Eq>(e: &BoolExpr<V>) -> BoolExpr<V> {
    match e {
        BoolExpr::True | BoolExpr::False | BoolExpr::Var(_) => e.clone(),
        BoolExpr::Sym(s) => BoolExpr::Sym(simplify_sym(s)),
        BoolExpr::And(xs) => mk_and(xs.iter().map(simplify)),
        BoolExpr::Or(xs) => mk_or(xs.iter().map(simplify)),
        BoolExpr::Implies(l, r) => mk_implies(simplify(l), simplify(r)),
        BoolExpr::Not(x) => mk_not(simplify(x)),
        BoolExpr::Eq(l, r) => {
            let l = simplify_expr(l);
            let r = simplify_expr(r);
            match (&l, &r) {
                (Expr::Int(IntExpr::Const(a)), Expr::Int(IntExpr::Const(b))) => from_bool(a == b),
                (Expr::Bool(a), Expr::Bool(b)) if is_literal(a) && is_literal(b) => {
                    from_bool(a == b)
                }
                _ if l == r && !l.mentions_symbolic() => BoolExpr::True,
                _ => BoolExpr::Eq(Box::new(l), Box::new(r)),
            }
        }
        BoolExpr::Gt(l, r) => compare(l, r, |a, b| a > b, BoolExpr::Gt),
        BoolExpr::Ge(l, r) => compare(l, r, |a, b| a >= b, BoolExpr::Ge),
        BoolExpr::Le(l, r) => compare(l, r, |a, b| a <= b, BoolExpr::Le),
        BoolExpr::Lt(l, r) => compare(l, r, |a, b| a < b, BoolExpr::Lt),
    }
}

/// Fold constants in an integer expression
pub fn simplify_int<V: Clone + Eq>(e: &IntExpr<V>) -> IntExpr<V> {
    match e {
        IntExpr::Const(_) | IntExpr::Var(_) => e.clone(),
        IntExpr::Sym(s) => IntExpr::Sym(simplify_sym(s)),
        IntExpr::Add(xs) => fold_nary(xs, IntExpr::Add, |a, b| a.checked_add(b)),
        IntExpr::Sub(xs) => fold_nary(xs, IntExpr::Sub, |a, b| a.checked_sub(b)),
        IntExpr::Mul(xs) => fold_nary(xs, IntExpr::Mul, |a, b| a.checked_mul(b)),
        IntExpr::Div(l, r) => {
            let l = simplify_int(l);
            let r = simplify_int(r);
            match (&l, &r) {
                (IntExpr::Const(a), IntExpr::Const(b)) => match a.checked_div_euclid(*b) {
                    Some(q) => IntExpr::Const(q),
                    None => IntExpr::Div(Box::new(l), Box::new(r)),
                },
                _ => IntExpr::Div(Box::new(l), Box::new(r)),
            }
        }
    }
}

fn simplify_expr<V: Clone + Eq>(e: &Expr<V>) -> Expr<V> {
    match e {
        Expr::Int(i) => Expr::Int(simplify_int(i)),
        Expr::Bool(b) => Expr::Bool(simplify(b)),
    }
}

fn simplify_sym<V: Clone + Eq>(s: &Symbolic<V>) -> Symbolic<V> {
    Symbolic {
        name: s.name.clone(),
        params: s.params.iter().map(simplify_expr).collect(),
    }
}

fn from_bool<V>(b: bool) -> BoolExpr<V> {
    if b {
        BoolExpr::True
    } else {
        BoolExpr::False
    }
}

fn is_literal<V>(e: &BoolExpr<V>) -> bool {
    e.is_true() || e.is_false()
}

fn compare<V: Clone + Eq>(
    l: &IntExpr<V>,
    r: &IntExpr<V>,
    op: impl Fn(i64, i64) -> bool,
    rebuild: impl Fn(Box<IntExpr<V>>, Box<IntExpr<V>>) -> BoolExpr<V>,
) -> BoolExpr<V> {
    let l = simplify_int(l);
    let r = simplify_int(r);
    match (&l, &r) {
        (IntExpr::Const(a), IntExpr::Const(b)) => from_bool(op(*a, *b)),
        _ => rebuild(Box::new(l), Box::new(r)),
    }
}

/// Fold an n-ary operator when every operand is a literal; overflow leaves
/// the expression unfolded.
fn fold_nary<V: Clone + Eq>(
    xs: &[IntExpr<V>],
    rebuild: impl Fn(Vec<IntExpr<V>>) -> IntExpr<V>,
    op: impl Fn(i64, i64) -> Option<i64>,
) -> IntExpr<V> {
    let folded: Vec<IntExpr<V>> = xs.iter().map(simplify_int).collect();
    let consts: Option<Vec<i64>> = folded
        .iter()
        .map(|x| match x {
            IntExpr::Const(n) => Some(*n),
            _ => None,
        })
        .collect();

    match consts.as_deref() {
        Some([first, rest @ ..]) => rest
            .iter()
            .try_fold(*first, |acc, n| op(acc, *n))
            .map(IntExpr::Const)
            .unwrap_or_else(|| rebuild(folded)),
        _ => rebuild(folded),
    }
}
