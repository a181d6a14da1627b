//! # Substitution Engine
//!
//! Rewrites every variable leaf of an expression tree through a *mapper*:
//! one function per sort, packaged as a single value. Structural nodes are
//! rebuilt unchanged; symbolic leaves keep their name while their
//! parameters are rewritten.
//!
//! Two variants exist:
//!
//! - [`Mapper`]: total, every leaf maps successfully
//! - [`TryMapper`]: fallible, the first failing leaf fails the whole tree
//!
//! The traversal is written once, against [`TryMapper`]; total substitution
//! runs it with an uninhabited error type.
//!
//! ## Staged variables
//!
//! When two transition relations are composed, the second relation's
//! intermediate stages are renumbered from the first relation's
//! [`next_intermediate_stage`], so the two never share a stage.

use crate::expr::{BoolExpr, Expr, IntExpr, MarkedVar, Symbolic, Var};
use std::convert::Infallible;

/// Total variable-to-expression mapping, one operation per sort
pub trait Mapper<S, D> {
    /// Image of an integer-sorted variable
    fn map_int(&mut self, v: &S) -> IntExpr<D>;
    /// Image of a Boolean-sorted variable
    fn map_bool(&mut self, v: &S) -> BoolExpr<D>;
}

/// Fallible variable-to-expression mapping
pub trait TryMapper<S, D> {
    /// Per-leaf failure
    type Error;
    /// Image of an integer-sorted variable
    fn try_map_int(&mut self, v: &S) -> Result<IntExpr<D>, Self::Error>;
    /// Image of a Boolean-sorted variable
    fn try_map_bool(&mut self, v: &S) -> Result<BoolExpr<D>, Self::Error>;
}

/// Runs a total mapper through the fallible traversal
struct Total<'a, M: ?Sized>(&'a mut M);

impl<S, D, M: Mapper<S, D> + ?Sized> TryMapper<S, D> for Total<'_, M> {
    type Error = Infallible;

    fn try_map_int(&mut self, v: &S) -> Result<IntExpr<D>, Infallible> {
        Ok(self.0.map_int(v))
    }

    fn try_map_bool(&mut self, v: &S) -> Result<BoolExpr<D>, Infallible> {
        Ok(self.0.map_bool(v))
    }
}

fn unwrap_total<T>(r: Result<T, Infallible>) -> T {
    match r {
        Ok(t) => t,
        Err(never) => match never {},
    }
}

// ---------------------------------------------------------------------------
// Traversal
// ---------------------------------------------------------------------------

/// Substitute through an integer expression, failing on the first bad leaf
pub fn try_sub_int<S, D, M>(m: &mut M, e: &IntExpr<S>) -> Result<IntExpr<D>, M::Error>
where
    M: TryMapper<S, D> + ?Sized,
{
    Ok(match e {
        IntExpr::Const(n) => IntExpr::Const(*n),
        IntExpr::Var(v) => m.try_map_int(v)?,
        IntExpr::Sym(s) => IntExpr::Sym(try_sub_sym(m, s)?),
        IntExpr::Add(xs) => IntExpr::Add(try_sub_ints(m, xs)?),
        IntExpr::Sub(xs) => IntExpr::Sub(try_sub_ints(m, xs)?),
        IntExpr::Mul(xs) => IntExpr::Mul(try_sub_ints(m, xs)?),
        IntExpr::Div(l, r) => IntExpr::Div(
            Box::new(try_sub_int(m, l)?),
            Box::new(try_sub_int(m, r)?),
        ),
    })
}

/// Substitute through a Boolean expression, failing on the first bad leaf
pub fn try_sub_bool<S, D, M>(m: &mut M, e: &BoolExpr<S>) -> Result<BoolExpr<D>, M::Error>
where
    M: TryMapper<S, D> + ?Sized,
{
    Ok(match e {
        BoolExpr::True => BoolExpr::True,
        BoolExpr::False => BoolExpr::False,
        BoolExpr::Var(v) => m.try_map_bool(v)?,
        BoolExpr::Sym(s) => BoolExpr::Sym(try_sub_sym(m, s)?),
        BoolExpr::And(xs) => BoolExpr::And(try_sub_bools(m, xs)?),
        BoolExpr::Or(xs) => BoolExpr::Or(try_sub_bools(m, xs)?),
        BoolExpr::Implies(l, r) => BoolExpr::Implies(
            Box::new(try_sub_bool(m, l)?),
            Box::new(try_sub_bool(m, r)?),
        ),
        BoolExpr::Eq(l, r) => BoolExpr::Eq(
            Box::new(try_sub_expr(m, l)?),
            Box::new(try_sub_expr(m, r)?),
        ),
        BoolExpr::Gt(l, r) => BoolExpr::Gt(
            Box::new(try_sub_int(m, l)?),
            Box::new(try_sub_int(m, r)?),
        ),
        BoolExpr::Ge(l, r) => BoolExpr::Ge(
            Box::new(try_sub_int(m, l)?),
            Box::new(try_sub_int(m, r)?),
        ),
        BoolExpr::Le(l, r) => BoolExpr::Le(
            Box::new(try_sub_int(m, l)?),
            Box::new(try_sub_int(m, r)?),
        ),
        BoolExpr::Lt(l, r) => BoolExpr::Lt(
            Box::new(try_sub_int(m, l)?),
            Box::new(try_sub_int(m, r)?),
        ),
        BoolExpr::Not(x) => BoolExpr::Not(Box::new(try_sub_bool(m, x)?)),
    })
}

/// Substitute through an expression of either sort
pub fn try_sub_expr<S, D, M>(m: &mut M, e: &Expr<S>) -> Result<Expr<D>, M::Error>
where
    M: TryMapper<S, D> + ?Sized,
{
    Ok(match e {
        Expr::Int(i) => Expr::Int(try_sub_int(m, i)?),
        Expr::Bool(b) => Expr::Bool(try_sub_bool(m, b)?),
    })
}

fn try_sub_sym<S, D, M>(m: &mut M, s: &Symbolic<S>) -> Result<Symbolic<D>, M::Error>
where
    M: TryMapper<S, D> + ?Sized,
{
    let params = s
        .params
        .iter()
        .map(|p| try_sub_expr(m, p))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Symbolic {
        name: s.name.clone(),
        params,
    })
}

fn try_sub_ints<S, D, M>(m: &mut M, xs: &[IntExpr<S>]) -> Result<Vec<IntExpr<D>>, M::Error>
where
    M: TryMapper<S, D> + ?Sized,
{
    xs.iter().map(|x| try_sub_int(m, x)).collect()
}

fn try_sub_bools<S, D, M>(m: &mut M, xs: &[BoolExpr<S>]) -> Result<Vec<BoolExpr<D>>, M::Error>
where
    M: TryMapper<S, D> + ?Sized,
{
    xs.iter().map(|x| try_sub_bool(m, x)).collect()
}

/// Substitute through an integer expression
pub fn sub_int<S, D, M: Mapper<S, D> + ?Sized>(m: &mut M, e: &IntExpr<S>) -> IntExpr<D> {
    unwrap_total(try_sub_int(&mut Total(m), e))
}

/// Substitute through a Boolean expression
pub fn sub_bool<S, D, M: Mapper<S, D> + ?Sized>(m: &mut M, e: &BoolExpr<S>) -> BoolExpr<D> {
    unwrap_total(try_sub_bool(&mut Total(m), e))
}

/// Substitute through an expression of either sort
pub fn sub_expr<S, D, M: Mapper<S, D> + ?Sized>(m: &mut M, e: &Expr<S>) -> Expr<D> {
    unwrap_total(try_sub_expr(&mut Total(m), e))
}

// ---------------------------------------------------------------------------
// Combinators
// ---------------------------------------------------------------------------

/// Total mapper built from one closure per sort
pub struct FnMapper<FI, FB> {
    /// Integer leaf mapping
    pub int: FI,
    /// Boolean leaf mapping
    pub bool: FB,
}

impl<S, D, FI, FB> Mapper<S, D> for FnMapper<FI, FB>
where
    FI: FnMut(&S) -> IntExpr<D>,
    FB: FnMut(&S) -> BoolExpr<D>,
{
    fn map_int(&mut self, v: &S) -> IntExpr<D> {
        (self.int)(v)
    }

    fn map_bool(&mut self, v: &S) -> BoolExpr<D> {
        (self.bool)(v)
    }
}

/// Fallible mapper built from one closure per sort
pub struct TryFnMapper<FI, FB> {
    /// Integer leaf mapping
    pub int: FI,
    /// Boolean leaf mapping
    pub bool: FB,
}

impl<S, D, E, FI, FB> TryMapper<S, D> for TryFnMapper<FI, FB>
where
    FI: FnMut(&S) -> Result<IntExpr<D>, E>,
    FB: FnMut(&S) -> Result<BoolExpr<D>, E>,
{
    type Error = E;

    fn try_map_int(&mut self, v: &S) -> Result<IntExpr<D>, E> {
        (self.int)(v)
    }

    fn try_map_bool(&mut self, v: &S) -> Result<BoolExpr<D>, E> {
        (self.bool)(v)
    }
}

/// Lifts a plain variable renaming into a full substitution
pub struct Renamer<F>(pub F);

impl<S, D, F: FnMut(&S) -> D> Mapper<S, D> for Renamer<F> {
    fn map_int(&mut self, v: &S) -> IntExpr<D> {
        IntExpr::Var((self.0)(v))
    }

    fn map_bool(&mut self, v: &S) -> BoolExpr<D> {
        BoolExpr::Var((self.0)(v))
    }
}

/// Apply `first`, then substitute the result through `second`
pub struct Compose<M1, M2, Mid> {
    first: M1,
    second: M2,
    _mid: std::marker::PhantomData<fn() -> Mid>,
}

impl<M1, M2, Mid> Compose<M1, M2, Mid> {
    /// Compose two mappers
    pub fn new(first: M1, second: M2) -> Self {
        Compose {
            first,
            second,
            _mid: std::marker::PhantomData,
        }
    }
}

impl<S, Mid, D, M1, M2> Mapper<S, D> for Compose<M1, M2, Mid>
where
    M1: Mapper<S, Mid>,
    M2: Mapper<Mid, D>,
{
    fn map_int(&mut self, v: &S) -> IntExpr<D> {
        let mid = self.first.map_int(v);
        sub_int(&mut self.second, &mid)
    }

    fn map_bool(&mut self, v: &S) -> BoolExpr<D> {
        let mid = self.first.map_bool(v);
        sub_bool(&mut self.second, &mid)
    }
}

// ---------------------------------------------------------------------------
// Marking primitives
// ---------------------------------------------------------------------------

/// Renames plain variables to their pre-state
pub fn before() -> Renamer<impl FnMut(&Var) -> MarkedVar> {
    Renamer(|v: &Var| MarkedVar::Before(v.clone()))
}

/// Renames plain variables to their post-state
pub fn after() -> Renamer<impl FnMut(&Var) -> MarkedVar> {
    Renamer(|v: &Var| MarkedVar::After(v.clone()))
}

/// Renames plain variables to intermediate stage `n`
pub fn intermediate(n: u64) -> Renamer<impl FnMut(&Var) -> MarkedVar> {
    Renamer(move |v: &Var| MarkedVar::Intermediate(n, v.clone()))
}

/// Shifts every intermediate stage up by `k`, leaving other marks alone
pub fn bump_intermediates(k: u64) -> Renamer<impl FnMut(&MarkedVar) -> MarkedVar> {
    Renamer(move |v: &MarkedVar| match v {
        MarkedVar::Intermediate(n, x) => MarkedVar::Intermediate(n.saturating_add(k), x.clone()),
        other => other.clone(),
    })
}

/// Mark every variable of a plain Boolean expression as pre-state
pub fn mark_before(e: &BoolExpr<Var>) -> BoolExpr<MarkedVar> {
    sub_bool(&mut before(), e)
}

/// Mark every variable of a plain Boolean expression as post-state
pub fn mark_after(e: &BoolExpr<Var>) -> BoolExpr<MarkedVar> {
    sub_bool(&mut after(), e)
}

// ---------------------------------------------------------------------------
// Stage numbering
// ---------------------------------------------------------------------------

/// The first intermediate stage not used anywhere in a marked expression.
///
/// This is the maximum of `n + 1` over every `Intermediate(n, _)` leaf,
/// including leaves nested in symbolic parameters, or `0` when there are none.
/// Stage numbers saturate at `u64::MAX`.
pub trait NextStage {
    /// Next free intermediate stage
    fn next_intermediate_stage(&self) -> u64;
}

fn stage_of(acc: &mut u64, v: &MarkedVar) {
    if let MarkedVar::Intermediate(n, _) = v {
        *acc = (*acc).max(n.saturating_add(1));
    }
}

impl NextStage for IntExpr<MarkedVar> {
    fn next_intermediate_stage(&self) -> u64 {
        let mut acc = 0;
        self.for_each_var(&mut |v| stage_of(&mut acc, v));
        acc
    }
}

impl NextStage for BoolExpr<MarkedVar> {
    fn next_intermediate_stage(&self) -> u64 {
        let mut acc = 0;
        self.for_each_var(&mut |v| stage_of(&mut acc, v));
        acc
    }
}

impl NextStage for Expr<MarkedVar> {
    fn next_intermediate_stage(&self) -> u64 {
        let mut acc = 0;
        self.for_each_var(&mut |v| stage_of(&mut acc, v));
        acc
    }
}

/// Free-function form of [`NextStage::next_intermediate_stage`]
pub fn next_intermediate_stage<E: NextStage + ?Sized>(e: &E) -> u64 {
    e.next_intermediate_stage()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::expr::{bvar, ivar, mk_add, mk_and, mk_int_eq};

    fn inc(x: &str) -> BoolExpr<Var> {
        mk_int_eq(ivar(x), mk_add(vec![ivar(x), IntExpr::Const(1)]))
    }

    #[test]
    fn test_before_after_marking() {
        let e = inc("serving");
        let pre = mark_before(&e);
        assert_eq!(
            pre,
            mk_int_eq(
                IntExpr::Var(MarkedVar::Before("serving".into())),
                mk_add(vec![
                    IntExpr::Var(MarkedVar::Before("serving".into())),
                    IntExpr::Const(1)
                ])
            )
        );
        assert_eq!(mark_after(&bvar("f")), BoolExpr::Var(MarkedVar::After("f".into())));
    }

    #[test]
    fn test_substitution_reaches_symbolic_params() {
        let sym: BoolExpr<Var> = BoolExpr::Sym(Symbolic {
            name: "opaque".into(),
            params: vec![Expr::Int(ivar("x"))],
        });
        let marked = sub_bool(&mut intermediate(3), &sym);
        assert_eq!(
            marked,
            BoolExpr::Sym(Symbolic {
                name: "opaque".into(),
                params: vec![Expr::Int(IntExpr::Var(MarkedVar::Intermediate(3, "x".into())))],
            })
        );
        assert_eq!(next_intermediate_stage(&marked), 4);
    }

    #[test]
    fn test_next_stage_saturates() {
        let e: BoolExpr<MarkedVar> = BoolExpr::Var(MarkedVar::Intermediate(u64::MAX, "x".into()));
        assert_eq!(next_intermediate_stage(&e), u64::MAX);
        let bumped = sub_bool(&mut bump_intermediates(1), &e);
        assert_eq!(bumped, e);
    }

    #[test]
    fn test_next_stage_without_intermediates() {
        assert_eq!(next_intermediate_stage(&mark_before(&inc("t"))), 0);
        let e: BoolExpr<MarkedVar> = BoolExpr::True;
        assert_eq!(next_intermediate_stage(&e), 0);
    }

    #[test]
    fn test_bump_intermediates() {
        let e = mk_and(vec![
            sub_bool(&mut intermediate(0), &inc("x")),
            mark_before(&inc("y")),
        ]);
        let bumped = sub_bool(&mut bump_intermediates(5), &e);
        assert_eq!(next_intermediate_stage(&bumped), 6);
        let mut befores = 0;
        bumped.for_each_var(&mut |v| {
            if v.is_before() {
                befores += 1
            }
        });
        assert_eq!(befores, 2);
    }

    #[test]
    fn test_fallible_substitution_reports_leaf_error() {
        let e = mk_and(vec![inc("ok"), inc("missing")]);
        let mut m = TryFnMapper {
            int: |v: &Var| -> Result<IntExpr<MarkedVar>, Error> {
                if v == "ok" {
                    Ok(IntExpr::Var(MarkedVar::Before(v.clone())))
                } else {
                    Err(Error::var_not_found(v.clone()))
                }
            },
            bool: |v: &Var| -> Result<BoolExpr<MarkedVar>, Error> {
                Err(Error::var_not_found(v.clone()))
            },
        };
        let result: Result<BoolExpr<MarkedVar>, Error> = try_sub_bool(&mut m, &e);
        assert_eq!(result, Err(Error::var_not_found("missing")));
    }

    #[test]
    fn test_compose_maps_through_both() {
        // x -> x + 1, then mark as after
        let first = FnMapper {
            int: |v: &Var| mk_add(vec![IntExpr::Var(v.clone()), IntExpr::Const(1)]),
            bool: |v: &Var| BoolExpr::Var(v.clone()),
        };
        let mut composed: Compose<_, _, Var> = Compose::new(first, after());
        let e: IntExpr<Var> = ivar("x");
        assert_eq!(
            sub_int(&mut composed, &e),
            mk_add(vec![IntExpr::Var(MarkedVar::After("x".into())), IntExpr::Const(1)])
        );
    }
}
