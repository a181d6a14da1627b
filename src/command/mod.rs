//! # Command Algebra
//!
//! A command is an ordered sequence of primitive relation applications.
//! Each primitive names an entry of the [`Semantics`] table and passes marked
//! expressions as parameters: an increment of `serving` is written
//! `Add(serving!after, serving!before, 1)`.

pub mod semantics;

pub use semantics::{PrimSemantics, Semantics};

use crate::error::Result;
use crate::expr::{mk_and, BoolExpr, Expr, IntExpr, MarkedVar, Type, VarMap};
use crate::subst::{try_sub_expr, TryFnMapper};
use crate::view::{Func, VFunc};

/// Name of the built-in assumption primitive
pub const ASSUME: &str = "Assume";

/// A single primitive relation application
pub type PrimCommand = VFunc<MarkedVar>;

/// An ordered sequence of primitive applications
pub type Command = Vec<PrimCommand>;

/// Build the single-primitive command `Assume(cond)`
pub fn assume(cond: BoolExpr<MarkedVar>) -> Command {
    vec![Func::new(ASSUME, vec![Expr::Bool(cond)])]
}

/// The assumed condition, if `cmd` is exactly `Assume(<bool>)`
pub fn assume_condition(cmd: &[PrimCommand]) -> Option<&BoolExpr<MarkedVar>> {
    match cmd {
        [prim] if prim.name == ASSUME => match prim.params.as_slice() {
            [Expr::Bool(cond)] => Some(cond),
            _ => None,
        },
        _ => None,
    }
}

/// True if `cmd` cannot change state.
///
/// Every parameter may mention only pre-state variables. Any post-state,
/// intermediate or goal variable, or any symbolic leaf, is treated as a
/// possible state change.
pub fn is_nop(cmd: &[PrimCommand]) -> bool {
    cmd.iter().all(|prim| {
        prim.params.iter().all(|p| {
            if p.mentions_symbolic() {
                return false;
            }
            let mut only_before = true;
            p.for_each_var(&mut |v: &MarkedVar| only_before &= v.is_before());
            only_before
        })
    })
}

/// Check every variable a command mentions against its declaration.
///
/// Fails with a lookup error for an undeclared variable, and with a type
/// mismatch when a variable is used at the other sort.
pub fn check_vars(cmd: &[PrimCommand], vars: &VarMap) -> Result<()> {
    let mut checker = TryFnMapper {
        int: |v: &MarkedVar| -> Result<IntExpr<MarkedVar>> {
            vars.lookup_typed(v.name(), Type::Int)?;
            Ok(IntExpr::Var(v.clone()))
        },
        bool: |v: &MarkedVar| -> Result<BoolExpr<MarkedVar>> {
            vars.lookup_typed(v.name(), Type::Bool)?;
            Ok(BoolExpr::Var(v.clone()))
        },
    };
    for prim in cmd {
        for param in &prim.params {
            try_sub_expr(&mut checker, param)?;
        }
    }
    Ok(())
}

/// Drop equalities that only pin down a symbolic value.
///
/// `sym == e` and `e == sym` become `true`. The rewrite distributes through
/// conjunctions and into the consequent of implications. Antecedents are
/// never rewritten.
pub fn remove_symbols<V: Clone>(e: &BoolExpr<V>) -> BoolExpr<V> {
    match e {
        BoolExpr::Eq(l, r) if l.is_symbolic() || r.is_symbolic() => BoolExpr::True,
        BoolExpr::And(xs) => mk_and(xs.iter().map(remove_symbols)),
        BoolExpr::Implies(l, r) => match remove_symbols(r) {
            BoolExpr::True => BoolExpr::True,
            r => BoolExpr::Implies(l.clone(), Box::new(r)),
        },
        other => other.clone(),
    }
}
