//! # Primitive semantics and command relations
//!
//! The semantics table maps each primitive name to a two-state relation
//! over its formal parameters. Instantiating a primitive substitutes the
//! actual (marked) parameters for the formals and adds frame equalities for
//! every declared variable the primitive does not write.
//!
//! A multi-primitive command is the sequential composition of its
//! primitives' relations:
//!
//! ```text
//! r1(before, after) ; r2(before, after)
//!   = r1(before, !k) && r2(!k, after)     with k = next free stage of r1
//! ```
//!
//! r2's own intermediate stages are shifted past `k` first, so no stage is
//! ever shared between the two halves.

use super::{check_vars, PrimCommand, ASSUME};
use crate::error::{Error, Result};
use crate::expr::{
    bvar, ivar, mk_add, mk_and, mk_eq, mk_int_eq, BoolExpr, Expr, IntExpr, MarkedVar, Type,
    TypedVar, Var, VarMap,
};
use crate::subst::{bump_intermediates, sub_bool, try_sub_bool, NextStage, Renamer, TryFnMapper};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Relation for one primitive, over its formal parameter names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimSemantics {
    /// Formal parameters
    pub params: Vec<TypedVar>,
    /// Relation body over the formals
    pub body: BoolExpr<Var>,
}

/// Table of primitive semantics, keyed by primitive name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Semantics {
    prims: BTreeMap<String, PrimSemantics>,
}

impl Default for Semantics {
    fn default() -> Self {
        Self::new()
    }
}

impl Semantics {
    /// A table holding only the built-in `Assume(bool c)`
    pub fn new() -> Self {
        let mut prims = BTreeMap::new();
        prims.insert(
            ASSUME.to_string(),
            PrimSemantics {
                params: vec![TypedVar::bool("c")],
                body: bvar("c"),
            },
        );
        Semantics { prims }
    }

    /// A table with the built-in assignment and counter primitives
    ///
    /// - `IAssign(int dest, int src)`: `dest == src`
    /// - `BAssign(bool dest, bool src)`: `dest == src`
    /// - `IIncr(int dest, int src)`: `dest == src + 1`
    /// - `IFetchIncr(int dest, int ctr_after, int ctr)`:
    ///   `dest == ctr && ctr_after == ctr + 1`
    pub fn core() -> Self {
        let mut sem = Self::new();
        sem.register(
            "IAssign",
            vec![TypedVar::int("dest"), TypedVar::int("src")],
            mk_int_eq(ivar("dest"), ivar("src")),
        );
        sem.register(
            "BAssign",
            vec![TypedVar::bool("dest"), TypedVar::bool("src")],
            mk_eq(Expr::Bool(bvar("dest")), Expr::Bool(bvar("src"))),
        );
        sem.register(
            "IIncr",
            vec![TypedVar::int("dest"), TypedVar::int("src")],
            mk_int_eq(ivar("dest"), mk_add(vec![ivar("src"), IntExpr::Const(1)])),
        );
        sem.register(
            "IFetchIncr",
            vec![
                TypedVar::int("dest"),
                TypedVar::int("ctr_after"),
                TypedVar::int("ctr"),
            ],
            mk_and(vec![
                mk_int_eq(ivar("dest"), ivar("ctr")),
                mk_int_eq(
                    ivar("ctr_after"),
                    mk_add(vec![ivar("ctr"), IntExpr::Const(1)]),
                ),
            ]),
        );
        sem
    }

    /// Add or replace a primitive
    pub fn register(&mut self, name: impl Into<String>, params: Vec<TypedVar>, body: BoolExpr<Var>) {
        self.prims
            .insert(name.into(), PrimSemantics { params, body });
    }

    /// Look up a primitive
    pub fn get(&self, name: &str) -> Option<&PrimSemantics> {
        self.prims.get(name)
    }

    /// Substitute actual parameters into a primitive's body, without framing
    pub fn instantiate(&self, prim: &PrimCommand) -> Result<BoolExpr<MarkedVar>> {
        let sem = self
            .get(&prim.name)
            .ok_or_else(|| Error::unsupported(&prim.name, "no semantics defined for primitive"))?;

        if sem.params.len() != prim.params.len() {
            return Err(Error::unsupported(
                &prim.name,
                format!(
                    "expects {} parameters, got {}",
                    sem.params.len(),
                    prim.params.len()
                ),
            ));
        }

        let mut actuals: BTreeMap<&str, &Expr<MarkedVar>> = BTreeMap::new();
        for (formal, actual) in sem.params.iter().zip(&prim.params) {
            if formal.ty != actual.ty() {
                return Err(Error::TypeMismatch {
                    name: format!("{}.{}", prim.name, formal.name),
                    expected: formal.ty.to_string(),
                    got: actual.ty().to_string(),
                });
            }
            actuals.insert(formal.name.as_str(), actual);
        }

        let mut mapper = TryFnMapper {
            int: |v: &Var| -> Result<IntExpr<MarkedVar>> {
                match actuals.get(v.as_str()) {
                    Some(Expr::Int(e)) => Ok(e.clone()),
                    Some(Expr::Bool(_)) => Err(sort_clash(v, Type::Int)),
                    None => Err(Error::var_not_found(v.clone())),
                }
            },
            bool: |v: &Var| -> Result<BoolExpr<MarkedVar>> {
                match actuals.get(v.as_str()) {
                    Some(Expr::Bool(e)) => Ok(e.clone()),
                    Some(Expr::Int(_)) => Err(sort_clash(v, Type::Bool)),
                    None => Err(Error::var_not_found(v.clone())),
                }
            },
        };
        try_sub_bool(&mut mapper, &sem.body)
    }

    /// The framed two-state relation of one primitive
    ///
    /// Every variable in the actual parameters must be declared in `vars`
    /// at the sort it is used at.
    pub fn prim_relation(&self, prim: &PrimCommand, vars: &VarMap) -> Result<BoolExpr<MarkedVar>> {
        check_vars(std::slice::from_ref(prim), vars)?;
        let body = self.instantiate(prim)?;
        Ok(mk_and(vec![body, frame(vars, &written_vars(prim))]))
    }

    /// The two-state relation of a whole command
    ///
    /// An empty command is the identity relation over `vars`.
    pub fn command_relation(&self, cmd: &[PrimCommand], vars: &VarMap) -> Result<BoolExpr<MarkedVar>> {
        let mut relations = cmd
            .iter()
            .map(|prim| self.prim_relation(prim, vars))
            .collect::<Result<Vec<_>>>()?
            .into_iter();

        let first = match relations.next() {
            Some(r) => r,
            None => return Ok(frame(vars, &BTreeSet::new())),
        };
        Ok(relations.fold(first, |acc, r| compose(&acc, &r)))
    }
}

fn sort_clash(v: &str, used_as: Type) -> Error {
    let declared = match used_as {
        Type::Int => Type::Bool,
        Type::Bool => Type::Int,
    };
    Error::TypeMismatch {
        name: v.to_string(),
        expected: declared.to_string(),
        got: used_as.to_string(),
    }
}

/// Variables a primitive writes: those passed in post-state
pub fn written_vars(prim: &PrimCommand) -> BTreeSet<Var> {
    let mut written = BTreeSet::new();
    for p in &prim.params {
        p.for_each_var(&mut |v: &MarkedVar| {
            if let MarkedVar::After(x) = v {
                written.insert(x.clone());
            }
        });
    }
    written
}

/// `x!after == x!before` for every declared variable not in `written`
pub fn frame(vars: &VarMap, written: &BTreeSet<Var>) -> BoolExpr<MarkedVar> {
    mk_and(
        vars.iter()
            .filter(|tv| !written.contains(&tv.name))
            .map(|tv| {
                let post = MarkedVar::After(tv.name.clone());
                let pre = MarkedVar::Before(tv.name.clone());
                match tv.ty {
                    Type::Int => mk_int_eq(IntExpr::Var(post), IntExpr::Var(pre)),
                    Type::Bool => mk_eq(
                        Expr::Bool(BoolExpr::Var(post)),
                        Expr::Bool(BoolExpr::Var(pre)),
                    ),
                }
            }),
    )
}

/// Sequential composition of two two-state relations
pub fn compose(first: &BoolExpr<MarkedVar>, second: &BoolExpr<MarkedVar>) -> BoolExpr<MarkedVar> {
    let mid = first.next_intermediate_stage();
    let second = sub_bool(&mut bump_intermediates(mid.saturating_add(1)), second);

    let first = sub_bool(
        &mut Renamer(|v: &MarkedVar| match v {
            MarkedVar::After(x) => MarkedVar::Intermediate(mid, x.clone()),
            other => other.clone(),
        }),
        first,
    );
    let second = sub_bool(
        &mut Renamer(|v: &MarkedVar| match v {
            MarkedVar::Before(x) => MarkedVar::Intermediate(mid, x.clone()),
            other => other.clone(),
        }),
        &second,
    );
    mk_and(vec![first, second])
}
