//! Proof terms: axioms as Boolean obligations.
//!
//! A term is a triple of marked Boolean expressions. The precondition
//! conjoins, for every distinct reified view before the command,
//! `guard => definition` over pre-state variables. The command becomes its
//! two-state relation. Every distinct reified view after the command is a
//! separate goal over post-state variables, so one axiom may yield several
//! terms (`<axiom>/<n>`). An axiom with nothing to prove afterwards yields a
//! single term with goal `true`.

use super::Axiom;
use crate::command::semantics::frame;
use crate::command::{assume_condition, check_vars, remove_symbols, Semantics};
use crate::config::PipelineOptions;
use crate::error::{Error, Result};
use crate::expr::{mk_and, mk_implies, mk_not, BoolExpr, Expr, IntExpr, MarkedVar, Type, Var, VarMap};
use crate::model::Model;
use crate::subst::{try_sub_bool, try_sub_expr, TryFnMapper, TryMapper};
use crate::view::{ReView, VFunc, ViewDef, ViewDefinition};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A proof obligation: `pre && cmd => post`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    /// Axiom name, suffixed with the goal index when there are several
    pub name: String,
    /// Precondition over pre-state variables
    pub pre: BoolExpr<MarkedVar>,
    /// Two-state command relation
    pub cmd: BoolExpr<MarkedVar>,
    /// Goal over post-state variables
    pub post: BoolExpr<MarkedVar>,
}

impl Term {
    /// `pre && cmd && !post`; the term holds iff this is unsatisfiable
    pub fn negated_claim(&self) -> BoolExpr<MarkedVar> {
        mk_and(vec![
            self.pre.clone(),
            self.cmd.clone(),
            mk_not(self.post.clone()),
        ])
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} && {} => {}", self.name, self.pre, self.cmd, self.post)
    }
}

type Mark = fn(Var) -> MarkedVar;

struct TermBuilder<'a> {
    globals: &'a VarMap,
    vars: VarMap,
    defs: &'a [ViewDefinition],
    semantics: &'a Semantics,
    options: &'a PipelineOptions,
}

impl<'a> TermBuilder<'a> {
    fn terms(&self, axiom: &Axiom) -> Result<Vec<Term>> {
        let mut pre = mk_and(
            axiom
                .pre
                .iter_counts()
                .map(|(rv, _)| self.instantiate(rv, MarkedVar::Before))
                .collect::<Result<Vec<_>>>()?,
        );

        let cmd = match assume_condition(&axiom.cmd) {
            Some(cond) if self.options.fold_assumes => {
                check_vars(&axiom.cmd, &self.vars)?;
                pre = mk_and(vec![pre, cond.clone()]);
                frame(&self.vars, &BTreeSet::new())
            }
            _ => self.semantics.command_relation(&axiom.cmd, &self.vars)?,
        };
        let cmd = if self.options.drop_symbolic_equalities {
            remove_symbols(&cmd)
        } else {
            cmd
        };

        let mut goals = axiom
            .post
            .iter_counts()
            .map(|(rv, _)| self.instantiate(rv, MarkedVar::After))
            .collect::<Result<Vec<_>>>()?;
        if goals.is_empty() {
            goals.push(BoolExpr::True);
        }

        let single = goals.len() == 1;
        Ok(goals
            .into_iter()
            .enumerate()
            .map(|(i, post)| Term {
                name: if single {
                    axiom.name.clone()
                } else {
                    format!("{}/{}", axiom.name, i)
                },
                pre: pre.clone(),
                cmd: cmd.clone(),
                post,
            })
            .collect())
    }

    /// `guard => definition` for one reified view, with every variable marked
    fn instantiate(&self, rv: &ReView<Var>, mark: Mark) -> Result<BoolExpr<MarkedVar>> {
        let guard = self.mark_bool(&rv.guard, mark)?;
        let mut bodies = Vec::new();
        for def in self.defs.iter().filter(|d| matches_shape(&d.view, &rv.item)) {
            let Some(body) = &def.body else {
                continue;
            };
            let actuals = self.bind_params(&def.view, &rv.item, mark)?;
            bodies.push(self.substitute_body(body, &actuals, mark)?);
        }
        Ok(mk_implies(guard, mk_and(bodies)))
    }

    fn bind_params<'d>(
        &self,
        pattern: &'d ViewDef,
        item: &[VFunc<Var>],
        mark: Mark,
    ) -> Result<BTreeMap<&'d str, Expr<MarkedVar>>> {
        let mut actuals = BTreeMap::new();
        for (comp, inst) in pattern.components().into_iter().zip(item) {
            for (formal, actual) in comp.params.iter().zip(&inst.params) {
                if formal.ty != actual.ty() {
                    return Err(Error::TypeMismatch {
                        name: format!("{}.{}", comp.name, formal.name),
                        expected: formal.ty.to_string(),
                        got: actual.ty().to_string(),
                    });
                }
                let marked = self.mark_expr(actual, mark)?;
                if actuals.insert(formal.name.as_str(), marked).is_some() {
                    return Err(Error::VarDuplicate {
                        name: formal.name.clone(),
                    });
                }
            }
        }
        Ok(actuals)
    }

    /// Formals become the bound actuals; anything else must be a global
    fn substitute_body(
        &self,
        body: &BoolExpr<Var>,
        actuals: &BTreeMap<&str, Expr<MarkedVar>>,
        mark: Mark,
    ) -> Result<BoolExpr<MarkedVar>> {
        let globals = self.globals;
        let mut mapper = TryFnMapper {
            int: |v: &Var| -> Result<IntExpr<MarkedVar>> {
                match actuals.get(v.as_str()) {
                    Some(Expr::Int(e)) => Ok(e.clone()),
                    Some(Expr::Bool(_)) => Err(mismatch(v, Type::Bool, Type::Int)),
                    None => {
                        globals.lookup_typed(v, Type::Int)?;
                        Ok(IntExpr::Var(mark(v.clone())))
                    }
                }
            },
            bool: |v: &Var| -> Result<BoolExpr<MarkedVar>> {
                match actuals.get(v.as_str()) {
                    Some(Expr::Bool(e)) => Ok(e.clone()),
                    Some(Expr::Int(_)) => Err(mismatch(v, Type::Int, Type::Bool)),
                    None => {
                        globals.lookup_typed(v, Type::Bool)?;
                        Ok(BoolExpr::Var(mark(v.clone())))
                    }
                }
            },
        };
        try_sub_bool(&mut mapper, body)
    }

    fn marker(&self, mark: Mark) -> impl TryMapper<Var, MarkedVar, Error = Error> + '_ {
        let vars = &self.vars;
        TryFnMapper {
            int: move |v: &Var| -> Result<IntExpr<MarkedVar>> {
                vars.lookup_typed(v, Type::Int)?;
                Ok(IntExpr::Var(mark(v.clone())))
            },
            bool: move |v: &Var| -> Result<BoolExpr<MarkedVar>> {
                vars.lookup_typed(v, Type::Bool)?;
                Ok(BoolExpr::Var(mark(v.clone())))
            },
        }
    }

    fn mark_bool(&self, e: &BoolExpr<Var>, mark: Mark) -> Result<BoolExpr<MarkedVar>> {
        try_sub_bool(&mut self.marker(mark), e)
    }

    fn mark_expr(&self, e: &Expr<Var>, mark: Mark) -> Result<Expr<MarkedVar>> {
        try_sub_expr(&mut self.marker(mark), e)
    }
}

fn mismatch(v: &str, declared: Type, used: Type) -> Error {
    Error::TypeMismatch {
        name: v.to_string(),
        expected: declared.to_string(),
        got: used.to_string(),
    }
}

fn matches_shape(pattern: &ViewDef, item: &[VFunc<Var>]) -> bool {
    let comps = pattern.components();
    comps.len() == item.len() && comps.iter().zip(item).all(|(c, i)| c.same_shape(i))
}

/// Terms for every axiom in the model, in axiom-name order.
///
/// An axiom that fails contributes a single entry carrying its error; the
/// rest are unaffected.
pub fn generate(
    model: &Model,
    semantics: &Semantics,
    options: &PipelineOptions,
) -> Result<Vec<(String, Result<Term>)>> {
    let builder = TermBuilder {
        globals: &model.globals,
        vars: model.all_vars()?,
        defs: &model.view_defs,
        semantics,
        options,
    };

    let mut out = Vec::new();
    for (name, axiom) in &model.axioms {
        match builder.terms(axiom) {
            Ok(terms) => out.extend(terms.into_iter().map(|t| (t.name.clone(), Ok(t)))),
            Err(e) => {
                tracing::warn!("no terms for axiom {}: {}", name, e);
                out.push((name.clone(), Err(e)));
            }
        }
    }
    tracing::debug!("generated {} terms from {} axioms", out.len(), model.axioms.len());
    Ok(out)
}
