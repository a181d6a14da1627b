//! SMT-LIB v2 translation.
//!
//! Marked variables become quoted symbols (`|serving!before|`) so that any
//! stage marker is a legal identifier. Symbolic leaves have no SMT-LIB
//! meaning and fail translation; drop them with
//! [`remove_symbols`](crate::command::remove_symbols) first.

use super::{Solver, Verdict};
use crate::error::{Error, Result};
use crate::expr::{BoolExpr, Expr, IntExpr, MarkedVar, Type};
use crate::subst::{try_sub_bool, TryMapper};
use std::collections::BTreeMap;
use std::fmt::Write;

/// Translator to SMT-LIB v2 text
///
/// No solver process is attached, so [`Solver::check`] answers unknown.
/// [`SmtLibSolver::script`] renders a complete script for an external
/// solver.
#[derive(Debug, Clone, Default)]
pub struct SmtLibSolver {
    _private: (),
}

impl SmtLibSolver {
    /// Create a translator
    pub fn new() -> Self {
        Self::default()
    }

    /// A self-contained script asserting `e` and asking for satisfiability
    pub fn script(&self, e: &BoolExpr<MarkedVar>) -> Result<String> {
        let mut out = String::from("(set-logic QF_NIA)\n");
        for (var, ty) in declarations(e)? {
            let sort = match ty {
                Type::Int => "Int",
                Type::Bool => "Bool",
            };
            let _ = writeln!(out, "(declare-const {} {})", symbol(&var), sort);
        }
        let _ = writeln!(out, "(assert {})", bool_to_smt(e)?);
        out.push_str("(check-sat)\n");
        Ok(out)
    }
}

impl Solver for SmtLibSolver {
    type Term = String;

    fn name(&self) -> &str {
        "smtlib"
    }

    fn translate(&self, e: &BoolExpr<MarkedVar>) -> Result<String> {
        bool_to_smt(e)
    }

    fn conjoin(&self, parts: Vec<String>) -> String {
        match parts.len() {
            0 => "true".to_string(),
            1 => parts.concat(),
            _ => format!("(and {})", parts.join(" ")),
        }
    }

    fn negate(&self, t: String) -> String {
        format!("(not {})", t)
    }

    fn check(&self, _t: &String) -> Result<Verdict> {
        Ok(Verdict::unknown("no SMT backend attached"))
    }
}

/// Collects every variable with the sort it is used at
#[derive(Default)]
struct Declarations(BTreeMap<MarkedVar, Type>);

impl Declarations {
    fn record(&mut self, v: &MarkedVar, ty: Type) -> Result<()> {
        match self.0.insert(v.clone(), ty) {
            Some(prev) if prev != ty => Err(Error::TypeMismatch {
                name: v.to_string(),
                expected: prev.to_string(),
                got: ty.to_string(),
            }),
            _ => Ok(()),
        }
    }
}

impl TryMapper<MarkedVar, MarkedVar> for Declarations {
    type Error = Error;

    fn try_map_int(&mut self, v: &MarkedVar) -> Result<IntExpr<MarkedVar>> {
        self.record(v, Type::Int)?;
        Ok(IntExpr::Var(v.clone()))
    }

    fn try_map_bool(&mut self, v: &MarkedVar) -> Result<BoolExpr<MarkedVar>> {
        self.record(v, Type::Bool)?;
        Ok(BoolExpr::Var(v.clone()))
    }
}

fn declarations(e: &BoolExpr<MarkedVar>) -> Result<BTreeMap<MarkedVar, Type>> {
    let mut decls = Declarations::default();
    try_sub_bool(&mut decls, e)?;
    Ok(decls.0)
}

fn symbol(v: &MarkedVar) -> String {
    format!("|{}|", v)
}

fn nary(op: &str, args: Vec<String>) -> String {
    format!("({} {})", op, args.join(" "))
}

fn int_to_smt(e: &IntExpr<MarkedVar>) -> Result<String> {
    let all = |xs: &[IntExpr<MarkedVar>]| xs.iter().map(int_to_smt).collect::<Result<Vec<_>>>();
    Ok(match e {
        IntExpr::Const(n) if *n < 0 => format!("(- {})", n.unsigned_abs()),
        IntExpr::Const(n) => n.to_string(),
        IntExpr::Var(v) => symbol(v),
        IntExpr::Sym(s) => return Err(symbolic(&s.name)),
        IntExpr::Add(xs) if xs.is_empty() => "0".to_string(),
        IntExpr::Mul(xs) if xs.is_empty() => "1".to_string(),
        IntExpr::Sub(xs) if xs.is_empty() => {
            return Err(Error::Translator("empty difference".to_string()))
        }
        // a lone `-` operand would read as negation
        IntExpr::Add(xs) | IntExpr::Sub(xs) | IntExpr::Mul(xs) if xs.len() == 1 => {
            int_to_smt(&xs[0])?
        }
        IntExpr::Add(xs) => nary("+", all(xs)?),
        IntExpr::Sub(xs) => nary("-", all(xs)?),
        IntExpr::Mul(xs) => nary("*", all(xs)?),
        IntExpr::Div(l, r) => format!("(div {} {})", int_to_smt(l)?, int_to_smt(r)?),
    })
}

fn expr_to_smt(e: &Expr<MarkedVar>) -> Result<String> {
    match e {
        Expr::Int(i) => int_to_smt(i),
        Expr::Bool(b) => bool_to_smt(b),
    }
}

fn bool_to_smt(e: &BoolExpr<MarkedVar>) -> Result<String> {
    let all = |xs: &[BoolExpr<MarkedVar>]| xs.iter().map(bool_to_smt).collect::<Result<Vec<_>>>();
    let cmp = |op: &str, l: &IntExpr<MarkedVar>, r: &IntExpr<MarkedVar>| -> Result<String> {
        Ok(format!("({} {} {})", op, int_to_smt(l)?, int_to_smt(r)?))
    };
    Ok(match e {
        BoolExpr::True => "true".to_string(),
        BoolExpr::False => "false".to_string(),
        BoolExpr::Var(v) => symbol(v),
        BoolExpr::Sym(s) => return Err(symbolic(&s.name)),
        BoolExpr::And(xs) if xs.is_empty() => "true".to_string(),
        BoolExpr::Or(xs) if xs.is_empty() => "false".to_string(),
        BoolExpr::And(xs) => nary("and", all(xs)?),
        BoolExpr::Or(xs) => nary("or", all(xs)?),
        BoolExpr::Implies(l, r) => format!("(=> {} {})", bool_to_smt(l)?, bool_to_smt(r)?),
        BoolExpr::Eq(l, r) => format!("(= {} {})", expr_to_smt(l)?, expr_to_smt(r)?),
        BoolExpr::Gt(l, r) => cmp(">", l, r)?,
        BoolExpr::Ge(l, r) => cmp(">=", l, r)?,
        BoolExpr::Le(l, r) => cmp("<=", l, r)?,
        BoolExpr::Lt(l, r) => cmp("<", l, r)?,
        BoolExpr::Not(x) => format!("(not {})", bool_to_smt(x)?),
    })
}

fn symbolic(name: &str) -> Error {
    Error::Translator(format!(
        "symbolic term %{{{}}} has no SMT-LIB translation",
        name
    ))
}
