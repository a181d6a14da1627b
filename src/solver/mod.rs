//! # Solver boundary
//!
//! Terms leave the crate through the [`Solver`] trait. A request runs in one
//! of three modes:
//!
//! - [`RequestMode::Translate`]: translate the three parts of each term
//! - [`RequestMode::Combine`]: translate and combine into the single formula
//!   `pre && cmd && !post`
//! - [`RequestMode::Sat`]: additionally check that formula; `Unsat` means the
//!   term holds
//!
//! Terms are independent, so requests are dispatched through
//! [`parallel_map`](crate::parallel::parallel_map) and each term's response
//! is kept separately.

pub mod builtin;
pub mod smtlib;

pub use builtin::BuiltinSolver;
pub use smtlib::SmtLibSolver;

use crate::axiom::Term;
use crate::error::{Error, Result};
use crate::expr::{BoolExpr, MarkedVar};
use crate::parallel::{parallel_map, ParallelConfig};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How far to take each term
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestMode {
    /// Translate only
    Translate,
    /// Translate and combine into one formula
    Combine,
    /// Translate, combine and check satisfiability
    #[default]
    Sat,
}

/// Satisfiability of a combined formula
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// A counter-model exists: the term fails
    Sat,
    /// No counter-model: the term holds
    Unsat,
    /// The solver could not decide
    Unknown {
        /// Why the solver gave up
        reason: String,
    },
}

impl Verdict {
    /// Create an unknown verdict
    pub fn unknown(reason: impl Into<String>) -> Self {
        Verdict::Unknown {
            reason: reason.into(),
        }
    }

    /// True if the checked term holds
    pub fn is_proved(&self) -> bool {
        matches!(self, Verdict::Unsat)
    }

    /// True if the checked term has a counter-model
    pub fn is_refuted(&self) -> bool {
        matches!(self, Verdict::Sat)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Sat => write!(f, "sat"),
            Verdict::Unsat => write!(f, "unsat"),
            Verdict::Unknown { reason } => write!(f, "unknown ({})", reason),
        }
    }
}

/// A constraint solver collaborator
pub trait Solver: Sync {
    /// The solver's own formula representation
    type Term: Clone + fmt::Debug + Send;

    /// Solver name for logs
    fn name(&self) -> &str;

    /// Translate a marked Boolean expression
    fn translate(&self, e: &BoolExpr<MarkedVar>) -> Result<Self::Term>;

    /// Conjunction of translated formulas
    fn conjoin(&self, parts: Vec<Self::Term>) -> Self::Term;

    /// Negation of a translated formula
    fn negate(&self, t: Self::Term) -> Self::Term;

    /// Decide satisfiability
    fn check(&self, t: &Self::Term) -> Result<Verdict>;
}

/// A term's three parts, translated
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Translated<T> {
    /// Precondition
    pub pre: T,
    /// Command relation
    pub cmd: T,
    /// Goal
    pub post: T,
}

/// One term's answer to a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Response<T> {
    /// [`RequestMode::Translate`] output
    Translated(Translated<T>),
    /// [`RequestMode::Combine`] output
    Combined(T),
    /// [`RequestMode::Sat`] output, with the formula that was checked
    Checked {
        /// Formula handed to the solver
        formula: T,
        /// The solver's answer
        verdict: Verdict,
    },
}

impl<T> Response<T> {
    /// The verdict, if the request went as far as checking
    pub fn verdict(&self) -> Option<&Verdict> {
        match self {
            Response::Checked { verdict, .. } => Some(verdict),
            _ => None,
        }
    }
}

/// Run one term through `solver` as far as `mode` asks
pub fn respond<S: Solver>(solver: &S, term: &Term, mode: RequestMode) -> Result<Response<S::Term>> {
    let parts = Translated {
        pre: solver.translate(&term.pre)?,
        cmd: solver.translate(&term.cmd)?,
        post: solver.translate(&term.post)?,
    };
    if mode == RequestMode::Translate {
        return Ok(Response::Translated(parts));
    }

    let formula = solver.conjoin(vec![parts.pre, parts.cmd, solver.negate(parts.post)]);
    if mode == RequestMode::Combine {
        return Ok(Response::Combined(formula));
    }

    let verdict = solver.check(&formula)?;
    tracing::debug!("{} says {} for {}", solver.name(), verdict, term.name);
    Ok(Response::Checked { formula, verdict })
}

/// Run every term through `solver`, keeping per-term failures
///
/// Terms that failed to build keep their error and are never sent to the
/// solver. `fail_fast` applies to solver failures only. Output order matches
/// input order.
pub fn solve<S: Solver>(
    solver: &S,
    terms: &[(String, Result<Term>)],
    mode: RequestMode,
    parallel: &ParallelConfig,
) -> Result<Vec<(String, Result<Response<S::Term>>)>> {
    let built: Vec<&Term> = terms.iter().filter_map(|(_, t)| t.as_ref().ok()).collect();
    let mut responses = parallel_map(&built, |term| respond(solver, term, mode), parallel)?.into_iter();

    let mut out = Vec::with_capacity(terms.len());
    for (name, term) in terms {
        let response = match term {
            Ok(_) => responses
                .next()
                .unwrap_or_else(|| Err(Error::runtime(format!("no solver response for {}", name)))),
            Err(e) => Err(e.clone()),
        };
        if let Err(e) = &response {
            tracing::warn!("{}: {}", name, e);
        }
        out.push((name.clone(), response));
    }
    Ok(out)
}
