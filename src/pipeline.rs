//! # Verification pipeline
//!
//! ```text
//! CollatedScript → model (graphs, axioms) → terms → solver → Report
//! ```
//!
//! One method or axiom failing never stops the others; its error is kept in
//! the report next to the results that did succeed.

use crate::axiom::{generate, Term};
use crate::command::Semantics;
use crate::config::PipelineOptions;
use crate::error::Result;
use crate::model::{model, CollatedScript, Diagnostic, Model};
use crate::solver::{solve, Response, Solver, Verdict};
use serde::Serialize;

/// Verifier for collated scripts
pub struct Verifier {
    options: PipelineOptions,
    semantics: Semantics,
}

/// Everything a run produced
#[derive(Debug)]
pub struct Report<T> {
    /// Errors found while modelling
    pub diagnostics: Vec<Diagnostic>,
    /// Per-term solver responses, in term-name order
    pub responses: Vec<(String, Result<Response<T>>)>,
}

/// Counts of term outcomes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Terms with a response
    pub total: usize,
    /// Terms shown to hold
    pub proved: usize,
    /// Terms with a counter-model
    pub refuted: usize,
    /// Terms the solver could not decide, or not checked
    pub undecided: usize,
    /// Terms or axioms that failed before reaching the solver
    pub errors: usize,
    /// Modelling diagnostics
    pub diagnostics: usize,
}

impl<T> Report<T> {
    /// Tally the outcomes
    pub fn summary(&self) -> Summary {
        let mut s = Summary {
            total: self.responses.len(),
            diagnostics: self.diagnostics.len(),
            ..Default::default()
        };
        for (_, r) in &self.responses {
            match r.as_ref().map(Response::verdict) {
                Ok(Some(Verdict::Unsat)) => s.proved += 1,
                Ok(Some(Verdict::Sat)) => s.refuted += 1,
                Ok(_) => s.undecided += 1,
                Err(_) => s.errors += 1,
            }
        }
        s
    }

    /// True if every term was proved and nothing failed
    pub fn all_proved(&self) -> bool {
        let s = self.summary();
        s.diagnostics == 0 && s.proved == s.total
    }
}

impl Verifier {
    /// Create a verifier with the core primitive semantics
    pub fn new(options: PipelineOptions) -> Self {
        Self {
            options,
            semantics: Semantics::core(),
        }
    }

    /// Replace the primitive semantics table
    pub fn with_semantics(mut self, semantics: Semantics) -> Self {
        self.semantics = semantics;
        self
    }

    /// Options in use
    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Model a script
    pub fn model(&self, script: &CollatedScript) -> Result<Model> {
        self.options.validate()?;
        model(script, &self.options)
    }

    /// Proof terms for a model
    pub fn terms(&self, model: &Model) -> Result<Vec<(String, Result<Term>)>> {
        generate(model, &self.semantics, &self.options)
    }

    /// Run the whole pipeline with `solver`
    pub fn verify<S: Solver>(&self, script: &CollatedScript, solver: &S) -> Result<Report<S::Term>> {
        let model = self.model(script)?;
        let terms = self.terms(&model)?;
        tracing::info!(
            "checking {} terms with {} ({:?})",
            terms.len(),
            solver.name(),
            self.options.mode
        );

        let responses = solve(solver, &terms, self.options.mode, &self.options.parallel)?;
        let report = Report {
            diagnostics: model.diagnostics,
            responses,
        };

        let summary = report.summary();
        tracing::info!(
            "{} proved, {} refuted, {} undecided, {} errors",
            summary.proved,
            summary.refuted,
            summary.undecided,
            summary.errors
        );
        Ok(report)
    }
}

impl Default for Verifier {
    fn default() -> Self {
        Self::new(PipelineOptions::default())
    }
}
