//! # viewcheck - view-based verification of concurrent programs
//!
//! Turns a parsed concurrent program, annotated with resource *views*, into
//! per-edge proof obligations for a constraint solver.
//!
//! ## Pipeline
//!
//! ```text
//! CollatedScript
//!   → model      (variable tables, view definitions checked against prototypes)
//!   → graph      (each method lowered to named nodes and command edges)
//!   → reifier    (held views matched against definition patterns)
//!   → axiom      (one {pre} cmd {post} per edge)
//!   → term       (Boolean obligations over pre/post-state variables)
//!   → solver     (translate, combine, check)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use viewcheck::{BuiltinSolver, CollatedScript, PipelineOptions, Verifier};
//!
//! # fn main() -> viewcheck::Result<()> {
//! let script = CollatedScript::from_json(r#"{
//!     "globals": [{"ty": "Int", "name": "serving"}],
//!     "methods": []
//! }"#)?;
//!
//! let verifier = Verifier::new(PipelineOptions::default());
//! let report = verifier.verify(&script, &BuiltinSolver::new())?;
//! assert!(report.all_proved());
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`expr`] - two-sorted expressions, marked variables, constant folding
//! - [`subst`] - substitution engine and stage numbering
//! - [`view`] - views, view definitions and multisets
//! - [`command`] - commands, primitive semantics, sequential composition
//! - [`graph`] - program graphs, node unification, method lowering
//! - [`reifier`] - exhaustive matching of held views against definitions
//! - [`axiom`] - axioms and proof terms
//! - [`solver`] - solver trait, built-in and SMT-LIB solvers
//! - [`model`], [`pipeline`], [`config`], [`parallel`] - orchestration

#![warn(missing_docs)]

/// Version of the viewcheck crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod axiom;
pub mod command;
pub mod config;
pub mod error;
pub mod expr;
pub mod graph;
pub mod model;
pub mod parallel;
pub mod pipeline;
pub mod reifier;
pub mod solver;
pub mod subst;
pub mod view;

// Re-export main types
pub use axiom::{Axiom, Term};
pub use command::{Command, PrimCommand, Semantics};
pub use config::PipelineOptions;
pub use error::{Error, ErrorSeverity, Result};
pub use expr::{BoolExpr, Expr, IntExpr, MarkedVar, Type, TypedVar, Var, VarMap};
pub use graph::{to_graph, unify, Edge, Graph, Subgraph};
pub use model::{CollatedScript, Model};
pub use parallel::ParallelConfig;
pub use pipeline::{Report, Summary, Verifier};
pub use reifier::reify;
pub use solver::{BuiltinSolver, RequestMode, SmtLibSolver, Solver, Verdict};
pub use view::{Multiset, View, ViewDef, ViewSet};
