//! # Axioms
//!
//! One axiom per graph edge: the reified view set at the source node, the
//! edge's command, and the reified view set at the destination node. Terms
//! ([`term`]) turn axioms into Boolean proof obligations.

pub mod term;

pub use term::{generate, Term};

use crate::command::Command;
use crate::expr::Var;
use crate::graph::Graph;
use crate::reifier::reify;
use crate::view::{ViewDef, ViewSet};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A Hoare-style triple over reified view sets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Axiom {
    /// Name of the edge the axiom came from
    pub name: String,
    /// Reified view set before the command
    pub pre: ViewSet<Var>,
    /// The command
    pub cmd: Command,
    /// Reified view set after the command
    pub post: ViewSet<Var>,
}

impl fmt::Display for Axiom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {{{} matches}} ", self.name, self.pre.len())?;
        for (i, prim) in self.cmd.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", prim)?;
        }
        write!(f, " {{{} matches}}", self.post.len())
    }
}

/// Build one axiom per edge of `graph`, in edge-name order
pub fn axiomatise(graph: &Graph, defs: &[ViewDef]) -> Vec<Axiom> {
    graph
        .edges()
        .iter()
        .filter_map(|(name, edge)| {
            // Validated graphs never dangle.
            let src = graph.node(&edge.src)?;
            let dest = graph.node(&edge.dest)?;
            Some(Axiom {
                name: name.clone(),
                pre: reify(src, defs),
                cmd: edge.cmd.clone(),
                post: reify(dest, defs),
            })
        })
        .collect()
}
