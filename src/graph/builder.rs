//! Lowering of method bodies into subgraphs.
//!
//! Every view annotation becomes a node named `<method>_V<n>` and every
//! transition an edge named `<method>_C<n>`. Branches and loops are entered
//! and left through `Assume` edges; join points are reached through edges
//! with the empty command, which [`fold_nop_edges`](super::fold_nop_edges)
//! may later collapse.
//!
//! ```text
//! while (c) { {| I |} body {| J |} }      pre --Assume(c)--> I
//!                                           J --nop-------> pre
//!                                         pre --Assume(!c)-> post
//! ```

use super::{Edge, Subgraph};
use crate::command::{assume, Command};
use crate::expr::{mk_not, BoolExpr, Var};
use crate::model::{Block, Method, PartCmd};
use crate::subst::mark_before;
use crate::view::View;

struct Lowerer<'a> {
    method: &'a str,
    graph: Subgraph,
    next_node: usize,
    next_edge: usize,
}

impl<'a> Lowerer<'a> {
    fn node(&mut self, view: &View<Var>) -> String {
        let name = format!("{}_V{}", self.method, self.next_node);
        self.next_node += 1;
        self.graph.nodes.insert(name.clone(), view.to_gfuncs());
        name
    }

    fn edge(&mut self, src: &str, dest: &str, cmd: Command) {
        let name = format!("{}_C{}", self.method, self.next_edge);
        self.next_edge += 1;
        self.graph.edges.insert(
            name,
            Edge {
                src: src.to_string(),
                dest: dest.to_string(),
                cmd,
            },
        );
    }

    /// Lower a block, returning its entry and exit nodes
    fn block(&mut self, block: &Block) -> (String, String) {
        let entry = self.node(&block.pre);
        let mut cur = entry.clone();
        for step in &block.steps {
            let next = self.node(&step.post);
            self.part(&cur, &step.cmd, &next);
            cur = next;
        }
        (entry, cur)
    }

    fn part(&mut self, pre: &str, cmd: &PartCmd, post: &str) {
        match cmd {
            PartCmd::Prim(c) => self.edge(pre, post, c.clone()),
            PartCmd::If { cond, then, els } => {
                let (ti, to) = self.block(then);
                self.edge(pre, &ti, assume_true(cond));
                self.edge(&to, post, Vec::new());
                match els {
                    Some(els) => {
                        let (ei, eo) = self.block(els);
                        self.edge(pre, &ei, assume_false(cond));
                        self.edge(&eo, post, Vec::new());
                    }
                    None => self.edge(pre, post, assume_false(cond)),
                }
            }
            PartCmd::While { cond, body } => {
                let (bi, bo) = self.block(body);
                self.edge(pre, &bi, assume_true(cond));
                self.edge(&bo, pre, Vec::new());
                self.edge(pre, post, assume_false(cond));
            }
            PartCmd::DoWhile { body, cond } => {
                let (bi, bo) = self.block(body);
                self.edge(pre, &bi, Vec::new());
                self.edge(&bo, &bi, assume_true(cond));
                self.edge(&bo, post, assume_false(cond));
            }
        }
    }
}

fn assume_true(cond: &BoolExpr<Var>) -> Command {
    assume(mark_before(cond))
}

fn assume_false(cond: &BoolExpr<Var>) -> Command {
    assume(mark_before(&mk_not(cond.clone())))
}

/// Lower a method body into a (possibly unfolded) subgraph
pub fn lower_method(method: &Method) -> Subgraph {
    let mut lowerer = Lowerer {
        method: &method.name,
        graph: Subgraph::default(),
        next_node: 0,
        next_edge: 0,
    };
    lowerer.block(&method.body);
    tracing::debug!(
        "lowered method {}: {} nodes, {} edges",
        method.name,
        lowerer.graph.nodes.len(),
        lowerer.graph.edges.len()
    );
    lowerer.graph
}
