//! # Program Graph
//!
//! A method's control flow as named nodes, each holding the multiset of
//! guarded view instances owned at that point, joined by command-labelled
//! edges. Edges refer to their endpoints by name only, since one node may
//! end many edges.
//!
//! Construction goes through two stages:
//!
//! ```text
//! Method body → Subgraph (may dangle) → unify / fold → to_graph → Graph (validated)
//! ```
//!
//! [`Graph`] values can only be made by [`to_graph`], so holding one means
//! every edge endpoint exists.

pub mod builder;

pub use builder::lower_method;

use crate::command::Command;
use crate::error::{Error, Result};
use crate::expr::Var;
use crate::view::{GFunc, Multiset};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// View multiset held at a node
pub type NodeView = Multiset<GFunc<Var>>;

/// A command-labelled transition between two named nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// Source node name
    pub src: String,
    /// Destination node name
    pub dest: String,
    /// Command performed along the edge
    pub cmd: Command,
}

/// A provisional graph; edges may name nodes that are absent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subgraph {
    /// Nodes by name
    pub nodes: BTreeMap<String, NodeView>,
    /// Edges by name
    pub edges: BTreeMap<String, Edge>,
}

impl Subgraph {
    /// First edge endpoint missing from the node map, as `(edge, node)`
    pub fn dangling(&self) -> Option<(&str, &str)> {
        self.edges.iter().find_map(|(name, edge)| {
            [&edge.src, &edge.dest]
                .into_iter()
                .find(|n| !self.nodes.contains_key(n.as_str()))
                .map(|n| (name.as_str(), n.as_str()))
        })
    }
}

/// Merge node `t` into node `s`.
///
/// Returns the input unchanged if either name is absent or `s == t`.
/// Otherwise `t` disappears, every edge endpoint naming `t` is retargeted to
/// `s`, and the surviving node `s` carries `t`'s view multiset.
pub fn unify(graph: &Subgraph, s: &str, t: &str) -> Subgraph {
    if s == t || !graph.nodes.contains_key(s) {
        return graph.clone();
    }
    let Some(t_view) = graph.nodes.get(t) else {
        return graph.clone();
    };

    let mut nodes = graph.nodes.clone();
    nodes.remove(t);
    nodes.insert(s.to_string(), t_view.clone());

    let retarget = |n: &String| {
        if n == t {
            s.to_string()
        } else {
            n.clone()
        }
    };
    let edges = graph
        .edges
        .iter()
        .map(|(name, e)| {
            (
                name.clone(),
                Edge {
                    src: retarget(&e.src),
                    dest: retarget(&e.dest),
                    cmd: e.cmd.clone(),
                },
            )
        })
        .collect();

    tracing::trace!("unified node {} into {}", t, s);
    Subgraph { nodes, edges }
}

/// Fold empty-command edges between nodes holding equal views.
///
/// Each such edge's destination is unified into its source and the edge,
/// now a self-loop that does nothing, is dropped.
pub fn fold_nop_edges(graph: &Subgraph) -> Subgraph {
    let mut g = graph.clone();
    loop {
        let candidate = g.edges.iter().find_map(|(name, e)| {
            let same_view = match (g.nodes.get(&e.src), g.nodes.get(&e.dest)) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            };
            (e.cmd.is_empty() && same_view).then(|| (name.clone(), e.src.clone(), e.dest.clone()))
        });

        let Some((name, src, dest)) = candidate else {
            return g;
        };
        g = unify(&g, &src, &dest);
        g.edges.remove(&name);
        tracing::debug!("folded nop edge {} ({} <- {})", name, src, dest);
    }
}

/// A named, validated graph: every edge endpoint is a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Graph {
    name: String,
    contents: Subgraph,
}

impl Graph {
    /// Graph name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Nodes by name
    pub fn nodes(&self) -> &BTreeMap<String, NodeView> {
        &self.contents.nodes
    }

    /// Edges by name
    pub fn edges(&self) -> &BTreeMap<String, Edge> {
        &self.contents.edges
    }

    /// The underlying node and edge maps
    pub fn contents(&self) -> &Subgraph {
        &self.contents
    }

    /// Unify `t` into `s`; retargeting only to an existing node keeps the
    /// graph valid.
    pub fn unify(&self, s: &str, t: &str) -> Graph {
        Graph {
            name: self.name.clone(),
            contents: unify(&self.contents, s, t),
        }
    }

    /// View held at `node` together with the node's existence
    pub fn node(&self, node: &str) -> Option<&NodeView> {
        self.contents.nodes.get(node)
    }
}

/// Validate a subgraph, tagging it with `name`.
///
/// `None` if any edge names a node absent from the node map.
pub fn to_graph(name: impl Into<String>, subgraph: &Subgraph) -> Option<Graph> {
    if subgraph.dangling().is_some() {
        return None;
    }
    Some(Graph {
        name: name.into(),
        contents: subgraph.clone(),
    })
}

/// [`to_graph`] reporting the dangling reference as [`Error::NoSuchNode`]
pub fn try_to_graph(name: impl Into<String>, subgraph: &Subgraph) -> Result<Graph> {
    let name = name.into();
    if let Some((edge, node)) = subgraph.dangling() {
        return Err(Error::NoSuchNode {
            graph: name,
            edge: edge.to_string(),
            node: node.to_string(),
        });
    }
    Ok(Graph {
        name,
        contents: subgraph.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::BoolExpr;
    use crate::view::Func;

    fn hold(name: &str) -> NodeView {
        Multiset::singleton(GFunc {
            guard: BoolExpr::True,
            item: Func::new(name, vec![]),
        })
    }

    fn two_node_graph() -> Subgraph {
        let mut g = Subgraph::default();
        g.nodes.insert("a".into(), hold("A"));
        g.nodes.insert("b".into(), Multiset::new());
        g.edges.insert(
            "e".into(),
            Edge {
                src: "a".into(),
                dest: "b".into(),
                cmd: vec![Func::new("Tick", vec![])],
            },
        );
        g
    }

    #[test]
    fn test_unify_missing_is_noop() {
        let g = two_node_graph();
        assert_eq!(unify(&g, "a", "zzz"), g);
        assert_eq!(unify(&g, "zzz", "a"), g);
        assert_eq!(unify(&g, "a", "a"), g);
    }

    #[test]
    fn test_unify_takes_target_view() {
        let g = two_node_graph();
        let u = unify(&g, "b", "a");
        assert_eq!(u.nodes.len(), 1);
        assert_eq!(u.nodes["b"], hold("A"));
        assert_eq!(u.edges["e"].src, "b");
        assert_eq!(u.edges["e"].dest, "b");
    }

    #[test]
    fn test_to_graph_rejects_dangling() {
        let mut g = two_node_graph();
        assert!(to_graph("m", &g).is_some());
        g.nodes.remove("b");
        assert!(to_graph("m", &g).is_none());
        assert_eq!(
            try_to_graph("m", &g),
            Err(Error::NoSuchNode {
                graph: "m".into(),
                edge: "e".into(),
                node: "b".into()
            })
        );
    }

    #[test]
    fn test_fold_nop_edges() {
        let mut g = Subgraph::default();
        g.nodes.insert("x".into(), hold("A"));
        g.nodes.insert("y".into(), hold("A"));
        g.nodes.insert("z".into(), Multiset::new());
        g.edges.insert(
            "nop".into(),
            Edge {
                src: "x".into(),
                dest: "y".into(),
                cmd: vec![],
            },
        );
        g.edges.insert(
            "keep".into(),
            Edge {
                src: "y".into(),
                dest: "z".into(),
                cmd: vec![],
            },
        );
        let folded = fold_nop_edges(&g);
        assert_eq!(folded.nodes.len(), 2);
        assert!(!folded.edges.contains_key("nop"));
        assert_eq!(folded.edges["keep"].src, "x");
        assert!(to_graph("m", &folded).is_some());
    }
}
