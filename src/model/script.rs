//! The collated script: a parsed program handed over by the frontend.

use crate::command::Command;
use crate::expr::{BoolExpr, TypedVar, Var};
use crate::view::{View, ViewDefinition, ViewProto};
use serde::{Deserialize, Serialize};

/// A parsed program with its declarations and view constraints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollatedScript {
    /// Declared views
    pub view_protos: Vec<ViewProto>,
    /// Shared variables
    pub globals: Vec<TypedVar>,
    /// Thread-local variables
    pub locals: Vec<TypedVar>,
    /// View definitions
    pub constraints: Vec<ViewDefinition>,
    /// Methods to verify
    pub methods: Vec<Method>,
}

impl CollatedScript {
    /// Parse a script from its JSON form
    pub fn from_json(json: &str) -> crate::Result<Self> {
        serde_json::from_str(json).map_err(|e| crate::Error::Config(e.to_string()))
    }
}

/// A named method body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Method {
    /// Method name, used to prefix node and edge names
    pub name: String,
    /// Body
    pub body: Block,
}

/// A view-annotated sequence of commands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// View held on entry
    pub pre: View<Var>,
    /// Commands, each followed by the view held after it
    pub steps: Vec<Step>,
}

/// One command and its postcondition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// The command
    pub cmd: PartCmd,
    /// View held afterwards
    pub post: View<Var>,
}

/// A command as written in a method body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartCmd {
    /// An atomic command
    Prim(Command),
    /// Conditional, with an optional else branch
    If {
        /// Branch condition
        cond: BoolExpr<Var>,
        /// Taken when `cond` holds
        then: Block,
        /// Taken otherwise
        els: Option<Block>,
    },
    /// Loop testing its condition first
    While {
        /// Loop condition
        cond: BoolExpr<Var>,
        /// Loop body
        body: Block,
    },
    /// Loop testing its condition last
    DoWhile {
        /// Loop body
        body: Block,
        /// Loop condition
        cond: BoolExpr<Var>,
    },
}

impl Block {
    /// Every view annotation in the block, nested blocks included
    pub fn views(&self) -> Vec<&View<Var>> {
        let mut out = vec![&self.pre];
        for step in &self.steps {
            match &step.cmd {
                PartCmd::Prim(_) => {}
                PartCmd::If { then, els, .. } => {
                    out.extend(then.views());
                    if let Some(els) = els {
                        out.extend(els.views());
                    }
                }
                PartCmd::While { body, .. } | PartCmd::DoWhile { body, .. } => {
                    out.extend(body.views())
                }
            }
            out.push(&step.post);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::Func;

    #[test]
    fn test_block_views_include_nested() {
        let inner = Block {
            pre: View::Func(Func::new("A", vec![])),
            steps: vec![],
        };
        let b = Block {
            pre: View::Unit,
            steps: vec![Step {
                cmd: PartCmd::While {
                    cond: BoolExpr::True,
                    body: inner,
                },
                post: View::Unit,
            }],
        };
        assert_eq!(b.views().len(), 3);
    }

    #[test]
    fn test_script_from_json_defaults() {
        let script = CollatedScript::from_json(r#"{"globals": [{"ty": "Int", "name": "x"}]}"#).unwrap();
        assert_eq!(script.globals, vec![TypedVar::int("x")]);
        assert!(script.methods.is_empty());
        assert!(CollatedScript::from_json("{").is_err());
    }
}
