//! # Script modelling
//!
//! Turns a collated script (the parsed program handed over by the frontend)
//! into a [`Model`]: checked variable tables, checked view definitions and
//! one axiom per control-flow edge of every method.
//!
//! Errors are sorted by [`Error::classify`]: fatal ones (duplicate
//! variables) stop modelling outright, local ones are collected as
//! [`Diagnostic`]s against the prototype, definition or method they concern,
//! and modelling carries on with the rest.

pub mod script;

pub use script::{Block, CollatedScript, Method, PartCmd, Step};

use crate::axiom::{axiomatise, Axiom};
use crate::config::PipelineOptions;
use crate::error::{Error, ErrorSeverity, Result};
use crate::expr::{VarMap, Var};
use crate::graph::{fold_nop_edges, lower_method, try_to_graph, Graph};
use crate::view::{View, ViewDef, ViewDefinition, ViewProto};
use serde::Serialize;
use std::collections::BTreeMap;

/// An error reported against one part of the script
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Method, definition or axiom the error concerns
    pub context: String,
    /// The error
    pub error: String,
    #[serde(skip)]
    source: Error,
}

impl Diagnostic {
    /// Attach an error to a context
    pub fn new(context: impl Into<String>, error: Error) -> Self {
        Diagnostic {
            context: context.into(),
            error: error.to_string(),
            source: error,
        }
    }

    /// The underlying error
    pub fn source(&self) -> &Error {
        &self.source
    }
}

/// The modelled script
#[derive(Debug, Clone, Serialize)]
pub struct Model {
    /// Shared variables
    pub globals: VarMap,
    /// Thread-local variables
    pub locals: VarMap,
    /// Declared view prototypes by name
    pub view_protos: BTreeMap<String, ViewProto>,
    /// View definitions that passed checking
    pub view_defs: Vec<ViewDefinition>,
    /// Validated method graphs by method name
    pub graphs: BTreeMap<String, Graph>,
    /// Axioms by edge name
    pub axioms: BTreeMap<String, Axiom>,
    /// Errors collected while modelling
    pub diagnostics: Vec<Diagnostic>,
}

impl Model {
    /// All variables visible to a thread: globals and locals
    pub fn all_vars(&self) -> Result<VarMap> {
        self.globals.combine(&self.locals)
    }

    /// Patterns of the checked view definitions
    pub fn patterns(&self) -> Vec<ViewDef> {
        self.view_defs.iter().map(|d| d.view.clone()).collect()
    }
}

/// Model a collated script
pub fn model(script: &CollatedScript, options: &PipelineOptions) -> Result<Model> {
    let globals = VarMap::from_decls(&script.globals)?;
    let locals = VarMap::from_decls(&script.locals)?;
    globals.combine(&locals)?;

    let mut diagnostics = Vec::new();

    let mut view_protos = BTreeMap::new();
    for proto in &script.view_protos {
        if view_protos.contains_key(&proto.name) {
            report(
                &mut diagnostics,
                format!("view {}", proto.name),
                Error::unsupported(&proto.name, "view declared twice"),
            )?;
            continue;
        }
        view_protos.insert(proto.name.clone(), proto.clone());
    }

    let mut view_defs = Vec::new();
    for (i, def) in script.constraints.iter().enumerate() {
        match check_definition(&def.view, &view_protos) {
            Ok(()) => view_defs.push(def.clone()),
            Err(e) => {
                tracing::warn!("dropping view definition {} ({}): {}", i, def.view, e);
                report(&mut diagnostics, format!("constraint {}", def.view), e)?;
            }
        }
    }

    let mut model = Model {
        globals,
        locals,
        view_protos,
        view_defs,
        graphs: BTreeMap::new(),
        axioms: BTreeMap::new(),
        diagnostics,
    };
    let patterns = model.patterns();

    for method in &script.methods {
        match model_method(method, &model.view_protos, options) {
            Ok(graph) => {
                for axiom in axiomatise(&graph, &patterns) {
                    model.axioms.insert(axiom.name.clone(), axiom);
                }
                model.graphs.insert(method.name.clone(), graph);
            }
            Err(e) => {
                tracing::warn!("method {} not modelled: {}", method.name, e);
                report(&mut model.diagnostics, format!("method {}", method.name), e)?;
            }
        }
    }

    tracing::info!(
        "modelled {} methods into {} axioms ({} diagnostics)",
        model.graphs.len(),
        model.axioms.len(),
        model.diagnostics.len()
    );
    Ok(model)
}

/// Keep a local error as a diagnostic; a fatal one is returned
fn report(diagnostics: &mut Vec<Diagnostic>, context: String, e: Error) -> Result<()> {
    match e.classify() {
        ErrorSeverity::Fatal => Err(e),
        ErrorSeverity::Local => {
            diagnostics.push(Diagnostic::new(context, e));
            Ok(())
        }
    }
}

fn model_method(
    method: &Method,
    protos: &BTreeMap<String, ViewProto>,
    options: &PipelineOptions,
) -> Result<Graph> {
    for view in method.body.views() {
        check_view(view, protos)?;
    }
    let mut subgraph = lower_method(method);
    if options.fold_nop_edges {
        subgraph = fold_nop_edges(&subgraph);
    }
    try_to_graph(method.name.clone(), &subgraph)
}

fn lookup_proto<'a>(
    name: &str,
    arity: usize,
    protos: &'a BTreeMap<String, ViewProto>,
) -> Result<&'a ViewProto> {
    let proto = protos.get(name).ok_or_else(|| Error::UnknownView {
        view: name.to_string(),
    })?;
    if proto.params.len() != arity {
        return Err(Error::ViewArity {
            view: name.to_string(),
            expected: proto.params.len(),
            got: arity,
        });
    }
    Ok(proto)
}

/// Check a definition pattern against the declared prototypes
pub fn check_definition(def: &ViewDef, protos: &BTreeMap<String, ViewProto>) -> Result<()> {
    for comp in def.components() {
        let proto = lookup_proto(&comp.name, comp.params.len(), protos)?;
        for (formal, declared) in comp.params.iter().zip(&proto.params) {
            if formal.ty != declared.ty {
                return Err(Error::TypeMismatch {
                    name: format!("{}.{}", comp.name, formal.name),
                    expected: declared.ty.to_string(),
                    got: formal.ty.to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Check every instance in a view against the declared prototypes
pub fn check_view(view: &View<Var>, protos: &BTreeMap<String, ViewProto>) -> Result<()> {
    for func in view.funcs() {
        let proto = lookup_proto(&func.name, func.params.len(), protos)?;
        for (actual, declared) in func.params.iter().zip(&proto.params) {
            if actual.ty() != declared.ty {
                return Err(Error::TypeMismatch {
                    name: format!("{}.{}", func.name, declared.name),
                    expected: declared.ty.to_string(),
                    got: actual.ty().to_string(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{Expr, IntExpr, TypedVar};
    use crate::view::Func;

    fn protos() -> BTreeMap<String, ViewProto> {
        let mut m = BTreeMap::new();
        m.insert(
            "holdTick".to_string(),
            ViewProto {
                name: "holdTick".into(),
                params: vec![TypedVar::int("t")],
            },
        );
        m
    }

    #[test]
    fn test_check_view_arity() {
        let bad = View::Func(Func::new("holdTick", vec![]));
        assert_eq!(
            check_view(&bad, &protos()),
            Err(Error::ViewArity {
                view: "holdTick".into(),
                expected: 1,
                got: 0
            })
        );
        let good = View::Func(Func::new("holdTick", vec![Expr::Int(IntExpr::Const(3))]));
        assert!(check_view(&good, &protos()).is_ok());
        let unknown = View::Func(Func::new("nope", vec![]));
        assert!(matches!(
            check_view(&unknown, &protos()),
            Err(Error::UnknownView { .. })
        ));
    }

    #[test]
    fn test_check_definition_types() {
        let def = ViewDef::Func(Func::new("holdTick", vec![TypedVar::bool("t")]));
        assert!(matches!(
            check_definition(&def, &protos()),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_duplicate_globals_are_fatal() {
        let script = CollatedScript {
            globals: vec![TypedVar::int("x"), TypedVar::int("x")],
            ..Default::default()
        };
        assert!(model(&script, &PipelineOptions::default()).is_err());
    }

    #[test]
    fn test_bad_method_does_not_stop_others() {
        let good = Method {
            name: "good".into(),
            body: Block {
                pre: View::Unit,
                steps: vec![],
            },
        };
        let bad = Method {
            name: "bad".into(),
            body: Block {
                pre: View::Func(Func::new("missing", vec![])),
                steps: vec![],
            },
        };
        let script = CollatedScript {
            view_protos: protos().into_values().collect(),
            methods: vec![bad, good],
            ..Default::default()
        };
        let m = model(&script, &PipelineOptions::default()).unwrap();
        assert!(m.graphs.contains_key("good"));
        assert!(!m.graphs.contains_key("bad"));
        assert_eq!(m.diagnostics.len(), 1);
        assert_eq!(m.diagnostics[0].context, "method bad");
    }

    #[test]
    fn test_duplicate_proto_keeps_first() {
        let script = CollatedScript {
            view_protos: vec![
                ViewProto {
                    name: "holdTick".into(),
                    params: vec![TypedVar::int("t")],
                },
                ViewProto {
                    name: "holdTick".into(),
                    params: vec![],
                },
            ],
            ..Default::default()
        };
        let m = model(&script, &PipelineOptions::default()).unwrap();
        assert_eq!(m.view_protos["holdTick"].params, vec![TypedVar::int("t")]);
        assert_eq!(m.diagnostics.len(), 1);
        assert_eq!(m.diagnostics[0].context, "view holdTick");
    }

    #[test]
    fn test_report_sorts_by_severity() {
        let mut diagnostics = Vec::new();
        assert!(report(&mut diagnostics, "method m".into(), Error::var_not_found("x")).is_ok());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].source(), &Error::var_not_found("x"));

        let fatal = Error::runtime("pool gone");
        assert_eq!(report(&mut diagnostics, "method m".into(), fatal.clone()), Err(fatal));
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_model_patterns_follow_checked_definitions() {
        let script = CollatedScript {
            view_protos: protos().into_values().collect(),
            constraints: vec![
                ViewDefinition {
                    view: ViewDef::Func(Func::new("holdTick", vec![TypedVar::int("x")])),
                    body: None,
                },
                ViewDefinition {
                    view: ViewDef::Func(Func::new("missing", vec![])),
                    body: None,
                },
            ],
            ..Default::default()
        };
        let m = model(&script, &PipelineOptions::default()).unwrap();
        assert_eq!(
            m.patterns(),
            vec![ViewDef::Func(Func::new("holdTick", vec![TypedVar::int("x")]))]
        );
        assert_eq!(m.diagnostics.len(), 1);
    }
}
