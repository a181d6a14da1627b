//! # View Algebra
//!
//! Views are separation-logic style ownership assertions. A thread holding
//! `holdTick(t) * holdLock()` owns both resources at once; the `*` is
//! [`View::Join`]. Conditional views select between two views on a Boolean
//! condition.
//!
//! At a program point the held view is flattened into a multiset of
//! [`GFunc`]s: each named view instance paired with the guard under which it
//! is held. View *definitions* ([`ViewDef`]) only describe shapes and are
//! matched against those instances by the reifier.

pub mod multiset;

pub use multiset::Multiset;

use crate::expr::{mk_and, mk_not, BoolExpr, Expr, TypedVar, Var};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A named application
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Func<P> {
    /// Name of the view or relation
    pub name: String,
    /// Parameters, in order
    pub params: Vec<P>,
}

impl<P> Func<P> {
    /// Build an application
    pub fn new(name: impl Into<String>, params: Vec<P>) -> Self {
        Func {
            name: name.into(),
            params,
        }
    }

    /// True if `other` has the same name and parameter count
    pub fn same_shape<Q>(&self, other: &Func<Q>) -> bool {
        self.name == other.name && self.params.len() == other.params.len()
    }
}

impl<P: fmt::Display> fmt::Display for Func<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", p)?;
        }
        write!(f, ")")
    }
}

/// A view instance with expression parameters
pub type VFunc<V> = Func<Expr<V>>;

/// A view-definition component with bare typed parameter names
pub type DFunc = Func<TypedVar>;

/// A resource-ownership assertion
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum View<V> {
    /// The empty view
    Unit,
    /// A named parameterised view
    Func(VFunc<V>),
    /// Separating conjunction
    Join(Box<View<V>>, Box<View<V>>),
    /// `if cond then a else b`
    If(BoolExpr<V>, Box<View<V>>, Box<View<V>>),
}

impl<V: Clone + Ord> View<V> {
    /// Join a list of views, `Unit` when empty
    pub fn join_all(views: impl IntoIterator<Item = View<V>>) -> View<V> {
        views
            .into_iter()
            .reduce(|a, b| View::Join(Box::new(a), Box::new(b)))
            .unwrap_or(View::Unit)
    }

    /// Flatten into guarded instances.
    ///
    /// Conditional views push their condition (or its negation) into the
    /// guard of every instance beneath them.
    pub fn to_gfuncs(&self) -> Multiset<GFunc<V>> {
        let mut out = Multiset::new();
        self.collect_gfuncs(&BoolExpr::True, &mut out);
        out
    }

    fn collect_gfuncs(&self, guard: &BoolExpr<V>, out: &mut Multiset<GFunc<V>>) {
        match self {
            View::Unit => {}
            View::Func(func) => out.insert(GFunc {
                guard: guard.clone(),
                item: func.clone(),
            }),
            View::Join(a, b) => {
                a.collect_gfuncs(guard, out);
                b.collect_gfuncs(guard, out);
            }
            View::If(cond, a, b) => {
                let pos = mk_and(vec![guard.clone(), cond.clone()]);
                let neg = mk_and(vec![guard.clone(), mk_not(cond.clone())]);
                a.collect_gfuncs(&pos, out);
                b.collect_gfuncs(&neg, out);
            }
        }
    }

    /// Every named instance in the view, ignoring conditions
    pub fn funcs(&self) -> Vec<&VFunc<V>> {
        let mut out = Vec::new();
        self.collect_funcs(&mut out);
        out
    }

    fn collect_funcs<'a>(&'a self, out: &mut Vec<&'a VFunc<V>>) {
        match self {
            View::Unit => {}
            View::Func(func) => out.push(func),
            View::Join(a, b) | View::If(_, a, b) => {
                a.collect_funcs(out);
                b.collect_funcs(out);
            }
        }
    }
}

/// The declared shape of a view, used only for matching
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ViewDef {
    /// The empty pattern
    Unit,
    /// A named pattern
    Func(DFunc),
    /// Join of two patterns
    Join(Box<ViewDef>, Box<ViewDef>),
}

impl ViewDef {
    /// Join a list of patterns, `Unit` when empty
    pub fn join_all(defs: impl IntoIterator<Item = ViewDef>) -> ViewDef {
        defs.into_iter()
            .reduce(|a, b| ViewDef::Join(Box::new(a), Box::new(b)))
            .unwrap_or(ViewDef::Unit)
    }

    /// Ordered named components of the pattern
    pub fn components(&self) -> Vec<&DFunc> {
        let mut out = Vec::new();
        self.collect(&mut out);
        out
    }

    fn collect<'a>(&'a self, out: &mut Vec<&'a DFunc>) {
        match self {
            ViewDef::Unit => {}
            ViewDef::Func(func) => out.push(func),
            ViewDef::Join(a, b) => {
                a.collect(out);
                b.collect(out);
            }
        }
    }
}

impl fmt::Display for ViewDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let comps = self.components();
        if comps.is_empty() {
            return write!(f, "emp");
        }
        for (i, c) in comps.iter().enumerate() {
            if i > 0 {
                write!(f, " * ")?;
            }
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

/// A guarded view instance: `item` is held provided `guard` holds
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GFunc<V> {
    /// Condition under which the instance is held
    pub guard: BoolExpr<V>,
    /// The held instance
    pub item: VFunc<V>,
}

impl<V: fmt::Display> fmt::Display for GFunc<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.guard.is_true() {
            write!(f, "{}", self.item)
        } else {
            write!(f, "({} -> {})", self.guard, self.item)
        }
    }
}

/// Declared name and typed parameters of a view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewProto {
    /// View name
    pub name: String,
    /// Typed parameters
    pub params: Vec<TypedVar>,
}

/// A view-definition constraint: a pattern and, if definite, its meaning
///
/// The body ranges over the pattern's parameter names and global variables.
/// `None` marks an indefinite definition, which is matched but contributes
/// no constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewDefinition {
    /// Pattern to match
    pub view: ViewDef,
    /// Meaning of the pattern
    pub body: Option<BoolExpr<Var>>,
}

/// One successful reification: the combined guard and consumed instances
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReView<V> {
    /// Conjunction of the consumed instances' guards
    pub guard: BoolExpr<V>,
    /// Consumed instances, in pattern order
    pub item: Vec<VFunc<V>>,
}

/// Every way a held multiset satisfies the declared definitions
pub type ViewSet<V> = Multiset<ReView<V>>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{bvar, ivar, IntExpr};

    fn holds(name: &str, params: Vec<Expr<Var>>) -> View<Var> {
        View::Func(Func::new(name, params))
    }

    #[test]
    fn test_join_flattens_to_multiset() {
        let v = View::join_all(vec![
            holds("holdTick", vec![Expr::Int(ivar("t"))]),
            holds("holdLock", vec![]),
            holds("holdLock", vec![]),
        ]);
        let gs = v.to_gfuncs();
        assert_eq!(gs.len(), 3);
        let lock = GFunc {
            guard: BoolExpr::True,
            item: Func::new("holdLock", vec![]),
        };
        assert_eq!(gs.count(&lock), 2);
    }

    #[test]
    fn test_conditional_view_guards() {
        let v = View::If(
            bvar("c"),
            Box::new(holds("A", vec![])),
            Box::new(holds("B", vec![Expr::Int(IntExpr::Const(1))])),
        );
        let flat = v.to_gfuncs().to_flat_vec();
        assert_eq!(flat.len(), 2);
        let a = flat.iter().find(|g| g.item.name == "A").unwrap();
        let b = flat.iter().find(|g| g.item.name == "B").unwrap();
        assert_eq!(a.guard, bvar("c"));
        assert_eq!(b.guard, mk_not(bvar("c")));
    }

    #[test]
    fn test_unit_is_empty() {
        assert!(View::<Var>::Unit.to_gfuncs().is_empty());
        assert!(ViewDef::Unit.components().is_empty());
    }

    #[test]
    fn test_viewdef_components_in_order() {
        let def = ViewDef::join_all(vec![
            ViewDef::Func(Func::new("holdTick", vec![TypedVar::int("t")])),
            ViewDef::Func(Func::new("holdLock", vec![])),
        ]);
        let names: Vec<_> = def.components().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["holdTick", "holdLock"]);
        assert_eq!(def.to_string(), "holdTick(int t) * holdLock()");
    }
}
