//! # Variables, marks and declaration tables

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A plain variable identifier
pub type Var = String;

/// Sort of a variable or expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Type {
    /// Integer sort
    Int,
    /// Boolean sort
    Bool,
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Bool => write!(f, "bool"),
        }
    }
}

/// A variable name paired with its declared sort
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TypedVar {
    /// Declared sort
    pub ty: Type,
    /// Variable name
    pub name: Var,
}

impl TypedVar {
    /// Integer-sorted variable
    pub fn int(name: impl Into<Var>) -> Self {
        TypedVar {
            ty: Type::Int,
            name: name.into(),
        }
    }

    /// Boolean-sorted variable
    pub fn bool(name: impl Into<Var>) -> Self {
        TypedVar {
            ty: Type::Bool,
            name: name.into(),
        }
    }
}

impl fmt::Display for TypedVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.ty, self.name)
    }
}

/// A variable tagged with the program state it refers to.
///
/// The same underlying variable is distinguishable across states without
/// being renamed. Within one composed relation, `Intermediate` stages are
/// never reused.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MarkedVar {
    /// Value in the pre-state
    Before(Var),
    /// Value in the post-state
    After(Var),
    /// Value at numbered intermediate stage `n`
    Intermediate(u64, Var),
    /// Value in a goal view
    Goal(Var),
}

impl MarkedVar {
    /// The underlying variable name
    pub fn name(&self) -> &str {
        match self {
            MarkedVar::Before(v)
            | MarkedVar::After(v)
            | MarkedVar::Intermediate(_, v)
            | MarkedVar::Goal(v) => v,
        }
    }

    /// True for pre-state variables
    pub fn is_before(&self) -> bool {
        matches!(self, MarkedVar::Before(_))
    }
}

impl fmt::Display for MarkedVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkedVar::Before(v) => write!(f, "{}!before", v),
            MarkedVar::After(v) => write!(f, "{}!after", v),
            MarkedVar::Intermediate(n, v) => write!(f, "{}!{}", v, n),
            MarkedVar::Goal(v) => write!(f, "{}!goal", v),
        }
    }
}

/// Declared variables of one scope, keyed by name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarMap(BTreeMap<Var, Type>);

impl VarMap {
    /// Build a map from declarations, rejecting duplicates
    pub fn from_decls<'a>(decls: impl IntoIterator<Item = &'a TypedVar>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for decl in decls {
            if map.insert(decl.name.clone(), decl.ty).is_some() {
                return Err(Error::VarDuplicate {
                    name: decl.name.clone(),
                });
            }
        }
        Ok(VarMap(map))
    }

    /// Look up a variable's sort
    pub fn lookup(&self, name: &str) -> Result<Type> {
        self.0
            .get(name)
            .copied()
            .ok_or_else(|| Error::var_not_found(name))
    }

    /// Look up a variable and check it has the expected sort
    pub fn lookup_typed(&self, name: &str, expected: Type) -> Result<()> {
        let ty = self.lookup(name)?;
        if ty != expected {
            return Err(Error::TypeMismatch {
                name: name.to_string(),
                expected: expected.to_string(),
                got: ty.to_string(),
            });
        }
        Ok(())
    }

    /// True if the name is declared
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Iterate declarations in name order
    pub fn iter(&self) -> impl Iterator<Item = TypedVar> + '_ {
        self.0.iter().map(|(name, ty)| TypedVar {
            ty: *ty,
            name: name.clone(),
        })
    }

    /// Number of declared variables
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if nothing is declared
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Union of two scopes, rejecting names declared in both
    pub fn combine(&self, other: &VarMap) -> Result<VarMap> {
        let mut map = self.0.clone();
        for (name, ty) in &other.0 {
            if map.insert(name.clone(), *ty).is_some() {
                return Err(Error::VarDuplicate { name: name.clone() });
            }
        }
        Ok(VarMap(map))
    }
}
