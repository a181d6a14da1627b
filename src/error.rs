//! Error types for the viewcheck pipeline

use thiserror::Error;

/// Verification pipeline errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // Variable errors
    /// Reference to a variable that was never declared
    ///
    /// **Triggered by:** A view definition, guard or command naming an undeclared variable
    /// **Example:** a definition body `serving = ticket` when only `serving` is a global
    #[error("Variable not found: {name}")]
    VarNotFound {
        /// Variable name
        name: String,
    },

    /// The same variable declared twice in one scope
    #[error("Variable declared twice: {name}")]
    VarDuplicate {
        /// Variable name
        name: String,
    },

    /// A variable or parameter used at a sort different from its declaration
    ///
    /// **Triggered by:** Passing a Boolean expression where an integer parameter is declared
    #[error("Type mismatch for {name}: expected {expected}, got {got}")]
    TypeMismatch {
        /// Variable or parameter name
        name: String,
        /// Declared sort
        expected: String,
        /// Sort actually used
        got: String,
    },

    // View errors
    /// View instance parameter count disagrees with its declared prototype
    ///
    /// **Triggered by:** `holdTick(t, u)` when the prototype is `view holdTick(int t)`
    #[error("View {view} expects {expected} parameters, got {got}")]
    ViewArity {
        /// View name
        view: String,
        /// Declared parameter count
        expected: usize,
        /// Parameter count used
        got: usize,
    },

    /// Use of a view that has no prototype
    #[error("Unknown view: {view}")]
    UnknownView {
        /// View name
        view: String,
    },

    // Semantic errors
    /// An atomic action or command shape the semantic layer cannot translate
    #[error("Unsupported construct {construct}: {reason}")]
    Unsupported {
        /// The offending construct
        construct: String,
        /// Human-readable reason
        reason: String,
    },

    // Graph errors
    /// An edge references a node absent from its graph
    #[error("No such node {node} (referenced by edge {edge} in graph {graph})")]
    NoSuchNode {
        /// Graph name
        graph: String,
        /// Edge carrying the dangling reference
        edge: String,
        /// Missing node name
        node: String,
    },

    // External errors
    /// Error surfaced unchanged from the solver collaborator
    #[error("Translator error: {0}")]
    Translator(String),

    /// Invalid pipeline configuration
    #[error("Config error: {0}")]
    Config(String),

    /// General runtime error
    #[error("Runtime error: {0}")]
    Runtime(String),
}

/// Error severity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// The whole run cannot continue
    Fatal,
    /// Only the affected method or axiom is lost
    Local,
}

impl Error {
    /// Create a runtime error with a message
    pub fn runtime(msg: impl Into<String>) -> Self {
        Error::Runtime(msg.into())
    }

    /// Create an unsupported-construct error
    pub fn unsupported(construct: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Unsupported {
            construct: construct.into(),
            reason: reason.into(),
        }
    }

    /// Create a variable lookup error
    pub fn var_not_found(name: impl Into<String>) -> Self {
        Error::VarNotFound { name: name.into() }
    }

    /// Classify error severity
    ///
    /// Declaration problems poison every method that could see them; everything
    /// else is reported against a single method or axiom.
    pub fn classify(&self) -> ErrorSeverity {
        match self {
            Error::VarDuplicate { .. } => ErrorSeverity::Fatal,
            Error::Config(_) => ErrorSeverity::Fatal,
            Error::Runtime(_) => ErrorSeverity::Fatal,
            _ => ErrorSeverity::Local,
        }
    }
}

/// Result type for viewcheck operations
pub type Result<T> = std::result::Result<T, Error>;
