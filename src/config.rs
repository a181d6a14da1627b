//! Pipeline configuration

use crate::error::{Error, Result};
use crate::parallel::ParallelConfig;
use crate::solver::RequestMode;
use serde::{Deserialize, Serialize};

/// Options controlling one verification run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    /// How far to take each term through the solver
    pub mode: RequestMode,
    /// Solver dispatch limits
    pub parallel: ParallelConfig,
    /// Replace equalities pinning down symbolic values with `true`
    pub drop_symbolic_equalities: bool,
    /// Collapse empty-command edges between nodes holding equal views
    pub fold_nop_edges: bool,
    /// Move `Assume` conditions into the precondition
    pub fold_assumes: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            mode: RequestMode::Sat,
            parallel: ParallelConfig::default(),
            drop_symbolic_equalities: true,
            fold_nop_edges: true,
            fold_assumes: true,
        }
    }
}

impl PipelineOptions {
    /// Parse options from JSON; absent fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let options: PipelineOptions =
            serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Reject settings no run can use
    pub fn validate(&self) -> Result<()> {
        if self.parallel.max_parallelism == 0 {
            return Err(Error::Config(
                "parallel.max_parallelism must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
