//! Parallel executor for solver requests
//!
//! Uses Rayon for work-stealing parallelism with configurable limits.

use crate::error::{Error, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Configuration for parallel execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelConfig {
    /// Maximum number of parallel tasks (default: num_cpus)
    pub max_parallelism: usize,
    /// Fail fast on first error vs collect all results
    pub fail_fast: bool,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            max_parallelism: num_cpus::get(),
            fail_fast: false,
        }
    }
}

/// Parallel map over a slice of independent items
///
/// # Arguments
/// * `items` - Items to process
/// * `mapper` - Function to apply to each item (must be thread-safe)
/// * `config` - Parallel execution configuration
///
/// # Returns
/// * `Ok(Vec<Result<R>>)` - One result per item, in input order
/// * `Err(Error)` - First error encountered (if fail_fast=true), or a
///   thread pool that could not be built
///
/// # Example
/// ```ignore
/// let verdicts = parallel_map(&terms, |t| solver.check(t), &ParallelConfig::default())?;
/// ```
pub fn parallel_map<T, R, F>(items: &[T], mapper: F, config: &ParallelConfig) -> Result<Vec<Result<R>>>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> Result<R> + Send + Sync,
{
    if items.is_empty() {
        return Ok(Vec::new());
    }

    // Single item or no parallelism requested - stay on this thread
    if items.len() == 1 || config.max_parallelism <= 1 {
        return collect(items.iter().map(&mapper), config.fail_fast);
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.max_parallelism.min(items.len()))
        .build()
        .map_err(|e| Error::runtime(format!("Failed to create thread pool: {}", e)))?;

    tracing::debug!(
        "dispatching {} items on {} threads",
        items.len(),
        pool.current_num_threads()
    );

    pool.install(|| {
        let results: Vec<Result<R>> = items.par_iter().map(&mapper).collect();
        collect(results.into_iter(), config.fail_fast)
    })
}

fn collect<R>(results: impl Iterator<Item = Result<R>>, fail_fast: bool) -> Result<Vec<Result<R>>> {
    let mut out = Vec::new();
    for r in results {
        match r {
            Err(e) if fail_fast => return Err(e),
            r => out.push(r),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn halve(n: &i64) -> Result<i64> {
        if n % 2 == 0 {
            Ok(n / 2)
        } else {
            Err(Error::runtime(format!("{} is odd", n)))
        }
    }

    #[test]
    fn test_parallel_map_basic() {
        let items: Vec<i64> = (0..64).map(|n| n * 2).collect();
        let results = parallel_map(&items, halve, &ParallelConfig::default()).unwrap();
        assert_eq!(results.len(), 64);
        for (i, r) in results.into_iter().enumerate() {
            assert_eq!(r, Ok(i as i64));
        }
    }

    #[test]
    fn test_parallel_map_empty() {
        let items: Vec<i64> = vec![];
        let results = parallel_map(&items, halve, &ParallelConfig::default()).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_parallel_map_error_fail_fast() {
        let config = ParallelConfig {
            fail_fast: true,
            ..Default::default()
        };
        assert!(parallel_map(&[2, 3, 4], halve, &config).is_err());
    }

    #[test]
    fn test_parallel_map_error_collect_all() {
        let config = ParallelConfig {
            max_parallelism: 4,
            fail_fast: false,
        };
        let results = parallel_map(&[2, 3, 4], halve, &config).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0], Ok(1));
        assert!(results[1].is_err());
        assert_eq!(results[2], Ok(2));
    }

    #[test]
    fn test_sequential_fallback() {
        let config = ParallelConfig {
            max_parallelism: 1,
            fail_fast: false,
        };
        let results = parallel_map(&[4, 8], halve, &config).unwrap();
        assert_eq!(results, vec![Ok(2), Ok(4)]);
    }
}
