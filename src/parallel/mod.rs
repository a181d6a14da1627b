//! Parallel dispatch of independent per-term work.
//!
//! Provides a bounded parallel map whose output order matches its input.

mod executor;

pub use executor::{parallel_map, ParallelConfig};
