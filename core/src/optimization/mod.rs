//! Batch execution across independent instances

pub mod parallel;

pub use self::parallel::{solve_batch, solve_batch_with_statistics, BatchStatistics};
