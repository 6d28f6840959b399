//! Parallel batch solving
//!
//! Independent instances are solved on rayon's work-stealing pool. Each
//! instance gets its own solver, network and registry, so nothing mutable is
//! shared between workers. Results come back in input order.

use std::time::{Duration, Instant};

use log::{debug, warn};
use rayon::prelude::*;
use serde::Serialize;

use crate::algorithm::traits::AlgorithmError;
use crate::config::SolverConfig;
use crate::problem::ProblemInstance;
use crate::solver::{solve, CoverSolution};

/// Aggregate figures for one batch
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchStatistics {
    pub instances: usize,
    pub solved: usize,
    pub failed: usize,
    pub total_cover_size: usize,
    pub wall_time: Duration,
}

/// Solves every instance in parallel, preserving input order
pub fn solve_batch(
    instances: &[ProblemInstance],
    config: &SolverConfig,
) -> Vec<Result<CoverSolution, AlgorithmError>> {
    solve_batch_with_statistics(instances, config).0
}

/// Like `solve_batch`, also reporting aggregate statistics
pub fn solve_batch_with_statistics(
    instances: &[ProblemInstance],
    config: &SolverConfig,
) -> (Vec<Result<CoverSolution, AlgorithmError>>, BatchStatistics) {
    let start = Instant::now();
    let results: Vec<_> = instances
        .par_iter()
        .map(|instance| solve(instance, config))
        .collect();

    let mut stats = BatchStatistics {
        instances: instances.len(),
        wall_time: start.elapsed(),
        ..BatchStatistics::default()
    };
    for (position, result) in results.iter().enumerate() {
        match result {
            Ok(solution) => {
                stats.solved += 1;
                stats.total_cover_size += solution.cover.len();
            }
            Err(err) => {
                stats.failed += 1;
                warn!("Instance {} failed: {}", position, err);
            }
        }
    }

    debug!(
        "Batch of {} solved in {:?} ({} failed)",
        stats.instances, stats.wall_time, stats.failed
    );
    (results, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::traits::VertexId;
    use crate::config::IdRanges;

    fn star(size: u32) -> ProblemInstance {
        ProblemInstance::from_edges(
            (0..size).map(|i| (VertexId(1009), VertexId(2000 + i))),
            &IdRanges::default(),
        )
        .unwrap()
    }

    fn matching(size: u32) -> ProblemInstance {
        ProblemInstance::from_edges(
            (0..size).map(|i| (VertexId(1000 + i), VertexId(2000 + i))),
            &IdRanges::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_batch_preserves_order() {
        let instances: Vec<_> = (0..16)
            .map(|i| if i % 2 == 0 { star(i + 1) } else { matching(i) })
            .collect();
        let results = solve_batch(&instances, &SolverConfig::default());

        assert_eq!(results.len(), instances.len());
        for (i, result) in results.iter().enumerate() {
            let solution = result.as_ref().unwrap();
            let expected = if i % 2 == 0 { 1 } else { i };
            assert_eq!(solution.cover.len(), expected);
        }
    }

    #[test]
    fn test_batch_reports_failures() {
        let mut broken = matching(2);
        broken.edges.push(broken.edges[0]);
        let instances = vec![matching(3), broken, star(4)];

        let (results, stats) = solve_batch_with_statistics(&instances, &SolverConfig::default());
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert!(results[2].is_ok());
        assert_eq!(stats.solved, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.total_cover_size, 4);
    }

    #[test]
    fn test_empty_batch() {
        let (results, stats) = solve_batch_with_statistics(&[], &SolverConfig::default());
        assert!(results.is_empty());
        assert_eq!(stats.instances, 0);
    }
}
