//! Solve pipeline
//!
//! A `BilateralSolver` owns the flow network for exactly one instance and is
//! consumed by `solve`, which runs build → maximize → extract → cover →
//! verify and returns an immutable `CoverSolution`.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::collections::BTreeSet;

use log::{debug, info};
use serde::Serialize;

use crate::algorithm::graph::matching::{extract_matching, select_cover, MatchedPair};
use crate::algorithm::graph::max_flow::{FlowError, FlowNetwork, MaxFlowAlgorithm};
use crate::algorithm::traits::{AlgorithmError, AlgorithmMetrics, Side, VertexId};
use crate::config::SolverConfig;
use crate::problem::ProblemInstance;
use crate::validation::correctness::verify_cover;

/// Result of one solve
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverSolution {
    /// Minimum vertex cover
    pub cover: BTreeSet<VertexId>,
    /// Maximum matching the cover was derived from
    pub matching: Vec<MatchedPair>,
    pub max_flow: u32,
    /// Side whose unmatched vertices seeded the chosen cover
    pub origin: Side,
    pub friend: Option<VertexId>,
    pub friend_included: bool,
    pub algorithm: MaxFlowAlgorithm,
    pub metrics: AlgorithmMetrics,
}

/// Single-use solver for one problem instance
#[derive(Debug)]
pub struct BilateralSolver {
    network: FlowNetwork,
    edges: Vec<(VertexId, VertexId)>,
    config: SolverConfig,
}

impl BilateralSolver {
    pub fn new(instance: &ProblemInstance, config: SolverConfig) -> Result<Self, AlgorithmError> {
        config.validate()?;
        let network =
            FlowNetwork::build(&instance.left, &instance.right, &instance.edges, config.friend)?;
        Ok(Self {
            network,
            edges: instance.edges.clone(),
            config,
        })
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn solve(mut self) -> Result<CoverSolution, AlgorithmError> {
        let mut matcher = self.config.algorithm.create_matcher();
        for parameter in matcher.parameters() {
            if let Some(value) = self.config.get_parameter(&parameter.name) {
                matcher.set_parameter(&parameter.name, &value)?;
            }
        }
        debug!("Solving with {} ({})", matcher.name(), matcher.description());

        let reported = matcher.maximize_flow(&mut self.network)?;
        let actual = self.network.verify_flow()?;
        if reported != actual {
            return Err(FlowError::ReportedValueMismatch { reported, actual }.into());
        }

        let matching = extract_matching(&self.network)?;
        let selection = select_cover(&self.network, &matching, self.config.friend);

        if self.config.verify {
            verify_cover(&self.edges, &selection.cover, matching.len())?;
        }

        info!(
            "Minimum cover of size {} from a matching of size {}",
            selection.cover.len(),
            matching.len()
        );

        Ok(CoverSolution {
            cover: selection.cover,
            matching: matching.pairs().to_vec(),
            max_flow: actual,
            origin: selection.origin,
            friend: self.config.friend,
            friend_included: selection.friend_included,
            algorithm: self.config.algorithm,
            metrics: matcher.metrics().clone(),
        })
    }
}

/// Builds a solver for `instance` and runs it
pub fn solve(instance: &ProblemInstance, config: &SolverConfig) -> Result<CoverSolution, AlgorithmError> {
    BilateralSolver::new(instance, config.clone())?.solve()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IdRanges;
    use crate::validation::correctness::{
        brute_force_minimum_cover_size, in_some_minimum_cover, is_locally_minimal,
        is_vertex_cover,
    };
    use proptest::prelude::*;

    fn instance(raw: &[(u32, u32)]) -> ProblemInstance {
        ProblemInstance::from_edges(
            raw.iter().map(|&(a, b)| (VertexId(a), VertexId(b))),
            &IdRanges::default(),
        )
        .unwrap()
    }

    fn config(algorithm: MaxFlowAlgorithm, friend: Option<u32>) -> SolverConfig {
        SolverConfig {
            algorithm,
            friend: friend.map(VertexId),
            ..SolverConfig::default()
        }
    }

    fn set(raw: &[u32]) -> BTreeSet<VertexId> {
        raw.iter().copied().map(VertexId).collect()
    }

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn test_single_edge_scenario() {
        init_logging();
        let solution = solve(&instance(&[(1000, 2000)]), &SolverConfig::default()).unwrap();
        assert_eq!(
            solution.matching,
            vec![MatchedPair {
                left: VertexId(1000),
                right: VertexId(2000)
            }]
        );
        assert_eq!(solution.cover.len(), 1);
        assert!(solution.cover == set(&[1000]) || solution.cover == set(&[2000]));
    }

    #[test]
    fn test_empty_scenario() {
        for algorithm in MaxFlowAlgorithm::ALL {
            let solution = solve(&instance(&[]), &config(algorithm, Some(1009))).unwrap();
            assert!(solution.cover.is_empty());
            assert!(solution.matching.is_empty());
            assert_eq!(solution.max_flow, 0);
            assert!(!solution.friend_included);
        }
    }

    #[test]
    fn test_friend_star_scenario() {
        init_logging();
        let star = instance(&[(1009, 2000), (1009, 2001), (1009, 2002)]);
        for algorithm in MaxFlowAlgorithm::ALL {
            let solution = solve(&star, &config(algorithm, Some(1009))).unwrap();
            assert_eq!(solution.max_flow, 1);
            assert_eq!(solution.cover, set(&[1009]));
            assert!(solution.friend_included);
        }
    }

    #[test]
    fn test_right_side_friend() {
        // Two disjoint edges; only the right-origin cover holds 2001
        let pairs = instance(&[(1000, 2000), (1001, 2001)]);
        let solution = solve(&pairs, &config(MaxFlowAlgorithm::EdmondsKarp, Some(2001))).unwrap();
        assert_eq!(solution.origin, Side::Right);
        assert_eq!(solution.cover, set(&[2000, 2001]));
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut bad = SolverConfig::default();
        bad.ranges.left_max = 2500;
        assert!(matches!(
            BilateralSolver::new(&instance(&[]), bad),
            Err(AlgorithmError::Config(_))
        ));
    }

    #[test]
    fn test_rejects_inconsistent_instance() {
        let broken = ProblemInstance {
            left: vec![VertexId(1000)],
            right: vec![VertexId(2000)],
            edges: vec![(VertexId(1000), VertexId(2000)), (VertexId(1000), VertexId(2000))],
        };
        assert!(matches!(
            BilateralSolver::new(&broken, SolverConfig::default()),
            Err(AlgorithmError::Graph(_))
        ));
    }

    #[test]
    fn test_solution_serializes() {
        let solution = solve(&instance(&[(1000, 2000)]), &SolverConfig::default()).unwrap();
        let json = serde_json::to_value(&solution).unwrap();
        assert_eq!(json["max_flow"], 1);
        assert_eq!(json["algorithm"], "edmonds_karp");
        assert_eq!(json["origin"], "left");
        assert_eq!(json["matching"][0]["right"], 2000);
    }

    fn bipartite_with_friend() -> impl Strategy<Value = (Vec<(u32, u32)>, u32)> {
        (
            prop::collection::btree_set((1000u32..1006, 2000u32..2006), 0..20),
            prop_oneof![1000u32..1006, 2000u32..2006],
        )
            .prop_map(|(edges, friend)| (edges.into_iter().collect(), friend))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(128))]

        #[test]
        fn prop_cover_is_minimum((raw, friend) in bipartite_with_friend()) {
            let inst = instance(&raw);
            let minimum = brute_force_minimum_cover_size(&inst.edges).unwrap();
            for algorithm in MaxFlowAlgorithm::ALL {
                let solution = solve(&inst, &config(algorithm, Some(friend))).unwrap();
                prop_assert_eq!(solution.cover.len(), solution.matching.len());
                prop_assert_eq!(solution.cover.len(), minimum);
                prop_assert!(solution.matching.len() <= inst.left.len().min(inst.right.len()));
                prop_assert!(is_vertex_cover(&inst.edges, &solution.cover));
                prop_assert!(is_locally_minimal(&inst.edges, &solution.cover));
            }
        }

        #[test]
        fn prop_friend_included_when_possible((raw, friend) in bipartite_with_friend()) {
            let inst = instance(&raw);
            let expected = in_some_minimum_cover(&inst.edges, VertexId(friend)).unwrap();
            for algorithm in MaxFlowAlgorithm::ALL {
                let solution = solve(&inst, &config(algorithm, Some(friend))).unwrap();
                prop_assert_eq!(solution.friend_included, expected);
                prop_assert_eq!(solution.cover.contains(&VertexId(friend)), expected);
            }
        }

        #[test]
        fn prop_deterministic((raw, friend) in bipartite_with_friend()) {
            let inst = instance(&raw);
            let cfg = config(MaxFlowAlgorithm::EdmondsKarp, Some(friend));
            let first = solve(&inst, &cfg).unwrap();
            let second = solve(&inst, &cfg).unwrap();
            prop_assert_eq!(first.cover, second.cover);
            prop_assert_eq!(first.matching, second.matching);
        }

        #[test]
        fn prop_engines_agree_without_heuristics((raw, _friend) in bipartite_with_friend()) {
            let inst = instance(&raw);
            let mut values = Vec::new();
            for algorithm in MaxFlowAlgorithm::ALL {
                let mut cfg = config(algorithm, None);
                cfg.greedy_seed = false;
                cfg.friend_bias = false;
                values.push(solve(&inst, &cfg).unwrap().max_flow);
            }
            prop_assert_eq!(values[0], values[1]);
        }
    }
}
