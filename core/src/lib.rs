//! Bilateral: friend-aware minimum vertex cover for bipartite graphs
//!
//! A bipartite instance is turned into a unit-capacity flow network, driven
//! to a maximum flow by an interchangeable engine, and read back as a
//! maximum matching. König's theorem converts that matching into a minimum
//! vertex cover; the construction runs from both sides and keeps the cover
//! that contains the designated friend whenever one exists.
//!
//! ```
//! use bilateral_core::{solve, IdRanges, ProblemInstance, SolverConfig};
//!
//! let instance = ProblemInstance::parse("3\n1009 2000\n1009 2001\n1009 2002\n", &IdRanges::default())?;
//! let solution = solve(&instance, &SolverConfig::default())?;
//! assert_eq!(solution.cover.len(), 1);
//! assert!(solution.friend_included);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

pub mod algorithm;
pub mod config;
pub mod data_structures;
pub mod optimization;
pub mod problem;
pub mod solver;
pub mod validation;

pub use crate::algorithm::traits::{
    Algorithm, AlgorithmError, AlgorithmMetrics, MaximumMatcher, Side, VertexId,
};
pub use crate::algorithm::graph::{FlowError, MatchedPair, MatchingError, MaxFlowAlgorithm};
pub use crate::config::{ConfigError, IdRanges, SolverConfig};
pub use crate::optimization::parallel::solve_batch;
pub use crate::problem::{write_cover, ParseError, ProblemInstance};
pub use crate::solver::{solve, BilateralSolver, CoverSolution};
