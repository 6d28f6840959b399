//! Core algorithm trait definitions for the Bilateral cover engine
//!
//! This module establishes the identities, the parameter protocol and the
//! error umbrella shared by every stage of the solve pipeline, together with
//! the `MaximumMatcher` capability that the interchangeable max-flow engines
//! implement.
//!
//! # Key Design Principles
//! - One capability trait, several conformant engines
//! - String-typed parameters validated at the boundary
//! - Typed errors for every broken invariant, propagated rather than retried

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::algorithm::graph::matching::MatchingError;
use crate::algorithm::graph::max_flow::{FlowError, FlowNetwork};
use crate::config::ConfigError;
use crate::data_structures::graph::GraphError;

/// Vertex identity as it appears in the problem input
#[derive(
    Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct VertexId(pub u32);

impl VertexId {
    /// Identity reserved for the synthetic source
    pub const SOURCE: VertexId = VertexId(u32::MAX - 1);

    /// Identity reserved for the synthetic sink
    pub const SINK: VertexId = VertexId(u32::MAX);

    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }

    /// Whether this identity belongs to one of the synthetic terminals
    #[inline]
    pub fn is_terminal(self) -> bool {
        self == Self::SOURCE || self == Self::SINK
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::SOURCE => write!(f, "source"),
            Self::SINK => write!(f, "sink"),
            VertexId(id) => write!(f, "{}", id),
        }
    }
}

/// One of the two sides of the bipartition
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    #[inline]
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

/// Algorithm parameter with its declared type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmParameter {
    pub name: String,
    pub value: String,
    pub value_type: ParameterType,
}

/// Parameter type enumeration for type-safe parameter handling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterType {
    Integer,
    Boolean,
    Enum(Vec<String>),
}

/// Comprehensive error types for the solve pipeline
#[derive(Debug, thiserror::Error)]
pub enum AlgorithmError {
    #[error("Invalid parameter: {name} - {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Graph invariant violated: {0}")]
    Graph(#[from] GraphError),

    #[error("Flow invariant violated: {0}")]
    Flow(#[from] FlowError),

    #[error("Matching invariant violated: {0}")]
    Matching(#[from] MatchingError),
}

impl AlgorithmError {
    pub(crate) fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        AlgorithmError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Execution metrics collected by an engine run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmMetrics {
    /// Augmentations (path engines) or discharges (push-relabel)
    pub steps_executed: usize,
    /// Vertices dequeued across all searches
    pub vertices_explored: usize,
    /// Matched pairs placed by the greedy seed
    pub seed_size: usize,
    pub pushes: usize,
    pub relabels: usize,
    pub global_relabels: usize,
    pub execution_time: Duration,
}

/// Main algorithm trait
///
/// # Invariants
/// - State isolation between runs
/// - Deterministic behavior for given inputs
pub trait Algorithm: fmt::Debug + Send + Sync {
    /// Returns the algorithm's descriptive name
    fn name(&self) -> &'static str;

    /// Returns the algorithm's category (e.g., max_flow)
    fn category(&self) -> &'static str;

    /// Returns the algorithm's description with complexity guarantees
    fn description(&self) -> String;

    /// Returns supported parameters with type information
    fn parameters(&self) -> Vec<AlgorithmParameter>;

    /// Sets algorithm parameter with type validation
    fn set_parameter(&mut self, name: &str, value: &str) -> Result<(), AlgorithmError>;

    /// Gets algorithm parameter value
    fn get_parameter(&self, name: &str) -> Option<String>;

    /// All parameters as a name/value map
    fn get_parameters(&self) -> HashMap<String, String> {
        self.parameters()
            .into_iter()
            .map(|p| (p.name, p.value))
            .collect()
    }
}

/// Maximum bipartite matcher capability
///
/// Any engine honoring this contract is interchangeable: on return the
/// network carries a maximum flow with every edge flow in {0, 1}, flow
/// conservation at every non-terminal vertex, and the returned value equals
/// both the source outflow and the sink inflow. Where several augmenting
/// choices exist at equal cost, engines walk neighbors in adjacency order so
/// the friend bias applied by the builder takes effect.
pub trait MaximumMatcher: Algorithm {
    /// Drives the network to a maximum flow and returns its value
    fn maximize_flow(&mut self, network: &mut FlowNetwork) -> Result<u32, FlowError>;

    /// Metrics of the most recent run
    fn metrics(&self) -> &AlgorithmMetrics;
}

/// Parses a boolean parameter value
pub(crate) fn parse_bool_parameter(name: &str, value: &str) -> Result<bool, AlgorithmError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(AlgorithmError::invalid_parameter(
            name,
            format!("expected a boolean, got '{}'", value),
        )),
    }
}

/// Parses a non-negative integer parameter value
pub(crate) fn parse_usize_parameter(name: &str, value: &str) -> Result<usize, AlgorithmError> {
    value.trim().parse::<usize>().map_err(|_| {
        AlgorithmError::invalid_parameter(
            name,
            format!("expected a non-negative integer, got '{}'", value),
        )
    })
}

/// Wall-clock and counter bookkeeping for a single engine run
#[derive(Debug, Default)]
pub struct AlgorithmProfiler {
    metrics: AlgorithmMetrics,
    start_time: Option<Instant>,
}

impl AlgorithmProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        self.metrics = AlgorithmMetrics::default();
        self.start_time = Some(Instant::now());
    }

    pub fn stop(&mut self) {
        if let Some(start) = self.start_time.take() {
            self.metrics.execution_time = start.elapsed();
        }
    }

    pub fn record_vertex_exploration(&mut self) {
        self.metrics.vertices_explored += 1;
    }

    pub fn record_step(&mut self) {
        self.metrics.steps_executed += 1;
    }

    pub fn record_seed(&mut self, pairs: usize) {
        self.metrics.seed_size = pairs;
    }

    pub fn record_push(&mut self) {
        self.metrics.pushes += 1;
    }

    pub fn record_relabel(&mut self) {
        self.metrics.relabels += 1;
    }

    pub fn record_global_relabel(&mut self) {
        self.metrics.global_relabels += 1;
    }

    pub fn metrics(&self) -> &AlgorithmMetrics {
        &self.metrics
    }
}
