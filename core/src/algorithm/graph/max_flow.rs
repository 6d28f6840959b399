//! Unit-capacity flow network and augmenting-path maximum flow
//!
//! This module builds the matching network for a bipartite instance: one
//! synthetic source feeding every left vertex, one synthetic sink fed by
//! every right vertex, and a forward edge for every input pair, all with
//! unit capacity. On top of it sit the greedy seed and the Edmonds-Karp
//! engine, which augments along shortest residual paths until the sink is
//! unreachable. Since every capacity is one, augmenting a path means
//! flipping the flow on each of its edges.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::collections::{HashMap, VecDeque};

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::algorithm::graph::push_relabel::PushRelabelMatcher;
use crate::algorithm::state::SearchState;
use crate::algorithm::traits::{
    parse_bool_parameter, Algorithm, AlgorithmError, AlgorithmMetrics, AlgorithmParameter,
    AlgorithmProfiler, MaximumMatcher, ParameterType, Side, VertexId,
};
use crate::data_structures::graph::{
    EdgeMap, GraphError, VertexIndex, VertexRegistry, UNIT_CAPACITY,
};

/// Maximum flow engine variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MaxFlowAlgorithm {
    /// Breadth-first shortest augmenting paths
    #[default]
    EdmondsKarp,
    /// FIFO push-relabel with periodic global relabeling
    PushRelabel,
}

impl MaxFlowAlgorithm {
    pub const ALL: [MaxFlowAlgorithm; 2] = [MaxFlowAlgorithm::EdmondsKarp, MaxFlowAlgorithm::PushRelabel];

    /// Configuration name of the variant
    pub fn as_str(self) -> &'static str {
        match self {
            MaxFlowAlgorithm::EdmondsKarp => "edmonds_karp",
            MaxFlowAlgorithm::PushRelabel => "push_relabel",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL.into_iter().find(|a| a.as_str() == name)
    }

    /// Creates a fresh engine for this variant
    pub fn create_matcher(self) -> Box<dyn MaximumMatcher> {
        match self {
            MaxFlowAlgorithm::EdmondsKarp => Box::new(EdmondsKarpMatcher::new()),
            MaxFlowAlgorithm::PushRelabel => Box::new(PushRelabelMatcher::new()),
        }
    }
}

impl std::fmt::Display for MaxFlowAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flow algorithm errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("Augmentation pushed flow past the bound of {bound}")]
    AugmentationBoundExceeded { bound: u32 },

    #[error("Flow conservation violated at {vertex}: inflow {inflow}, outflow {outflow}")]
    ConservationViolated {
        vertex: VertexId,
        inflow: u32,
        outflow: u32,
    },

    #[error("Source outflow {source_outflow} differs from sink inflow {sink_inflow}")]
    FlowValueMismatch {
        source_outflow: u32,
        sink_inflow: u32,
    },

    #[error("Engine reported flow {reported} but the network carries {actual}")]
    ReportedValueMismatch { reported: u32, actual: u32 },

    #[error("Vertex {vertex} holds excess but has no residual neighbor")]
    NoResidualNeighbor { vertex: VertexId },
}

/// Unit-capacity matching network over a vertex registry
#[derive(Debug, Clone)]
pub struct FlowNetwork {
    registry: VertexRegistry,
    edges: EdgeMap,
    left: Vec<VertexIndex>,
    right: Vec<VertexIndex>,
    source: VertexIndex,
    sink: VertexIndex,
    friend: Option<VertexId>,
}

impl FlowNetwork {
    /// Builds the network for the given sides and edge list
    ///
    /// Every edge must run from a listed left identity to a listed right
    /// identity. Duplicate edges and identities reserved for the terminals
    /// are rejected.
    pub fn build(
        left_ids: &[VertexId],
        right_ids: &[VertexId],
        edge_list: &[(VertexId, VertexId)],
        friend: Option<VertexId>,
    ) -> Result<Self, GraphError> {
        let vertex_count = left_ids.len() + right_ids.len() + 2;
        let mut registry = VertexRegistry::with_capacity(vertex_count);
        let mut edges = EdgeMap::with_capacity(vertex_count + edge_list.len());

        let source = registry.vertex_from_id(VertexId::SOURCE);
        let sink = registry.vertex_from_id(VertexId::SINK);

        let mut sides: HashMap<VertexId, Side> = HashMap::with_capacity(vertex_count);
        for (ids, side) in [(left_ids, Side::Left), (right_ids, Side::Right)] {
            for &id in ids {
                if id.is_terminal() {
                    return Err(GraphError::ReservedIdentity(id));
                }
                if let Some(&existing) = sides.get(&id) {
                    if existing != side {
                        return Err(GraphError::SideMismatch { left: id, right: id });
                    }
                }
                sides.insert(id, side);
            }
        }

        let mut left = Vec::with_capacity(left_ids.len());
        for &id in left_ids {
            let idx = registry.vertex_from_id(id);
            if edges.get(VertexId::SOURCE, id).is_some() {
                continue;
            }
            edges.insert(VertexId::SOURCE, id, UNIT_CAPACITY)?;
            registry.connect(source, idx);
            left.push(idx);
        }

        let mut right = Vec::with_capacity(right_ids.len());
        for &id in right_ids {
            let idx = registry.vertex_from_id(id);
            if edges.get(id, VertexId::SINK).is_some() {
                continue;
            }
            edges.insert(id, VertexId::SINK, UNIT_CAPACITY)?;
            registry.connect(idx, sink);
            right.push(idx);
        }

        for &(l, r) in edge_list {
            match (sides.get(&l), sides.get(&r)) {
                (Some(Side::Left), Some(Side::Right)) => {}
                (None, _) => return Err(GraphError::UnknownVertex(l)),
                (_, None) => return Err(GraphError::UnknownVertex(r)),
                _ => return Err(GraphError::SideMismatch { left: l, right: r }),
            }
            edges.insert(l, r, UNIT_CAPACITY)?;
            let (li, ri) = (registry.vertex_from_id(l), registry.vertex_from_id(r));
            registry.connect(li, ri);
        }

        debug!(
            "Built flow network: {} left, {} right, {} input edges",
            left.len(),
            right.len(),
            edge_list.len()
        );

        Ok(Self {
            registry,
            edges,
            left,
            right,
            source,
            sink,
            friend,
        })
    }

    #[inline]
    pub fn registry(&self) -> &VertexRegistry {
        &self.registry
    }

    #[inline]
    pub fn edges(&self) -> &EdgeMap {
        &self.edges
    }

    #[inline]
    pub(crate) fn edges_mut(&mut self) -> &mut EdgeMap {
        &mut self.edges
    }

    #[inline]
    pub fn source(&self) -> VertexIndex {
        self.source
    }

    #[inline]
    pub fn sink(&self) -> VertexIndex {
        self.sink
    }

    #[inline]
    pub fn left(&self) -> &[VertexIndex] {
        &self.left
    }

    #[inline]
    pub fn right(&self) -> &[VertexIndex] {
        &self.right
    }

    /// Vertices of one side, in search order
    pub fn side(&self, side: Side) -> &[VertexIndex] {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    #[inline]
    pub fn friend(&self) -> Option<VertexId> {
        self.friend
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.registry.len()
    }

    #[inline]
    pub fn id_of(&self, idx: VertexIndex) -> VertexId {
        self.registry.id_of(idx)
    }

    /// Upper bound on the flow value: min(|left|, |right|)
    pub fn augmentation_bound(&self) -> u32 {
        self.left.len().min(self.right.len()) as u32
    }

    /// Residual capacity from vertex `u` toward vertex `v`
    #[inline]
    pub fn residual(&self, u: VertexIndex, v: VertexIndex) -> Result<u32, GraphError> {
        self.edges
            .residual_capacity(self.registry.id_of(u), self.registry.id_of(v))
    }

    /// Reorders search order around the friend
    ///
    /// Each neighbor of the friend that has an edge pointing at the friend
    /// moves the friend to the front of its own neighbor list; every other
    /// neighbor moves the friend to the back. The friend's own list puts
    /// outgoing edges first, and the friend leads its side's iteration
    /// order. This only steers which of several equal augmenting choices is
    /// tried first.
    pub fn bias_for_friend(&mut self) {
        let friend = match self.friend {
            Some(friend) => friend,
            None => return,
        };
        let friend_idx = match self.registry.lookup(friend) {
            Some(idx) => idx,
            None => {
                debug!("Friend {} does not appear in the network", friend);
                return;
            }
        };

        let neighbors = self.registry.get(friend_idx).neighbors().to_vec();
        for &n in &neighbors {
            let n_id = self.registry.id_of(n);
            if self.edges.flows_forward(n_id, friend) {
                self.registry.get_mut(n).move_to_front(friend_idx);
            } else {
                self.registry.get_mut(n).move_to_back(friend_idx);
            }
        }

        let (registry, edges) = (&mut self.registry, &self.edges);
        let ids: HashMap<VertexIndex, VertexId> =
            neighbors.iter().map(|&n| (n, registry.id_of(n))).collect();
        registry
            .get_mut(friend_idx)
            .prioritize_by(|n| ids.get(&n).map_or(false, |&id| edges.flows_forward(friend, id)));

        for order in [&mut self.left, &mut self.right] {
            if let Some(pos) = order.iter().position(|&v| v == friend_idx) {
                order[..=pos].rotate_right(1);
            }
        }

        debug!("Biased search order toward friend {} ({} neighbors)", friend, neighbors.len());
    }

    /// Places an initial matching greedily along left-side iteration order
    ///
    /// Each unmatched left vertex takes its first right neighbor that is
    /// neither visited nor already carrying flow to the sink. Visited
    /// markers are cleared before returning.
    pub fn seed_greedy_matching(&mut self, state: &mut SearchState) -> Result<u32, FlowError> {
        let mut seeded = 0u32;

        for &l in &self.left {
            let l_id = self.registry.id_of(l);
            if state.is_visited(l) || self.edges.flow(VertexId::SOURCE, l_id) > 0 {
                continue;
            }
            for &r in self.registry.get(l).neighbors() {
                if r == self.source || state.is_visited(r) {
                    continue;
                }
                let r_id = self.registry.id_of(r);
                if self.edges.flow(r_id, VertexId::SINK) > 0 {
                    continue;
                }
                self.edges.set_flow(VertexId::SOURCE, l_id, UNIT_CAPACITY)?;
                self.edges.set_flow(l_id, r_id, UNIT_CAPACITY)?;
                self.edges.set_flow(r_id, VertexId::SINK, UNIT_CAPACITY)?;
                state.visit(l);
                state.visit(r);
                seeded += 1;
                trace!("Seeded pair ({}, {})", l_id, r_id);
                break;
            }
        }

        state.reset();
        debug!("Greedy seed placed {} pairs", seeded);
        Ok(seeded)
    }

    /// Total flow leaving the source
    pub fn flow_value(&self) -> u32 {
        self.left
            .iter()
            .map(|&l| self.edges.flow(VertexId::SOURCE, self.registry.id_of(l)))
            .sum()
    }

    /// Total flow entering the sink
    pub fn sink_inflow(&self) -> u32 {
        self.right
            .iter()
            .map(|&r| self.edges.flow(self.registry.id_of(r), VertexId::SINK))
            .sum()
    }

    /// Checks conservation at every non-terminal vertex and agreement of
    /// source outflow with sink inflow, returning the flow value
    pub fn verify_flow(&self) -> Result<u32, FlowError> {
        for (idx, vertex) in self.registry.iter() {
            if idx == self.source || idx == self.sink {
                continue;
            }
            let v = vertex.id();
            let (mut inflow, mut outflow) = (0u32, 0u32);
            for &n in vertex.neighbors() {
                let n_id = self.registry.id_of(n);
                if self.edges.flows_forward(n_id, v) {
                    inflow += self.edges.flow(n_id, v);
                } else {
                    outflow += self.edges.flow(v, n_id);
                }
            }
            if inflow != outflow {
                return Err(FlowError::ConservationViolated {
                    vertex: v,
                    inflow,
                    outflow,
                });
            }
        }

        let source_outflow = self.flow_value();
        let sink_inflow = self.sink_inflow();
        if source_outflow != sink_inflow {
            return Err(FlowError::FlowValueMismatch {
                source_outflow,
                sink_inflow,
            });
        }
        Ok(source_outflow)
    }
}

/// Edmonds-Karp augmenting-path engine
#[derive(Debug)]
pub struct EdmondsKarpMatcher {
    greedy_seed: bool,
    friend_bias: bool,
    profiler: AlgorithmProfiler,
}

impl Default for EdmondsKarpMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl EdmondsKarpMatcher {
    pub fn new() -> Self {
        Self {
            greedy_seed: true,
            friend_bias: true,
            profiler: AlgorithmProfiler::new(),
        }
    }

    /// Breadth-first search over positive residual edges
    ///
    /// Returns true as soon as the sink is reached; the predecessor chain in
    /// `state` then describes the augmenting path.
    fn find_augmenting_path(
        &mut self,
        network: &FlowNetwork,
        state: &mut SearchState,
    ) -> Result<bool, FlowError> {
        let (source, sink) = (network.source(), network.sink());
        let mut queue = VecDeque::new();
        state.visit(source);
        queue.push_back(source);

        while let Some(u) = queue.pop_front() {
            self.profiler.record_vertex_exploration();
            for &v in network.registry().get(u).neighbors() {
                if state.is_visited(v) || network.residual(u, v)? == 0 {
                    continue;
                }
                state.visit_from(v, u);
                if v == sink {
                    return Ok(true);
                }
                queue.push_back(v);
            }
        }
        Ok(false)
    }

    /// Flips flow along the predecessor chain from sink to source
    fn augment(network: &mut FlowNetwork, state: &SearchState) -> Result<(), FlowError> {
        let mut current = network.sink();
        while let Some(prev) = state.predecessor(current) {
            let (u, v) = (network.id_of(prev), network.id_of(current));
            network.edges_mut().flip_flow(u, v)?;
            current = prev;
        }
        if current != network.source() {
            return Err(GraphError::UnknownEdge(VertexId::SOURCE, network.id_of(current)).into());
        }
        Ok(())
    }
}

impl Algorithm for EdmondsKarpMatcher {
    fn name(&self) -> &'static str {
        "Edmonds-Karp"
    }

    fn category(&self) -> &'static str {
        "max_flow"
    }

    fn description(&self) -> String {
        "Breadth-first augmenting paths on a unit-capacity network; at most min(|L|, |R|) augmentations, O(VE) overall.".to_string()
    }

    fn parameters(&self) -> Vec<AlgorithmParameter> {
        vec![
            AlgorithmParameter {
                name: "greedy_seed".to_string(),
                value: self.greedy_seed.to_string(),
                value_type: ParameterType::Boolean,
            },
            AlgorithmParameter {
                name: "friend_bias".to_string(),
                value: self.friend_bias.to_string(),
                value_type: ParameterType::Boolean,
            },
        ]
    }

    fn set_parameter(&mut self, name: &str, value: &str) -> Result<(), AlgorithmError> {
        match name {
            "greedy_seed" => {
                self.greedy_seed = parse_bool_parameter(name, value)?;
                Ok(())
            }
            "friend_bias" => {
                self.friend_bias = parse_bool_parameter(name, value)?;
                Ok(())
            }
            _ => Err(AlgorithmError::invalid_parameter(name, "unknown parameter")),
        }
    }

    fn get_parameter(&self, name: &str) -> Option<String> {
        match name {
            "greedy_seed" => Some(self.greedy_seed.to_string()),
            "friend_bias" => Some(self.friend_bias.to_string()),
            _ => None,
        }
    }
}

impl MaximumMatcher for EdmondsKarpMatcher {
    fn maximize_flow(&mut self, network: &mut FlowNetwork) -> Result<u32, FlowError> {
        self.profiler.start();
        let mut state = SearchState::new(network.vertex_count());

        if self.friend_bias {
            network.bias_for_friend();
        }
        if self.greedy_seed {
            let seeded = network.seed_greedy_matching(&mut state)?;
            self.profiler.record_seed(seeded as usize);
        }

        let bound = network.augmentation_bound();
        let mut flow = network.flow_value();

        while self.find_augmenting_path(network, &mut state)? {
            Self::augment(network, &state)?;
            state.reset();
            flow += 1;
            if flow > bound {
                return Err(FlowError::AugmentationBoundExceeded { bound });
            }
            self.profiler.record_step();
            trace!("Augmentation {} raised flow to {}", self.profiler.metrics().steps_executed, flow);
        }
        state.reset();

        self.profiler.stop();
        debug!(
            "Edmonds-Karp finished: flow {} after {} augmentations",
            flow,
            self.profiler.metrics().steps_executed
        );
        Ok(flow)
    }

    fn metrics(&self) -> &AlgorithmMetrics {
        self.profiler.metrics()
    }
}
