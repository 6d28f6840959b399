//! Bipartite flow graph storage
//!
//! This module implements the vertex registry and the edge-state table that
//! back every flow network. Vertices live in a flat arena and refer to one
//! another by arena index, so adjacency is a pure topology relation with no
//! ownership between neighbors. Edge state is keyed by ordered identity
//! pairs and carries flow and capacity for one direction only; the reverse
//! direction is derived when computing residual capacity.
//!
//! # Residual capacity
//! For an ordered pair (u, v):
//! - a forward edge u→v with positive capacity yields `capacity - flow`
//! - otherwise an edge v→u yields its current flow (cancellation capacity)
//! - otherwise the residual capacity is zero

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::algorithm::traits::VertexId;

/// Position of a vertex record inside the registry arena
pub type VertexIndex = usize;

/// Capacity placed on every edge of a matching network
pub const UNIT_CAPACITY: u32 = 1;

/// Graph storage errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("Duplicate edge {0} -> {1}")]
    DuplicateEdge(VertexId, VertexId),

    #[error("Unknown edge {0} -> {1}")]
    UnknownEdge(VertexId, VertexId),

    #[error("Unknown vertex {0}")]
    UnknownVertex(VertexId),

    #[error("Identity {0} is reserved for a synthetic terminal")]
    ReservedIdentity(VertexId),

    #[error("Edge {left} -> {right} does not run from the left side to the right side")]
    SideMismatch { left: VertexId, right: VertexId },

    #[error("Flow {flow} on {from} -> {to} outside [0, {capacity}]")]
    CapacityExceeded {
        from: VertexId,
        to: VertexId,
        flow: i64,
        capacity: u32,
    },

    #[error("Cannot flip flow on {from} -> {to} with capacity {capacity}")]
    NonUnitCapacity {
        from: VertexId,
        to: VertexId,
        capacity: u32,
    },
}

/// Single vertex record
#[derive(Debug, Clone)]
pub struct Vertex {
    id: VertexId,
    neighbors: Vec<VertexIndex>,
}

impl Vertex {
    fn new(id: VertexId) -> Self {
        Self {
            id,
            neighbors: Vec::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> VertexId {
        self.id
    }

    /// Neighbors in search order
    #[inline]
    pub fn neighbors(&self) -> &[VertexIndex] {
        &self.neighbors
    }

    #[inline]
    pub fn degree(&self) -> usize {
        self.neighbors.len()
    }

    fn add_neighbor(&mut self, neighbor: VertexIndex) {
        self.neighbors.push(neighbor);
    }

    /// Moves `neighbor` to the front of the search order, keeping the
    /// relative order of everything else
    pub fn move_to_front(&mut self, neighbor: VertexIndex) {
        if let Some(pos) = self.neighbors.iter().position(|&n| n == neighbor) {
            self.neighbors[..=pos].rotate_right(1);
        }
    }

    /// Moves `neighbor` to the back of the search order
    pub fn move_to_back(&mut self, neighbor: VertexIndex) {
        if let Some(pos) = self.neighbors.iter().position(|&n| n == neighbor) {
            self.neighbors[pos..].rotate_left(1);
        }
    }

    /// Stable reorder: neighbors satisfying `first` come before the rest
    pub fn prioritize_by<F>(&mut self, mut first: F)
    where
        F: FnMut(VertexIndex) -> bool,
    {
        let (mut front, back): (Vec<VertexIndex>, Vec<VertexIndex>) =
            self.neighbors.iter().copied().partition(|&n| first(n));
        front.extend(back);
        self.neighbors = front;
    }
}

/// Lookup-or-create registry of vertex records
///
/// The same identity always resolves to the same arena slot, so later
/// stages may compare vertices by index or by identity interchangeably.
/// The registry is owned by a single network and passed explicitly; there is
/// no process-wide vertex cache.
#[derive(Debug, Clone, Default)]
pub struct VertexRegistry {
    vertices: Vec<Vertex>,
    index: HashMap<VertexId, VertexIndex>,
}

impl VertexRegistry {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Returns the slot for `id`, creating the record on first use
    pub fn vertex_from_id(&mut self, id: VertexId) -> VertexIndex {
        if let Some(&idx) = self.index.get(&id) {
            return idx;
        }
        let idx = self.vertices.len();
        self.vertices.push(Vertex::new(id));
        self.index.insert(id, idx);
        idx
    }

    /// Returns the slot for `id` without creating one
    #[inline]
    pub fn lookup(&self, id: VertexId) -> Option<VertexIndex> {
        self.index.get(&id).copied()
    }

    #[inline]
    pub fn get(&self, idx: VertexIndex) -> &Vertex {
        &self.vertices[idx]
    }

    #[inline]
    pub fn get_mut(&mut self, idx: VertexIndex) -> &mut Vertex {
        &mut self.vertices[idx]
    }

    #[inline]
    pub fn id_of(&self, idx: VertexIndex) -> VertexId {
        self.vertices[idx].id
    }

    /// Records `u` and `v` as mutual neighbors
    pub fn connect(&mut self, u: VertexIndex, v: VertexIndex) {
        self.vertices[u].add_neighbor(v);
        self.vertices[v].add_neighbor(u);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (VertexIndex, &Vertex)> {
        self.vertices.iter().enumerate()
    }
}

/// Flow and capacity of one directed edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeState {
    pub flow: u32,
    pub capacity: u32,
}

impl EdgeState {
    pub fn new(capacity: u32) -> Self {
        Self { flow: 0, capacity }
    }

    /// Remaining forward capacity, `None` when flow exceeds capacity
    #[inline]
    pub fn residual(&self) -> Option<u32> {
        self.capacity.checked_sub(self.flow)
    }
}

/// Edge-state table keyed by ordered identity pairs
#[derive(Debug, Clone, Default)]
pub struct EdgeMap {
    edges: HashMap<(VertexId, VertexId), EdgeState>,
}

impl EdgeMap {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            edges: HashMap::with_capacity(capacity),
        }
    }

    /// Inserts the directed edge u→v with zero flow
    pub fn insert(&mut self, u: VertexId, v: VertexId, capacity: u32) -> Result<(), GraphError> {
        if self.edges.contains_key(&(u, v)) {
            return Err(GraphError::DuplicateEdge(u, v));
        }
        self.edges.insert((u, v), EdgeState::new(capacity));
        Ok(())
    }

    #[inline]
    pub fn get(&self, u: VertexId, v: VertexId) -> Option<&EdgeState> {
        self.edges.get(&(u, v))
    }

    /// Flow on u→v, zero for nonexistent edges
    #[inline]
    pub fn flow(&self, u: VertexId, v: VertexId) -> u32 {
        self.edges.get(&(u, v)).map_or(0, |e| e.flow)
    }

    /// Capacity of u→v, zero for nonexistent edges
    #[inline]
    pub fn capacity(&self, u: VertexId, v: VertexId) -> u32 {
        self.edges.get(&(u, v)).map_or(0, |e| e.capacity)
    }

    /// Whether the network edge between u and v is oriented u→v
    #[inline]
    pub fn flows_forward(&self, u: VertexId, v: VertexId) -> bool {
        self.capacity(u, v) > 0
    }

    /// Whether the edge between u and v carries flow in either direction
    #[inline]
    pub fn is_matched(&self, u: VertexId, v: VertexId) -> bool {
        self.flow(u, v) > 0 || self.flow(v, u) > 0
    }

    pub fn residual_capacity(&self, u: VertexId, v: VertexId) -> Result<u32, GraphError> {
        if let Some(forward) = self.edges.get(&(u, v)).filter(|e| e.capacity > 0) {
            return forward.residual().ok_or(GraphError::CapacityExceeded {
                from: u,
                to: v,
                flow: i64::from(forward.flow),
                capacity: forward.capacity,
            });
        }
        match self.edges.get(&(v, u)).filter(|e| e.capacity > 0) {
            Some(reverse) => Ok(reverse.flow),
            None => Ok(0),
        }
    }

    pub fn set_flow(&mut self, u: VertexId, v: VertexId, flow: u32) -> Result<(), GraphError> {
        let edge = self
            .edges
            .get_mut(&(u, v))
            .ok_or(GraphError::UnknownEdge(u, v))?;
        if flow > edge.capacity {
            return Err(GraphError::CapacityExceeded {
                from: u,
                to: v,
                flow: i64::from(flow),
                capacity: edge.capacity,
            });
        }
        edge.flow = flow;
        Ok(())
    }

    /// Adds `delta` to the flow on u→v, rejecting results outside [0, capacity]
    pub fn add_to_flow(&mut self, u: VertexId, v: VertexId, delta: i64) -> Result<(), GraphError> {
        let edge = self
            .edges
            .get_mut(&(u, v))
            .ok_or(GraphError::UnknownEdge(u, v))?;
        let updated = i64::from(edge.flow) + delta;
        if updated < 0 || updated > i64::from(edge.capacity) {
            return Err(GraphError::CapacityExceeded {
                from: u,
                to: v,
                flow: updated,
                capacity: edge.capacity,
            });
        }
        edge.flow = updated as u32;
        Ok(())
    }

    /// Moves `delta` units of residual capacity from u toward v, either by
    /// raising flow on u→v or by cancelling flow on v→u
    pub fn push_flow(&mut self, u: VertexId, v: VertexId, delta: u32) -> Result<(), GraphError> {
        if self.flows_forward(u, v) {
            self.add_to_flow(u, v, i64::from(delta))
        } else if self.flows_forward(v, u) {
            self.add_to_flow(v, u, -i64::from(delta))
        } else {
            Err(GraphError::UnknownEdge(u, v))
        }
    }

    /// Toggles the flow on the unit edge between u and v
    ///
    /// The edge is looked up as u→v first and v→u second, which covers both
    /// a forward step and a cancelling step of an augmenting path.
    pub fn flip_flow(&mut self, u: VertexId, v: VertexId) -> Result<(), GraphError> {
        let key = if self.flows_forward(u, v) {
            (u, v)
        } else if self.flows_forward(v, u) {
            (v, u)
        } else {
            return Err(GraphError::UnknownEdge(u, v));
        };
        let edge = self
            .edges
            .get_mut(&key)
            .ok_or(GraphError::UnknownEdge(key.0, key.1))?;
        if edge.capacity != UNIT_CAPACITY {
            return Err(GraphError::NonUnitCapacity {
                from: key.0,
                to: key.1,
                capacity: edge.capacity,
            });
        }
        edge.flow = UNIT_CAPACITY - edge.flow.min(UNIT_CAPACITY);
        Ok(())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&(VertexId, VertexId), &EdgeState)> {
        self.edges.iter()
    }
}
