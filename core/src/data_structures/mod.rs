//! Graph storage for flow networks

pub mod graph;

pub use self::graph::{EdgeMap, EdgeState, GraphError, Vertex, VertexIndex, VertexRegistry};
