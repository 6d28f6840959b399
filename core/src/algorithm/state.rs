//! Transient search state for augmenting-path traversals
//!
//! Visited flags and predecessor links live beside the vertex arena rather
//! than inside vertex records, indexed by the same `VertexIndex`. A single
//! `SearchState` is reused across searches and must be reset between them;
//! a stale predecessor from an earlier search would splice an invalid path.

use crate::data_structures::graph::VertexIndex;

/// Per-search visited flags and predecessor links
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    visited: Vec<bool>,
    predecessor: Vec<Option<VertexIndex>>,
    touched: Vec<VertexIndex>,
}

impl SearchState {
    pub fn new(vertex_count: usize) -> Self {
        Self {
            visited: vec![false; vertex_count],
            predecessor: vec![None; vertex_count],
            touched: Vec::new(),
        }
    }

    #[inline]
    pub fn is_visited(&self, idx: VertexIndex) -> bool {
        self.visited[idx]
    }

    /// Marks `idx` visited, returning false when it already was
    #[inline]
    pub fn visit(&mut self, idx: VertexIndex) -> bool {
        if self.visited[idx] {
            return false;
        }
        self.visited[idx] = true;
        self.touched.push(idx);
        true
    }

    /// Marks `idx` visited through `from`
    #[inline]
    pub fn visit_from(&mut self, idx: VertexIndex, from: VertexIndex) -> bool {
        if !self.visit(idx) {
            return false;
        }
        self.predecessor[idx] = Some(from);
        true
    }

    #[inline]
    pub fn predecessor(&self, idx: VertexIndex) -> Option<VertexIndex> {
        self.predecessor[idx]
    }

    /// Number of vertices visited since the last reset
    #[inline]
    pub fn visited_count(&self) -> usize {
        self.touched.len()
    }

    /// Clears every flag and link set since the last reset
    pub fn reset(&mut self) {
        for idx in self.touched.drain(..) {
            self.visited[idx] = false;
            self.predecessor[idx] = None;
        }
    }

    /// Whether no vertex carries a flag or link
    pub fn is_clean(&self) -> bool {
        self.touched.is_empty()
            && self.visited.iter().all(|v| !v)
            && self.predecessor.iter().all(Option::is_none)
    }

    /// Predecessor chain from `to` back to the search root, `to` first
    pub fn path_to(&self, to: VertexIndex) -> Vec<VertexIndex> {
        let mut path = vec![to];
        let mut current = to;
        while let Some(prev) = self.predecessor[current] {
            path.push(prev);
            current = prev;
            if path.len() > self.visited.len() {
                break;
            }
        }
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visit_and_reset() {
        let mut state = SearchState::new(5);
        assert!(state.visit(0));
        assert!(state.visit_from(3, 0));
        assert!(!state.visit_from(3, 1));

        assert_eq!(state.predecessor(3), Some(0));
        assert_eq!(state.visited_count(), 2);

        state.reset();
        assert!(state.is_clean());
        assert!(!state.is_visited(3));
        assert_eq!(state.predecessor(3), None);
    }

    #[test]
    fn test_path_to_follows_predecessors() {
        let mut state = SearchState::new(6);
        state.visit(0);
        state.visit_from(2, 0);
        state.visit_from(4, 2);
        state.visit_from(1, 4);

        assert_eq!(state.path_to(1), vec![1, 4, 2, 0]);
        assert_eq!(state.path_to(0), vec![0]);
    }
}
