//! Cover Correctness Verification
//!
//! Independent checks applied to a computed cover: every input edge must
//! have an endpoint in the cover, no cover vertex may be removable on its
//! own, and the cover size must equal the matching size as König's theorem
//! demands. For small fixtures, exact reference solvers enumerate covers by
//! branching on uncovered edges, which gives the true minimum size and tells
//! whether a given vertex belongs to some minimum cover.

use std::collections::{BTreeSet, HashMap};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::algorithm::graph::matching::MatchingError;
use crate::algorithm::traits::VertexId;

/// Largest fixture the reference solvers accept
pub const MAX_REFERENCE_VERTICES: usize = 24;

/// Outcome of checking one cover
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverReport {
    pub cover_size: usize,
    pub matching_size: usize,
    pub uncovered: Vec<(VertexId, VertexId)>,
    /// Cover vertices whose removal leaves every edge covered
    pub redundant: Vec<VertexId>,
}

impl CoverReport {
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.uncovered.is_empty()
    }

    #[inline]
    pub fn is_locally_minimal(&self) -> bool {
        self.redundant.is_empty()
    }

    /// |cover| == |matching|
    #[inline]
    pub fn konig_equality(&self) -> bool {
        self.cover_size == self.matching_size
    }

    pub fn passed(&self) -> bool {
        self.is_valid() && self.is_locally_minimal() && self.konig_equality()
    }
}

/// Edges with no endpoint in `cover`
pub fn uncovered_edges(
    edges: &[(VertexId, VertexId)],
    cover: &BTreeSet<VertexId>,
) -> Vec<(VertexId, VertexId)> {
    edges
        .iter()
        .filter(|(a, b)| !cover.contains(a) && !cover.contains(b))
        .copied()
        .collect()
}

pub fn is_vertex_cover(edges: &[(VertexId, VertexId)], cover: &BTreeSet<VertexId>) -> bool {
    edges
        .iter()
        .all(|(a, b)| cover.contains(a) || cover.contains(b))
}

/// Cover vertices that are not the sole cover endpoint of any edge
pub fn redundant_vertices(
    edges: &[(VertexId, VertexId)],
    cover: &BTreeSet<VertexId>,
) -> Vec<VertexId> {
    let mut needed: HashMap<VertexId, bool> = cover.iter().map(|&v| (v, false)).collect();
    for &(a, b) in edges {
        match (cover.contains(&a), cover.contains(&b)) {
            (true, false) => {
                needed.insert(a, true);
            }
            (false, true) => {
                needed.insert(b, true);
            }
            _ => {}
        }
    }
    cover.iter().filter(|v| !needed[*v]).copied().collect()
}

/// Whether removing any single vertex leaves some edge uncovered
pub fn is_locally_minimal(edges: &[(VertexId, VertexId)], cover: &BTreeSet<VertexId>) -> bool {
    redundant_vertices(edges, cover).is_empty()
}

pub fn check_cover(
    edges: &[(VertexId, VertexId)],
    cover: &BTreeSet<VertexId>,
    matching_size: usize,
) -> CoverReport {
    CoverReport {
        cover_size: cover.len(),
        matching_size,
        uncovered: uncovered_edges(edges, cover),
        redundant: redundant_vertices(edges, cover),
    }
}

/// Fails with `MatchingError::InvalidCover` unless the cover passes every check
pub fn verify_cover(
    edges: &[(VertexId, VertexId)],
    cover: &BTreeSet<VertexId>,
    matching_size: usize,
) -> Result<CoverReport, MatchingError> {
    let report = check_cover(edges, cover, matching_size);
    if !report.passed() {
        warn!(
            "Cover check failed: {} uncovered, {} redundant, size {} vs matching {}",
            report.uncovered.len(),
            report.redundant.len(),
            report.cover_size,
            report.matching_size
        );
        return Err(MatchingError::InvalidCover {
            cover_size: report.cover_size,
            matching_size: report.matching_size,
            uncovered: report.uncovered.len(),
        });
    }
    Ok(report)
}

/// Edge list over dense bit positions
struct BitGraph {
    edges: Vec<(u32, u32)>,
    positions: HashMap<VertexId, u32>,
}

impl BitGraph {
    fn new(edges: &[(VertexId, VertexId)]) -> Option<Self> {
        let mut positions = HashMap::new();
        for &(a, b) in edges {
            for v in [a, b] {
                let next = positions.len() as u32;
                positions.entry(v).or_insert(next);
            }
        }
        if positions.len() > MAX_REFERENCE_VERTICES {
            return None;
        }
        let edges = edges
            .iter()
            .map(|(a, b)| (1u32 << positions[a], 1u32 << positions[b]))
            .collect();
        Some(Self { edges, positions })
    }

    /// Minimum number of extra vertices needed on top of `chosen`
    fn minimum_extension(&self, chosen: u32) -> usize {
        let mut best = self.positions.len() + 1;
        self.branch(chosen, 0, &mut best);
        best
    }

    fn branch(&self, chosen: u32, size: usize, best: &mut usize) {
        if size >= *best {
            return;
        }
        let open = self
            .edges
            .iter()
            .find(|&&(a, b)| chosen & (a | b) == 0);
        match open {
            None => *best = size,
            Some(&(a, b)) => {
                self.branch(chosen | a, size + 1, best);
                self.branch(chosen | b, size + 1, best);
            }
        }
    }
}

/// Exact minimum vertex cover size, `None` above `MAX_REFERENCE_VERTICES`
pub fn brute_force_minimum_cover_size(edges: &[(VertexId, VertexId)]) -> Option<usize> {
    BitGraph::new(edges).map(|g| g.minimum_extension(0))
}

/// Whether `vertex` belongs to at least one minimum vertex cover
///
/// A vertex outside every edge is in no minimum cover.
pub fn in_some_minimum_cover(edges: &[(VertexId, VertexId)], vertex: VertexId) -> Option<bool> {
    let graph = BitGraph::new(edges)?;
    let bit = match graph.positions.get(&vertex) {
        Some(&pos) => 1u32 << pos,
        None => return Some(false),
    };
    let minimum = graph.minimum_extension(0);
    Some(1 + graph.minimum_extension(bit) == minimum)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edges(raw: &[(u32, u32)]) -> Vec<(VertexId, VertexId)> {
        raw.iter().map(|&(a, b)| (VertexId(a), VertexId(b))).collect()
    }

    fn set(raw: &[u32]) -> BTreeSet<VertexId> {
        raw.iter().copied().map(VertexId).collect()
    }

    #[test]
    fn test_uncovered_and_redundant() {
        let e = edges(&[(1000, 2000), (1001, 2000), (1001, 2001)]);

        assert_eq!(uncovered_edges(&e, &set(&[2000])), edges(&[(1001, 2001)]));
        assert!(is_vertex_cover(&e, &set(&[2000, 1001])));
        assert!(is_locally_minimal(&e, &set(&[2000, 1001])));

        // Either of 1000 and 2000 could be dropped, though not both
        let padded = set(&[1000, 2000, 1001]);
        assert!(is_vertex_cover(&e, &padded));
        assert_eq!(
            redundant_vertices(&e, &padded),
            vec![VertexId(1000), VertexId(2000)]
        );
    }

    #[test]
    fn test_report_checks() {
        let e = edges(&[(1000, 2000), (1001, 2001)]);
        let good = check_cover(&e, &set(&[1000, 2001]), 2);
        assert!(good.passed());

        let short = check_cover(&e, &set(&[1000]), 2);
        assert!(!short.is_valid());
        assert!(!short.konig_equality());

        assert!(verify_cover(&e, &set(&[1000, 2001]), 2).is_ok());
        assert_eq!(
            verify_cover(&e, &set(&[1000]), 2),
            Err(MatchingError::InvalidCover {
                cover_size: 1,
                matching_size: 2,
                uncovered: 1
            })
        );
    }

    #[test]
    fn test_reference_minimum() {
        assert_eq!(brute_force_minimum_cover_size(&[]), Some(0));
        assert_eq!(
            brute_force_minimum_cover_size(&edges(&[(1000, 2000), (1000, 2001), (1000, 2002)])),
            Some(1)
        );
        // Path of four edges needs two vertices
        let path = edges(&[(1000, 2000), (1001, 2000), (1001, 2001), (1002, 2001)]);
        assert_eq!(brute_force_minimum_cover_size(&path), Some(2));
    }

    #[test]
    fn test_reference_membership() {
        let star = edges(&[(1009, 2000), (1009, 2001), (1009, 2002)]);
        assert_eq!(in_some_minimum_cover(&star, VertexId(1009)), Some(true));
        assert_eq!(in_some_minimum_cover(&star, VertexId(2000)), Some(false));
        assert_eq!(in_some_minimum_cover(&star, VertexId(1500)), Some(false));

        let single = edges(&[(1000, 2000)]);
        assert_eq!(in_some_minimum_cover(&single, VertexId(1000)), Some(true));
        assert_eq!(in_some_minimum_cover(&single, VertexId(2000)), Some(true));
    }

    #[test]
    fn test_reference_size_limit() {
        let wide: Vec<_> = (0..13)
            .map(|i| (VertexId(1000 + i), VertexId(2000 + i)))
            .collect();
        assert_eq!(brute_force_minimum_cover_size(&wide), None);
        assert_eq!(in_some_minimum_cover(&wide, VertexId(1000)), None);
    }
}
