//! Bipartite Matching Extraction and König Vertex Cover
//!
//! Reads the matched pairs off a maximum flow and turns them into a minimum
//! vertex cover by König's theorem. Alternating reachability is computed from
//! the unmatched vertices of one side; the cover is the reached part of the
//! opposite side plus the unreached part of the starting side. Running the
//! construction from both sides yields up to two distinct minimum covers, and
//! the selection step prefers the one holding the designated friend.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::collections::{BTreeSet, HashMap};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::algorithm::graph::max_flow::FlowNetwork;
use crate::algorithm::traits::{Side, VertexId};
use crate::data_structures::graph::VertexIndex;

// ═══════════════════════════════════════════════════════════════════════════════════════
// MATCHING REPRESENTATION
// ═══════════════════════════════════════════════════════════════════════════════════════

/// One matched pair, normalized to (left, right)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MatchedPair {
    pub left: VertexId,
    pub right: VertexId,
}

/// Maximum matching read from a network's final flow
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Matching {
    pairs: Vec<MatchedPair>,
    partner: HashMap<VertexId, VertexId>,
}

impl Matching {
    /// Builds a matching from pairs; a vertex already matched keeps its
    /// first partner and the later pair is refused
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = MatchedPair>,
    {
        let mut matching = Self::default();
        for pair in pairs {
            matching.insert(pair);
        }
        matching
    }

    fn insert(&mut self, pair: MatchedPair) -> bool {
        if self.partner.contains_key(&pair.left) || self.partner.contains_key(&pair.right) {
            return false;
        }
        self.partner.insert(pair.left, pair.right);
        self.partner.insert(pair.right, pair.left);
        self.pairs.push(pair);
        true
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Pairs in left-side iteration order
    #[inline]
    pub fn pairs(&self) -> &[MatchedPair] {
        &self.pairs
    }

    /// Whether `v` is an endpoint of some matched pair
    #[inline]
    pub fn is_matched(&self, v: VertexId) -> bool {
        self.partner.contains_key(&v)
    }

    #[inline]
    pub fn partner(&self, v: VertexId) -> Option<VertexId> {
        self.partner.get(&v).copied()
    }

    /// Whether the edge {a, b} belongs to the matching, in either orientation
    #[inline]
    pub fn contains_edge(&self, a: VertexId, b: VertexId) -> bool {
        self.partner.get(&a) == Some(&b)
    }
}

/// Matching and cover errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchingError {
    #[error("Matching has {matching} pairs but the maximum flow is {flow}")]
    SizeMismatch { matching: usize, flow: u32 },

    #[error("Vertex {vertex} is matched more than once")]
    VertexReused { vertex: VertexId },

    #[error("Cover of size {cover_size} is invalid for a matching of size {matching_size} ({uncovered} uncovered edges)")]
    InvalidCover {
        cover_size: usize,
        matching_size: usize,
        uncovered: usize,
    },
}

// ═══════════════════════════════════════════════════════════════════════════════════════
// MATCHING EXTRACTION
// ═══════════════════════════════════════════════════════════════════════════════════════

/// Collects every left→right edge carrying flow
///
/// The pair count must equal the network's flow value; anything else means
/// an engine broke the flow invariants.
pub fn extract_matching(network: &FlowNetwork) -> Result<Matching, MatchingError> {
    let registry = network.registry();
    let edges = network.edges();
    let mut matching = Matching::default();

    for &l in network.left() {
        let l_id = registry.id_of(l);
        for &r in registry.get(l).neighbors() {
            if r == network.source() {
                continue;
            }
            let r_id = registry.id_of(r);
            if edges.flow(l_id, r_id) > 0 {
                let pair = MatchedPair {
                    left: l_id,
                    right: r_id,
                };
                if !matching.insert(pair) {
                    let vertex = if matching.is_matched(l_id) { l_id } else { r_id };
                    return Err(MatchingError::VertexReused { vertex });
                }
            }
        }
    }

    let flow = network.flow_value();
    if matching.len() != flow as usize {
        return Err(MatchingError::SizeMismatch {
            matching: matching.len(),
            flow,
        });
    }

    debug!("Extracted matching of size {}", matching.len());
    Ok(matching)
}

// ═══════════════════════════════════════════════════════════════════════════════════════
// KÖNIG COVER
// ═══════════════════════════════════════════════════════════════════════════════════════

/// Vertices reachable by alternating paths from the unmatched vertices of
/// `origin`, as a membership table over registry slots
///
/// The first hop from an unmatched vertex uses a non-matching edge, and
/// every hop after that flips the requirement. Terminals are never entered.
/// The traversal keeps an explicit stack, so depth is bounded by memory
/// rather than by the call stack.
pub fn alternating_reachable(network: &FlowNetwork, matching: &Matching, origin: Side) -> Vec<bool> {
    let registry = network.registry();
    let (source, sink) = (network.source(), network.sink());
    let mut reachable = vec![false; registry.len()];
    let mut stack: Vec<(VertexIndex, bool)> = Vec::new();

    for &u in network.side(origin) {
        if !matching.is_matched(registry.id_of(u)) && !reachable[u] {
            reachable[u] = true;
            stack.push((u, false));
        }
    }

    while let Some((u, want_matched)) = stack.pop() {
        let u_id = registry.id_of(u);
        for &v in registry.get(u).neighbors() {
            if v == source || v == sink || reachable[v] {
                continue;
            }
            if matching.contains_edge(u_id, registry.id_of(v)) != want_matched {
                continue;
            }
            reachable[v] = true;
            stack.push((v, !want_matched));
        }
    }

    reachable
}

/// Minimum vertex cover derived from alternating reachability out of `origin`
///
/// Cover = (opposite side ∩ T) ∪ (origin side \ T).
pub fn konig_cover(network: &FlowNetwork, matching: &Matching, origin: Side) -> BTreeSet<VertexId> {
    let reachable = alternating_reachable(network, matching, origin);
    let registry = network.registry();

    let unreached_origin = network
        .side(origin)
        .iter()
        .filter(|&&v| !reachable[v]);
    let reached_opposite = network
        .side(origin.opposite())
        .iter()
        .filter(|&&v| reachable[v]);

    unreached_origin
        .chain(reached_opposite)
        .map(|&v| registry.id_of(v))
        .collect()
}

/// Cover chosen between the two König constructions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverSelection {
    pub cover: BTreeSet<VertexId>,
    /// Side whose unmatched vertices seeded the chosen cover
    pub origin: Side,
    pub friend_included: bool,
}

/// Runs the König construction from both sides and picks a cover
///
/// The cover containing `friend` wins. When neither does, the left-origin
/// cover is returned.
pub fn select_cover(
    network: &FlowNetwork,
    matching: &Matching,
    friend: Option<VertexId>,
) -> CoverSelection {
    let from_left = konig_cover(network, matching, Side::Left);
    let from_right = konig_cover(network, matching, Side::Right);

    let holds = |cover: &BTreeSet<VertexId>| friend.map_or(false, |f| cover.contains(&f));

    let (cover, origin) = if !holds(&from_left) && holds(&from_right) {
        (from_right, Side::Right)
    } else {
        (from_left, Side::Left)
    };
    let friend_included = holds(&cover);

    match friend {
        Some(f) if friend_included => info!("Selected {}-origin cover containing friend {}", origin, f),
        Some(f) => info!("No minimum cover contains friend {}; using {}-origin cover", f, origin),
        None => debug!("No friend configured; using {}-origin cover", origin),
    }

    CoverSelection {
        cover,
        origin,
        friend_included,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════════════
// UNIT TESTS WITH PROPERTY-BASED VERIFICATION
// ═══════════════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::graph::max_flow::EdmondsKarpMatcher;
    use crate::algorithm::traits::MaximumMatcher;
    use proptest::prelude::*;

    fn solved(raw: &[(u32, u32)], friend: Option<u32>) -> (FlowNetwork, Matching) {
        let edges: Vec<_> = raw.iter().map(|&(l, r)| (VertexId(l), VertexId(r))).collect();
        let mut left: Vec<_> = edges.iter().map(|e| e.0).collect();
        let mut right: Vec<_> = edges.iter().map(|e| e.1).collect();
        left.sort();
        left.dedup();
        right.sort();
        right.dedup();
        let mut net = FlowNetwork::build(&left, &right, &edges, friend.map(VertexId)).unwrap();
        EdmondsKarpMatcher::new().maximize_flow(&mut net).unwrap();
        let matching = extract_matching(&net).unwrap();
        (net, matching)
    }

    fn set(raw: &[u32]) -> BTreeSet<VertexId> {
        raw.iter().copied().map(VertexId).collect()
    }

    #[test]
    fn test_single_edge() {
        let (net, matching) = solved(&[(1000, 2000)], None);
        assert_eq!(
            matching.pairs(),
            &[MatchedPair {
                left: VertexId(1000),
                right: VertexId(2000)
            }]
        );

        // Everything is matched, so the left-origin cover keeps the left side
        assert_eq!(konig_cover(&net, &matching, Side::Left), set(&[1000]));
        assert_eq!(konig_cover(&net, &matching, Side::Right), set(&[2000]));
    }

    #[test]
    fn test_friend_star() {
        let (net, matching) = solved(&[(1009, 2000), (1009, 2001), (1009, 2002)], Some(1009));
        assert_eq!(matching.len(), 1);

        // The friend is the only matched left vertex
        let selection = select_cover(&net, &matching, Some(VertexId(1009)));
        assert_eq!(selection.cover, set(&[1009]));
        assert!(selection.friend_included);
    }

    #[test]
    fn test_selection_prefers_right_origin_for_right_friend() {
        // Two disjoint edges: the left-origin cover is {1000, 1001}
        let raw = [(1000, 2000), (1001, 2001)];
        let (net, matching) = solved(&raw, None);

        let left = select_cover(&net, &matching, Some(VertexId(1000)));
        assert_eq!(left.origin, Side::Left);
        assert!(left.friend_included);

        let right = select_cover(&net, &matching, Some(VertexId(2001)));
        assert_eq!(right.origin, Side::Right);
        assert_eq!(right.cover, set(&[2000, 2001]));
        assert!(right.friend_included);
    }

    #[test]
    fn test_friend_outside_every_minimum_cover() {
        // 1009 is a leaf hanging off the hub 2000; {2000} is the only minimum cover
        let raw = [(1000, 2000), (1009, 2000)];
        let (net, matching) = solved(&raw, Some(1009));
        let selection = select_cover(&net, &matching, Some(VertexId(1009)));

        assert_eq!(selection.cover, set(&[2000]));
        assert_eq!(selection.origin, Side::Left);
        assert!(!selection.friend_included);
    }

    #[test]
    fn test_size_mismatch_detected() {
        let (mut net, _) = solved(&[(1000, 2000)], None);
        // Break conservation: flow leaves the source without reaching a pair
        net.edges_mut()
            .set_flow(VertexId(1000), VertexId(2000), 0)
            .unwrap();
        assert_eq!(
            extract_matching(&net),
            Err(MatchingError::SizeMismatch {
                matching: 0,
                flow: 1
            })
        );
    }

    #[test]
    fn test_matching_partner_lookup() {
        let matching = Matching::from_pairs([
            MatchedPair {
                left: VertexId(1000),
                right: VertexId(2000),
            },
            MatchedPair {
                left: VertexId(1000),
                right: VertexId(2001),
            },
        ]);
        assert_eq!(matching.len(), 1);
        assert_eq!(matching.partner(VertexId(2000)), Some(VertexId(1000)));
        assert!(matching.contains_edge(VertexId(2000), VertexId(1000)));
        assert!(!matching.is_matched(VertexId(2001)));
    }

    fn small_bipartite() -> impl Strategy<Value = Vec<(u32, u32)>> {
        prop::collection::btree_set((1000u32..1008, 2000u32..2008), 0..24)
            .prop_map(|edges| edges.into_iter().collect())
    }

    proptest! {
        #[test]
        fn prop_both_covers_are_minimum(raw in small_bipartite()) {
            let (net, matching) = solved(&raw, None);
            for origin in [Side::Left, Side::Right] {
                let cover = konig_cover(&net, &matching, origin);
                prop_assert_eq!(cover.len(), matching.len());
                for &(l, r) in &raw {
                    prop_assert!(cover.contains(&VertexId(l)) || cover.contains(&VertexId(r)));
                }
            }
        }

        #[test]
        fn prop_matching_is_a_matching(raw in small_bipartite()) {
            let (net, matching) = solved(&raw, None);
            prop_assert_eq!(matching.len() as u32, net.flow_value());
            prop_assert!(matching.len() as u32 <= net.augmentation_bound());
            for pair in matching.pairs() {
                prop_assert!(raw.contains(&(pair.left.0, pair.right.0)));
            }
        }
    }
}
