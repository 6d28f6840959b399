//! Problem instances and their text format
//!
//! Input is whitespace-separated: an edge count N followed by N identity
//! pairs. Each identity is classified by the configured ranges, so a pair
//! may name its endpoints in either order. Output is the cover size followed
//! by one identity per line.

use std::collections::{BTreeSet, HashSet};
use std::io::{self, Write};

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::algorithm::traits::{Side, VertexId};
use crate::config::IdRanges;

/// Input rejection reasons
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Missing edge count")]
    MissingCount,

    #[error("Invalid edge count '{0}'")]
    InvalidCount(String),

    #[error("Expected {expected} edges but input ends after {found}")]
    Truncated { expected: usize, found: usize },

    #[error("Invalid vertex identity '{token}' in edge {edge}")]
    InvalidIdentity { token: String, edge: usize },

    #[error("Vertex {0} is outside both identity ranges")]
    OutOfRange(VertexId),

    #[error("Self-loop on vertex {0}")]
    SelfLoop(VertexId),

    #[error("Edge {0} - {1} joins two vertices of the same side")]
    SameSide(VertexId, VertexId),

    #[error("Duplicate edge {left} - {right}")]
    DuplicateEdge { left: VertexId, right: VertexId },
}

/// Parsed bipartite instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemInstance {
    /// Left identities, ascending
    pub left: Vec<VertexId>,
    /// Right identities, ascending
    pub right: Vec<VertexId>,
    /// Edges as (left, right) in input order
    pub edges: Vec<(VertexId, VertexId)>,
}

impl ProblemInstance {
    /// Builds an instance from raw pairs, normalizing each to (left, right)
    pub fn from_edges<I>(pairs: I, ranges: &IdRanges) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = (VertexId, VertexId)>,
    {
        let mut left = BTreeSet::new();
        let mut right = BTreeSet::new();
        let mut seen = HashSet::new();
        let mut edges = Vec::new();

        for (a, b) in pairs {
            if a == b {
                return Err(ParseError::SelfLoop(a));
            }
            let side_a = ranges.classify(a).ok_or(ParseError::OutOfRange(a))?;
            let side_b = ranges.classify(b).ok_or(ParseError::OutOfRange(b))?;
            let (l, r) = match (side_a, side_b) {
                (Side::Left, Side::Right) => (a, b),
                (Side::Right, Side::Left) => (b, a),
                _ => return Err(ParseError::SameSide(a, b)),
            };
            if !seen.insert((l, r)) {
                return Err(ParseError::DuplicateEdge { left: l, right: r });
            }
            left.insert(l);
            right.insert(r);
            edges.push((l, r));
        }

        Ok(Self {
            left: left.into_iter().collect(),
            right: right.into_iter().collect(),
            edges,
        })
    }

    /// Parses the text format
    ///
    /// Tokens after the last declared edge are ignored with a warning.
    pub fn parse(input: &str, ranges: &IdRanges) -> Result<Self, ParseError> {
        let mut tokens = input.split_whitespace();

        let count_token = tokens.next().ok_or(ParseError::MissingCount)?;
        let count: usize = count_token
            .parse()
            .map_err(|_| ParseError::InvalidCount(count_token.to_string()))?;

        // The count is untrusted until the pairs are actually read
        let mut pairs = Vec::with_capacity(count.min(1 << 16));
        for edge in 0..count {
            let mut endpoint = || -> Result<VertexId, ParseError> {
                let token = tokens.next().ok_or(ParseError::Truncated {
                    expected: count,
                    found: edge,
                })?;
                token
                    .parse()
                    .map(VertexId)
                    .map_err(|_| ParseError::InvalidIdentity {
                        token: token.to_string(),
                        edge,
                    })
            };
            let a = endpoint()?;
            let b = endpoint()?;
            pairs.push((a, b));
        }

        let trailing = tokens.count();
        if trailing > 0 {
            warn!("Ignoring {} tokens after the last edge", trailing);
        }

        let instance = Self::from_edges(pairs, ranges)?;
        debug!(
            "Parsed {} edges over {} left and {} right vertices",
            instance.edges.len(),
            instance.left.len(),
            instance.right.len()
        );
        Ok(instance)
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.left.len() + self.right.len()
    }
}

/// Writes the cover size followed by one identity per line
pub fn write_cover<W: Write>(out: &mut W, cover: &BTreeSet<VertexId>) -> io::Result<()> {
    writeln!(out, "{}", cover.len())?;
    for id in cover {
        writeln!(out, "{}", id)?;
    }
    Ok(())
}
