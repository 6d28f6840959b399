//! Flow, matching and cover algorithms on bipartite networks
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

pub mod max_flow;
pub mod push_relabel;
pub mod matching;

pub use self::max_flow::{EdmondsKarpMatcher, FlowError, FlowNetwork, MaxFlowAlgorithm};
pub use self::push_relabel::PushRelabelMatcher;
pub use self::matching::{
    extract_matching, konig_cover, select_cover, CoverSelection, MatchedPair, Matching,
    MatchingError,
};
