//! Cover verification and exact reference solvers

pub mod correctness;

pub use self::correctness::{check_cover, verify_cover, CoverReport};
