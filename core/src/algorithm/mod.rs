//! Bilateral Algorithm Framework
//! Maximum flow engines, König cover construction and their shared traits
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

pub mod traits;
pub mod graph;
pub mod state;

pub use self::traits::*;
pub use self::graph::*;
