//! Common chess utilities for the analysis workspace
//!
//! This crate provides coordinate-move helpers and the rules-engine
//! capability (position validation, SAN rendering, move replay) used by the
//! engine and orchestrator crates.

pub mod rules;
pub mod uci;

// Re-export commonly used items
pub use rules::{CozyRules, PlayedMove, RulesEngine, RulesError, Side};
pub use uci::*;
