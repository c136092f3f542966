//! # plantmate-rules
//!
//! A deterministic, TOML-driven decision oracle for PlantMate.
//!
//! `RuleOracle` matches the user's question against an ordered list of
//! keyword rules (first match wins) and answers the engine's three questions
//! from the matching rule's capability list. Use it for offline runs, demos,
//! and as a fallback when no language model is configured.

pub mod engine;
pub mod rule;

pub use engine::RuleOracle;
pub use rule::{DecisionRule, RuleSet};
