//! # plantmate-verify
//!
//! Verification of raw decision-oracle answers.
//!
//! [`engine::SchemaDecisionVerifier`] implements
//! [`plantmate_core::traits::DecisionVerifier`]. Each payload is checked
//! structurally against the JSON Schema for its decision kind, then against
//! any semantic rules registered for that kind. A failing report makes the
//! decision malformed, and the engine falls back to its safe default.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use plantmate_verify::SchemaDecisionVerifier;
//!
//! let verifier = SchemaDecisionVerifier::new()?;
//! let orchestrator = Orchestrator::new(oracle, config)?.with_verifier(Box::new(verifier));
//! ```

pub mod engine;

pub use engine::{DecisionRuleFn, SchemaDecisionVerifier};
