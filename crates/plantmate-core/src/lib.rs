//! # plantmate-core
//!
//! The bounded tool-orchestration runtime behind the PlantMate assistant.
//!
//! This crate provides:
//! - The collaborator traits (`DecisionOracle`, `CapabilityProvider`,
//!   `TraceWriter`, `DecisionVerifier`)
//! - The static `WorkflowGraph` every run is checked against
//! - The `Orchestrator` that drives one question through the graph
//!
//! ## Usage
//!
//! ```rust,ignore
//! use plantmate_core::{Orchestrator, OrchestratorConfig, RunRequest};
//!
//! let orchestrator = Orchestrator::new(oracle, OrchestratorConfig::default())?
//!     .with_provider(environment)
//!     .with_provider(knowledge);
//! let result = orchestrator.run(RunRequest::new("how is my fern doing?")).await;
//! ```

pub mod compile;
pub mod config;
pub mod engine;
pub mod graph;
pub mod oracle;
pub mod traits;

pub use config::{CapabilityConfig, OrchestratorConfig};
pub use engine::{Orchestrator, RunRequest};
pub use graph::WorkflowGraph;
