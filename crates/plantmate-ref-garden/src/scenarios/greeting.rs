//! Scenario 1: Greeting
//!
//! The oracle judges a greeting to need no tools. The run takes the short
//! path InitialAnalysis → NoToolsNeeded → End: no provider is called, tool
//! results stay empty, and the audit trail is replaced by the no-tools marker.

use std::sync::Arc;

use plantmate_contracts::{
    decision::DecisionKind, error::PlantMateResult, execution::OrchestratorResult,
};
use plantmate_core::{OrchestratorConfig, RunRequest};
use plantmate_trace::InMemoryTraceWriter;

use crate::{garden_orchestrator, oracle::ScriptedOracle};

pub const QUERY: &str = "Hi there! How are you today?";

fn oracle() -> ScriptedOracle {
    ScriptedOracle::new().script(
        DecisionKind::InitialAnalysis,
        [r#"{"needs_tools": false, "reasoning": "a greeting, no plant data needed", "complexity": "simple"}"#],
    )
}

/// Run Scenario 1: Greeting.
pub async fn run_scenario() -> PlantMateResult<OrchestratorResult> {
    println!("=== Scenario 1: Greeting ===");
    println!();
    println!("  Query: \"{QUERY}\"");

    let orchestrator = garden_orchestrator(Arc::new(oracle()), OrchestratorConfig::default())?;
    let trace = InMemoryTraceWriter::new();

    let result = orchestrator.run_traced(RunRequest::new(QUERY), &trace).await;

    super::report(&result, &trace)?;
    Ok(result)
}
