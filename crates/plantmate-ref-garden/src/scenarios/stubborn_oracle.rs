//! Scenario 4: Stubborn Oracle
//!
//! The oracle keeps asking for more information and never judges the answer
//! complete. It selects environment, then search, then knowledge; after the
//! third capability the iteration ceiling forces final compilation.

use std::sync::Arc;

use plantmate_contracts::{
    decision::DecisionKind, error::PlantMateResult, execution::OrchestratorResult,
};
use plantmate_core::{OrchestratorConfig, RunRequest};
use plantmate_trace::InMemoryTraceWriter;

use crate::{garden_orchestrator, mock_data::stressed_readings, oracle::ScriptedOracle};

pub const QUERY: &str = "Tell me everything about keeping my monstera healthy, including the latest research";

fn oracle() -> ScriptedOracle {
    ScriptedOracle::new()
        .script(
            DecisionKind::InitialAnalysis,
            [r#"{"needs_tools": true, "complexity": "complex"}"#],
        )
        .script(
            DecisionKind::ToolSelection,
            [
                r#"{"next_tool": "environment"}"#,
                r#"{"next_tool": "web_search", "reasoning": "research was requested"}"#,
                r#"{"next_tool": "knowledge"}"#,
            ],
        )
        .script(
            DecisionKind::CompletenessCheck,
            [r#"{"is_complete": false, "missing_info": "always something more", "confidence": 0.2}"#],
        )
}

/// Run Scenario 4: Stubborn Oracle.
pub async fn run_scenario() -> PlantMateResult<OrchestratorResult> {
    println!("=== Scenario 4: Stubborn Oracle ===");
    println!();
    println!("  Query: \"{QUERY}\"");

    let config = OrchestratorConfig::default();
    println!("  Iteration ceiling: {}", config.max_iterations);

    let orchestrator = garden_orchestrator(Arc::new(oracle()), config)?;
    let trace = InMemoryTraceWriter::new();
    let request = RunRequest::new(QUERY).with_aux_data(stressed_readings());

    let result = orchestrator.run_traced(request, &trace).await;

    super::report(&result, &trace)?;
    Ok(result)
}
